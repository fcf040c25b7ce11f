//! Keyed binary columnar table store.
//!
//! One store file holds any number of tables under distinct string keys.
//! The format is deliberately small: a magic/version header followed by one
//! record per table (key, schema, nanosecond timestamps, column-major f64
//! payload, crc32 of the payload). Values are encoded via `f64::to_bits`,
//! so reload is bit-exact, NaN included.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! "RDTB" | version u16 | table_count u32
//! per table:
//!   key_len u16 | key | label_len u16 | label
//!   n_cols u32 | n_rows u64
//!   per column: name_len u16 | name
//!   payload: n_rows x i64 timestamp-nanos, then per column n_rows x u64 bits
//!   crc32(payload) u32
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{TimeZone, Utc};
use radem_common::table::ChannelTable;
use tracing::debug;

use crate::error::{Result, StoreError};

const MAGIC: &[u8; 4] = b"RDTB";
const VERSION: u16 = 1;

/// An in-memory keyed collection of tables, loadable from and savable to a
/// single binary store file.
#[derive(Debug, Default)]
pub struct BinaryStore {
    tables: BTreeMap<String, ChannelTable>,
}

impl BinaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table under a key. Keys are unique per store.
    pub fn insert(&mut self, key: impl Into<String>, table: ChannelTable) -> Result<()> {
        let key = key.into();
        if self.tables.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }
        self.tables.insert(key, table);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ChannelTable> {
        self.tables.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Serialize the whole store.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        buf.put_slice(MAGIC);
        buf.put_u16_le(VERSION);
        buf.put_u32_le(self.tables.len() as u32);

        for (key, table) in &self.tables {
            put_str(&mut buf, key)?;
            put_str(&mut buf, table.label())?;
            buf.put_u32_le(table.n_cols() as u32);
            buf.put_u64_le(table.n_rows() as u64);
            for name in table.column_names() {
                put_str(&mut buf, name)?;
            }

            let mut payload = BytesMut::with_capacity(
                8 * table.n_rows() * (1 + table.n_cols()),
            );
            for time in table.times() {
                let nanos = time.timestamp_nanos_opt().ok_or_else(|| {
                    StoreError::Corrupt(format!("timestamp out of range: {}", time))
                })?;
                payload.put_i64_le(nanos);
            }
            for col in 0..table.n_cols() {
                for value in table.column_at(col) {
                    payload.put_u64_le(value.to_bits());
                }
            }

            let crc = crc32fast::hash(&payload);
            buf.put_slice(&payload);
            buf.put_u32_le(crc);
        }

        Ok(buf.freeze())
    }

    /// Deserialize a store from bytes.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.remaining() < 4 || data[..4] != *MAGIC {
            return Err(StoreError::BadMagic);
        }
        data.advance(4);

        let version = get_u16(&mut data)?;
        if version != VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }
        let table_count = get_u32(&mut data)?;

        let mut tables = BTreeMap::new();
        for _ in 0..table_count {
            let key = get_str(&mut data)?;
            let label = get_str(&mut data)?;
            let n_cols = get_u32(&mut data)? as usize;
            let n_rows = get_u64(&mut data)? as usize;
            let mut columns = Vec::with_capacity(n_cols);
            for _ in 0..n_cols {
                columns.push(get_str(&mut data)?);
            }

            // Length fields come from the file and cannot be trusted.
            let payload_len = n_cols
                .checked_add(1)
                .and_then(|width| width.checked_mul(n_rows))
                .and_then(|cells| cells.checked_mul(8))
                .ok_or_else(|| {
                    StoreError::Corrupt(format!("table {} has implausible dimensions", key))
                })?;
            if data.remaining() < payload_len.saturating_add(4) {
                return Err(StoreError::Corrupt(format!(
                    "table {} payload truncated",
                    key
                )));
            }
            let crc = crc32fast::hash(&data[..payload_len]);

            let mut times = Vec::with_capacity(n_rows);
            for _ in 0..n_rows {
                times.push(Utc.timestamp_nanos(data.get_i64_le()));
            }
            let mut values = Vec::with_capacity(n_cols);
            for _ in 0..n_cols {
                let mut col = Vec::with_capacity(n_rows);
                for _ in 0..n_rows {
                    col.push(f64::from_bits(data.get_u64_le()));
                }
                values.push(col);
            }

            let stored_crc = data.get_u32_le();
            if stored_crc != crc {
                return Err(StoreError::ChecksumMismatch { key });
            }

            let mut table = ChannelTable::new(label, columns);
            for (i, time) in times.iter().enumerate() {
                let row = values.iter().map(|col| col[i]).collect();
                table.push_row(*time, row)?;
            }
            tables.insert(key, table);
        }

        Ok(Self { tables })
    }

    /// Write the store to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let encoded = self.encode()?;
        std::fs::write(path, &encoded)?;
        debug!(path = %path.display(), tables = self.tables.len(), bytes = encoded.len(), "Wrote binary store");
        Ok(())
    }

    /// Load a store from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let store = Self::decode(&data)?;
        debug!(path = %path.display(), tables = store.len(), "Loaded binary store");
        Ok(store)
    }
}

fn put_str(buf: &mut BytesMut, s: &str) -> Result<()> {
    if s.len() > u16::MAX as usize {
        return Err(StoreError::Corrupt(format!("string too long: {} bytes", s.len())));
    }
    buf.put_u16_le(s.len() as u16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn get_u16(data: &mut &[u8]) -> Result<u16> {
    if data.remaining() < 2 {
        return Err(StoreError::Corrupt("unexpected end of file".into()));
    }
    Ok(data.get_u16_le())
}

fn get_u32(data: &mut &[u8]) -> Result<u32> {
    if data.remaining() < 4 {
        return Err(StoreError::Corrupt("unexpected end of file".into()));
    }
    Ok(data.get_u32_le())
}

fn get_u64(data: &mut &[u8]) -> Result<u64> {
    if data.remaining() < 8 {
        return Err(StoreError::Corrupt("unexpected end of file".into()));
    }
    Ok(data.get_u64_le())
}

fn get_str(data: &mut &[u8]) -> Result<String> {
    let len = get_u16(data)? as usize;
    if data.remaining() < len {
        return Err(StoreError::Corrupt("unexpected end of file".into()));
    }
    let s = std::str::from_utf8(&data[..len])
        .map_err(|_| StoreError::Corrupt("invalid UTF-8 in string".into()))?
        .to_string();
    data.advance(len);
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn t(s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, s).unwrap()
    }

    fn sample_table() -> ChannelTable {
        ChannelTable::from_rows(
            "test",
            vec!["a".to_string(), "b".to_string()],
            vec![
                (t(0), vec![1.5, -2.25]),
                (t(1), vec![f64::NAN, 1e-300]),
                (t(2), vec![f64::INFINITY, 0.1 + 0.2]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_encode_decode_exact() {
        let mut store = BinaryStore::new();
        store.insert("science", sample_table()).unwrap();

        let bytes = store.encode().unwrap();
        let decoded = BinaryStore::decode(&bytes).unwrap();
        let table = decoded.get("science").unwrap();

        let original = sample_table();
        assert_eq!(table.times(), original.times());
        assert_eq!(table.column_names(), original.column_names());
        // Bit-exact, NaN included.
        for col in 0..original.n_cols() {
            let a = original.column_at(col);
            let b = table.column_at(col);
            assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(b) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
        }
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(
            BinaryStore::decode(b"NOPE\x01\x00\x00\x00\x00\x00"),
            Err(StoreError::BadMagic)
        ));
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut store = BinaryStore::new();
        store.insert("k", sample_table()).unwrap();
        let mut bytes = store.encode().unwrap().to_vec();

        // Flip one payload byte (near the end, before the trailing crc).
        let idx = bytes.len() - 8;
        bytes[idx] ^= 0xff;

        assert!(matches!(
            BinaryStore::decode(&bytes),
            Err(StoreError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut store = BinaryStore::new();
        store.insert("k", sample_table()).unwrap();
        assert!(matches!(
            store.insert("k", sample_table()),
            Err(StoreError::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_implausible_dimensions_are_corrupt() {
        // Valid header up to the schema, then a row count no real file can
        // carry. Decode must fail cleanly instead of trusting the length.
        let mut data = Vec::new();
        data.extend_from_slice(MAGIC);
        data.extend_from_slice(&VERSION.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes()); // table count
        data.extend_from_slice(&1u16.to_le_bytes());
        data.push(b'k'); // key
        data.extend_from_slice(&1u16.to_le_bytes());
        data.push(b'l'); // label
        data.extend_from_slice(&1u32.to_le_bytes()); // n_cols
        data.extend_from_slice(&(1u64 << 60).to_le_bytes()); // n_rows
        data.extend_from_slice(&1u16.to_le_bytes());
        data.push(b'a'); // column name
        data.extend_from_slice(&[0u8; 4]);

        assert!(matches!(
            BinaryStore::decode(&data),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_truncated_file() {
        let mut store = BinaryStore::new();
        store.insert("k", sample_table()).unwrap();
        let bytes = store.encode().unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(BinaryStore::decode(truncated).is_err());
    }
}
