//! Integration tests for the binary and text stores.

use chrono::{DateTime, Duration, TimeZone, Utc};
use radem_common::table::ChannelTable;
use radem_store::{
    verify_binary_roundtrip, verify_text_roundtrip, write_csv, BinaryStore, StoreError,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()
}

/// A table with awkward values: subnormals, negative zero, NaN, infinities.
fn awkward_table(label: &str, n_rows: usize) -> ChannelTable {
    let columns: Vec<String> = (0..6).map(|i| format!("c{}", i)).collect();
    let mut table = ChannelTable::new(label, columns);
    for i in 0..n_rows {
        let x = i as f64;
        table
            .push_row(
                start() + Duration::seconds(i as i64),
                vec![
                    x * 0.1,
                    -0.0,
                    f64::MIN_POSITIVE / 2.0,
                    if i % 7 == 0 { f64::NAN } else { x },
                    f64::NEG_INFINITY,
                    1.0 / (x + 1.0),
                ],
            )
            .unwrap();
    }
    table
}

#[test]
fn multiple_tables_coexist_under_distinct_keys() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("radem.rdtb");

    let science = awkward_table("science", 50);
    let housekeeping = awkward_table("housekeeping", 20);

    let mut store = BinaryStore::new();
    store.insert("science", science.clone()).unwrap();
    store.insert("housekeeping", housekeeping.clone()).unwrap();
    store.save(&path).unwrap();

    let loaded = BinaryStore::load(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded.keys().collect::<Vec<_>>(),
        vec!["housekeeping", "science"]
    );
    assert_eq!(loaded.get("science").unwrap().n_rows(), 50);
    assert_eq!(loaded.get("housekeeping").unwrap().n_rows(), 20);

    verify_binary_roundtrip(&path, "science", &science).unwrap();
    verify_binary_roundtrip(&path, "housekeeping", &housekeeping).unwrap();
}

#[test]
fn binary_round_trip_is_bit_exact() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("exact.rdtb");

    let table = awkward_table("science", 200);
    let mut store = BinaryStore::new();
    store.insert("science", table.clone()).unwrap();
    store.save(&path).unwrap();

    let loaded = BinaryStore::load(&path).unwrap();
    let reloaded = loaded.get("science").unwrap();

    assert_eq!(reloaded.times(), table.times());
    assert_eq!(reloaded.column_names(), table.column_names());
    for c in 0..table.n_cols() {
        for (a, b) in table.column_at(c).iter().zip(reloaded.column_at(c)) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
    // Negative zero keeps its sign bit.
    assert!(reloaded.column("c1").unwrap()[0].is_sign_negative());
}

#[test]
fn text_round_trip_within_tolerance() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("table.csv");

    let table = awkward_table("science", 100);
    write_csv(&table, &path).unwrap();
    verify_text_roundtrip(&path, &table).unwrap();
}

#[test]
fn loading_garbage_fails_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("garbage.rdtb");
    std::fs::write(&path, b"this is not a table store").unwrap();

    assert!(matches!(
        BinaryStore::load(&path),
        Err(StoreError::BadMagic)
    ));
}
