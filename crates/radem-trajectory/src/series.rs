//! Trajectory query and sample types.

use chrono::{DateTime, Duration, Utc};
use radem_common::table::ChannelTable;

use crate::error::{Result, TrajectoryError};

/// A trajectory request: observer vehicle, target body, inclusive time
/// window and sampling interval.
#[derive(Debug, Clone)]
pub struct TrajectoryQuery {
    /// Named vehicle whose trajectory is sampled (e.g. "JUICE").
    pub observer: String,
    /// Named target body (e.g. "Jupiter", "Earth").
    pub target: String,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub step: Duration,
}

impl TrajectoryQuery {
    pub fn new(
        observer: impl Into<String>,
        target: impl Into<String>,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step: Duration,
    ) -> Result<Self> {
        if stop < start {
            return Err(TrajectoryError::InvalidQuery(format!(
                "window stop {} is before start {}",
                stop, start
            )));
        }
        if step <= Duration::zero() {
            return Err(TrajectoryError::InvalidQuery(
                "sampling step must be positive".to_string(),
            ));
        }
        Ok(Self {
            observer: observer.into(),
            target: target.into(),
            start,
            stop,
            step,
        })
    }

    /// The sample instants for this query: start, start+step, ... up to and
    /// including stop when it falls on the grid.
    pub fn sample_times(&self) -> Vec<DateTime<Utc>> {
        let mut times = Vec::new();
        let mut t = self.start;
        while t <= self.stop {
            times.push(t);
            t += self.step;
        }
        times
    }
}

/// One trajectory sample: target distance plus two angular coordinates of
/// the sub-observer point, as returned by the external collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    pub time: DateTime<Utc>,
    pub distance_km: f64,
    pub lat_deg: f64,
    pub lon_deg: f64,
}

/// Column schema of converted trajectory tables.
pub(crate) fn trajectory_columns() -> Vec<String> {
    vec![
        "distance_km".to_string(),
        "lat_deg".to_string(),
        "lon_deg".to_string(),
    ]
}

/// Convert a sample sequence into a three-column table so trajectory series
/// persist through the same stores as instrument data.
pub fn samples_to_table(label: &str, samples: &[TrajectorySample]) -> Result<ChannelTable> {
    let mut table = ChannelTable::new(label, trajectory_columns());
    for s in samples {
        table.push_row(s.time, vec![s.distance_km, s.lat_deg, s.lon_deg])?;
    }
    Ok(table)
}
