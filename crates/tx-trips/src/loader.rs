//! CSV trip loader.
//!
//! # CSV format
//!
//! One row per historical trip, as exported from the NYC yellow-cab tables:
//!
//! ```csv
//! tpep_pickup_datetime,passenger_count,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude
//! "2015-01-01 00:00:12",1,-73.993896,40.750111,-73.974785,40.750618
//! 2015-01-01 00:00:31,2,-73.976425,40.739811,-73.983978,40.757889
//! ```
//!
//! Datetimes may be wrapped in double quotes.  Extra columns are ignored.
//!
//! # Malformed rows
//!
//! A row that fails to deserialize, carries an unparseable datetime, has zero
//! passengers, or projects outside the operating area is skipped and logged
//! at `warn`; loading never aborts because of one bad record.  Only I/O
//! failures and a missing header are fatal.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use tx_core::{GeoPoint, Projection};

use crate::{Trip, TripsError, TripsResult};

/// `chrono` format of the `tpep_pickup_datetime` column.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const REQUIRED_COLUMNS: [&str; 6] = [
    "tpep_pickup_datetime",
    "passenger_count",
    "pickup_longitude",
    "pickup_latitude",
    "dropoff_longitude",
    "dropoff_latitude",
];

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TripRecord {
    tpep_pickup_datetime: String,
    passenger_count:      u32,
    pickup_longitude:     f64,
    pickup_latitude:      f64,
    dropoff_longitude:    f64,
    dropoff_latitude:     f64,
}

/// Outcome of a load: the usable trips plus counts of what was dropped.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Trips in file order.
    pub trips:       Vec<Trip>,
    /// Rows that could not be parsed.
    pub malformed:   usize,
    /// Rows with a pickup or dropoff outside the projection's box.
    pub out_of_area: usize,
}

impl LoadReport {
    /// Total number of rows dropped for any reason.
    pub fn skipped(&self) -> usize {
        self.malformed + self.out_of_area
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load trips from a CSV file.
///
/// `start` is the simulated wall-clock instant of tick 0; each trip's
/// `announce_ms` is measured from it.
pub fn load_trips_csv(
    path:       &Path,
    projection: &Projection,
    start:      NaiveDateTime,
) -> TripsResult<LoadReport> {
    let file = std::fs::File::open(path)?;
    load_trips_reader(file, projection, start)
}

/// Like [`load_trips_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`) or for embedded data sets.
pub fn load_trips_reader<R: Read>(
    reader:     R,
    projection: &Projection,
    start:      NaiveDateTime,
) -> TripsResult<LoadReport> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(TripsError::Header(format!("missing column {column:?}")));
        }
    }

    let mut report = LoadReport::default();

    for (row, result) in csv_reader.deserialize::<TripRecord>().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(TripsError::Csv(e)),
            Err(e) => {
                tracing::warn!(target: "trips", row, error = %e, "skipping malformed trip row");
                report.malformed += 1;
                continue;
            }
        };

        let raw_time = record.tpep_pickup_datetime.trim().trim_matches('"');
        let pickup_time = match NaiveDateTime::parse_from_str(raw_time, DATETIME_FORMAT) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(target: "trips", row, value = raw_time, error = %e, "skipping trip with bad datetime");
                report.malformed += 1;
                continue;
            }
        };

        if record.passenger_count == 0 {
            tracing::warn!(target: "trips", row, "skipping trip with zero passengers");
            report.malformed += 1;
            continue;
        }

        let pickup = projection.project(GeoPoint::new(record.pickup_latitude, record.pickup_longitude));
        let dropoff = projection.project(GeoPoint::new(record.dropoff_latitude, record.dropoff_longitude));
        let (Some(pickup), Some(dropoff)) = (pickup, dropoff) else {
            tracing::debug!(target: "trips", row, "skipping trip outside the operating area");
            report.out_of_area += 1;
            continue;
        };

        report.trips.push(Trip {
            announce_ms: (pickup_time - start).num_milliseconds(),
            passengers:  record.passenger_count,
            pickup,
            dropoff,
        });
    }

    tracing::info!(
        target: "trips",
        loaded = report.trips.len(),
        malformed = report.malformed,
        out_of_area = report.out_of_area,
        "trip file loaded"
    );
    Ok(report)
}
