//! `tx-output` — run statistics and output writers for the taxi dispatch
//! simulator.
//!
//! Two row backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                                   |
//! |-----------|---------|-------------------------------------------------|
//! | *(none)*  | CSV     | `taxi_snapshots.csv`, `tick_summaries.csv`      |
//! | `sqlite`  | SQLite  | `output.db`                                     |
//!
//! Both implement [`OutputWriter`] and are driven by [`SimOutputObserver`],
//! which implements `tx_sim::SimObserver`.  [`StatsTracker`] is a separate
//! observer that aggregates [`RunStatistics`] and dumps them as JSON.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tx_output::{CsvWriter, SimOutputObserver, StatsTracker};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = (SimOutputObserver::new(writer), StatsTracker::new());
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.0.take_error() { eprintln!("output error: {e}"); }
//! let stats = obs.1.finish();
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod stats;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{TaxiSnapshotRow, TickSummaryRow};
pub use stats::{Distribution, RunStatistics, StatsTracker};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
