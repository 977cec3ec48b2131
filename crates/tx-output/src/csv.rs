//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `taxi_snapshots.csv`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OutputResult, TaxiSnapshotRow, TickSummaryRow};

pub const SNAPSHOT_HEADER: [&str; 8] = ["taxi_id", "tick", "x", "y", "busy", "assigned", "load", "idle_travel"];

pub const SUMMARY_HEADER: [&str; 11] = [
    "tick",
    "sim_time_ms",
    "announced",
    "pickups",
    "deliveries",
    "trades",
    "waiting_customers",
    "riding_customers",
    "idle_taxis",
    "busy_taxis",
    "messages",
];

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    snapshots: Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut snapshots = Writer::from_path(dir.join("taxi_snapshots.csv"))?;
        snapshots.write_record(SNAPSHOT_HEADER)?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(SUMMARY_HEADER)?;

        Ok(Self { snapshots, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_snapshots(&mut self, rows: &[TaxiSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                row.taxi_id.to_string(),
                row.tick.to_string(),
                format!("{:.4}", row.x),
                format!("{:.4}", row.y),
                (row.busy as u8).to_string(),
                row.assigned.to_string(),
                row.load.to_string(),
                format!("{:.4}", row.idle_travel),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.sim_time_ms.to_string(),
            row.announced.to_string(),
            row.pickups.to_string(),
            row.deliveries.to_string(),
            row.trades.to_string(),
            row.waiting_customers.to_string(),
            row.riding_customers.to_string(),
            row.idle_taxis.to_string(),
            row.busy_taxis.to_string(),
            row.messages.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.snapshots.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
