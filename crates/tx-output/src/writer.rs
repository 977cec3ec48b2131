//! The `OutputWriter` trait implemented by all backend writers.

use crate::{OutputResult, TaxiSnapshotRow, TickSummaryRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// Errors are stored by [`SimOutputObserver`][crate::SimOutputObserver] and
/// retrieved with `take_error`.
pub trait OutputWriter {
    /// Write a batch of taxi snapshots.
    fn write_snapshots(&mut self, rows: &[TaxiSnapshotRow]) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
