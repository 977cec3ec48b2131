//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! two tables: `taxi_snapshots` and `tick_summaries`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{OutputResult, TaxiSnapshotRow, TickSummaryRow};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS taxi_snapshots (
                 taxi_id     INTEGER NOT NULL,
                 tick        INTEGER NOT NULL,
                 x           REAL    NOT NULL,
                 y           REAL    NOT NULL,
                 busy        INTEGER NOT NULL,
                 assigned    INTEGER NOT NULL,
                 load        INTEGER NOT NULL,
                 idle_travel REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 tick              INTEGER PRIMARY KEY,
                 sim_time_ms       INTEGER NOT NULL,
                 announced         INTEGER NOT NULL,
                 pickups           INTEGER NOT NULL,
                 deliveries        INTEGER NOT NULL,
                 trades            INTEGER NOT NULL,
                 waiting_customers INTEGER NOT NULL,
                 riding_customers  INTEGER NOT NULL,
                 idle_taxis        INTEGER NOT NULL,
                 busy_taxis        INTEGER NOT NULL,
                 messages          INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_snapshots(&mut self, rows: &[TaxiSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO taxi_snapshots \
                 (taxi_id, tick, x, y, busy, assigned, load, idle_travel) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.taxi_id,
                    row.tick as i64,
                    row.x,
                    row.y,
                    row.busy as i64,
                    row.assigned,
                    row.load,
                    row.idle_travel,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries \
             (tick, sim_time_ms, announced, pickups, deliveries, trades, \
              waiting_customers, riding_customers, idle_taxis, busy_taxis, messages) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                row.tick as i64,
                row.sim_time_ms,
                row.announced,
                row.pickups,
                row.deliveries,
                row.trades,
                row.waiting_customers,
                row.riding_customers,
                row.idle_taxis,
                row.busy_taxis,
                row.messages,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
