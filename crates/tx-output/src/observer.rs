//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use tx_core::Tick;
use tx_dispatch::{Taxi, TaxiState};
use tx_mobility::PlaneModel;
use tx_sim::{SimObserver, TickSummary};

use crate::row::{TaxiSnapshotRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes taxi snapshots and tick summaries to any
/// [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `SimObserver`
/// methods have no return value.  After `sim.run()` returns, check for
/// errors with [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            tracing::warn!(target: "output", error = %e, "output write failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_end(&mut self, summary: &TickSummary) {
        let row = TickSummaryRow {
            tick:              summary.tick.0,
            sim_time_ms:       summary.now_ms,
            announced:         summary.announced,
            pickups:           summary.pickups,
            deliveries:        summary.deliveries,
            trades:            summary.trades,
            waiting_customers: summary.waiting_customers,
            riding_customers:  summary.riding_customers,
            idle_taxis:        summary.idle_taxis,
            busy_taxis:        summary.busy_taxis,
            messages:          summary.messages,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, tick: Tick, taxis: &[Taxi], world: &PlaneModel) {
        let rows: Vec<TaxiSnapshotRow> = taxis
            .iter()
            .filter_map(|taxi| {
                let vehicle = world.vehicle(taxi.id())?;
                Some(TaxiSnapshotRow {
                    taxi_id:     taxi.id().0,
                    tick:        tick.0,
                    x:           vehicle.position.x,
                    y:           vehicle.position.y,
                    busy:        taxi.state() == TaxiState::Busy,
                    assigned:    taxi.assigned().len() as u32,
                    load:        vehicle.load,
                    idle_travel: taxi.total_idle_travel(),
                })
            })
            .collect();

        if !rows.is_empty() {
            let result = self.writer.write_snapshots(&rows);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _final_tick: Tick, _taxis: &[Taxi]) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
