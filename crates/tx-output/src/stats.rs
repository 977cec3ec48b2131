//! Run statistics aggregated from simulation events.
//!
//! | Field                   | Source                                        |
//! |-------------------------|-----------------------------------------------|
//! | customer counts         | `Announced`, `Rejected`, `Taken` events       |
//! | `waiting_ms`            | `PickedUp::waiting_ms` (announce → pickup)    |
//! | `requests_before_pickup`| `PickedUp::requests_sent`                     |
//! | `travel_overhead`       | Σ ride time / Σ direct time over deliveries   |
//! | idle/waiting per tick   | `TickSummary`                                 |
//! | distances               | the fleet at `on_sim_end`                     |
//! | trades                  | `Traded` events                               |

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use tx_core::Tick;
use tx_dispatch::Taxi;
use tx_sim::{SimEvent, SimObserver, TickSummary};

use crate::OutputResult;

// ── Distribution ──────────────────────────────────────────────────────────────

/// Summary of a sample of non-negative values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub mean:  f64,
    pub min:   f64,
    pub p50:   f64,
    pub p90:   f64,
    pub max:   f64,
}

impl Distribution {
    /// Nearest-rank percentiles.  An empty sample gives all zeros.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let rank = |p: f64| sorted[((p * n as f64).ceil() as usize).clamp(1, n) - 1];
        Self {
            count: n,
            mean:  sorted.iter().sum::<f64>() / n as f64,
            min:   sorted[0],
            p50:   rank(0.5),
            p90:   rank(0.9),
            max:   sorted[n - 1],
        }
    }
}

// ── RunStatistics ─────────────────────────────────────────────────────────────

/// Everything reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    pub ticks:                  u64,
    pub customers_announced:    u64,
    pub customers_rejected:     u64,
    pub customers_taken:        u64,
    pub pickups:                u64,
    pub on_time_pickups:        u64,
    pub deliveries:             u64,
    /// Announce → pickup, in milliseconds.
    pub waiting_ms:             Distribution,
    /// Contract requests broadcast before pickup, summed over customers.
    pub requests_before_pickup: u64,
    /// Σ ride time / Σ direct ride time; 1.0 when either sum is zero.
    pub travel_overhead:        f64,
    pub mean_idle_taxis:        f64,
    pub mean_waiting_customers: f64,
    pub max_waiting_customers:  u32,
    pub trades:                 u64,
    pub trade_profit_total:     f64,
    /// Indexed by taxi id.
    pub idle_distance:          Vec<f64>,
    pub idle_distance_total:    f64,
    pub distance_total:         f64,
}

impl RunStatistics {
    /// Write as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> OutputResult<()> {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

// ── StatsTracker ──────────────────────────────────────────────────────────────

/// A [`SimObserver`] accumulating [`RunStatistics`].
#[derive(Debug, Clone, Default)]
pub struct StatsTracker {
    stats:       RunStatistics,
    waiting:     Vec<f64>,
    ride_ms:     i64,
    direct_ms:   i64,
    idle_sum:    u64,
    waiting_sum: u64,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics so far.  Fleet distances are filled in at `on_sim_end`.
    pub fn finish(mut self) -> RunStatistics {
        self.fold();
        self.stats
    }

    pub fn snapshot(&self) -> RunStatistics {
        self.clone().finish()
    }

    fn fold(&mut self) {
        let s = &mut self.stats;
        s.waiting_ms = Distribution::from_samples(&self.waiting);
        s.travel_overhead = if self.ride_ms > 0 && self.direct_ms > 0 {
            self.ride_ms as f64 / self.direct_ms as f64
        } else {
            1.0
        };
        if s.ticks > 0 {
            s.mean_idle_taxis = self.idle_sum as f64 / s.ticks as f64;
            s.mean_waiting_customers = self.waiting_sum as f64 / s.ticks as f64;
        }
    }
}

impl SimObserver for StatsTracker {
    fn on_event(&mut self, _tick: Tick, event: &SimEvent) {
        let s = &mut self.stats;
        match *event {
            SimEvent::Announced { .. } => s.customers_announced += 1,
            SimEvent::Rejected { .. } => s.customers_rejected += 1,
            SimEvent::Taken { .. } => s.customers_taken += 1,
            SimEvent::PickedUp { waiting_ms, requests_sent, on_time, .. } => {
                s.pickups += 1;
                s.on_time_pickups += on_time as u64;
                s.requests_before_pickup += u64::from(requests_sent);
                self.waiting.push(waiting_ms as f64);
            }
            SimEvent::Delivered { ride_ms, direct_ms, .. } => {
                s.deliveries += 1;
                self.ride_ms += ride_ms;
                self.direct_ms += direct_ms;
            }
            SimEvent::Traded { profit, .. } => {
                s.trades += 1;
                s.trade_profit_total += profit;
            }
            SimEvent::Requested { .. } | SimEvent::Dealt { .. } => {}
        }
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        self.stats.ticks += 1;
        self.idle_sum += u64::from(summary.idle_taxis);
        self.waiting_sum += u64::from(summary.waiting_customers);
        self.stats.max_waiting_customers = self.stats.max_waiting_customers.max(summary.waiting_customers);
    }

    fn on_sim_end(&mut self, _final_tick: Tick, taxis: &[Taxi]) {
        let s = &mut self.stats;
        s.idle_distance = taxis.iter().map(Taxi::total_idle_travel).collect();
        s.idle_distance_total = s.idle_distance.iter().sum();
        s.distance_total = taxis.iter().map(Taxi::distance_travelled).sum();
    }
}
