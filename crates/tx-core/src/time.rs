//! Simulation time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter.  Each
//! tick covers the half-open window of simulated milliseconds
//!
//!   [tick * tick_ms, (tick + 1) * tick_ms)
//!
//! measured from the simulation start.  Request announce times, pickup
//! timestamps and demand-field frames are all expressed in these
//! milliseconds, so integer arithmetic stays exact.
//!
//! The default tick is 1,000 ms (1 simulated second).

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// Index of a simulation step, counted from 0.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The run's position in time, and the tick ↔ millisecond mapping.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How many simulated milliseconds one tick represents.
    pub tick_ms: u64,
    /// The current tick: advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(tick_ms: u64) -> Self {
        Self { tick_ms, current_tick: Tick::ZERO }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = self.current_tick.next();
    }

    /// First millisecond covered by `tick`.
    #[inline]
    pub fn start_ms(&self, tick: Tick) -> u64 {
        tick.0 * self.tick_ms
    }

    /// One past the last millisecond covered by `tick`.
    #[inline]
    pub fn end_ms(&self, tick: Tick) -> u64 {
        (tick.0 + 1) * self.tick_ms
    }

    /// Elapsed simulated milliseconds at the start of the current tick.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_ms(self.current_tick)
    }

    /// Simulated wall time since the start as (hours, minutes, seconds).
    pub fn elapsed_hms(&self) -> (u64, u32, u32) {
        let secs = self.now_ms() / 1_000;
        let hours = secs / 3_600;
        let minutes = ((secs % 3_600) / 60) as u32;
        let seconds = (secs % 60) as u32;
        (hours, minutes, seconds)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.elapsed_hms();
        write!(f, "{} ({:02}:{:02}:{:02})", self.current_tick, h, m, s)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Run-level configuration: time resolution, horizon and seed.
///
/// Protocol constants live in [`DispatchConfig`][crate::DispatchConfig].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Simulated milliseconds per tick.  Default: 1000.
    pub tick_ms: u64,

    /// Requests are fed from the trip feed while `tick < total_ticks`.
    pub total_ticks: u64,

    /// Extra ticks allowed after `total_ticks` for outstanding requests to
    /// be served before the run is cut off.
    pub max_drain_ticks: u64,

    /// Seed of the run RNG; equal seeds give identical runs.
    pub seed: u64,

    /// Fraction of fed trips that become live requests, in `[0, 1]`.
    pub sample_fraction: f64,

    /// Emit observer snapshots every N ticks.  0 disables snapshots.
    pub output_interval_ticks: u64,
}

impl SimConfig {
    /// First tick at which no new requests are fed.
    #[inline]
    pub fn feed_end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Tick at which the run stops regardless of outstanding work.
    #[inline]
    pub fn hard_end_tick(&self) -> Tick {
        Tick(self.total_ticks.saturating_add(self.max_drain_ticks))
    }

    /// A clock at tick 0 with this run's tick length.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_ms)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms:               1_000,
            total_ticks:           3_600,
            max_drain_ticks:       3_600,
            seed:                  42,
            sample_fraction:       0.02,
            output_interval_ticks: 60,
        }
    }
}
