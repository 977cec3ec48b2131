//! Simulation observer trait for progress reporting and data collection.

use tx_core::Tick;
use tx_dispatch::Taxi;
use tx_mobility::PlaneModel;

use crate::{SimEvent, TickSummary};

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called for every announcement, negotiation step, pickup, delivery
    /// and trade, in the order they happen.
    fn on_event(&mut self, _tick: Tick, _event: &SimEvent) {}

    /// Called at the end of each tick, after the post office has delivered.
    fn on_tick_end(&mut self, _summary: &TickSummary) {}

    /// Called at snapshot intervals (every `config.output_interval_ticks`
    /// ticks) with read-only access to the fleet and the plane.
    fn on_snapshot(&mut self, _tick: Tick, _taxis: &[Taxi], _world: &PlaneModel) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick, _taxis: &[Taxi]) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Drive two observers with the same callbacks, `A` first.
impl<A: SimObserver, B: SimObserver> SimObserver for (A, B) {
    fn on_tick_start(&mut self, tick: Tick) {
        self.0.on_tick_start(tick);
        self.1.on_tick_start(tick);
    }

    fn on_event(&mut self, tick: Tick, event: &SimEvent) {
        self.0.on_event(tick, event);
        self.1.on_event(tick, event);
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        self.0.on_tick_end(summary);
        self.1.on_tick_end(summary);
    }

    fn on_snapshot(&mut self, tick: Tick, taxis: &[Taxi], world: &PlaneModel) {
        self.0.on_snapshot(tick, taxis, world);
        self.1.on_snapshot(tick, taxis, world);
    }

    fn on_sim_end(&mut self, final_tick: Tick, taxis: &[Taxi]) {
        self.0.on_sim_end(final_tick, taxis);
        self.1.on_sim_end(final_tick, taxis);
    }
}

impl<O: SimObserver + ?Sized> SimObserver for &mut O {
    fn on_tick_start(&mut self, tick: Tick) {
        (**self).on_tick_start(tick);
    }

    fn on_event(&mut self, tick: Tick, event: &SimEvent) {
        (**self).on_event(tick, event);
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        (**self).on_tick_end(summary);
    }

    fn on_snapshot(&mut self, tick: Tick, taxis: &[Taxi], world: &PlaneModel) {
        (**self).on_snapshot(tick, taxis, world);
    }

    fn on_sim_end(&mut self, final_tick: Tick, taxis: &[Taxi]) {
        (**self).on_sim_end(final_tick, taxis);
    }
}
