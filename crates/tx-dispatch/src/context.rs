//! Read-only inputs shared by every agent callback during one tick.

use tx_core::{DispatchConfig, Tick};
use tx_field::DemandField;

/// Per-tick snapshot handed to [`Customer::tick`](crate::Customer::tick) and
/// [`Taxi::tick`](crate::Taxi::tick).
///
/// Built once per tick by the simulation loop; all borrows live for that
/// tick only.
pub struct TickContext<'a> {
    pub tick:    Tick,
    /// Simulated milliseconds at the start of the tick.
    pub now_ms:  i64,
    /// Length of one tick; the time budget each taxi may spend moving.
    pub tick_ms: u64,
    pub config:  &'a DispatchConfig,
    /// Absent when idle repositioning is disabled.
    pub field:   Option<&'a DemandField>,
}

impl<'a> TickContext<'a> {
    #[inline]
    pub fn new(
        tick:    Tick,
        now_ms:  i64,
        tick_ms: u64,
        config:  &'a DispatchConfig,
        field:   Option<&'a DemandField>,
    ) -> Self {
        Self { tick, now_ms, tick_ms, config, field }
    }
}
