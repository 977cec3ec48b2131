//! What the tick loop reports to observers.

use tx_core::{CustomerId, TaxiId, Tick};
use tx_dispatch::RequestInfo;

/// One notable occurrence during a tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SimEvent {
    /// A sampled trip became a live customer.
    Announced { request: RequestInfo, announce_ms: i64 },
    /// A sampled trip needs more seats than any taxi has; it is dropped.
    Rejected { announce_ms: i64, seats: u32 },
    /// A contract request went out; `attempt` 1 is the announcement.
    Requested { customer: CustomerId, attempt: u32 },
    Dealt { customer: CustomerId, taxi: TaxiId, value: f64 },
    /// The customer received its taxi's accept.
    Taken { customer: CustomerId, taxi: TaxiId },
    PickedUp {
        customer:      CustomerId,
        taxi:          TaxiId,
        at_ms:         i64,
        /// Announcement to pickup.
        waiting_ms:    i64,
        /// Contract requests broadcast before the customer was taken.
        requests_sent: u32,
        /// Pickup fell inside the customer's time window.
        on_time:       bool,
    },
    Delivered {
        customer:  CustomerId,
        taxi:      TaxiId,
        at_ms:     i64,
        /// Pickup to delivery.
        ride_ms:   i64,
        /// Time a straight ride from pickup to delivery would take.
        direct_ms: i64,
    },
    /// `to` took `customer` over from `from`.
    Traded { customer: CustomerId, from: TaxiId, to: TaxiId, profit: f64 },
}

/// Counters for one completed tick.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickSummary {
    pub tick:              Tick,
    /// Simulated milliseconds at the start of the tick.
    pub now_ms:            i64,
    pub announced:         u32,
    pub pickups:           u32,
    pub deliveries:        u32,
    pub trades:            u32,
    /// Customers not yet taken by any taxi, after this tick.
    pub waiting_customers: u32,
    /// Customers currently aboard a taxi, after this tick.
    pub riding_customers:  u32,
    pub idle_taxis:        u32,
    pub busy_taxis:        u32,
    /// Messages posted this tick, counted per recipient.
    pub messages:          u32,
}
