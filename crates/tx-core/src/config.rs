//! Protocol configuration shared by customers and taxis.
//!
//! Built once at startup, validated, and passed by reference into every
//! component.  Nothing in the workspace reads protocol constants from
//! globals.

use crate::{TxError, TxResult};

/// Upper bound on [`DispatchConfig::max_concurrent_pickups`].  A bid plans
/// routes over one request more than the taxi holds, and the number of
/// orderings grows factorially with the stop count.
pub const MAX_CONCURRENT_PICKUPS: usize = 4;

/// How a taxi values a contract request.  Higher bids always win.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BidMode {
    /// `1 / extra route length` of inserting the request into the current
    /// route.
    #[default]
    RouteCost,
    /// `1 / distance` from the taxi to the pickup point.
    Distance,
}

/// Constants of the contract-net and trade protocols.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatchConfig {
    /// Seats per taxi.
    pub taxi_capacity: u32,

    /// A taxi with this many assigned requests stops bidding even if seats
    /// remain.  Bounds the route optimizer's factorial enumeration.
    pub max_concurrent_pickups: usize,

    /// Taxi speed in distance units per simulated hour.
    pub taxi_speed: f64,

    pub bid_mode: BidMode,

    /// Ticks a requesting customer waits for a bid before re-broadcasting.
    pub request_wait_ticks: u32,

    /// Ticks a dealing customer waits for an accept before re-broadcasting.
    pub accept_wait_ticks: u32,

    /// A pickup later than this after announcement counts as late.
    pub pickup_window_ms: u64,

    /// Whether taxis exchange pending requests among themselves.
    pub trading_enabled: bool,

    /// Ticks after sending a trade deal before the taxi may send another;
    /// its capacity reservation lasts as long.
    pub trade_cooldown_ticks: u32,

    /// Trade requests go to taxis strictly farther than this…
    pub trade_range_min: f64,

    /// …and strictly nearer than this.
    pub trade_range_max: f64,

    /// A trade deal is only sent when profit is strictly above this.
    pub min_trade_profit: f64,

    /// Ring offset beyond which the demand-field search stops once a
    /// non-empty cell was seen.
    pub field_search_range: usize,

    /// Weight of the previous idle vector in the next one.
    pub field_vector_damping: f64,

    /// Idle repositioning stops after this much travel since the taxi last
    /// became idle.  `None` means unlimited.
    pub idle_travel_limit: Option<f64>,
}

impl DispatchConfig {
    /// Reject settings under which the protocol cannot uphold its
    /// invariants.
    pub fn validate(&self) -> TxResult<()> {
        if self.taxi_capacity == 0 {
            return Err(TxError::Config("taxi_capacity must be positive".into()));
        }
        if self.max_concurrent_pickups == 0 {
            return Err(TxError::Config("max_concurrent_pickups must be positive".into()));
        }
        if self.max_concurrent_pickups > MAX_CONCURRENT_PICKUPS {
            return Err(TxError::Config(format!(
                "max_concurrent_pickups must be at most {MAX_CONCURRENT_PICKUPS}, got {}",
                self.max_concurrent_pickups
            )));
        }
        if !(self.taxi_speed.is_finite() && self.taxi_speed > 0.0) {
            return Err(TxError::Config(format!(
                "taxi_speed must be positive and finite, got {}", self.taxi_speed
            )));
        }
        // An accept or trade accept arrives two ticks after the message it
        // answers; shorter windows would re-offer a request still in flight.
        if self.accept_wait_ticks < 2 {
            return Err(TxError::Config("accept_wait_ticks must be at least 2".into()));
        }
        if self.trading_enabled && self.trade_cooldown_ticks < 2 {
            return Err(TxError::Config("trade_cooldown_ticks must be at least 2".into()));
        }
        if self.trade_range_min < 0.0 || self.trade_range_max <= self.trade_range_min {
            return Err(TxError::Config(format!(
                "trade range ({}, {}) is empty", self.trade_range_min, self.trade_range_max
            )));
        }
        if !(0.0..=1.0).contains(&self.field_vector_damping) {
            return Err(TxError::Config("field_vector_damping must be in [0, 1]".into()));
        }
        Ok(())
    }

    /// Distance a taxi covers in `ms` simulated milliseconds.
    #[inline]
    pub fn distance_in(&self, ms: u64) -> f64 {
        self.taxi_speed * ms as f64 / 3_600_000.0
    }

    /// `true` if `travelled` is still under the idle travel limit.
    #[inline]
    pub fn idle_budget_left(&self, travelled: f64) -> bool {
        self.idle_travel_limit.is_none_or(|limit| travelled < limit)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            taxi_capacity:          5,
            max_concurrent_pickups: 3,
            taxi_speed:             15.0,
            bid_mode:               BidMode::RouteCost,
            request_wait_ticks:     5,
            accept_wait_ticks:      3,
            pickup_window_ms:       20 * 60 * 1000,
            trading_enabled:        false,
            trade_cooldown_ticks:   2,
            trade_range_min:        2.0,
            trade_range_max:        2.5,
            min_trade_profit:       0.0,
            field_search_range:     5,
            field_vector_damping:   0.5,
            idle_travel_limit:      None,
        }
    }
}
