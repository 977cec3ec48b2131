//! The capabilities agents need from the world they live in.
//!
//! Agents never own their position or their passengers: they ask the host
//! where they are, ask it to move them, and ask it to load and unload
//! customers.  `tx-mobility` provides the reference implementation.

use thiserror::Error;

use tx_core::{Bounds, CustomerId, Point, TaxiId};

// ── Time budget ───────────────────────────────────────────────────────────────

/// Simulated time a taxi may still spend moving during the current tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeBudget {
    remaining_ms: u64,
}

impl TimeBudget {
    #[inline]
    pub fn new(ms: u64) -> Self {
        Self { remaining_ms: ms }
    }

    #[inline]
    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    #[inline]
    pub fn has_time_left(&self) -> bool {
        self.remaining_ms > 0
    }

    /// Spend up to `ms`; returns what was actually spent.
    pub fn consume(&mut self, ms: u64) -> u64 {
        let spent = ms.min(self.remaining_ms);
        self.remaining_ms -= spent;
        spent
    }
}

/// Outcome of one `move_to` call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MoveProgress {
    pub distance:   f64,
    pub elapsed_ms: u64,
    /// The taxi now stands exactly on the target.
    pub arrived:    bool,
}

impl MoveProgress {
    pub const NONE: MoveProgress = MoveProgress { distance: 0.0, elapsed_ms: 0, arrived: false };
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Precondition violations reported by a host.  These signal a bug in the
/// caller, not a recoverable condition.
#[derive(Debug, Error, PartialEq)]
pub enum HostError {
    #[error("unknown taxi {0}")]
    UnknownTaxi(TaxiId),

    #[error("unknown customer {0}")]
    UnknownCustomer(CustomerId),

    #[error("{0} is already on the map")]
    AlreadyPlaced(String),

    #[error("{customer} is not waiting at a pickup point")]
    NotWaiting { customer: CustomerId },

    #[error("{customer} is not aboard {taxi}")]
    NotAboard { taxi: TaxiId, customer: CustomerId },

    #[error("{taxi} is not at the stop of {customer}")]
    NotAtStop { taxi: TaxiId, customer: CustomerId },

    #[error("{taxi} cannot seat {customer}: {needed} needed, {free} free")]
    NoSeats { taxi: TaxiId, customer: CustomerId, needed: u32, free: u32 },

    #[error("{0} lies outside the operating area")]
    OutOfBounds(Point),
}

pub type HostResult<T> = Result<T, HostError>;

// ── Host ──────────────────────────────────────────────────────────────────────

/// Position, movement and container services consumed by the agents.
pub trait Host {
    /// Operating area; idle repositioning targets are clamped to it.
    fn bounds(&self) -> Bounds;

    fn taxi_position(&self, taxi: TaxiId) -> HostResult<Point>;

    /// Move `taxi` toward `target`, spending at most the remaining `budget`.
    /// The taxi may stop short; on arrival it stands exactly on `target`.
    fn move_to(
        &mut self,
        taxi:   TaxiId,
        target: Point,
        budget: &mut TimeBudget,
    ) -> HostResult<MoveProgress>;

    /// Load a waiting customer.  The taxi must stand on the customer's pickup
    /// point with enough free seats.
    fn pickup(&mut self, taxi: TaxiId, customer: CustomerId, now_ms: i64) -> HostResult<()>;

    /// Unload a customer the taxi carries.  The customer leaves the map.
    fn deliver(&mut self, taxi: TaxiId, customer: CustomerId, now_ms: i64) -> HostResult<()>;

    /// `true` if `taxi` stands exactly on `point`.
    fn is_at(&self, taxi: TaxiId, point: Point) -> HostResult<bool> {
        Ok(self.taxi_position(taxi)? == point)
    }
}
