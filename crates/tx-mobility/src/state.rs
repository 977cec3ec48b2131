//! Per-vehicle and per-customer state held by the plane model.

use tx_core::{CustomerId, Point, TaxiId};

/// Where a customer is in its journey.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ParcelState {
    /// Standing at its pickup point.
    Waiting { at: Point },
    Aboard { taxi: TaxiId },
    Delivered,
}

/// A customer known to the model.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Parcel {
    pub state:    ParcelState,
    pub delivery: Point,
    pub seats:    u32,
}

/// One vehicle on the plane.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleState {
    pub position: Point,
    pub capacity: u32,
    /// Customers currently aboard, in boarding order.
    pub aboard:   Vec<CustomerId>,
    /// Seats taken by `aboard`.
    pub load:     u32,
    /// Total distance driven.
    pub odometer: f64,
}

impl VehicleState {
    pub fn new(position: Point, capacity: u32) -> Self {
        Self { position, capacity, aboard: Vec::new(), load: 0, odometer: 0.0 }
    }

    #[inline]
    pub fn free_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.load)
    }
}
