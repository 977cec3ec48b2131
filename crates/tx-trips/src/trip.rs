//! A single historical trip, already projected onto the simulation plane.

use tx_core::Point;

/// One historical pickup → dropoff trip.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trip {
    /// Milliseconds from simulation start to the recorded pickup.  Negative
    /// for trips before the start (still useful when building the demand
    /// field).
    pub announce_ms: i64,
    pub passengers:  u32,
    pub pickup:      Point,
    pub dropoff:     Point,
}
