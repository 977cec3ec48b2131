//! `tx-mobility` — the world taxis drive in.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`state`]   | `VehicleState`, `ParcelState`: per-taxi and per-customer data |
//! | [`model`]   | `PlaneModel`: implements `tx_dispatch::Host`                  |
//! | [`error`]   | `MobilityError`, `MobilityResult<T>`                          |
//!
//! # Movement model
//!
//! Vehicles drive in straight lines at a fixed speed inside a rectangle.
//! Each `move_to` spends as much of the caller's time budget as the leg
//! needs; a vehicle that reaches its target stands exactly on it, one that
//! runs out of time stops part-way along the segment.

pub mod error;
pub mod model;
pub mod state;

#[cfg(test)]
mod tests;

pub use error::{MobilityError, MobilityResult};
pub use model::PlaneModel;
pub use state::{ParcelState, VehicleState};
