//! `tx-field` — the Demand Field.
//!
//! A discretised estimate of pickup density over space and time, built once
//! from historical trips before the run and shared read-only by every taxi.
//! Idle taxis query it for a positioning vector that pulls them toward
//! nearby demand and pushes them away from peers with spare capacity.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`grid`]     | `GridShape`: cell geometry over the operating area           |
//! | [`builder`]  | `FieldConfig`, `FieldBuilder` (count → smooth → per-frame max) |
//! | [`field`]    | `DemandField`, `NeighborBroadcast`, `FieldScan`, ring search |
//! | [`error`]    | `FieldError`, `FieldResult<T>`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on config and grid types.  |

pub mod builder;
pub mod error;
pub mod field;
pub mod grid;

#[cfg(test)]
mod tests;

pub use builder::{FieldBuilder, FieldConfig};
pub use error::{FieldError, FieldResult};
pub use field::{DemandField, FieldScan, NeighborBroadcast};
pub use grid::{Cell, GridShape};
