//! `tx-core` — foundational types for the taxi dispatch simulator.
//!
//! This crate is a dependency of every other `tx-*` crate.  It intentionally
//! has no `tx-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `TaxiId`, `CustomerId`, `AgentRef`                        |
//! | [`geo`]         | `Point`, `Vec2`, `Bounds`, `GeoPoint`, `Projection`       |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`                           |
//! | [`config`]      | `DispatchConfig`, `BidMode`                               |
//! | [`rng`]         | `SimRng` (seeded, run-wide)                               |
//! | [`error`]       | `TxError`, `TxResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{BidMode, DispatchConfig, MAX_CONCURRENT_PICKUPS};
pub use error::{TxError, TxResult};
pub use geo::{Bounds, GeoPoint, Point, Projection, Vec2};
pub use ids::{AgentRef, CustomerId, TaxiId};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick};
