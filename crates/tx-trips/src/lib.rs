//! `tx-trips` — historical trip records, CSV loading, and the request feed.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`trip`]      | `Trip`: a projected, time-anchored historical trip        |
//! | [`loader`]    | `load_trips_csv`, `load_trips_reader`, `LoadReport`       |
//! | [`feed`]      | `TripFeed` (`BTreeMap<announce_ms, Vec<Trip>>`)           |
//! | [`error`]     | `TripsError`, `TripsResult<T>`                            |
//!
//! The same loaded trips serve two consumers: the demand-field builder reads
//! every pickup once before the run, and the simulation drains the feed one
//! tick window at a time to announce live requests.

pub mod error;
pub mod feed;
pub mod loader;
pub mod trip;


pub use error::{TripsError, TripsResult};
pub use feed::TripFeed;
pub use loader::{load_trips_csv, load_trips_reader, LoadReport, DATETIME_FORMAT};
pub use trip::Trip;
