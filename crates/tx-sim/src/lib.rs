//! `tx-sim` — tick loop orchestrator for the taxi dispatch simulator.
//!
//! # Tick loop
//!
//! ```text
//! while !finished:
//!   ① Announce:  drain the trip feed for [tick_start, tick_end), sample,
//!                 place each new customer on the plane.
//!   ② Customers: Customer::tick in ascending CustomerId order.
//!   ③ Taxis:     Taxi::tick in ascending TaxiId order; pickups,
//!                 deliveries and trades are written back to the customers.
//!   ④ Collect:   delivered customers leave the run.
//!   ⑤ Post:      everything sent this tick lands in the recipients'
//!                 inboxes, readable from the next tick on.
//! ```
//!
//! Requests are fed while `tick < total_ticks`.  The run then keeps going
//! until no customer is outstanding and every taxi is idle, or until
//! `max_drain_ticks` more ticks have passed.
//!
//! # Cargo features
//!
//! | Feature   | Effect                                            |
//! |-----------|---------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for the inbox map.      |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tx_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config, dispatch, projection.bounds())
//!     .trips(feed)
//!     .field(field)
//!     .taxis(50)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod event;
pub mod observer;
pub mod post;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use event::{SimEvent, TickSummary};
pub use observer::{NoopObserver, SimObserver};
pub use post::PostOffice;
pub use sim::Sim;
