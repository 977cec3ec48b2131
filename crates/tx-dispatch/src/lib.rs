//! `tx-dispatch` — the agents: customers negotiating for a ride, taxis
//! bidding, routing and trading requests among themselves.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                        |
//! |--------------|-----------------------------------------------------------------|
//! | [`message`]  | `RequestInfo`, `Payload`, `Envelope`, `Outbox`                  |
//! | [`host`]     | `Host` trait: position, movement and container services         |
//! | [`context`]  | `TickContext<'a>`: read-only per-tick inputs                    |
//! | [`route`]    | Route Optimizer: `plan_route`, `Route`, `RouteStop`             |
//! | [`customer`] | Negotiation Engine: `Customer`, `NegotiationState`              |
//! | [`taxi`]     | Dispatch Engine: `Taxi`, `TaxiState`, `TaxiEvent`               |
//! | [`trade`]    | Trade Engine (taxi ↔ taxi reassignment of pending requests)     |
//! | [`select`]   | Deterministic maximum selection with explicit tie-breaks        |
//! | [`error`]    | `DispatchError`, `DispatchResult<T>`                            |
//!
//! # Tick contract
//!
//! The simulation calls `Customer::tick` and `Taxi::tick` once per agent per
//! tick.  Each call receives the agent's inbox (everything delivered since
//! its last tick, read once) and an [`Outbox`] for new messages.  Nothing an
//! agent sends is visible to anyone before the next tick.
//!
//! Every selection among competing messages (best bid, best deal, best
//! trade) is made through [`select::best_by`], so the outcome does not
//! depend on inbox order.

pub mod context;
pub mod customer;
pub mod error;
pub mod host;
pub mod message;
pub mod route;
pub mod select;
pub mod taxi;
pub mod trade;


pub use context::TickContext;
pub use customer::{Customer, CustomerEvent, NegotiationState, TimeWindow};
pub use error::{DispatchError, DispatchResult};
pub use host::{Host, HostError, HostResult, MoveProgress, TimeBudget};
pub use message::{Envelope, Outbox, Outgoing, Payload, Recipient, RequestInfo};
pub use route::{plan_route, route_length, Route, RouteStop, StopKind};
pub use taxi::{Taxi, TaxiEvent, TaxiState};
pub use trade::Reservation;
