//! Message payloads exchanged by customers and taxis.
//!
//! Every message is one variant of [`Payload`]; agents react by exhaustive
//! matching.  Messages are addressed either to one agent or to every taxi
//! (all broadcasts in the protocol, requests and positions alike, are only
//! of interest to taxis).

use tx_core::{AgentRef, CustomerId, Point, TaxiId};

/// What a taxi needs to know about a customer to bid, route and trade.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestInfo {
    pub id:       CustomerId,
    pub pickup:   Point,
    pub delivery: Point,
    /// Seats required.
    pub capacity: u32,
}

/// Message contents.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Payload {
    // ── Contract net (customer ↔ taxi) ────────────────────────────────────
    /// Customer → all taxis: "who can serve me?"  `attempt` starts at 1.
    ContractRequest { request: RequestInfo, attempt: u32 },
    /// Taxi → customer.  Higher values are more attractive.
    ContractBid { taxi: TaxiId, value: f64 },
    /// Customer → winning taxi, echoing the winning bid value.
    ContractDeal { request: RequestInfo, value: f64 },
    /// Taxi → customer: the request is now committed to `taxi`.
    ContractAccept { taxi: TaxiId },

    // ── Fleet awareness ───────────────────────────────────────────────────
    /// Taxi → all taxis, every tick.
    Position { position: Point, free_capacity: u32 },

    // ── Trading (taxi ↔ taxi) ─────────────────────────────────────────────
    /// Holder → nearby taxis: giving `request` away shortens my route by
    /// `reduction`.
    TradeRequest { taxi: TaxiId, request: RequestInfo, reduction: f64 },
    /// Candidate → holder: taking `customer` gains the fleet `profit`.
    TradeDeal { taxi: TaxiId, customer: CustomerId, profit: f64 },
    /// Holder → chosen candidate: `request` is yours.
    TradeAccept { request: RequestInfo },
}

/// A delivered message.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Envelope {
    pub from:    AgentRef,
    pub payload: Payload,
}

/// Addressee of an outgoing message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Recipient {
    /// Every registered taxi except the sender.
    Taxis,
    One(AgentRef),
}

/// A message queued during the current tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Outgoing {
    pub from:    AgentRef,
    pub to:      Recipient,
    pub payload: Payload,
}

/// Messages produced during one tick, in send order.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Outgoing>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, from: impl Into<AgentRef>, to: impl Into<AgentRef>, payload: Payload) {
        self.queue.push(Outgoing { from: from.into(), to: Recipient::One(to.into()), payload });
    }

    pub fn broadcast(&mut self, from: impl Into<AgentRef>, payload: Payload) {
        self.queue.push(Outgoing { from: from.into(), to: Recipient::Taxis, payload });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outgoing> {
        self.queue.iter()
    }

    /// Take every queued message, leaving the outbox empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Outgoing> {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
