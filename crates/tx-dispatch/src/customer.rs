//! Negotiation Engine — the customer side of the contract net.
//!
//! ```text
//!   Init ──announce──▶ Requesting ──best bid──▶ Dealing ──accept──▶ Taken
//!                        ▲    │                    │
//!                        │    └─ no bid for W+1 ───┤ (re-broadcast)
//!                        └──── no accept for A ────┘
//! ```
//!
//! - `W` = `request_wait_ticks`: a requesting customer re-broadcasts on the
//!   `W + 1`-th consecutive tick without a bid.
//! - `A` = `accept_wait_ticks`: a dealing customer gives up on its taxi `A`
//!   ticks after sending the deal.
//!
//! Retries are unbounded; the simulation's stop condition ends them.

use tx_core::{CustomerId, TaxiId};

use crate::select::best_by;
use crate::{Envelope, Outbox, Payload, RequestInfo, TickContext};

/// Pickup must happen inside `[open_ms, close_ms]` to count as on time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    pub open_ms:  i64,
    pub close_ms: i64,
}

impl TimeWindow {
    #[inline]
    pub fn contains(&self, ms: i64) -> bool {
        (self.open_ms..=self.close_ms).contains(&ms)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NegotiationState {
    Init,
    Requesting,
    /// A deal went out to `taxi`; waiting for its accept.
    Dealing { taxi: TaxiId },
    /// Committed to `taxi`.  Terminal.
    Taken { taxi: TaxiId },
}

/// Notable transitions, reported to the simulation for bookkeeping.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CustomerEvent {
    /// A request went out; `attempt` 1 is the announcement.
    Requested { attempt: u32 },
    Dealt { taxi: TaxiId, value: f64 },
    Taken { taxi: TaxiId },
}

/// One transport request and its negotiation state.
#[derive(Debug, Clone)]
pub struct Customer {
    info:             RequestInfo,
    announce_ms:      i64,
    window:           TimeWindow,
    state:            NegotiationState,
    requests_sent:    u32,
    ticks_waiting:    u32,
    ticks_since_deal: u32,
    picked_up_ms:     Option<i64>,
    delivered_ms:     Option<i64>,
}

impl Customer {
    pub fn new(info: RequestInfo, announce_ms: i64, window: TimeWindow) -> Self {
        Self {
            info,
            announce_ms,
            window,
            state: NegotiationState::Init,
            requests_sent: 0,
            ticks_waiting: 0,
            ticks_since_deal: 0,
            picked_up_ms: None,
            delivered_ms: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> CustomerId {
        self.info.id
    }

    pub fn info(&self) -> &RequestInfo {
        &self.info
    }

    pub fn announce_ms(&self) -> i64 {
        self.announce_ms
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Requests broadcast so far, the announcement included.
    pub fn requests_sent(&self) -> u32 {
        self.requests_sent
    }

    /// Re-broadcasts after the announcement.
    pub fn retries(&self) -> u32 {
        self.requests_sent.saturating_sub(1)
    }

    pub fn is_taken(&self) -> bool {
        matches!(self.state, NegotiationState::Taken { .. })
    }

    pub fn picked_up_ms(&self) -> Option<i64> {
        self.picked_up_ms
    }

    pub fn delivered_ms(&self) -> Option<i64> {
        self.delivered_ms
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered_ms.is_some()
    }

    /// Announcement-to-pickup delay, once picked up.
    pub fn waiting_ms(&self) -> Option<i64> {
        self.picked_up_ms.map(|t| t - self.announce_ms)
    }

    pub fn mark_picked_up(&mut self, now_ms: i64) {
        self.picked_up_ms = Some(now_ms);
    }

    pub fn mark_delivered(&mut self, now_ms: i64) {
        self.delivered_ms = Some(now_ms);
    }

    /// Record that a trade moved this request to `taxi`.  Only meaningful
    /// once taken.
    pub fn hand_over(&mut self, taxi: TaxiId) {
        if self.is_taken() {
            self.state = NegotiationState::Taken { taxi };
        }
    }

    /// Taxi currently committed to this request.
    pub fn assigned_taxi(&self) -> Option<TaxiId> {
        match self.state {
            NegotiationState::Taken { taxi } => Some(taxi),
            _ => None,
        }
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance the negotiation by one tick.
    pub fn tick(&mut self, ctx: &TickContext<'_>, inbox: &[Envelope], out: &mut Outbox) -> Option<CustomerEvent> {
        match self.state {
            NegotiationState::Init => Some(self.send_request(out)),
            NegotiationState::Requesting => self.on_requesting(ctx, inbox, out),
            NegotiationState::Dealing { taxi } => self.on_dealing(ctx, taxi, inbox, out),
            NegotiationState::Taken { .. } => None,
        }
    }

    fn send_request(&mut self, out: &mut Outbox) -> CustomerEvent {
        self.requests_sent += 1;
        self.ticks_waiting = 0;
        self.state = NegotiationState::Requesting;
        let attempt = self.requests_sent;
        out.broadcast(self.id(), Payload::ContractRequest { request: self.info, attempt });
        if attempt > 1 {
            tracing::debug!(target: "negotiation", customer = %self.id(), attempt, "request re-broadcast");
        }
        CustomerEvent::Requested { attempt }
    }

    fn on_requesting(&mut self, ctx: &TickContext<'_>, inbox: &[Envelope], out: &mut Outbox) -> Option<CustomerEvent> {
        let bids = inbox.iter().filter_map(|m| match m.payload {
            Payload::ContractBid { taxi, value } => Some((taxi, value)),
            _ => None,
        });

        match best_by(bids, |&(_, v)| v, |&(t, _)| t) {
            Some((taxi, value)) => {
                out.send(self.id(), taxi, Payload::ContractDeal { request: self.info, value });
                self.ticks_since_deal = 0;
                self.state = NegotiationState::Dealing { taxi };
                tracing::debug!(target: "negotiation", customer = %self.id(), %taxi, value, "deal sent");
                Some(CustomerEvent::Dealt { taxi, value })
            }
            None => {
                self.ticks_waiting += 1;
                if self.ticks_waiting > ctx.config.request_wait_ticks {
                    Some(self.send_request(out))
                } else {
                    None
                }
            }
        }
    }

    fn on_dealing(
        &mut self,
        ctx:   &TickContext<'_>,
        dealt: TaxiId,
        inbox: &[Envelope],
        out:   &mut Outbox,
    ) -> Option<CustomerEvent> {
        self.ticks_since_deal += 1;

        let mut accepted = false;
        for m in inbox {
            if let Payload::ContractAccept { taxi } = m.payload {
                if taxi == dealt {
                    accepted = true;
                } else {
                    tracing::warn!(target: "negotiation", customer = %self.id(), %taxi, "accept from a taxi that was not dealt");
                }
            }
        }

        if accepted {
            self.state = NegotiationState::Taken { taxi: dealt };
            tracing::debug!(target: "negotiation", customer = %self.id(), taxi = %dealt, "taken");
            return Some(CustomerEvent::Taken { taxi: dealt });
        }
        if self.ticks_since_deal >= ctx.config.accept_wait_ticks {
            return Some(self.send_request(out));
        }
        None
    }
}
