//! Trade Engine — taxis hand pending requests to better-placed peers.
//!
//! # Protocol
//!
//! ```text
//!   holder H                          candidate C
//!   ────────                          ───────────
//!   TradeRequest(req, reduction) ───▶
//!                                     profit = reduction − marginal cost
//!                                ◀─── TradeDeal(profit)      [reserve seats]
//!   best deal, req still pending?
//!   TradeAccept(req) ────────────▶    add req, release reservation
//!   drop req, replan
//! ```
//!
//! Runs after the dispatch logic every tick, in the order accept → deals →
//! respond → advertise.  Only requests not yet picked up are traded.
//!
//! A candidate answers at most one trade request per cooldown window and
//! holds the request's seats (and one concurrent slot) for that window.  The
//! accept reaches it two ticks after its deal, which is why the cooldown may
//! not be shorter than two ticks.

use tx_core::{CustomerId, DispatchConfig, Point, TaxiId};

use crate::route::{plan_route, route_length};
use crate::select::best_by;
use crate::taxi::TaxiMail;
use crate::{DispatchError, DispatchResult, Outbox, Payload, RequestInfo, Taxi, TaxiEvent, TaxiState};

/// Seats held for an outstanding trade deal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Reservation {
    pub customer: CustomerId,
    pub capacity: u32,
    pub profit:   f64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TradeState {
    /// `None` until the first trade deal is sent.
    ticks_since_deal:        Option<u32>,
    pub(crate) reservation:  Option<Reservation>,
    pub(crate) profit_total: f64,
}

impl TradeState {
    /// Age the last deal and release its reservation once the cooldown is
    /// over.
    pub(crate) fn begin_tick(&mut self, cooldown: u32) {
        self.ticks_since_deal = self.ticks_since_deal.map(|t| t.saturating_add(1));
        if self.may_respond(cooldown) {
            self.reservation = None;
        }
    }

    pub(crate) fn may_respond(&self, cooldown: u32) -> bool {
        self.ticks_since_deal.is_none_or(|t| t > cooldown)
    }

    fn start_cooldown(&mut self, reservation: Reservation) {
        self.ticks_since_deal = Some(0);
        self.reservation = Some(reservation);
    }
}

impl Taxi {
    pub fn reservation(&self) -> Option<Reservation> {
        self.trade.reservation
    }

    pub(crate) fn trade(
        &mut self,
        config:   &DispatchConfig,
        position: Point,
        mail:     &TaxiMail,
        out:      &mut Outbox,
        events:   &mut Vec<TaxiEvent>,
    ) -> DispatchResult<()> {
        self.receive_traded(position, &mail.trade_accepts, events)?;
        self.give_away(position, &mail.trade_deals, out, events);

        let remaining = route_length(position, &self.route.stops);
        if self.trade.may_respond(config.trade_cooldown_ticks) {
            self.respond(config, position, remaining, &mail.trade_requests, out);
        }
        self.advertise(config, position, remaining, &mail.positions, out);
        Ok(())
    }

    /// Take over a request whose holder accepted our deal.
    fn receive_traded(
        &mut self,
        position: Point,
        accepts:  &[(TaxiId, RequestInfo)],
        events:   &mut Vec<TaxiEvent>,
    ) -> DispatchResult<()> {
        for &(from, request) in accepts {
            let reservation = self
                .trade
                .reservation
                .filter(|r| r.customer == request.id)
                .ok_or_else(|| {
                    DispatchError::Invariant(format!(
                        "{} received {} from {from} without a matching reservation",
                        self.id, request.id
                    ))
                })?;

            self.trade.reservation = None;
            self.trade.profit_total += reservation.profit;
            self.assigned.push(request);
            self.replan(position);
            self.state = TaxiState::Busy;
            tracing::debug!(target: "trade", taxi = %self.id, %from, customer = %request.id, profit = reservation.profit, "trade received");
            events.push(TaxiEvent::TradeReceived {
                taxi: self.id,
                from,
                customer: request.id,
                profit: reservation.profit,
            });
        }
        Ok(())
    }

    /// Hand the best-offered request to its bidder, if still pending here.
    fn give_away(
        &mut self,
        position: Point,
        deals:    &[(TaxiId, CustomerId, f64)],
        out:      &mut Outbox,
        events:   &mut Vec<TaxiEvent>,
    ) {
        let Some(&(to, customer, profit)) = best_by(deals, |(_, _, p)| *p, |(t, c, _)| (*c, *t)) else {
            return;
        };
        if self.picked_up.contains(&customer) {
            return;
        }
        let Some(idx) = self.assigned.iter().position(|r| r.id == customer) else {
            return;
        };

        let request = self.assigned.remove(idx);
        out.send(self.id, to, Payload::TradeAccept { request });
        self.replan(position);
        if self.assigned.is_empty() {
            self.become_idle();
        }
        tracing::debug!(target: "trade", taxi = %self.id, %to, %customer, profit, "trade given away");
        events.push(TaxiEvent::TradedAway { from: self.id, to, customer });
    }

    /// Answer the most profitable trade request with a deal.
    fn respond(
        &mut self,
        config:    &DispatchConfig,
        position:  Point,
        remaining: f64,
        requests:  &[(TaxiId, RequestInfo, f64)],
        out:       &mut Outbox,
    ) {
        let free = self.free_capacity(config);
        let offers = requests
            .iter()
            .filter(|(_, r, _)| r.capacity <= free && !self.is_assigned(r.id))
            .map(|&(holder, request, reduction)| {
                let marginal = self.plan_with(position, Some(&request)).length - remaining;
                (holder, request, reduction - marginal)
            })
            .filter(|&(_, _, profit)| profit > config.min_trade_profit);

        let Some((holder, request, profit)) = best_by(offers, |o| o.2, |o| (o.1.id, o.0)) else {
            return;
        };

        out.send(self.id, holder, Payload::TradeDeal { taxi: self.id, customer: request.id, profit });
        self.trade.start_cooldown(Reservation { customer: request.id, capacity: request.capacity, profit });
        tracing::debug!(target: "trade", taxi = %self.id, %holder, customer = %request.id, profit, "trade deal sent");
    }

    /// Offer the request whose removal shortens our route most to every taxi
    /// inside the trade annulus.
    fn advertise(
        &self,
        config:    &DispatchConfig,
        position:  Point,
        remaining: f64,
        positions: &[(TaxiId, Point, u32)],
        out:       &mut Outbox,
    ) {
        let mut partners: Vec<TaxiId> = positions
            .iter()
            .filter(|(_, p, _)| {
                let d = position.distance(*p);
                d > config.trade_range_min && d < config.trade_range_max
            })
            .map(|(t, _, _)| *t)
            .collect();
        if partners.is_empty() {
            return;
        }
        partners.sort_unstable();
        partners.dedup();

        let candidates = self
            .assigned
            .iter()
            .filter(|r| !self.picked_up.contains(&r.id))
            .map(|r| {
                let without: Vec<RequestInfo> = self.assigned.iter().filter(|o| o.id != r.id).copied().collect();
                (*r, remaining - plan_route(position, &without, &self.picked_up).length)
            })
            .filter(|&(_, reduction)| reduction > 0.0);

        let Some((request, reduction)) = best_by(candidates, |c| c.1, |c| c.0.id) else {
            return;
        };

        for taxi in partners {
            out.send(self.id, taxi, Payload::TradeRequest { taxi: self.id, request, reduction });
        }
    }
}
