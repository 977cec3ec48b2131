//! Dispatch Engine — the taxi side of the contract net.
//!
//! # Tick order
//!
//! 1. Trade cooldown bookkeeping (an expired reservation is released).
//! 2. With free capacity: accept the best fitting deal, then bid on every
//!    fitting request.
//! 3. Drive one leg toward the next stop; on arrival serve every stop at
//!    that point.
//! 4. When idle: follow the demand field with the remaining time.
//! 5. Broadcast position and free capacity.
//! 6. Trade, when enabled (see [`crate::trade`]).
//!
//! # Free capacity
//!
//! `capacity - Σ seats(assigned) - reserved`, but zero as soon as the
//! assigned requests plus an active trade reservation reach
//! `max_concurrent_pickups`.

use std::collections::BTreeSet;

use tx_core::{BidMode, CustomerId, DispatchConfig, Point, TaxiId, Vec2};
use tx_field::NeighborBroadcast;

use crate::route::{plan_route, route_length};
use crate::select::best_by;
use crate::trade::TradeState;
use crate::{
    DispatchError, DispatchResult, Envelope, Host, Outbox, Payload, RequestInfo, Route, StopKind,
    TickContext, TimeBudget,
};

/// Bids divide by a cost; costs below this are treated as this.
const MIN_BID_COST: f64 = 1e-6;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaxiState {
    Idle,
    Busy,
}

/// What happened to a taxi during one tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TaxiEvent {
    Accepted { taxi: TaxiId, customer: CustomerId },
    PickedUp { taxi: TaxiId, customer: CustomerId, at_ms: i64 },
    Delivered { taxi: TaxiId, customer: CustomerId, at_ms: i64 },
    /// `from` handed `customer` over to `to`.
    TradedAway { from: TaxiId, to: TaxiId, customer: CustomerId },
    /// `taxi` took `customer` over from `from`.
    TradeReceived { taxi: TaxiId, from: TaxiId, customer: CustomerId, profit: f64 },
}

// ── Inbox sorting ─────────────────────────────────────────────────────────────

/// A taxi's inbox split by message kind.
#[derive(Default)]
pub(crate) struct TaxiMail {
    pub(crate) deals:          Vec<(RequestInfo, f64)>,
    pub(crate) requests:       Vec<RequestInfo>,
    pub(crate) positions:      Vec<(TaxiId, Point, u32)>,
    pub(crate) trade_requests: Vec<(TaxiId, RequestInfo, f64)>,
    pub(crate) trade_deals:    Vec<(TaxiId, CustomerId, f64)>,
    pub(crate) trade_accepts:  Vec<(TaxiId, RequestInfo)>,
}

impl TaxiMail {
    fn sort(inbox: &[Envelope]) -> Self {
        let mut mail = Self::default();
        for m in inbox {
            match m.payload {
                Payload::ContractRequest { request, .. } => mail.requests.push(request),
                Payload::ContractDeal { request, value } => mail.deals.push((request, value)),
                Payload::Position { position, free_capacity } => {
                    if let Some(taxi) = m.from.taxi() {
                        mail.positions.push((taxi, position, free_capacity));
                    }
                }
                Payload::TradeRequest { taxi, request, reduction } => {
                    mail.trade_requests.push((taxi, request, reduction));
                }
                Payload::TradeDeal { taxi, customer, profit } => {
                    mail.trade_deals.push((taxi, customer, profit));
                }
                Payload::TradeAccept { request } => {
                    if let Some(from) = m.from.taxi() {
                        mail.trade_accepts.push((from, request));
                    }
                }
                Payload::ContractBid { .. } | Payload::ContractAccept { .. } => {
                    tracing::trace!(target: "dispatch", from = %m.from, "customer-bound message ignored by taxi");
                }
            }
        }
        mail
    }
}

// ── Taxi ──────────────────────────────────────────────────────────────────────

/// One vehicle's dispatch state.  Position and passengers live in the host.
#[derive(Debug, Clone)]
pub struct Taxi {
    pub(crate) id:             TaxiId,
    pub(crate) capacity:       u32,
    pub(crate) state:          TaxiState,
    /// Committed requests, picked up or not, in commitment order.
    pub(crate) assigned:       Vec<RequestInfo>,
    pub(crate) picked_up:      BTreeSet<CustomerId>,
    pub(crate) route:          Route,
    pub(crate) field_vector:   Vec2,
    /// Idle travel since the taxi last became idle.
    pub(crate) idle_travel:    f64,
    total_idle_travel:         f64,
    distance_travelled:        f64,
    pub(crate) trade:          TradeState,
}

impl Taxi {
    pub fn new(id: TaxiId, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            state: TaxiState::Idle,
            assigned: Vec::new(),
            picked_up: BTreeSet::new(),
            route: Route::empty(),
            field_vector: Vec2::ZERO,
            idle_travel: 0.0,
            total_idle_travel: 0.0,
            distance_travelled: 0.0,
            trade: TradeState::default(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> TaxiId {
        self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn state(&self) -> TaxiState {
        self.state
    }

    pub fn assigned(&self) -> &[RequestInfo] {
        &self.assigned
    }

    pub fn picked_up(&self) -> &BTreeSet<CustomerId> {
        &self.picked_up
    }

    pub fn is_assigned(&self, customer: CustomerId) -> bool {
        self.assigned.iter().any(|r| r.id == customer)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn total_idle_travel(&self) -> f64 {
        self.total_idle_travel
    }

    pub fn distance_travelled(&self) -> f64 {
        self.distance_travelled
    }

    /// Sum of profits of trades this taxi received.
    pub fn trade_profit(&self) -> f64 {
        self.trade.profit_total
    }

    /// Seats claimed by committed requests.
    pub fn committed_load(&self) -> u32 {
        self.assigned.iter().map(|r| r.capacity).sum()
    }

    /// Seats held back for an outstanding trade deal.
    pub fn reserved_capacity(&self) -> u32 {
        self.trade.reservation.map_or(0, |r| r.capacity)
    }

    pub fn free_capacity(&self, config: &DispatchConfig) -> u32 {
        let slots = self.assigned.len() + usize::from(self.trade.reservation.is_some());
        if slots >= config.max_concurrent_pickups {
            return 0;
        }
        self.capacity.saturating_sub(self.committed_load() + self.reserved_capacity())
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance this taxi by one tick.
    pub fn tick<H: Host + ?Sized>(
        &mut self,
        ctx:   &TickContext<'_>,
        host:  &mut H,
        inbox: &[Envelope],
        out:   &mut Outbox,
    ) -> DispatchResult<Vec<TaxiEvent>> {
        let config = ctx.config;
        let mut events = Vec::new();

        self.trade.begin_tick(config.trade_cooldown_ticks);
        let mail = TaxiMail::sort(inbox);

        let position = host.taxi_position(self.id)?;
        if self.free_capacity(config) > 0 {
            self.handle_deals(config, position, &mail.deals, out, &mut events);
            self.handle_requests(config, position, &mail.requests, out);
        }

        let mut budget = TimeBudget::new(ctx.tick_ms);
        self.follow_route(ctx, host, &mut budget, &mut events)?;
        if self.state == TaxiState::Idle {
            self.reposition(ctx, host, &mail.positions, &mut budget)?;
        }

        let position = host.taxi_position(self.id)?;
        out.broadcast(self.id, Payload::Position { position, free_capacity: self.free_capacity(config) });

        if config.trading_enabled {
            self.trade(config, position, &mail, out, &mut events)?;
        }

        if !self.route.is_well_ordered(&self.picked_up) {
            return Err(DispatchError::Invariant(format!("{} holds an ill-ordered route", self.id)));
        }
        Ok(events)
    }

    /// Best route over the current commitments, optionally plus `extra`.
    pub(crate) fn plan_with(&self, position: Point, extra: Option<&RequestInfo>) -> Route {
        match extra {
            None => plan_route(position, &self.assigned, &self.picked_up),
            Some(r) => {
                let mut requests = self.assigned.clone();
                requests.push(*r);
                plan_route(position, &requests, &self.picked_up)
            }
        }
    }

    pub(crate) fn replan(&mut self, position: Point) {
        self.route = self.plan_with(position, None);
    }

    // ── Contract net ──────────────────────────────────────────────────────

    fn handle_deals(
        &mut self,
        config:   &DispatchConfig,
        position: Point,
        deals:    &[(RequestInfo, f64)],
        out:      &mut Outbox,
        events:   &mut Vec<TaxiEvent>,
    ) {
        let free = self.free_capacity(config);
        let fitting = deals.iter().filter(|(r, _)| r.capacity <= free && !self.is_assigned(r.id));
        let Some(&(request, value)) = best_by(fitting, |(_, v)| *v, |(r, _)| r.id) else {
            return;
        };

        out.send(self.id, request.id, Payload::ContractAccept { taxi: self.id });
        self.assigned.push(request);
        self.replan(position);
        self.state = TaxiState::Busy;
        tracing::debug!(target: "dispatch", taxi = %self.id, customer = %request.id, value, "deal accepted");
        events.push(TaxiEvent::Accepted { taxi: self.id, customer: request.id });
    }

    fn handle_requests(
        &self,
        config:   &DispatchConfig,
        position: Point,
        requests: &[RequestInfo],
        out:      &mut Outbox,
    ) {
        let free = self.free_capacity(config);
        if free == 0 {
            return;
        }
        for request in requests.iter().filter(|r| r.capacity <= free) {
            let value = self.bid_value(config.bid_mode, position, request);
            out.send(self.id, request.id, Payload::ContractBid { taxi: self.id, value });
        }
    }

    /// Higher is better in both modes.
    pub(crate) fn bid_value(&self, mode: BidMode, position: Point, request: &RequestInfo) -> f64 {
        let cost = match mode {
            BidMode::RouteCost => {
                let current = route_length(position, &self.route.stops);
                self.plan_with(position, Some(request)).length - current
            }
            BidMode::Distance => position.distance(request.pickup),
        };
        1.0 / cost.max(MIN_BID_COST)
    }

    // ── Movement ──────────────────────────────────────────────────────────

    fn follow_route<H: Host + ?Sized>(
        &mut self,
        ctx:    &TickContext<'_>,
        host:   &mut H,
        budget: &mut TimeBudget,
        events: &mut Vec<TaxiEvent>,
    ) -> DispatchResult<()> {
        let Some(next) = self.route.stops.first().copied() else {
            return Ok(());
        };

        let progress = host.move_to(self.id, next.location, budget)?;
        self.distance_travelled += progress.distance;
        if !progress.arrived {
            return Ok(());
        }

        let at_ms = ctx.now_ms + (ctx.tick_ms - budget.remaining_ms()) as i64;
        while let Some(stop) = self.route.stops.first().copied() {
            if stop.location != next.location {
                break;
            }
            self.route.stops.remove(0);
            match stop.kind {
                StopKind::Delivery => {
                    host.deliver(self.id, stop.customer, at_ms)?;
                    self.assigned.retain(|r| r.id != stop.customer);
                    self.picked_up.remove(&stop.customer);
                    events.push(TaxiEvent::Delivered { taxi: self.id, customer: stop.customer, at_ms });
                }
                StopKind::Pickup => {
                    host.pickup(self.id, stop.customer, at_ms)?;
                    self.picked_up.insert(stop.customer);
                    events.push(TaxiEvent::PickedUp { taxi: self.id, customer: stop.customer, at_ms });
                }
            }
        }

        self.route.length = route_length(next.location, &self.route.stops);
        if self.route.is_empty() {
            if !self.assigned.is_empty() {
                return Err(DispatchError::Invariant(format!(
                    "{} finished its route with {} requests still assigned",
                    self.id,
                    self.assigned.len()
                )));
            }
            self.become_idle();
        }
        Ok(())
    }

    pub(crate) fn become_idle(&mut self) {
        self.state = TaxiState::Idle;
        self.idle_travel = 0.0;
    }

    fn reposition<H: Host + ?Sized>(
        &mut self,
        ctx:       &TickContext<'_>,
        host:      &mut H,
        positions: &[(TaxiId, Point, u32)],
        budget:    &mut TimeBudget,
    ) -> DispatchResult<()> {
        let Some(field) = ctx.field else {
            return Ok(());
        };
        if !budget.has_time_left() || !ctx.config.idle_budget_left(self.idle_travel) {
            return Ok(());
        }

        let position = host.taxi_position(self.id)?;
        let neighbors: Vec<NeighborBroadcast> = positions
            .iter()
            .map(|&(_, position, free_capacity)| NeighborBroadcast { position, free_capacity })
            .collect();

        let pull = field.positioning_vector(position, ctx.now_ms, &neighbors, ctx.config.field_search_range);
        self.field_vector = pull.add_scaled(ctx.config.field_vector_damping, self.field_vector);

        let target = host.bounds().clamp(position + self.field_vector);
        if target == position {
            return Ok(());
        }
        let progress = host.move_to(self.id, target, budget)?;
        self.idle_travel += progress.distance;
        self.total_idle_travel += progress.distance;
        self.distance_travelled += progress.distance;
        Ok(())
    }
}

impl std::fmt::Display for Taxi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{{:?} {}/{}", self.id, self.state, self.committed_load(), self.capacity)?;
        for r in &self.assigned {
            write!(f, " {}", r.id.0)?;
        }
        write!(f, "}}")
    }
}
