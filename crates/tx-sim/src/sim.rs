//! The `Sim` struct and its tick loop.

use std::collections::BTreeMap;

use tx_core::{AgentRef, CustomerId, DispatchConfig, SimClock, SimConfig, SimRng, Tick};
use tx_dispatch::{
    Customer, CustomerEvent, NegotiationState, Outbox, RequestInfo, Taxi, TaxiEvent, TaxiState,
    TickContext, TimeWindow,
};
use tx_field::DemandField;
use tx_mobility::PlaneModel;
use tx_trips::{Trip, TripFeed};

use crate::{PostOffice, SimError, SimEvent, SimObserver, SimResult, TickSummary};

/// Progress is logged at `info` every this many ticks.
const PROGRESS_EVERY: u64 = 3_600;

const MS_PER_HOUR: f64 = 3_600_000.0;

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Owns every agent, the plane they drive on and the post office routing
/// their messages.  Each tick runs the five phases described in the crate
/// docs; agents only ever see each other through messages.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    /// Run-level configuration (tick length, horizon, seed, …).
    pub config: SimConfig,

    /// Protocol constants handed to every agent through `TickContext`.
    pub dispatch: DispatchConfig,

    /// Simulation clock: tracks the current tick.
    pub clock: SimClock,

    /// Run-wide RNG; drives request sampling.
    pub(crate) rng: SimRng,

    /// Historical trips not yet announced.
    pub(crate) feed: TripFeed,

    /// Read-only after construction; shared by every idle taxi.
    pub(crate) field: Option<DemandField>,

    /// Positions and passenger containers.
    pub(crate) world: PlaneModel,

    /// Indexed by `TaxiId`.
    pub(crate) taxis: Vec<Taxi>,

    /// Live customers; delivered ones are removed at the end of their tick.
    pub(crate) customers: BTreeMap<CustomerId, Customer>,

    pub(crate) post: PostOffice,

    pub(crate) next_customer: u64,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run until the stop condition holds.  Returns the first tick not
    /// simulated.
    ///
    /// Use [`NoopObserver`][crate::NoopObserver] if you don't need
    /// callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<Tick> {
        tracing::info!(
            target: "sim",
            taxis = self.taxis.len(),
            trips = self.feed.len(),
            total_ticks = self.config.total_ticks,
            "run started"
        );

        while !self.is_finished() {
            self.step(observer)?;
        }

        let end = self.clock.current_tick;
        if !self.customers.is_empty() {
            tracing::warn!(target: "sim", outstanding = self.customers.len(), %end, "run cut off with customers outstanding");
        }
        observer.on_sim_end(end, &self.taxis);
        tracing::info!(target: "sim", %end, clock = %self.clock, "run finished");
        Ok(end)
    }

    /// Run exactly `n` ticks from the current position, ignoring the stop
    /// condition.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// `true` once the feed phase is over and nothing is left to serve, or
    /// once the drain limit is reached.
    pub fn is_finished(&self) -> bool {
        let now = self.clock.current_tick;
        if now >= self.config.hard_end_tick() {
            return true;
        }
        now >= self.config.feed_end_tick()
            && self.customers.is_empty()
            && self.taxis.iter().all(|t| t.state() == TaxiState::Idle)
    }

    pub fn taxis(&self) -> &[Taxi] {
        &self.taxis
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.get(&id)
    }

    pub fn world(&self) -> &PlaneModel {
        &self.world
    }

    pub fn field(&self) -> Option<&DemandField> {
        self.field.as_ref()
    }

    pub fn post_office(&self) -> &PostOffice {
        &self.post
    }

    /// Customers announced so far.
    pub fn announced(&self) -> u64 {
        self.next_customer
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);

        let summary = self.process_tick(now, observer)?;
        observer.on_tick_end(&summary);

        let interval = self.config.output_interval_ticks;
        if interval > 0 && now.0.is_multiple_of(interval) {
            observer.on_snapshot(now, &self.taxis, &self.world);
        }
        if now.0 > 0 && now.0.is_multiple_of(PROGRESS_EVERY) {
            tracing::info!(
                target: "sim",
                clock = %self.clock,
                live = self.customers.len(),
                waiting = summary.waiting_customers,
                idle = summary.idle_taxis,
                "progress"
            );
        }

        self.clock.advance();
        Ok(())
    }

    fn process_tick<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<TickSummary> {
        let start_ms = self.clock.start_ms(now) as i64;
        let end_ms = self.clock.end_ms(now) as i64;
        let mut summary = TickSummary { tick: now, now_ms: start_ms, ..TickSummary::default() };

        // ── Phase 1: announce new requests ────────────────────────────────
        if now < self.config.feed_end_tick() {
            for trip in self.feed.drain_window(start_ms, end_ms) {
                if !self.rng.gen_bool(self.config.sample_fraction) {
                    continue;
                }
                let event = self.announce(trip)?;
                if matches!(event, SimEvent::Announced { .. }) {
                    summary.announced += 1;
                }
                observer.on_event(now, &event);
            }
        }

        // Explicit field borrows so the borrow checker sees disjoint access.
        let ctx = TickContext::new(now, start_ms, self.config.tick_ms, &self.dispatch, self.field.as_ref());
        let customers = &mut self.customers;
        let post = &mut self.post;
        let world = &mut self.world;
        let mut out = Outbox::new();

        // ── Phase 2: customers, ascending id ──────────────────────────────
        for (&id, customer) in customers.iter_mut() {
            let inbox = post.take(AgentRef::Customer(id));
            let Some(event) = customer.tick(&ctx, &inbox, &mut out) else {
                continue;
            };
            let event = match event {
                CustomerEvent::Requested { attempt } => SimEvent::Requested { customer: id, attempt },
                CustomerEvent::Dealt { taxi, value } => SimEvent::Dealt { customer: id, taxi, value },
                CustomerEvent::Taken { taxi } => SimEvent::Taken { customer: id, taxi },
            };
            observer.on_event(now, &event);
        }

        // ── Phase 3: taxis, ascending id ──────────────────────────────────
        for taxi in self.taxis.iter_mut() {
            let inbox = post.take(AgentRef::Taxi(taxi.id()));
            for event in taxi.tick(&ctx, world, &inbox, &mut out)? {
                let Some(event) = apply_taxi_event(customers, ctx.config, event)? else {
                    continue;
                };
                match event {
                    SimEvent::PickedUp { .. } => summary.pickups += 1,
                    SimEvent::Delivered { .. } => summary.deliveries += 1,
                    SimEvent::Traded { .. } => summary.trades += 1,
                    _ => {}
                }
                observer.on_event(now, &event);
            }
        }

        // ── Phase 4: collect delivered customers ──────────────────────────
        // A trip that ends where the taxi stood is served in the tick the deal
        // arrives, before the customer reads the accept.  Such a customer
        // stays registered until it has seen the accept.
        let delivered: Vec<CustomerId> = customers
            .iter()
            .filter(|(_, c)| c.is_delivered() && c.is_taken())
            .map(|(&id, _)| id)
            .collect();
        for id in delivered {
            customers.remove(&id);
            world.remove_customer(id);
            post.forget(AgentRef::Customer(id));
        }

        // ── Phase 5: post ─────────────────────────────────────────────────
        post.post(&mut out);
        summary.messages = post.deliver() as u32;

        for c in customers.values().filter(|c| !c.is_delivered()) {
            match c.state() {
                NegotiationState::Taken { .. } if c.picked_up_ms().is_some() => summary.riding_customers += 1,
                NegotiationState::Taken { .. } => {}
                _ => summary.waiting_customers += 1,
            }
        }
        for t in &self.taxis {
            match t.state() {
                TaxiState::Idle => summary.idle_taxis += 1,
                TaxiState::Busy => summary.busy_taxis += 1,
            }
        }
        tracing::trace!(target: "sim", tick = %now, ?summary, "tick done");
        Ok(summary)
    }

    /// Turn a sampled trip into a live customer standing at its pickup
    /// point.
    fn announce(&mut self, trip: Trip) -> SimResult<SimEvent> {
        if trip.passengers > self.dispatch.taxi_capacity {
            tracing::warn!(
                target: "sim",
                seats = trip.passengers,
                capacity = self.dispatch.taxi_capacity,
                "request larger than any taxi dropped"
            );
            return Ok(SimEvent::Rejected { announce_ms: trip.announce_ms, seats: trip.passengers });
        }

        let id = CustomerId(self.next_customer);
        self.next_customer += 1;

        let request = RequestInfo {
            id,
            pickup:   trip.pickup,
            delivery: trip.dropoff,
            capacity: trip.passengers,
        };
        let window = TimeWindow {
            open_ms:  trip.announce_ms,
            close_ms: trip.announce_ms.saturating_add(self.dispatch.pickup_window_ms as i64),
        };

        self.world.place_customer(&request)?;
        self.post.register(AgentRef::Customer(id));
        self.customers.insert(id, Customer::new(request, trip.announce_ms, window));
        tracing::debug!(target: "sim", customer = %id, pickup = %trip.pickup, seats = trip.passengers, "customer announced");
        Ok(SimEvent::Announced { request, announce_ms: trip.announce_ms })
    }
}

// ── Event bookkeeping ─────────────────────────────────────────────────────────

/// Write a taxi's report back to the customer it concerns.
fn apply_taxi_event(
    customers: &mut BTreeMap<CustomerId, Customer>,
    config:    &DispatchConfig,
    event:     TaxiEvent,
) -> SimResult<Option<SimEvent>> {
    let event = match event {
        TaxiEvent::Accepted { .. } | TaxiEvent::TradedAway { .. } => return Ok(None),

        TaxiEvent::PickedUp { taxi, customer, at_ms } => {
            let c = lookup(customers, customer)?;
            c.mark_picked_up(at_ms);
            SimEvent::PickedUp {
                customer,
                taxi,
                at_ms,
                waiting_ms:    at_ms - c.announce_ms(),
                requests_sent: c.requests_sent(),
                on_time:       c.window().contains(at_ms),
            }
        }

        TaxiEvent::Delivered { taxi, customer, at_ms } => {
            let c = lookup(customers, customer)?;
            c.mark_delivered(at_ms);
            let info = c.info();
            let direct = info.pickup.distance(info.delivery);
            SimEvent::Delivered {
                customer,
                taxi,
                at_ms,
                ride_ms:   at_ms - c.picked_up_ms().unwrap_or(at_ms),
                direct_ms: (direct * MS_PER_HOUR / config.taxi_speed).round() as i64,
            }
        }

        TaxiEvent::TradeReceived { taxi, from, customer, profit } => {
            lookup(customers, customer)?.hand_over(taxi);
            SimEvent::Traded { customer, from, to: taxi, profit }
        }
    };
    Ok(Some(event))
}

fn lookup(customers: &mut BTreeMap<CustomerId, Customer>, id: CustomerId) -> SimResult<&mut Customer> {
    customers.get_mut(&id).ok_or(SimError::UnknownCustomer(id))
}
