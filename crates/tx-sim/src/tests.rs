//! Unit and scenario tests for tx-sim.

use std::collections::BTreeMap;

use tx_core::{AgentRef, Bounds, CustomerId, DispatchConfig, Point, SimConfig, SimRng, TaxiId, Tick};
use tx_dispatch::{Outbox, Payload, RequestInfo, Taxi};
use tx_field::{FieldBuilder, FieldConfig};
use tx_mobility::PlaneModel;
use tx_trips::{Trip, TripFeed};

use crate::{NoopObserver, PostOffice, Sim, SimBuilder, SimError, SimEvent, SimObserver, TickSummary};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn bounds() -> Bounds {
    Bounds::from_size(10.0, 10.0)
}

fn sim_config(total_ticks: u64, max_drain_ticks: u64) -> SimConfig {
    SimConfig {
        tick_ms: 1_000,
        total_ticks,
        max_drain_ticks,
        seed: 7,
        sample_fraction: 1.0,
        output_interval_ticks: 1,
    }
}

/// One distance unit per simulated second.
fn dispatch() -> DispatchConfig {
    DispatchConfig { taxi_speed: 3_600.0, ..DispatchConfig::default() }
}

fn trip(announce_ms: i64, pickup: (f64, f64), dropoff: (f64, f64)) -> Trip {
    Trip {
        announce_ms,
        passengers: 1,
        pickup:     Point::new(pickup.0, pickup.1),
        dropoff:    Point::new(dropoff.0, dropoff.1),
    }
}

fn random_trips(seed: u64, count: usize, horizon_ms: i64) -> Vec<Trip> {
    let mut rng = SimRng::new(seed);
    (0..count)
        .map(|_| Trip {
            announce_ms: rng.gen_range(0..horizon_ms),
            passengers:  rng.gen_range(1..=3),
            pickup:      rng.point_in(&bounds()),
            dropoff:     rng.point_in(&bounds()),
        })
        .collect()
}

/// Records every event and summary.
#[derive(Default)]
struct Recorder {
    events:    Vec<(Tick, SimEvent)>,
    summaries: Vec<TickSummary>,
    ended:     Option<Tick>,
}

impl SimObserver for Recorder {
    fn on_event(&mut self, tick: Tick, event: &SimEvent) {
        self.events.push((tick, *event));
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        self.summaries.push(*summary);
    }

    fn on_sim_end(&mut self, final_tick: Tick, _taxis: &[Taxi]) {
        self.ended = Some(final_tick);
    }
}

impl Recorder {
    fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|(_, e)| pred(e)).count()
    }

    fn first_tick(&self, pred: impl Fn(&SimEvent) -> bool) -> Option<Tick> {
        self.events.iter().find(|(_, e)| pred(e)).map(|&(tick, _)| tick)
    }
}

/// Checks the fleet invariants at every snapshot.
#[derive(Default)]
struct InvariantChecker {
    snapshots: u64,
}

impl SimObserver for InvariantChecker {
    fn on_snapshot(&mut self, tick: Tick, taxis: &[Taxi], world: &PlaneModel) {
        self.snapshots += 1;
        let mut holders: BTreeMap<CustomerId, TaxiId> = BTreeMap::new();

        for taxi in taxis {
            assert!(
                taxi.committed_load() + taxi.reserved_capacity() <= taxi.capacity(),
                "{tick}: {taxi} over capacity"
            );
            assert!(taxi.route().is_well_ordered(taxi.picked_up()), "{tick}: {taxi} ill-ordered route");

            for r in taxi.assigned() {
                if let Some(other) = holders.insert(r.id, taxi.id()) {
                    panic!("{tick}: {} held by {other} and {}", r.id, taxi.id());
                }
            }

            let aboard: u32 = taxi
                .assigned()
                .iter()
                .filter(|r| taxi.picked_up().contains(&r.id))
                .map(|r| r.capacity)
                .sum();
            assert_eq!(world.vehicle(taxi.id()).map(|v| v.load), Some(aboard), "{tick}: {taxi} load mismatch");
        }
    }
}

// ── Post office ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod post_office {
    use super::*;

    fn position() -> Payload {
        Payload::Position { position: Point::new(1.0, 1.0), free_capacity: 5 }
    }

    fn office() -> PostOffice {
        let mut post = PostOffice::new();
        for t in [2, 0, 1] {
            post.register(AgentRef::Taxi(TaxiId(t)));
        }
        post.register(AgentRef::Customer(CustomerId(5)));
        post
    }

    #[test]
    fn mail_is_invisible_until_delivered() {
        let mut post = office();
        let mut out = Outbox::new();
        out.send(TaxiId(0), CustomerId(5), Payload::ContractBid { taxi: TaxiId(0), value: 1.0 });
        post.post(&mut out);

        assert!(out.is_empty());
        assert_eq!(post.staged(), 1);
        assert!(post.take(AgentRef::Customer(CustomerId(5))).is_empty());

        assert_eq!(post.deliver(), 1);
        assert_eq!(post.take(AgentRef::Customer(CustomerId(5))).len(), 1);
    }

    #[test]
    fn inbox_is_read_once() {
        let mut post = office();
        let mut out = Outbox::new();
        out.send(TaxiId(0), TaxiId(1), position());
        post.post(&mut out);
        post.deliver();

        assert_eq!(post.unread(AgentRef::Taxi(TaxiId(1))), 1);
        assert_eq!(post.take(AgentRef::Taxi(TaxiId(1))).len(), 1);
        assert!(post.take(AgentRef::Taxi(TaxiId(1))).is_empty());
    }

    #[test]
    fn broadcast_reaches_other_taxis_only() {
        let mut post = office();
        let mut out = Outbox::new();
        out.broadcast(TaxiId(1), position());
        post.post(&mut out);

        assert_eq!(post.deliver(), 2);
        assert_eq!(post.unread(AgentRef::Taxi(TaxiId(0))), 1);
        assert_eq!(post.unread(AgentRef::Taxi(TaxiId(1))), 0);
        assert_eq!(post.unread(AgentRef::Taxi(TaxiId(2))), 1);
        assert_eq!(post.unread(AgentRef::Customer(CustomerId(5))), 0);
    }

    #[test]
    fn customer_broadcast_reaches_every_taxi() {
        let mut post = office();
        let mut out = Outbox::new();
        let request = RequestInfo {
            id:       CustomerId(5),
            pickup:   Point::new(0.0, 0.0),
            delivery: Point::new(1.0, 0.0),
            capacity: 1,
        };
        out.broadcast(CustomerId(5), Payload::ContractRequest { request, attempt: 1 });
        post.post(&mut out);
        assert_eq!(post.deliver(), 3);
    }

    #[test]
    fn mail_to_unknown_agent_is_dropped() {
        let mut post = office();
        let mut out = Outbox::new();
        out.send(TaxiId(0), CustomerId(9), Payload::ContractAccept { taxi: TaxiId(0) });
        post.post(&mut out);
        assert_eq!(post.deliver(), 0);
        assert_eq!(post.dropped(), 1);
    }

    #[test]
    fn forget_discards_unread_and_future_mail() {
        let mut post = office();
        let mut out = Outbox::new();
        out.send(TaxiId(0), CustomerId(5), Payload::ContractAccept { taxi: TaxiId(0) });
        post.post(&mut out);
        post.deliver();

        post.forget(AgentRef::Customer(CustomerId(5)));
        assert_eq!(post.unread(AgentRef::Customer(CustomerId(5))), 0);

        out.send(TaxiId(0), CustomerId(5), Payload::ContractAccept { taxi: TaxiId(0) });
        post.post(&mut out);
        assert_eq!(post.deliver(), 0);
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use super::*;

    #[test]
    fn position_count_must_match() {
        let err = SimBuilder::new(sim_config(10, 0), dispatch(), bounds())
            .taxis(2)
            .taxi_positions(vec![Point::new(1.0, 1.0)])
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::TaxiCountMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn invalid_dispatch_config_rejected() {
        let bad = DispatchConfig { accept_wait_ticks: 1, ..dispatch() };
        let err = SimBuilder::new(sim_config(10, 0), bad, bounds()).build().err().unwrap();
        assert!(matches!(err, SimError::Core(_)));
    }

    #[test]
    fn sample_fraction_out_of_range_rejected() {
        let config = SimConfig { sample_fraction: 1.5, ..sim_config(10, 0) };
        let err = SimBuilder::new(config, dispatch(), bounds()).build().err().unwrap();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn random_positions_are_inside_and_seeded() {
        let build = || SimBuilder::new(sim_config(10, 0), dispatch(), bounds()).taxis(5).build().unwrap();
        let (a, b) = (build(), build());
        for i in 0..5 {
            let p = a.world().vehicle(TaxiId(i)).unwrap().position;
            assert!(bounds().contains(p));
            assert_eq!(Some(p), b.world().vehicle(TaxiId(i)).map(|v| v.position));
        }
        assert_eq!(a.taxis().len(), 5);
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;

    /// One taxi at the origin, one customer two units east going two units
    /// south.
    fn single_ride() -> Sim {
        SimBuilder::new(sim_config(5, 100), dispatch(), bounds())
            .trips(TripFeed::from_trips([trip(0, (2.0, 0.0), (2.0, 2.0))]))
            .taxis(1)
            .taxi_positions(vec![Point::new(0.0, 0.0)])
            .build()
            .unwrap()
    }

    #[test]
    fn negotiation_then_ride() {
        let mut sim = single_ride();
        let mut rec = Recorder::default();
        let end = sim.run(&mut rec).unwrap();

        let c = CustomerId(0);
        let t = TaxiId(0);
        let timeline: Vec<(u64, SimEvent)> = rec.events.iter().map(|(tick, e)| (tick.0, *e)).collect();
        assert_eq!(timeline[0].0, 0);
        assert!(matches!(timeline[0].1, SimEvent::Announced { request, announce_ms: 0 } if request.id == c));
        assert_eq!(timeline[1], (0, SimEvent::Requested { customer: c, attempt: 1 }));
        assert!(matches!(timeline[2], (2, SimEvent::Dealt { customer, taxi, .. }) if customer == c && taxi == t));
        assert_eq!(timeline[3], (4, SimEvent::Taken { customer: c, taxi: t }));
        assert_eq!(
            timeline[4],
            (4, SimEvent::PickedUp { customer: c, taxi: t, at_ms: 5_000, waiting_ms: 5_000, requests_sent: 1, on_time: true })
        );
        assert_eq!(
            timeline[5],
            (6, SimEvent::Delivered { customer: c, taxi: t, at_ms: 7_000, ride_ms: 2_000, direct_ms: 2_000 })
        );
        assert_eq!(timeline.len(), 6);

        assert_eq!(end, Tick(7));
        assert_eq!(rec.ended, Some(Tick(7)));
        assert_eq!(sim.customers().count(), 0);
        assert_eq!(sim.world().parcel_state(c), None);
        assert!((sim.taxis()[0].distance_travelled() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn summaries_track_the_ride() {
        let mut sim = single_ride();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.summaries.len(), 7);
        assert_eq!(rec.summaries[0].announced, 1);
        assert_eq!(rec.summaries[0].waiting_customers, 1);
        assert_eq!(rec.summaries[4].pickups, 1);
        assert_eq!(rec.summaries[4].riding_customers, 1);
        assert_eq!(rec.summaries[5].busy_taxis, 1);
        assert_eq!(rec.summaries[6].deliveries, 1);
        assert_eq!(rec.summaries[6].idle_taxis, 1);
        // Request, bid, deal and accept; a lone taxi's position broadcast
        // has no recipients.
        let messages: Vec<u32> = rec.summaries.iter().map(|s| s.messages).collect();
        assert_eq!(messages, [1, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn trip_served_where_the_taxi_stands() {
        let mut sim = SimBuilder::new(sim_config(5, 100), dispatch(), bounds())
            .trips(TripFeed::from_trips([trip(0, (2.0, 0.0), (2.0, 0.0))]))
            .taxis(1)
            .taxi_positions(vec![Point::new(2.0, 0.0)])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        let c = CustomerId(0);
        let t = TaxiId(0);
        assert_eq!(rec.first_tick(|e| matches!(e, SimEvent::Delivered { .. })), Some(Tick(3)));
        assert_eq!(rec.first_tick(|e| *e == SimEvent::Taken { customer: c, taxi: t }), Some(Tick(4)));
        assert_eq!(
            rec.count(|e| matches!(e, SimEvent::Taken { .. })),
            rec.count(|e| matches!(e, SimEvent::Delivered { .. }))
        );

        // Served but still negotiating: neither waiting nor riding.
        assert_eq!(rec.summaries[3].waiting_customers, 0);
        assert_eq!(rec.summaries[3].riding_customers, 0);
        assert_eq!(sim.customers().count(), 0);
        assert_eq!(sim.world().parcel_state(c), None);
    }

    #[test]
    fn customer_without_taxis_keeps_retrying() {
        let config = DispatchConfig { request_wait_ticks: 2, ..dispatch() };
        let mut sim = SimBuilder::new(sim_config(10, 0), config, bounds())
            .trips(TripFeed::from_trips([trip(0, (2.0, 0.0), (2.0, 2.0))]))
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        let attempts: Vec<(u64, u32)> = rec
            .events
            .iter()
            .filter_map(|(tick, e)| match e {
                SimEvent::Requested { attempt, .. } => Some((tick.0, *attempt)),
                _ => None,
            })
            .collect();
        assert_eq!(attempts, [(0, 1), (3, 2), (6, 3), (9, 4)]);
        assert_eq!(sim.customer(CustomerId(0)).map(|c| c.retries()), Some(3));
    }
}

// ── Stop condition ────────────────────────────────────────────────────────────

#[cfg(test)]
mod stop_condition {
    use super::*;

    #[test]
    fn empty_run_stops_after_feed() {
        let mut sim = SimBuilder::new(sim_config(10, 50), dispatch(), bounds()).taxis(3).build().unwrap();
        assert_eq!(sim.run(&mut NoopObserver).unwrap(), Tick(10));
    }

    #[test]
    fn drain_limit_cuts_off_outstanding_work() {
        let mut sim = SimBuilder::new(sim_config(10, 0), dispatch(), bounds())
            .trips(TripFeed::from_trips([trip(9_000, (2.0, 0.0), (2.0, 2.0))]))
            .taxis(1)
            .taxi_positions(vec![Point::new(0.0, 0.0)])
            .build()
            .unwrap();
        assert_eq!(sim.run(&mut NoopObserver).unwrap(), Tick(10));
        assert_eq!(sim.customers().count(), 1);
    }

    #[test]
    fn trips_after_horizon_are_never_announced() {
        let mut sim = SimBuilder::new(sim_config(5, 20), dispatch(), bounds())
            .trips(TripFeed::from_trips([trip(7_000, (2.0, 0.0), (2.0, 2.0))]))
            .taxis(1)
            .build()
            .unwrap();
        assert_eq!(sim.run(&mut NoopObserver).unwrap(), Tick(5));
        assert_eq!(sim.announced(), 0);
    }

    #[test]
    fn zero_sampling_announces_nothing() {
        let config = SimConfig { sample_fraction: 0.0, ..sim_config(10, 10) };
        let mut sim = SimBuilder::new(config, dispatch(), bounds())
            .trips(TripFeed::from_trips(random_trips(1, 20, 10_000)))
            .taxis(2)
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();
        assert_eq!(sim.announced(), 0);
    }

    #[test]
    fn oversized_request_rejected() {
        let big = Trip { passengers: 9, ..trip(0, (2.0, 0.0), (2.0, 2.0)) };
        let mut sim = SimBuilder::new(sim_config(3, 0), dispatch(), bounds())
            .trips(TripFeed::from_trips([big]))
            .taxis(1)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(rec.events, [(Tick(0), SimEvent::Rejected { announce_ms: 0, seats: 9 })]);
        assert_eq!(sim.announced(), 0);
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use super::*;

    const HORIZON_TICKS: u64 = 60;

    fn busy_city(trading: bool, with_field: bool) -> Sim {
        let trips = random_trips(11, 40, (HORIZON_TICKS * 1_000) as i64);
        let config = DispatchConfig { trading_enabled: trading, ..dispatch() };

        let mut builder = SimBuilder::new(sim_config(HORIZON_TICKS, 2_000), config, bounds())
            .trips(TripFeed::from_trips(trips.iter().copied()))
            .taxis(6);

        if with_field {
            let mut fb = FieldBuilder::new(bounds(), FieldConfig::default(), 0, 60_000).unwrap();
            for t in &trips {
                fb.add_pickup(t.announce_ms, t.pickup);
            }
            builder = builder.field(fb.build());
        }
        builder.build().unwrap()
    }

    fn serve_everyone(trading: bool, with_field: bool) -> (Sim, Recorder) {
        let mut sim = busy_city(trading, with_field);
        let mut checks = InvariantChecker::default();
        let mut rec = Recorder::default();
        let end = sim.run(&mut (&mut checks, &mut rec)).unwrap();

        assert!(end < sim.config.hard_end_tick(), "run hit the drain limit");
        assert_eq!(checks.snapshots, end.0);
        assert_eq!(sim.announced(), 40);
        assert_eq!(rec.count(|e| matches!(e, SimEvent::PickedUp { .. })), 40);
        assert_eq!(rec.count(|e| matches!(e, SimEvent::Delivered { .. })), 40);
        assert_eq!(rec.count(|e| matches!(e, SimEvent::Taken { .. })), 40);
        assert!(sim.taxis().iter().all(|t| t.assigned().is_empty()));
        (sim, rec)
    }

    fn idle_travel(sim: &Sim) -> f64 {
        sim.taxis().iter().map(Taxi::total_idle_travel).sum()
    }

    #[test]
    fn contract_net_serves_everyone() {
        let (sim, rec) = serve_everyone(false, false);
        assert_eq!(rec.count(|e| matches!(e, SimEvent::Traded { .. })), 0);
        assert_eq!(idle_travel(&sim), 0.0);
    }

    #[test]
    fn trading_keeps_invariants() {
        let (_, rec) = serve_everyone(true, false);
        assert!(rec.count(|e| matches!(e, SimEvent::Traded { .. })) > 0, "no request changed hands");
    }

    #[test]
    fn idle_taxis_follow_the_field() {
        let (sim, _) = serve_everyone(false, true);
        assert!(idle_travel(&sim) > 0.0, "idle taxis never moved");
    }

    #[test]
    fn traded_customers_follow_their_taxi() {
        let mut sim = busy_city(true, false);
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        let mut owner: BTreeMap<CustomerId, TaxiId> = BTreeMap::new();
        for (_, e) in &rec.events {
            match *e {
                SimEvent::Taken { customer, taxi } => {
                    owner.insert(customer, taxi);
                }
                SimEvent::Traded { customer, from, to, profit } => {
                    assert!(profit > 0.0);
                    assert_ne!(from, to);
                    owner.insert(customer, to);
                }
                SimEvent::PickedUp { customer, taxi, .. } => {
                    assert_eq!(owner.get(&customer), Some(&taxi), "{customer} picked up by a stranger");
                }
                _ => {}
            }
        }
    }

    #[test]
    fn same_seed_same_run() {
        let run = || {
            let mut sim = busy_city(true, true);
            let mut rec = Recorder::default();
            sim.run(&mut rec).unwrap();
            rec.events
        };
        assert_eq!(run(), run());
    }
}
