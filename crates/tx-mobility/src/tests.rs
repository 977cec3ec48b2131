//! Unit tests for tx-mobility.

use tx_core::{Bounds, CustomerId, Point, TaxiId};
use tx_dispatch::{Host, HostError, RequestInfo, TimeBudget};

use crate::{MobilityError, ParcelState, PlaneModel};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// 10 × 10 plane, one unit per simulated second.
fn plane() -> PlaneModel {
    PlaneModel::new(Bounds::from_size(10.0, 10.0), 3_600.0).unwrap()
}

fn request(id: u64, pickup: (f64, f64), delivery: (f64, f64), seats: u32) -> RequestInfo {
    RequestInfo {
        id:       CustomerId(id),
        pickup:   Point::new(pickup.0, pickup.1),
        delivery: Point::new(delivery.0, delivery.1),
        capacity: seats,
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod construction {
    use super::*;

    #[test]
    fn rejects_bad_speed() {
        let err = PlaneModel::new(Bounds::from_size(1.0, 1.0), 0.0).err().unwrap();
        assert!(matches!(err, MobilityError::InvalidSpeed(_)));
    }

    #[test]
    fn rejects_empty_area() {
        let err = PlaneModel::new(Bounds::from_size(0.0, 5.0), 1.0).err().unwrap();
        assert!(matches!(err, MobilityError::InvalidBounds));
    }

    #[test]
    fn taxi_ids_are_dense() {
        let mut p = plane();
        assert_eq!(p.add_taxi(Point::new(1.0, 1.0), 4).unwrap(), TaxiId(0));
        assert_eq!(p.add_taxi(Point::new(2.0, 2.0), 4).unwrap(), TaxiId(1));
        assert_eq!(p.vehicle_count(), 2);
        assert_eq!(p.taxi_position(TaxiId(1)).unwrap(), Point::new(2.0, 2.0));
    }

    #[test]
    fn taxi_outside_area_rejected() {
        let mut p = plane();
        assert!(matches!(p.add_taxi(Point::new(11.0, 1.0), 4), Err(MobilityError::OutOfBounds(_))));
    }

    #[test]
    fn customer_placed_once() {
        let mut p = plane();
        let r = request(7, (1.0, 1.0), (2.0, 2.0), 1);
        p.place_customer(&r).unwrap();
        assert!(matches!(p.place_customer(&r), Err(HostError::AlreadyPlaced(_))));
        assert_eq!(p.waiting_count(), 1);
    }

    #[test]
    fn customer_outside_area_rejected() {
        let mut p = plane();
        let r = request(1, (-1.0, 1.0), (2.0, 2.0), 1);
        assert_eq!(p.place_customer(&r), Err(HostError::OutOfBounds(Point::new(-1.0, 1.0))));
    }
}

// ── Movement ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod movement {
    use super::*;

    #[test]
    fn arrives_within_budget() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(0.0, 0.0), 4).unwrap();
        let mut budget = TimeBudget::new(5_000);
        let m = p.move_to(t, Point::new(3.0, 4.0), &mut budget).unwrap();
        assert!(m.arrived);
        assert_eq!(m.elapsed_ms, 5_000);
        assert!((m.distance - 5.0).abs() < 1e-9);
        assert_eq!(p.taxi_position(t).unwrap(), Point::new(3.0, 4.0));
        assert!(!budget.has_time_left());
    }

    #[test]
    fn stops_short_when_budget_runs_out() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(0.0, 0.0), 4).unwrap();
        let mut budget = TimeBudget::new(1_000);
        let m = p.move_to(t, Point::new(4.0, 0.0), &mut budget).unwrap();
        assert!(!m.arrived);
        assert!((m.distance - 1.0).abs() < 1e-9);
        let pos = p.taxi_position(t).unwrap();
        assert!((pos.x - 1.0).abs() < 1e-9 && pos.y.abs() < 1e-9);
    }

    #[test]
    fn leftover_budget_carries_to_next_leg() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(0.0, 0.0), 4).unwrap();
        let mut budget = TimeBudget::new(3_000);
        p.move_to(t, Point::new(1.0, 0.0), &mut budget).unwrap();
        assert_eq!(budget.remaining_ms(), 2_000);
        let m = p.move_to(t, Point::new(1.0, 5.0), &mut budget).unwrap();
        assert!(!m.arrived);
        let pos = p.taxi_position(t).unwrap();
        assert!((pos.x - 1.0).abs() < 1e-9 && (pos.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_move_arrives_for_free() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(2.0, 2.0), 4).unwrap();
        let mut budget = TimeBudget::new(0);
        let m = p.move_to(t, Point::new(2.0, 2.0), &mut budget).unwrap();
        assert!(m.arrived);
        assert_eq!(m.elapsed_ms, 0);
    }

    #[test]
    fn odometer_accumulates() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(0.0, 0.0), 4).unwrap();
        let mut budget = TimeBudget::new(10_000);
        p.move_to(t, Point::new(2.0, 0.0), &mut budget).unwrap();
        p.move_to(t, Point::new(2.0, 3.0), &mut budget).unwrap();
        assert!((p.vehicle(t).unwrap().odometer - 5.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_taxi_and_outside_target() {
        let mut p = plane();
        let mut budget = TimeBudget::new(1_000);
        assert_eq!(p.move_to(TaxiId(3), Point::new(1.0, 1.0), &mut budget), Err(HostError::UnknownTaxi(TaxiId(3))));
        let t = p.add_taxi(Point::new(0.0, 0.0), 4).unwrap();
        assert!(matches!(p.move_to(t, Point::new(20.0, 0.0), &mut budget), Err(HostError::OutOfBounds(_))));
    }
}

// ── Containers ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod containers {
    use super::*;

    #[test]
    fn pickup_then_deliver() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(1.0, 1.0), 4).unwrap();
        let r = request(1, (1.0, 1.0), (3.0, 1.0), 2);
        p.place_customer(&r).unwrap();

        p.pickup(t, r.id, 0).unwrap();
        assert_eq!(p.parcel_state(r.id), Some(ParcelState::Aboard { taxi: t }));
        assert_eq!(p.vehicle(t).unwrap().load, 2);
        assert_eq!(p.waiting_count(), 0);

        let mut budget = TimeBudget::new(10_000);
        p.move_to(t, r.delivery, &mut budget).unwrap();
        p.deliver(t, r.id, 2_000).unwrap();
        assert_eq!(p.parcel_state(r.id), Some(ParcelState::Delivered));
        assert_eq!(p.vehicle(t).unwrap().load, 0);
        assert!(p.vehicle(t).unwrap().aboard.is_empty());
        assert_eq!(p.remove_customer(r.id), Some(ParcelState::Delivered));
        assert_eq!(p.parcel_state(r.id), None);
    }

    #[test]
    fn pickup_requires_presence() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(0.0, 0.0), 4).unwrap();
        let r = request(1, (1.0, 1.0), (3.0, 1.0), 1);
        p.place_customer(&r).unwrap();
        assert_eq!(p.pickup(t, r.id, 0), Err(HostError::NotAtStop { taxi: t, customer: r.id }));
    }

    #[test]
    fn pickup_requires_seats() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(1.0, 1.0), 2).unwrap();
        let r = request(1, (1.0, 1.0), (3.0, 1.0), 3);
        p.place_customer(&r).unwrap();
        assert_eq!(
            p.pickup(t, r.id, 0),
            Err(HostError::NoSeats { taxi: t, customer: r.id, needed: 3, free: 2 })
        );
    }

    #[test]
    fn pickup_twice_fails() {
        let mut p = plane();
        let a = p.add_taxi(Point::new(1.0, 1.0), 4).unwrap();
        let b = p.add_taxi(Point::new(1.0, 1.0), 4).unwrap();
        let r = request(1, (1.0, 1.0), (3.0, 1.0), 1);
        p.place_customer(&r).unwrap();
        p.pickup(a, r.id, 0).unwrap();
        assert_eq!(p.pickup(b, r.id, 0), Err(HostError::NotWaiting { customer: r.id }));
    }

    #[test]
    fn deliver_by_wrong_taxi_fails() {
        let mut p = plane();
        let a = p.add_taxi(Point::new(1.0, 1.0), 4).unwrap();
        let b = p.add_taxi(Point::new(3.0, 1.0), 4).unwrap();
        let r = request(1, (1.0, 1.0), (3.0, 1.0), 1);
        p.place_customer(&r).unwrap();
        p.pickup(a, r.id, 0).unwrap();
        assert_eq!(p.deliver(b, r.id, 0), Err(HostError::NotAboard { taxi: b, customer: r.id }));
    }

    #[test]
    fn deliver_away_from_destination_fails() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(1.0, 1.0), 4).unwrap();
        let r = request(1, (1.0, 1.0), (3.0, 1.0), 1);
        p.place_customer(&r).unwrap();
        p.pickup(t, r.id, 0).unwrap();
        assert_eq!(p.deliver(t, r.id, 0), Err(HostError::NotAtStop { taxi: t, customer: r.id }));
    }

    #[test]
    fn unknown_customer() {
        let mut p = plane();
        let t = p.add_taxi(Point::new(1.0, 1.0), 4).unwrap();
        assert_eq!(p.pickup(t, CustomerId(9), 0), Err(HostError::UnknownCustomer(CustomerId(9))));
    }
}
