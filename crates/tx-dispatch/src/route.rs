//! Route Optimizer — shortest feasible multi-stop route for one taxi.
//!
//! # Enumeration
//!
//! Orderings are built by recursive insertion.  The first request is peeled
//! off, every ordering of the remaining requests is generated, and the
//! request's stops are inserted at every admissible position:
//!
//! - a **pending** request contributes a pickup and a delivery, the pickup
//!   strictly before the delivery;
//! - a **picked-up** request contributes its delivery only.
//!
//! With `n` pending and `m` picked-up requests this visits up to
//! `(2n + m)! / 2ⁿ` orderings, so callers keep the request count small
//! (see `DispatchConfig::max_concurrent_pickups`).
//!
//! Lengths are Euclidean from the taxi's position through every stop.  The
//! shortest ordering wins; among equally short ones the first enumerated is
//! kept, which makes the result a pure function of the inputs.

use std::collections::BTreeSet;

use tx_core::{CustomerId, Point};

use crate::RequestInfo;

/// What happens at a stop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StopKind {
    Pickup,
    Delivery,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RouteStop {
    pub customer: CustomerId,
    pub kind:     StopKind,
    pub location: Point,
}

impl RouteStop {
    fn pickup(r: &RequestInfo) -> Self {
        Self { customer: r.id, kind: StopKind::Pickup, location: r.pickup }
    }

    fn delivery(r: &RequestInfo) -> Self {
        Self { customer: r.id, kind: StopKind::Delivery, location: r.delivery }
    }
}

/// An ordered list of stops and its length from the origin it was planned
/// from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    pub stops:  Vec<RouteStop>,
    pub length: f64,
}

impl Route {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn locations(&self) -> Vec<Point> {
        self.stops.iter().map(|s| s.location).collect()
    }

    /// `true` if every customer in `picked_up` has exactly one delivery and
    /// no pickup, and every other customer has one pickup followed later by
    /// one delivery.
    pub fn is_well_ordered(&self, picked_up: &BTreeSet<CustomerId>) -> bool {
        let mut seen_pickup = BTreeSet::new();
        let mut delivered = BTreeSet::new();
        for stop in &self.stops {
            match stop.kind {
                StopKind::Pickup => {
                    if picked_up.contains(&stop.customer) || !seen_pickup.insert(stop.customer) {
                        return false;
                    }
                }
                StopKind::Delivery => {
                    let boarded = picked_up.contains(&stop.customer) || seen_pickup.contains(&stop.customer);
                    if !boarded || !delivered.insert(stop.customer) {
                        return false;
                    }
                }
            }
        }
        seen_pickup.is_subset(&delivered)
    }
}

/// Length of driving from `origin` through `stops` in order.
pub fn route_length(origin: Point, stops: &[RouteStop]) -> f64 {
    stops
        .iter()
        .fold((origin, 0.0), |(at, total), stop| (stop.location, total + at.distance(stop.location)))
        .1
}

/// Shortest route serving every request in `requests` from `origin`.
///
/// Requests whose id is in `picked_up` are already aboard and only need
/// their delivery stop.
pub fn plan_route(origin: Point, requests: &[RequestInfo], picked_up: &BTreeSet<CustomerId>) -> Route {
    orderings(requests, picked_up)
        .into_iter()
        .map(|stops| Route { length: route_length(origin, &stops), stops })
        .fold(None, |best: Option<Route>, candidate| match best {
            Some(b) if b.length <= candidate.length => Some(b),
            _ => Some(candidate),
        })
        .unwrap_or_default()
}

fn orderings(requests: &[RequestInfo], picked_up: &BTreeSet<CustomerId>) -> Vec<Vec<RouteStop>> {
    let Some((first, rest)) = requests.split_first() else {
        return vec![Vec::new()];
    };

    let delivery = RouteStop::delivery(first);
    let mut out = Vec::new();

    for base in orderings(rest, picked_up) {
        if picked_up.contains(&first.id) {
            for d in 0..=base.len() {
                let mut candidate = base.clone();
                candidate.insert(d, delivery);
                out.push(candidate);
            }
        } else {
            let pickup = RouteStop::pickup(first);
            for p in 0..=base.len() {
                for d in p + 1..=base.len() + 1 {
                    let mut candidate = base.clone();
                    candidate.insert(p, pickup);
                    candidate.insert(d, delivery);
                    out.push(candidate);
                }
            }
        }
    }
    out
}
