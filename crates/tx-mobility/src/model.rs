//! `PlaneModel` — Euclidean road model with passenger containers.

use std::collections::HashMap;

use tx_core::{Bounds, CustomerId, Point, TaxiId};
use tx_dispatch::{Host, HostError, HostResult, MoveProgress, RequestInfo, TimeBudget};

use crate::state::Parcel;
use crate::{MobilityError, MobilityResult, ParcelState, VehicleState};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// A rectangle of open road.  Taxi ids index `vehicles` directly.
pub struct PlaneModel {
    bounds:   Bounds,
    /// Distance units per simulated hour.
    speed:    f64,
    vehicles: Vec<VehicleState>,
    parcels:  HashMap<CustomerId, Parcel>,
}

impl PlaneModel {
    /// `speed` is in distance units per simulated hour.
    pub fn new(bounds: Bounds, speed: f64) -> MobilityResult<Self> {
        if !bounds.is_valid() {
            return Err(MobilityError::InvalidBounds);
        }
        if !(speed.is_finite() && speed > 0.0) {
            return Err(MobilityError::InvalidSpeed(speed));
        }
        Ok(Self { bounds, speed, vehicles: Vec::new(), parcels: HashMap::new() })
    }

    // ── Population ────────────────────────────────────────────────────────

    /// Add a vehicle; ids are handed out densely from 0.
    pub fn add_taxi(&mut self, at: Point, capacity: u32) -> MobilityResult<TaxiId> {
        if !self.bounds.contains(at) {
            return Err(MobilityError::OutOfBounds(at));
        }
        let id = TaxiId::try_from(self.vehicles.len()).map_err(|_| MobilityError::TooManyVehicles)?;
        self.vehicles.push(VehicleState::new(at, capacity));
        Ok(id)
    }

    /// Put a customer on the map at its pickup point.
    pub fn place_customer(&mut self, request: &RequestInfo) -> HostResult<()> {
        if self.parcels.contains_key(&request.id) {
            return Err(HostError::AlreadyPlaced(request.id.to_string()));
        }
        if !self.bounds.contains(request.pickup) {
            return Err(HostError::OutOfBounds(request.pickup));
        }
        self.parcels.insert(request.id, Parcel {
            state:    ParcelState::Waiting { at: request.pickup },
            delivery: request.delivery,
            seats:    request.capacity,
        });
        Ok(())
    }

    /// Forget a customer.  Returns its last state, if it was known.
    pub fn remove_customer(&mut self, id: CustomerId) -> Option<ParcelState> {
        self.parcels.remove(&id).map(|p| p.state)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn vehicle(&self, id: TaxiId) -> Option<&VehicleState> {
        self.vehicles.get(id.index())
    }

    pub fn vehicles(&self) -> &[VehicleState] {
        &self.vehicles
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn parcel_state(&self, id: CustomerId) -> Option<ParcelState> {
        self.parcels.get(&id).map(|p| p.state)
    }

    /// Customers standing at their pickup points.
    pub fn waiting_count(&self) -> usize {
        self.parcels.values().filter(|p| matches!(p.state, ParcelState::Waiting { .. })).count()
    }

    fn vehicle_mut(&mut self, id: TaxiId) -> HostResult<&mut VehicleState> {
        self.vehicles.get_mut(id.index()).ok_or(HostError::UnknownTaxi(id))
    }
}

impl Host for PlaneModel {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn taxi_position(&self, taxi: TaxiId) -> HostResult<Point> {
        self.vehicle(taxi).map(|v| v.position).ok_or(HostError::UnknownTaxi(taxi))
    }

    fn move_to(&mut self, taxi: TaxiId, target: Point, budget: &mut TimeBudget) -> HostResult<MoveProgress> {
        if !self.bounds.contains(target) {
            return Err(HostError::OutOfBounds(target));
        }
        let speed = self.speed;
        let vehicle = self.vehicle_mut(taxi)?;
        let dist = vehicle.position.distance(target);

        if dist == 0.0 {
            return Ok(MoveProgress { distance: 0.0, elapsed_ms: 0, arrived: true });
        }
        if !budget.has_time_left() {
            return Ok(MoveProgress::NONE);
        }

        let needed_ms = (dist * MS_PER_HOUR / speed).ceil() as u64;
        let progress = if needed_ms <= budget.remaining_ms() {
            vehicle.position = target;
            MoveProgress { distance: dist, elapsed_ms: budget.consume(needed_ms), arrived: true }
        } else {
            let elapsed_ms = budget.consume(budget.remaining_ms());
            let reach = (elapsed_ms as f64 * speed / MS_PER_HOUR).min(dist);
            vehicle.position = vehicle.position + vehicle.position.to(target) * (reach / dist);
            MoveProgress { distance: reach, elapsed_ms, arrived: false }
        };
        vehicle.odometer += progress.distance;
        Ok(progress)
    }

    fn pickup(&mut self, taxi: TaxiId, customer: CustomerId, _now_ms: i64) -> HostResult<()> {
        let parcel = *self.parcels.get(&customer).ok_or(HostError::UnknownCustomer(customer))?;
        let ParcelState::Waiting { at } = parcel.state else {
            return Err(HostError::NotWaiting { customer });
        };

        let vehicle = self.vehicle_mut(taxi)?;
        if vehicle.position != at {
            return Err(HostError::NotAtStop { taxi, customer });
        }
        if vehicle.free_seats() < parcel.seats {
            return Err(HostError::NoSeats { taxi, customer, needed: parcel.seats, free: vehicle.free_seats() });
        }
        vehicle.aboard.push(customer);
        vehicle.load += parcel.seats;

        if let Some(p) = self.parcels.get_mut(&customer) {
            p.state = ParcelState::Aboard { taxi };
        }
        Ok(())
    }

    fn deliver(&mut self, taxi: TaxiId, customer: CustomerId, _now_ms: i64) -> HostResult<()> {
        let parcel = *self.parcels.get(&customer).ok_or(HostError::UnknownCustomer(customer))?;
        if parcel.state != (ParcelState::Aboard { taxi }) {
            return Err(HostError::NotAboard { taxi, customer });
        }

        let vehicle = self.vehicle_mut(taxi)?;
        if vehicle.position != parcel.delivery {
            return Err(HostError::NotAtStop { taxi, customer });
        }
        vehicle.aboard.retain(|c| *c != customer);
        vehicle.load -= parcel.seats;

        if let Some(p) = self.parcels.get_mut(&customer) {
            p.state = ParcelState::Delivered;
        }
        Ok(())
    }
}
