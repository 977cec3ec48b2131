//! Fluent builder for constructing a [`Sim`].

use std::collections::BTreeMap;

use tx_core::{AgentRef, Bounds, DispatchConfig, Point, SimConfig, SimRng};
use tx_dispatch::Taxi;
use tx_field::DemandField;
use tx_mobility::PlaneModel;
use tx_trips::TripFeed;

use crate::{PostOffice, Sim, SimError, SimResult};

/// Child-RNG offset for random start positions.
const PLACEMENT_STREAM: u64 = 1;

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: tick length, horizon, seed, sampling fraction, …
/// - [`DispatchConfig`]: protocol constants shared by every agent
/// - [`Bounds`]: the operating area of the plane
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                              |
/// |-----------------------|--------------------------------------|
/// | `.trips(feed)`        | Empty feed (no customers)            |
/// | `.field(field)`       | No field: idle taxis stay put        |
/// | `.taxis(n)`           | 0                                    |
/// | `.taxi_positions(v)`  | Uniformly random inside the bounds   |
pub struct SimBuilder {
    config:    SimConfig,
    dispatch:  DispatchConfig,
    bounds:    Bounds,
    feed:      TripFeed,
    field:     Option<DemandField>,
    taxis:     usize,
    positions: Option<Vec<Point>>,
}

impl SimBuilder {
    pub fn new(config: SimConfig, dispatch: DispatchConfig, bounds: Bounds) -> Self {
        Self {
            config,
            dispatch,
            bounds,
            feed:      TripFeed::new(),
            field:     None,
            taxis:     0,
            positions: None,
        }
    }

    /// Historical trips to announce as live requests.
    pub fn trips(mut self, feed: TripFeed) -> Self {
        self.feed = feed;
        self
    }

    /// Demand field followed by idle taxis.
    pub fn field(mut self, field: DemandField) -> Self {
        self.field = Some(field);
        self
    }

    pub fn taxis(mut self, count: usize) -> Self {
        self.taxis = count;
        self
    }

    /// Start positions, one per taxi.
    pub fn taxi_positions(mut self, positions: Vec<Point>) -> Self {
        self.positions = Some(positions);
        self
    }

    /// Validate inputs, place the fleet and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        self.dispatch.validate()?;
        if self.config.tick_ms == 0 {
            return Err(SimError::Config("tick_ms must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.config.sample_fraction) {
            return Err(SimError::Config(format!(
                "sample_fraction must be in [0, 1], got {}", self.config.sample_fraction
            )));
        }

        let mut rng = SimRng::new(self.config.seed);
        let positions = match self.positions {
            Some(p) => {
                if p.len() != self.taxis {
                    return Err(SimError::TaxiCountMismatch {
                        expected: self.taxis,
                        got:      p.len(),
                        what:     "taxi positions",
                    });
                }
                p
            }
            None => {
                let mut placement = rng.child(PLACEMENT_STREAM);
                (0..self.taxis).map(|_| placement.point_in(&self.bounds)).collect()
            }
        };

        let mut world = PlaneModel::new(self.bounds, self.dispatch.taxi_speed)?;
        let mut post = PostOffice::new();
        let mut taxis = Vec::with_capacity(positions.len());
        for at in positions {
            let id = world.add_taxi(at, self.dispatch.taxi_capacity)?;
            post.register(AgentRef::Taxi(id));
            taxis.push(Taxi::new(id, self.dispatch.taxi_capacity));
        }

        tracing::debug!(
            target: "sim",
            taxis = taxis.len(),
            trips = self.feed.len(),
            field = self.field.is_some(),
            "simulation built"
        );

        Ok(Sim {
            clock:         self.config.make_clock(),
            config:        self.config,
            dispatch:      self.dispatch,
            rng,
            feed:          self.feed,
            field:         self.field,
            world,
            taxis,
            customers:     BTreeMap::new(),
            post,
            next_customer: 0,
        })
    }
}
