//! Seeded randomness for a whole run.
//!
//! Only two things in a run are random: which fed trips become live
//! requests, and where taxis start when no positions are given.  The tick
//! loop is sequential with a fixed agent order, so one `SmallRng` seeded
//! from [`SimConfig::seed`][crate::SimConfig] reproduces a run exactly.
//! Consumers that draw a variable number of values take their own stream
//! via [`SimRng::child`], keyed by a constant, so the main stream is not
//! shifted by them.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::{Bounds, Point};

/// Odd multiplier spreading stream keys over the seed space.
const STREAM_SPREAD: u64 = 0x9e37_79b9_7f4a_7c15;

/// Run-wide RNG.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Independent stream for the consumer identified by `stream`.
    ///
    /// Draws exactly one value from `self`.
    pub fn child(&mut self, stream: u64) -> SimRng {
        let seed = self.0.next_u64() ^ stream.wrapping_mul(STREAM_SPREAD);
        Self(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Bernoulli draw; `p` outside `[0, 1]` is clamped.
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform point inside `bounds`.
    pub fn point_in(&mut self, bounds: &Bounds) -> Point {
        let x = self.0.gen_range(0.0..=1.0);
        let y = self.0.gen_range(0.0..=1.0);
        Point::new(bounds.min.x + x * bounds.width(), bounds.min.y + y * bounds.height())
    }
}
