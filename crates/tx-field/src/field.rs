//! The immutable demand field and its positioning-vector query.
//!
//! # Positioning vector
//!
//! For a taxi at `p` the query sums two kinds of terms:
//!
//! - **Repulsion** from each neighbouring taxi `n` that broadcast its
//!   position: `-w · free(n) · (1 - min(1, |n - p| / R)) · (n - p)`, where `w`
//!   is `capacity_weight` and `R` is `influence_range`.
//! - **Attraction** toward every cell centre `c` with density `d > ε`,
//!   found by an expanding ring search: `d / |c - p| · (c - p)`.
//!
//! The ring search starts at the taxi's cell (offset 0) and grows one
//! Chebyshev ring at a time.  It stops after the first ring whose offset
//! exceeds `search_range` once any dense cell has been seen, or when the
//! rings leave the grid entirely.

use tx_core::{Point, Vec2};

use crate::builder::index;
use crate::{Cell, FieldConfig, GridShape};

/// Last broadcast position and spare capacity of a neighbouring taxi.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NeighborBroadcast {
    pub position:      Point,
    pub free_capacity: u32,
}

/// Result of a positioning query, with ring-search diagnostics.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FieldScan {
    /// Summed repulsion and attraction.
    pub vector:      Vec2,
    /// Largest ring offset examined.
    pub last_offset: usize,
    /// `true` if any cell above the density threshold was found.
    pub found:       bool,
}

/// Smoothed pickup density indexed by `(frame, x, y)`.
///
/// Built by [`FieldBuilder`](crate::FieldBuilder); never mutated afterwards.
#[derive(Debug, Clone)]
pub struct DemandField {
    shape:      GridShape,
    origin_ms:  i64,
    config:     FieldConfig,
    frames:     usize,
    values:     Vec<f64>,
    max_values: Vec<f64>,
}

impl DemandField {
    pub(crate) fn from_parts(
        shape:      GridShape,
        origin_ms:  i64,
        config:     FieldConfig,
        frames:     usize,
        values:     Vec<f64>,
        max_values: Vec<f64>,
    ) -> Self {
        Self { shape, origin_ms, config, frames, values, max_values }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Frame covering `time_ms`, clamped to the first and last frame.
    pub fn frame_index(&self, time_ms: i64) -> usize {
        if time_ms <= self.origin_ms {
            return 0;
        }
        let frame = ((time_ms - self.origin_ms) as u64 / self.config.frame_ms) as usize;
        frame.min(self.frames - 1)
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn value(&self, frame: usize, cell: Cell) -> f64 {
        self.values[index(&self.shape, frame, cell)]
    }

    /// Largest value in `frame`, fixed at build time.
    #[inline]
    pub fn max_value(&self, frame: usize) -> f64 {
        self.max_values[frame]
    }

    /// `value / max_value` for the frame, or 0 for an empty frame.
    pub fn normalized(&self, frame: usize, cell: Cell) -> f64 {
        let max = self.max_value(frame);
        if max > 0.0 { self.value(frame, cell) / max } else { 0.0 }
    }

    // ── Positioning ───────────────────────────────────────────────────────

    /// Displacement an idle taxi at `position` should follow at `time_ms`.
    pub fn positioning_vector(
        &self,
        position:     Point,
        time_ms:      i64,
        neighbors:    &[NeighborBroadcast],
        search_range: usize,
    ) -> Vec2 {
        self.scan(position, time_ms, neighbors, search_range).vector
    }

    /// Full positioning query, reporting how far the ring search went.
    pub fn scan(
        &self,
        position:     Point,
        time_ms:      i64,
        neighbors:    &[NeighborBroadcast],
        search_range: usize,
    ) -> FieldScan {
        let frame = self.frame_index(time_ms);
        let center = self.shape.cell_of(position);

        let mut vector = Vec2::ZERO;
        for n in neighbors {
            vector = vector.add_scaled(self.repulsion(position, n), position.to(n.position));
        }

        let mut found = false;
        let mut last_offset = 0;
        for offset in 0..=self.shape.max_offset() {
            last_offset = offset;
            for cell in self.shape.ring(center, offset) {
                let density = self.value(frame, cell);
                if density <= self.config.density_epsilon {
                    continue;
                }
                found = true;
                let target = self.shape.cell_center(cell);
                let dist = position.distance(target);
                if dist > f64::EPSILON {
                    vector = vector.add_scaled(density / dist, position.to(target));
                }
            }
            if found && offset > search_range {
                break;
            }
        }

        FieldScan { vector, last_offset, found }
    }

    fn repulsion(&self, position: Point, n: &NeighborBroadcast) -> f64 {
        let falloff = 1.0 - (position.distance(n.position) / self.config.influence_range).min(1.0);
        -self.config.capacity_weight * f64::from(n.free_capacity) * falloff
    }
}
