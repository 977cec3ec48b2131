//! One-time construction of a [`DemandField`] from historical pickups.
//!
//! # Build steps
//!
//! 1. **Count**: each pickup inside `[origin_ms, end_ms)` adds 1 to its
//!    `(frame, cell)` bin.
//! 2. **Smooth**: every bin gets the weighted raw counts of the same cell in
//!    neighbouring frames added to it (`smoothing`, frame offsets clamped to
//!    the grid).  Reading from the raw counts keeps the result independent of
//!    iteration order.
//! 3. **Max**: record the largest smoothed value of every frame.

use tx_core::{Bounds, Point};

use crate::{DemandField, FieldError, FieldResult, GridShape};

// ── FieldConfig ───────────────────────────────────────────────────────────────

/// Construction and query parameters of the demand field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FieldConfig {
    /// Cells along the longer side of the operating area.
    pub subdivisions:    usize,
    /// Duration of one time frame.
    pub frame_ms:        u64,
    /// `(frame offset, weight)` pairs added to each frame during smoothing.
    pub smoothing:       Vec<(i64, f64)>,
    /// Distance beyond which a neighbouring taxi exerts no repulsion.
    pub influence_range: f64,
    /// Repulsion per unit of a neighbour's free capacity.
    pub capacity_weight: f64,
    /// Cells at or below this density are ignored by the ring search.
    pub density_epsilon: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            subdivisions:    40,
            frame_ms:        15 * 60 * 1000,
            smoothing:       vec![(-1, 0.5), (1, 0.5), (2, 0.25), (3, 0.125)],
            influence_range: 2.5,
            capacity_weight: 0.5,
            density_epsilon: 0.01,
        }
    }
}

impl FieldConfig {
    pub fn validate(&self) -> FieldResult<()> {
        if self.subdivisions == 0 {
            return Err(FieldError::Config("subdivisions must be > 0".into()));
        }
        if self.frame_ms == 0 {
            return Err(FieldError::Config("frame_ms must be > 0".into()));
        }
        if self.influence_range <= 0.0 {
            return Err(FieldError::Config("influence_range must be > 0".into()));
        }
        if self.density_epsilon < 0.0 {
            return Err(FieldError::Config("density_epsilon must be >= 0".into()));
        }
        Ok(())
    }
}

// ── FieldBuilder ──────────────────────────────────────────────────────────────

/// Accumulates pickups, then produces an immutable [`DemandField`].
pub struct FieldBuilder {
    config:    FieldConfig,
    shape:     GridShape,
    origin_ms: i64,
    frames:    usize,
    counts:    Vec<f64>,
    ignored:   usize,
}

impl FieldBuilder {
    /// Prepare a grid over `bounds` covering times `[origin_ms, end_ms)`.
    ///
    /// The span is split into whole frames of `config.frame_ms`; a trailing
    /// partial frame counts as a full one.
    pub fn new(bounds: Bounds, config: FieldConfig, origin_ms: i64, end_ms: i64) -> FieldResult<Self> {
        config.validate()?;
        if end_ms <= origin_ms {
            return Err(FieldError::Config(format!("empty time span {origin_ms}..{end_ms} ms")));
        }
        let shape = GridShape::from_subdivisions(bounds, config.subdivisions)?;
        let span = (end_ms - origin_ms) as u64;
        let frames = span.div_ceil(config.frame_ms) as usize;

        Ok(Self {
            counts: vec![0.0; frames * shape.cell_count()],
            config,
            shape,
            origin_ms,
            frames,
            ignored: 0,
        })
    }

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Count one historical pickup.  Returns `false` (and ignores it) when
    /// `time_ms` falls outside the field's span.
    pub fn add_pickup(&mut self, time_ms: i64, at: Point) -> bool {
        let Some(frame) = self.frame_of(time_ms) else {
            self.ignored += 1;
            return false;
        };
        let idx = index(&self.shape, frame, self.shape.cell_of(at));
        self.counts[idx] += 1.0;
        true
    }

    fn frame_of(&self, time_ms: i64) -> Option<usize> {
        if time_ms < self.origin_ms {
            return None;
        }
        let frame = ((time_ms - self.origin_ms) as u64 / self.config.frame_ms) as usize;
        (frame < self.frames).then_some(frame)
    }

    /// Smooth, record per-frame maxima and freeze the field.
    pub fn build(self) -> DemandField {
        let cells = self.shape.cell_count();
        let last = self.frames as i64 - 1;
        let mut values = self.counts.clone();

        for t in 0..self.frames {
            for &(offset, weight) in &self.config.smoothing {
                let source = (t as i64 + offset).clamp(0, last) as usize;
                let (dst, src) = (t * cells, source * cells);
                for c in 0..cells {
                    values[dst + c] += weight * self.counts[src + c];
                }
            }
        }

        let max_values: Vec<f64> = values
            .chunks(cells)
            .map(|frame| frame.iter().copied().fold(0.0, f64::max))
            .collect();

        tracing::info!(
            target: "field",
            frames = self.frames,
            cells_x = self.shape.cells_x,
            cells_y = self.shape.cells_y,
            ignored = self.ignored,
            "demand field built"
        );

        DemandField::from_parts(
            self.shape,
            self.origin_ms,
            self.config,
            self.frames,
            values,
            max_values,
        )
    }
}

/// Flat index of `(frame, cell)` in a frame-major buffer.
#[inline]
pub(crate) fn index(shape: &GridShape, frame: usize, (x, y): (usize, usize)) -> usize {
    frame * shape.cell_count() + x * shape.cells_y + y
}
