//! Cell geometry over the operating area.
//!
//! The longer axis of the area is split into `subdivisions` cells; the
//! shorter axis gets proportionally fewer so cells stay roughly square.
//! Cell `(0, 0)` touches `bounds.min`.

use tx_core::{Bounds, Point};

use crate::{FieldError, FieldResult};

/// Grid coordinates `(x, y)` of one cell.
pub type Cell = (usize, usize);

/// Spatial discretisation shared by the builder and the field.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridShape {
    pub bounds:  Bounds,
    pub cells_x: usize,
    pub cells_y: usize,
}

impl GridShape {
    pub fn new(bounds: Bounds, cells_x: usize, cells_y: usize) -> FieldResult<Self> {
        if !bounds.is_valid() {
            return Err(FieldError::EmptyArea(format!("{} → {}", bounds.min, bounds.max)));
        }
        if cells_x == 0 || cells_y == 0 {
            return Err(FieldError::Config(format!("grid must have cells, got {cells_x}×{cells_y}")));
        }
        Ok(Self { bounds, cells_x, cells_y })
    }

    /// Split the longer side of `bounds` into `subdivisions` cells.
    pub fn from_subdivisions(bounds: Bounds, subdivisions: usize) -> FieldResult<Self> {
        if !bounds.is_valid() {
            return Err(FieldError::EmptyArea(format!("{} → {}", bounds.min, bounds.max)));
        }
        let longest = bounds.width().max(bounds.height());
        let along = |extent: f64| ((subdivisions as f64 * extent / longest).round() as usize).max(1);
        Self::new(bounds, along(bounds.width()), along(bounds.height()))
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells_x * self.cells_y
    }

    #[inline]
    pub fn cell_width(&self) -> f64 {
        self.bounds.width() / self.cells_x as f64
    }

    #[inline]
    pub fn cell_height(&self) -> f64 {
        self.bounds.height() / self.cells_y as f64
    }

    /// Cell containing `p`.  Points outside the area map to the nearest
    /// border cell.
    pub fn cell_of(&self, p: Point) -> Cell {
        let bin = |v: f64, min: f64, size: f64, cells: usize| {
            let raw = ((v - min) / size).floor();
            if raw <= 0.0 || raw.is_nan() { 0 } else { (raw as usize).min(cells - 1) }
        };
        (
            bin(p.x, self.bounds.min.x, self.cell_width(), self.cells_x),
            bin(p.y, self.bounds.min.y, self.cell_height(), self.cells_y),
        )
    }

    /// Plane coordinates of the middle of `cell`.
    pub fn cell_center(&self, (x, y): Cell) -> Point {
        Point::new(
            self.bounds.min.x + (x as f64 + 0.5) * self.cell_width(),
            self.bounds.min.y + (y as f64 + 0.5) * self.cell_height(),
        )
    }

    /// Cells at exactly Chebyshev distance `offset` from `center`, clipped to
    /// the grid.  Offset 0 yields `center` itself.  Each cell appears once:
    /// the left and right columns carry the corners, the top and bottom rows
    /// only their interior.
    pub fn ring(&self, center: Cell, offset: usize) -> Vec<Cell> {
        let (cx, cy) = center;
        if offset == 0 {
            return vec![center];
        }

        let mut cells = Vec::new();
        let y_lo = cy.saturating_sub(offset);
        let y_hi = (cy + offset).min(self.cells_y - 1);

        // Left and right columns, full height.
        if let Some(x) = cx.checked_sub(offset) {
            cells.extend((y_lo..=y_hi).map(|y| (x, y)));
        }
        if cx + offset < self.cells_x {
            cells.extend((y_lo..=y_hi).map(|y| (cx + offset, y)));
        }

        // Top and bottom rows, interior only.
        let x_lo = (cx + 1).saturating_sub(offset);
        let x_hi = (cx + offset - 1).min(self.cells_x - 1);
        if x_lo <= x_hi {
            if let Some(y) = cy.checked_sub(offset) {
                cells.extend((x_lo..=x_hi).map(|x| (x, y)));
            }
            if cy + offset < self.cells_y {
                cells.extend((x_lo..=x_hi).map(|x| (x, cy + offset)));
            }
        }
        cells
    }

    /// Largest ring offset that can still contain a cell.
    #[inline]
    pub fn max_offset(&self) -> usize {
        self.cells_x.max(self.cells_y) - 1
    }
}
