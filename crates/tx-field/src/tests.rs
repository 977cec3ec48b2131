//! Unit tests for tx-field.

use tx_core::{Bounds, Point};

use crate::{DemandField, FieldBuilder, FieldConfig, FieldError, GridShape, NeighborBroadcast};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// 10×10 area split into unit cells, one-second frames, no smoothing.
fn flat_config() -> FieldConfig {
    FieldConfig {
        subdivisions: 10,
        frame_ms:     1_000,
        smoothing:    Vec::new(),
        ..FieldConfig::default()
    }
}

fn square() -> Bounds {
    Bounds::from_size(10.0, 10.0)
}

fn field_with(pickups: &[(i64, Point)], frames: i64) -> DemandField {
    let mut b = FieldBuilder::new(square(), flat_config(), 0, frames * 1_000).unwrap();
    for &(t, p) in pickups {
        b.add_pickup(t, p);
    }
    b.build()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── GridShape ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod grid {
    use super::*;

    #[test]
    fn subdivisions_follow_aspect_ratio() {
        let shape = GridShape::from_subdivisions(Bounds::from_size(6.0, 10.0), 20).unwrap();
        assert_eq!(shape.cells_y, 20);
        assert_eq!(shape.cells_x, 12);
    }

    #[test]
    fn cell_of_clamps_outside_points() {
        let shape = GridShape::from_subdivisions(square(), 10).unwrap();
        assert_eq!(shape.cell_of(Point::new(2.5, 7.1)), (2, 7));
        assert_eq!(shape.cell_of(Point::new(-3.0, 10.0)), (0, 9));
        assert_eq!(shape.cell_of(Point::new(42.0, -1.0)), (9, 0));
    }

    #[test]
    fn cell_center_is_mid_cell() {
        let shape = GridShape::from_subdivisions(square(), 10).unwrap();
        assert_eq!(shape.cell_center((3, 0)), Point::new(3.5, 0.5));
    }

    #[test]
    fn ring_sizes_without_duplicates() {
        let shape = GridShape::from_subdivisions(square(), 10).unwrap();
        assert_eq!(shape.ring((5, 5), 0), vec![(5, 5)]);
        for offset in 1..=4 {
            let mut ring = shape.ring((5, 5), offset);
            assert_eq!(ring.len(), 8 * offset);
            ring.sort();
            ring.dedup();
            assert_eq!(ring.len(), 8 * offset, "duplicate cells at offset {offset}");
            assert!(ring.iter().all(|&(x, y)| x.abs_diff(5).max(y.abs_diff(5)) == offset));
        }
    }

    #[test]
    fn ring_is_clipped_at_corner() {
        let shape = GridShape::from_subdivisions(square(), 10).unwrap();
        let mut ring = shape.ring((0, 0), 1);
        ring.sort();
        assert_eq!(ring, vec![(0, 1), (1, 0), (1, 1)]);
        assert!(shape.ring((0, 0), 10).is_empty());
    }

    #[test]
    fn rejects_degenerate_area() {
        let err = GridShape::from_subdivisions(Bounds::from_size(0.0, 5.0), 10).unwrap_err();
        assert!(matches!(err, FieldError::EmptyArea(_)));
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use super::*;

    #[test]
    fn counts_pickups_per_frame_and_cell() {
        let p = Point::new(1.5, 1.5);
        let field = field_with(&[(0, p), (999, p), (1_000, p)], 2);
        assert_eq!(field.value(0, (1, 1)), 2.0);
        assert_eq!(field.value(1, (1, 1)), 1.0);
        assert_eq!(field.max_value(0), 2.0);
        assert!(close(field.normalized(1, (1, 1)), 1.0));
    }

    #[test]
    fn pickups_outside_span_are_ignored() {
        let mut b = FieldBuilder::new(square(), flat_config(), 0, 1_000).unwrap();
        assert!(!b.add_pickup(-1, Point::new(1.0, 1.0)));
        assert!(!b.add_pickup(1_000, Point::new(1.0, 1.0)));
        assert!(b.add_pickup(500, Point::new(1.0, 1.0)));
        assert_eq!(b.build().max_value(0), 1.0);
    }

    #[test]
    fn smoothing_reads_raw_counts_with_clamped_frames() {
        let config = FieldConfig { smoothing: FieldConfig::default().smoothing, ..flat_config() };
        let mut b = FieldBuilder::new(square(), config, 0, 4_000).unwrap();
        b.add_pickup(2_500, Point::new(0.5, 0.5));
        let field = b.build();

        let series: Vec<f64> = (0..4).map(|t| field.value(t, (0, 0))).collect();
        for (got, want) in series.iter().zip([0.25, 0.5, 1.0, 0.5]) {
            assert!(close(*got, want), "{series:?}");
        }
    }

    #[test]
    fn trailing_partial_frame_counts() {
        let b = FieldBuilder::new(square(), flat_config(), 0, 2_500).unwrap();
        assert_eq!(b.frames(), 3);
    }

    #[test]
    fn frame_index_is_clamped() {
        let field = field_with(&[], 3);
        assert_eq!(field.frame_index(-10_000), 0);
        assert_eq!(field.frame_index(1_500), 1);
        assert_eq!(field.frame_index(60_000), 2);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = FieldConfig { frame_ms: 0, ..flat_config() };
        assert!(matches!(
            FieldBuilder::new(square(), config, 0, 1_000),
            Err(FieldError::Config(_))
        ));
        assert!(FieldBuilder::new(square(), flat_config(), 5, 5).is_err());
    }
}

// ── Ring search ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod ring_search {
    use super::*;

    #[test]
    fn expands_until_found_then_stops_past_range() {
        // Single dense cell four rings east of the taxi.
        let field = field_with(&[(0, Point::new(6.5, 2.5))], 1);
        let scan = field.scan(Point::new(2.5, 2.5), 0, &[], 2);
        assert!(scan.found);
        assert_eq!(scan.last_offset, 4);
        assert!(scan.vector.x > 0.0);
        assert!(close(scan.vector.y, 0.0));
    }

    #[test]
    fn close_hit_scans_one_ring_past_range() {
        let field = field_with(&[(0, Point::new(3.5, 2.5))], 1);
        let scan = field.scan(Point::new(2.5, 2.5), 0, &[], 2);
        assert_eq!(scan.last_offset, 3);
    }

    #[test]
    fn attraction_is_density_over_distance() {
        let p = Point::new(5.5, 2.5);
        let field = field_with(&[(0, p), (0, p)], 1);
        // density 2, distance 3: 2/3 · (3, 0) = (2, 0).
        let v = field.positioning_vector(Point::new(2.5, 2.5), 0, &[], 5);
        assert!(close(v.x, 2.0) && close(v.y, 0.0), "{v:?}");
    }

    #[test]
    fn empty_field_scans_whole_grid_and_returns_repulsion_only() {
        let field = field_with(&[], 1);
        let neighbor = NeighborBroadcast { position: Point::new(3.5, 2.5), free_capacity: 2 };
        let scan = field.scan(Point::new(2.5, 2.5), 0, &[neighbor], 2);
        assert!(!scan.found);
        assert_eq!(scan.last_offset, 9);
        // -0.5 · 2 · (1 - 1/2.5) · (1, 0)
        assert!(close(scan.vector.x, -0.6) && close(scan.vector.y, 0.0), "{:?}", scan.vector);
    }

    #[test]
    fn distant_neighbors_do_not_repel() {
        let field = field_with(&[], 1);
        let neighbor = NeighborBroadcast { position: Point::new(9.0, 9.0), free_capacity: 5 };
        let v = field.positioning_vector(Point::new(1.0, 1.0), 0, &[neighbor], 2);
        assert_eq!(v, tx_core::Vec2::ZERO);
    }

    #[test]
    fn dense_cell_under_taxi_adds_nothing() {
        let field = field_with(&[(0, Point::new(2.5, 2.5))], 1);
        let scan = field.scan(Point::new(2.5, 2.5), 0, &[], 0);
        assert!(scan.found);
        assert_eq!(scan.last_offset, 1);
        assert_eq!(scan.vector, tx_core::Vec2::ZERO);
    }
}
