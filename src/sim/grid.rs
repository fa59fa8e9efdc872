//! Offset hex-grid coordinate model
//!
//! Even rows hold `GRID_COLUMNS` cells, odd rows one fewer and shifted right by
//! a radius, so adjacent rows interleave. Row/col is authoritative; pixel
//! positions are always derived through [`project`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Vertical distance between row centers
pub const ROW_HEIGHT: f32 = BUBBLE_RADIUS * 1.732_050_8;

/// A grid cell address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Number of columns in a given row
#[inline]
pub fn columns_in_row(row: u32) -> u32 {
    if row % 2 == 0 {
        GRID_COLUMNS
    } else {
        GRID_COLUMNS - 1
    }
}

/// Horizontal offset that centers the grid in the container
#[inline]
fn centered_offset(container_width: f32) -> f32 {
    (container_width - GRID_COLUMNS as f32 * BUBBLE_DIAMETER) / 2.0 + BUBBLE_RADIUS
}

/// Pixel center of a grid cell
pub fn project(row: u32, col: u32, container_width: f32) -> Vec2 {
    let shift = if row % 2 == 1 { BUBBLE_RADIUS } else { 0.0 };
    Vec2::new(
        centered_offset(container_width) + col as f32 * BUBBLE_DIAMETER + shift,
        BUBBLE_RADIUS + row as f32 * ROW_HEIGHT,
    )
}

/// Neighbor test on pixel centers.
///
/// A distance threshold of 2.2 radii rather than exact hex adjacency, so the
/// relation tolerates drift from the physics. Callers exclude the bubble
/// itself.
#[inline]
pub fn within_neighbor_distance(a: Vec2, b: Vec2) -> bool {
    a.distance(b) < NEIGHBOR_DISTANCE_FACTOR * BUBBLE_RADIUS
}

/// Every valid cell in rows `0..=max_row`, row-major
pub fn cells_through(max_row: u32) -> impl Iterator<Item = Cell> {
    (0..=max_row).flat_map(|row| (0..columns_in_row(row)).map(move |col| Cell::new(row, col)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WIDTH: f32 = 600.0;

    #[test]
    fn test_project_origin() {
        let p = project(0, 0, WIDTH);
        // 12 columns * 44px = 528, centered in 600 → 36px margin
        assert!((p.x - (36.0 + BUBBLE_RADIUS)).abs() < 0.001);
        assert!((p.y - BUBBLE_RADIUS).abs() < 0.001);
    }

    #[test]
    fn test_odd_rows_are_shifted() {
        let even = project(0, 3, WIDTH);
        let odd = project(1, 3, WIDTH);
        assert!((odd.x - even.x - BUBBLE_RADIUS).abs() < 0.001);
        assert!((odd.y - even.y - ROW_HEIGHT).abs() < 0.001);
        assert_eq!(columns_in_row(0), GRID_COLUMNS);
        assert_eq!(columns_in_row(1), GRID_COLUMNS - 1);
    }

    #[test]
    fn test_hex_neighbors_are_within_threshold() {
        let center = project(2, 4, WIDTH);
        // Same row, both rows above and below (even row 2 → odd rows use col-1, col)
        for (r, c) in [(2, 3), (2, 5), (1, 3), (1, 4), (3, 3), (3, 4)] {
            assert!(within_neighbor_distance(center, project(r, c, WIDTH)), "({r},{c})");
        }
        // Two cells away is not a neighbor
        assert!(!within_neighbor_distance(center, project(2, 6, WIDTH)));
        assert!(!within_neighbor_distance(center, project(0, 4, WIDTH)));
    }

    #[test]
    fn test_cells_through_counts() {
        let cells: Vec<_> = cells_through(2).collect();
        assert_eq!(cells.len(), (GRID_COLUMNS * 2 + GRID_COLUMNS - 1) as usize);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(*cells.last().unwrap(), Cell::new(2, GRID_COLUMNS - 1));
    }

    proptest! {
        #[test]
        fn prop_neighbor_relation_is_symmetric(
            r1 in 0u32..20, c1 in 0u32..12, r2 in 0u32..20, c2 in 0u32..12
        ) {
            let a = project(r1, c1, WIDTH);
            let b = project(r2, c2, WIDTH);
            prop_assert_eq!(within_neighbor_distance(a, b), within_neighbor_distance(b, a));
        }

        #[test]
        fn prop_projection_is_injective(
            r1 in 0u32..20, c1 in 0u32..11, r2 in 0u32..20, c2 in 0u32..11
        ) {
            prop_assume!((r1, c1) != (r2, c2));
            let a = project(r1, c1, WIDTH);
            let b = project(r2, c2, WIDTH);
            prop_assert!(a.distance(b) > BUBBLE_RADIUS);
        }
    }
}
