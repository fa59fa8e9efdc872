//! Projectile contact tests and grid snapping
//!
//! The projectile only ever meets three things: the side walls (reflect), the
//! ceiling (stick) and grid bubbles (stick, or detonate a bomb).

use glam::Vec2;
use thiserror::Error;

use super::grid::{Cell, cells_through, project};
use super::state::{Bubble, GameState};
use crate::consts::*;

/// Failure to place a settled projectile
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapError {
    /// Every cell through the search margin is taken
    #[error("no open cell within {searched_rows} rows of the collision point")]
    NoOpenCell { searched_rows: u32 },
}

/// What a projectile touched during a substep
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Reached the top boundary
    Ceiling,
    /// Touched a grid bubble (index into the bubble list)
    Bubble(usize),
}

/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce off the left/right walls, clamping the position inside the container.
///
/// Returns true when a wall was touched.
pub fn reflect_off_walls(pos: &mut Vec2, vel: &mut Vec2, container_width: f32) -> bool {
    if pos.x - BUBBLE_RADIUS < 0.0 {
        pos.x = BUBBLE_RADIUS;
        if vel.x < 0.0 {
            *vel = reflect_velocity(*vel, Vec2::X);
        }
        return true;
    }
    if pos.x + BUBBLE_RADIUS > container_width {
        pos.x = container_width - BUBBLE_RADIUS;
        if vel.x > 0.0 {
            *vel = reflect_velocity(*vel, Vec2::NEG_X);
        }
        return true;
    }
    false
}

/// Nearest active bubble within the collision radius, or the ceiling
pub fn find_contact(bubbles: &[Bubble], pos: Vec2) -> Option<Contact> {
    if pos.y - BUBBLE_RADIUS <= 0.0 {
        return Some(Contact::Ceiling);
    }

    let collision_radius = COLLISION_RADIUS_FACTOR * BUBBLE_RADIUS;
    bubbles
        .iter()
        .enumerate()
        .filter(|(_, b)| b.active)
        .map(|(idx, b)| (idx, b.pos.distance(pos)))
        .filter(|&(_, dist)| dist < collision_radius)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| Contact::Bubble(idx))
}

/// Nearest unoccupied cell to `point`, searching every row through
/// `SNAP_ROW_MARGIN` rows past the current lowest bubble
pub fn snap_to_grid(state: &GameState, point: Vec2) -> Result<Cell, SnapError> {
    let last_row = state.max_row().unwrap_or(0) + SNAP_ROW_MARGIN;
    nearest_open_cell(state, point, last_row)
}

/// Nearest unoccupied cell in rows `0..=last_row`
pub fn nearest_open_cell(state: &GameState, point: Vec2, last_row: u32) -> Result<Cell, SnapError> {
    let width = state.layout.width;

    cells_through(last_row)
        .filter(|&cell| !state.is_occupied(cell))
        .map(|cell| (cell, project(cell.row, cell.col, width).distance(point)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(cell, _)| cell)
        .ok_or(SnapError::NoOpenCell {
            searched_rows: last_row + 1,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DifficultyConfig, Layout};
    use crate::sim::grid::columns_in_row;
    use crate::sim::state::BubbleColor;

    fn empty_state() -> GameState {
        GameState::empty(5, DifficultyConfig::default(), Layout::default())
    }

    #[test]
    fn test_reflect_velocity() {
        let reflected = reflect_velocity(Vec2::new(100.0, -50.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 0.001);
        assert!((reflected.y + 50.0).abs() < 0.001);
    }

    #[test]
    fn test_wall_reflection_clamps() {
        let mut pos = Vec2::new(5.0, 300.0);
        let mut vel = Vec2::new(-200.0, -400.0);
        assert!(reflect_off_walls(&mut pos, &mut vel, 600.0));
        assert_eq!(pos.x, BUBBLE_RADIUS);
        assert!(vel.x > 0.0);
        assert_eq!(vel.y, -400.0);

        let mut pos = Vec2::new(595.0, 300.0);
        let mut vel = Vec2::new(200.0, -400.0);
        assert!(reflect_off_walls(&mut pos, &mut vel, 600.0));
        assert_eq!(pos.x, 600.0 - BUBBLE_RADIUS);
        assert!(vel.x < 0.0);

        let mut pos = Vec2::new(300.0, 300.0);
        let mut vel = Vec2::new(200.0, -400.0);
        assert!(!reflect_off_walls(&mut pos, &mut vel, 600.0));
    }

    #[test]
    fn test_contact_prefers_nearest() {
        let mut state = empty_state();
        state.add_bubble(3, 4, BubbleColor::Red, None);
        state.add_bubble(3, 5, BubbleColor::Blue, None);
        let near_second = state.bubbles[1].pos + Vec2::new(5.0, 30.0);
        assert_eq!(
            find_contact(&state.bubbles, near_second),
            Some(Contact::Bubble(1))
        );
        assert_eq!(find_contact(&state.bubbles, Vec2::new(300.0, 600.0)), None);
        assert_eq!(
            find_contact(&state.bubbles, Vec2::new(300.0, 10.0)),
            Some(Contact::Ceiling)
        );
    }

    #[test]
    fn test_snap_finds_nearest_open_cell() {
        let mut state = empty_state();
        state.add_bubble(0, 5, BubbleColor::Red, None);
        let below = project(1, 5, state.layout.width) + Vec2::new(2.0, 3.0);
        assert_eq!(snap_to_grid(&state, below), Ok(Cell::new(1, 5)));

        // Occupied cell is skipped even when the point sits on it
        let on_top = state.bubbles[0].pos;
        let cell = snap_to_grid(&state, on_top).unwrap();
        assert_ne!(cell, Cell::new(0, 5));
    }

    #[test]
    fn test_snap_reports_saturation() {
        let mut state = empty_state();
        for row in 0..=1 {
            for col in 0..columns_in_row(row) {
                state.add_bubble(row, col, BubbleColor::Green, None);
            }
        }
        assert_eq!(
            nearest_open_cell(&state, Vec2::new(300.0, 40.0), 1),
            Err(SnapError::NoOpenCell { searched_rows: 2 })
        );
        // The full search always extends past the lowest bubble
        assert_eq!(snap_to_grid(&state, Vec2::new(300.0, 40.0)).map(|c| c.row), Ok(2));
    }
}
