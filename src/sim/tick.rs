//! Fixed timestep simulation tick
//!
//! Drives the projectile through aim → flight → contact → snap, then resolves
//! matches, ceiling drops and advisor scheduling.

use glam::Vec2;
use rand::Rng;

use super::collision::{Contact, find_contact, reflect_off_walls, snap_to_grid};
use super::grid::{columns_in_row, project};
use super::matching::{detonate_bomb, resolve_match};
use super::state::{BubbleColor, GameEvent, GamePhase, GameState, PowerUp, ProjectileState};
use crate::advisor::StrategicHint;
use crate::clamp_length;
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position normalized to the container (0..1 on both axes)
    pub pointer: Option<Vec2>,
    /// Drag/pinch held
    pub pulling: bool,
    /// Drag/pinch released this tick
    pub release: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase == GamePhase::GameOver {
        return;
    }

    state.time_secs += dt;

    match state.projectile.state {
        ProjectileState::Anchored => {
            // No new shots while a hint is being computed
            if !state.advisor_pending && input.pulling && input.pointer.is_some() {
                state.projectile.state = ProjectileState::Aiming;
                update_aim(state, input);
            }
        }

        ProjectileState::Aiming => {
            if state.advisor_pending {
                // A hint request arrived mid-aim: cancel the pull
                let anchor = state.anchor();
                state.projectile.reset(anchor);
            } else if input.release || !input.pulling {
                launch(state);
            } else {
                update_aim(state, input);
            }
        }

        ProjectileState::Flying => step_flight(state, dt),

        ProjectileState::Settling => settle(state),
    }

    state.cleanup();
    state.normalize_order();
}

/// Quadratic launch force for a pull of `displacement` pixels
pub fn launch_force(displacement: f32) -> f32 {
    let ratio = (displacement / MAX_DRAG_DISTANCE).min(1.0);
    MIN_LAUNCH_FORCE + (MAX_LAUNCH_FORCE - MIN_LAUNCH_FORCE) * ratio * ratio
}

/// Move the projectile with the pointer, clamped to the maximum pull
fn update_aim(state: &mut GameState, input: &TickInput) {
    if let Some(pointer) = input.pointer {
        let anchor = state.anchor();
        let target = state.layout.denormalize(pointer);
        state.projectile.pos = anchor + clamp_length(target - anchor, MAX_DRAG_DISTANCE);
    }
}

/// Release the pull: fire away from the pointer, or cancel a tiny pull
fn launch(state: &mut GameState) {
    let anchor = state.anchor();
    let pull = anchor - state.projectile.pos;
    let len = pull.length();

    if len < MIN_DRAG_DISTANCE {
        state.projectile.reset(anchor);
        return;
    }

    let projectile = &mut state.projectile;
    projectile.vel = pull * launch_force(len);
    projectile.state = ProjectileState::Flying;
    projectile.flight_started_at = state.time_secs;
    state.events.push(GameEvent::Launched);
}

/// Integrate one frame of flight with enough substeps to avoid tunneling
fn step_flight(state: &mut GameState, dt: f32) {
    let anchor = state.anchor();

    if state.time_secs - state.projectile.flight_started_at >= FLIGHT_TIMEOUT_SECS {
        log::warn!("Flight timed out, resetting projectile");
        state.projectile.reset(anchor);
        state.events.push(GameEvent::FlightTimedOut);
        finish_shot(state);
        return;
    }

    let speed = state.projectile.vel.length() * dt;
    let substeps = ((speed / (BUBBLE_RADIUS * SUBSTEP_RADIUS_FACTOR)).ceil() as u32).max(1);
    let sub_dt = dt / substeps as f32;
    let width = state.layout.width;

    for _ in 0..substeps {
        let projectile = &mut state.projectile;
        projectile.pos += projectile.vel * sub_dt;
        reflect_off_walls(&mut projectile.pos, &mut projectile.vel, width);

        match find_contact(&state.bubbles, state.projectile.pos) {
            Some(Contact::Bubble(idx)) if state.bubbles[idx].is_bomb() => {
                let center = state.bubbles[idx].pos;
                detonate_bomb(state, center);
                state.projectile.reset(anchor);
                finish_shot(state);
                return;
            }
            Some(_) => {
                state.projectile.state = ProjectileState::Settling;
                break;
            }
            None => {}
        }
    }

    if state.projectile.state == ProjectileState::Settling {
        settle(state);
    } else {
        state.projectile.vel *= FLIGHT_FRICTION;
    }
}

/// Snap the projectile into the nearest open cell and resolve matches
fn settle(state: &mut GameState) {
    let anchor = state.anchor();
    let point = state.projectile.pos;
    let color = state.projectile.color;
    state.projectile.reset(anchor);

    let cell = match snap_to_grid(state, point) {
        Ok(cell) => cell,
        Err(err) => {
            log::error!("Board saturated at ({:.1}, {:.1}): {}", point.x, point.y, err);
            state.end_game();
            return;
        }
    };

    let id = state.add_bubble(cell.row, cell.col, color, None);
    resolve_match(state, id);

    if cell.row >= state.config.danger_row {
        log::info!("Bubble settled on danger row {}", cell.row);
        state.end_game();
    }

    finish_shot(state);
}

/// Bookkeeping after every resolved shot: ceiling drops, board refill,
/// next projectile color and advisor scheduling
pub(crate) fn finish_shot(state: &mut GameState) {
    state.shots_fired += 1;
    state.shots_since_drop += 1;

    if state.phase == GamePhase::GameOver {
        return;
    }

    let interval = state.config.ceiling_interval;
    if interval > 0 && state.shots_since_drop >= interval {
        state.shots_since_drop = 0;
        escalate_ceiling(state);
        if state.phase == GamePhase::GameOver {
            return;
        }
    }

    state.cleanup();
    if state.bubbles.is_empty() {
        log::info!("Board cleared after {} shots", state.shots_fired);
        state.events.push(GameEvent::BoardCleared);
        generate_board(state);
    }

    state.projectile.color = pick_projectile_color(state);

    let every = state.config.advisor_interval;
    if every > 0 && state.shots_fired % every == 0 && !state.advisor_pending {
        state.capture_requested = true;
    }
}

/// Push every bubble down one row and spawn a full new top row
pub fn escalate_ceiling(state: &mut GameState) {
    let width = state.layout.width;
    for bubble in state.bubbles.iter_mut().filter(|b| b.active) {
        bubble.row += 1;
        bubble.reproject(width);
    }
    spawn_row(state, 0);
    state.events.push(GameEvent::CeilingDropped);

    let max_row = state.max_row().unwrap_or(0);
    log::info!("Ceiling dropped, lowest row now {}", max_row);
    if max_row >= state.config.danger_row {
        state.end_game();
    }
}

/// Fill the configured number of rows
pub fn generate_board(state: &mut GameState) {
    for row in 0..state.config.initial_rows {
        spawn_row(state, row);
    }
    log::info!(
        "Generated board: {} rows, {} bubbles (seed {})",
        state.config.initial_rows,
        state.bubbles.len(),
        state.seed
    );
}

/// Fill every cell of one row with random colors and occasional power-ups
pub fn spawn_row(state: &mut GameState, row: u32) {
    for col in 0..columns_in_row(row) {
        let roll: f32 = state.rng.random();
        let power_up = if roll < state.config.bomb_chance {
            Some(PowerUp::Bomb)
        } else if roll < state.config.bomb_chance + state.config.rainbow_chance {
            Some(PowerUp::Rainbow)
        } else {
            None
        };
        let color = BubbleColor::ALL[state.rng.random_range(0..BubbleColor::ALL.len())];
        state.add_bubble(row, col, color, power_up);
    }
}

/// Draw the next projectile color from colors still on the board
pub fn pick_projectile_color(state: &mut GameState) -> BubbleColor {
    let colors = state.colors_on_board();
    let pool: &[BubbleColor] = if colors.is_empty() {
        &BubbleColor::ALL
    } else {
        &colors
    };
    pool[state.rng.random_range(0..pool.len())]
}

/// Store an advisor hint and point the aim at its target.
///
/// Applied as-is even if the board changed while the request was in flight.
pub fn apply_hint(state: &mut GameState, hint: StrategicHint) {
    state.advisor_pending = false;
    state.aim_target = hint
        .target_cell()
        .map(|(row, col)| project(row, col, state.layout.width));

    if let Some(color) = hint.recommended_color {
        let anchored = state.projectile.state == ProjectileState::Anchored;
        if anchored && state.colors_on_board().contains(&color) {
            state.projectile.color = color;
        }
    }

    log::info!("Hint: {}", hint.message);
    state.hint = Some(hint);
}
