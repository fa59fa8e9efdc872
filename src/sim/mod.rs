//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by bubble ID)
//! - No rendering, audio or network dependencies

pub mod collision;
pub mod grid;
pub mod matching;
pub mod state;
pub mod targeting;
pub mod tick;

pub use collision::{Contact, SnapError, snap_to_grid};
pub use grid::{Cell, ROW_HEIGHT, columns_in_row, project};
pub use matching::{MatchOutcome, detonate_bomb, find_cluster, resolve_match};
pub use state::{
    Bubble, BubbleColor, DangerIndicator, GameEvent, GamePhase, GameState, PowerUp, Projectile,
    ProjectileState,
};
pub use targeting::{TargetCandidate, enumerate_candidates, is_path_clear};
pub use tick::{TickInput, apply_hint, escalate_ceiling, generate_board, launch_force, tick};
