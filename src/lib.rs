//! Hex Popper - a hex-grid bubble shooter with an AI targeting advisor
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, matching, targeting, projectile physics)
//! - `advisor`: Strategic hint client (prompt, transport, retry, local fallback)
//! - `session`: Single owner tying the tick loop to the advisor worker
//! - `settings`: Difficulty, layout and advisor configuration

pub mod advisor;
pub mod session;
pub mod settings;
pub mod sim;

pub use advisor::{FallbackReason, HintSource, StrategicHint};
pub use session::Session;
pub use settings::{Difficulty, DifficultyConfig, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Bubble geometry
    pub const BUBBLE_RADIUS: f32 = 22.0;
    pub const BUBBLE_DIAMETER: f32 = BUBBLE_RADIUS * 2.0;
    /// Columns in even rows (odd rows hold one fewer)
    pub const GRID_COLUMNS: u32 = 12;

    /// Neighbor threshold (deliberately looser than exact hex adjacency)
    pub const NEIGHBOR_DISTANCE_FACTOR: f32 = 2.2;
    /// Projectile-to-bubble contact distance, also used by line-of-sight
    pub const COLLISION_RADIUS_FACTOR: f32 = 1.8;
    /// Bomb blast radius
    pub const BOMB_RADIUS_FACTOR: f32 = 3.5;

    /// Minimum matched group size
    pub const MIN_MATCH: usize = 3;
    /// Groups of this size or more are flagged as chain reactions
    pub const CHAIN_REACTION_SIZE: usize = 5;
    /// Score multiplier for groups larger than `MIN_MATCH`
    pub const LARGE_MATCH_MULTIPLIER: f32 = 1.5;
    /// Points per bubble destroyed by a bomb
    pub const BOMB_BONUS_PER_BUBBLE: u64 = 100;

    /// Anchor sits this far above the bottom edge of the container
    pub const ANCHOR_BOTTOM_OFFSET: f32 = 60.0;
    /// Maximum pull distance from the anchor
    pub const MAX_DRAG_DISTANCE: f32 = 150.0;
    /// Pulls shorter than this are treated as a cancelled shot
    pub const MIN_DRAG_DISTANCE: f32 = 10.0;
    /// Launch force range (velocity = pull * force, per second)
    pub const MIN_LAUNCH_FORCE: f32 = 4.0;
    pub const MAX_LAUNCH_FORCE: f32 = 12.0;
    /// Per-frame velocity decay while flying
    pub const FLIGHT_FRICTION: f32 = 0.998;
    /// Hard cap on a single flight
    pub const FLIGHT_TIMEOUT_SECS: f32 = 5.0;
    /// Substep length as a fraction of the bubble radius
    pub const SUBSTEP_RADIUS_FACTOR: f32 = 0.8;

    /// Extra rows below the lowest bubble considered when snapping
    pub const SNAP_ROW_MARGIN: u32 = 2;
}

/// Clamp a vector's length to `max_len`, keeping its direction
#[inline]
pub fn clamp_length(v: Vec2, max_len: f32) -> Vec2 {
    let len = v.length();
    if len > max_len && len > 0.0 {
        v * (max_len / len)
    } else {
        v
    }
}
