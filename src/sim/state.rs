//! Game state and core simulation types
//!
//! The whole board lives in one owning record, mutated only by the tick.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, project, within_neighbor_distance};
use crate::advisor::StrategicHint;
use crate::settings::{DifficultyConfig, Layout};

/// The fixed six-color palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl BubbleColor {
    pub const ALL: [BubbleColor; 6] = [
        BubbleColor::Red,
        BubbleColor::Orange,
        BubbleColor::Yellow,
        BubbleColor::Green,
        BubbleColor::Blue,
        BubbleColor::Purple,
    ];

    /// Base points awarded per popped bubble of this color
    pub fn points(&self) -> u64 {
        match self {
            BubbleColor::Red => 100,
            BubbleColor::Orange => 500,
            BubbleColor::Yellow => 250,
            BubbleColor::Green => 200,
            BubbleColor::Blue => 150,
            BubbleColor::Purple => 300,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BubbleColor::Red => "red",
            BubbleColor::Orange => "orange",
            BubbleColor::Yellow => "yellow",
            BubbleColor::Green => "green",
            BubbleColor::Blue => "blue",
            BubbleColor::Purple => "purple",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Special bubble behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUp {
    /// Area effect on hit, never color-matched
    Bomb,
    /// Wildcard that joins any color's group
    Rainbow,
}

impl PowerUp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUp::Bomb => "bomb",
            PowerUp::Rainbow => "rainbow",
        }
    }
}

/// A grid-resident bubble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: u32,
    pub row: u32,
    pub col: u32,
    /// Derived from row/col, refreshed by [`Bubble::reproject`]
    pub pos: Vec2,
    /// Ignored for matching when a power-up is present
    pub color: BubbleColor,
    /// False once popped; removed by the cleanup pass
    pub active: bool,
    pub power_up: Option<PowerUp>,
}

impl Bubble {
    pub fn cell(&self) -> Cell {
        Cell::new(self.row, self.col)
    }

    pub fn is_bomb(&self) -> bool {
        self.power_up == Some(PowerUp::Bomb)
    }

    pub fn is_rainbow(&self) -> bool {
        self.power_up == Some(PowerUp::Rainbow)
    }

    /// Recompute the pixel position from the grid address
    pub fn reproject(&mut self, container_width: f32) {
        self.pos = project(self.row, self.col, container_width);
    }

    /// Whether this bubble joins a group seeded with `color`
    pub fn matches_color(&self, color: BubbleColor) -> bool {
        match self.power_up {
            Some(PowerUp::Rainbow) => true,
            Some(PowerUp::Bomb) => false,
            None => self.color == color,
        }
    }

    /// Approximate neighbor relation; never reflexive
    pub fn is_neighbor_of(&self, other: &Bubble) -> bool {
        self.id != other.id && within_neighbor_distance(self.pos, other.pos)
    }
}

/// Projectile lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileState {
    /// Resting on the anchor, no input
    Anchored,
    /// Pulled back from the anchor
    Aiming,
    /// Released and moving
    Flying,
    /// Contact made, waiting to snap into the grid
    Settling,
}

/// The single in-flight unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: BubbleColor,
    pub state: ProjectileState,
    /// Simulation time (seconds) when the current flight began
    pub flight_started_at: f32,
}

impl Projectile {
    pub fn new(anchor: Vec2, color: BubbleColor) -> Self {
        Self {
            pos: anchor,
            vel: Vec2::ZERO,
            color,
            state: ProjectileState::Anchored,
            flight_started_at: 0.0,
        }
    }

    pub fn is_flying(&self) -> bool {
        self.state == ProjectileState::Flying
    }

    /// Return to the anchor at rest
    pub fn reset(&mut self, anchor: Vec2) {
        self.pos = anchor;
        self.vel = Vec2::ZERO;
        self.state = ProjectileState::Anchored;
    }
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Terminal: the board reached the danger row or saturated
    GameOver,
}

/// Signals for audio/UI collaborators, drained each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Launched,
    Popped { count: usize, points: u64, chain: bool },
    /// Settled without forming a group
    Miss,
    BombDetonated { destroyed: usize, points: u64 },
    CeilingDropped,
    /// Last bubble popped; a fresh board was generated
    BoardCleared,
    FlightTimedOut,
    GameOver,
}

/// Danger summary handed to the advisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerIndicator {
    /// Lowest occupied row (None on an empty board)
    pub max_row: Option<u32>,
    pub danger_row: u32,
    /// Board is within two rows of the danger row
    pub critical: bool,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub config: DifficultyConfig,
    pub layout: Layout,
    pub phase: GamePhase,
    pub score: u64,
    pub shots_fired: u32,
    /// Shots since the last ceiling drop
    pub shots_since_drop: u32,
    /// Simulation clock in seconds
    pub time_secs: f32,
    /// Grid bubbles (popped ones stay inactive until cleanup)
    pub bubbles: Vec<Bubble>,
    pub projectile: Projectile,
    /// Events since the last drain
    pub events: Vec<GameEvent>,
    /// Set when the next advisor call needs a screenshot
    pub capture_requested: bool,
    /// An advisor request is outstanding; shooting is disabled
    pub advisor_pending: bool,
    /// Most recent strategic hint
    pub hint: Option<StrategicHint>,
    /// Pixel center the hint points at
    pub aim_target: Option<Vec2>,
    next_id: u32,
}

impl GameState {
    /// Create a new game with a freshly generated board
    pub fn new(seed: u64, config: DifficultyConfig, layout: Layout) -> Self {
        let mut state = Self::empty(seed, config, layout);
        super::tick::generate_board(&mut state);
        state.projectile.color = super::tick::pick_projectile_color(&mut state);
        state
    }

    /// Create a game with no bubbles (tests and custom boards)
    pub fn empty(seed: u64, config: DifficultyConfig, layout: Layout) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            config,
            layout,
            phase: GamePhase::Playing,
            score: 0,
            shots_fired: 0,
            shots_since_drop: 0,
            time_secs: 0.0,
            bubbles: Vec::new(),
            projectile: Projectile::new(layout.anchor(), BubbleColor::Red),
            events: Vec::new(),
            capture_requested: false,
            advisor_pending: false,
            hint: None,
            aim_target: None,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn anchor(&self) -> Vec2 {
        self.layout.anchor()
    }

    /// Place a bubble at a grid cell and return its ID
    pub fn add_bubble(
        &mut self,
        row: u32,
        col: u32,
        color: BubbleColor,
        power_up: Option<PowerUp>,
    ) -> u32 {
        let id = self.next_entity_id();
        self.bubbles.push(Bubble {
            id,
            row,
            col,
            pos: project(row, col, self.layout.width),
            color,
            active: true,
            power_up,
        });
        id
    }

    pub fn active_bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.bubbles.iter().filter(|b| b.active)
    }

    /// Active bubble occupying a cell, if any
    pub fn bubble_at(&self, row: u32, col: u32) -> Option<&Bubble> {
        self.active_bubbles().find(|b| b.row == row && b.col == col)
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.bubble_at(cell.row, cell.col).is_some()
    }

    /// Lowest occupied row
    pub fn max_row(&self) -> Option<u32> {
        self.active_bubbles().map(|b| b.row).max()
    }

    /// Plain colors present on the board, in palette order
    pub fn colors_on_board(&self) -> Vec<BubbleColor> {
        BubbleColor::ALL
            .into_iter()
            .filter(|c| {
                self.active_bubbles()
                    .any(|b| b.power_up.is_none() && b.color == *c)
            })
            .collect()
    }

    pub fn danger_indicator(&self) -> DangerIndicator {
        let max_row = self.max_row();
        DangerIndicator {
            max_row,
            danger_row: self.config.danger_row,
            critical: max_row.is_some_and(|r| r + 2 >= self.config.danger_row),
        }
    }

    /// Drop popped bubbles
    pub fn cleanup(&mut self) {
        self.bubbles.retain(|b| b.active);
    }

    /// Consume the screenshot request, returning whether one was pending
    pub fn take_capture_request(&mut self) -> bool {
        std::mem::take(&mut self.capture_requested)
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Enter the terminal state (idempotent)
    pub fn end_game(&mut self) {
        if self.phase != GamePhase::GameOver {
            log::info!("Game over: score {} after {} shots", self.score, self.shots_fired);
            self.phase = GamePhase::GameOver;
            self.events.push(GameEvent::GameOver);
        }
    }

    /// Keep bubbles in ID order for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.bubbles.sort_by_key(|b| b.id);
    }
}
