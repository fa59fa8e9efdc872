//! Game settings and difficulty configuration
//!
//! Persisted as a JSON file next to the binary; every field has a default so a
//! partial file still loads.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::ANCHOR_BOTTOM_OFFSET;

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" | "med" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Tuning values for this preset
    pub fn config(&self) -> DifficultyConfig {
        match self {
            Difficulty::Easy => DifficultyConfig {
                initial_rows: 4,
                danger_row: 14,
                ceiling_interval: 8,
                advisor_interval: 1,
                bomb_chance: 0.04,
                rainbow_chance: 0.04,
            },
            Difficulty::Normal => DifficultyConfig {
                initial_rows: 5,
                danger_row: 13,
                ceiling_interval: 6,
                advisor_interval: 2,
                bomb_chance: 0.03,
                rainbow_chance: 0.03,
            },
            Difficulty::Hard => DifficultyConfig {
                initial_rows: 7,
                danger_row: 12,
                ceiling_interval: 4,
                advisor_interval: 3,
                bomb_chance: 0.02,
                rainbow_chance: 0.02,
            },
        }
    }
}

/// Externally supplied difficulty tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Rows filled when a board is generated
    pub initial_rows: u32,
    /// A settled bubble at or beyond this row ends the run
    pub danger_row: u32,
    /// Shots between ceiling drops (0 disables escalation)
    pub ceiling_interval: u32,
    /// Request a hint every Nth shot (0 disables the advisor)
    pub advisor_interval: u32,
    /// Chance that a generated bubble is a bomb
    pub bomb_chance: f32,
    /// Chance that a generated bubble is a rainbow
    pub rainbow_chance: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Difficulty::default().config()
    }
}

/// Container size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 800.0,
        }
    }
}

impl Layout {
    /// Fixed launch point the projectile is aimed from
    pub fn anchor(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height - ANCHOR_BOTTOM_OFFSET)
    }

    /// Convert a normalized (0..1) pointer position to container pixels
    pub fn denormalize(&self, pointer: Vec2) -> Vec2 {
        Vec2::new(pointer.x * self.width, pointer.y * self.height)
    }
}

/// Advisor endpoint and transport policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorSettings {
    /// Base URL of the generative model API
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "HEX_POPPER_API_KEY".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 1000,
        }
    }
}

impl AdvisorSettings {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

/// Game settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Difficulty preset
    pub difficulty: Difficulty,
    /// Explicit tuning, replaces the preset when present
    pub difficulty_override: Option<DifficultyConfig>,
    pub layout: Layout,
    pub advisor: AdvisorSettings,
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Effective difficulty tuning
    pub fn difficulty_config(&self) -> DifficultyConfig {
        self.difficulty_override
            .unwrap_or_else(|| self.difficulty.config())
    }

    /// Load settings from a JSON file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        log::info!(
            "Loaded settings from {} (difficulty {})",
            path.display(),
            settings.difficulty.as_str()
        );
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
