//! Strategic hint advisor
//!
//! Sends the board's target candidates (plus an optional screenshot) to a
//! generative model and returns a [`StrategicHint`]. Every failure resolves to
//! the deterministic local heuristic, so callers always receive a usable hint.

pub mod client;
pub mod fallback;
pub mod prompt;
pub mod transport;
pub mod worker;

pub use client::{AdvisorClient, RetryPolicy, parse_hint};
pub use fallback::{local_hint, rank_candidates};
pub use prompt::{AdvisorPrompt, build_prompt};
pub use transport::{AttemptOutcome, HttpTransport, Transport};
pub use worker::AdvisorWorker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{BubbleColor, DangerIndicator, GameState, TargetCandidate, enumerate_candidates};

/// Where a hint came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HintSource {
    #[default]
    Advisor,
    Fallback,
}

/// Why the local heuristic answered instead of the advisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    QuotaExhausted,
    ServiceOverloaded,
    /// Transient failures outlasted the retry budget
    TransportFailed,
    ParseError,
    InvalidCoordinates,
    /// No API key or advisor disabled
    NotConfigured,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::QuotaExhausted => "quota exhausted",
            FallbackReason::ServiceOverloaded => "service overloaded",
            FallbackReason::TransportFailed => "transport failed",
            FallbackReason::ParseError => "parse error",
            FallbackReason::InvalidCoordinates => "invalid coordinates",
            FallbackReason::NotConfigured => "advisor not configured",
        }
    }
}

/// Advisory output shown to the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicHint {
    pub message: String,
    pub rationale: Option<String>,
    pub target_row: Option<u32>,
    pub target_col: Option<u32>,
    pub recommended_color: Option<BubbleColor>,
    #[serde(skip)]
    pub source: HintSource,
    /// Diagnostics only, never shown to the player
    #[serde(skip)]
    pub fallback_reason: Option<FallbackReason>,
}

impl StrategicHint {
    /// Target cell when both coordinates are present
    pub fn target_cell(&self) -> Option<(u32, u32)> {
        Some((self.target_row?, self.target_col?))
    }

    pub fn is_fallback(&self) -> bool {
        self.source == HintSource::Fallback
    }
}

/// Advisor failures, each mapped to a fallback reason
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdvisorError {
    #[error("quota exhausted: {0}")]
    Quota(String),
    #[error("service overloaded: {0}")]
    Overload(String),
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
    #[error("unparseable advisor response: {0}")]
    Parse(String),
    #[error("invalid hint coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("advisor not configured: {0}")]
    NotConfigured(String),
}

impl AdvisorError {
    pub fn reason(&self) -> FallbackReason {
        match self {
            AdvisorError::Quota(_) => FallbackReason::QuotaExhausted,
            AdvisorError::Overload(_) => FallbackReason::ServiceOverloaded,
            AdvisorError::RetriesExhausted { .. } => FallbackReason::TransportFailed,
            AdvisorError::Parse(_) => FallbackReason::ParseError,
            AdvisorError::InvalidCoordinates(_) => FallbackReason::InvalidCoordinates,
            AdvisorError::NotConfigured(_) => FallbackReason::NotConfigured,
        }
    }
}

/// Immutable snapshot of everything one advisor call needs
#[derive(Debug, Clone)]
pub struct AdvisorRequest {
    /// Encoded image of the current render, if the renderer supplied one
    pub screenshot: Option<Vec<u8>>,
    pub candidates: Vec<TargetCandidate>,
    pub danger: DangerIndicator,
}

impl AdvisorRequest {
    /// Capture the board as it stands now
    pub fn snapshot(state: &GameState, screenshot: Option<Vec<u8>>) -> Self {
        Self {
            screenshot,
            candidates: enumerate_candidates(state),
            danger: state.danger_indicator(),
        }
    }
}
