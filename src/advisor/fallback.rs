//! Deterministic local targeting heuristic
//!
//! Priority: bomb, then rainbow groups, then immediate score, then the row
//! closest to the top.

use std::cmp::Ordering;

use super::{FallbackReason, HintSource, StrategicHint};
use crate::sim::TargetCandidate;

/// Ordering where the preferred candidate compares as `Less`
fn priority(a: &TargetCandidate, b: &TargetCandidate) -> Ordering {
    b.is_bomb()
        .cmp(&a.is_bomb())
        .then(b.is_rainbow().cmp(&a.is_rainbow()))
        .then(b.score().cmp(&a.score()))
        .then(a.row.cmp(&b.row))
}

/// Best candidate under the local policy; first wins exact ties
pub fn rank_candidates(candidates: &[TargetCandidate]) -> Option<&TargetCandidate> {
    candidates.iter().min_by(|a, b| priority(a, b))
}

/// Build a hint from the candidate list alone
pub fn local_hint(candidates: &[TargetCandidate], reason: FallbackReason) -> StrategicHint {
    let Some(best) = rank_candidates(candidates) else {
        return StrategicHint {
            message: "No clear shots. Play defensively and keep the board low.".to_string(),
            rationale: Some("Nothing on the board is reachable right now.".to_string()),
            target_row: None,
            target_col: None,
            recommended_color: None,
            source: HintSource::Fallback,
            fallback_reason: Some(reason),
        };
    };

    let color = best.color.as_str();
    let (message, rationale) = if best.is_bomb() {
        (
            format!("Hit the bomb at row {}, col {}!", best.row, best.col),
            "A bomb clears everything around it, regardless of color.".to_string(),
        )
    } else if best.is_rainbow() {
        (
            format!("Shoot {} at row {}, col {}.", color, best.row, best.col),
            format!(
                "That {} group of {} includes a rainbow wildcard.",
                color, best.size
            ),
        )
    } else {
        (
            format!("Shoot {} at row {}, col {}.", color, best.row, best.col),
            format!(
                "Group of {} worth {} points per bubble.",
                best.size, best.points_per_bubble
            ),
        )
    };

    StrategicHint {
        message,
        rationale: Some(rationale),
        target_row: Some(best.row),
        target_col: Some(best.col),
        recommended_color: Some(best.color),
        source: HintSource::Fallback,
        fallback_reason: Some(reason),
    }
}
