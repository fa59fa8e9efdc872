//! Target candidate enumeration
//!
//! Finds every reachable group on the board, plus reachable bombs. Both the
//! remote advisor and the local fallback rank from this one list.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::matching::find_cluster;
use super::state::{Bubble, BubbleColor, GameState, PowerUp};
use crate::consts::*;

/// Reported size for bomb candidates
pub const BOMB_CANDIDATE_SIZE: usize = 1;
/// Reported points per bubble for bomb candidates
pub const BOMB_CANDIDATE_POINTS: u64 = 1000;
/// Distance between line-of-sight samples
pub const LOS_SAMPLE_INTERVAL: f32 = BUBBLE_RADIUS * 0.5;
/// Samples skipped at each end of the segment
pub const LOS_SKIPPED_SAMPLES: usize = 2;

/// One reachable, poppable position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCandidate {
    pub color: BubbleColor,
    /// Group size, or [`BOMB_CANDIDATE_SIZE`] for bombs
    pub size: usize,
    /// The hittable member's cell
    pub row: u32,
    pub col: u32,
    pub points_per_bubble: u64,
    /// Bomb for bomb targets, rainbow when the group contains a wildcard
    pub power_up: Option<PowerUp>,
}

impl TargetCandidate {
    /// Immediate value used for ranking
    pub fn score(&self) -> u64 {
        self.size as u64 * self.points_per_bubble
    }

    pub fn is_bomb(&self) -> bool {
        self.power_up == Some(PowerUp::Bomb)
    }

    pub fn is_rainbow(&self) -> bool {
        self.power_up == Some(PowerUp::Rainbow)
    }
}

/// Sampled-segment reachability test from `anchor` to `target`.
///
/// Samples every [`LOS_SAMPLE_INTERVAL`] pixels and reports a block when any
/// sample falls within the collision radius of another active bubble. The
/// first and last [`LOS_SKIPPED_SAMPLES`] samples are not tested.
pub fn is_path_clear(bubbles: &[Bubble], anchor: Vec2, target: &Bubble) -> bool {
    let collision_radius = COLLISION_RADIUS_FACTOR * BUBBLE_RADIUS;
    let delta = target.pos - anchor;
    let steps = ((delta.length() / LOS_SAMPLE_INTERVAL).ceil() as usize).max(1);
    let last_tested = steps + 1 - LOS_SKIPPED_SAMPLES;

    for i in LOS_SKIPPED_SAMPLES..last_tested.max(LOS_SKIPPED_SAMPLES) {
        let sample = anchor + delta * (i as f32 / steps as f32);
        let blocked = bubbles
            .iter()
            .filter(|b| b.active && b.id != target.id)
            .any(|b| b.pos.distance(sample) < collision_radius);
        if blocked {
            return false;
        }
    }
    true
}

/// Colors of plain bubbles in order of first appearance
fn colors_in_discovery_order(bubbles: &[Bubble]) -> Vec<BubbleColor> {
    let mut colors = Vec::new();
    for b in bubbles.iter().filter(|b| b.active && b.power_up.is_none()) {
        if !colors.contains(&b.color) {
            colors.push(b.color);
        }
    }
    colors
}

/// Enumerate every currently targetable group and bomb.
///
/// Each group yields at most one candidate: its lowest-on-screen member with a
/// clear line of sight. Groups without one are dropped. Order is not ranked.
pub fn enumerate_candidates(state: &GameState) -> Vec<TargetCandidate> {
    let bubbles = &state.bubbles;
    let anchor = state.anchor();
    let mut candidates = Vec::new();

    for color in colors_in_discovery_order(bubbles) {
        let mut visited = vec![false; bubbles.len()];
        for (idx, bubble) in bubbles.iter().enumerate() {
            if visited[idx] || !bubble.active || bubble.power_up.is_some() || bubble.color != color
            {
                continue;
            }

            let mut cluster = find_cluster(bubbles, idx, color);
            for &member in &cluster {
                visited[member] = true;
            }

            let has_rainbow = cluster.iter().any(|&m| bubbles[m].is_rainbow());
            cluster.sort_by(|&a, &b| {
                bubbles[b]
                    .row
                    .cmp(&bubbles[a].row)
                    .then(bubbles[a].col.cmp(&bubbles[b].col))
            });

            let reachable = cluster
                .iter()
                .map(|&m| &bubbles[m])
                .find(|member| is_path_clear(bubbles, anchor, member));

            if let Some(member) = reachable {
                candidates.push(TargetCandidate {
                    color,
                    size: cluster.len(),
                    row: member.row,
                    col: member.col,
                    points_per_bubble: color.points(),
                    power_up: has_rainbow.then_some(PowerUp::Rainbow),
                });
            }
        }
    }

    for bomb in bubbles.iter().filter(|b| b.active && b.is_bomb()) {
        if is_path_clear(bubbles, anchor, bomb) {
            candidates.push(TargetCandidate {
                color: bomb.color,
                size: BOMB_CANDIDATE_SIZE,
                row: bomb.row,
                col: bomb.col,
                points_per_bubble: BOMB_CANDIDATE_POINTS,
                power_up: Some(PowerUp::Bomb),
            });
        }
    }

    log::debug!("Enumerated {} target candidates", candidates.len());
    candidates
}
