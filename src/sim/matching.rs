//! Cluster detection and removal
//!
//! One queue-based traversal serves both the match check on settle and the
//! candidate enumerator.

use std::collections::VecDeque;

use glam::Vec2;

use super::state::{Bubble, BubbleColor, GameEvent, GameState};
use crate::consts::*;

/// Result of resolving a settled bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Popped { count: usize, points: u64, chain: bool },
    Miss,
}

/// Indices of the connected group containing `start`.
///
/// Traverses active neighbors that match `color` (rainbows always join, bombs
/// never do). `start` is always part of the group.
pub fn find_cluster(bubbles: &[Bubble], start: usize, color: BubbleColor) -> Vec<usize> {
    let mut visited = vec![false; bubbles.len()];
    let mut queue = VecDeque::new();
    let mut cluster = Vec::new();

    visited[start] = true;
    queue.push_back(start);

    while let Some(idx) = queue.pop_front() {
        cluster.push(idx);
        let current = &bubbles[idx];
        for (other_idx, other) in bubbles.iter().enumerate() {
            if visited[other_idx] || !other.active || !other.matches_color(color) {
                continue;
            }
            if current.is_neighbor_of(other) {
                visited[other_idx] = true;
                queue.push_back(other_idx);
            }
        }
    }

    cluster
}

/// Points for popping `count` bubbles of `color`
pub fn match_points(color: BubbleColor, count: usize) -> u64 {
    let base = color.points() * count as u64;
    if count > MIN_MATCH {
        (base as f32 * LARGE_MATCH_MULTIPLIER).floor() as u64
    } else {
        base
    }
}

/// Check the group around a freshly settled bubble and pop it if large enough.
///
/// The settled bubble's color is authoritative; rainbows in the group count
/// toward size and score at that color's rate.
pub fn resolve_match(state: &mut GameState, new_id: u32) -> MatchOutcome {
    let Some(start) = state.bubbles.iter().position(|b| b.id == new_id && b.active) else {
        return MatchOutcome::Miss;
    };
    let color = state.bubbles[start].color;
    let cluster = find_cluster(&state.bubbles, start, color);

    if cluster.len() < MIN_MATCH {
        state.events.push(GameEvent::Miss);
        return MatchOutcome::Miss;
    }

    for &idx in &cluster {
        state.bubbles[idx].active = false;
    }

    let count = cluster.len();
    let points = match_points(color, count);
    let chain = count >= CHAIN_REACTION_SIZE;
    state.score += points;
    log::debug!("Popped {} {} bubbles for {} points", count, color.as_str(), points);
    state.events.push(GameEvent::Popped { count, points, chain });

    MatchOutcome::Popped { count, points, chain }
}

/// Destroy every active bubble within the blast radius of `center`,
/// regardless of color. Returns the number destroyed.
pub fn detonate_bomb(state: &mut GameState, center: Vec2) -> usize {
    let radius = BOMB_RADIUS_FACTOR * BUBBLE_RADIUS;
    let mut destroyed = 0;
    for bubble in state.bubbles.iter_mut().filter(|b| b.active) {
        if bubble.pos.distance(center) <= radius {
            bubble.active = false;
            destroyed += 1;
        }
    }

    let points = destroyed as u64 * BOMB_BONUS_PER_BUBBLE;
    state.score += points;
    log::debug!("Bomb destroyed {} bubbles", destroyed);
    state.events.push(GameEvent::BombDetonated { destroyed, points });
    destroyed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DifficultyConfig, Layout};
    use crate::sim::state::PowerUp;

    fn empty_state() -> GameState {
        GameState::empty(1, DifficultyConfig::default(), Layout::default())
    }

    #[test]
    fn test_three_in_a_row_pops() {
        let mut state = empty_state();
        state.add_bubble(0, 0, BubbleColor::Red, None);
        state.add_bubble(0, 1, BubbleColor::Red, None);
        let new_id = state.add_bubble(0, 2, BubbleColor::Red, None);

        let outcome = resolve_match(&mut state, new_id);
        assert_eq!(
            outcome,
            MatchOutcome::Popped { count: 3, points: 300, chain: false }
        );
        assert_eq!(state.score, 300);
        assert_eq!(state.active_bubbles().count(), 0);
    }

    #[test]
    fn test_large_group_multiplier_and_chain() {
        let mut state = empty_state();
        for col in 0..4 {
            state.add_bubble(0, col, BubbleColor::Blue, None);
        }
        let new_id = state.add_bubble(0, 4, BubbleColor::Blue, None);

        let outcome = resolve_match(&mut state, new_id);
        // 5 * 150 * 1.5
        assert_eq!(
            outcome,
            MatchOutcome::Popped { count: 5, points: 1125, chain: true }
        );
        assert_eq!(state.score, 1125);
        assert!(state.events.contains(&GameEvent::Popped { count: 5, points: 1125, chain: true }));
    }

    #[test]
    fn test_four_rounds_down() {
        // 4 * 100 * 1.5 = 600 exactly; 4 * 250 * 1.5 = 1500
        assert_eq!(match_points(BubbleColor::Red, 4), 600);
        assert_eq!(match_points(BubbleColor::Yellow, 4), 1500);
        assert_eq!(match_points(BubbleColor::Red, 3), 300);
    }

    #[test]
    fn test_pair_is_a_miss() {
        let mut state = empty_state();
        state.add_bubble(0, 0, BubbleColor::Green, None);
        state.add_bubble(0, 2, BubbleColor::Green, None);
        let new_id = state.add_bubble(0, 1, BubbleColor::Red, None);

        assert_eq!(resolve_match(&mut state, new_id), MatchOutcome::Miss);
        assert_eq!(state.score, 0);
        assert_eq!(state.active_bubbles().count(), 3);
        assert_eq!(state.events, vec![GameEvent::Miss]);
    }

    #[test]
    fn test_rainbow_joins_but_seed_color_scores() {
        let mut state = empty_state();
        state.add_bubble(0, 0, BubbleColor::Green, None);
        // Rainbow's nominal color is ignored
        state.add_bubble(0, 1, BubbleColor::Orange, Some(PowerUp::Rainbow));
        let new_id = state.add_bubble(0, 2, BubbleColor::Green, None);

        let outcome = resolve_match(&mut state, new_id);
        assert_eq!(
            outcome,
            MatchOutcome::Popped { count: 3, points: 600, chain: false }
        );
        assert_eq!(state.active_bubbles().count(), 0);
    }

    #[test]
    fn test_rainbow_bridges_but_other_colors_stop() {
        let mut state = empty_state();
        state.add_bubble(0, 0, BubbleColor::Red, None);
        state.add_bubble(0, 1, BubbleColor::Red, Some(PowerUp::Rainbow));
        state.add_bubble(0, 3, BubbleColor::Blue, None);
        let start = state.bubbles.len();
        state.add_bubble(0, 2, BubbleColor::Red, None);

        let cluster = find_cluster(&state.bubbles, start, BubbleColor::Red);
        assert_eq!(cluster.len(), 3);
        assert!(!cluster.contains(&2));
    }

    #[test]
    fn test_bomb_not_color_matched() {
        let mut state = empty_state();
        state.add_bubble(0, 0, BubbleColor::Red, None);
        state.add_bubble(0, 1, BubbleColor::Red, Some(PowerUp::Bomb));
        let new_id = state.add_bubble(1, 0, BubbleColor::Red, None);

        // New bubble touches (0,0) and (0,1); bomb does not count
        assert_eq!(resolve_match(&mut state, new_id), MatchOutcome::Miss);
    }

    #[test]
    fn test_bomb_destroys_only_within_radius() {
        let mut state = empty_state();
        state.add_bubble(4, 5, BubbleColor::Red, Some(PowerUp::Bomb));
        state.add_bubble(4, 6, BubbleColor::Blue, None); // 2r away
        state.add_bubble(4, 8, BubbleColor::Green, None); // 6r away
        state.add_bubble(5, 5, BubbleColor::Yellow, None); // adjacent
        state.add_bubble(0, 0, BubbleColor::Purple, None); // far

        let center = state.bubbles[0].pos;
        let destroyed = detonate_bomb(&mut state, center);
        assert_eq!(destroyed, 3);
        assert_eq!(state.score, 3 * BOMB_BONUS_PER_BUBBLE);

        let survivors: Vec<_> = state.active_bubbles().map(|b| (b.row, b.col)).collect();
        assert_eq!(survivors, vec![(4, 8), (0, 0)]);
    }
}
