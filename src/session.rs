//! Game session: fixed-timestep driver plus advisor plumbing
//!
//! Owns the [`GameState`], accumulates frame time into fixed ticks, routes
//! capture requests to the advisor and applies hints as they arrive.

use glam::Vec2;

use crate::advisor::{AdvisorRequest, AdvisorWorker, FallbackReason, local_hint, rank_candidates};
use crate::consts::*;
use crate::sim::{
    GameEvent, GamePhase, GameState, ProjectileState, TickInput, apply_hint, enumerate_candidates,
    project, tick,
};

pub struct Session {
    pub state: GameState,
    /// None runs the advisor offline on the local heuristic
    advisor: Option<AdvisorWorker>,
    accumulator: f32,
    input: TickInput,
    authorized: bool,
}

impl Session {
    pub fn new(state: GameState, advisor: Option<AdvisorWorker>) -> Self {
        Self {
            state,
            advisor,
            accumulator: 0.0,
            input: TickInput::default(),
            authorized: false,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Set by the auth collaborator; input is ignored until true
    pub fn set_authorized(&mut self, authorized: bool) {
        self.authorized = authorized;
        if !authorized {
            self.input = TickInput::default();
            // Drop a half-finished pull
            if self.state.projectile.state == ProjectileState::Aiming {
                let anchor = self.state.anchor();
                self.state.projectile.reset(anchor);
            }
        }
    }

    pub fn is_offline(&self) -> bool {
        self.advisor.is_none()
    }

    /// Advance by a variable frame delta, running at most `MAX_SUBSTEPS` ticks
    pub fn frame(&mut self, input: &TickInput, dt: f32) -> Vec<GameEvent> {
        if self.authorized {
            self.input.pointer = input.pointer;
            self.input.pulling = input.pulling;
            self.input.release |= input.release;
        }

        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.input.clone();
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // One-shot
            self.input.release = false;
        }

        self.poll_advisor();
        self.state.drain_events()
    }

    /// Whether the renderer should capture a screenshot for the advisor
    pub fn capture_requested(&self) -> bool {
        self.state.capture_requested
    }

    /// Hand the advisor a board snapshot. Returns false if nothing was requested.
    pub fn submit_capture(&mut self, screenshot: Option<Vec<u8>>) -> bool {
        if !self.state.take_capture_request() {
            return false;
        }

        let request = AdvisorRequest::snapshot(&self.state, screenshot);
        self.state.advisor_pending = true;

        match self.advisor.as_mut() {
            Some(worker) => {
                if !worker.submit(request) {
                    self.state.advisor_pending = false;
                    return false;
                }
                true
            }
            None => {
                let hint = local_hint(&request.candidates, FallbackReason::NotConfigured);
                apply_hint(&mut self.state, hint);
                true
            }
        }
    }

    /// Apply a finished advisor reply, if any
    pub fn poll_advisor(&mut self) -> bool {
        let Some(hint) = self.advisor.as_mut().and_then(AdvisorWorker::poll) else {
            return false;
        };
        if let Some(reason) = hint.fallback_reason {
            log::warn!("Using local hint ({})", reason.as_str());
        }
        apply_hint(&mut self.state, hint);
        true
    }

    /// Block until an in-flight advisor request resolves
    pub fn wait_for_advisor(&mut self, timeout: std::time::Duration) -> bool {
        let Some(hint) = self.advisor.as_mut().and_then(|w| w.wait(timeout)) else {
            return false;
        };
        apply_hint(&mut self.state, hint);
        true
    }

    pub fn is_over(&self) -> bool {
        self.state.phase == GamePhase::GameOver
    }
}

/// Normalized pointer position whose full pull launches toward `target`
pub fn pull_toward(state: &GameState, target: Vec2) -> Vec2 {
    let anchor = state.anchor();
    let mut dir = (target - anchor).normalize_or_zero();
    // Never fire sideways or down
    if dir.y > -0.1 {
        dir = Vec2::new(dir.x.signum() * 0.995, -0.1).normalize();
    }
    let pointer = anchor - dir * MAX_DRAG_DISTANCE;
    Vec2::new(pointer.x / state.layout.width, pointer.y / state.layout.height)
}

/// Where an automated player aims: the hint target, else the best local candidate
pub fn autopilot_target(state: &GameState) -> Vec2 {
    if let Some(target) = state.aim_target {
        return target;
    }
    let candidates = enumerate_candidates(state);
    match rank_candidates(&candidates) {
        Some(best) => project(best.row, best.col, state.layout.width),
        None => state.anchor() - Vec2::Y * state.layout.height,
    }
}

/// Synthesize the pull-and-release gesture for one tick
pub fn autopilot_input(state: &GameState) -> TickInput {
    match state.projectile.state {
        ProjectileState::Anchored if !state.advisor_pending => TickInput {
            pointer: Some(pull_toward(state, autopilot_target(state))),
            pulling: true,
            release: false,
        },
        ProjectileState::Aiming => TickInput {
            pointer: Some(pull_toward(state, autopilot_target(state))),
            pulling: false,
            release: true,
        },
        _ => TickInput::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::{
        AdvisorClient, AdvisorPrompt, AttemptOutcome, HintSource, RetryPolicy, Transport,
    };
    use crate::settings::{DifficultyConfig, Layout};
    use crate::sim::BubbleColor;
    use std::time::Duration;

    struct FixedReply(&'static str);

    impl Transport for FixedReply {
        fn send(&self, _prompt: &AdvisorPrompt) -> AttemptOutcome {
            AttemptOutcome::Success(self.0.to_string())
        }
    }

    fn state() -> GameState {
        let config = DifficultyConfig {
            advisor_interval: 1,
            ceiling_interval: 0,
            bomb_chance: 0.0,
            rainbow_chance: 0.0,
            ..DifficultyConfig::default()
        };
        let mut state = GameState::empty(5, config, Layout::default());
        for col in 0..4 {
            state.add_bubble(0, col, BubbleColor::Blue, None);
        }
        state.add_bubble(0, 6, BubbleColor::Green, None);
        state.projectile.color = BubbleColor::Blue;
        state
    }

    fn play_one_shot(session: &mut Session) {
        let shots = session.state.shots_fired;
        for _ in 0..600 {
            let input = autopilot_input(&session.state);
            session.frame(&input, SIM_DT);
            if session.state.shots_fired > shots {
                return;
            }
        }
        panic!("shot never finished");
    }

    #[test]
    fn test_unauthorized_input_is_ignored() {
        let mut session = Session::new(state(), None);
        assert!(!session.is_authorized());
        let input = autopilot_input(&session.state);
        session.frame(&input, SIM_DT);
        assert_eq!(session.state.projectile.state, ProjectileState::Anchored);

        session.set_authorized(true);
        assert!(session.is_authorized());
        session.frame(&input, SIM_DT);
        assert_eq!(session.state.projectile.state, ProjectileState::Aiming);
    }

    #[test]
    fn test_revoking_authorization_mid_aim_does_not_fire() {
        let mut session = Session::new(state(), None);
        session.set_authorized(true);
        let pull = autopilot_input(&session.state);
        session.frame(&pull, SIM_DT);
        assert_eq!(session.state.projectile.state, ProjectileState::Aiming);

        session.set_authorized(false);
        let events = session.frame(&TickInput::default(), SIM_DT);
        assert_eq!(session.state.projectile.state, ProjectileState::Anchored);
        assert_eq!(session.state.projectile.pos, session.state.anchor());
        assert!(!events.contains(&GameEvent::Launched));
    }

    #[test]
    fn test_substeps_are_capped() {
        let mut session = Session::new(state(), None);
        session.frame(&TickInput::default(), 1.0);
        let expected = SIM_DT * MAX_SUBSTEPS as f32;
        assert!((session.state.time_secs - expected).abs() < 1e-4);
    }

    #[test]
    fn test_offline_capture_applies_local_hint() {
        let mut session = Session::new(state(), None);
        assert!(session.is_offline());
        session.set_authorized(true);
        play_one_shot(&mut session);

        assert!(session.capture_requested());
        assert!(session.submit_capture(None));
        assert!(!session.capture_requested());
        assert!(!session.state.advisor_pending);

        let hint = session.state.hint.as_ref().unwrap();
        assert_eq!(hint.source, HintSource::Fallback);
        assert_eq!(hint.fallback_reason, Some(FallbackReason::NotConfigured));
        assert!(session.state.aim_target.is_some());
    }

    #[test]
    fn test_submit_without_request_is_noop() {
        let mut session = Session::new(state(), None);
        assert!(!session.submit_capture(None));
        assert!(session.state.hint.is_none());
    }

    #[test]
    fn test_remote_hint_blocks_shots_until_applied() {
        let reply = r#"{"message":"Go green","targetRow":0,"targetCol":6,"recommendedColor":"green"}"#;
        let client = AdvisorClient::new(
            Box::new(FixedReply(reply)),
            RetryPolicy {
                max_attempts: 1,
                initial_backoff: Duration::ZERO,
            },
        );
        let mut session = Session::new(state(), Some(AdvisorWorker::new(client)));
        assert!(!session.is_offline());
        session.set_authorized(true);
        play_one_shot(&mut session);

        assert!(session.submit_capture(None));
        assert!(session.state.advisor_pending);

        // Pull is refused while the hint is pending
        let pull = TickInput {
            pointer: Some(Vec2::new(0.5, 0.95)),
            pulling: true,
            release: false,
        };
        session.frame(&pull, SIM_DT);
        assert_eq!(session.state.projectile.state, ProjectileState::Anchored);

        // The frame above may already have collected the reply
        session.wait_for_advisor(Duration::from_secs(5));
        assert!(!session.state.advisor_pending);
        let hint = session.state.hint.as_ref().unwrap();
        assert_eq!(hint.source, HintSource::Advisor);
        assert_eq!(
            session.state.aim_target,
            Some(project(0, 6, session.state.layout.width))
        );
    }

    #[test]
    fn test_pull_points_away_from_target() {
        let state = state();
        let anchor = state.anchor();
        let target = Vec2::new(anchor.x, 0.0);
        let pointer = state.layout.denormalize(pull_toward(&state, target));
        assert!(pointer.y > anchor.y);
        assert!((pointer.x - anchor.x).abs() < 1e-3);
        assert!((pointer.distance(anchor) - MAX_DRAG_DISTANCE).abs() < 1e-2);
    }

    #[test]
    fn test_pull_never_aims_downward() {
        let state = state();
        let anchor = state.anchor();
        let below = anchor + Vec2::new(50.0, 40.0);
        let pointer = state.layout.denormalize(pull_toward(&state, below));
        assert!(pointer.y > anchor.y);
    }
}
