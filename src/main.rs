//! Hex Popper headless driver
//!
//! Plays a seeded game at the fixed timestep, aiming wherever the advisor
//! (or the local heuristic) points, and logs a summary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use hex_popper::advisor::{AdvisorClient, AdvisorWorker, HttpTransport, RetryPolicy};
use hex_popper::consts::SIM_DT;
use hex_popper::session::autopilot_input;
use hex_popper::settings::SettingsError;
use hex_popper::sim::{GameEvent, GameState};
use hex_popper::{Difficulty, Session, Settings};

/// Frames allowed per shot before the run is abandoned
const FRAMES_PER_SHOT_LIMIT: u64 = 1_200;

#[derive(Parser, Debug)]
#[command(name = "hex-popper")]
#[command(about = "Headless hex-grid bubble shooter driven by the targeting advisor")]
struct Cli {
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Overrides the difficulty from the settings file
    #[arg(long, value_enum)]
    difficulty: Option<CliDifficulty>,
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, default_value_t = 100)]
    max_shots: u32,
    /// Skip the remote advisor and use the local heuristic
    #[arg(long)]
    offline: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliDifficulty {
    Easy,
    Normal,
    Hard,
}

impl From<CliDifficulty> for Difficulty {
    fn from(value: CliDifficulty) -> Self {
        match value {
            CliDifficulty::Easy => Difficulty::Easy,
            CliDifficulty::Normal => Difficulty::Normal,
            CliDifficulty::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Debug, Default)]
struct Summary {
    popped: u64,
    chains: u32,
    misses: u32,
    bombs: u32,
    ceiling_drops: u32,
    clears: u32,
    timeouts: u32,
}

impl Summary {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Popped { count, chain, .. } => {
                self.popped += *count as u64;
                if *chain {
                    self.chains += 1;
                }
            }
            GameEvent::Miss => self.misses += 1,
            GameEvent::BombDetonated { destroyed, .. } => {
                self.bombs += 1;
                self.popped += *destroyed as u64;
            }
            GameEvent::CeilingDropped => self.ceiling_drops += 1,
            GameEvent::BoardCleared => self.clears += 1,
            GameEvent::FlightTimedOut => self.timeouts += 1,
            GameEvent::Launched | GameEvent::GameOver => {}
        }
    }
}

fn build_advisor(settings: &Settings, offline: bool) -> Option<AdvisorWorker> {
    if offline {
        log::info!("Advisor offline by request");
        return None;
    }
    match HttpTransport::new(&settings.advisor) {
        Ok(transport) => {
            let retry = RetryPolicy::from_settings(&settings.advisor);
            log::info!(
                "Advisor online: {} ({} attempts)",
                settings.advisor.model,
                retry.max_attempts
            );
            Some(AdvisorWorker::new(AdvisorClient::new(
                Box::new(transport),
                retry,
            )))
        }
        Err(err) => {
            log::warn!("{err}; running offline");
            None
        }
    }
}

fn run(cli: Cli) -> Result<(), SettingsError> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(difficulty) = cli.difficulty {
        settings.difficulty = difficulty.into();
    }

    let state = GameState::new(cli.seed, settings.difficulty_config(), settings.layout);
    let advisor = build_advisor(&settings, cli.offline);
    let mut session = Session::new(state, advisor);
    session.set_authorized(true);

    log::info!(
        "Starting seed {} on {} for up to {} shots ({})",
        cli.seed,
        settings.difficulty.as_str(),
        cli.max_shots,
        if session.is_offline() { "offline" } else { "advisor online" }
    );

    let mut summary = Summary::default();
    let frame_limit = u64::from(cli.max_shots.max(1)) * FRAMES_PER_SHOT_LIMIT;
    let mut frames = 0u64;

    while !session.is_over() && session.state.shots_fired < cli.max_shots {
        let input = autopilot_input(&session.state);
        for event in session.frame(&input, SIM_DT) {
            summary.record(&event);
        }

        if session.capture_requested() {
            session.submit_capture(None);
        }
        if session.state.advisor_pending {
            session.wait_for_advisor(Duration::from_millis(100));
        }

        frames += 1;
        if frames >= frame_limit {
            log::warn!("Frame limit reached after {frames} frames");
            break;
        }
    }

    let state = &session.state;
    log::info!(
        "Finished: phase {:?}, score {}, shots {}, popped {}, chains {}, misses {}",
        state.phase,
        state.score,
        state.shots_fired,
        summary.popped,
        summary.chains,
        summary.misses
    );
    log::info!(
        "Bombs {}, ceiling drops {}, boards cleared {}, timeouts {}, {} bubbles left",
        summary.bombs,
        summary.ceiling_drops,
        summary.clears,
        summary.timeouts,
        state.active_bubbles().count()
    );
    if let Some(hint) = &state.hint {
        log::info!("Last hint: {}", hint.message);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
