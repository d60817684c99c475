//! Word Breakout headless runner
//!
//! Plays one run on autopilot against the canned paragraph provider, submits
//! the result to an in-memory leaderboard and prints it. Useful for balancing
//! settings and smoke tests.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use word_breakout::highscores::{DEFAULT_TOP_SCORES, ScoreSource};
use word_breakout::{
    CannedParagraphs, GamePhase, Leaderboard, PlayMode, Session, SessionEvent, Settings,
};

/// Fixed host frame time for the demo loop
const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "word-breakout")]
#[command(about = "Play one autopiloted Word Breakout run and print the leaderboard")]
struct Cli {
    /// Ball and floor rules for the run
    #[arg(long, value_enum, default_value_t = CliMode::Classic)]
    mode: CliMode,
    /// JSON settings file; missing fields keep their defaults
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Override the settings seed
    #[arg(long)]
    seed: Option<u64>,
    /// Give up after this many frames (60 per second)
    #[arg(long, default_value_t = 36_000)]
    max_frames: u32,
    /// Name submitted to the leaderboard (3-10 characters)
    #[arg(long, default_value = "autopilot")]
    username: String,
    /// Prompt handed to the layout provider
    #[arg(default_value = "a humble announcement")]
    prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Classic,
    Multiball,
}

impl From<CliMode> for PlayMode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Classic => PlayMode::Classic,
            CliMode::Multiball => PlayMode::MultiBall,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let mode = PlayMode::from(cli.mode);

    let mut settings = match &cli.settings {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("Could not load {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }

    log::info!("Word Breakout (headless) starting in {} mode", mode.as_str());

    let mut provider = CannedParagraphs::new(settings.seed);
    let mut session = match Session::with_settings(settings) {
        Ok(session) => session,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let mut board = Leaderboard::new();
    session.set_autopilot(true);

    if let Err(err) = session.start_run(&mut provider, &cli.prompt.join(" "), mode) {
        log::error!("Run could not start: {}", err);
        return ExitCode::FAILURE;
    }

    let mut frames = 0;
    while session.phase() != GamePhase::Over && frames < cli.max_frames {
        for event in session.advance(FRAME_DT) {
            match event {
                SessionEvent::BrickDestroyed { id, score } => {
                    log::debug!("Brick {} down, score {}%", id, score)
                }
                SessionEvent::RunOver { reason, score, elapsed_ms } => {
                    log::info!("Run ended ({:?}) at {}% after {} ms", reason, score, elapsed_ms)
                }
                _ => {}
            }
        }
        frames += 1;
    }

    if session.phase() != GamePhase::Over {
        log::warn!("Run timed out at {}% after {} frames", session.score(), frames);
        return ExitCode::FAILURE;
    }
    if let Err(err) = session.submit_score(&mut board, &cli.username) {
        log::warn!("Score not submitted: {}", err);
    }

    match board.fetch_top_scores(DEFAULT_TOP_SCORES) {
        Ok(top) => {
            for (rank, entry) in top.iter().enumerate() {
                println!(
                    "{:>2}. {:<10} {:>3}% {:>8.1}s",
                    rank + 1,
                    entry.username,
                    entry.score,
                    entry.elapsed_ms as f64 / 1000.0
                );
            }
        }
        Err(err) => log::warn!("Could not read leaderboard: {}", err),
    }

    ExitCode::SUCCESS
}
