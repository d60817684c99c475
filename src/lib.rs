//! Word Breakout - a breaking-block game whose bricks are words
//!
//! Core modules:
//! - `layout`: Text-to-brick layout (word packing and row justification)
//! - `sim`: Frame-rate independent simulation (paddle, balls, collisions)
//! - `session`: Run lifecycle, lives, score and reveal animation
//! - `provider`: Layout provider seam and canned paragraphs
//! - `highscores`: Score sink/source seam and an in-memory leaderboard
//! - `settings`: Data-driven game balance

pub mod error;
pub mod highscores;
pub mod layout;
pub mod provider;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{BackendError, ConfigError, SessionError};
pub use highscores::{Leaderboard, ScoreEntry, ScoreSink, ScoreSource};
pub use layout::{Brick, generate};
pub use provider::{CannedParagraphs, LayoutProvider};
pub use session::{GamePhase, InputIntent, LayoutTicket, Session, SessionEvent, SessionView};
pub use settings::{PlayMode, Settings};

/// Game configuration constants
///
/// Speeds and distances are legacy per-frame values, tuned against a
/// 60 steps-per-second reference and scaled by `sim::time_scale`.
pub mod consts {
    /// Reference step rate the per-frame constants were tuned for
    pub const REFERENCE_HZ: f32 = 60.0;
    /// Maximum substeps per step call to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Play field dimensions
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Layout defaults
    pub const UNIT_SIZE: f32 = 16.0;
    pub const MAX_ROW_WIDTH: f32 = 800.0;
    pub const ROW_GAP: f32 = 2.0;
    /// Word length clamp (in units) for brick widths
    pub const MIN_BRICK_UNITS: usize = 2;
    pub const MAX_BRICK_UNITS: usize = 12;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const MULTI_BALL_PADDLE_WIDTH: f32 = 160.0;
    pub const PADDLE_HEIGHT: f32 = 12.0;
    pub const PADDLE_Y: f32 = FIELD_HEIGHT - 40.0;
    pub const PADDLE_SPEED: f32 = 6.0;
    /// Horizontal speed given to a ball hitting the paddle edge
    pub const PADDLE_DEFLECTION: f32 = 4.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    pub const BALL_BASE_SPEED: f32 = 4.0;
    /// Primary ball speed once every brick is gone
    pub const BALL_MAX_SPEED: f32 = 7.0;
    pub const EXTRA_BALL_SPEED: f32 = 4.0;
    /// Horizontal speed floor (keeps balls off purely vertical paths)
    pub const MIN_HORIZONTAL_SPEED: f32 = 1.0;
    /// Gap between a respawned ball and the paddle top
    pub const SPAWN_CLEARANCE: f32 = 2.0;
    /// Largest launch deviation from vertical for randomized launches (radians)
    pub const MAX_LAUNCH_ANGLE: f32 = std::f32::consts::FRAC_PI_3;

    /// Session defaults
    pub const STARTING_LIVES: u8 = 3;
    pub const EXTRA_BALLS: u8 = 2;
    pub const REVEAL_INTERVAL_MS: u32 = 30;
}

/// Linear interpolation between `a` and `b` with `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Integer percentage of `part` in `total`, rounded half away from zero
#[inline]
pub fn percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (100.0 * part as f64 / total as f64).round().min(100.0) as u8
}
