//! Game settings and balance
//!
//! Defaults mirror `crate::consts`; hosts may override any field from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Ball-count and floor policy for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlayMode {
    /// One ball, lives are lost on the floor
    #[default]
    Classic,
    /// Primary ball plus extra balls, the floor only respawns
    MultiBall,
}

impl PlayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayMode::Classic => "Classic",
            PlayMode::MultiBall => "MultiBall",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "standard" => Some(PlayMode::Classic),
            "multiball" | "multi-ball" | "multi" | "slop" => Some(PlayMode::MultiBall),
            _ => None,
        }
    }

    /// Whether balls crossing the floor cost lives
    pub fn loses_lives(&self) -> bool {
        matches!(self, PlayMode::Classic)
    }
}

/// Tunable game parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Field ===
    pub field_width: f32,
    pub field_height: f32,

    // === Layout ===
    /// Width of one letter and height of every brick
    pub unit_size: f32,
    pub max_row_width: f32,
    /// Vertical gap between brick rows
    pub row_gap: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub multi_ball_paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_y: f32,
    /// Per-frame paddle speed
    pub paddle_speed: f32,
    /// Horizontal speed at the paddle edges
    pub paddle_deflection: f32,

    // === Balls (per-frame speeds) ===
    pub ball_radius: f32,
    pub base_speed: f32,
    pub max_speed: f32,
    pub extra_ball_speed: f32,
    pub min_horizontal_speed: f32,

    // === Session ===
    pub starting_lives: u8,
    pub extra_balls: u8,
    pub reveal_interval_ms: u32,
    /// Seed for launch angles and nudges
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,

            unit_size: UNIT_SIZE,
            max_row_width: MAX_ROW_WIDTH,
            row_gap: ROW_GAP,

            paddle_width: PADDLE_WIDTH,
            multi_ball_paddle_width: MULTI_BALL_PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_y: PADDLE_Y,
            paddle_speed: PADDLE_SPEED,
            paddle_deflection: PADDLE_DEFLECTION,

            ball_radius: BALL_RADIUS,
            base_speed: BALL_BASE_SPEED,
            max_speed: BALL_MAX_SPEED,
            extra_ball_speed: EXTRA_BALL_SPEED,
            min_horizontal_speed: MIN_HORIZONTAL_SPEED,

            starting_lives: STARTING_LIVES,
            extra_balls: EXTRA_BALLS,
            reveal_interval_ms: REVEAL_INTERVAL_MS,
            seed: 0x5EED_B10C,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Paddle width used by a play mode
    pub fn paddle_width_for(&self, mode: PlayMode) -> f32 {
        match mode {
            PlayMode::Classic => self.paddle_width,
            PlayMode::MultiBall => self.multi_ball_paddle_width,
        }
    }

    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("unit_size", self.unit_size),
            ("max_row_width", self.max_row_width),
            ("paddle_width", self.paddle_width),
            ("multi_ball_paddle_width", self.multi_ball_paddle_width),
            ("paddle_height", self.paddle_height),
            ("paddle_speed", self.paddle_speed),
            ("ball_radius", self.ball_radius),
            ("base_speed", self.base_speed),
            ("max_speed", self.max_speed),
            ("extra_ball_speed", self.extra_ball_speed),
        ];
        for (name, value) in positive {
            // NaN fails this comparison too
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.row_gap < 0.0 || self.min_horizontal_speed < 0.0 || self.paddle_deflection < 0.0 {
            return Err(ConfigError::Invalid(
                "row_gap, min_horizontal_speed and paddle_deflection must not be negative".into(),
            ));
        }
        if self.max_speed < self.base_speed {
            return Err(ConfigError::Invalid(format!(
                "max_speed ({}) is below base_speed ({})",
                self.max_speed, self.base_speed
            )));
        }
        if self.min_horizontal_speed >= self.base_speed.min(self.extra_ball_speed) {
            return Err(ConfigError::Invalid(
                "min_horizontal_speed must be below every ball speed".into(),
            ));
        }
        if self.paddle_width.max(self.multi_ball_paddle_width) > self.field_width {
            return Err(ConfigError::Invalid("paddle is wider than the field".into()));
        }
        if self.max_row_width > self.field_width {
            return Err(ConfigError::Invalid("max_row_width exceeds the field width".into()));
        }
        if self.paddle_y <= 0.0 || self.paddle_y >= self.field_height {
            return Err(ConfigError::Invalid("paddle_y must lie inside the field".into()));
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::Invalid("starting_lives must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.paddle_y, 560.0);
        assert_eq!(settings.paddle_width_for(PlayMode::MultiBall), MULTI_BALL_PADDLE_WIDTH);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "max_speed": 9.0, "starting_lives": 5 }"#).unwrap();
        assert_eq!(settings.max_speed, 9.0);
        assert_eq!(settings.starting_lives, 5);
        assert_eq!(settings.base_speed, BALL_BASE_SPEED);
    }

    #[test]
    fn test_rejects_inverted_speed_range() {
        let err = Settings::from_json(r#"{ "base_speed": 8.0, "max_speed": 5.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_lives_and_bad_json() {
        assert!(matches!(
            Settings::from_json(r#"{ "starting_lives": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(Settings::from_json("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_play_mode_from_str() {
        assert_eq!(PlayMode::from_str("Classic"), Some(PlayMode::Classic));
        assert_eq!(PlayMode::from_str("slop"), Some(PlayMode::MultiBall));
        assert_eq!(PlayMode::from_str("hard"), None);
        assert!(!PlayMode::MultiBall.loses_lives());
    }
}
