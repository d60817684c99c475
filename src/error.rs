//! Error types
//!
//! Nothing here is fatal: every failure leaves the session idle or unchanged.

use thiserror::Error;

/// Failure reported by an external collaborator (layout provider, score sink)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Upstream answered with a non-success status
    #[error("backend error: status {0}")]
    Status(u16),
    /// The call did not complete
    #[error("backend unreachable: {0}")]
    Transport(String),
    /// The response could not be understood
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

/// Errors surfaced by [`crate::Session`] operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("username must be 3-10 characters, got {len}")]
    InvalidUsername { len: usize },
    #[error("a layout request is already in flight")]
    LayoutInFlight,
    #[error("stale layout response for run {ticket} (current run is {current})")]
    StaleLayout { ticket: u64, current: u64 },
    #[error("layout generation failed: {0}")]
    LayoutFailed(#[from] BackendError),
    #[error("layout produced no bricks")]
    EmptyLayout,
    #[error("run is not over yet")]
    RunNotOver,
    #[error("score already submitted for this run")]
    AlreadySubmitted,
}

impl SessionError {
    /// True for input rejected before any request was made
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::EmptyPrompt | Self::InvalidUsername { .. })
    }

    /// True when the layout step failed and the session fell back to idle
    pub fn is_layout_failure(&self) -> bool {
        matches!(self, Self::LayoutFailed(_) | Self::EmptyLayout)
    }
}

/// Errors loading or validating [`crate::Settings`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}
