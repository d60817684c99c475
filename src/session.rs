//! Run lifecycle
//!
//! `Idle -> Loading -> Animating -> Running -> Over`, with pause as a flag
//! inside `Running`. The session owns the world for the current run and
//! folds simulation reports into lives, score and phase.

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, ConfigError, SessionError};
use crate::highscores::{ScoreEntry, ScoreSink};
use crate::layout::{Brick, generate_with_gap};
use crate::provider::LayoutProvider;
use crate::settings::{PlayMode, Settings};
use crate::sim::{Ball, EndReason, Paddle, SimEvent, StepInput, StepReport, StepSignal, World, step};

/// Usernames accepted for score submission, in characters
pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=10;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No run; waiting for a prompt
    Idle,
    /// Layout request in flight
    Loading,
    /// Bricks are being revealed one at a time
    Animating,
    /// Active gameplay (possibly paused)
    Running,
    /// Run ended
    Over,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Loading => "loading",
            GamePhase::Animating => "animating",
            GamePhase::Running => "running",
            GamePhase::Over => "over",
        }
    }
}

/// Discrete input signals from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputIntent {
    LeftPressed,
    LeftReleased,
    RightPressed,
    RightReleased,
    TogglePause,
}

/// Handle for an outstanding layout request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTicket {
    /// Run epoch the request belongs to
    pub epoch: u64,
    pub prompt: String,
    pub mode: PlayMode,
}

/// Observable changes, in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    BrickRevealed { id: u32 },
    BrickDestroyed { id: u32, score: u8 },
    LifeLost { lives: u8 },
    RunOver { reason: EndReason, score: u8, elapsed_ms: u64 },
}

/// Borrowed, read-only view of a session for renderers
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    pub phase: GamePhase,
    pub mode: Option<PlayMode>,
    pub paused: bool,
    pub lives: u8,
    pub score: u8,
    pub destroyed: usize,
    pub total: usize,
    pub elapsed_ms: u64,
    pub bricks: &'a [Brick],
    pub balls: &'a [Ball],
    pub paddle: Option<&'a Paddle>,
}

/// One player's game session across runs
#[derive(Debug, Clone)]
pub struct Session {
    settings: Settings,
    phase: GamePhase,
    /// Bumped on every accepted run request
    epoch: u64,
    pending_mode: PlayMode,
    prompt: String,
    world: Option<World>,
    lives: u8,
    score: u8,
    paused: bool,
    input: StepInput,
    /// Seconds of unpaused play
    elapsed: f64,
    reveal_clock_ms: f32,
    revealed: usize,
    score_submitted: bool,
    end_reason: Option<EndReason>,
    events: Vec<SessionEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Session {
    /// Session over settings the caller has already validated
    ///
    /// Use [`Session::with_settings`] for settings built by hand; the
    /// simulation divides by paddle width and ball speeds.
    pub fn new(settings: Settings) -> Self {
        let lives = settings.starting_lives;
        Self {
            settings,
            phase: GamePhase::Idle,
            epoch: 0,
            pending_mode: PlayMode::Classic,
            prompt: String::new(),
            world: None,
            lives,
            score: 0,
            paused: false,
            input: StepInput::default(),
            elapsed: 0.0,
            reveal_clock_ms: 0.0,
            revealed: 0,
            score_submitted: false,
            end_reason: None,
            events: Vec::new(),
        }
    }

    /// Validate `settings` and create a session over them
    pub fn with_settings(settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self::new(settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// Percentage of bricks destroyed this run
    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn has_submitted(&self) -> bool {
        self.score_submitted
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// Direct world access for debug tooling and tests
    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.world.as_mut()
    }

    pub fn destroyed_count(&self) -> usize {
        self.world.as_ref().map_or(0, World::destroyed_count)
    }

    pub fn total_bricks(&self) -> usize {
        self.world.as_ref().map_or(0, World::total_bricks)
    }

    /// Unpaused play time in whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        (self.elapsed * 1000.0).round() as u64
    }

    /// Read-only view for rendering between steps
    pub fn snapshot(&self) -> SessionView<'_> {
        SessionView {
            phase: self.phase,
            mode: self.world.as_ref().map(|w| w.mode),
            paused: self.paused,
            lives: self.lives,
            score: self.score,
            destroyed: self.destroyed_count(),
            total: self.total_bricks(),
            elapsed_ms: self.elapsed_ms(),
            bricks: self.world.as_ref().map(|w| w.bricks.as_slice()).unwrap_or_default(),
            balls: self.world.as_ref().map(|w| w.balls.as_slice()).unwrap_or_default(),
            paddle: self.world.as_ref().map(|w| &w.paddle),
        }
    }

    /// Take events produced outside [`Session::advance`]
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {} -> {}", from.as_str(), to.as_str());
        self.phase = to;
        self.events.push(SessionEvent::PhaseChanged { from, to });
    }

    /// Accept a new run request and enter `Loading`
    ///
    /// Prior run data is discarded. Rejected while another request is in flight.
    pub fn begin_run(&mut self, prompt: &str, mode: PlayMode) -> Result<LayoutTicket, SessionError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            log::warn!("Rejected run request with empty prompt");
            return Err(SessionError::EmptyPrompt);
        }
        if self.phase == GamePhase::Loading {
            log::warn!("Rejected run request while layout {} is in flight", self.epoch);
            return Err(SessionError::LayoutInFlight);
        }

        self.clear_run();
        self.epoch += 1;
        self.pending_mode = mode;
        self.prompt = prompt.to_string();
        self.set_phase(GamePhase::Loading);
        log::info!("Run {} requested in {} mode", self.epoch, mode.as_str());

        Ok(LayoutTicket {
            epoch: self.epoch,
            prompt: self.prompt.clone(),
            mode,
        })
    }

    fn clear_run(&mut self) {
        self.world = None;
        self.lives = self.settings.starting_lives;
        self.score = 0;
        self.paused = false;
        self.input = StepInput {
            autopilot: self.input.autopilot,
            ..StepInput::default()
        };
        self.elapsed = 0.0;
        self.reveal_clock_ms = 0.0;
        self.revealed = 0;
        self.score_submitted = false;
        self.end_reason = None;
    }

    /// Resolve a layout request
    ///
    /// Responses for an older run, or arriving outside `Loading`, are discarded.
    /// Failures and empty layouts return the session to `Idle`.
    pub fn complete_layout(
        &mut self,
        ticket: &LayoutTicket,
        result: Result<String, BackendError>,
    ) -> Result<(), SessionError> {
        if ticket.epoch != self.epoch || self.phase != GamePhase::Loading {
            log::warn!(
                "Discarding stale layout for run {} (current run {}, {})",
                ticket.epoch,
                self.epoch,
                self.phase.as_str()
            );
            return Err(SessionError::StaleLayout {
                ticket: ticket.epoch,
                current: self.epoch,
            });
        }

        let paragraph = match result {
            Ok(paragraph) => paragraph,
            Err(err) => {
                log::error!("Layout request for run {} failed: {}", self.epoch, err);
                self.set_phase(GamePhase::Idle);
                return Err(err.into());
            }
        };

        let bricks = generate_with_gap(
            &paragraph,
            self.settings.unit_size,
            self.settings.max_row_width,
            self.settings.row_gap,
        );
        if bricks.is_empty() {
            log::error!("Layout for run {} produced no bricks", self.epoch);
            self.set_phase(GamePhase::Idle);
            return Err(SessionError::EmptyLayout);
        }

        log::info!("Run {} laid out {} bricks", self.epoch, bricks.len());
        let seed = self.settings.seed.wrapping_add(self.epoch);
        self.world = Some(World::new(&self.settings, self.pending_mode, bricks, seed));
        self.set_phase(GamePhase::Animating);
        Ok(())
    }

    /// Request a layout from `provider` and resolve it in one call
    pub fn start_run<P>(&mut self, provider: &mut P, prompt: &str, mode: PlayMode) -> Result<(), SessionError>
    where
        P: LayoutProvider + ?Sized,
    {
        let ticket = self.begin_run(prompt, mode)?;
        let result = provider.request_layout(&ticket.prompt);
        self.complete_layout(&ticket, result)
    }

    /// Reveal the next hidden brick; enters `Running` after the last one
    pub fn reveal_next_brick(&mut self) -> Option<u32> {
        if self.phase != GamePhase::Animating {
            return None;
        }
        let world = self.world.as_mut()?;
        let brick = world.bricks.get_mut(self.revealed)?;
        brick.reveal();
        let id = brick.id;
        self.revealed += 1;
        self.events.push(SessionEvent::BrickRevealed { id });

        if self.revealed >= world.bricks.len() {
            self.enter_running();
        }
        Some(id)
    }

    fn enter_running(&mut self) {
        if let Some(world) = self.world.as_mut() {
            world.spawn_balls();
        }
        self.paused = false;
        self.elapsed = 0.0;
        self.set_phase(GamePhase::Running);
    }

    /// Apply a host input signal
    pub fn apply_intent(&mut self, intent: InputIntent) {
        match intent {
            InputIntent::LeftPressed => self.input.left = true,
            InputIntent::LeftReleased => self.input.left = false,
            InputIntent::RightPressed => self.input.right = true,
            InputIntent::RightReleased => self.input.right = false,
            InputIntent::TogglePause => {
                self.toggle_pause();
            }
        }
    }

    /// Flip the pause flag; only meaningful while running
    pub fn toggle_pause(&mut self) -> bool {
        if self.phase == GamePhase::Running {
            self.paused = !self.paused;
            log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
        }
        self.paused
    }

    /// Let the paddle steer itself (demo mode)
    pub fn set_autopilot(&mut self, enabled: bool) {
        self.input.autopilot = enabled;
    }

    /// Advance by `dt` seconds of host time
    ///
    /// Drives the reveal cadence while animating and the simulation while
    /// running. Returns every event produced since the last drain.
    pub fn advance(&mut self, dt: f32) -> Vec<SessionEvent> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        match self.phase {
            GamePhase::Animating => self.advance_reveal(dt),
            GamePhase::Running if !self.paused => self.advance_play(dt),
            _ => {}
        }

        self.drain_events()
    }

    fn advance_reveal(&mut self, dt: f32) {
        let interval = self.settings.reveal_interval_ms as f32;
        if interval <= 0.0 {
            while self.reveal_next_brick().is_some() {}
            return;
        }

        self.reveal_clock_ms += dt * 1000.0;
        while self.reveal_clock_ms >= interval && self.phase == GamePhase::Animating {
            self.reveal_clock_ms -= interval;
            self.reveal_next_brick();
        }
    }

    fn advance_play(&mut self, dt: f32) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        self.elapsed += dt as f64;
        let input = StepInput {
            paused: self.paused,
            ..self.input.clone()
        };
        let report = step(world, &input, dt, self.lives);
        self.fold(report);
    }

    /// Fold a simulation report into score, lives and phase
    fn fold(&mut self, report: StepReport) {
        for event in report.events {
            match event {
                SimEvent::BrickDestroyed { brick_id, .. } => self.record_destruction(brick_id),
                SimEvent::BallRespawned { ball_id } => log::debug!("Ball {} respawned", ball_id),
                SimEvent::PaddleHit { .. } => {}
            }
        }

        match report.signal {
            StepSignal::Continue => {}
            StepSignal::LifeLost => self.lose_life(),
            StepSignal::RunEnded(EndReason::OutOfLives) => {
                self.lose_life();
                self.finish(EndReason::OutOfLives);
            }
            StepSignal::RunEnded(EndReason::Cleared) => self.finish(EndReason::Cleared),
        }
    }

    fn record_destruction(&mut self, id: u32) {
        self.score = self.world.as_ref().map_or(0, World::score);
        self.events.push(SessionEvent::BrickDestroyed { id, score: self.score });
    }

    fn lose_life(&mut self) {
        if self.world.as_ref().is_some_and(|w| !w.mode.loses_lives()) {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        log::info!("Life lost, {} remaining", self.lives);
        self.events.push(SessionEvent::LifeLost { lives: self.lives });
    }

    fn finish(&mut self, reason: EndReason) {
        if self.phase != GamePhase::Running {
            return;
        }
        self.end_reason = Some(reason);
        self.paused = false;
        self.set_phase(GamePhase::Over);
        log::info!(
            "Run {} over ({:?}): {}% in {} ms",
            self.epoch,
            reason,
            self.score,
            self.elapsed_ms()
        );
        self.events.push(SessionEvent::RunOver {
            reason,
            score: self.score,
            elapsed_ms: self.elapsed_ms(),
        });
    }

    /// Destroy a brick directly
    ///
    /// Unknown ids and already-destroyed bricks are a no-op. Destroying the
    /// last brick ends the run.
    pub fn destroy_brick(&mut self, id: u32) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        let Some(world) = self.world.as_mut() else {
            return false;
        };
        if !world.destroy_brick(id) {
            return false;
        }
        let cleared = world.all_destroyed();
        self.record_destruction(id);
        if cleared {
            self.finish(EndReason::Cleared);
        }
        true
    }

    /// Submit this run's score once
    ///
    /// The submitted flag is set before the sink is called, so a failed
    /// submission is logged and not retried. Returns whether the sink
    /// accepted the entry.
    pub fn submit_score<S>(&mut self, sink: &mut S, username: &str) -> Result<bool, SessionError>
    where
        S: ScoreSink + ?Sized,
    {
        if self.phase != GamePhase::Over {
            return Err(SessionError::RunNotOver);
        }
        let username = username.trim();
        let len = username.chars().count();
        if !USERNAME_LEN.contains(&len) {
            return Err(SessionError::InvalidUsername { len });
        }
        if self.score_submitted {
            log::warn!("Score for run {} already submitted", self.epoch);
            return Err(SessionError::AlreadySubmitted);
        }

        self.score_submitted = true;
        let entry = ScoreEntry::new(username, self.score, self.elapsed_ms());
        match sink.submit_score(&entry) {
            Ok(()) => {
                log::info!("Submitted {}% for {}", entry.score, entry.username);
                Ok(true)
            }
            Err(err) => {
                log::warn!("Failed to submit score for {}: {}", entry.username, err);
                Ok(false)
            }
        }
    }
}
