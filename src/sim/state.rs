//! Simulation state and core kinematic types
//!
//! Everything the engine mutates in place each step lives here.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_LAUNCH_ANGLE, SPAWN_CLEARANCE};
use crate::layout::Brick;
use crate::settings::{PlayMode, Settings};
use crate::{lerp, percent};

/// Slot id of the always-present ball
pub const PRIMARY_BALL: u32 = 0;

/// A ball body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Slot id (0 = primary)
    pub id: u32,
    pub pos: Vec2,
    /// Per-frame velocity at the 60 Hz reference rate
    pub vel: Vec2,
    pub radius: f32,
    /// Set by a straight-up respawn; exempts the ball from the horizontal
    /// nudge until its next wall, paddle or brick contact
    pub fresh: bool,
}

impl Ball {
    pub fn new(id: u32, radius: f32) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius,
            fresh: false,
        }
    }

    #[inline]
    pub fn is_primary(&self) -> bool {
        self.id == PRIMARY_BALL
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.radius
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Center the ball just above the paddle
    pub fn place_above(&mut self, paddle: &Paddle) {
        self.pos = Vec2::new(paddle.center_x(), paddle.y - self.radius - SPAWN_CLEARANCE);
    }
}

/// The player's paddle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Paddle {
    /// Paddle centered horizontally in the field
    pub fn centered(settings: &Settings, mode: PlayMode) -> Self {
        let width = settings.paddle_width_for(mode);
        Self {
            x: (settings.field_width - width) / 2.0,
            y: settings.paddle_y,
            width,
            height: settings.paddle_height,
        }
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    /// Whether `x` lies within the paddle's horizontal extent
    #[inline]
    pub fn spans(&self, x: f32) -> bool {
        x >= self.x && x <= self.x + self.width
    }

    /// Shift horizontally, clamped to [0, field_width - width]
    pub fn shift(&mut self, dx: f32, field_width: f32) {
        self.x = (self.x + dx).clamp(0.0, (field_width - self.width).max(0.0));
    }
}

/// Complete kinematic state of one run
#[derive(Debug, Clone)]
pub struct World {
    pub settings: Settings,
    pub mode: PlayMode,
    pub paddle: Paddle,
    /// Sorted by slot id; slot 0 is the primary ball
    pub balls: Vec<Ball>,
    /// Generation order; never reordered or resized during a run
    pub bricks: Vec<Brick>,
    destroyed: usize,
    rng: Pcg32,
}

impl World {
    /// Adopt a freshly generated brick set. Balls are spawned later by [`World::spawn_balls`].
    pub fn new(settings: &Settings, mode: PlayMode, bricks: Vec<Brick>, seed: u64) -> Self {
        Self {
            settings: settings.clone(),
            mode,
            paddle: Paddle::centered(settings, mode),
            balls: Vec::new(),
            bricks,
            destroyed: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Reset the paddle and launch the mode's balls
    pub fn spawn_balls(&mut self) {
        self.paddle = Paddle::centered(&self.settings, self.mode);
        self.balls.clear();

        let mut primary = Ball::new(PRIMARY_BALL, self.settings.ball_radius);
        primary.place_above(&self.paddle);
        primary.vel = Vec2::new(1.0, -1.0).normalize() * self.settings.base_speed;
        self.balls.push(primary);

        if self.mode == PlayMode::MultiBall {
            for id in 1..=self.settings.extra_balls as u32 {
                let mut ball = Ball::new(id, self.settings.ball_radius);
                self.launch_random(&mut ball);
                self.balls.push(ball);
            }
        }
        log::debug!("Spawned {} ball(s) in {} mode", self.balls.len(), self.mode.as_str());
    }

    /// Respawn a ball centered above the paddle, heading straight up
    pub fn respawn_upright(&mut self, index: usize) {
        let paddle = self.paddle.clone();
        let speed = self.settings.base_speed;
        if let Some(ball) = self.balls.get_mut(index) {
            ball.place_above(&paddle);
            ball.vel = Vec2::new(0.0, -speed);
            ball.fresh = true;
        }
    }

    /// Respawn a ball above the paddle with a random upward launch angle
    pub fn respawn_random(&mut self, index: usize) {
        if let Some(mut ball) = self.balls.get(index).cloned() {
            self.launch_random(&mut ball);
            self.balls[index] = ball;
        }
    }

    fn launch_random(&mut self, ball: &mut Ball) {
        let angle = self.rng.random_range(-MAX_LAUNCH_ANGLE..=MAX_LAUNCH_ANGLE);
        let speed = self.target_speed(ball);
        ball.place_above(&self.paddle);
        ball.vel = Vec2::new(angle.sin(), -angle.cos()) * speed;
        ball.fresh = false;
    }

    pub fn total_bricks(&self) -> usize {
        self.bricks.len()
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    pub fn all_destroyed(&self) -> bool {
        !self.bricks.is_empty() && self.destroyed == self.bricks.len()
    }

    /// Fraction of bricks destroyed, 0.0 to 1.0
    pub fn progress(&self) -> f32 {
        if self.bricks.is_empty() {
            0.0
        } else {
            self.destroyed as f32 / self.bricks.len() as f32
        }
    }

    /// Integer percentage of bricks destroyed
    ///
    /// Held at 99 until the last brick falls, so 100 always means cleared.
    pub fn score(&self) -> u8 {
        let score = percent(self.destroyed, self.bricks.len());
        if self.all_destroyed() { score } else { score.min(99) }
    }

    /// Destroy a brick by index; returns false if it was already gone
    pub fn destroy_at(&mut self, index: usize) -> bool {
        let Some(brick) = self.bricks.get_mut(index) else {
            return false;
        };
        if !brick.destroy() {
            return false;
        }
        self.destroyed += 1;
        true
    }

    /// Destroy a brick by id; unknown or already-destroyed ids are a no-op
    pub fn destroy_brick(&mut self, id: u32) -> bool {
        // Ids equal generation order, but don't rely on it for lookups
        match self.bricks.iter().position(|b| b.id == id) {
            Some(index) => self.destroy_at(index),
            None => false,
        }
    }

    /// Speed the primary ball is held to at the current progress
    pub fn primary_target_speed(&self) -> f32 {
        lerp(self.settings.base_speed, self.settings.max_speed, self.progress())
    }

    /// Speed target for a ball's slot
    pub fn target_speed(&self, ball: &Ball) -> f32 {
        if ball.is_primary() {
            self.primary_target_speed()
        } else {
            self.settings.extra_ball_speed
        }
    }

    pub(crate) fn random_sign(&mut self) -> f32 {
        if self.rng.random_bool(0.5) { 1.0 } else { -1.0 }
    }
}
