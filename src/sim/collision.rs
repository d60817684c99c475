//! Collision detection and response for balls against the field
//!
//! All geometry is axis-aligned: walls, the paddle top and brick boxes.
//! Responses only touch direction; speed is restored by normalization.

use glam::Vec2;

use super::state::{Ball, Paddle};
use crate::layout::Brick;

/// Which wall a ball touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Left,
    Right,
    Top,
}

/// Circle-bounds vs box overlap (the ball is treated as its bounding square)
#[inline]
pub fn circle_aabb_overlap(center: Vec2, radius: f32, min: Vec2, max: Vec2) -> bool {
    center.x + radius > min.x
        && center.x - radius < max.x
        && center.y + radius > min.y
        && center.y - radius < max.y
}

/// Force `vx` to point along `sign` with a magnitude of at least `floor`
#[inline]
pub fn with_horizontal_floor(vx: f32, sign: f32, floor: f32) -> f32 {
    sign.signum() * vx.abs().max(floor)
}

/// Resolve side and top walls, returning the walls touched
///
/// Side hits push the ball back inside and force its horizontal velocity
/// outward with at least `min_horizontal` speed. A top hit sends it down.
pub fn resolve_walls(ball: &mut Ball, field_width: f32, min_horizontal: f32) -> Option<Wall> {
    let mut touched = None;

    if ball.pos.x - ball.radius < 0.0 {
        ball.pos.x = ball.radius;
        ball.vel.x = with_horizontal_floor(ball.vel.x, 1.0, min_horizontal);
        touched = Some(Wall::Left);
    } else if ball.pos.x + ball.radius > field_width {
        ball.pos.x = field_width - ball.radius;
        ball.vel.x = with_horizontal_floor(ball.vel.x, -1.0, min_horizontal);
        touched = Some(Wall::Right);
    }

    if ball.pos.y - ball.radius < 0.0 {
        ball.pos.y = ball.radius;
        ball.vel.y = ball.vel.y.abs();
        touched = touched.or(Some(Wall::Top));
    }

    touched
}

/// Check whether a ball lands on the paddle this step
///
/// Returns the hit offset from the paddle center, normalized to [-1, 1].
/// Only descending balls whose center is over the paddle and whose bottom
/// edge has reached the paddle top count.
pub fn paddle_hit(ball: &Ball, paddle: &Paddle) -> Option<f32> {
    let descending = ball.vel.y > 0.0;
    let reached = ball.bottom() >= paddle.y;
    // A ball whose center already passed the paddle is beyond saving
    let not_through = ball.pos.y <= paddle.y + paddle.height;

    if descending && reached && not_through && paddle.spans(ball.pos.x) {
        let offset = (ball.pos.x - paddle.center_x()) / paddle.half_width();
        Some(offset.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Bounce a ball off the paddle
///
/// Horizontal speed maps linearly from the hit offset onto
/// [-deflection, deflection], floored at `min_horizontal`.
pub fn deflect_off_paddle(
    ball: &mut Ball,
    paddle: &Paddle,
    offset: f32,
    deflection: f32,
    min_horizontal: f32,
) {
    ball.pos.y = paddle.y - ball.radius;
    ball.vel.y = -ball.vel.y.abs();
    let vx = offset * deflection;
    ball.vel.x = with_horizontal_floor(vx, offset, min_horizontal);
}

/// Index of the first live brick the ball overlaps, in list order
pub fn first_brick_hit(ball: &Ball, bricks: &[Brick]) -> Option<usize> {
    bricks
        .iter()
        .position(|b| b.is_live() && circle_aabb_overlap(ball.pos, ball.radius, b.min(), b.max()))
}

/// Ball has fully left the field through the bottom
#[inline]
pub fn below_floor(ball: &Ball, field_height: f32) -> bool {
    ball.pos.y - ball.radius > field_height
}
