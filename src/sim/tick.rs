//! Variable-rate simulation step
//!
//! Velocities are per-frame values at the 60 Hz reference rate. A host delta
//! is converted to a time scale and split into substeps of at most one
//! reference frame, so a slow or fast display sees the same trajectories.

use glam::Vec2;

use super::collision::{
    below_floor, deflect_off_paddle, first_brick_hit, paddle_hit, resolve_walls,
};
use super::state::World;
use crate::consts::{MAX_SUBSTEPS, REFERENCE_HZ};

/// Horizontal speed below which a ball counts as moving straight up or down
const VERTICAL_EPSILON: f32 = 1e-3;

/// Input for a single step
#[derive(Debug, Clone, Default)]
pub struct StepInput {
    /// Paddle-left held
    pub left: bool,
    /// Paddle-right held
    pub right: bool,
    /// Physics frozen
    pub paused: bool,
    /// Steer the paddle toward the most urgent ball (demo/attract mode)
    pub autopilot: bool,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Every brick destroyed
    Cleared,
    /// The last life was lost
    OutOfLives,
}

/// Continuation signal for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSignal {
    Continue,
    /// The primary ball hit the floor with lives to spare and was respawned
    LifeLost,
    RunEnded(EndReason),
}

/// Things that happened during a step, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    BrickDestroyed { brick_id: u32, ball_id: u32 },
    PaddleHit { ball_id: u32 },
    BallRespawned { ball_id: u32 },
}

/// Result of [`step`]
#[derive(Debug, Clone)]
pub struct StepReport {
    pub signal: StepSignal,
    pub events: Vec<SimEvent>,
    /// Substeps actually simulated
    pub substeps: u32,
}

/// Convert a host delta (seconds) into reference frames, capped at [`MAX_SUBSTEPS`]
pub fn time_scale(dt: f32) -> f32 {
    if dt.is_nan() || dt <= 0.0 {
        return 0.0;
    }
    (dt * REFERENCE_HZ).min(MAX_SUBSTEPS as f32)
}

/// Advance the world by `dt` seconds
///
/// `lives` is the number of lives remaining before this step. The caller owns
/// lives and score; the world only reports what happened.
pub fn step(world: &mut World, input: &StepInput, dt: f32, lives: u8) -> StepReport {
    let mut report = StepReport {
        signal: StepSignal::Continue,
        events: Vec::new(),
        substeps: 0,
    };

    if input.paused {
        return report;
    }

    let scale = time_scale(dt);
    if scale == 0.0 {
        return report;
    }

    // Tolerance keeps 1/30 s from becoming three substeps through float error
    let count = (scale - 1e-4).ceil().max(1.0);
    let sub_scale = scale / count;

    for _ in 0..count as u32 {
        report.substeps += 1;
        let signal = substep(world, input, sub_scale, lives, &mut report.events);
        if signal != StepSignal::Continue {
            report.signal = signal;
            break;
        }
    }

    report
}

/// One substep: paddle, integration, walls, paddle hit, bricks, floor, speed
fn substep(
    world: &mut World,
    input: &StepInput,
    scale: f32,
    lives: u8,
    events: &mut Vec<SimEvent>,
) -> StepSignal {
    let settings = world.settings.clone();
    let mut signal = StepSignal::Continue;

    // 1. Paddle
    let (left, right) = if input.autopilot {
        autopilot(world)
    } else {
        (input.left, input.right)
    };
    let direction = right as i32 as f32 - left as i32 as f32;
    if direction != 0.0 {
        world
            .paddle
            .shift(direction * settings.paddle_speed * scale, settings.field_width);
    }

    // 2. Integrate
    for ball in &mut world.balls {
        ball.pos += ball.vel * scale;
    }

    for index in 0..world.balls.len() {
        let paddle = world.paddle.clone();
        let ball = &mut world.balls[index];
        let ball_id = ball.id;

        // 3. Walls
        if resolve_walls(ball, settings.field_width, settings.min_horizontal_speed).is_some() {
            ball.fresh = false;
        }

        // 4. Paddle
        if let Some(offset) = paddle_hit(ball, &paddle) {
            deflect_off_paddle(
                ball,
                &paddle,
                offset,
                settings.paddle_deflection,
                settings.min_horizontal_speed,
            );
            ball.fresh = false;
            events.push(SimEvent::PaddleHit { ball_id });
        }

        // 5. Bricks: first hit in list order only
        if let Some(hit) = first_brick_hit(ball, &world.bricks) {
            ball.vel.y = -ball.vel.y;
            ball.fresh = false;
            if world.destroy_at(hit) {
                let brick_id = world.bricks[hit].id;
                log::debug!("Ball {} destroyed brick {} ({:?})", ball_id, brick_id, world.bricks[hit].text);
                events.push(SimEvent::BrickDestroyed { brick_id, ball_id });
            }
        }

        // 6. Floor
        if below_floor(&world.balls[index], settings.field_height) {
            if world.mode.loses_lives() {
                if lives > 1 {
                    world.respawn_upright(index);
                    events.push(SimEvent::BallRespawned { ball_id });
                    signal = StepSignal::LifeLost;
                } else {
                    signal = StepSignal::RunEnded(EndReason::OutOfLives);
                }
            } else {
                world.respawn_random(index);
                events.push(SimEvent::BallRespawned { ball_id });
            }
        }
    }

    // 7. Speed normalization
    normalize_speeds(world);

    if world.all_destroyed() {
        return StepSignal::RunEnded(EndReason::Cleared);
    }
    signal
}

/// Rescale every ball to its slot's target speed
///
/// Horizontal speed is then floored at the minimum, keeping the direction
/// walls and the paddle gave it. Only a ball with no horizontal motion at
/// all gets a random side, and a ball just respawned straight up is left
/// alone.
pub fn normalize_speeds(world: &mut World) {
    let min_horizontal = world.settings.min_horizontal_speed;

    for index in 0..world.balls.len() {
        let target = world.target_speed(&world.balls[index]);
        let (needs_floor, vx) = {
            let ball = &mut world.balls[index];
            if ball.vel.length_squared() < f32::EPSILON {
                ball.vel = Vec2::new(0.0, -1.0);
            }
            ball.vel = ball.vel.normalize() * target;
            (!ball.fresh && ball.vel.x.abs() < min_horizontal, ball.vel.x)
        };

        if needs_floor {
            let sign = if vx.abs() > VERTICAL_EPSILON {
                vx.signum()
            } else {
                world.random_sign()
            };
            let ball = &mut world.balls[index];
            let vertical = if ball.vel.y > 0.0 { 1.0 } else { -1.0 };
            let vy = (target * target - min_horizontal * min_horizontal).max(0.0).sqrt();
            ball.vel = Vec2::new(sign * min_horizontal, vertical * vy);
        }
    }
}

/// Pick paddle directions that chase the lowest descending ball
fn autopilot(world: &World) -> (bool, bool) {
    let target = world
        .balls
        .iter()
        .filter(|b| b.vel.y > 0.0)
        .max_by(|a, b| {
            a.pos
                .y
                .partial_cmp(&b.pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    match target {
        Some(ball) => {
            // Dead zone so the paddle doesn't jitter around the ball
            let dead_zone = world.paddle.width * 0.1;
            let delta = ball.pos.x - world.paddle.center_x();
            (delta < -dead_zone, delta > dead_zone)
        }
        None => (false, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::generate;
    use crate::settings::{PlayMode, Settings};
    use crate::sim::state::Ball;

    const DT: f32 = 1.0 / 60.0;

    fn world(mode: PlayMode, text: &str) -> World {
        let settings = Settings::default();
        let bricks = generate(text, settings.unit_size, settings.max_row_width);
        let mut world = World::new(&settings, mode, bricks, 42);
        world.spawn_balls();
        world
    }

    /// Park the primary ball in open space away from everything
    fn park(world: &mut World, pos: Vec2, vel: Vec2) {
        world.balls[0].pos = pos;
        world.balls[0].vel = vel;
    }

    #[test]
    fn test_time_scale() {
        assert!((time_scale(DT) - 1.0).abs() < 1e-5);
        assert!((time_scale(1.0 / 30.0) - 2.0).abs() < 1e-5);
        assert_eq!(time_scale(-1.0), 0.0);
        assert_eq!(time_scale(f32::NAN), 0.0);
        assert_eq!(time_scale(10.0), MAX_SUBSTEPS as f32);
    }

    #[test]
    fn test_paused_step_is_inert() {
        let mut world = world(PlayMode::Classic, "alpha beta");
        let before = world.balls.clone();
        let input = StepInput {
            paused: true,
            right: true,
            ..Default::default()
        };
        let report = step(&mut world, &input, DT, 3);
        assert_eq!(report.signal, StepSignal::Continue);
        assert_eq!(report.substeps, 0);
        assert_eq!(world.balls, before);
    }

    #[test]
    fn test_paddle_moves_with_input_and_clamps() {
        let mut world = world(PlayMode::Classic, "alpha beta");
        let start = world.paddle.x;
        let input = StepInput {
            left: true,
            ..Default::default()
        };
        step(&mut world, &input, DT, 3);
        assert!((world.paddle.x - (start - world.settings.paddle_speed)).abs() < 1e-3);

        for _ in 0..200 {
            step(&mut world, &input, DT, 3);
        }
        assert_eq!(world.paddle.x, 0.0);

        // Both held cancel out
        let both = StepInput {
            left: true,
            right: true,
            ..Default::default()
        };
        step(&mut world, &both, DT, 3);
        assert_eq!(world.paddle.x, 0.0);
    }

    #[test]
    fn test_frame_rate_invariance() {
        let mut slow = world(PlayMode::Classic, "alpha beta");
        let mut fast = slow.clone();
        let input = StepInput::default();

        step(&mut slow, &input, 2.0 * DT, 3);
        step(&mut fast, &input, DT, 3);
        step(&mut fast, &input, DT, 3);

        let (a, b) = (&slow.balls[0], &fast.balls[0]);
        assert!((a.pos - b.pos).length() < 1e-3, "{:?} vs {:?}", a.pos, b.pos);
        assert!((a.vel - b.vel).length() < 1e-3);
    }

    #[test]
    fn test_large_delta_is_substepped_and_capped() {
        let mut world = world(PlayMode::Classic, "alpha beta");
        let report = step(&mut world, &StepInput::default(), 1.0, 3);
        assert_eq!(report.substeps, MAX_SUBSTEPS);
    }

    #[test]
    fn test_single_brick_hit_per_step() {
        let mut world = world(PlayMode::Classic, "abcdefghijkl abcdefghijkl");
        // Slide the first brick right so both bricks touch at one seam
        let seam = world.bricks[1].pos.x;
        world.bricks[0].pos.x = seam - world.bricks[0].size.x;
        park(&mut world, Vec2::new(seam, 24.0), Vec2::new(2.0, -4.0).normalize() * 4.0);

        let report = step(&mut world, &StepInput::default(), DT, 3);
        let destroyed: Vec<_> = report
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::BrickDestroyed { brick_id, .. } => Some(*brick_id),
                _ => None,
            })
            .collect();
        assert_eq!(destroyed, vec![0]);
        assert!(world.balls[0].vel.y > 0.0);
        assert_eq!(world.destroyed_count(), 1);
    }

    #[test]
    fn test_clearing_last_brick_ends_run() {
        let mut world = world(PlayMode::Classic, "solo");
        let brick = world.bricks[0].clone();
        let center = brick.pos + brick.size / 2.0;
        park(&mut world, center + Vec2::new(0.0, 18.0), Vec2::new(1.0, -4.0));

        let report = step(&mut world, &StepInput::default(), DT, 3);
        assert_eq!(report.signal, StepSignal::RunEnded(EndReason::Cleared));
        assert!(world.bricks[0].destroyed);
    }

    #[test]
    fn test_floor_with_lives_respawns_upright() {
        let mut world = world(PlayMode::Classic, "alpha beta");
        park(&mut world, Vec2::new(120.0, 640.0), Vec2::new(2.0, 3.0));

        let report = step(&mut world, &StepInput::default(), DT, 2);
        assert_eq!(report.signal, StepSignal::LifeLost);
        assert!(report.events.contains(&SimEvent::BallRespawned { ball_id: 0 }));
        let ball = &world.balls[0];
        assert_eq!(ball.pos.x, world.paddle.center_x());
        assert_eq!(ball.vel.x, 0.0);
        assert!(ball.vel.y < 0.0);
        assert!(ball.fresh);
    }

    #[test]
    fn test_floor_on_last_life_ends_run() {
        let mut world = world(PlayMode::Classic, "alpha beta");
        park(&mut world, Vec2::new(120.0, 640.0), Vec2::new(2.0, 3.0));
        let report = step(&mut world, &StepInput::default(), DT, 1);
        assert_eq!(report.signal, StepSignal::RunEnded(EndReason::OutOfLives));
    }

    #[test]
    fn test_multi_ball_floor_never_costs_lives() {
        let mut world = world(PlayMode::MultiBall, "alpha beta");
        for ball in &mut world.balls {
            ball.pos = Vec2::new(300.0, 640.0);
            ball.vel = Vec2::new(1.0, 4.0);
        }
        let report = step(&mut world, &StepInput::default(), DT, 1);
        assert_eq!(report.signal, StepSignal::Continue);
        let respawns = report
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::BallRespawned { .. }))
            .count();
        assert_eq!(respawns, world.balls.len());
        assert!(world.balls.iter().all(|b| b.vel.y < 0.0 && b.pos.y < world.paddle.y));
    }

    #[test]
    fn test_speed_ramp_follows_progress() {
        let mut world = world(PlayMode::Classic, "one two three four");
        park(&mut world, Vec2::new(400.0, 300.0), Vec2::new(3.0, 3.0));
        step(&mut world, &StepInput::default(), DT, 3);
        assert!((world.balls[0].speed() - world.settings.base_speed).abs() < 1e-4);

        let mut last = world.balls[0].speed();
        for id in 0..4 {
            world.destroy_brick(id);
            park(&mut world, Vec2::new(400.0, 300.0), Vec2::new(3.0, 3.0));
            step(&mut world, &StepInput::default(), DT, 3);
            let speed = world.balls[0].speed();
            assert!(speed >= last - 1e-4);
            last = speed;
        }
        assert!((last - world.settings.max_speed).abs() < 1e-4);
    }

    #[test]
    fn test_vertical_ball_is_nudged() {
        let mut world = world(PlayMode::Classic, "alpha beta");
        park(&mut world, Vec2::new(400.0, 300.0), Vec2::new(0.0, 4.0));
        step(&mut world, &StepInput::default(), DT, 3);
        let ball = &world.balls[0];
        assert!((ball.vel.x.abs() - world.settings.min_horizontal_speed).abs() < 1e-4);
        assert!(ball.vel.y > 0.0);
        assert!((ball.speed() - world.settings.base_speed).abs() < 1e-4);
    }

    #[test]
    fn test_fresh_ball_keeps_vertical_launch() {
        let mut world = world(PlayMode::Classic, "alpha beta");
        world.respawn_upright(0);
        world.balls[0].pos.y = 300.0;
        step(&mut world, &StepInput::default(), DT, 3);
        assert_eq!(world.balls[0].vel.x, 0.0);
    }

    #[test]
    fn test_paddle_bounce_reports_event() {
        let mut world = world(PlayMode::Classic, "alpha beta");
        let x = world.paddle.center_x() + 25.0;
        let y = world.paddle.y - world.settings.ball_radius - 1.0;
        park(&mut world, Vec2::new(x, y), Vec2::new(0.0, 4.0));
        let report = step(&mut world, &StepInput::default(), DT, 3);
        assert!(report.events.contains(&SimEvent::PaddleHit { ball_id: 0 }));
        let ball = &world.balls[0];
        assert!(ball.vel.y < 0.0);
        assert!(ball.vel.x > 0.0);
    }

    fn seeded(text: &str, seed: u64) -> World {
        let settings = Settings::default();
        let bricks = generate(text, settings.unit_size, settings.max_row_width);
        let mut world = World::new(&settings, PlayMode::Classic, bricks, seed);
        world.spawn_balls();
        world
    }

    #[test]
    fn test_wall_bounce_stays_outward_through_step() {
        for seed in 0..32 {
            let mut world = seeded("alpha beta", seed);
            park(&mut world, Vec2::new(7.5, 300.0), Vec2::new(-0.1, -4.0));
            step(&mut world, &StepInput::default(), DT, 3);
            let vel = world.balls[0].vel;
            assert!(vel.x > 0.0, "seed {seed}: {vel:?}");
            assert!((vel.x - world.settings.min_horizontal_speed).abs() < 1e-4);

            let mut world = seeded("alpha beta", seed);
            park(&mut world, Vec2::new(792.5, 300.0), Vec2::new(0.1, -4.0));
            step(&mut world, &StepInput::default(), DT, 3);
            assert!(world.balls[0].vel.x < 0.0, "seed {seed}");
        }
    }

    #[test]
    fn test_paddle_bounce_follows_hit_side() {
        for seed in 0..32 {
            for (dx, side) in [(10.0, 1.0), (-10.0, -1.0)] {
                let mut world = seeded("alpha beta", seed);
                let x = world.paddle.center_x() + dx;
                let y = world.paddle.y - world.settings.ball_radius - 1.0;
                park(&mut world, Vec2::new(x, y), Vec2::new(0.0, 4.0));
                let report = step(&mut world, &StepInput::default(), DT, 3);
                assert!(report.events.contains(&SimEvent::PaddleHit { ball_id: 0 }));
                let vel = world.balls[0].vel;
                assert_eq!(vel.x.signum(), side, "seed {seed}, offset {dx}: {vel:?}");
                assert!(vel.y < 0.0);
            }
        }
    }

    #[test]
    fn test_floored_ball_keeps_direction() {
        let mut world = seeded("alpha beta", 3);
        park(&mut world, Vec2::new(400.0, 300.0), Vec2::new(-0.2, 4.0));
        normalize_speeds(&mut world);
        let ball = &world.balls[0];
        assert!((ball.vel.x + world.settings.min_horizontal_speed).abs() < 1e-4);
        assert!(ball.vel.y > 0.0);
    }

    #[test]
    fn test_clear_wins_over_last_life() {
        let mut world = world(PlayMode::Classic, "solo");
        park(&mut world, Vec2::new(120.0, 640.0), Vec2::new(2.0, 3.0));

        let brick = world.bricks[0].clone();
        let mut second = Ball::new(1, world.settings.ball_radius);
        second.pos = brick.pos + brick.size / 2.0 + Vec2::new(0.0, 18.0);
        second.vel = Vec2::new(1.0, -4.0);
        world.balls.push(second);

        let report = step(&mut world, &StepInput::default(), DT, 1);
        assert_eq!(report.signal, StepSignal::RunEnded(EndReason::Cleared));
    }

    #[test]
    fn test_autopilot_tracks_descending_ball() {
        let mut world = world(PlayMode::Classic, "alpha beta");
        park(&mut world, Vec2::new(50.0, 300.0), Vec2::new(1.0, 4.0));
        let start = world.paddle.x;
        let input = StepInput {
            autopilot: true,
            ..Default::default()
        };
        step(&mut world, &input, DT, 3);
        assert!(world.paddle.x < start);
    }
}
