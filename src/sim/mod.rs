//! Simulation module
//!
//! All gameplay physics lives here. This module must stay free of I/O:
//! - Time-scaled stepping against a 60 Hz reference
//! - Seeded RNG only
//! - Stable iteration order (balls by slot, bricks by id)
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{Wall, circle_aabb_overlap, first_brick_hit, paddle_hit, resolve_walls};
pub use state::{Ball, PRIMARY_BALL, Paddle, World};
pub use tick::{EndReason, SimEvent, StepInput, StepReport, StepSignal, normalize_speeds, step, time_scale};
