//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Closed-form trajectory evaluation (no incremental integration)
//! - No rendering or platform dependencies

pub mod agent;
pub mod collision;
pub mod kinematics;
pub mod paddle;
pub mod rally;
pub mod tick;

pub use agent::{AgentController, BallView, predict_time, predict_y};
pub use collision::ReboundSolver;
pub use kinematics::Kinematics;
pub use paddle::Paddle;
pub use rally::{Ball, NullSink, Rally, RallyOutcome, RallyState, RenderSink, Serve, Side};
pub use tick::{Session, TickInput};
