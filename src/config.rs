//! Immutable simulation configuration
//!
//! All physical constants, table geometry, and serve randomization ranges
//! live here. A config is validated once up front; the simulation never
//! re-checks values inside the tick loop.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default tuning parameters
#[derive(Debug, Clone, Copy)]
pub struct Params;

impl Params {
    // Physics
    pub const GRAVITY: f64 = 9.8;
    pub const DRAG_COEFF: f64 = 0.1316;
    pub const KE_MIN: f64 = 0.001;
    pub const TICK: f64 = 0.01;

    // Ball
    pub const BALL_MASS: f64 = 0.0027;
    pub const BALL_RADIUS: f64 = 0.02;

    // Paddles (dimensions converted from 8 in x 0.5 in)
    pub const PADDLE_MASS: f64 = 0.1;
    pub const PADDLE_HEIGHT: f64 = 8.0 * 2.54 / 100.0;
    pub const PADDLE_WIDTH: f64 = 0.5 * 2.54 / 100.0;

    // Agent control
    pub const AGENT_MAX_SPEED: f64 = 6.0;

    // Nominal x "kick" velocities fed to the rebound solver (paddles never
    // actually move horizontally)
    pub const AGENT_VX: f64 = 1.2;
    pub const PADDLE_VX: f64 = -1.2;

    // Paddle y-velocity damping at contact, per side
    pub const AGENT_VY_FACTOR: f64 = 0.4;
    pub const PLAYER_VY_FACTOR: f64 = 0.8;

    // Post-collision velocity clamps
    pub const VX_MAX: f64 = 9.0;
    pub const VY_MAX: f64 = 7.0;

    // Table (meters, origin at bottom-left)
    pub const TABLE_WIDTH: f64 = 2.74;
    pub const TABLE_HEIGHT: f64 = 1.52;
    pub const LEFT_WALL_X: f64 = 0.1;

    /// Fixed seed so serves are reproducible across runs
    pub const SEED: u64 = 8976232;
}

/// Errors from [`SimConfig::validate`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ball radius must be positive, got {0}")]
    BallRadius(f64),

    #[error("ball mass must be positive, got {0}")]
    BallMass(f64),

    #[error("paddle mass must be positive, got {0}")]
    PaddleMass(f64),

    #[error("paddle dimensions must be positive, got {width}x{height}")]
    PaddleSize { width: f64, height: f64 },

    #[error("drag coefficient must be positive, got {0}")]
    DragCoeff(f64),

    #[error("gravity must be positive, got {0}")]
    Gravity(f64),

    #[error("tick duration must be positive, got {0}")]
    Tick(f64),

    #[error("table dimensions must be positive, got {width}x{height}")]
    TableSize { width: f64, height: f64 },

    #[error("energy loss range [{min}, {max}] must be ordered and within [0, 1]")]
    LossRange { min: f64, max: f64 },

    #[error("derived terminal velocity {0} is not finite and positive")]
    TerminalVelocity(f64),
}

/// Ranges for randomly-generated serve conditions
///
/// A degenerate range (min == max) pins the value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServeRanges {
    /// Initial height of the ball center (m)
    pub y_min: f64,
    pub y_max: f64,
    /// Initial speed (m/s)
    pub speed_min: f64,
    pub speed_max: f64,
    /// Launch angle above horizontal (degrees)
    pub angle_min_deg: f64,
    pub angle_max_deg: f64,
    /// Floor-bounce energy loss factor, 0 = elastic, 1 = dead stop
    pub loss_min: f64,
    pub loss_max: f64,
}

impl Default for ServeRanges {
    fn default() -> Self {
        Self {
            y_min: 0.25 * Params::TABLE_HEIGHT,
            y_max: 0.75 * Params::TABLE_HEIGHT,
            speed_min: 5.0,
            speed_max: 5.0,
            angle_min_deg: 0.0,
            angle_max_deg: 20.0,
            loss_min: 0.2,
            loss_max: 0.2,
        }
    }
}

/// Complete simulation configuration
///
/// Constructed once per session (or per test scenario) and passed by
/// reference; there is no shared static state, so differently-tuned
/// simulations can run side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub gravity: f64,
    pub drag_coeff: f64,
    /// Rally ends when floor-contact kinetic energy falls below this (J)
    pub ke_min: f64,
    /// Simulated time per tick (s)
    pub tick: f64,

    pub ball_mass: f64,
    pub ball_radius: f64,

    pub paddle_mass: f64,
    pub paddle_width: f64,
    pub paddle_height: f64,

    pub agent_max_speed: f64,
    pub agent_vx: f64,
    pub paddle_vx: f64,
    pub agent_vy_factor: f64,
    pub player_vy_factor: f64,

    pub vx_max: f64,
    pub vy_max: f64,

    pub table_width: f64,
    pub table_height: f64,
    /// x-coordinate of the left wall the agent defends (m)
    pub left_wall_x: f64,

    pub seed: u64,
    pub serve: ServeRanges,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: Params::GRAVITY,
            drag_coeff: Params::DRAG_COEFF,
            ke_min: Params::KE_MIN,
            tick: Params::TICK,
            ball_mass: Params::BALL_MASS,
            ball_radius: Params::BALL_RADIUS,
            paddle_mass: Params::PADDLE_MASS,
            paddle_width: Params::PADDLE_WIDTH,
            paddle_height: Params::PADDLE_HEIGHT,
            agent_max_speed: Params::AGENT_MAX_SPEED,
            agent_vx: Params::AGENT_VX,
            paddle_vx: Params::PADDLE_VX,
            agent_vy_factor: Params::AGENT_VY_FACTOR,
            player_vy_factor: Params::PLAYER_VY_FACTOR,
            vx_max: Params::VX_MAX,
            vy_max: Params::VY_MAX,
            table_width: Params::TABLE_WIDTH,
            table_height: Params::TABLE_HEIGHT,
            left_wall_x: Params::LEFT_WALL_X,
            seed: Params::SEED,
            serve: ServeRanges::default(),
        }
    }
}

impl SimConfig {
    /// Default config with a specific RNG seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Validate and return the config, failing fast on degenerate values
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Check every invariant a running simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ball_radius > 0.0) {
            return Err(ConfigError::BallRadius(self.ball_radius));
        }
        if !(self.ball_mass > 0.0) {
            return Err(ConfigError::BallMass(self.ball_mass));
        }
        if !(self.paddle_mass > 0.0) {
            return Err(ConfigError::PaddleMass(self.paddle_mass));
        }
        if !(self.paddle_width > 0.0 && self.paddle_height > 0.0) {
            return Err(ConfigError::PaddleSize {
                width: self.paddle_width,
                height: self.paddle_height,
            });
        }
        if !(self.drag_coeff > 0.0) {
            return Err(ConfigError::DragCoeff(self.drag_coeff));
        }
        if !(self.gravity > 0.0) {
            return Err(ConfigError::Gravity(self.gravity));
        }
        if !(self.tick > 0.0) {
            return Err(ConfigError::Tick(self.tick));
        }
        if !(self.table_width > 0.0 && self.table_height > 0.0) {
            return Err(ConfigError::TableSize {
                width: self.table_width,
                height: self.table_height,
            });
        }
        let s = &self.serve;
        if !(s.loss_min <= s.loss_max && s.loss_min >= 0.0 && s.loss_max <= 1.0) {
            return Err(ConfigError::LossRange {
                min: s.loss_min,
                max: s.loss_max,
            });
        }
        let vt = self.terminal_velocity();
        if !(vt.is_finite() && vt > 0.0) {
            return Err(ConfigError::TerminalVelocity(vt));
        }
        Ok(())
    }

    /// Terminal velocity of the ball under linear drag (m/s)
    pub fn terminal_velocity(&self) -> f64 {
        self.ball_mass * self.gravity
            / (4.0 * std::f64::consts::PI * self.drag_coeff * self.ball_radius * self.ball_radius)
    }

    /// Initial x of the human paddle's center (flush with the right wall)
    pub fn paddle_x_init(&self) -> f64 {
        self.table_width - self.paddle_width / 2.0
    }

    /// Initial x of the agent's center (flush with the left wall)
    pub fn agent_x_init(&self) -> f64 {
        self.left_wall_x + self.paddle_width / 2.0
    }

    /// Vertical center of the table, home position for both paddles
    pub fn paddle_y_init(&self) -> f64 {
        self.table_height / 2.0
    }

    /// x-coordinate of the agent's leading face
    pub fn agent_contact_plane(&self) -> f64 {
        self.agent_x_init() + self.paddle_width / 2.0
    }

    /// Serve origin: ball center just in front of the agent's face
    pub fn serve_x(&self) -> f64 {
        self.agent_contact_plane() + self.ball_radius
    }

    /// Legal y range for a paddle center
    pub fn paddle_travel(&self) -> (f64, f64) {
        (
            self.paddle_height / 2.0,
            self.table_height - self.paddle_height / 2.0,
        )
    }
}
