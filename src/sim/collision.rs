//! Elastic rebound solver for paddle and agent contact
//!
//! Each axis is treated as an independent 1-D elastic collision against a
//! paddle of fixed mass. The paddle's velocity is an input "kick" and is not
//! itself updated by the collision, so energy and momentum are conserved
//! only approximately. Kinetic energy balance in the paddle's frame yields a
//! quadratic in the outgoing ball velocity; the physical root is selected
//! from the paddle's direction of motion.

use crate::config::SimConfig;

/// Rebound solver, precomputed from the ball/paddle mass ratio
#[derive(Debug, Clone, Copy)]
pub struct ReboundSolver {
    /// ball mass / paddle mass
    mass_ratio: f64,
    vx_max: f64,
    vy_max: f64,
}

impl ReboundSolver {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            mass_ratio: config.ball_mass / config.paddle_mass,
            vx_max: config.vx_max,
            vy_max: config.vy_max,
        }
    }

    /// Outgoing x-velocity after striking a paddle moving at `paddle_vx`
    ///
    /// A paddle "moving" right selects the larger root, left the smaller.
    pub fn horizontal(&self, ball_vx: f64, paddle_vx: f64) -> f64 {
        let sgn = if paddle_vx > 0.0 { 1.0 } else { -1.0 };
        self.solve(ball_vx, paddle_vx, sgn, self.vx_max)
    }

    /// Outgoing y-velocity after striking a paddle moving at `paddle_vy`
    ///
    /// Tie rule for a stationary paddle: a rising ball takes the positive
    /// root, a falling ball the negative one.
    pub fn vertical(&self, ball_vy: f64, paddle_vy: f64) -> f64 {
        let sgn = if paddle_vy > 0.0 || (paddle_vy == 0.0 && ball_vy > 0.0) {
            1.0
        } else {
            -1.0
        };
        self.solve(ball_vy, paddle_vy, sgn, self.vy_max)
    }

    /// Root of the kinetic-energy quadratic, clamped to `v_max`
    fn solve(&self, ball_v: f64, paddle_v: f64, sgn: f64, v_max: f64) -> f64 {
        let m = self.mass_ratio;
        let a = m * (1.0 + m);
        let b = -2.0 * m * (m * ball_v + paddle_v);
        let c = (m * ball_v + paddle_v) * (m * ball_v + paddle_v)
            - (m * ball_v * ball_v + paddle_v * paddle_v);

        let v = (-b + sgn * (b * b - 4.0 * a * c).sqrt()) / (2.0 * a);

        if v.abs() > v_max { sgn * v_max } else { v }
    }
}
