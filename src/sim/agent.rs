//! Computer-controlled paddle: interception predictor and velocity planner
//!
//! The agent drives a [`Paddle`] it owns (composition, not inheritance, so
//! the predictor stays independently testable). Its plan is recomputed only
//! once every `delay_ticks` ticks — the configured reaction time — and held
//! constant in between (zero-order hold). Every tick the paddle advances by
//! the planned velocity regardless of whether the plan was refreshed.

use crate::config::SimConfig;

use super::paddle::Paddle;

/// Ball state sampled for the predictor, in table coordinates
#[derive(Debug, Clone, Copy)]
pub struct BallView {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

/// Time until a ball at `x` moving at `vx` reaches the agent's contact
/// plane, assuming constant horizontal speed. `None` when the ball is not
/// approaching (moving right or holding still).
pub fn predict_time(ball_x: f64, ball_vx: f64, contact_plane_x: f64) -> Option<f64> {
    if ball_vx >= 0.0 {
        None
    } else {
        Some((ball_x - contact_plane_x) / -ball_vx)
    }
}

/// Height the ball will have after `time` seconds at constant y-speed,
/// clamped to the paddle's travel range.
pub fn predict_y(ball_y: f64, ball_vy: f64, time: f64, travel: (f64, f64)) -> f64 {
    (ball_y + time * ball_vy).clamp(travel.0, travel.1)
}

/// The computer opponent defending the left wall
#[derive(Debug, Clone)]
pub struct AgentController {
    paddle: Paddle,
    /// Ticks between plan recomputations, always >= 1
    delay_ticks: u32,
    counter: u32,
    planned_vy: f64,
    max_speed: f64,
    home_y: f64,
    contact_plane_x: f64,
    travel: (f64, f64),
    tick: f64,
}

impl AgentController {
    /// Agent at its home position, frozen, reacting instantly until
    /// configured otherwise
    pub fn new(config: &SimConfig) -> Self {
        let mut paddle = Paddle::new(config.agent_x_init(), config.paddle_y_init(), config);
        paddle.freeze();
        Self {
            paddle,
            delay_ticks: 1,
            counter: 0,
            planned_vy: 0.0,
            max_speed: config.agent_max_speed,
            home_y: config.paddle_y_init(),
            contact_plane_x: config.agent_contact_plane(),
            travel: config.paddle_travel(),
            tick: config.tick,
        }
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    /// Velocity the planner is currently holding; this, not the paddle's
    /// finite-difference velocity, is what a collision sees
    pub fn planned_vy(&self) -> f64 {
        self.planned_vy
    }

    pub fn delay_ticks(&self) -> u32 {
        self.delay_ticks
    }

    /// Convert a reaction time in milliseconds to a recompute interval
    pub fn set_reaction_time(&mut self, millis: f64) {
        self.delay_ticks = ((millis / (1000.0 * self.tick)).round() as u32).max(1);
    }

    /// Align the paddle with a fresh serve without imparting velocity
    pub fn attach(&mut self, ball_y: f64) {
        self.paddle.place_y(ball_y);
        self.counter = 0;
    }

    /// Re-home to table center (used on restart)
    pub fn rehome(&mut self) {
        self.paddle.place_y(self.home_y);
        self.counter = 0;
    }

    pub fn unfreeze(&mut self) {
        self.paddle.unfreeze();
    }

    /// Freeze also zeroes the plan so the agent does not lurch on the next
    /// unfreeze
    pub fn freeze(&mut self) {
        self.paddle.freeze();
        self.planned_vy = 0.0;
    }

    /// One control tick: refresh the plan if the reaction counter wrapped,
    /// then advance the paddle by the held velocity.
    pub fn step(&mut self, ball: BallView) {
        if self.paddle.is_frozen() {
            return;
        }

        if self.counter % self.delay_ticks == self.delay_ticks - 1 {
            self.replan(ball);
        }

        let y = self.paddle.y();
        self.paddle.set_y(y + self.tick * self.planned_vy);

        self.counter = (self.counter + 1) % self.delay_ticks;
    }

    fn replan(&mut self, ball: BallView) {
        let current_y = self.paddle.y();
        match predict_time(ball.x, ball.vx, self.contact_plane_x) {
            // Ball receding: drift home to the table center
            None => {
                self.planned_vy = self.max_speed * (self.home_y - current_y);
            }
            Some(time_to_collision) => {
                let target = predict_y(ball.y, ball.vy, time_to_collision, self.travel);
                let sgn = if target >= current_y { 1.0 } else { -1.0 };
                self.planned_vy = sgn
                    * self
                        .max_speed
                        .min(((target - current_y) / time_to_collision).abs());
            }
        }
        log::trace!(
            "agent replan: vy = {:.3} (delay {} ticks)",
            self.planned_vy,
            self.delay_ticks
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> AgentController {
        AgentController::new(&SimConfig::default())
    }

    #[test]
    fn test_predict_time_requires_approach() {
        let plane = 0.1127;
        assert_eq!(predict_time(1.0, 5.0, plane), None);
        assert_eq!(predict_time(1.0, 0.0, plane), None);
        let t = predict_time(1.1127, -2.0, plane).unwrap();
        assert!((t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_predict_y_clamps_to_travel() {
        let travel = (0.1016, 1.4184);
        // Straight-line projection inside the table
        let y = predict_y(0.8, -1.0, 0.2, travel);
        assert!((y - 0.6).abs() < 1e-12);
        // Projection below the floor aims at the exact bottom of travel
        assert_eq!(predict_y(0.3, -5.0, 1.0, travel), travel.0);
        // Projection above the ceiling aims at the exact top
        assert_eq!(predict_y(1.0, 5.0, 1.0, travel), travel.1);
    }

    #[test]
    fn test_reaction_time_to_delay_ticks() {
        let mut a = agent();
        a.set_reaction_time(200.0);
        assert_eq!(a.delay_ticks(), 20);
        a.set_reaction_time(100.0);
        assert_eq!(a.delay_ticks(), 10);
        // Never below one tick
        a.set_reaction_time(0.0);
        assert_eq!(a.delay_ticks(), 1);
    }

    #[test]
    fn test_zero_order_hold_between_replans() {
        let mut a = agent();
        a.set_reaction_time(200.0);
        a.unfreeze();

        // Feed a ball whose state changes every tick; the plan may only
        // change on the recompute ticks.
        let mut changes = Vec::new();
        let mut last = a.planned_vy();
        for i in 0..60 {
            let ball = BallView {
                x: 1.5 - 0.01 * i as f64,
                y: 0.7,
                vx: -2.0 - 0.01 * i as f64,
                vy: 0.3,
            };
            a.step(ball);
            if a.planned_vy() != last {
                changes.push(i);
                last = a.planned_vy();
            }
        }
        assert_eq!(changes, vec![19, 39, 59]);
    }

    #[test]
    fn test_receding_ball_homes_to_center() {
        let config = SimConfig::default();
        let mut a = agent();
        a.unfreeze();
        a.attach(0.5);

        let ball = BallView {
            x: 1.0,
            y: 0.7,
            vx: 3.0,
            vy: 0.0,
        };
        a.step(ball);
        // Proportional homing velocity, pointed at the table center
        let expected = config.agent_max_speed * (config.paddle_y_init() - 0.5);
        assert!((a.planned_vy() - expected).abs() < 1e-6);
        assert!(a.planned_vy() > 0.0);
    }

    #[test]
    fn test_interception_speed_is_capped() {
        let config = SimConfig::default();
        let mut a = agent();
        a.unfreeze();
        a.attach(0.2);

        // Ball about to arrive far from the paddle: demanded speed exceeds
        // the cap
        let ball = BallView {
            x: 0.2,
            y: 1.3,
            vx: -5.0,
            vy: 0.0,
        };
        a.step(ball);
        assert_eq!(a.planned_vy(), config.agent_max_speed);
    }

    #[test]
    fn test_frozen_agent_does_not_move_or_plan() {
        let mut a = agent();
        let y0 = a.paddle().y();
        let ball = BallView {
            x: 0.5,
            y: 0.2,
            vx: -4.0,
            vy: 0.0,
        };
        a.step(ball);
        assert_eq!(a.paddle().y(), y0);
        assert_eq!(a.planned_vy(), 0.0);
    }

    #[test]
    fn test_freeze_zeroes_plan() {
        let mut a = agent();
        a.unfreeze();
        let ball = BallView {
            x: 0.5,
            y: 0.2,
            vx: -4.0,
            vy: 0.0,
        };
        a.step(ball);
        assert!(a.planned_vy() != 0.0);
        a.freeze();
        assert_eq!(a.planned_vy(), 0.0);
    }
}
