//! Ball flight and rally termination
//!
//! A rally is one continuous point of play. Each tick the ball's state is
//! evaluated in closed form from the last trajectory reset, then checked
//! against the four collision surfaces in fixed priority order: floor,
//! agent plane, player plane, ceiling. A tick may trigger more than one
//! surface — later checks see the position and velocity already updated by
//! earlier ones, which is what makes corner hits (floor + paddle in the
//! same tick) come out right.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;

use super::agent::AgentController;
use super::collision::ReboundSolver;
use super::kinematics::Kinematics;
use super::paddle::Paddle;

/// Which side of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Agent,
}

/// Terminal reason for a rally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RallyOutcome {
    /// Ball passed the agent without contact
    OutLeft,
    /// Ball passed the player's paddle without contact
    OutRight,
    /// Ball cleared the ceiling, last struck by the agent
    CeilingByAgent,
    /// Ball cleared the ceiling, last struck by the player
    CeilingByPlayer,
    /// Ball died on the floor, last struck by the agent
    EnergyExhaustedByAgent,
    /// Ball died on the floor, last struck by the player
    EnergyExhaustedByPlayer,
}

impl RallyOutcome {
    /// Which side is awarded the point: always the side that did not commit
    /// the fault
    pub fn point_to(self) -> Side {
        match self {
            RallyOutcome::OutLeft
            | RallyOutcome::CeilingByAgent
            | RallyOutcome::EnergyExhaustedByAgent => Side::Player,
            RallyOutcome::OutRight
            | RallyOutcome::CeilingByPlayer
            | RallyOutcome::EnergyExhaustedByPlayer => Side::Agent,
        }
    }
}

/// Rally lifecycle. Termination is permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RallyState {
    /// Ball in free flight
    Flight,
    /// Rally over; `None` means externally interrupted, no point awarded
    Ended(Option<RallyOutcome>),
}

/// Initial conditions for one rally
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Serve {
    /// Ball center at launch (m)
    pub x: f64,
    pub y: f64,
    /// Launch speed (m/s)
    pub speed: f64,
    /// Launch angle above horizontal (degrees)
    pub angle_deg: f64,
    /// Floor-bounce energy loss factor for this rally
    pub loss: f64,
}

/// Receiver for per-tick simulation notifications. Calls are
/// fire-and-forget: the core never waits on the renderer.
pub trait RenderSink {
    fn on_ball_moved(&mut self, x: f64, y: f64);
    fn on_trace_point(&mut self, x: f64, y: f64);
    fn on_rally_ended(&mut self, outcome: RallyOutcome, point_to: Side);
}

/// Sink that ignores everything, for headless runs and tests
#[derive(Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn on_ball_moved(&mut self, _x: f64, _y: f64) {}
    fn on_trace_point(&mut self, _x: f64, _y: f64) {}
    fn on_rally_ended(&mut self, _outcome: RallyOutcome, _point_to: Side) {}
}

/// The ball: closed-form trajectory state plus physical constants
#[derive(Debug, Clone)]
pub struct Ball {
    /// Position at the start of the current free-flight segment
    origin: DVec2,
    /// Velocity at the start of the current free-flight segment
    launch_vel: DVec2,
    /// Elapsed time since the segment began
    t: f64,
    pos: DVec2,
    vel: DVec2,
    radius: f64,
    mass: f64,
    loss: f64,
}

impl Ball {
    fn new(serve: &Serve, config: &SimConfig) -> Self {
        let theta = serve.angle_deg.to_radians();
        let origin = DVec2::new(serve.x, serve.y);
        let launch_vel = DVec2::new(serve.speed * theta.cos(), serve.speed * theta.sin());
        Self {
            origin,
            launch_vel,
            t: 0.0,
            pos: origin,
            vel: launch_vel,
            radius: config.ball_radius,
            mass: config.ball_mass,
            loss: serve.loss,
        }
    }

    /// Re-anchor the trajectory to a new origin and velocity at t = 0
    fn reset(&mut self, origin: DVec2, vel: DVec2) {
        self.origin = origin;
        self.launch_vel = vel;
        self.t = 0.0;
    }

    pub fn x(&self) -> f64 {
        self.pos.x
    }

    pub fn y(&self) -> f64 {
        self.pos.y
    }

    pub fn vx(&self) -> f64 {
        self.vel.x
    }

    pub fn vy(&self) -> f64 {
        self.vel.y
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn loss(&self) -> f64 {
        self.loss
    }
}

/// One point of play from serve to termination
#[derive(Debug, Clone)]
pub struct Rally {
    config: SimConfig,
    kin: Kinematics,
    solver: ReboundSolver,
    ball: Ball,
    state: RallyState,
    /// Every sample of the flight path, kept so a renderer can re-display
    /// the trace after a toggle
    trace: Vec<DVec2>,
}

impl Rally {
    pub fn new(config: &SimConfig, serve: Serve) -> Self {
        Self {
            config: config.clone(),
            kin: Kinematics::new(config),
            solver: ReboundSolver::new(config),
            ball: Ball::new(&serve, config),
            state: RallyState::Flight,
            trace: Vec::new(),
        }
    }

    pub fn state(&self) -> RallyState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state == RallyState::Flight
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn trace(&self) -> &[DVec2] {
        &self.trace
    }

    /// End the rally externally, awarding no point
    pub fn interrupt(&mut self) {
        if self.state == RallyState::Flight {
            self.state = RallyState::Ended(None);
        }
    }

    /// Advance one tick. Returns the outcome if the rally terminated on
    /// this tick.
    pub fn tick(
        &mut self,
        paddle: &Paddle,
        agent: &AgentController,
        trace_on: bool,
        sink: &mut dyn RenderSink,
    ) -> Option<RallyOutcome> {
        if self.state != RallyState::Flight {
            return None;
        }

        let cfg = &self.config;
        let half_w = cfg.paddle_width / 2.0;
        let radius = self.ball.radius;

        // Closed-form state at the current elapsed time
        let mut x = self.ball.origin.x + self.kin.x_disp(self.ball.t, self.ball.launch_vel.x);
        let mut y = self.ball.origin.y + self.kin.y_disp(self.ball.t, self.ball.launch_vel.y);
        let mut vx = self.kin.x_vel(self.ball.t, self.ball.launch_vel.x);
        let mut vy = self.kin.y_vel(self.ball.t, self.ball.launch_vel.y);

        // 1. Floor: descending and bottom of ball at the surface
        if vy < 0.0 && y - radius <= 0.0 {
            let kex = 0.5 * self.ball.mass * vx * vx * (1.0 - self.ball.loss);
            let key = 0.5 * self.ball.mass * vy * vy * (1.0 - self.ball.loss);

            // On the floor there is no potential energy left to recover: a
            // ball below the kinetic threshold is done.
            if kex + key < cfg.ke_min {
                let outcome = if vx < 0.0 {
                    RallyOutcome::EnergyExhaustedByPlayer
                } else {
                    RallyOutcome::EnergyExhaustedByAgent
                };
                return self.finish(outcome, DVec2::new(x, y), DVec2::new(vx, vy), sink);
            }

            let mut v0x = (2.0 * kex / self.ball.mass).sqrt();
            let v0y = (2.0 * key / self.ball.mass).sqrt();
            if vx < 0.0 {
                v0x = -v0x;
            }

            self.ball.reset(DVec2::new(x, radius), DVec2::new(v0x, v0y));
            // Updated in place so a same-tick wall check sees the bounce
            y = radius;
            vx = v0x;
            vy = v0y;
            log::debug!("floor bounce at x = {x:.3}, residual speed ({v0x:.2}, {v0y:.2})");
        }

        // 2. Agent plane: moving left and the ball's left edge at the face
        let agent_paddle = agent.paddle();
        if vx < 0.0 && x - radius <= agent_paddle.x() + half_w {
            if agent_paddle.contact(agent_paddle.x() - half_w + radius, y, radius, true) {
                // Agent x-velocity is a fixed nominal kick; y uses the
                // planner's held velocity, damped
                let v0x = self.solver.horizontal(vx, cfg.agent_vx);
                let v0y = self
                    .solver
                    .vertical(vy, cfg.agent_vy_factor * agent.planned_vy());

                self.ball
                    .reset(DVec2::new(cfg.left_wall_x + radius, y), DVec2::new(v0x, v0y));
                x = self.ball.origin.x;
                vx = v0x;
                vy = v0y;
                log::debug!("agent return at y = {y:.3}, v = ({v0x:.2}, {v0y:.2})");
            } else {
                return self.finish(
                    RallyOutcome::OutLeft,
                    DVec2::new(x, y),
                    DVec2::new(vx, vy),
                    sink,
                );
            }
        }

        // 3. Player plane: symmetric to the agent check
        if vx > 0.0 && x + radius >= paddle.x() - half_w {
            if paddle.contact(paddle.x() + half_w - radius, y, radius, false) {
                let v0x = self.solver.horizontal(vx, cfg.paddle_vx);
                let v0y = self.solver.vertical(vy, cfg.player_vy_factor * paddle.vy());

                self.ball.reset(
                    DVec2::new(paddle.x() - half_w - radius, y),
                    DVec2::new(v0x, v0y),
                );
                x = self.ball.origin.x;
                vx = v0x;
                vy = v0y;
                log::debug!("player return at y = {y:.3}, v = ({v0x:.2}, {v0y:.2})");
            } else {
                return self.finish(
                    RallyOutcome::OutRight,
                    DVec2::new(x, y),
                    DVec2::new(vx, vy),
                    sink,
                );
            }
        }

        // 4. Ceiling: ascending and top of ball past the table height
        if vy > 0.0 && y + radius >= cfg.table_height {
            let outcome = if vx < 0.0 {
                RallyOutcome::CeilingByPlayer
            } else {
                RallyOutcome::CeilingByAgent
            };
            return self.finish(outcome, DVec2::new(x, y), DVec2::new(vx, vy), sink);
        }

        self.ball.pos = DVec2::new(x, y);
        self.ball.vel = DVec2::new(vx, vy);
        log::trace!("t: {:.2} x: {x:.2} y: {y:.2} vx: {vx:.2} vy: {vy:.2}", self.ball.t);

        sink.on_ball_moved(x, y);
        self.trace.push(self.ball.pos);
        if trace_on {
            sink.on_trace_point(x, y);
        }

        self.ball.t += cfg.tick;
        None
    }

    fn finish(
        &mut self,
        outcome: RallyOutcome,
        pos: DVec2,
        vel: DVec2,
        sink: &mut dyn RenderSink,
    ) -> Option<RallyOutcome> {
        self.ball.pos = pos;
        self.ball.vel = vel;
        self.state = RallyState::Ended(Some(outcome));
        sink.on_rally_ended(outcome, outcome.point_to());
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::agent::AgentController;

    fn fixtures() -> (SimConfig, Paddle, AgentController) {
        let config = SimConfig::default();
        let paddle = Paddle::new(config.paddle_x_init(), config.paddle_y_init(), &config);
        let agent = AgentController::new(&config);
        (config, paddle, agent)
    }

    fn run_until_end(
        rally: &mut Rally,
        paddle: &Paddle,
        agent: &AgentController,
        max_ticks: usize,
    ) -> Option<RallyOutcome> {
        let mut sink = NullSink;
        for _ in 0..max_ticks {
            if let Some(outcome) = rally.tick(paddle, agent, false, &mut sink) {
                return Some(outcome);
            }
        }
        None
    }

    #[test]
    fn test_outcome_point_mapping() {
        assert_eq!(RallyOutcome::OutLeft.point_to(), Side::Player);
        assert_eq!(RallyOutcome::OutRight.point_to(), Side::Agent);
        assert_eq!(RallyOutcome::CeilingByAgent.point_to(), Side::Player);
        assert_eq!(RallyOutcome::CeilingByPlayer.point_to(), Side::Agent);
        assert_eq!(RallyOutcome::EnergyExhaustedByAgent.point_to(), Side::Player);
        assert_eq!(RallyOutcome::EnergyExhaustedByPlayer.point_to(), Side::Agent);
    }

    #[test]
    fn test_floor_bounce_scales_energy_exactly() {
        let (config, paddle, agent) = fixtures();
        let serve = Serve {
            x: config.serve_x(),
            y: 0.76,
            speed: 5.0,
            angle_deg: 0.0,
            loss: 0.2,
        };
        let mut rally = Rally::new(&config, serve);
        let mut sink = NullSink;

        // Tick until just before the bounce, recording the pre-bounce
        // velocity, then across it.
        let mut pre = (0.0, 0.0);
        let mut post = None;
        for _ in 0..200 {
            rally.tick(&paddle, &agent, false, &mut sink);
            let b = rally.ball();
            if b.vy() > 0.0 {
                post = Some((b.vx(), b.vy()));
                break;
            }
            pre = (b.vx(), b.vy());
        }
        let (pre_vx, pre_vy) = pre;
        let (post_vx, post_vy) = post.expect("ball never bounced");

        // The bounce consumed the tick's closed-form update, so compare
        // against the state the bounce actually saw: one tick past `pre`.
        // Energy per axis is exactly (1 - loss) x the pre-bounce energy.
        let kin = Kinematics::new(&config);
        let seen_vx = kin.x_vel(config.tick, pre_vx);
        let seen_vy = kin.y_vel(config.tick, pre_vy);
        let expect_vx = (seen_vx * seen_vx * (1.0 - 0.2)).sqrt();
        let expect_vy = (seen_vy * seen_vy * (1.0 - 0.2)).sqrt();
        assert!((post_vx - expect_vx).abs() < 1e-9, "vx {post_vx} vs {expect_vx}");
        assert!((post_vy - expect_vy).abs() < 1e-9, "vy {post_vy} vs {expect_vy}");
        // Energy never increases across a bounce
        assert!(post_vx.hypot(post_vy) <= seen_vx.hypot(seen_vy));
        // Direction of travel is preserved
        assert!(post_vx > 0.0);
    }

    #[test]
    fn test_total_loss_ends_rally_on_first_floor_contact() {
        let (config, paddle, agent) = fixtures();
        let serve = Serve {
            x: 1.0,
            y: 0.5,
            speed: 3.0,
            angle_deg: -10.0,
            loss: 1.0,
        };
        let mut rally = Rally::new(&config, serve);
        let outcome = run_until_end(&mut rally, &paddle, &agent, 500).expect("rally must end");
        // Ball was moving right (agent's side last), so the player takes
        // the point
        assert_eq!(outcome, RallyOutcome::EnergyExhaustedByAgent);
        assert_eq!(outcome.point_to(), Side::Player);
        assert!(!rally.is_live());
    }

    #[test]
    fn test_frozen_far_agent_means_out_left() {
        let (config, paddle, mut agent) = fixtures();
        // Agent frozen near the floor; ball crosses the plane up high
        agent.attach(config.paddle_travel().0);
        let serve = Serve {
            x: 1.5,
            y: 1.45,
            speed: 5.0,
            angle_deg: 180.0,
            loss: 0.2,
        };
        let mut rally = Rally::new(&config, serve);
        let outcome = run_until_end(&mut rally, &paddle, &agent, 500).expect("rally must end");
        assert_eq!(outcome, RallyOutcome::OutLeft);
        assert_eq!(outcome.point_to(), Side::Player);
    }

    #[test]
    fn test_ceiling_attribution_by_direction() {
        let (config, paddle, agent) = fixtures();
        // Launched steeply up and to the right: agent's side last touched
        let serve = Serve {
            x: 0.5,
            y: 1.0,
            speed: 7.0,
            angle_deg: 80.0,
            loss: 0.2,
        };
        let mut rally = Rally::new(&config, serve);
        let outcome = run_until_end(&mut rally, &paddle, &agent, 500).expect("rally must end");
        assert_eq!(outcome, RallyOutcome::CeilingByAgent);
        assert_eq!(outcome.point_to(), Side::Player);
    }

    #[test]
    fn test_same_tick_floor_and_paddle_collision() {
        let (config, mut paddle, agent) = fixtures();
        // Paddle parked at the bottom of its travel so its face spans the
        // corner region
        paddle.place_y(config.paddle_travel().0);

        // Serve angled sharply down, landing right at the player's plane:
        // the floor bounce and the paddle rebound must both happen in one
        // tick, the paddle check seeing the post-bounce upward velocity.
        let serve = Serve {
            x: config.paddle_x_init() - config.paddle_width / 2.0 - config.ball_radius - 0.02,
            y: config.ball_radius + 0.001,
            speed: 5.0,
            angle_deg: -60.0,
            loss: 0.2,
        };
        let mut rally = Rally::new(&config, serve);
        let mut sink = NullSink;
        let mut out = None;
        for _ in 0..5 {
            out = rally.tick(&paddle, &agent, false, &mut sink);
            if out.is_some() || rally.ball().vy() > 0.0 {
                break;
            }
        }

        assert_eq!(out, None, "rally must survive the corner hit");
        let b = rally.ball();
        assert!(b.vy() > 0.0, "floor bounce must flip vy upward");
        assert!(b.vx() < 0.0, "paddle rebound must flip vx leftward");
        // Trajectory re-anchored just in front of the paddle face
        let expect_x = paddle.x() - config.paddle_width / 2.0 - config.ball_radius;
        assert!((b.x() - expect_x).abs() < 1e-12);
    }

    #[test]
    fn test_interrupt_awards_no_point_and_is_permanent() {
        let (config, paddle, agent) = fixtures();
        let serve = Serve {
            x: config.serve_x(),
            y: 0.76,
            speed: 5.0,
            angle_deg: 10.0,
            loss: 0.2,
        };
        let mut rally = Rally::new(&config, serve);
        let mut sink = NullSink;
        rally.tick(&paddle, &agent, false, &mut sink);
        rally.interrupt();
        assert_eq!(rally.state(), RallyState::Ended(None));

        // Frozen in place: further ticks are no-ops
        let pos = (rally.ball().x(), rally.ball().y());
        assert_eq!(rally.tick(&paddle, &agent, false, &mut sink), None);
        assert_eq!((rally.ball().x(), rally.ball().y()), pos);
    }

    #[test]
    fn test_trace_records_every_flight_sample() {
        let (config, paddle, agent) = fixtures();
        let serve = Serve {
            x: config.serve_x(),
            y: 0.76,
            speed: 5.0,
            angle_deg: 10.0,
            loss: 0.2,
        };
        let mut rally = Rally::new(&config, serve);
        let mut sink = NullSink;
        for _ in 0..25 {
            rally.tick(&paddle, &agent, false, &mut sink);
        }
        assert_eq!(rally.trace().len(), 25);
    }
}
