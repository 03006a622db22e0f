//! Fixed-tick session orchestration
//!
//! One [`Session`] owns the human paddle, the agent, the score, and the
//! rally in play. Each `tick` advances one shared simulated time quantum in
//! a fixed order: input application, paddle velocity update, agent control
//! step, ball step. A single cooperative tick instead of free-running
//! periodic actors keeps runs replayable and testable without timing
//! flakiness.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::{ConfigError, SimConfig};

use super::agent::{AgentController, BallView};
use super::paddle::Paddle;
use super::rally::{Rally, RallyOutcome, RenderSink, Serve, Side};

/// Per-tick input from the controller boundary (pointer, sliders, buttons).
/// Applied atomically at the start of the next tick; command flags are
/// one-shot.
#[derive(Debug, Clone)]
pub struct TickInput {
    /// Target height for the human paddle's center (m)
    pub paddle_target_y: Option<f64>,
    /// Real-time pacing multiplier; never affects physics
    pub time_scale: f64,
    /// Agent reaction time (ms), applied at the next serve
    pub agent_react_ms: f64,
    pub toggle_trace: bool,
    pub new_serve: bool,
    pub restart: bool,
    pub quit: bool,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            paddle_target_y: None,
            time_scale: 1.0,
            agent_react_ms: 200.0,
            toggle_trace: false,
            new_serve: false,
            restart: false,
            quit: false,
        }
    }
}

/// A match: paddles and score persist across rallies
pub struct Session {
    config: SimConfig,
    rng: Pcg32,
    paddle: Paddle,
    agent: AgentController,
    rally: Option<Rally>,
    trace_on: bool,
    player_score: u8,
    agent_score: u8,
    running: bool,
}

impl Session {
    /// Build a session from a config, failing fast on invalid values
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let paddle = Paddle::new(config.paddle_x_init(), config.paddle_y_init(), &config);
        let agent = AgentController::new(&config);
        let rng = Pcg32::seed_from_u64(config.seed);
        Ok(Self {
            config,
            rng,
            paddle,
            agent,
            rally: None,
            trace_on: true,
            player_score: 0,
            agent_score: 0,
            running: true,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    pub fn agent(&self) -> &AgentController {
        &self.agent
    }

    pub fn rally(&self) -> Option<&Rally> {
        self.rally.as_ref()
    }

    pub fn scores(&self) -> (u8, u8) {
        (self.player_score, self.agent_score)
    }

    pub fn trace_on(&self) -> bool {
        self.trace_on
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn rally_live(&self) -> bool {
        self.rally.as_ref().is_some_and(|r| r.is_live())
    }

    /// Advance one tick: commands, paddle input, then the three scheduled
    /// steps in order
    pub fn tick(&mut self, input: &TickInput, sink: &mut dyn RenderSink) {
        if input.quit {
            self.running = false;
            log::info!("session quit at {} - {}", self.player_score, self.agent_score);
            return;
        }
        if input.toggle_trace {
            self.trace_on = !self.trace_on;
        }
        if input.restart {
            self.restart();
        }
        if input.new_serve {
            self.serve(input);
        }

        if let Some(target) = input.paddle_target_y {
            self.paddle.set_y(target);
        }

        // (a) human paddle velocity from this tick's position delta
        self.paddle.update_velocity(self.config.tick);

        // (b) agent control against the ball state of the previous tick
        if let Some(rally) = &self.rally
            && rally.is_live()
        {
            let b = rally.ball();
            self.agent.step(BallView {
                x: b.x(),
                y: b.y(),
                vx: b.vx(),
                vy: b.vy(),
            });
        }

        // (c) ball step
        if let Some(rally) = &mut self.rally
            && let Some(outcome) = rally.tick(&self.paddle, &self.agent, self.trace_on, sink)
        {
            self.award(outcome);
            self.paddle.freeze();
            self.agent.freeze();
        }
    }

    /// Launch a new rally with randomized serve conditions. Ignored while a
    /// rally is in play.
    fn serve(&mut self, input: &TickInput) {
        if self.rally_live() {
            return;
        }

        self.paddle.unfreeze();

        let r = self.config.serve;
        let serve = Serve {
            x: self.config.serve_x(),
            y: sample(&mut self.rng, r.y_min, r.y_max),
            loss: sample(&mut self.rng, r.loss_min, r.loss_max),
            speed: sample(&mut self.rng, r.speed_min, r.speed_max),
            angle_deg: sample(&mut self.rng, r.angle_min_deg, r.angle_max_deg),
        };
        log::info!(
            "serve: y0 = {:.3} m, v0 = {:.2} m/s, theta = {:.1} deg, loss = {:.2}",
            serve.y,
            serve.speed,
            serve.angle_deg,
            serve.loss
        );

        self.agent.attach(serve.y);
        self.agent.set_reaction_time(input.agent_react_ms);
        self.agent.unfreeze();

        self.rally = Some(Rally::new(&self.config, serve));
    }

    /// Interrupt the rally without awarding a point, clear the scores, and
    /// return the table to its pre-serve state
    fn restart(&mut self) {
        if let Some(rally) = &mut self.rally {
            rally.interrupt();
        }
        self.paddle.freeze();
        self.agent.freeze();
        self.rally = None;

        self.agent.rehome();
        self.paddle.unfreeze();
        self.player_score = 0;
        self.agent_score = 0;
        log::info!("match restarted");
    }

    fn award(&mut self, outcome: RallyOutcome) {
        let side = outcome.point_to();
        // Scoreboard saturates at 99
        match side {
            Side::Player => self.player_score = (self.player_score + 1).min(99),
            Side::Agent => self.agent_score = (self.agent_score + 1).min(99),
        }
        log::info!(
            "rally over: {outcome:?}, point to {side:?} ({} - {})",
            self.player_score,
            self.agent_score
        );
    }
}

/// Uniform sample that tolerates a pinned (min == max) range
fn sample(rng: &mut Pcg32, min: f64, max: f64) -> f64 {
    if max > min { rng.random_range(min..max) } else { min }
}
