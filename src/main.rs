//! Drift Pong entry point
//!
//! Headless driver: runs a match of scripted rallies against the built-in
//! agent and prints a JSON summary. Rendering is whatever the sink does
//! with the notifications; the bundled sink just logs.
//!
//! Usage: drift-pong [RALLIES] [SEED] [--step | --time-scale FACTOR]

use std::io::BufRead;
use std::{env, process, thread, time::Duration};

use serde::Serialize;

use drift_pong::sim::{NullSink, RallyOutcome, RallyState, RenderSink, Session, Side, TickInput};
use drift_pong::SimConfig;

/// Sink that forwards rally results to the log
#[derive(Default)]
struct LogSink {
    outcomes: Vec<(RallyOutcome, Side)>,
}

impl RenderSink for LogSink {
    fn on_ball_moved(&mut self, _x: f64, _y: f64) {}

    fn on_trace_point(&mut self, _x: f64, _y: f64) {}

    fn on_rally_ended(&mut self, outcome: RallyOutcome, point_to: Side) {
        log::info!("rally ended: {outcome:?}, point to {point_to:?}");
        self.outcomes.push((outcome, point_to));
    }
}

#[derive(Serialize)]
struct RallyRecord {
    outcome: RallyOutcome,
    point_to: Side,
}

#[derive(Serialize)]
struct MatchSummary {
    seed: u64,
    rallies: Vec<RallyRecord>,
    player_score: u8,
    agent_score: u8,
}

struct Options {
    rallies: u32,
    seed: u64,
    /// Real-time pacing factor; 0 runs flat out
    time_scale: f64,
    /// Advance one tick per Enter keypress
    step: bool,
}

fn parse_args() -> Options {
    let mut opts = Options {
        rallies: 5,
        seed: SimConfig::default().seed,
        time_scale: 0.0,
        step: false,
    };
    let mut positional = 0;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--step" => opts.step = true,
            "--time-scale" => {
                let value = args.next().and_then(|v| v.parse().ok());
                match value {
                    Some(v) => opts.time_scale = v,
                    None => usage_exit("--time-scale needs a number"),
                }
            }
            _ => {
                match (positional, arg.parse::<u64>()) {
                    (0, Ok(n)) => opts.rallies = n as u32,
                    (1, Ok(n)) => opts.seed = n,
                    _ => usage_exit(&format!("unexpected argument: {arg}")),
                }
                positional += 1;
            }
        }
    }
    opts
}

fn usage_exit(message: &str) -> ! {
    eprintln!("{message}");
    eprintln!("usage: drift-pong [RALLIES] [SEED] [--step | --time-scale FACTOR]");
    process::exit(2);
}

fn main() {
    env_logger::init();

    let opts = parse_args();
    let config = SimConfig::with_seed(opts.seed);
    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(err) => {
            log::error!("invalid configuration: {err}");
            process::exit(1);
        }
    };
    log::info!(
        "drift-pong starting: {} rallies, seed {}",
        opts.rallies,
        opts.seed
    );

    let mut sink = LogSink::default();
    let mut completed = 0u32;
    let stdin = std::io::stdin();

    while session.is_running() && completed < opts.rallies {
        let mut input = TickInput {
            time_scale: opts.time_scale,
            ..TickInput::default()
        };
        if !session.rally_live() {
            // Count the rally that just finished before serving the next
            if let Some(RallyState::Ended(Some(_))) = session.rally().map(|r| r.state()) {
                completed += 1;
                if completed >= opts.rallies {
                    break;
                }
            }
            input.new_serve = true;
        }

        session.tick(&input, &mut sink);

        if opts.step {
            // Manual pacing: one tick per line of input
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
        } else if input.time_scale > 0.0 {
            thread::sleep(Duration::from_secs_f64(
                session.config().tick * input.time_scale,
            ));
        }
    }

    // Drain the session cleanly so a final quit shows up in the log
    session.tick(
        &TickInput {
            quit: true,
            ..TickInput::default()
        },
        &mut NullSink,
    );

    let (player_score, agent_score) = session.scores();
    let summary = MatchSummary {
        seed: opts.seed,
        rallies: sink
            .outcomes
            .iter()
            .map(|&(outcome, point_to)| RallyRecord { outcome, point_to })
            .collect(),
        player_score,
        agent_score,
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("failed to serialize summary: {err}"),
    }
}
