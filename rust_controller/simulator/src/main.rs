// Ignore this lint otherwise many warnings are generated for common mathematical notation
#![allow(non_snake_case)]

extern crate config;
extern crate control_model;
extern crate controller;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate prelude;
extern crate stats;
extern crate track;

mod closed_loop;
mod flame_merge;

use std::env;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use closed_loop::ClosedLoop;
use config::Config;

fn main() {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_FILE.to_string());
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    let real_time = config.simulator.real_time;
    let dt_duration = Duration::from_secs_f64(config.vehicle.ts);

    let mut sim = ClosedLoop::new(config);
    let n_steps = sim.steps();
    let mut solve_stats = stats::OnlineStats::new();
    let mut offset_stats = stats::OnlineStats::new();
    let mut failures = 0;

    for _ in 0..n_steps {
        let step_start = Instant::now();

        let step = match sim.step() {
            Ok(step) => step,
            Err(e) => {
                error!("simulation stopped: {}", e);
                break;
            }
        };
        solve_stats.add(step.solve_ms);
        offset_stats.add(step.offset.abs());
        if !step.success {
            failures += 1;
        }

        info!(
            "t {:.2}: controller took {:.1} ms over {} iterations",
            step.t, step.solve_ms, step.iterations
        );
        info!("State {:?}", step.state);
        info!("Control {:?}", step.command);

        let step_elapsed = step_start.elapsed();
        if let Some(step_remaining) = dt_duration.checked_sub(step_elapsed) {
            if real_time {
                thread::sleep(step_remaining);
            }
        } else {
            println!(
                "step missed deadline. took {:.1}ms.",
                step_elapsed.as_secs_f64() * 1e3
            );
        }
    }

    println!("Running stats (mean/ms, stdev/ms): {:?}", solve_stats);
    println!("Lateral offset (mean/m, stdev/m): {:?}", offset_stats);
    println!("{} of {} cycles without a plan", failures, n_steps);

    if let Err(e) = flame_merge::write_flame("flame-graph.html", "flame-profile.txt") {
        error!("unable to write flame graph: {}", e);
    }
}
