use std::time::Instant;

use config::Config;
use control_model::{Command, CommandMap, VehicleModel, VehicleState};
use controller::{ContouringMpc, MpcError, MpcInputs, SolveResult};
use prelude::*;
use track::{CentrelinePoint, ConstantCurvatureTrack};

/// What happened during one sample period.
#[derive(Clone, Copy, Debug)]
pub struct Step {
    pub t: float,
    /// State at the end of the period.
    pub state: VehicleState,
    pub command: Command,
    /// Lateral offset from the centreline at the end of the period, positive to the left.
    pub offset: float,
    pub success: bool,
    pub iterations: usize,
    pub solve_ms: float,
}

/// The controller driving a simulated vehicle around a constant curvature track.
pub struct ClosedLoop {
    config: Config,
    track: ConstantCurvatureTrack,
    mpc: ContouringMpc,
    plant: Box<dyn VehicleModel + Send + Sync>,
    state: VehicleState,
    command: Command,
    // Last successful plan with the centreline point its progress is measured from.
    seed: Option<(CentrelinePoint, SolveResult)>,
    t: float,
}

impl ClosedLoop {
    /// Starts on the centreline origin heading along the track, displaced sideways by the
    /// configured offset.
    pub fn new(config: Config) -> ClosedLoop {
        let sim = &config.simulator;
        let track = ConstantCurvatureTrack::new(sim.curvature, sim.window_degree);
        let mpc = ContouringMpc::new(config.vehicle, config.fixed);
        let plant = sim.fidelity.model(config.vehicle, CommandMap::Stepped);
        let state = VehicleState::new(0.0, sim.initial_offset, 0.0, sim.initial_speed, 0.0, 0.0);
        info!(
            "closed loop with {} plant, curvature {}, horizon {}",
            plant.name(),
            sim.curvature,
            config.fixed.horizon
        );

        ClosedLoop {
            config,
            track,
            mpc,
            plant,
            state,
            command: Command::default(),
            seed: None,
            t: 0.0,
        }
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Number of sample periods in the configured run time.
    pub fn steps(&self) -> usize {
        (self.config.simulator.t / self.config.vehicle.ts).round() as usize
    }

    pub fn step(&mut self) -> Result<Step, MpcError> {
        let origin = self.track.nearest(self.state.x, self.state.y);
        let inputs = MpcInputs {
            state: self.state,
            progress: 0.0,
            centreline: self.track.window(self.state.x, self.state.y)?,
            max_error: self.config.simulator.max_error,
            runtime: self.config.runtime,
            previous_command: self.command,
        };

        // Each window starts at the point nearest the vehicle, so the previous plan's progress
        // is moved back by the distance between the two window origins.
        let track = &self.track;
        let seed = self.seed.take().map(|(previous_origin, mut result)| {
            let shift = track.arc_length(&previous_origin, &origin);
            for s in &mut result.progress {
                *s -= shift;
            }
            result
        });

        let solve_start = Instant::now();
        let result = self.mpc.solve(&inputs, seed.as_ref())?;
        let solve_ms = solve_start.elapsed().as_secs_f64() * 1e3;

        let success = result.is_success();
        let iterations = result.iterations;
        self.command = match result.command() {
            Some(command) => {
                self.seed = Some((origin, result));
                command
            }
            None => {
                warn!("no plan at t = {:.2}, coasting and holding steer", self.t);
                Command::new(0.0, self.command.steer)
            }
        };

        self.state = self.plant.step(&self.state, &self.command);
        self.t += self.config.vehicle.ts;

        Ok(Step {
            t: self.t,
            state: self.state,
            command: self.command,
            offset: self.track.offset(self.state.x, self.state.y),
            success,
            iterations,
            solve_ms,
        })
    }
}
