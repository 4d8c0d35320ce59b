#![allow(non_snake_case)]

extern crate control_model;
#[macro_use]
extern crate log;
extern crate prelude;
extern crate serde;
extern crate sqp;
extern crate thiserror;
extern crate track;

use control_model::VehicleParameters;
use prelude::*;
use sqp::{NlpSolver, SolverOptions, SolverStatus, SqpSolver};

mod error;
pub use error::MpcError;

mod params;
pub use params::{FixedControllerParameters, RuntimeControllerParameters};

mod problem;
pub use problem::{Layout, MpcInputs, MpcProblem};

mod result;
pub use result::{SolveResult, SolveStatus};

/// Receding horizon contouring controller. Holds only configuration, so one instance can
/// serve any number of sequential or concurrent cycles.
pub struct ContouringMpc<S: NlpSolver = SqpSolver> {
    vehicle: VehicleParameters,
    fixed: FixedControllerParameters,
    solver: S,
}

impl ContouringMpc<SqpSolver> {
    pub fn new(vehicle: VehicleParameters, fixed: FixedControllerParameters) -> Self {
        ContouringMpc::with_solver(vehicle, fixed, SqpSolver::new())
    }
}

impl<S: NlpSolver> ContouringMpc<S> {
    pub fn with_solver(
        vehicle: VehicleParameters,
        fixed: FixedControllerParameters,
        solver: S,
    ) -> Self {
        ContouringMpc {
            vehicle,
            fixed,
            solver,
        }
    }

    pub fn vehicle(&self) -> &VehicleParameters {
        &self.vehicle
    }

    pub fn fixed(&self) -> &FixedControllerParameters {
        &self.fixed
    }

    pub fn horizon(&self) -> usize {
        self.fixed.horizon
    }

    /// Solves one cycle, warm started from `seed` when given.
    ///
    /// Solver failure is not an error: the result then has status `Infeasible` and holds the
    /// solver's last iterate. Errors are returned only for malformed inputs.
    pub fn solve(
        &self,
        inputs: &MpcInputs,
        seed: Option<&SolveResult>,
    ) -> Result<SolveResult, MpcError> {
        let _guard = flame::start_guard("mpc cycle");
        self.check(inputs, seed)?;

        let problem = flame::span_of("mpc build", || {
            MpcProblem::new(&self.vehicle, &self.fixed, inputs, seed)
        });
        let options = SolverOptions {
            max_iterations: self.fixed.max_iterations,
            tolerance: self.fixed.tolerance,
        };
        let output = self.solver.solve(&problem, &options);

        let status = match output.status {
            SolverStatus::Converged => SolveStatus::Success,
            failure => {
                warn!(
                    "mpc solve failed ({:?}) after {} iterations, constraint violation {:.3e}",
                    failure, output.iterations, output.constraint_violation
                );
                SolveStatus::Infeasible
            }
        };

        let result = flame::span_of("mpc extract", || {
            SolveResult::extract(
                problem.layout(),
                &output.z,
                &inputs.centreline,
                status,
                output.iterations,
            )
        });
        info!(
            "mpc {:?} in {} iterations ({}), objective {:.4}",
            status,
            output.iterations,
            if seed.is_some() { "warm" } else { "cold" },
            output.objective
        );
        Ok(result)
    }

    fn check(&self, inputs: &MpcInputs, seed: Option<&SolveResult>) -> Result<(), MpcError> {
        if self.fixed.horizon == 0 {
            return Err(MpcError::EmptyHorizon);
        }
        if !inputs.state.is_finite() {
            return Err(MpcError::NonFiniteState(inputs.state));
        }
        if !inputs.progress.is_finite() {
            return Err(MpcError::NonFiniteProgress(inputs.progress));
        }
        if !(inputs.max_error.is_finite() && inputs.max_error >= 0.0) {
            return Err(MpcError::InvalidMaxError(inputs.max_error));
        }
        if inputs.runtime.n < 1 {
            return Err(MpcError::InvalidExponent(inputs.runtime.n));
        }
        if let Some(name) = inputs.runtime.first_non_finite() {
            return Err(MpcError::NonFiniteWeight(name));
        }
        if !inputs.previous_command.is_finite() {
            return Err(MpcError::NonFiniteCommand);
        }
        if let Some(seed) = seed {
            let N = self.fixed.horizon;
            if seed.controls.len() != N
                || seed.states.len() != N + 1
                || seed.progress.len() != N + 1
            {
                return Err(MpcError::SeedHorizonMismatch {
                    expected: N,
                    found: seed.horizon(),
                });
            }
            if !seed.is_finite() {
                return Err(MpcError::NonFiniteSeed);
            }
        }
        Ok(())
    }
}
