use control_model::{Command, VehicleState, STATE_DIM};
use prelude::*;
use track::CentrelinePolynomial;

use crate::Layout;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    Success,
    /// The solver failed. The trajectories hold its last iterate.
    Infeasible,
}

/// Predicted trajectory of one control cycle. Both statuses fill every field with the same
/// lengths: `horizon + 1` states and progress values, `horizon` of everything else.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub states: Vec<VehicleState>,
    pub controls: Vec<Command>,
    pub progress: Vec<float>,
    /// Contouring error at `(progress[i], states[i])`.
    pub contouring_errors: Vec<float>,
    pub lag_errors: Vec<float>,
    /// Solver iterations spent.
    pub iterations: usize,
}

impl SolveResult {
    pub(crate) fn extract(
        layout: &Layout,
        z: &[float],
        centreline: &CentrelinePolynomial,
        status: SolveStatus,
        iterations: usize,
    ) -> SolveResult {
        let N = layout.horizon();

        let states: Vec<_> = (0..=N)
            .map(|i| VehicleState::from_slice(&z[layout.state(i)..layout.state(i) + STATE_DIM]))
            .collect();
        let controls = (0..N)
            .map(|i| Command::new(z[layout.throttle(i)], z[layout.steer(i)]))
            .collect();
        let progress: Vec<_> = (0..=N).map(|i| z[layout.progress(i)]).collect();
        let (contouring_errors, lag_errors) = (0..N)
            .map(|i| centreline.errors(progress[i], states[i].x, states[i].y))
            .unzip();

        SolveResult {
            status,
            states,
            controls,
            progress,
            contouring_errors,
            lag_errors,
            iterations,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SolveStatus::Success
    }

    /// The command to apply now. Only a successful solve commits one.
    pub fn command(&self) -> Option<Command> {
        if self.is_success() {
            self.controls.first().cloned()
        } else {
            None
        }
    }

    pub fn horizon(&self) -> usize {
        self.controls.len()
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.states.iter().all(|x| x.is_finite())
            && self.controls.iter().all(|u| u.is_finite())
            && self.progress.iter().all(|s| s.is_finite())
    }
}
