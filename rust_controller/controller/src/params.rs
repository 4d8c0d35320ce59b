use serde::Deserialize;

use prelude::*;

/// Controller constants that are part of the formulation rather than tuned per run.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FixedControllerParameters {
    /// Number of control steps N.
    pub horizon: usize,
    /// Weight of the terminal progress term.
    pub lambda_s: float,
    /// Lag error weight.
    pub alpha_L: float,
    /// Steepness of the soft speed limit.
    pub q_v_max: float,
    /// Longitudinal velocity above which the soft speed limit grows (m/s).
    pub v_max: float,
    pub max_iterations: usize,
    pub tolerance: float,
    /// Smallest progress made per step.
    pub min_progress_delta: float,
    pub max_steer_delta: float,
    pub max_throttle_delta: float,
    /// Largest drop in throttle command per step.
    pub max_throttle_decrease: float,
    /// Slack added to the contouring error bound.
    pub contouring_error_margin: float,
}

impl Default for FixedControllerParameters {
    fn default() -> Self {
        FixedControllerParameters {
            horizon: 10,
            lambda_s: 0.5,
            alpha_L: 1.0,
            q_v_max: 1.0,
            v_max: 25.0,
            max_iterations: 300,
            tolerance: 1e-4,
            min_progress_delta: 0.1,
            max_steer_delta: 0.1,
            max_throttle_delta: 0.2,
            max_throttle_decrease: 1.0,
            contouring_error_margin: 10.0,
        }
    }
}

/// Weights that may change between invocations.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeControllerParameters {
    /// Exponent of the contouring error cost.
    pub n: i32,
    pub q_v_y: float,
    pub alpha_c: float,
    /// Steering rate weight.
    pub beta_delta: float,
}

impl RuntimeControllerParameters {
    pub(crate) fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("q_v_y", self.q_v_y),
            ("alpha_c", self.alpha_c),
            ("beta_delta", self.beta_delta),
        ]
        .iter()
        .find(|(_, v)| !v.is_finite())
        .map(|&(name, _)| name)
    }
}

impl Default for RuntimeControllerParameters {
    fn default() -> Self {
        RuntimeControllerParameters {
            n: 2,
            q_v_y: 1.0,
            alpha_c: 10.0,
            beta_delta: 10.0,
        }
    }
}
