// Contouring MPC as a nonlinear program over controls, progress and states.

use control_model::{
    Command, CommandMap, DynamicBicycle, VehicleParameters, VehicleState, STATE_DIM,
};
use prelude::*;
use sqp::{Constraints, Nlp};
use track::CentrelinePolynomial;

use crate::{FixedControllerParameters, MpcError, RuntimeControllerParameters, SolveResult};

/// Position of each decision variable in the flat vector
///
/// ```text
/// [throttle_0, steer_0, ..., throttle_N-1, steer_N-1 | s_0 .. s_N | X_0 .. X_N]
/// ```
///
/// where each state `X_i` occupies `STATE_DIM` consecutive entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    horizon: usize,
}

impl Layout {
    pub fn new(horizon: usize) -> Layout {
        Layout { horizon }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn num_variables(&self) -> usize {
        2 * self.horizon + (self.horizon + 1) * (1 + STATE_DIM)
    }

    pub fn throttle(&self, i: usize) -> usize {
        2 * i
    }

    pub fn steer(&self, i: usize) -> usize {
        2 * i + 1
    }

    pub fn progress(&self, i: usize) -> usize {
        2 * self.horizon + i
    }

    /// First entry of state `i`.
    pub fn state(&self, i: usize) -> usize {
        3 * self.horizon + 1 + STATE_DIM * i
    }
}

/// Everything measured or chosen for one control cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct MpcInputs {
    pub state: VehicleState,
    /// Progress of the vehicle along `centreline`.
    pub progress: float,
    pub centreline: CentrelinePolynomial,
    /// Bound on the contouring error before the fixed margin is added.
    pub max_error: float,
    pub runtime: RuntimeControllerParameters,
    /// Command applied during the previous cycle, the reference for the first rate limit.
    pub previous_command: Command,
}

impl MpcInputs {
    pub fn from_coefficients(
        state: VehicleState,
        progress: float,
        x_coeffs: Vec<float>,
        y_coeffs: Vec<float>,
        max_error: float,
        runtime: RuntimeControllerParameters,
        previous_command: Command,
    ) -> Result<MpcInputs, MpcError> {
        Ok(MpcInputs {
            state,
            progress,
            centreline: CentrelinePolynomial::new(x_coeffs, y_coeffs)?,
            max_error,
            runtime,
            previous_command,
        })
    }
}

pub struct MpcProblem<'a> {
    layout: Layout,
    model: DynamicBicycle,
    vehicle: &'a VehicleParameters,
    fixed: &'a FixedControllerParameters,
    inputs: &'a MpcInputs,
    seed: Option<&'a SolveResult>,
}

impl<'a> MpcProblem<'a> {
    pub fn new(
        vehicle: &'a VehicleParameters,
        fixed: &'a FixedControllerParameters,
        inputs: &'a MpcInputs,
        seed: Option<&'a SolveResult>,
    ) -> MpcProblem<'a> {
        MpcProblem {
            layout: Layout::new(fixed.horizon),
            // Prediction uses the smooth command map.
            model: DynamicBicycle::new(*vehicle, CommandMap::Relaxed),
            vehicle,
            fixed,
            inputs,
            seed,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn state<T: Scalar>(&self, z: &[T], i: usize) -> VehicleState<T> {
        VehicleState::from_slice(&z[self.layout.state(i)..])
    }

    fn command<T: Scalar>(&self, z: &[T], i: usize) -> Command<T> {
        Command {
            throttle: z[self.layout.throttle(i)],
            steer: z[self.layout.steer(i)],
        }
    }

    fn max_progress_delta(&self) -> float {
        self.vehicle.ts * self.vehicle.max_vel
    }

    /// Constant velocity progress and a straight path along the current heading, with
    /// velocities and controls held.
    fn cold_start(&self, z: &mut [float]) {
        let L = &self.layout;
        let state = &self.inputs.state;
        let step = self.max_progress_delta();
        let (dx, dy) = (state.yaw.cos(), state.yaw.sin());

        for i in 1..=L.horizon() {
            let t = i as float;
            z[L.progress(i)] = self.inputs.progress + t * step;
            let seeded = VehicleState {
                x: state.x + dx * t * step / 5.0,
                y: state.y + dy * t * step / 5.0,
                ..*state
            };
            z[L.state(i)..L.state(i) + STATE_DIM].copy_from_slice(&seeded.to_array());
        }
    }

    fn warm_start(&self, seed: &SolveResult, z: &mut [float]) {
        let L = &self.layout;
        for (i, u) in seed.controls.iter().enumerate() {
            z[L.throttle(i)] = u.throttle;
            z[L.steer(i)] = u.steer;
        }
        for (i, (s, x)) in seed.progress.iter().zip(&seed.states).enumerate() {
            z[L.progress(i)] = *s;
            z[L.state(i)..L.state(i) + STATE_DIM].copy_from_slice(&x.to_array());
        }
    }
}

impl<'a> Nlp for MpcProblem<'a> {
    fn num_variables(&self) -> usize {
        self.layout.num_variables()
    }

    fn variable_bounds(&self) -> (Vec<float>, Vec<float>) {
        let L = &self.layout;
        let mut lower = vec![NEG_INFINITY; L.num_variables()];
        let mut upper = vec![INFINITY; L.num_variables()];
        for i in 0..L.horizon() {
            for &j in [L.throttle(i), L.steer(i)].iter() {
                lower[j] = -1.0;
                upper[j] = 1.0;
            }
        }
        (lower, upper)
    }

    fn initial_guess(&self) -> Vec<float> {
        let L = &self.layout;
        let mut z = vec![0.0; L.num_variables()];
        match self.seed {
            Some(seed) => self.warm_start(seed, &mut z),
            None => self.cold_start(&mut z),
        }

        // The seed's first entries describe the previous cycle.
        z[L.progress(0)] = self.inputs.progress;
        z[L.state(0)..L.state(0) + STATE_DIM].copy_from_slice(&self.inputs.state.to_array());
        z
    }

    fn objective<T: Scalar>(&self, z: &[T]) -> T {
        let L = &self.layout;
        let N = L.horizon();
        let fixed = self.fixed;
        let runtime = &self.inputs.runtime;
        let centreline = &self.inputs.centreline;
        let speed_limit = |v_x: T| ((v_x - fixed.v_max) * fixed.q_v_max).exp();

        let X = self.state(z, N);
        let (e_C, e_L) = centreline.errors(z[L.progress(N)], X.x, X.y);
        let mut J = -(e_C * e_C + e_L * e_L) * fixed.lambda_s
            + X.v_y * X.v_y * runtime.q_v_y
            + e_C.powi(runtime.n) * runtime.alpha_c
            + e_L * fixed.alpha_L
            + speed_limit(X.v_x);

        for i in 1..N {
            let X = self.state(z, i);
            let (e_C, e_L) = centreline.errors(z[L.progress(i)], X.x, X.y);
            let tracking = e_C * e_C + e_L * e_L;
            let steer_delta = z[L.steer(i)] - z[L.steer(i - 1)];
            J = J
                + tracking * tracking * runtime.q_v_y
                + e_C.powi(runtime.n) * runtime.alpha_c
                + e_L * fixed.alpha_L
                + steer_delta * steer_delta * runtime.beta_delta
                + speed_limit(X.v_x);
        }
        J
    }

    fn constraints<T: Scalar>(&self, z: &[T], c: &mut Constraints<T>) {
        let L = &self.layout;
        let N = L.horizon();
        let fixed = self.fixed;
        let inputs = self.inputs;

        c.equal(z[L.progress(0)], inputs.progress);
        for (k, &value) in inputs.state.to_array().iter().enumerate() {
            c.equal(z[L.state(0) + k], value);
        }

        let error_bound = inputs.max_error + fixed.contouring_error_margin;
        for i in 1..=N {
            let predicted = self.model.predict(&self.state(z, i - 1), &self.command(z, i - 1));
            let X = self.state(z, i);
            for (&x, &f) in X.to_array().iter().zip(predicted.to_array().iter()) {
                c.equal(x - f, 0.0);
            }

            let s = z[L.progress(i)];
            c.bounded(
                fixed.min_progress_delta,
                s - z[L.progress(i - 1)],
                self.max_progress_delta(),
            );
            c.bounded(
                -error_bound,
                inputs.centreline.contouring_error(s, X.x, X.y),
                error_bound,
            );
        }

        let mut previous = inputs.previous_command.lift::<T>();
        for i in 0..N {
            let u = self.command(z, i);
            c.bounded(
                -fixed.max_throttle_decrease,
                u.throttle - previous.throttle,
                fixed.max_throttle_delta,
            );
            c.bounded(
                -fixed.max_steer_delta,
                u.steer - previous.steer,
                fixed.max_steer_delta,
            );
            previous = u;
        }
    }
}
