// Dynamic bicycle model with a linear tyre model, see "Online Learning of MPC for Autonomous
// Racing" by Costa et al.

use prelude::*;

use crate::{integrate_pose, Command, CommandMap, VehicleModel, VehicleParameters, VehicleState};

/// Added to the longitudinal velocity in the slip angle denominators.
const SLIP_EPSILON: float = 0.1;

#[derive(Clone, Copy, Debug)]
pub struct DynamicBicycle {
    params: VehicleParameters,
    command_map: CommandMap,
}

impl DynamicBicycle {
    pub fn new(params: VehicleParameters, command_map: CommandMap) -> DynamicBicycle {
        DynamicBicycle {
            params,
            command_map,
        }
    }

    pub fn params(&self) -> &VehicleParameters {
        &self.params
    }

    /// Longitudinal, lateral and yaw accelerations.
    pub fn accelerations<T: Scalar>(&self, x: &VehicleState<T>, u: &Command<T>) -> (T, T, T) {
        let p = &self.params;
        let (Cf, Cr) = (p.cornering_stiffness_front, p.cornering_stiffness_rear);

        let Fx = self.command_map.longitudinal_force(p, u.throttle, x.v_x);
        let delta = self.command_map.steer_angle(p, u.steer, x.v_x, x.v_y);

        let v_x_eps = x.v_x + SLIP_EPSILON;
        let theta_f = atan2(x.v_y + x.yaw_rate * p.lf, v_x_eps);
        let theta_r = atan2(x.v_y - x.yaw_rate * p.lr, v_x_eps);

        let Fyf = (delta - theta_f) * Cf;
        let Fyr = -theta_r * Cr;

        let (sin_delta, cos_delta) = (delta.sin(), delta.cos());
        let v_x_dot = (Fx - Fyf * sin_delta) / p.mass + x.v_y * x.yaw_rate;
        let v_y_dot = (Fyf * cos_delta + Fyr) / p.mass - x.v_x * x.yaw_rate;
        let yaw_accel = (Fyf * cos_delta * p.lf - Fyr * p.lr) / p.yaw_inertia;

        (v_x_dot, v_y_dot, yaw_accel)
    }

    /// Forward Euler step over one sample period. Yaw is left unwrapped.
    pub fn predict<T: Scalar>(&self, x: &VehicleState<T>, u: &Command<T>) -> VehicleState<T> {
        let ts = self.params.ts;
        let (v_x_dot, v_y_dot, yaw_accel) = self.accelerations(x, u);
        let (x_new, y_new) = integrate_pose(ts, x);

        VehicleState {
            x: x_new,
            y: y_new,
            yaw: x.yaw + x.yaw_rate * ts,
            v_x: x.v_x + v_x_dot * ts,
            v_y: x.v_y + v_y_dot * ts,
            yaw_rate: x.yaw_rate + yaw_accel * ts,
        }
    }
}

impl VehicleModel for DynamicBicycle {
    fn name(&self) -> &'static str {
        "dynamic_bicycle"
    }

    fn step(&self, state: &VehicleState, command: &Command) -> VehicleState {
        self.predict(state, command)
    }
}
