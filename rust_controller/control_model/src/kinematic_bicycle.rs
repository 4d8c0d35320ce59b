// Kinematic Bicycle Model from Rajesh Rajamani. Vehicle Dynamics and Control.

use prelude::*;

use crate::{integrate_pose, Command, CommandMap, VehicleModel, VehicleParameters, VehicleState};

/// Bicycle model without tyre slip. Lateral velocity and yaw rate follow directly from the
/// steering geometry, so only the longitudinal velocity carries dynamics.
#[derive(Clone, Copy, Debug)]
pub struct KinematicBicycle {
    params: VehicleParameters,
    command_map: CommandMap,
}

impl KinematicBicycle {
    pub fn new(params: VehicleParameters, command_map: CommandMap) -> KinematicBicycle {
        KinematicBicycle {
            params,
            command_map,
        }
    }

    pub fn params(&self) -> &VehicleParameters {
        &self.params
    }

    /// Forward Euler step over one sample period with yaw wrapped to (-PI, PI].
    pub fn predict<T: Scalar>(&self, x: &VehicleState<T>, u: &Command<T>) -> VehicleState<T> {
        let p = &self.params;
        let ts = p.ts;

        let Fx = self.command_map.longitudinal_force(p, u.throttle, x.v_x);
        let delta = self.command_map.steer_angle(p, u.steer, x.v_x, x.v_y);

        let (x_new, y_new) = integrate_pose(ts, x);
        let yaw_rate = x.v_x / p.wheelbase() * delta.tan();

        VehicleState {
            x: x_new,
            y: y_new,
            yaw: wrap_angle(x.yaw + yaw_rate * ts),
            v_x: x.v_x + Fx / p.mass * ts,
            v_y: yaw_rate * p.lr,
            yaw_rate,
        }
    }
}

impl VehicleModel for KinematicBicycle {
    fn name(&self) -> &'static str {
        "kinematic_bicycle"
    }

    fn step(&self, state: &VehicleState, command: &Command) -> VehicleState {
        self.predict(state, command)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn yaw_stays_wrapped() {
        let model = KinematicBicycle::new(VehicleParameters::default(), CommandMap::Stepped);
        let mut state = VehicleState::new(0.0, 0.0, 3.0, 10.0, 0.0, 0.0);
        for _ in 0..200 {
            state = model.step(&state, &Command::new(0.3, 0.8));
            assert!(state.yaw > -PI && state.yaw <= PI, "yaw {}", state.yaw);
        }
    }

    #[test]
    fn lateral_velocity_follows_yaw_rate() {
        let params = VehicleParameters::default();
        let model = KinematicBicycle::new(params, CommandMap::Stepped);
        // 4 m/s is below the first step of the steering curve.
        let state = VehicleState::new(0.0, 0.0, 0.0, 4.0, 0.0, 0.0);
        let next = model.step(&state, &Command::new(0.0, 0.3));

        let delta = (0.3_f64 * params.max_steer).to_radians();
        assert_relative_eq!(next.yaw_rate, 4.0 / params.wheelbase() * delta.tan(), epsilon = 1e-12);
        assert_relative_eq!(next.v_y, next.yaw_rate * params.lr, epsilon = 1e-12);
        assert_relative_eq!(next.yaw, next.yaw_rate * params.ts, epsilon = 1e-12);
    }

    #[test]
    fn step_is_deterministic() {
        let model = KinematicBicycle::new(VehicleParameters::default(), CommandMap::Stepped);
        let state = VehicleState::new(3.0, 1.0, -0.4, 12.0, 0.5, 0.2);
        let command = Command::new(-0.3, 0.1);
        let first = model.step(&state, &command);
        assert_eq!(first.to_array(), model.step(&state, &command).to_array());
    }
}
