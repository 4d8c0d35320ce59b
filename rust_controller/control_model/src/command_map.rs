// Maps normalised throttle and steer commands to road wheel angle and longitudinal force.

use prelude::*;

use crate::VehicleParameters;

/// Steering gain used by the prediction model in place of the speed dependent steering curve.
pub const RELAXED_STEERING_GAIN: float = 0.9;

/// Drivetrain efficiency used by the prediction model in place of the torque curve.
pub const RELAXED_DRIVE_EFFICIENCY: float = 0.6;

/// Empirical ratio between the engine rpm reported by the simulator and the rpm implied by
/// wheel speed and final drive.
const RPM_CALIBRATION: float = 4.5;

const THROTTLE_PENALTY_MEAN: float = 0.5;
const THROTTLE_PENALTY_STD_DEV: float = 0.0775;

/// How commands are converted into physical quantities.
///
/// `Stepped` follows the simulator's piecewise steering and torque curves and is used when
/// stepping a vehicle. `Relaxed` replaces both curves with constants and drops regenerative
/// braking so the prediction model stays smooth inside the optimiser. The two therefore
/// disagree by design: at most by the curve steps in steering gain and drive efficiency, and
/// by the regenerative braking force at exactly zero throttle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandMap {
    Stepped,
    Relaxed,
}

/// Components of the longitudinal force. All are magnitudes except `wheel`, which is signed
/// with the throttle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LongitudinalForces<T = float> {
    pub wheel: T,
    pub drag: T,
    pub rolling_resistance: T,
    pub regen_brake: T,
    pub throttle_penalty: T,
}

impl<T: Scalar> LongitudinalForces<T> {
    pub fn total(&self) -> T {
        self.wheel - self.drag - self.rolling_resistance - self.regen_brake - self.throttle_penalty
    }
}

impl CommandMap {
    /// Road wheel angle (rad) for a steering command.
    pub fn steer_angle<T: Scalar>(
        self,
        params: &VehicleParameters,
        steer: T,
        v_x: T,
        v_y: T,
    ) -> T {
        let gain = match self {
            CommandMap::Stepped => steering_gain(float::hypot(v_x.re(), v_y.re()) * 3.6),
            CommandMap::Relaxed => RELAXED_STEERING_GAIN,
        };
        deg2rad(steer * (params.max_steer * gain))
    }

    pub fn longitudinal_forces<T: Scalar>(
        self,
        params: &VehicleParameters,
        throttle: T,
        v_x: T,
    ) -> LongitudinalForces<T> {
        let (eta, regen_brake) = match self {
            CommandMap::Stepped => {
                let regen_brake = if throttle.re() == 0.0 {
                    params.regen_brake_accel * params.gravity * params.mass
                } else {
                    0.0
                };
                (drive_efficiency(engine_rpm(params, v_x.re())), regen_brake)
            }
            CommandMap::Relaxed => (RELAXED_DRIVE_EFFICIENCY, 0.0),
        };

        let wheel = throttle * (eta * params.max_torque * params.gear_ratio / params.wheel_radius);
        let drag = v_x.powi(2)
            * (0.5 * params.air_density * params.drag_coefficient * params.frontal_area);
        let rolling_resistance = params.rolling_coefficient * params.mass * params.gravity;

        LongitudinalForces {
            wheel,
            drag,
            rolling_resistance: constant(rolling_resistance),
            regen_brake: constant(regen_brake),
            throttle_penalty: carla_throttle_penalty(params, throttle),
        }
    }

    pub fn longitudinal_force<T: Scalar>(
        self,
        params: &VehicleParameters,
        throttle: T,
        v_x: T,
    ) -> T {
        self.longitudinal_forces(params, throttle, v_x).total()
    }
}

/// Steering curve of the simulator: gain on the maximum steering angle against speed (km/h).
pub fn steering_gain(speed_kmh: float) -> float {
    if speed_kmh < 20.0 {
        1.0
    } else if speed_kmh < 60.0 {
        0.9
    } else if speed_kmh < 120.0 {
        0.8
    } else {
        0.7
    }
}

/// Engine rpm estimated from the longitudinal velocity.
pub fn engine_rpm(params: &VehicleParameters, v_x: float) -> float {
    let wheel_rpm = v_x / params.wheel_circumference() * 60.0;
    wheel_rpm * params.gear_ratio * RPM_CALIBRATION
}

/// Torque curve of the simulator normalised to peak torque.
pub fn drive_efficiency(rpm: float) -> float {
    if rpm < 9000.0 {
        1.0
    } else if rpm < 9500.0 {
        0.88
    } else if rpm < 10_400.0 {
        0.81
    } else if rpm < 12_500.0 {
        0.71
    } else {
        0.675
    }
}

/// Force lost to the simulator's throttle response around half throttle, modelled as a
/// gaussian bump in the throttle command scaled by mass.
pub fn carla_throttle_penalty<T: Scalar>(params: &VehicleParameters, throttle: T) -> T {
    let sigma = THROTTLE_PENALTY_STD_DEV;
    let d = throttle - THROTTLE_PENALTY_MEAN;
    let scale = params.mass / (sigma * (2.0 * PI).sqrt());
    (d * d * (-0.5 / (sigma * sigma))).exp() * scale
}
