use serde::Deserialize;

use prelude::*;

/// Physical constants of the vehicle.
///
/// Defaults describe the simulator's Tesla Model 3 blueprint: mass, drivetrain and
/// steering come from its physics control dump, the remaining values are estimates.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct VehicleParameters {
    /// Mass (kg).
    pub mass: float,
    /// Yaw moment of inertia (kg m^2).
    pub yaw_inertia: float,
    /// Distance from the centre of mass to the front axle (m).
    pub lf: float,
    /// Distance from the centre of mass to the rear axle (m).
    pub lr: float,
    /// Front axle cornering stiffness (N/rad).
    pub cornering_stiffness_front: float,
    /// Rear axle cornering stiffness (N/rad).
    pub cornering_stiffness_rear: float,
    /// Road wheel angle at full steering command (deg).
    pub max_steer: float,
    /// Peak engine torque (N m).
    pub max_torque: float,
    /// Final drive ratio.
    pub gear_ratio: float,
    /// Wheel radius (m).
    pub wheel_radius: float,
    /// Air density (kg/m^3).
    pub air_density: float,
    pub drag_coefficient: float,
    /// Frontal area (m^2).
    pub frontal_area: float,
    pub rolling_coefficient: float,
    pub gravity: float,
    /// Deceleration from regenerative braking at zero throttle, in multiples of g.
    pub regen_brake_accel: float,
    /// Highest speed the vehicle can reach (m/s).
    pub max_vel: float,
    /// Sample period of the discrete models (s).
    pub ts: float,
}

impl VehicleParameters {
    pub fn wheelbase(&self) -> float {
        self.lf + self.lr
    }

    pub fn wheel_circumference(&self) -> float {
        2.0 * PI * self.wheel_radius
    }
}

impl Default for VehicleParameters {
    fn default() -> Self {
        VehicleParameters {
            mass: 1845.0,
            yaw_inertia: 3000.0,
            lf: 1.4,
            lr: 1.6,
            cornering_stiffness_front: 50_000.0,
            cornering_stiffness_rear: 50_000.0,
            max_steer: 70.0,
            max_torque: 743.0,
            gear_ratio: 9.0,
            wheel_radius: 0.37,
            air_density: 1.225,
            drag_coefficient: 0.15,
            frontal_area: 2.22,
            rolling_coefficient: 0.015,
            gravity: 9.81,
            regen_brake_accel: 0.05,
            max_vel: 30.0,
            ts: 0.05,
        }
    }
}
