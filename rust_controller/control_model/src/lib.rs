#![allow(non_snake_case)]

extern crate prelude;
extern crate serde;

use serde::Deserialize;

use prelude::*;

mod command_map;
pub use command_map::{
    carla_throttle_penalty, drive_efficiency, engine_rpm, steering_gain, CommandMap,
    LongitudinalForces, RELAXED_DRIVE_EFFICIENCY, RELAXED_STEERING_GAIN,
};

mod dynamic_bicycle;
pub use dynamic_bicycle::DynamicBicycle;

mod kinematic_bicycle;
pub use kinematic_bicycle::KinematicBicycle;

mod params;
pub use params::VehicleParameters;

/// Pose and body frame velocities of the vehicle at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VehicleState<T = float> {
    pub x: T,
    pub y: T,
    pub yaw: T,
    pub v_x: T,
    pub v_y: T,
    pub yaw_rate: T,
}

pub const STATE_DIM: usize = 6;

impl<T: Copy> VehicleState<T> {
    pub fn to_array(&self) -> [T; STATE_DIM] {
        [self.x, self.y, self.yaw, self.v_x, self.v_y, self.yaw_rate]
    }

    /// Reads a state from the first six entries of `values`.
    pub fn from_slice(values: &[T]) -> VehicleState<T> {
        VehicleState {
            x: values[0],
            y: values[1],
            yaw: values[2],
            v_x: values[3],
            v_y: values[4],
            yaw_rate: values[5],
        }
    }

    pub fn map<U, F: Fn(T) -> U>(&self, f: F) -> VehicleState<U> {
        VehicleState {
            x: f(self.x),
            y: f(self.y),
            yaw: f(self.yaw),
            v_x: f(self.v_x),
            v_y: f(self.v_y),
            yaw_rate: f(self.yaw_rate),
        }
    }
}

impl VehicleState {
    pub fn new(x: float, y: float, yaw: float, v_x: float, v_y: float, yaw_rate: float) -> Self {
        VehicleState {
            x,
            y,
            yaw,
            v_x,
            v_y,
            yaw_rate,
        }
    }

    pub fn lift<T: Scalar>(&self) -> VehicleState<T> {
        self.map(constant::<T>)
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Normalised actuator command. Both components lie in [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Command<T = float> {
    pub throttle: T,
    pub steer: T,
}

impl Command {
    pub fn new(throttle: float, steer: float) -> Self {
        Command { throttle, steer }
    }

    pub fn lift<T: Scalar>(&self) -> Command<T> {
        Command {
            throttle: constant(self.throttle),
            steer: constant(self.steer),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.throttle.is_finite() && self.steer.is_finite()
    }
}

/// One step state update shared by every model fidelity.
pub trait VehicleModel {
    fn name(&self) -> &'static str;

    fn step(&self, state: &VehicleState, command: &Command) -> VehicleState;
}

/// Selects which vehicle model advances the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fidelity {
    /// Force balance with linear tyre slip.
    Dynamic,
    /// No lateral dynamics; yaw rate follows from the steering geometry.
    Kinematic,
}

impl Fidelity {
    pub fn model(
        self,
        params: VehicleParameters,
        command_map: CommandMap,
    ) -> Box<dyn VehicleModel + Send + Sync> {
        match self {
            Fidelity::Dynamic => Box::new(DynamicBicycle::new(params, command_map)),
            Fidelity::Kinematic => Box::new(KinematicBicycle::new(params, command_map)),
        }
    }
}

impl Default for Fidelity {
    fn default() -> Self {
        Fidelity::Dynamic
    }
}

/// Integrates the pose over one sample period from body frame velocities.
fn integrate_pose<T: Scalar>(ts: float, x: &VehicleState<T>) -> (T, T) {
    let (sin_yaw, cos_yaw) = (x.yaw.sin(), x.yaw.cos());
    let x_new = x.x + (x.v_x * cos_yaw - x.v_y * sin_yaw) * ts;
    let y_new = x.y + (x.v_x * sin_yaw + x.v_y * cos_yaw) * ts;
    (x_new, y_new)
}
