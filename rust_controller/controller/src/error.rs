use thiserror::Error;

use control_model::VehicleState;
use prelude::*;
use track::TrackError;

/// Inputs rejected before a problem is built.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MpcError {
    #[error("controller horizon must be at least one step")]
    EmptyHorizon,
    #[error("vehicle state is not finite: {0:?}")]
    NonFiniteState(VehicleState),
    #[error("progress {0} is not finite")]
    NonFiniteProgress(float),
    #[error("maximum contouring error {0} must be finite and non-negative")]
    InvalidMaxError(float),
    #[error("contouring error exponent must be at least 1, got {0}")]
    InvalidExponent(i32),
    #[error("runtime weight {0} is not finite")]
    NonFiniteWeight(&'static str),
    #[error("previous command is not finite")]
    NonFiniteCommand,
    #[error("warm start has horizon {found} but the controller horizon is {expected}")]
    SeedHorizonMismatch { expected: usize, found: usize },
    #[error("warm start contains non-finite values")]
    NonFiniteSeed,
    #[error(transparent)]
    Track(#[from] TrackError),
}
