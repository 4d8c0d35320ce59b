#![allow(non_snake_case)]

#[macro_use]
extern crate log;
extern crate prelude;
extern crate thiserror;

use thiserror::Error;

use prelude::*;

mod constant_curvature;
pub use constant_curvature::ConstantCurvatureTrack;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("centreline polynomial has no coefficients")]
    Empty,
    #[error("centreline x polynomial has {x} coefficients but y polynomial has {y}")]
    DegreeMismatch { x: usize, y: usize },
    #[error("centreline polynomial is constant and has no tangent")]
    Constant,
    #[error("centreline {axis} coefficient {index} is not finite")]
    NonFinite { axis: char, index: usize },
}

/// Local approximation of the centreline over one lookahead window, as polynomials x(s) and
/// y(s) of the progress `s`. Coefficients are ordered from lowest to highest degree.
#[derive(Clone, Debug, PartialEq)]
pub struct CentrelinePolynomial {
    x_coeffs: Vec<float>,
    y_coeffs: Vec<float>,
    dx_coeffs: Vec<float>,
    dy_coeffs: Vec<float>,
}

/// Position and unnormalised tangent of the centreline at one progress value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CentrelinePoint<T = float> {
    pub x: T,
    pub y: T,
    pub dx_ds: T,
    pub dy_ds: T,
}

impl<T: Scalar> CentrelinePoint<T> {
    /// Lateral deviation of `(x, y)`, positive to the right of the direction of travel.
    pub fn contouring_error(&self, x: T, y: T) -> T {
        self.dy_ds * (x - self.x) - self.dx_ds * (y - self.y)
    }

    /// Deviation of `(x, y)` along the path, positive when the point lies behind.
    pub fn lag_error(&self, x: T, y: T) -> T {
        -self.dx_ds * (x - self.x) - self.dy_ds * (y - self.y)
    }
}

impl CentrelinePolynomial {
    pub fn new(x_coeffs: Vec<float>, y_coeffs: Vec<float>) -> Result<Self, TrackError> {
        if x_coeffs.is_empty() || y_coeffs.is_empty() {
            return Err(TrackError::Empty);
        }
        if x_coeffs.len() != y_coeffs.len() {
            return Err(TrackError::DegreeMismatch {
                x: x_coeffs.len(),
                y: y_coeffs.len(),
            });
        }
        if x_coeffs.len() < 2 {
            return Err(TrackError::Constant);
        }
        for (axis, coeffs) in [('x', &x_coeffs), ('y', &y_coeffs)].iter() {
            if let Some(index) = coeffs.iter().position(|c| !c.is_finite()) {
                return Err(TrackError::NonFinite { axis: *axis, index });
            }
        }

        let dx_coeffs = derivative(&x_coeffs);
        let dy_coeffs = derivative(&y_coeffs);
        Ok(CentrelinePolynomial {
            x_coeffs,
            y_coeffs,
            dx_coeffs,
            dy_coeffs,
        })
    }

    /// The straight line through `(x0, y0)` with direction `heading`, progress in metres.
    pub fn straight(x0: float, y0: float, heading: float) -> Self {
        let (dx, dy) = (heading.cos(), heading.sin());
        CentrelinePolynomial {
            x_coeffs: vec![x0, dx],
            y_coeffs: vec![y0, dy],
            dx_coeffs: vec![dx],
            dy_coeffs: vec![dy],
        }
    }

    pub fn degree(&self) -> usize {
        self.x_coeffs.len() - 1
    }

    pub fn x_coeffs(&self) -> &[float] {
        &self.x_coeffs
    }

    pub fn y_coeffs(&self) -> &[float] {
        &self.y_coeffs
    }

    pub fn position<T: Scalar>(&self, s: T) -> (T, T) {
        (horner(&self.x_coeffs, s), horner(&self.y_coeffs, s))
    }

    pub fn tangent<T: Scalar>(&self, s: T) -> (T, T) {
        (horner(&self.dx_coeffs, s), horner(&self.dy_coeffs, s))
    }

    /// Position and tangent evaluated at the same progress.
    pub fn point<T: Scalar>(&self, s: T) -> CentrelinePoint<T> {
        let (x, y) = self.position(s);
        let (dx_ds, dy_ds) = self.tangent(s);
        CentrelinePoint { x, y, dx_ds, dy_ds }
    }

    pub fn contouring_error<T: Scalar>(&self, s: T, x: T, y: T) -> T {
        self.point(s).contouring_error(x, y)
    }

    pub fn lag_error<T: Scalar>(&self, s: T, x: T, y: T) -> T {
        self.point(s).lag_error(x, y)
    }

    /// Contouring and lag error from a single evaluation of the centreline.
    pub fn errors<T: Scalar>(&self, s: T, x: T, y: T) -> (T, T) {
        let point = self.point(s);
        (point.contouring_error(x, y), point.lag_error(x, y))
    }

    /// Sum of squared contouring and lag errors.
    pub fn tracking_cost<T: Scalar>(&self, s: T, x: T, y: T) -> T {
        let (e_C, e_L) = self.errors(s, x, y);
        e_C * e_C + e_L * e_L
    }
}

fn derivative(coeffs: &[float]) -> Vec<float> {
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, &c)| c * k as float)
        .collect()
}

fn horner<T: Scalar>(coeffs: &[float], s: T) -> T {
    coeffs
        .iter()
        .rev()
        .fold(constant::<T>(0.0), |acc, &c| acc * s + c)
}
