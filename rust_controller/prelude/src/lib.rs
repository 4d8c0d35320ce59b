pub extern crate flame;
pub extern crate nalgebra;
pub extern crate num_dual;

use num_dual::DualNum;

#[allow(non_camel_case_types)]
pub type float = f64;
pub use std::f64::consts::PI;
pub use std::f64::{INFINITY, NEG_INFINITY};

pub use num_dual::{Dual64, HyperDual64};

/// A scalar the vehicle and cost models can be evaluated with: plain `float` values or
/// forward-mode dual numbers carrying a directional derivative.
pub trait Scalar: DualNum<float> + Copy {}

impl<T: DualNum<float> + Copy> Scalar for T {}

pub fn constant<T: Scalar>(value: float) -> T {
    T::from(value)
}

pub fn min<T: Copy + PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

pub fn max<T: Copy + PartialOrd>(a: T, b: T) -> T {
    if b > a {
        b
    } else {
        a
    }
}

/// Four quadrant arctangent of `y / x`.
///
/// Branches are chosen on the real parts so the derivative carried by a dual number is that
/// of the branch containing the evaluation point.
pub fn atan2<T: Scalar>(y: T, x: T) -> T {
    let (y_re, x_re) = (y.re(), x.re());
    if x_re > 0.0 {
        (y / x).atan()
    } else if x_re < 0.0 {
        if y_re >= 0.0 {
            (y / x).atan() + PI
        } else {
            (y / x).atan() - PI
        }
    } else if y_re > 0.0 {
        -(x / y).atan() + PI / 2.0
    } else if y_re < 0.0 {
        -(x / y).atan() - PI / 2.0
    } else {
        constant(0.0)
    }
}

/// Wraps an angle into (-PI, PI].
pub fn wrap_angle<T: Scalar>(a: T) -> T {
    atan2(a.sin(), a.cos())
}

pub fn deg2rad<T: Scalar>(deg: T) -> T {
    deg * (PI / 180.0)
}

/// Largest absolute value in a slice, zero for an empty slice.
pub fn max_abs(values: &[float]) -> float {
    values.iter().fold(0.0, |acc, &v| max(acc, v.abs()))
}
