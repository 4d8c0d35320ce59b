use prelude::*;

use crate::{CentrelinePoint, CentrelinePolynomial, TrackError};

/// Centreline of constant curvature starting at the origin heading along +x: a straight line
/// when the curvature is zero, otherwise a circle (positive curvature turns left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantCurvatureTrack {
    curvature: float,
    degree: usize,
}

impl ConstantCurvatureTrack {
    /// `degree` is the degree of the window polynomials and is raised to at least 1.
    pub fn new(curvature: float, degree: usize) -> ConstantCurvatureTrack {
        ConstantCurvatureTrack {
            curvature,
            degree: degree.max(1),
        }
    }

    pub fn curvature(&self) -> float {
        self.curvature
    }

    /// Closest centreline point to `(x, y)` with its unit tangent.
    pub fn nearest(&self, x: float, y: float) -> CentrelinePoint {
        let k = self.curvature;
        if k == 0.0 {
            return CentrelinePoint {
                x,
                y: 0.0,
                dx_ds: 1.0,
                dy_ds: 0.0,
            };
        }

        // Circle centred on (0, 1/k) parameterised by heading.
        let (cx, cy) = (0.0, 1.0 / k);
        let heading = float::atan2(k * (x - cx), -k * (y - cy));
        CentrelinePoint {
            x: cx + heading.sin() / k,
            y: cy - heading.cos() / k,
            dx_ds: heading.cos(),
            dy_ds: heading.sin(),
        }
    }

    /// Window polynomial about the centreline point nearest to `(x, y)`, with progress zero at
    /// that point. The coefficients are the Taylor expansion of the arc.
    pub fn window(&self, x: float, y: float) -> Result<CentrelinePolynomial, TrackError> {
        let origin = self.nearest(x, y);
        let heading = float::atan2(origin.dy_ds, origin.dx_ds);

        let mut x_coeffs = vec![origin.x];
        let mut y_coeffs = vec![origin.y];
        let mut factorial = 1.0;
        for k in 1..=self.degree {
            factorial *= k as float;
            let scale = self.curvature.powi(k as i32 - 1) / factorial;
            let angle = heading + (k - 1) as float * PI / 2.0;
            x_coeffs.push(scale * angle.cos());
            y_coeffs.push(scale * angle.sin());
        }

        debug!(
            "centreline window at ({:.2}, {:.2}) heading {:.3}",
            origin.x, origin.y, heading
        );
        CentrelinePolynomial::new(x_coeffs, y_coeffs)
    }

    /// Distance travelled along the centreline from `from` to `to`, both centreline points.
    /// On a circle the result lies within half a lap either way.
    pub fn arc_length(&self, from: &CentrelinePoint, to: &CentrelinePoint) -> float {
        let k = self.curvature;
        if k == 0.0 {
            return to.x - from.x;
        }
        let h_from = float::atan2(from.dy_ds, from.dx_ds);
        let h_to = float::atan2(to.dy_ds, to.dx_ds);
        wrap_angle(h_to - h_from) / k
    }

    /// Signed lateral offset of `(x, y)` from the centreline, positive to the left.
    pub fn offset(&self, x: float, y: float) -> float {
        let origin = self.nearest(x, y);
        -origin.contouring_error(x, y)
    }
}
