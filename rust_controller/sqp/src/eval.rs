use prelude::nalgebra::{DMatrix, DVector};
use prelude::*;

use crate::{Constraints, Nlp};

/// Objective and constraint values at one iterate.
pub struct Point {
    pub f: float,
    pub c: Vec<float>,
}

impl Point {
    pub fn at<P: Nlp>(problem: &P, z: &[float]) -> Point {
        let mut constraints = Constraints::new();
        problem.constraints(z, &mut constraints);
        Point {
            f: problem.objective(z),
            c: constraints.values,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.f.is_finite() && self.c.iter().all(|v| v.is_finite())
    }
}

/// Values and first derivatives at one iterate.
pub struct Linearisation {
    pub point: Point,
    pub gradient: DVector<float>,
    /// Constraint Jacobian, one row per constraint.
    pub jacobian: DMatrix<float>,
}

impl Linearisation {
    pub fn is_finite(&self) -> bool {
        self.point.is_finite()
            && self.gradient.iter().all(|v| v.is_finite())
            && self.jacobian.iter().all(|v| v.is_finite())
    }

    /// Gradient of the Lagrangian for constraint multipliers `y`.
    pub fn lagrangian_gradient(&self, y: &DVector<float>) -> DVector<float> {
        &self.gradient + self.jacobian.tr_mul(y)
    }
}

/// Evaluates the problem with one forward dual pass per variable.
pub fn linearise<P: Nlp>(problem: &P, z: &[float]) -> Linearisation {
    let _guard = flame::start_guard("sqp derivatives");

    let point = Point::at(problem, z);
    let (n, m) = (z.len(), point.c.len());

    let mut gradient = DVector::zeros(n);
    let mut jacobian = DMatrix::zeros(m, n);
    let mut z_dual: Vec<Dual64> = z.iter().map(|&v| Dual64::from(v)).collect();
    let mut constraints = Constraints::with_capacity(m);

    for j in 0..n {
        z_dual[j].eps = 1.0;
        gradient[j] = problem.objective(&z_dual).eps;
        constraints.clear();
        problem.constraints(&z_dual, &mut constraints);
        for (i, c) in constraints.values.iter().take(m).enumerate() {
            jacobian[(i, j)] = c.eps;
        }
        z_dual[j].eps = 0.0;
    }

    Linearisation {
        point,
        gradient,
        jacobian,
    }
}

/// Hessian of the Lagrangian `f + y'c` with one hyper-dual pass per pair of variables.
pub fn lagrangian_hessian<P: Nlp>(problem: &P, z: &[float], y: &DVector<float>) -> DMatrix<float> {
    let _guard = flame::start_guard("sqp hessian");

    let n = z.len();
    let mut hessian = DMatrix::zeros(n, n);
    let mut z_dual: Vec<HyperDual64> = z.iter().map(|&v| HyperDual64::from(v)).collect();
    let mut constraints = Constraints::with_capacity(y.len());

    for j in 0..n {
        z_dual[j].eps1 = 1.0;
        for k in j..n {
            z_dual[k].eps2 = 1.0;
            constraints.clear();
            problem.constraints(&z_dual, &mut constraints);
            let second = constraints
                .values
                .iter()
                .zip(y.iter())
                .fold(problem.objective(&z_dual).eps1eps2, |acc, (c, y)| {
                    acc + y * c.eps1eps2
                });
            hessian[(j, k)] = second;
            hessian[(k, j)] = second;
            z_dual[k].eps2 = 0.0;
        }
        z_dual[j].eps1 = 0.0;
    }

    hessian
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    struct Circle;

    impl Nlp for Circle {
        fn num_variables(&self) -> usize {
            2
        }

        fn variable_bounds(&self) -> (Vec<float>, Vec<float>) {
            (vec![NEG_INFINITY; 2], vec![INFINITY; 2])
        }

        fn initial_guess(&self) -> Vec<float> {
            vec![0.0; 2]
        }

        fn objective<T: Scalar>(&self, z: &[T]) -> T {
            z[0] * z[1].sin()
        }

        fn constraints<T: Scalar>(&self, z: &[T], c: &mut Constraints<T>) {
            c.equal(z[0] * z[0] + z[1] * z[1], 1.0);
            c.bounded(0.0, z[0] - z[1] * 3.0, 1.0);
        }
    }

    #[test]
    fn derivatives_match_analytic() {
        let (a, b) = (0.7, -1.2);
        let lin = linearise(&Circle, &[a, b]);

        assert_relative_eq!(lin.point.f, a * b.sin());
        assert_relative_eq!(lin.gradient[0], b.sin());
        assert_relative_eq!(lin.gradient[1], a * b.cos());

        assert_eq!(lin.jacobian.shape(), (2, 2));
        assert_relative_eq!(lin.jacobian[(0, 0)], 2.0 * a);
        assert_relative_eq!(lin.jacobian[(0, 1)], 2.0 * b);
        assert_relative_eq!(lin.jacobian[(1, 0)], 1.0);
        assert_relative_eq!(lin.jacobian[(1, 1)], -3.0);
        assert!(lin.is_finite());
    }

    #[test]
    fn lagrangian_hessian_matches_analytic() {
        let (a, b) = (0.7, -1.2);
        // The second constraint is linear and adds no curvature.
        let y = DVector::from_vec(vec![0.5, 2.0]);
        let H = lagrangian_hessian(&Circle, &[a, b], &y);

        assert_eq!(H.shape(), (2, 2));
        assert_relative_eq!(H[(0, 0)], 2.0 * 0.5);
        assert_relative_eq!(H[(0, 1)], b.cos());
        assert_relative_eq!(H[(1, 0)], b.cos());
        assert_relative_eq!(H[(1, 1)], -a * b.sin() + 2.0 * 0.5);
    }
}
