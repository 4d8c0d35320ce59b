// Sequential quadratic programming with an exact Lagrangian Hessian and an l1 merit line search.

use osqp::Settings;
use prelude::nalgebra::{DMatrix, DVector, SymmetricEigen};
use prelude::*;

use crate::eval::{lagrangian_hessian, linearise, Point};
use crate::qp::{self, QpOutcome, QpProblem};
use crate::{
    max_violation, violations, Constraints, Nlp, NlpSolver, SolverOptions, SolverOutput,
    SolverStatus,
};

const ARMIJO_ETA: float = 1e-4;
const LINE_SEARCH_TRIALS: usize = 20;
/// Merit penalty is kept at least this multiple of the largest constraint multiplier.
const PENALTY_MARGIN: float = 1.1;
/// Smallest eigenvalue of the Hessian handed to the quadratic subproblem.
const MIN_CURVATURE: float = 1e-4;
const EIGEN_ITERATIONS: usize = 10_000;

#[derive(Clone, Copy, Debug, Default)]
pub struct SqpSolver;

impl SqpSolver {
    pub fn new() -> SqpSolver {
        SqpSolver
    }
}

/// Quadratic model of the problem around one iterate: linearised constraints stacked over the
/// variable bounds.
struct Subproblem {
    hessian: DMatrix<float>,
    A: DMatrix<float>,
    l: Vec<float>,
    u: Vec<float>,
    settings: Settings,
}

impl Subproblem {
    /// Step and multipliers, constraint rows first and bound rows after.
    fn solve(
        &self,
        gradient: &DVector<float>,
    ) -> Result<(DVector<float>, Vec<float>), QpFailure> {
        let mut problem = QpProblem::new(
            &self.hessian,
            gradient.as_slice(),
            &self.A,
            &self.l,
            &self.u,
            &self.settings,
        )
        .map_err(|e| QpFailure::Setup(format!("{:?}", e)))?;
        match problem.solve() {
            QpOutcome::Solved { x, y, inaccurate } => {
                if inaccurate {
                    debug!("inaccurate qp solution");
                }
                Ok((DVector::from_vec(x), y))
            }
            QpOutcome::PrimalInfeasible => Err(QpFailure::Infeasible),
            QpOutcome::Failed(reason) => Err(QpFailure::Solve(reason)),
        }
    }

    /// Same quadratic model with every constraint row moved by `shift`.
    fn shifted(&self, shift: &[float]) -> Subproblem {
        let mut l = self.l.clone();
        let mut u = self.u.clone();
        for (i, s) in shift.iter().enumerate() {
            l[i] -= s;
            u[i] -= s;
        }
        Subproblem {
            hessian: self.hessian.clone(),
            A: self.A.clone(),
            l,
            u,
            settings: self.settings.clone(),
        }
    }
}

#[derive(Debug)]
enum QpFailure {
    Setup(String),
    Infeasible,
    Solve(&'static str),
}

impl NlpSolver for SqpSolver {
    fn solve<P: Nlp>(&self, problem: &P, options: &SolverOptions) -> SolverOutput {
        let _guard = flame::start_guard("sqp solve");

        let n = problem.num_variables();
        let (z_lower, z_upper) = problem.variable_bounds();
        let mut z = problem.initial_guess();
        debug_assert_eq!(z.len(), n);
        for j in 0..n {
            if z_lower[j] <= z_upper[j] {
                z[j] = max(z_lower[j], min(z[j], z_upper[j]));
            }
        }

        let mut registered = Constraints::<float>::new();
        problem.constraints(&z[..], &mut registered);
        let (c_lower, c_upper) = (registered.lower, registered.upper);
        let m = c_lower.len();

        let finish = |status: SolverStatus, z: Vec<float>, iterations: usize, point: &Point| {
            SolverOutput {
                status,
                objective: point.f,
                constraint_violation: max_violation(&point.c, &c_lower, &c_upper),
                z,
                iterations,
            }
        };

        let inconsistent = c_lower
            .iter()
            .zip(&c_upper)
            .chain(z_lower.iter().zip(&z_upper))
            .position(|(lo, hi)| lo > hi);
        if let Some(row) = inconsistent {
            warn!("constraint {} has its lower bound above its upper bound", row);
            let point = Point::at(problem, &z);
            return finish(SolverStatus::Infeasible, z, 0, &point);
        }

        let mut lin = linearise(problem, &z);
        let mut multipliers = DVector::<float>::zeros(m);
        let mut penalty: float = 1.0;

        let mut A = DMatrix::<float>::zeros(m + n, n);
        for j in 0..n {
            A[(m + j, j)] = 1.0;
        }
        let mut qp = Subproblem {
            hessian: DMatrix::zeros(n, n),
            A,
            l: vec![0.0; m + n],
            u: vec![0.0; m + n],
            settings: qp::settings(),
        };

        for iteration in 0..options.max_iterations {
            if !lin.is_finite() {
                warn!("non-finite problem values at sqp iteration {}", iteration);
                return finish(SolverStatus::NumericalFailure, z, iteration, &lin.point);
            }
            let hessian = lagrangian_hessian(problem, &z, &multipliers);
            qp.hessian = match convexify(hessian) {
                Some(hessian) => hessian,
                None => {
                    warn!("no usable hessian at sqp iteration {}", iteration);
                    return finish(SolverStatus::NumericalFailure, z, iteration, &lin.point);
                }
            };
            qp.A.rows_mut(0, m).copy_from(&lin.jacobian);
            for i in 0..m {
                qp.l[i] = c_lower[i] - lin.point.c[i];
                qp.u[i] = c_upper[i] - lin.point.c[i];
            }
            for j in 0..n {
                qp.l[m + j] = z_lower[j] - z[j];
                qp.u[m + j] = z_upper[j] - z[j];
            }

            let (p, y) = match qp.solve(&lin.gradient) {
                Ok(solution) => solution,
                Err(QpFailure::Infeasible) => {
                    warn!("infeasible qp subproblem at sqp iteration {}", iteration);
                    return finish(SolverStatus::Infeasible, z, iteration + 1, &lin.point);
                }
                Err(QpFailure::Solve(reason)) => {
                    warn!("qp subproblem failed at sqp iteration {}: {}", iteration, reason);
                    return finish(SolverStatus::NumericalFailure, z, iteration + 1, &lin.point);
                }
                Err(QpFailure::Setup(reason)) => {
                    warn!("qp setup failed at sqp iteration {}: {}", iteration, reason);
                    return finish(SolverStatus::NumericalFailure, z, iteration, &lin.point);
                }
            };

            let y_c = DVector::from_column_slice(&y[..m]);
            let step = max_abs(p.as_slice());
            let violation = max_violation(&lin.point.c, &c_lower, &c_upper);
            let stationarity = max_abs(
                (lin.lagrangian_gradient(&y_c) + DVector::from_column_slice(&y[m..])).as_slice(),
            );
            let multiplier_scale = max(1.0, max_abs(&y));
            debug!(
                "sqp iteration {}: objective {:.6e} violation {:.3e} step {:.3e} stationarity {:.3e}",
                iteration, lin.point.f, violation, step, stationarity
            );
            if violation <= options.tolerance
                && (step <= options.tolerance
                    || stationarity <= options.tolerance * multiplier_scale)
            {
                return finish(SolverStatus::Converged, z, iteration + 1, &lin.point);
            }

            // Follows the current multipliers down as well as up.
            let required = PENALTY_MARGIN * max_abs(y_c.as_slice());
            penalty = max(required, 0.5 * (penalty + required));
            let merit = |point: &Point| {
                point.f + penalty * violations(&point.c, &c_lower, &c_upper).sum::<float>()
            };
            let merit_0 = merit(&lin.point);
            let slope = lin.gradient.dot(&p)
                - penalty * violations(&lin.point.c, &c_lower, &c_upper).sum::<float>();
            let sufficient = |point: &Point, alpha: float| {
                let value = merit(point);
                value.is_finite() && value <= merit_0 + ARMIJO_ETA * alpha * slope
            };
            let take_step = |direction: &DVector<float>, alpha: float| -> Vec<float> {
                (0..n)
                    .map(|j| max(z_lower[j], min(z[j] + alpha * direction[j], z_upper[j])))
                    .collect()
            };

            let mut alpha = 1.0;
            let mut z_next = take_step(&p, alpha);
            for trial in 0..LINE_SEARCH_TRIALS {
                let point = Point::at(problem, &z_next);
                if sufficient(&point, alpha) {
                    break;
                }

                // A rejected full step gets one second order correction: the subproblem is
                // solved again with the constraint curvature seen along `p` moved into its
                // bounds.
                if trial == 0 {
                    let linear = &lin.jacobian * &p;
                    let shift: Vec<float> = (0..m)
                        .map(|i| point.c[i] - lin.point.c[i] - linear[i])
                        .collect();
                    if shift.iter().all(|v| v.is_finite()) {
                        if let Ok((corrected, _)) = qp.shifted(&shift).solve(&lin.gradient) {
                            let z_corrected = take_step(&corrected, 1.0);
                            if sufficient(&Point::at(problem, &z_corrected), 1.0) {
                                debug!("second order correction at sqp iteration {}", iteration);
                                z_next = z_corrected;
                                break;
                            }
                        }
                    }
                }

                if trial + 1 < LINE_SEARCH_TRIALS {
                    alpha *= 0.5;
                    z_next = take_step(&p, alpha);
                }
            }

            multipliers = y_c;
            lin = linearise(problem, &z_next);
            z = z_next;
        }

        debug!("sqp stopped after {} iterations", options.max_iterations);
        finish(
            SolverStatus::MaxIterationsReached,
            z,
            options.max_iterations,
            &lin.point,
        )
    }
}

/// Raises every eigenvalue of a symmetric matrix to at least `MIN_CURVATURE`, leaving the
/// eigenvectors alone. `None` for a non-finite matrix or one whose eigendecomposition does not
/// converge.
fn convexify(hessian: DMatrix<float>) -> Option<DMatrix<float>> {
    let _guard = flame::start_guard("sqp convexify");
    if !hessian.iter().all(|v| v.is_finite()) {
        return None;
    }
    let mut eigen = SymmetricEigen::try_new(hessian, float::EPSILON, EIGEN_ITERATIONS)?;
    eigen.eigenvalues.apply(|v| *v = max(*v, MIN_CURVATURE));
    Some(eigen.recompose())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn convexify_keeps_positive_curvature() {
        let H = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let convex = convexify(H.clone()).unwrap();
        for (a, b) in convex.iter().zip(H.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn convexify_lifts_negative_curvature() {
        // Eigenvalues 3 along (1, 1) and -1 along (1, -1).
        let H = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let convex = convexify(H).unwrap();

        let half = 0.5 * (3.0 + MIN_CURVATURE);
        let off = 0.5 * (3.0 - MIN_CURVATURE);
        assert_relative_eq!(convex[(0, 0)], half, epsilon = 1e-12);
        assert_relative_eq!(convex[(1, 1)], half, epsilon = 1e-12);
        assert_relative_eq!(convex[(0, 1)], off, epsilon = 1e-12);
        assert_relative_eq!(convex[(1, 0)], off, epsilon = 1e-12);
        assert!(convex.cholesky().is_some());
    }

    #[test]
    fn convexify_rejects_non_finite() {
        let H = DMatrix::from_row_slice(2, 2, &[1.0, float::NAN, float::NAN, 1.0]);
        assert!(convexify(H).is_none());
    }
}
