extern crate approx;
extern crate prelude;
extern crate sqp;

use approx::assert_relative_eq;

use prelude::*;
use sqp::{Constraints, Nlp, NlpSolver, SolverOptions, SolverStatus, SqpSolver};

fn options(max_iterations: usize) -> SolverOptions {
    SolverOptions {
        max_iterations,
        tolerance: 1e-6,
    }
}

/// minimise x^2 + 2y^2 subject to x + y = 3
struct EqualityQuadratic;

impl Nlp for EqualityQuadratic {
    fn num_variables(&self) -> usize {
        2
    }

    fn variable_bounds(&self) -> (Vec<float>, Vec<float>) {
        (vec![NEG_INFINITY; 2], vec![INFINITY; 2])
    }

    fn initial_guess(&self) -> Vec<float> {
        vec![0.0, 0.0]
    }

    fn objective<T: Scalar>(&self, z: &[T]) -> T {
        z[0] * z[0] + z[1] * z[1] * 2.0
    }

    fn constraints<T: Scalar>(&self, z: &[T], c: &mut Constraints<T>) {
        c.equal(z[0] + z[1], 3.0);
    }
}

#[test]
fn equality_constrained_quadratic() {
    let out = SqpSolver::new().solve(&EqualityQuadratic, &options(50));
    assert_eq!(out.status, SolverStatus::Converged);
    assert_relative_eq!(out.z[0], 2.0, epsilon = 1e-5);
    assert_relative_eq!(out.z[1], 1.0, epsilon = 1e-5);
    assert_relative_eq!(out.objective, 6.0, epsilon = 1e-4);
    assert!(out.constraint_violation <= 1e-6);
}

/// minimise x + y on the circle x^2 + y^2 = 2
struct Circle;

impl Nlp for Circle {
    fn num_variables(&self) -> usize {
        2
    }

    fn variable_bounds(&self) -> (Vec<float>, Vec<float>) {
        (vec![NEG_INFINITY; 2], vec![INFINITY; 2])
    }

    fn initial_guess(&self) -> Vec<float> {
        vec![-1.2, -0.8]
    }

    fn objective<T: Scalar>(&self, z: &[T]) -> T {
        z[0] + z[1]
    }

    fn constraints<T: Scalar>(&self, z: &[T], c: &mut Constraints<T>) {
        c.equal(z[0] * z[0] + z[1] * z[1], 2.0);
    }
}

#[test]
fn nonlinear_equality_constraint() {
    let out = SqpSolver::new().solve(&Circle, &options(100));
    assert_eq!(out.status, SolverStatus::Converged);
    assert_relative_eq!(out.z[0], -1.0, epsilon = 1e-5);
    assert_relative_eq!(out.z[1], -1.0, epsilon = 1e-5);
}

/// Rosenbrock function with the first variable bounded away from the unconstrained minimum.
struct BoundedRosenbrock {
    start: [float; 2],
}

impl Nlp for BoundedRosenbrock {
    fn num_variables(&self) -> usize {
        2
    }

    fn variable_bounds(&self) -> (Vec<float>, Vec<float>) {
        (vec![-2.0, NEG_INFINITY], vec![0.5, INFINITY])
    }

    fn initial_guess(&self) -> Vec<float> {
        self.start.to_vec()
    }

    fn objective<T: Scalar>(&self, z: &[T]) -> T {
        let a = -z[0] + 1.0;
        let b = z[1] - z[0] * z[0];
        a * a + b * b * 100.0
    }

    fn constraints<T: Scalar>(&self, _z: &[T], _c: &mut Constraints<T>) {}
}

#[test]
fn bound_constrained_rosenbrock() {
    let problem = BoundedRosenbrock { start: [-1.2, 1.0] };
    let out = SqpSolver::new().solve(&problem, &options(500));
    assert_eq!(out.status, SolverStatus::Converged);
    assert_relative_eq!(out.z[0], 0.5, epsilon = 1e-6);
    assert_relative_eq!(out.z[1], 0.25, epsilon = 1e-4);
    assert_relative_eq!(out.objective, 0.25, epsilon = 1e-6);
}

#[test]
fn iteration_cap_is_reported() {
    let problem = BoundedRosenbrock { start: [-1.2, 1.0] };
    let out = SqpSolver::new().solve(&problem, &options(2));
    assert_eq!(out.status, SolverStatus::MaxIterationsReached);
    assert_eq!(out.iterations, 2);
    assert_eq!(out.z.len(), 2);
    assert!(out.z.iter().all(|v| v.is_finite()));
}

/// A constraint whose lower bound exceeds its upper bound.
struct Inconsistent;

impl Nlp for Inconsistent {
    fn num_variables(&self) -> usize {
        1
    }

    fn variable_bounds(&self) -> (Vec<float>, Vec<float>) {
        (vec![NEG_INFINITY], vec![INFINITY])
    }

    fn initial_guess(&self) -> Vec<float> {
        vec![0.25]
    }

    fn objective<T: Scalar>(&self, z: &[T]) -> T {
        z[0] * z[0]
    }

    fn constraints<T: Scalar>(&self, z: &[T], c: &mut Constraints<T>) {
        c.bounded(2.0, z[0], 1.0);
    }
}

#[test]
fn inconsistent_bounds_are_infeasible() {
    let out = SqpSolver::new().solve(&Inconsistent, &options(50));
    assert_eq!(out.status, SolverStatus::Infeasible);
    assert_eq!(out.iterations, 0);
    assert_eq!(out.z, vec![0.25]);
    assert_relative_eq!(out.constraint_violation, 1.75);
}

/// Linear constraints that no point satisfies.
struct DisjointConstraints;

impl Nlp for DisjointConstraints {
    fn num_variables(&self) -> usize {
        2
    }

    fn variable_bounds(&self) -> (Vec<float>, Vec<float>) {
        (vec![0.0; 2], vec![1.0; 2])
    }

    fn initial_guess(&self) -> Vec<float> {
        vec![0.5, 0.5]
    }

    fn objective<T: Scalar>(&self, z: &[T]) -> T {
        z[0] * z[0] + z[1] * z[1]
    }

    fn constraints<T: Scalar>(&self, z: &[T], c: &mut Constraints<T>) {
        c.bounded(3.0, z[0] + z[1], INFINITY);
    }
}

#[test]
fn infeasible_subproblem() {
    let out = SqpSolver::new().solve(&DisjointConstraints, &options(50));
    assert_eq!(out.status, SolverStatus::Infeasible);
    assert_eq!(out.iterations, 1);
}

struct Undefined;

impl Nlp for Undefined {
    fn num_variables(&self) -> usize {
        1
    }

    fn variable_bounds(&self) -> (Vec<float>, Vec<float>) {
        (vec![NEG_INFINITY], vec![INFINITY])
    }

    fn initial_guess(&self) -> Vec<float> {
        vec![-1.0]
    }

    fn objective<T: Scalar>(&self, z: &[T]) -> T {
        z[0].sqrt()
    }

    fn constraints<T: Scalar>(&self, _z: &[T], _c: &mut Constraints<T>) {}
}

#[test]
fn non_finite_values_are_a_numerical_failure() {
    let out = SqpSolver::new().solve(&Undefined, &options(50));
    assert_eq!(out.status, SolverStatus::NumericalFailure);
    assert_eq!(out.iterations, 0);
}
