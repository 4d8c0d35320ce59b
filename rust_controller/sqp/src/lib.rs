#![allow(non_snake_case)]

#[macro_use]
extern crate log;
extern crate osqp;
extern crate prelude;

use prelude::*;

mod eval;
pub mod qp;
mod solver;
pub use solver::SqpSolver;

/// A smooth nonlinear program
///
/// ```text
/// minimise    f(z)
/// subject to  lower <= c(z) <= upper
///             z_lower <= z <= z_upper
/// ```
///
/// The objective and constraints are written once, generic over the scalar type, and are
/// evaluated by solvers with plain floats for values and with dual numbers for derivatives.
pub trait Nlp {
    fn num_variables(&self) -> usize;

    /// Lower and upper variable bounds. Unbounded entries are `NEG_INFINITY`/`INFINITY`.
    fn variable_bounds(&self) -> (Vec<float>, Vec<float>);

    fn initial_guess(&self) -> Vec<float>;

    fn objective<T: Scalar>(&self, z: &[T]) -> T;

    /// Registers every constraint on `c`. Must register the same constraints, in the same
    /// order and with the same bounds, for every `z`.
    fn constraints<T: Scalar>(&self, z: &[T], c: &mut Constraints<T>);
}

/// Constraint expressions with their bounds, in registration order.
#[derive(Clone, Debug)]
pub struct Constraints<T = float> {
    pub(crate) values: Vec<T>,
    pub(crate) lower: Vec<float>,
    pub(crate) upper: Vec<float>,
}

impl<T: Scalar> Constraints<T> {
    pub fn new() -> Constraints<T> {
        Constraints::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Constraints<T> {
        Constraints {
            values: Vec::with_capacity(capacity),
            lower: Vec::with_capacity(capacity),
            upper: Vec::with_capacity(capacity),
        }
    }

    /// `expr == value`
    pub fn equal(&mut self, expr: T, value: float) {
        self.bounded(value, expr, value);
    }

    /// `lower <= expr <= upper`
    pub fn bounded(&mut self, lower: float, expr: T, upper: float) {
        self.values.push(expr);
        self.lower.push(lower);
        self.upper.push(upper);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn lower(&self) -> &[float] {
        &self.lower
    }

    pub fn upper(&self) -> &[float] {
        &self.upper
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.lower.clear();
        self.upper.clear();
    }
}

impl<T: Scalar> Default for Constraints<T> {
    fn default() -> Self {
        Constraints::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverOptions {
    pub max_iterations: usize,
    /// Bound on the constraint violation at convergence, and on either the step length or
    /// the stationarity residual relative to the largest multiplier.
    pub tolerance: float,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverStatus {
    Converged,
    MaxIterationsReached,
    /// The constraints are inconsistent or a subproblem had no feasible point.
    Infeasible,
    NumericalFailure,
}

/// Outcome of a solve. `z` is the last iterate whatever the status.
#[derive(Clone, Debug)]
pub struct SolverOutput {
    pub status: SolverStatus,
    pub z: Vec<float>,
    pub iterations: usize,
    pub objective: float,
    /// Largest violation of a constraint bound at `z`.
    pub constraint_violation: float,
}

pub trait NlpSolver {
    fn solve<P: Nlp>(&self, problem: &P, options: &SolverOptions) -> SolverOutput;
}

/// Amount by which each constraint value lies outside its bounds.
pub fn violations<'a>(
    values: &'a [float],
    lower: &'a [float],
    upper: &'a [float],
) -> impl Iterator<Item = float> + 'a {
    values
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(&v, (&lo, &hi))| max(max(lo - v, v - hi), 0.0))
}

pub fn max_violation(values: &[float], lower: &[float], upper: &[float]) -> float {
    violations(values, lower, upper).fold(0.0, max)
}
