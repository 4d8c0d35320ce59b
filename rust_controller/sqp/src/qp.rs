// Quadratic subproblems solved with OSQP.

use osqp::{CscMatrix, Problem, SetupError, Settings, Status};
use prelude::nalgebra::DMatrix;
use prelude::*;

/// OSQP treats bounds beyond this magnitude as infinite.
pub const QP_INFINITY: float = 1e30;

pub fn settings() -> Settings {
    Settings::default()
        .verbose(false)
        .polish(true)
        .eps_abs(1e-7)
        .eps_rel(1e-7)
        .max_iter(20_000)
}

/// `minimise 0.5 x'Px + q'x subject to l <= Ax <= u` with dense `P` and `A`.
pub struct QpProblem {
    inner: Problem,
}

pub enum QpOutcome {
    Solved {
        x: Vec<float>,
        y: Vec<float>,
        /// OSQP stopped before reaching its tolerances.
        inaccurate: bool,
    },
    PrimalInfeasible,
    Failed(&'static str),
}

impl QpProblem {
    /// Only the upper triangle of `P` is read.
    pub fn new(
        P: &DMatrix<float>,
        q: &[float],
        A: &DMatrix<float>,
        l: &[float],
        u: &[float],
        settings: &Settings,
    ) -> Result<QpProblem, SetupError> {
        let _guard = flame::start_guard("osqp setup");
        let l: Vec<_> = l.iter().map(|&v| clamp_infinite(v)).collect();
        let u: Vec<_> = u.iter().map(|&v| clamp_infinite(v)).collect();
        Ok(QpProblem {
            inner: Problem::new(
                dense_to_csc_upper_tri(P),
                q,
                dense_to_csc(A),
                &l,
                &u,
                settings,
            )?,
        })
    }

    pub fn solve(&mut self) -> QpOutcome {
        let _guard = flame::start_guard("osqp solve");
        match self.inner.solve() {
            Status::Solved(solution) => QpOutcome::Solved {
                x: solution.x().to_vec(),
                y: solution.y().to_vec(),
                inaccurate: false,
            },
            Status::SolvedInaccurate(solution)
            | Status::MaxIterationsReached(solution)
            | Status::TimeLimitReached(solution) => QpOutcome::Solved {
                x: solution.x().to_vec(),
                y: solution.y().to_vec(),
                inaccurate: true,
            },
            Status::PrimalInfeasible(_) | Status::PrimalInfeasibleInaccurate(_) => {
                QpOutcome::PrimalInfeasible
            }
            Status::DualInfeasible(_) | Status::DualInfeasibleInaccurate(_) => {
                QpOutcome::Failed("dual infeasible")
            }
            _ => QpOutcome::Failed("non-convex or unknown failure"),
        }
    }
}

fn clamp_infinite(v: float) -> float {
    max(-QP_INFINITY, min(v, QP_INFINITY))
}

pub fn dense_to_csc(m: &DMatrix<float>) -> CscMatrix<'static> {
    dense_to_csc_rows(m, |_, _| true)
}

/// Upper triangle of a square matrix.
pub fn dense_to_csc_upper_tri(m: &DMatrix<float>) -> CscMatrix<'static> {
    dense_to_csc_rows(m, |j, i| i <= j)
}

/// Stores nonzero entries, plus the diagonal, of rows `i` with `keep(j, i)` in column `j`.
fn dense_to_csc_rows<F: Fn(usize, usize) -> bool>(
    m: &DMatrix<float>,
    keep: F,
) -> CscMatrix<'static> {
    let (nrows, ncols) = m.shape();
    let mut indptr = Vec::with_capacity(ncols + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();

    indptr.push(0);
    for j in 0..ncols {
        for i in (0..nrows).take_while(|&i| keep(j, i)) {
            let v = m[(i, j)];
            if v != 0.0 || i == j {
                indices.push(i);
                data.push(v);
            }
        }
        indptr.push(indices.len());
    }

    CscMatrix {
        nrows,
        ncols,
        indptr: indptr.into(),
        indices: indices.into(),
        data: data.into(),
    }
}
