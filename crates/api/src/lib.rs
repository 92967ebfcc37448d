#![forbid(unsafe_code)]

use sepq_algos::admm;
use sepq_core::math::RealNumber;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sepq_core::math::Scalar;
pub use sepq_core::options::{Settings, TermCondKind};
pub use sepq_core::piecewise::{BoundedQuadratic, PiecewiseError, PiecewiseQuadratic};
pub use sepq_core::problem::{CscMatrix, Params, ProblemError};
pub use sepq_core::solution::{Solution, Status};
pub use sepq_core::stats::Stats;
pub use sepq_core::vars::Vars;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("problem construction failed: {0}")]
    InvalidProblem(String),
    #[error("solve failed: {0}")]
    Failed(String),
}

/// Assembles `Params` field by field and validates on `build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsBuilder<T: RealNumber> {
    p: Option<CscMatrix<T>>,
    q: Option<Vec<T>>,
    a: Option<CscMatrix<T>>,
    b: Option<Vec<T>>,
    g: Option<Vec<PiecewiseQuadratic<T>>>,
}

impl<T> Default for ParamsBuilder<T>
where
    T: RealNumber,
{
    fn default() -> Self {
        Self {
            p: None,
            q: None,
            a: None,
            b: None,
            g: None,
        }
    }
}

impl<T> ParamsBuilder<T>
where
    T: RealNumber,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn p(mut self, matrix: CscMatrix<T>) -> Self {
        self.p = Some(matrix);
        self
    }

    pub fn q(mut self, vector: Vec<T>) -> Self {
        self.q = Some(vector);
        self
    }

    pub fn constraints(mut self, matrix: CscMatrix<T>, rhs: Vec<T>) -> Self {
        self.a = Some(matrix);
        self.b = Some(rhs);
        self
    }

    pub fn penalties(mut self, g: Vec<PiecewiseQuadratic<T>>) -> Self {
        self.g = Some(g);
        self
    }

    pub fn build(self) -> Result<Params<T>, SolverError> {
        let p = self
            .p
            .ok_or_else(|| SolverError::InvalidProblem("quadratic matrix missing".into()))?;
        let q = self
            .q
            .ok_or_else(|| SolverError::InvalidProblem("linear term missing".into()))?;
        let a = self
            .a
            .ok_or_else(|| SolverError::InvalidProblem("constraint matrix missing".into()))?;
        let b = self
            .b
            .ok_or_else(|| SolverError::InvalidProblem("constraint rhs missing".into()))?;
        let g = self
            .g
            .ok_or_else(|| SolverError::InvalidProblem("penalty functions missing".into()))?;
        Params::new(p, q, a, b, g).map_err(|err| SolverError::InvalidProblem(err.to_string()))
    }
}

/// Entry point mirroring the one-solve lifecycle: settings are resolved
/// against the problem dimensions at solve time, so one `Solver` value can
/// be reused across structurally different instances.
pub struct Solver<T: RealNumber> {
    settings: Option<Settings<T>>,
    initial: Option<Vars<T>>,
}

impl<T> Solver<T>
where
    T: RealNumber,
{
    pub fn new() -> Self {
        Self {
            settings: None,
            initial: None,
        }
    }

    pub fn settings(mut self, settings: Settings<T>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn initial_vars(mut self, vars: Vars<T>) -> Self {
        self.initial = Some(vars);
        self
    }

    pub fn solve(&self, params: &Params<T>) -> Result<Solution<T>, SolverError> {
        let settings = match &self.settings {
            Some(settings) => settings.clone(),
            None => Settings::defaults(params.num_vars(), params.num_constrs()),
        };
        admm::optimize(params, &settings, self.initial.clone())
            .map_err(|err| SolverError::Failed(format!("{err:#}")))
    }
}

impl<T> Default for Solver<T>
where
    T: RealNumber,
{
    fn default() -> Self {
        Self::new()
    }
}

pub fn solve<T: RealNumber>(
    params: &Params<T>,
    settings: Settings<T>,
) -> Result<Solution<T>, SolverError> {
    Solver::new().settings(settings).solve(params)
}
