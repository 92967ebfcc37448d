use crate::math::RealNumber;
use crate::problem::{ProblemError, ProblemResult};
use serde::{Deserialize, Serialize};

/// Which termination strategy the driver consults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TermCondKind {
    /// Stop once the iterates and the x/xt, z/zt consistency stop moving.
    Converge,
    /// Track the best feasible candidate reconstructed from the leading
    /// variables and stop after enough non-improving checks.
    FirstVars,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings<T: RealNumber> {
    /// Augmented Lagrangian weight per constraint, strictly positive.
    pub rho: Vec<T>,
    /// Augmented Lagrangian weight per variable, strictly positive.
    pub sigma: Vec<T>,
    /// Over-relaxation parameter in [0, 2]; 1 recovers plain ADMM.
    pub alpha: T,
    pub max_iters: usize,
    /// Convergence threshold for the Converge strategy.
    pub eps: T,
    /// Check termination every this many iterations.
    pub term_cond_freq: usize,
    /// Record objective/residual every iteration.
    pub compute_stats: bool,
    pub term_cond: TermCondKind,
    /// Minimum objective decrease for a FirstVars check to count as progress.
    pub obj_tol: T,
    /// Maximum residual for a FirstVars candidate to be considered at all.
    pub res_tol: T,
    /// Iteration budget without progress before FirstVars gives up.
    pub non_improvement_iters: usize,
    /// Run one relaxation-free proximal pass after the loop exits.
    pub polish: bool,
}

impl<T> Settings<T>
where
    T: RealNumber,
{
    pub fn defaults(num_vars: usize, num_constrs: usize) -> Self {
        Self {
            rho: vec![T::one(); num_constrs],
            sigma: vec![T::one(); num_vars],
            alpha: T::from_f64(1.5).unwrap(),
            max_iters: 1000,
            eps: T::from_f64(1e-4).unwrap(),
            term_cond_freq: 10,
            compute_stats: false,
            term_cond: TermCondKind::Converge,
            obj_tol: T::from_f64(1e-5).unwrap(),
            res_tol: T::from_f64(1e-3).unwrap(),
            non_improvement_iters: 100,
            polish: false,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.sigma.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.rho.len()
    }

    pub fn validate(&self) -> ProblemResult<()> {
        if self.rho.iter().any(|&r| !(r > T::zero()) || !r.is_finite()) {
            return Err(ProblemError::InvalidSetting(
                "rho entries must be strictly positive and finite".into(),
            ));
        }
        if self
            .sigma
            .iter()
            .any(|&s| !(s > T::zero()) || !s.is_finite())
        {
            return Err(ProblemError::InvalidSetting(
                "sigma entries must be strictly positive and finite".into(),
            ));
        }
        if !(self.alpha >= T::zero() && self.alpha <= T::from_f64(2.0).unwrap()) {
            return Err(ProblemError::InvalidSetting(
                "alpha must lie in [0, 2]".into(),
            ));
        }
        if self.max_iters == 0 {
            return Err(ProblemError::InvalidSetting(
                "max_iters must be positive".into(),
            ));
        }
        if !(self.eps >= T::zero()) {
            return Err(ProblemError::InvalidSetting(
                "eps must be nonnegative".into(),
            ));
        }
        if self.term_cond_freq == 0 {
            return Err(ProblemError::InvalidSetting(
                "term_cond_freq must be positive".into(),
            ));
        }
        if self.non_improvement_iters == 0 {
            return Err(ProblemError::InvalidSetting(
                "non_improvement_iters must be positive".into(),
            ));
        }
        Ok(())
    }
}
