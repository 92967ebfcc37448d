use crate::admm::objective;
use anyhow::{anyhow, Context, Result};
use sepq_core::math::{clip_slice, dist2, norm2, RealNumber};
use sepq_core::options::{Settings, TermCondKind};
use sepq_core::problem::{CscMatrix, Params};
use sepq_core::vars::Vars;
use sepq_linsys::dense::{DenseLuSolver, DenseMatrix};
use tracing::debug;

/// Verdict of one termination check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermStatus {
    Continue,
    Converged,
    NotImproving,
}

/// Strategy interface consulted every `term_cond_freq` iterations. The two
/// implementations share no state; the driver selects one at solve start
/// from `Settings::term_cond`.
pub trait TermCache<T: RealNumber> {
    fn check(
        &mut self,
        vars: &Vars<T>,
        params: &Params<T>,
        settings: &Settings<T>,
        iter: usize,
    ) -> TermStatus;

    /// Best iterate tracked by the strategy, if it tracks one.
    fn best_vars(&self) -> Option<&Vars<T>> {
        None
    }
}

pub fn term_cache_for<T>(
    params: &Params<T>,
    settings: &Settings<T>,
    vars: &Vars<T>,
) -> Result<Box<dyn TermCache<T>>>
where
    T: RealNumber,
{
    match settings.term_cond {
        TermCondKind::Converge => Ok(Box::new(ConvergeTermCache::new(vars))),
        TermCondKind::FirstVars => Ok(Box::new(FirstVarsTermCache::new(params, settings)?)),
    }
}

/// Classical stopping rule: snapshot the previous iterate, declare
/// convergence once the iterate movement and the x/xt, z/zt inconsistency
/// together drop below `eps`. The ‖z − zt‖ term doubles as the primal
/// infeasibility of the KKT iterate, since A·xt − b = zt − z while z is
/// pinned to b.
pub struct ConvergeTermCache<T> {
    x_last: Vec<T>,
    z_last: Vec<T>,
    w_last: Vec<T>,
    y_last: Vec<T>,
}

impl<T> ConvergeTermCache<T>
where
    T: RealNumber,
{
    pub fn new(vars: &Vars<T>) -> Self {
        Self {
            x_last: vars.x.clone(),
            z_last: vars.z.clone(),
            w_last: vars.w.clone(),
            y_last: vars.y.clone(),
        }
    }
}

impl<T> TermCache<T> for ConvergeTermCache<T>
where
    T: RealNumber,
{
    fn check(
        &mut self,
        vars: &Vars<T>,
        _params: &Params<T>,
        settings: &Settings<T>,
        iter: usize,
    ) -> TermStatus {
        let movement = dist2(&vars.x, &self.x_last)
            + dist2(&vars.z, &self.z_last)
            + dist2(&vars.w, &self.w_last)
            + dist2(&vars.y, &self.y_last);
        let inconsistency = dist2(&vars.x, &vars.xt) + dist2(&vars.z, &vars.zt);
        let total = movement + inconsistency;
        if total <= settings.eps {
            debug!(iter, total = total.to_f64(), "converged");
            return TermStatus::Converged;
        }
        self.x_last.clone_from(&vars.x);
        self.z_last.clone_from(&vars.z);
        self.w_last.clone_from(&vars.w);
        self.y_last.clone_from(&vars.y);
        TermStatus::Continue
    }
}

/// Stopping rule built on the column partition A = [A1 | A2] with A2 the
/// trailing m×m block. The leading coordinates of the iterate determine an
/// exactly feasible candidate through A2·x2 = b − A1·x1, whose true
/// objective and residual are cheap to score; the solve stops once enough
/// consecutive checks fail to improve on the best candidate seen.
pub struct FirstVarsTermCache<T: RealNumber> {
    obj_best: T,
    res_best: T,
    best: Option<Vars<T>>,
    n1: usize,
    lb: Vec<T>,
    ub: Vec<T>,
    a1: CscMatrix<T>,
    a2: DenseLuSolver<T>,
    not_improved_count: usize,
    not_improved_count_req: usize,
}

impl<T> FirstVarsTermCache<T>
where
    T: RealNumber,
{
    pub fn new(params: &Params<T>, settings: &Settings<T>) -> Result<Self> {
        let n = params.num_vars();
        let m = params.num_constrs();
        if n < m {
            return Err(anyhow!(
                "FirstVars termination needs at least as many variables ({n}) as constraints ({m})"
            ));
        }
        let n1 = n - m;
        let a1 = params.a.leading_columns(n1);
        let mut block = vec![T::zero(); m * m];
        for col in n1..n {
            for idx in params.a.indptr[col]..params.a.indptr[col + 1] {
                let row = params.a.indices[idx];
                block[row * m + (col - n1)] = params.a.data[idx];
            }
        }
        let a2 = DenseLuSolver::factor(&DenseMatrix::new(m, block))
            .context("trailing m columns of A must form an invertible block")?;
        let (lb, ub): (Vec<T>, Vec<T>) = params.g.iter().map(|g| g.domain()).unzip();
        let not_improved_count_req = settings
            .non_improvement_iters
            .div_ceil(settings.term_cond_freq)
            .max(1);
        Ok(Self {
            obj_best: T::infinity(),
            res_best: T::infinity(),
            best: None,
            n1,
            lb,
            ub,
            a1,
            a2,
            not_improved_count: 0,
            not_improved_count_req,
        })
    }

    /// Objective of the best candidate recorded so far, if any.
    pub fn best_objective(&self) -> Option<T> {
        self.best.as_ref().map(|_| self.obj_best)
    }

    /// Residual of the best candidate recorded so far, if any.
    pub fn best_residual(&self) -> Option<T> {
        self.best.as_ref().map(|_| self.res_best)
    }

    /// Reconstruct the candidate for the current iterate and score it.
    fn candidate(&self, vars: &Vars<T>, params: &Params<T>) -> (Vec<T>, T, T) {
        let m = params.num_constrs();
        let mut rhs = params.b.clone();
        let ax1 = self.a1.mul_vec(&vars.x[..self.n1]);
        for (r, a) in rhs.iter_mut().zip(ax1) {
            *r -= a;
        }
        let mut x2 = vec![T::zero(); m];
        self.a2.solve(&rhs, &mut x2);

        let mut xc = Vec::with_capacity(params.num_vars());
        xc.extend_from_slice(&vars.x[..self.n1]);
        xc.extend_from_slice(&x2);
        clip_slice(&mut xc, &self.lb, &self.ub);

        let mut infeas = params.a.mul_vec(&xc);
        for (ai, bi) in infeas.iter_mut().zip(params.b.iter()) {
            *ai -= *bi;
        }
        let res = norm2(&infeas);
        let obj = objective(params, &xc);
        (xc, obj, res)
    }
}

impl<T> TermCache<T> for FirstVarsTermCache<T>
where
    T: RealNumber,
{
    fn check(
        &mut self,
        vars: &Vars<T>,
        params: &Params<T>,
        settings: &Settings<T>,
        iter: usize,
    ) -> TermStatus {
        let (xc, obj, res) = self.candidate(vars, params);
        let improved = res <= settings.res_tol && obj < self.obj_best - settings.obj_tol;
        if improved {
            debug!(
                iter,
                obj = obj.to_f64(),
                res = res.to_f64(),
                "new best candidate"
            );
            self.obj_best = obj;
            self.res_best = res;
            let mut best = vars.clone();
            best.x = xc;
            self.best = Some(best);
            self.not_improved_count = 0;
            return TermStatus::Continue;
        }
        self.not_improved_count += 1;
        if self.not_improved_count >= self.not_improved_count_req {
            debug!(iter, "candidate stopped improving");
            TermStatus::NotImproving
        } else {
            TermStatus::Continue
        }
    }

    fn best_vars(&self) -> Option<&Vars<T>> {
        self.best.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sepq_core::math::Scalar;
    use sepq_core::piecewise::PiecewiseQuadratic;

    fn params() -> Params<Scalar> {
        // A = [[1, 1, 0], [0, 1, 1]]: trailing 2x2 block is invertible
        Params {
            p: CscMatrix::diagonal(&[1.0, 1.0, 1.0]),
            q: vec![0.0; 3],
            a: CscMatrix::from_dense(2, 3, &[1.0, 0.0, 1.0, 1.0, 0.0, 1.0], 0.0),
            b: vec![2.0, 1.0],
            g: vec![
                PiecewiseQuadratic::indicator(-10.0, 10.0),
                PiecewiseQuadratic::indicator(-10.0, 10.0),
                PiecewiseQuadratic::indicator(-10.0, 10.0),
            ],
        }
    }

    #[test]
    fn converge_cache_triggers_on_static_iterate() {
        let params = params();
        let settings = Settings::<Scalar>::defaults(3, 2);
        let mut vars = Vars::zeros(&params);
        // make the KKT iterate agree with the primal one
        vars.xt.clone_from(&vars.x);
        vars.zt.clone_from(&vars.z);
        let mut cache = ConvergeTermCache::new(&vars);
        assert_eq!(
            cache.check(&vars, &params, &settings, 10),
            TermStatus::Converged
        );
    }

    #[test]
    fn converge_cache_continues_on_moving_iterate() {
        let params = params();
        let settings = Settings::<Scalar>::defaults(3, 2);
        let mut vars = Vars::zeros(&params);
        let mut cache = ConvergeTermCache::new(&vars);
        vars.x = vec![1.0, 1.0, 1.0];
        vars.xt.clone_from(&vars.x);
        vars.zt.clone_from(&vars.z);
        assert_eq!(
            cache.check(&vars, &params, &settings, 10),
            TermStatus::Continue
        );
        // snapshot refreshed: an unchanged iterate now converges
        assert_eq!(
            cache.check(&vars, &params, &settings, 20),
            TermStatus::Converged
        );
    }

    #[test]
    fn first_vars_reconstructs_feasible_candidate() {
        let params = params();
        let settings = Settings::<Scalar>::defaults(3, 2);
        let cache = FirstVarsTermCache::new(&params, &settings).unwrap();
        let mut vars = Vars::zeros(&params);
        vars.x = vec![0.5, 0.0, 0.0];
        let (xc, _obj, res) = cache.candidate(&vars, &params);
        // x2 solves [[1, 0], [1, 1]]·x2 = b − A1·x1 = [1.5, 1.0]
        assert_relative_eq!(xc[1], 1.5, epsilon = 1e-10);
        assert_relative_eq!(xc[2], -0.5, epsilon = 1e-10);
        assert_relative_eq!(res, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn first_vars_tracks_best_and_gives_up() {
        let params = params();
        let mut settings = Settings::<Scalar>::defaults(3, 2);
        settings.non_improvement_iters = 20;
        settings.term_cond_freq = 10;
        let mut cache = FirstVarsTermCache::new(&params, &settings).unwrap();
        let mut vars = Vars::zeros(&params);
        vars.x = vec![0.5, 0.0, 0.0];
        assert_eq!(
            cache.check(&vars, &params, &settings, 10),
            TermStatus::Continue
        );
        assert!(cache.best_vars().is_some());
        assert_relative_eq!(cache.best_residual().unwrap(), 0.0, epsilon = 1e-10);
        let first_best = cache.best_objective().unwrap();
        // identical iterate cannot improve; two stale checks exhaust the budget
        assert_eq!(
            cache.check(&vars, &params, &settings, 20),
            TermStatus::Continue
        );
        assert_eq!(
            cache.check(&vars, &params, &settings, 30),
            TermStatus::NotImproving
        );
        // the best-known objective never regresses across checks
        assert_eq!(cache.best_objective().unwrap(), first_best);
    }

    #[test]
    fn first_vars_rejects_singular_trailing_block() {
        let mut params = params();
        // trailing block [[1, 0], [1, 0]] is singular
        params.a = CscMatrix::from_dense(2, 3, &[1.0, 0.0, 1.0, 1.0, 0.0, 0.0], 0.0);
        let settings = Settings::<Scalar>::defaults(3, 2);
        assert!(FirstVarsTermCache::new(&params, &settings).is_err());
    }
}
