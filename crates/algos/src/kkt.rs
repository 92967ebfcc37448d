use anyhow::{Context, Result};
use sepq_core::math::RealNumber;
use sepq_core::options::Settings;
use sepq_core::problem::Params;
use sepq_core::traits::KktSolver;
use sepq_core::vars::Vars;
use sepq_linsys::{SparseKktMatrix, SparseKktSolver};
use sprs::{CsMat, TriMat};
use tracing::debug;

/// The once-factorized augmented-Lagrangian system
///
/// ```text
/// [ P + diag(σ)    Aᵀ          ] [ xt ]   [ σ⊙x − q − w  ]
/// [ A             −diag(ρ)⁻¹   ] [ ν  ] = [ z − ρ⁻¹⊙y    ]
/// ```
///
/// Immutable after construction; every iteration borrows it for one
/// substitution pass. The matrix is quasi-definite whenever P ⪰ 0 and
/// σ, ρ > 0, so the factorization either succeeds or the input is
/// malformed.
pub struct KktSystem<T: RealNumber> {
    n: usize,
    m: usize,
    solver: SparseKktSolver<T>,
}

impl<T> KktSystem<T>
where
    T: RealNumber,
{
    pub fn factorize(params: &Params<T>, settings: &Settings<T>) -> Result<Self> {
        let n = params.num_vars();
        let m = params.num_constrs();
        let dim = n + m;
        let mut tri = TriMat::with_capacity((dim, dim), params.p.nnz() + 2 * params.a.nnz() + dim);
        for col in 0..n {
            for idx in params.p.indptr[col]..params.p.indptr[col + 1] {
                tri.add_triplet(params.p.indices[idx], col, params.p.data[idx]);
            }
        }
        for (i, &sigma) in settings.sigma.iter().enumerate() {
            tri.add_triplet(i, i, sigma);
        }
        for col in 0..n {
            for idx in params.a.indptr[col]..params.a.indptr[col + 1] {
                let row = params.a.indices[idx];
                let value = params.a.data[idx];
                tri.add_triplet(n + row, col, value);
                tri.add_triplet(col, n + row, value);
            }
        }
        for (j, &rho) in settings.rho.iter().enumerate() {
            tri.add_triplet(n + j, n + j, -T::one() / rho);
        }
        let assembled: CsMat<T> = tri.to_csc();
        let mut solver = SparseKktSolver::new();
        solver
            .factor(&SparseKktMatrix::new(assembled))
            .context("KKT factorization failed; check that P is PSD and σ, ρ are positive")?;
        debug!(n, m, "factorized KKT system");
        Ok(Self { n, m, solver })
    }

    pub fn dimension(&self) -> usize {
        self.n + self.m
    }

    /// One solve against the cached factorization. `scratch` must have
    /// length n + m; on return `vars.xt` and `vars.zt` hold the new
    /// auxiliary iterate, with zt recovered from the dual block as
    /// zt = z + ρ⁻¹⊙(ν − y).
    pub fn solve(
        &self,
        vars: &mut Vars<T>,
        params: &Params<T>,
        settings: &Settings<T>,
        scratch: &mut [T],
    ) -> Result<()> {
        let (n, m) = (self.n, self.m);
        assert_eq!(scratch.len(), n + m, "scratch length must be n + m");
        for i in 0..n {
            scratch[i] = settings.sigma[i] * vars.x[i] - params.q[i] - vars.w[i];
        }
        for j in 0..m {
            scratch[n + j] = vars.z[j] - vars.y[j] / settings.rho[j];
        }
        self.solver.solve(scratch)?;
        vars.xt.copy_from_slice(&scratch[..n]);
        for j in 0..m {
            vars.zt[j] = vars.z[j] + (scratch[n + j] - vars.y[j]) / settings.rho[j];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sepq_core::math::Scalar;
    use sepq_core::piecewise::PiecewiseQuadratic;
    use sepq_core::problem::CscMatrix;

    fn params() -> Params<Scalar> {
        Params {
            p: CscMatrix::diagonal(&[1.0, 2.0]),
            q: vec![0.1, -0.2],
            a: CscMatrix::from_dense(1, 2, &[1.0, 1.0], 0.0),
            b: vec![1.0],
            g: vec![PiecewiseQuadratic::free(), PiecewiseQuadratic::free()],
        }
    }

    #[test]
    fn solution_satisfies_defining_equations() {
        let params = params();
        let mut settings = Settings::<Scalar>::defaults(2, 1);
        settings.sigma = vec![0.5, 1.5];
        settings.rho = vec![2.0];
        let kkt = KktSystem::factorize(&params, &settings).unwrap();

        let mut vars = Vars::zeros(&params);
        vars.x = vec![0.3, 0.4];
        vars.w = vec![0.1, -0.1];
        vars.y = vec![0.2];
        let mut scratch = vec![0.0; kkt.dimension()];
        kkt.solve(&mut vars, &params, &settings, &mut scratch).unwrap();

        // recover the dual block: zt = z + ρ⁻¹(ν − y)
        let nu = vars.y[0] + settings.rho[0] * (vars.zt[0] - vars.z[0]);

        // (P + diag(σ))·xt + Aᵀν = σ⊙x − q − w
        let lhs0 = (1.0 + 0.5) * vars.xt[0] + nu;
        let rhs0 = 0.5 * vars.x[0] - params.q[0] - vars.w[0];
        assert_relative_eq!(lhs0, rhs0, epsilon = 1e-10);
        let lhs1 = (2.0 + 1.5) * vars.xt[1] + nu;
        let rhs1 = 1.5 * vars.x[1] - params.q[1] - vars.w[1];
        assert_relative_eq!(lhs1, rhs1, epsilon = 1e-10);

        // A·xt − ρ⁻¹ν = z − ρ⁻¹⊙y
        let lhs2 = vars.xt[0] + vars.xt[1] - nu / settings.rho[0];
        let rhs2 = vars.z[0] - vars.y[0] / settings.rho[0];
        assert_relative_eq!(lhs2, rhs2, epsilon = 1e-10);
    }

    #[test]
    fn repeated_solves_are_consistent() {
        let params = params();
        let settings = Settings::<Scalar>::defaults(2, 1);
        let kkt = KktSystem::factorize(&params, &settings).unwrap();
        let mut vars = Vars::zeros(&params);
        vars.x = vec![1.0, -1.0];
        let mut scratch = vec![0.0; kkt.dimension()];
        kkt.solve(&mut vars, &params, &settings, &mut scratch).unwrap();
        let first = vars.xt.clone();
        kkt.solve(&mut vars, &params, &settings, &mut scratch).unwrap();
        assert_eq!(first, vars.xt);
    }
}
