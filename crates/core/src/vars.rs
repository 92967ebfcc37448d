use crate::math::RealNumber;
use crate::problem::{Params, ProblemError, ProblemResult};
use serde::{Deserialize, Serialize};

/// The live iterate, mutated in place by every ADMM step.
///
/// `z` is pinned to `b` for the lifetime of a solve: the feasible set of the
/// splitting forces the z-update to be the identity, so it is initialized
/// from the problem data and never written again. `xt`/`zt` hold the most
/// recent KKT solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vars<T> {
    pub x: Vec<T>,
    pub z: Vec<T>,
    pub w: Vec<T>,
    pub y: Vec<T>,
    pub xt: Vec<T>,
    pub zt: Vec<T>,
}

impl<T> Vars<T>
where
    T: RealNumber,
{
    /// Zero-initialized iterate for the given problem.
    pub fn zeros(params: &Params<T>) -> Self {
        let n = params.num_vars();
        let m = params.num_constrs();
        Self {
            x: vec![T::zero(); n],
            z: params.b.clone(),
            w: vec![T::zero(); n],
            y: vec![T::zero(); m],
            xt: vec![T::zero(); n],
            zt: params.b.clone(),
        }
    }

    /// Iterate starting from a caller-supplied primal point.
    pub fn with_start(params: &Params<T>, x0: Vec<T>) -> ProblemResult<Self> {
        if x0.len() != params.num_vars() {
            return Err(ProblemError::DimensionMismatch(format!(
                "starting point has length {} but there are {} variables",
                x0.len(),
                params.num_vars()
            )));
        }
        let mut vars = Self::zeros(params);
        vars.x = x0;
        Ok(vars)
    }

    pub fn num_vars(&self) -> usize {
        self.x.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.z.len()
    }

    pub fn validate(&self, params: &Params<T>) -> ProblemResult<()> {
        let n = params.num_vars();
        let m = params.num_constrs();
        for (name, len, expect) in [
            ("x", self.x.len(), n),
            ("z", self.z.len(), m),
            ("w", self.w.len(), n),
            ("y", self.y.len(), m),
            ("xt", self.xt.len(), n),
            ("zt", self.zt.len(), m),
        ] {
            if len != expect {
                return Err(ProblemError::DimensionMismatch(format!(
                    "vars.{name} has length {len} but must have length {expect}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Scalar;
    use crate::piecewise::PiecewiseQuadratic;
    use crate::problem::CscMatrix;

    fn params() -> Params<Scalar> {
        Params {
            p: CscMatrix::diagonal(&[1.0, 1.0]),
            q: vec![0.0, 0.0],
            a: CscMatrix::from_dense(1, 2, &[1.0, 1.0], 0.0),
            b: vec![3.0],
            g: vec![PiecewiseQuadratic::free(), PiecewiseQuadratic::free()],
        }
    }

    #[test]
    fn zeros_pin_z_to_b() {
        let vars = Vars::zeros(&params());
        assert_eq!(vars.z, vec![3.0]);
        assert_eq!(vars.zt, vec![3.0]);
        assert!(vars.validate(&params()).is_ok());
    }

    #[test]
    fn with_start_checks_dimensions() {
        assert!(Vars::with_start(&params(), vec![1.0]).is_err());
        let vars = Vars::with_start(&params(), vec![1.0, 2.0]).unwrap();
        assert_eq!(vars.x, vec![1.0, 2.0]);
    }
}
