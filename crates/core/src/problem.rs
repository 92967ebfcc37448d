use crate::math::RealNumber;
use crate::options::Settings;
use crate::piecewise::PiecewiseQuadratic;
use crate::vars::Vars;
use serde::{Deserialize, Serialize};
use sprs::CsMat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("invalid structure: {0}")]
    InvalidStructure(String),
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

pub type ProblemResult<T> = Result<T, ProblemError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CscMatrix<T> {
    pub nrows: usize,
    pub ncols: usize,
    pub indptr: Vec<usize>,
    pub indices: Vec<usize>,
    pub data: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: RealNumber,
{
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            indptr: vec![0; ncols + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Column-major dense input, entries below `tol` in magnitude dropped.
    pub fn from_dense(nrows: usize, ncols: usize, entries: &[T], tol: T) -> Self {
        assert_eq!(entries.len(), nrows * ncols, "dense entry count mismatch");
        let mut indptr = Vec::with_capacity(ncols + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for col in 0..ncols {
            for row in 0..nrows {
                let value = entries[col * nrows + row];
                if value.abs() > tol {
                    indices.push(row);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }
        Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        }
    }

    pub fn diagonal(diag: &[T]) -> Self {
        let n = diag.len();
        let mut indptr = Vec::with_capacity(n + 1);
        let mut indices = Vec::with_capacity(n);
        let mut data = Vec::with_capacity(n);
        indptr.push(0);
        for (idx, value) in diag.iter().enumerate() {
            indices.push(idx);
            data.push(*value);
            indptr.push(indices.len());
        }
        Self {
            nrows: n,
            ncols: n,
            indptr,
            indices,
            data,
        }
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn validate(&self) -> ProblemResult<()> {
        if self.indptr.len() != self.ncols + 1 {
            return Err(ProblemError::DimensionMismatch(format!(
                "indptr length {} != ncols + 1 ({})",
                self.indptr.len(),
                self.ncols + 1
            )));
        }
        if self.indices.len() != self.data.len() {
            return Err(ProblemError::DimensionMismatch(format!(
                "indices length {} != data length {}",
                self.indices.len(),
                self.data.len()
            )));
        }
        if self.indices.iter().any(|&row| row >= self.nrows) {
            return Err(ProblemError::InvalidStructure(format!(
                "row index out of range for {} rows",
                self.nrows
            )));
        }
        Ok(())
    }

    pub fn to_csmat(&self) -> ProblemResult<CsMat<T>> {
        self.validate()?;
        Ok(CsMat::new_csc(
            (self.nrows, self.ncols),
            self.indptr.clone(),
            self.indices.clone(),
            self.data.clone(),
        ))
    }

    /// out += self · x, with out pre-zeroed by the caller or accumulated into.
    pub fn mul_vec_into(&self, x: &[T], out: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(out.len(), self.nrows);
        for col in 0..self.ncols {
            let xj = x[col];
            for idx in self.indptr[col]..self.indptr[col + 1] {
                out[self.indices[idx]] += self.data[idx] * xj;
            }
        }
    }

    pub fn mul_vec(&self, x: &[T]) -> Vec<T> {
        let mut out = vec![T::zero(); self.nrows];
        self.mul_vec_into(x, &mut out);
        out
    }

    pub fn mul_vec_transpose(&self, x: &[T]) -> Vec<T> {
        assert_eq!(x.len(), self.nrows);
        let mut out = vec![T::zero(); self.ncols];
        for col in 0..self.ncols {
            let mut acc = T::zero();
            for idx in self.indptr[col]..self.indptr[col + 1] {
                acc += self.data[idx] * x[self.indices[idx]];
            }
            out[col] = acc;
        }
        out
    }

    /// The leading `ncols` columns as their own matrix. Indptr offsets of a
    /// CSC prefix are already absolute, so this is a straight copy.
    pub fn leading_columns(&self, ncols: usize) -> Self {
        assert!(ncols <= self.ncols);
        let end = self.indptr[ncols];
        Self {
            nrows: self.nrows,
            ncols,
            indptr: self.indptr[..=ncols].to_vec(),
            indices: self.indices[..end].to_vec(),
            data: self.data[..end].to_vec(),
        }
    }
}

/// Immutable problem data for one solve:
/// minimize ½xᵀPx + qᵀx + Σᵢ gᵢ(xᵢ) subject to Ax = b.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params<T> {
    pub p: CscMatrix<T>,
    pub q: Vec<T>,
    pub a: CscMatrix<T>,
    pub b: Vec<T>,
    pub g: Vec<PiecewiseQuadratic<T>>,
}

impl<T> Params<T>
where
    T: RealNumber,
{
    pub fn new(
        p: CscMatrix<T>,
        q: Vec<T>,
        a: CscMatrix<T>,
        b: Vec<T>,
        g: Vec<PiecewiseQuadratic<T>>,
    ) -> ProblemResult<Self> {
        let params = Self { p, q, a, b, g };
        params.validate()?;
        Ok(params)
    }

    pub fn num_vars(&self) -> usize {
        self.q.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.b.len()
    }

    pub fn validate(&self) -> ProblemResult<()> {
        let n = self.num_vars();
        let m = self.num_constrs();
        self.p.validate()?;
        if self.p.nrows != n || self.p.ncols != n {
            return Err(ProblemError::DimensionMismatch(format!(
                "P is {}x{} but must be {n}x{n}",
                self.p.nrows, self.p.ncols
            )));
        }
        self.a.validate()?;
        if self.a.ncols != n {
            return Err(ProblemError::DimensionMismatch(format!(
                "A has {} columns but there are {n} variables",
                self.a.ncols
            )));
        }
        if self.a.nrows != m {
            return Err(ProblemError::DimensionMismatch(format!(
                "A has {} rows but b has length {m}",
                self.a.nrows
            )));
        }
        if self.g.len() != n {
            return Err(ProblemError::DimensionMismatch(format!(
                "g has {} entries but there are {n} variables",
                self.g.len()
            )));
        }
        Ok(())
    }
}

/// Cross-struct consistency: Params, Settings and Vars must agree on the
/// variable and constraint counts before a solve may start.
pub fn check_consistent<T>(
    params: &Params<T>,
    settings: &Settings<T>,
    vars: &Vars<T>,
) -> ProblemResult<()>
where
    T: RealNumber,
{
    params.validate()?;
    let n = params.num_vars();
    let m = params.num_constrs();
    if settings.num_vars() != n {
        return Err(ProblemError::DimensionMismatch(format!(
            "settings cover {} variables but the problem has {n}",
            settings.num_vars()
        )));
    }
    if settings.num_constrs() != m {
        return Err(ProblemError::DimensionMismatch(format!(
            "settings cover {} constraints but the problem has {m}",
            settings.num_constrs()
        )));
    }
    vars.validate(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Scalar;
    use crate::piecewise::PiecewiseQuadratic;

    fn small_params() -> Params<Scalar> {
        Params {
            p: CscMatrix::diagonal(&[1.0, 1.0]),
            q: vec![0.0, 0.0],
            a: CscMatrix::from_dense(1, 2, &[1.0, 1.0], 0.0),
            b: vec![1.0],
            g: vec![
                PiecewiseQuadratic::free(),
                PiecewiseQuadratic::indicator(0.0, 1.0),
            ],
        }
    }

    #[test]
    fn valid_params_accepted() {
        assert!(small_params().validate().is_ok());
    }

    #[test]
    fn rejects_nonsquare_p() {
        let mut params = small_params();
        params.p = CscMatrix::zeros(2, 3);
        assert!(matches!(
            params.validate(),
            Err(ProblemError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn rejects_wrong_q_length() {
        let mut params = small_params();
        params.q = vec![0.0; 3];
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_wrong_a_shape() {
        let mut params = small_params();
        params.a = CscMatrix::from_dense(1, 3, &[1.0, 1.0, 1.0], 0.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_wrong_b_length() {
        let mut params = small_params();
        params.b = vec![1.0, 2.0];
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_wrong_g_length() {
        let mut params = small_params();
        params.g.pop();
        assert!(params.validate().is_err());
    }

    #[test]
    fn csc_matvec() {
        // [[1, 2], [0, 3]] in column-major order
        let matrix = CscMatrix::from_dense(2, 2, &[1.0 as Scalar, 0.0, 2.0, 3.0], 0.0);
        let y = matrix.mul_vec(&[1.0, 1.0]);
        assert_eq!(y, vec![3.0, 3.0]);
        let yt = matrix.mul_vec_transpose(&[1.0, 1.0]);
        assert_eq!(yt, vec![1.0, 5.0]);
    }

    #[test]
    fn consistency_rejects_mismatched_settings() {
        let params = small_params();
        let vars = Vars::zeros(&params);
        let good = Settings::<Scalar>::defaults(2, 1);
        assert!(check_consistent(&params, &good, &vars).is_ok());
        let bad = Settings::<Scalar>::defaults(3, 1);
        assert!(check_consistent(&params, &bad, &vars).is_err());
        let bad = Settings::<Scalar>::defaults(2, 2);
        assert!(check_consistent(&params, &bad, &vars).is_err());
    }

    #[test]
    fn leading_columns_split() {
        let matrix = CscMatrix::from_dense(2, 3, &[1.0 as Scalar, 0.0, 2.0, 3.0, 0.0, 4.0], 0.0);
        let lead = matrix.leading_columns(2);
        assert_eq!(lead.ncols, 2);
        assert_eq!(lead.mul_vec(&[1.0, 1.0]), vec![3.0, 3.0]);
    }
}
