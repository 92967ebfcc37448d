use anyhow::{anyhow, Result};
use num_traits::{FromPrimitive, One};
use sepq_core::math::RealNumber;
use sepq_core::traits::KktSolver;

#[derive(Debug, Clone)]
pub struct DensePattern {
    dimension: usize,
}

impl DensePattern {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Square dense matrix in row-major order, shared container for both
/// factorization backends.
#[derive(Debug, Clone)]
pub struct DenseMatrix<T: RealNumber> {
    pub dimension: usize,
    pub data: Vec<T>,
}

impl<T> DenseMatrix<T>
where
    T: RealNumber,
{
    pub fn new(dimension: usize, data: Vec<T>) -> Self {
        assert_eq!(dimension * dimension, data.len());
        Self { dimension, data }
    }

    fn entry(&self, row: usize, col: usize) -> T {
        self.data[row * self.dimension + col]
    }
}

/// Unpivoted LDLᵀ for symmetric quasi-definite matrices.
///
/// The KKT matrices this solver sees have a positive-definite leading block
/// and a negative-definite trailing block, so every pivot is nonzero without
/// permutation and the diagonal D may legitimately carry negative entries.
pub struct DenseLdlSolver<T: RealNumber> {
    dimension: usize,
    l: Vec<T>,
    d: Vec<T>,
    analyzed: bool,
}

impl<T> DenseLdlSolver<T>
where
    T: RealNumber + FromPrimitive + One,
{
    pub fn new() -> Self {
        Self {
            dimension: 0,
            l: Vec::new(),
            d: Vec::new(),
            analyzed: false,
        }
    }

    fn epsilon() -> T {
        T::from_f64(1e-12).unwrap()
    }

    fn l(&self, row: usize, col: usize) -> T {
        self.l[row * self.dimension + col]
    }

    fn l_mut(&mut self, row: usize, col: usize) -> &mut T {
        let idx = row * self.dimension + col;
        &mut self.l[idx]
    }
}

impl<T> Default for DenseLdlSolver<T>
where
    T: RealNumber + FromPrimitive + One,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> KktSolver<T> for DenseLdlSolver<T>
where
    T: RealNumber + FromPrimitive + One,
{
    type Pattern = DensePattern;
    type Matrix = DenseMatrix<T>;

    fn analyze_pattern(&mut self, pattern: &Self::Pattern) -> Result<()> {
        self.dimension = pattern.dimension();
        self.l = vec![T::zero(); self.dimension * self.dimension];
        self.d = vec![T::zero(); self.dimension];
        for i in 0..self.dimension {
            *self.l_mut(i, i) = T::one();
        }
        self.analyzed = true;
        Ok(())
    }

    fn factor(&mut self, matrix: &Self::Matrix) -> Result<()> {
        if !self.analyzed {
            self.analyze_pattern(&DensePattern::new(matrix.dimension))?;
        }
        if matrix.dimension != self.dimension {
            return Err(anyhow!(
                "matrix dimension {} does not match analyzed dimension {}",
                matrix.dimension,
                self.dimension
            ));
        }
        for i in 0..self.dimension {
            for j in 0..self.dimension {
                *self.l_mut(i, j) = if i == j { T::one() } else { T::zero() };
            }
        }

        for j in 0..self.dimension {
            let mut d_j = matrix.entry(j, j);
            for k in 0..j {
                let l_jk = self.l(j, k);
                d_j -= l_jk * l_jk * self.d[k];
            }
            if d_j.abs() <= Self::epsilon() {
                let magnitude = d_j.abs().to_f64().unwrap_or(f64::NAN);
                return Err(anyhow!(
                    "near-singular pivot at column {} (|d_j| = {:.3e})",
                    j,
                    magnitude
                ));
            }
            self.d[j] = d_j;

            for i in (j + 1)..self.dimension {
                let mut l_ij = matrix.entry(i, j);
                for k in 0..j {
                    l_ij -= self.l(i, k) * self.l(j, k) * self.d[k];
                }
                l_ij = l_ij / self.d[j];
                *self.l_mut(i, j) = l_ij;
            }
        }
        Ok(())
    }

    fn solve(&self, rhs: &mut [T]) -> Result<()> {
        if rhs.len() != self.dimension {
            return Err(anyhow!(
                "rhs length {} does not match dimension {}",
                rhs.len(),
                self.dimension
            ));
        }
        for i in 0..self.dimension {
            for j in 0..i {
                rhs[i] -= self.l(i, j) * rhs[j];
            }
        }
        for i in 0..self.dimension {
            if self.d[i].abs() <= Self::epsilon() {
                return Err(anyhow!("singular diagonal entry at {}", i));
            }
            rhs[i] = rhs[i] / self.d[i];
        }
        for i in (0..self.dimension).rev() {
            for j in (i + 1)..self.dimension {
                rhs[i] -= self.l(j, i) * rhs[j];
            }
        }
        Ok(())
    }
}

/// LU with partial pivoting for general square blocks (the trailing columns
/// of A in the FirstVars termination strategy are square but not symmetric).
pub struct DenseLuSolver<T: RealNumber> {
    dimension: usize,
    lu: Vec<T>,
    perm: Vec<usize>,
}

impl<T> DenseLuSolver<T>
where
    T: RealNumber + FromPrimitive,
{
    pub fn factor(matrix: &DenseMatrix<T>) -> Result<Self> {
        let n = matrix.dimension;
        let mut lu = matrix.data.clone();
        let mut perm: Vec<usize> = (0..n).collect();
        let eps = T::from_f64(1e-12).unwrap();

        for k in 0..n {
            let mut pivot_row = k;
            let mut pivot_mag = lu[k * n + k].abs();
            for i in (k + 1)..n {
                let mag = lu[i * n + k].abs();
                if mag > pivot_mag {
                    pivot_row = i;
                    pivot_mag = mag;
                }
            }
            if pivot_mag <= eps {
                return Err(anyhow!(
                    "singular block: no usable pivot in column {}",
                    k
                ));
            }
            if pivot_row != k {
                for col in 0..n {
                    lu.swap(k * n + col, pivot_row * n + col);
                }
                perm.swap(k, pivot_row);
            }
            let pivot = lu[k * n + k];
            for i in (k + 1)..n {
                let factor = lu[i * n + k] / pivot;
                lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    let upper = lu[k * n + j];
                    lu[i * n + j] = lu[i * n + j] - factor * upper;
                }
            }
        }
        Ok(Self {
            dimension: n,
            lu,
            perm,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn solve(&self, rhs: &[T], out: &mut [T]) {
        let n = self.dimension;
        assert_eq!(rhs.len(), n, "rhs length must match dimension");
        assert_eq!(out.len(), n, "output length must match dimension");
        for i in 0..n {
            out[i] = rhs[self.perm[i]];
        }
        for i in 0..n {
            for j in 0..i {
                let l_ij = self.lu[i * n + j];
                out[i] = out[i] - l_ij * out[j];
            }
        }
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                let u_ij = self.lu[i * n + j];
                out[i] = out[i] - u_ij * out[j];
            }
            out[i] = out[i] / self.lu[i * n + i];
        }
    }
}
