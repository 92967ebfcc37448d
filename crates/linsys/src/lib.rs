#![forbid(unsafe_code)]

pub mod dense;
pub mod sparse;

pub use dense::{DenseLdlSolver, DenseLuSolver, DenseMatrix, DensePattern};
pub use sparse::{SparseKktMatrix, SparseKktSolver, SparsePattern};
