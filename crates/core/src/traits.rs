use crate::math::RealNumber;
use anyhow::Result;

/// Factorize-once / solve-many backend for the saddle-point systems the
/// solver builds. Implementations must keep `solve` free of any mutation of
/// the factorization so one factor can serve every iteration of a solve.
pub trait KktSolver<T: RealNumber>: Send {
    type Pattern;
    type Matrix;

    fn analyze_pattern(&mut self, pattern: &Self::Pattern) -> Result<()>;

    fn factor(&mut self, matrix: &Self::Matrix) -> Result<()>;

    fn solve(&self, rhs: &mut [T]) -> Result<()>;
}
