use crate::math::RealNumber;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-solve history: append-only objective and residual traces plus the
/// completed-iteration count. Never rewrites earlier entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats<T: RealNumber> {
    pub obj: Vec<T>,
    pub res: Vec<T>,
    pub iters: usize,
    pub solve_time: Duration,
}

impl<T> Stats<T>
where
    T: RealNumber,
{
    pub fn new() -> Self {
        Self {
            obj: Vec::new(),
            res: Vec::new(),
            iters: 0,
            solve_time: Duration::ZERO,
        }
    }

    pub fn record(&mut self, objective: T, residual: T, iter: usize) {
        self.obj.push(objective);
        self.res.push(residual);
        self.iters = iter;
    }
}

impl<T> Default for Stats<T>
where
    T: RealNumber,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Scalar;

    #[test]
    fn record_appends() {
        let mut stats = Stats::<Scalar>::new();
        stats.record(10.0, 1.0, 1);
        stats.record(9.0, 0.5, 2);
        assert_eq!(stats.obj, vec![10.0, 9.0]);
        assert_eq!(stats.res, vec![1.0, 0.5]);
        assert_eq!(stats.iters, 2);
    }
}
