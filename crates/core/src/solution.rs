use crate::math::RealNumber;
use crate::stats::Stats;
use crate::vars::Vars;
use serde::{Deserialize, Serialize};

/// How the solve ended. Only `Converged` certifies the Converge-strategy
/// exit criteria; the other two return whatever iterate was best known.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    Converged,
    NotImproving,
    MaxIterations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution<T: RealNumber> {
    pub vars: Vars<T>,
    pub stats: Stats<T>,
    pub status: Status,
}

impl<T> Solution<T>
where
    T: RealNumber,
{
    pub fn iterations(&self) -> usize {
        self.stats.iters
    }
}
