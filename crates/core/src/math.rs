use num_traits::{Float as NumFloat, FromPrimitive};
use std::ops::{AddAssign, MulAssign, SubAssign};
use std::time::{Duration, Instant};

pub trait RealNumber:
    NumFloat + FromPrimitive + Send + Sync + AddAssign + SubAssign + MulAssign + 'static
{
}

impl<T> RealNumber for T where
    T: NumFloat + FromPrimitive + Send + Sync + AddAssign + SubAssign + MulAssign + 'static
{
}

#[cfg(not(feature = "f32"))]
pub type Scalar = f64;

#[cfg(feature = "f32")]
pub type Scalar = f32;

pub fn dot<T: RealNumber>(lhs: &[T], rhs: &[T]) -> T {
    assert_eq!(lhs.len(), rhs.len(), "dot product dimension mismatch");
    lhs.iter()
        .zip(rhs.iter())
        .fold(T::zero(), |acc, (a, b)| acc + (*a) * (*b))
}

pub fn norm2<T: RealNumber>(data: &[T]) -> T {
    dot(data, data).sqrt()
}

/// Euclidean distance between two equal-length slices.
pub fn dist2<T: RealNumber>(lhs: &[T], rhs: &[T]) -> T {
    assert_eq!(lhs.len(), rhs.len(), "distance dimension mismatch");
    lhs.iter()
        .zip(rhs.iter())
        .fold(T::zero(), |acc, (a, b)| {
            let d = *a - *b;
            acc + d * d
        })
        .sqrt()
}

pub fn clip<T: RealNumber>(value: T, lower: T, upper: T) -> T {
    value.max(lower).min(upper)
}

pub fn clip_slice<T: RealNumber>(x: &mut [T], lower: &[T], upper: &[T]) {
    assert_eq!(x.len(), lower.len());
    assert_eq!(x.len(), upper.len());
    for ((xi, lo), hi) in x.iter_mut().zip(lower.iter()).zip(upper.iter()) {
        *xi = xi.max(*lo).min(*hi);
    }
}

#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
    elapsed: Duration,
    running: bool,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Duration::ZERO,
            running: true,
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.elapsed += self.start.elapsed();
            self.running = false;
        }
    }

    pub fn elapsed(&self) -> Duration {
        if self.running {
            self.elapsed + self.start.elapsed()
        } else {
            self.elapsed
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}
