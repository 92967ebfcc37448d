use crate::math::RealNumber;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PiecewiseError {
    #[error("piecewise function must have at least one piece")]
    Empty,
    #[error("invalid piece: {0}")]
    InvalidPiece(String),
    #[error("pieces must be sorted and non-overlapping: {0}")]
    Overlap(String),
}

/// A quadratic a·t² + b·t + c restricted to the interval [lower, upper].
///
/// Endpoints may be infinite. Outside its interval the piece contributes
/// nothing to a piecewise function's value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundedQuadratic<T> {
    pub lower: T,
    pub upper: T,
    pub a: T,
    pub b: T,
    pub c: T,
}

impl<T> BoundedQuadratic<T>
where
    T: RealNumber,
{
    pub fn new(lower: T, upper: T, a: T, b: T, c: T) -> Self {
        Self {
            lower,
            upper,
            a,
            b,
            c,
        }
    }

    pub fn eval(&self, t: T) -> T {
        (self.a * t + self.b) * t + self.c
    }

    pub fn contains(&self, t: T) -> bool {
        t >= self.lower && t <= self.upper
    }

    fn validate(&self) -> Result<(), PiecewiseError> {
        if self.lower > self.upper {
            return Err(PiecewiseError::InvalidPiece(format!(
                "lower endpoint {:?} exceeds upper endpoint {:?}",
                self.lower.to_f64(),
                self.upper.to_f64()
            )));
        }
        for coeff in [self.a, self.b, self.c] {
            if !coeff.is_finite() {
                return Err(PiecewiseError::InvalidPiece(
                    "coefficients must be finite".into(),
                ));
            }
        }
        Ok(())
    }
}

/// A scalar function defined by quadratic pieces over a finite set of
/// (possibly disjoint) intervals, +∞ everywhere else.
///
/// Pieces are kept sorted by lower endpoint and may not overlap except at a
/// shared endpoint, where the smaller piece value wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiecewiseQuadratic<T> {
    pieces: Vec<BoundedQuadratic<T>>,
}

impl<T> PiecewiseQuadratic<T>
where
    T: RealNumber,
{
    pub fn new(pieces: Vec<BoundedQuadratic<T>>) -> Result<Self, PiecewiseError> {
        if pieces.is_empty() {
            return Err(PiecewiseError::Empty);
        }
        for piece in &pieces {
            piece.validate()?;
        }
        for window in pieces.windows(2) {
            if window[1].lower < window[0].upper {
                return Err(PiecewiseError::Overlap(format!(
                    "piece starting at {:?} begins before the previous piece ends at {:?}",
                    window[1].lower.to_f64(),
                    window[0].upper.to_f64()
                )));
            }
        }
        Ok(Self { pieces })
    }

    /// Indicator of [lower, upper]: zero inside, +∞ outside.
    pub fn indicator(lower: T, upper: T) -> Self {
        Self {
            pieces: vec![BoundedQuadratic::new(
                lower,
                upper,
                T::zero(),
                T::zero(),
                T::zero(),
            )],
        }
    }

    /// The zero function on all of R; the coordinate carries no penalty.
    pub fn free() -> Self {
        Self::indicator(T::neg_infinity(), T::infinity())
    }

    pub fn pieces(&self) -> &[BoundedQuadratic<T>] {
        &self.pieces
    }

    pub fn eval(&self, t: T) -> T {
        let mut value = T::infinity();
        for piece in &self.pieces {
            if piece.contains(t) {
                let v = piece.eval(t);
                if v < value {
                    value = v;
                }
            }
        }
        value
    }

    /// Overall interval hull of the domain, ignoring interior gaps.
    pub fn domain(&self) -> (T, T) {
        let lower = self.pieces.first().map(|p| p.lower).unwrap_or(T::nan());
        let upper = self.pieces.last().map(|p| p.upper).unwrap_or(T::nan());
        (lower, upper)
    }
}
