use itertools::izip;
use sepq_core::math::{clip, RealNumber};
use sepq_core::options::Settings;
use sepq_core::piecewise::BoundedQuadratic;
use sepq_core::problem::Params;

/// Per-variable proximal state: a flat copy of the variable's penalty
/// pieces, laid out once at setup so the hot loop never walks the
/// problem-level representation.
struct ProxFn<T> {
    pieces: Vec<BoundedQuadratic<T>>,
}

impl<T> ProxFn<T>
where
    T: RealNumber,
{
    /// argmin_t g(t) + (σ/2)(t − u)², exact.
    ///
    /// Each piece contributes at most three candidates: the clipped
    /// stationary point of (piece + penalty) when that sum is strictly
    /// convex, and the piece's finite endpoints otherwise. Strict
    /// comparison keeps the first piece on ties.
    fn minimize(&self, sigma: T, u: T) -> T {
        let half = T::from_f64(0.5).unwrap();
        let mut best_value = T::infinity();
        let mut best_arg = u;
        for piece in &self.pieces {
            let curvature = piece.a + piece.a + sigma;
            let stationary = if curvature > T::zero() {
                Some(clip(
                    (sigma * u - piece.b) / curvature,
                    piece.lower,
                    piece.upper,
                ))
            } else {
                None
            };
            let candidates = [
                stationary,
                piece.lower.is_finite().then_some(piece.lower),
                piece.upper.is_finite().then_some(piece.upper),
            ];
            for t in candidates.into_iter().flatten() {
                let d = t - u;
                let value = piece.eval(t) + half * sigma * d * d;
                if value < best_value {
                    best_value = value;
                    best_arg = t;
                }
            }
        }
        best_arg
    }
}

/// One proximal evaluator per variable, built once from the problem data
/// and read-only for the rest of the solve.
pub struct ProxCache<T> {
    funcs: Vec<ProxFn<T>>,
}

impl<T> ProxCache<T>
where
    T: RealNumber,
{
    pub fn new(params: &Params<T>) -> Self {
        Self {
            funcs: params
                .g
                .iter()
                .map(|g| ProxFn {
                    pieces: g.pieces().to_vec(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

/// Coordinate-wise proximal step: returns argmin_x Σᵢ gᵢ(xᵢ) +
/// (σᵢ/2)(xᵢ − uᵢ)² as a fresh vector. No side effects beyond cache reads.
pub fn prox_step<T>(cache: &ProxCache<T>, settings: &Settings<T>, u: &[T]) -> Vec<T>
where
    T: RealNumber,
{
    assert_eq!(u.len(), cache.len(), "prox input dimension mismatch");
    izip!(&cache.funcs, &settings.sigma, u)
        .map(|(func, &sigma, &ui)| func.minimize(sigma, ui))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sepq_core::math::Scalar;
    use sepq_core::piecewise::PiecewiseQuadratic;
    use sepq_core::problem::CscMatrix;

    fn cache_for(g: Vec<PiecewiseQuadratic<Scalar>>) -> (ProxCache<Scalar>, Settings<Scalar>) {
        let n = g.len();
        let params = Params {
            p: CscMatrix::zeros(n, n),
            q: vec![0.0; n],
            a: CscMatrix::zeros(0, n),
            b: Vec::new(),
            g,
        };
        let settings = Settings::defaults(n, 0);
        (ProxCache::new(&params), settings)
    }

    #[test]
    fn indicator_prox_is_projection() {
        let (cache, mut settings) = cache_for(vec![PiecewiseQuadratic::indicator(-1.0, 2.0)]);
        for &sigma in &[0.1, 1.0, 25.0] {
            settings.sigma = vec![sigma];
            assert_eq!(prox_step(&cache, &settings, &[5.0]), vec![2.0]);
            assert_eq!(prox_step(&cache, &settings, &[-3.0]), vec![-1.0]);
            assert_eq!(prox_step(&cache, &settings, &[0.5]), vec![0.5]);
        }
    }

    #[test]
    fn unconstrained_quadratic_prox_matches_closed_form() {
        // g(t) = 2t² + t − 1 on all of R
        let g = PiecewiseQuadratic::new(vec![BoundedQuadratic::new(
            Scalar::NEG_INFINITY,
            Scalar::INFINITY,
            2.0,
            1.0,
            -1.0,
        )])
        .unwrap();
        let (cache, mut settings) = cache_for(vec![g]);
        for &(sigma, u) in &[(1.0, 3.0), (0.5, -2.0), (10.0, 0.25)] {
            settings.sigma = vec![sigma];
            let got = prox_step(&cache, &settings, &[u])[0];
            // t* = (σu − b) / (2a + σ) with a = 2, b = 1
            assert_relative_eq!(got, (sigma * u - 1.0) / (4.0 + sigma), epsilon = 1e-12);
        }
    }

    #[test]
    fn singleton_indicator_pins_value() {
        let (cache, settings) = cache_for(vec![PiecewiseQuadratic::indicator(1.2318, 1.2318)]);
        assert_eq!(prox_step(&cache, &settings, &[-40.0]), vec![1.2318]);
        assert_eq!(prox_step(&cache, &settings, &[7.0]), vec![1.2318]);
    }

    #[test]
    fn disjoint_pieces_pick_global_minimum() {
        // quadratic bowl on [-1, 2], linear ramp on [2.5, 3.5]
        let g = PiecewiseQuadratic::new(vec![
            BoundedQuadratic::new(-1.0, 2.0, 1.0, 0.0, 0.0),
            BoundedQuadratic::new(2.5, 3.5, 0.0, 1.0, 0.0),
        ])
        .unwrap();
        let (cache, settings) = cache_for(vec![g]);
        // u far right: the ramp piece wins despite the bowl being first
        let x = prox_step(&cache, &settings, &[3.0])[0];
        assert!((2.5..=3.5).contains(&x));
        // u at the origin: the bowl piece wins
        let x = prox_step(&cache, &settings, &[0.0])[0];
        assert_relative_eq!(x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn ties_prefer_first_piece() {
        // two identical flat pieces; the minimizer must come from the first
        let g = PiecewiseQuadratic::new(vec![
            BoundedQuadratic::new(0.0, 1.0, 0.0, 0.0, 0.0),
            BoundedQuadratic::new(3.0, 4.0, 0.0, 0.0, 0.0),
        ])
        .unwrap();
        let (cache, settings) = cache_for(vec![g]);
        // u equidistant from both intervals
        let x = prox_step(&cache, &settings, &[2.0])[0];
        assert_eq!(x, 1.0);
    }
}
