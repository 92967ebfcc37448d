use anyhow::Result;
use sepq_api::{
    BoundedQuadratic, CscMatrix, ParamsBuilder, PiecewiseQuadratic, Scalar, Settings, Solver,
    TermCondKind,
};

/// Four variables, two equality constraints, one union-of-intervals penalty
/// and three interval indicators (the last a singleton).
fn main() -> Result<()> {
    let a = CscMatrix::from_dense(2, 4, &[0.2, 0.3, 0.4, 0.1, 0.6, 0.2, 0.1, 0.5], 0.0);
    // b = A·x0 for a known feasible x0
    let x0 = [0.5, 0.3, 0.7, 1.2318];
    let b = a.mul_vec(&x0);

    #[rustfmt::skip]
    let p_dense = [
        1.0, 0.2, 0.1, 0.0,
        0.2, 0.8, 0.1, 0.1,
        0.1, 0.1, 0.9, 0.2,
        0.0, 0.1, 0.2, 0.7,
    ];
    let p = CscMatrix::from_dense(4, 4, &p_dense, 0.0);

    // x1 must lie in [-1, 2] ∪ [2.5, 3.5], with a quadratic cost on the
    // first interval and a linear cost on the second
    let g1 = PiecewiseQuadratic::new(vec![
        BoundedQuadratic::new(-1.0, 2.0, 1.0, 0.0, 0.0),
        BoundedQuadratic::new(2.5, 3.5, 0.0, 1.0, 0.0),
    ])?;
    let g = vec![
        g1,
        PiecewiseQuadratic::indicator(-20.0, 10.0),
        PiecewiseQuadratic::indicator(-5.0, 10.0),
        PiecewiseQuadratic::indicator(1.2318, 1.2318),
    ];

    let params = ParamsBuilder::new()
        .p(p)
        .q(vec![0.1, -0.2, 0.3, -0.1])
        .constraints(a, b)
        .penalties(g)
        .build()?;

    let mut settings = Settings::<Scalar>::defaults(4, 2);
    settings.term_cond = TermCondKind::FirstVars;
    settings.compute_stats = true;

    let solution = Solver::new().settings(settings).solve(&params)?;
    println!("status: {:?}", solution.status);
    println!("optimal x: {:?}", solution.vars.x);
    if let (Some(obj), Some(res)) = (solution.stats.obj.last(), solution.stats.res.last()) {
        println!("final objective: {obj:.4}");
        println!("final residual: {res:.10}");
    }
    println!("iterations: {}", solution.iterations());
    Ok(())
}
