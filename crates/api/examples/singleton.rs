use anyhow::Result;
use sepq_api::{CscMatrix, ParamsBuilder, PiecewiseQuadratic, Scalar, Settings, Solver};

/// Smallest possible instance: one variable pinned to one value by a
/// singleton indicator and a matching equality constraint.
fn main() -> Result<()> {
    let v = 1.2318;
    let params = ParamsBuilder::new()
        .p(CscMatrix::diagonal(&[0.0]))
        .q(vec![0.0])
        .constraints(CscMatrix::from_dense(1, 1, &[1.0], 0.0), vec![v])
        .penalties(vec![PiecewiseQuadratic::indicator(v, v)])
        .build()?;

    let settings = Settings::<Scalar>::defaults(1, 1);
    let solution = Solver::new().settings(settings).solve(&params)?;
    println!("status: {:?}", solution.status);
    println!("x: {:?}", solution.vars.x);
    Ok(())
}
