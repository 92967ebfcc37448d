use crate::kkt::KktSystem;
use crate::prox::{prox_step, ProxCache};
use crate::term::{term_cache_for, TermStatus};
use anyhow::Result;
use itertools::izip;
use sepq_core::math::{dist2, dot, norm2, RealNumber, Timer};
use sepq_core::options::Settings;
use sepq_core::problem::{check_consistent, Params};
use sepq_core::solution::{Solution, Status};
use sepq_core::stats::Stats;
use sepq_core::vars::Vars;
use tracing::debug;

/// Scratch buffers reused across iterations so the hot loop allocates
/// nothing. `kkt_rhs` has length n + m; the rest have length n.
pub struct Workspace<T> {
    kkt_rhs: Vec<T>,
    xh: Vec<T>,
    u: Vec<T>,
}

impl<T> Workspace<T>
where
    T: RealNumber,
{
    pub fn new(num_vars: usize, num_constrs: usize) -> Self {
        Self {
            kkt_rhs: vec![T::zero(); num_vars + num_constrs],
            xh: vec![T::zero(); num_vars],
            u: vec![T::zero(); num_vars],
        }
    }
}

/// ½xᵀPx + qᵀx + Σᵢ gᵢ(xᵢ). Returns +∞ when x falls outside the domain of
/// any penalty.
pub fn objective<T>(params: &Params<T>, x: &[T]) -> T
where
    T: RealNumber,
{
    let px = params.p.mul_vec(x);
    let half = T::from_f64(0.5).unwrap();
    let mut value = half * dot(x, &px) + dot(&params.q, x);
    for (g, &xi) in params.g.iter().zip(x.iter()) {
        value += g.eval(xi);
    }
    value
}

/// Primal infeasibility ‖Ax − b‖ combined with the x/xt and z/zt
/// consistency gaps.
pub fn residual<T>(params: &Params<T>, vars: &Vars<T>) -> T
where
    T: RealNumber,
{
    let mut infeas = params.a.mul_vec(&vars.x);
    for (ai, bi) in infeas.iter_mut().zip(params.b.iter()) {
        *ai -= *bi;
    }
    norm2(&infeas) + dist2(&vars.x, &vars.xt) + dist2(&vars.z, &vars.zt)
}

/// One ADMM iteration, mutating `vars` in place.
///
/// Solves the KKT system for (xt, zt), over-relaxes, takes the separable
/// proximal step, then ascends the duals: w picks up the x-consistency
/// residual σ⊙(x̂ − x), y picks up the relaxed z-consistency residual
/// α·ρ⊙(zt − z) (z itself stays pinned to b, so ẑ − z = α(zt − z)).
///
/// In polish mode the relaxation and dual updates are skipped: the proximal
/// step is re-solved at the raw KKT iterate to clean up the terminal point.
pub fn admm_step<T>(
    vars: &mut Vars<T>,
    params: &Params<T>,
    kkt: &KktSystem<T>,
    cache: &ProxCache<T>,
    settings: &Settings<T>,
    ws: &mut Workspace<T>,
    polish: bool,
) -> Result<()>
where
    T: RealNumber,
{
    kkt.solve(vars, params, settings, &mut ws.kkt_rhs)?;

    if polish {
        for (ui, &xti, &wi, &si) in izip!(&mut ws.u, &vars.xt, &vars.w, &settings.sigma) {
            *ui = xti + wi / si;
        }
        let x_new = prox_step(cache, settings, &ws.u);
        vars.x = x_new;
        return Ok(());
    }

    let alpha = settings.alpha;
    let retained = T::one() - alpha;
    for (xhi, ui, &xti, &xi, &wi, &si) in izip!(
        &mut ws.xh,
        &mut ws.u,
        &vars.xt,
        &vars.x,
        &vars.w,
        &settings.sigma
    ) {
        *xhi = alpha * xti + retained * xi;
        *ui = *xhi + wi / si;
    }
    let x_new = prox_step(cache, settings, &ws.u);
    for (wi, &xhi, &xni, &si) in izip!(&mut vars.w, &ws.xh, &x_new, &settings.sigma) {
        *wi += si * (xhi - xni);
    }
    vars.x = x_new;
    for (yi, &zti, &zi, &ri) in izip!(&mut vars.y, &vars.zt, &vars.z, &settings.rho) {
        *yi += alpha * ri * (zti - zi);
    }
    Ok(())
}

/// Run ADMM to termination: factorize the KKT system and build the prox
/// cache once, then iterate `admm_step` until the selected termination
/// strategy fires or the iteration cap is reached.
pub fn optimize<T>(
    params: &Params<T>,
    settings: &Settings<T>,
    initial: Option<Vars<T>>,
) -> Result<Solution<T>>
where
    T: RealNumber,
{
    params.validate()?;
    settings.validate()?;
    let mut vars = match initial {
        Some(vars) => {
            vars.validate(params)?;
            vars
        }
        None => Vars::zeros(params),
    };
    check_consistent(params, settings, &vars)?;
    // the feasible set forces z = b for the whole run
    vars.z.clone_from(&params.b);

    let timer = Timer::start();
    let kkt = KktSystem::factorize(params, settings)?;
    let cache = ProxCache::new(params);
    let mut term = term_cache_for(params, settings, &vars)?;
    let mut ws = Workspace::new(params.num_vars(), params.num_constrs());
    let mut stats = Stats::new();
    let mut status = Status::MaxIterations;
    let mut completed = 0;

    for iter in 1..=settings.max_iters {
        admm_step(&mut vars, params, &kkt, &cache, settings, &mut ws, false)?;
        completed = iter;
        if settings.compute_stats {
            stats.record(objective(params, &vars.x), residual(params, &vars), iter);
        }
        if iter % settings.term_cond_freq == 0 {
            match term.check(&vars, params, settings, iter) {
                TermStatus::Continue => {}
                TermStatus::Converged => {
                    status = Status::Converged;
                    break;
                }
                TermStatus::NotImproving => {
                    status = Status::NotImproving;
                    if let Some(best) = term.best_vars() {
                        vars = best.clone();
                    }
                    break;
                }
            }
        }
    }

    if settings.polish {
        admm_step(&mut vars, params, &kkt, &cache, settings, &mut ws, true)?;
        if settings.compute_stats {
            stats.record(
                objective(params, &vars.x),
                residual(params, &vars),
                completed,
            );
        }
    }

    stats.iters = completed;
    stats.solve_time = timer.elapsed();
    debug!(?status, iters = completed, "ADMM finished");
    Ok(Solution {
        vars,
        stats,
        status,
    })
}
