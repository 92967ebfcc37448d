#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sepq_api::{Scalar, Settings, Solution, Solver, TermCondKind};
use sepq_io::{read_json_problem, write_solution};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sepq")]
#[command(version, about = "ADMM solver for linearly constrained separable problems")]
struct Cli {
    #[arg(long)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a JSON problem file.
    Solve {
        #[arg(long)]
        problem: PathBuf,
        #[arg(long)]
        max_iters: Option<usize>,
        #[arg(long)]
        eps: Option<f64>,
        #[arg(long)]
        term_cond: Option<TermCondArg>,
        #[arg(long)]
        polish: bool,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Validate a JSON problem file without solving it.
    Check {
        #[arg(long)]
        problem: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TermCondArg {
    Converge,
    FirstVars,
}

impl From<TermCondArg> for TermCondKind {
    fn from(arg: TermCondArg) -> TermCondKind {
        match arg {
            TermCondArg::Converge => TermCondKind::Converge,
            TermCondArg::FirstVars => TermCondKind::FirstVars,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(cli.log_json);
    match cli.command {
        Commands::Solve {
            problem,
            max_iters,
            eps,
            term_cond,
            polish,
            output,
            json,
        } => solve_command(problem, max_iters, eps, term_cond, polish, output, json),
        Commands::Check { problem } => check_command(problem),
    }
}

fn initialize_tracing(log_json: bool) {
    if log_json {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .try_init()
            .ok();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init()
            .ok();
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_command(
    path: PathBuf,
    max_iters: Option<usize>,
    eps: Option<f64>,
    term_cond: Option<TermCondArg>,
    polish: bool,
    output: Option<PathBuf>,
    output_json: bool,
) -> Result<()> {
    let problem = read_json_problem(&path)?;
    let mut settings = problem.settings.unwrap_or_else(|| {
        Settings::<Scalar>::defaults(problem.params.num_vars(), problem.params.num_constrs())
    });
    if let Some(iters) = max_iters {
        settings.max_iters = iters;
    }
    if let Some(threshold) = eps {
        settings.eps = threshold as Scalar;
    }
    if let Some(kind) = term_cond {
        settings.term_cond = kind.into();
    }
    if polish {
        settings.polish = true;
    }
    settings.compute_stats = true;

    info!(
        vars = problem.params.num_vars(),
        constrs = problem.params.num_constrs(),
        "solving problem from {:?}",
        path
    );
    let solution = Solver::new()
        .settings(settings)
        .solve(&problem.params)
        .context("solve failed")?;
    emit_solution(solution, output, output_json)
}

fn emit_solution(
    solution: Solution<Scalar>,
    output: Option<PathBuf>,
    output_json: bool,
) -> Result<()> {
    if output_json {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &solution)?;
        handle.write_all(b"\n")?;
        handle.flush()?;
    } else {
        println!("status: {:?}", solution.status);
        println!("iterations: {}", solution.iterations());
        if let (Some(obj), Some(res)) = (solution.stats.obj.last(), solution.stats.res.last()) {
            println!("objective: {obj:.6}");
            println!("residual: {res:.6e}");
        }
        println!("x: {:?}", solution.vars.x);
    }
    if let Some(path) = output {
        write_solution(path, &solution)?;
    }
    Ok(())
}

fn check_command(path: PathBuf) -> Result<()> {
    let problem = read_json_problem(&path)?;
    if let Some(settings) = &problem.settings {
        settings
            .validate()
            .context("settings validation failed")?;
    }
    println!(
        "problem OK: {} variables, {} constraints",
        problem.params.num_vars(),
        problem.params.num_constrs()
    );
    Ok(())
}
