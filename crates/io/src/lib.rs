#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use sepq_core::math::Scalar;
use sepq_core::options::Settings;
use sepq_core::problem::Params;
use sepq_core::solution::Solution;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// On-disk problem: parameters plus optional settings. When settings are
/// absent, callers fall back to `Settings::defaults` for the problem's
/// dimensions.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonProblem {
    pub params: Params<Scalar>,
    #[serde(default)]
    pub settings: Option<Settings<Scalar>>,
}

pub fn read_json_problem<P: AsRef<Path>>(path: P) -> Result<JsonProblem> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .with_context(|| format!("failed to read {:?}", path))?;
    let problem: JsonProblem =
        serde_json::from_str(&contents).context("failed to parse JSON problem")?;
    problem
        .params
        .validate()
        .context("problem file has inconsistent dimensions")?;
    Ok(problem)
}

pub fn write_json_problem<P: AsRef<Path>>(path: P, problem: &JsonProblem) -> Result<()> {
    let file = File::create(path.as_ref())
        .with_context(|| format!("failed to create {:?}", path.as_ref()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, problem).context("failed to serialize problem")?;
    Ok(())
}

pub fn write_solution<P: AsRef<Path>>(path: P, solution: &Solution<Scalar>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create parent directory {:?}", parent))?;
        }
    }

    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, solution).context("failed to serialize solution")?;
    writer
        .flush()
        .with_context(|| format!("failed to write solution into {:?}", path))?;
    Ok(())
}
