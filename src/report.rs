use anyhow::{Context, Result};
use chrono::DateTime;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::ensemble::Ensemble;
use crate::resample::{QuantileRequest, ResultMatrix};
use crate::summary::SummaryVector;

const SECONDS_PER_DAY: f64 = 86400.0;

/// The closed set of output layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    S3Graph,
    Header,
    Plain,
}

#[derive(Debug, Error, PartialEq)]
#[error("unrecognized output format '{0}' - expected S3GRAPH, HEADER or PLAIN")]
pub struct ParseFormatError(String);

impl FromStr for OutputFormat {
    type Err = ParseFormatError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "S3GRAPH" => Ok(OutputFormat::S3Graph),
            "HEADER" => Ok(OutputFormat::Header),
            "PLAIN" => Ok(OutputFormat::Plain),
            _ => Err(ParseFormatError(tag.to_string())),
        }
    }
}

/// Renders the matrix in the requested layout. Columns follow the request
/// order; units and qualifiers come from the ensemble's reference case.
/// `path` names the destination file (S3GRAPH embeds its stem as ORIGIN).
pub fn render(
    format: OutputFormat,
    path: &Path,
    requests: &[QuantileRequest],
    ensemble: &Ensemble,
    matrix: &ResultMatrix,
) -> Result<String> {
    match format {
        OutputFormat::S3Graph => render_s3graph(path, requests, ensemble, matrix),
        OutputFormat::Header => render_plain(requests, ensemble, matrix, true),
        OutputFormat::Plain => render_plain(requests, ensemble, matrix, false),
    }
}

/// Renders and writes one output file, creating parent directories as
/// needed.
pub fn write_output(
    path: &Path,
    format: OutputFormat,
    requests: &[QuantileRequest],
    ensemble: &Ensemble,
    matrix: &ResultMatrix,
) -> Result<()> {
    let text = render(format, path, requests, ensemble, matrix)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create output directory {}", parent.display()))?;
        }
    }
    fs::write(path, text).with_context(|| format!("write output file {}", path.display()))?;
    Ok(())
}

fn day_offset(start: i64, t: i64) -> f64 {
    (t - start) as f64 / SECONDS_PER_DAY
}

fn format_date(t: i64, fmt: &str) -> Result<String> {
    let date = DateTime::from_timestamp(t, 0)
        .with_context(|| format!("timestep {} is outside the representable date range", t))?;
    Ok(date.format(fmt).to_string())
}

fn render_plain(
    requests: &[QuantileRequest],
    ensemble: &Ensemble,
    matrix: &ResultMatrix,
    header: bool,
) -> Result<String> {
    let mut out = String::new();
    if header {
        out.push_str("--    DAYS      DATE    ");
        for request in requests {
            write!(out, " {:>18}:{:.2} ", request.key, request.level)?;
        }
        out.push('\n');
        out.push_str(&"-".repeat(24 + 25 * requests.len()));
        out.push('\n');
    }
    for row in 0..matrix.rows() {
        let t = ensemble.interp_times()[row];
        write!(out, "{:10.2} ", day_offset(ensemble.start_time(), t))?;
        write!(out, "  {} ", format_date(t, "%d/%m/%Y")?)?;
        for column in 0..matrix.columns() {
            write!(out, "{:24.5} ", matrix.get(row, column))?;
        }
        out.push('\n');
    }
    Ok(out)
}

fn render_s3graph(
    path: &Path,
    requests: &[QuantileRequest],
    ensemble: &Ensemble,
    matrix: &ResultMatrix,
) -> Result<String> {
    let reference = ensemble.reference_case();
    let mut columns = Vec::with_capacity(requests.len());
    for request in requests {
        let vector = reference.vector(&request.key).with_context(|| {
            format!(
                "reference case {} has no metadata for variable '{}'",
                reference.path().display(),
                request.key
            )
        })?;
        columns.push(vector);
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let mut out = String::new();
    writeln!(out, "ORIGIN {}", stem)?;

    out.push_str("      DATE       TIME ");
    for request in requests {
        let keyword = match request.key.split_once(':') {
            Some((keyword, _)) => keyword,
            None => request.key.as_str(),
        };
        write!(
            out,
            "{:>24} ",
            format!("{}:{:.2}", keyword, request.level)
        )?;
    }
    out.push('\n');

    out.push_str("                 DAYS ");
    for vector in &columns {
        write!(out, "{:>24} ", vector.unit)?;
    }
    out.push('\n');

    out.push_str("                      ");
    for vector in &columns {
        write!(out, "{:>24} ", qualifier(vector))?;
    }
    out.push('\n');

    for row in 0..matrix.rows() {
        let t = ensemble.interp_times()[row];
        write!(out, "{} ", format_date(t, "%d-%m-%Y")?)?;
        write!(out, "{:10.2} ", day_offset(ensemble.start_time(), t))?;
        for column in 0..matrix.columns() {
            write!(out, "{:24.5} ", matrix.get(row, column))?;
        }
        out.push('\n');
    }
    Ok(out)
}

/// Third S3GRAPH header line. A variable carrying both a well/group name
/// and a numeric qualifier gets them joined as `name:num`, a best-effort
/// layout for the downstream plotting tool.
fn qualifier(vector: &SummaryVector) -> String {
    let wgname = vector.wgname.as_deref().unwrap_or("");
    match (vector.kind.needs_wgname(), vector.kind.needs_num()) {
        (true, true) => match vector.num {
            Some(num) => format!("{}:{}", wgname, num),
            None => wgname.to_string(),
        },
        (true, false) => wgname.to_string(),
        (false, true) => match vector.num {
            Some(num) => num.to_string(),
            None => String::new(),
        },
        (false, false) => String::new(),
    }
}
