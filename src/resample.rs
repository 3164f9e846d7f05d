use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

use crate::ensemble::Ensemble;
use crate::quantile::empirical_quantile_sorted;
use crate::summary::LookupError;

/// One requested output column, parsed from a `KEY:QUANTILE` token: the
/// trailing ":"-separated segment is the quantile level, everything before
/// it is the variable key (which may itself contain ":").
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileRequest {
    pub key: String,
    pub level: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseRequestError {
    #[error("'{0}' is malformed - expected KEY:QUANTILE, e.g. WWCT:OP_3:0.75")]
    MissingSeparator(String),
    #[error("'{token}' does not end in a numeric quantile level")]
    BadLevel {
        token: String,
        source: std::num::ParseFloatError,
    },
    #[error("quantile level {level} in '{token}' is outside [0, 1)")]
    LevelOutOfRange { token: String, level: f64 },
}

impl FromStr for QuantileRequest {
    type Err = ParseRequestError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (key, level_part) = token
            .rsplit_once(':')
            .ok_or_else(|| ParseRequestError::MissingSeparator(token.to_string()))?;
        if key.is_empty() {
            return Err(ParseRequestError::MissingSeparator(token.to_string()));
        }
        let level: f64 = level_part
            .parse()
            .map_err(|source| ParseRequestError::BadLevel {
                token: token.to_string(),
                source,
            })?;
        if !(0.0..1.0).contains(&level) {
            return Err(ParseRequestError::LevelOutOfRange {
                token: token.to_string(),
                level,
            });
        }
        Ok(Self {
            key: key.to_string(),
            level,
        })
    }
}

/// Quantile values with rows = interpolation timesteps and columns =
/// requests in declaration order, in one contiguous row-major buffer.
#[derive(Debug)]
pub struct ResultMatrix {
    rows: usize,
    columns: usize,
    values: Vec<f64>,
}

impl ResultMatrix {
    fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            values: vec![0.0; rows * columns],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        assert!(
            row < self.rows && column < self.columns,
            "matrix index ({}, {}) out of bounds ({}, {})",
            row,
            column,
            self.rows,
            self.columns
        );
        self.values[row * self.columns + column]
    }

    fn set(&mut self, row: usize, column: usize, value: f64) {
        assert!(
            row < self.rows && column < self.columns,
            "matrix index ({}, {}) out of bounds ({}, {})",
            row,
            column,
            self.rows,
            self.columns
        );
        self.values[row * self.columns + column] = value;
    }
}

#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("no case covers timestep {time} for variable '{key}'")]
    EmptySample { key: String, time: i64 },
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Resamples every requested column over the ensemble's interpolation axis.
///
/// Per timestep, the sample set of a variable is the value of every case
/// whose native range covers the timestep, both ends inclusive; cases that
/// start later or end earlier contribute nothing, which is expected for
/// ensembles with differing simulated durations. Sample sets are gathered
/// and sorted once per row and shared by requests with the same key, then
/// cleared (allocations kept) before the next row.
pub fn resample(
    ensemble: &Ensemble,
    requests: &[QuantileRequest],
) -> Result<ResultMatrix, ResampleError> {
    let axis = ensemble.interp_times();
    let mut matrix = ResultMatrix::new(axis.len(), requests.len());
    let mut cache: HashMap<&str, Vec<f64>> = HashMap::new();

    for (row, &t) in axis.iter().enumerate() {
        for (column, request) in requests.iter().enumerate() {
            let samples = cache.entry(request.key.as_str()).or_default();
            if samples.is_empty() {
                gather_samples(ensemble, &request.key, t, samples)?;
            }
            let value = empirical_quantile_sorted(samples, request.level).ok_or_else(|| {
                ResampleError::EmptySample {
                    key: request.key.clone(),
                    time: t,
                }
            })?;
            matrix.set(row, column, value);
        }
        for samples in cache.values_mut() {
            samples.clear();
        }
    }
    Ok(matrix)
}

fn gather_samples(
    ensemble: &Ensemble,
    key: &str,
    t: i64,
    samples: &mut Vec<f64>,
) -> Result<(), ResampleError> {
    for case in ensemble.cases() {
        if case.covers(t) {
            samples.push(case.value_at(key, t)?);
        }
    }
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(())
}
