use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaseError {
    #[error("failed to read summary case {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse summary case {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("summary case {} has an empty time vector", path.display())]
    EmptyTime { path: PathBuf },
    #[error("summary case {} has a non-increasing time vector", path.display())]
    UnsortedTime { path: PathBuf },
    #[error(
        "summary case {}: vector {key} has {found} values for {expected} timestamps",
        path.display()
    )]
    LengthMismatch {
        path: PathBuf,
        key: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("variable '{key}' is not present in case {}", case.display())]
    UnknownKey { key: String, case: PathBuf },
    #[error("time {time} is outside the native range of case {}", case.display())]
    OutOfRange { case: PathBuf, time: i64 },
}

/// What a summary vector measures, which decides the qualifier a formatter
/// has to print next to it: well/group/completion vectors carry a well or
/// group name, region/block/completion vectors carry a numeric qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Field,
    Well,
    Group,
    Region,
    Block,
    Completion,
    #[default]
    Misc,
}

impl VariableKind {
    pub fn needs_wgname(self) -> bool {
        matches!(
            self,
            VariableKind::Well | VariableKind::Group | VariableKind::Completion
        )
    }

    pub fn needs_num(self) -> bool {
        matches!(
            self,
            VariableKind::Region | VariableKind::Block | VariableKind::Completion
        )
    }
}

/// One variable of a summary case: metadata plus one value per native
/// timestep. Rate vectors hold per-step averages attributed to step end and
/// are never interpolated.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryVector {
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub kind: VariableKind,
    #[serde(default)]
    pub wgname: Option<String>,
    #[serde(default)]
    pub num: Option<i32>,
    #[serde(default)]
    pub rate: bool,
    pub values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct CaseFile {
    time: Vec<DateTime<Utc>>,
    vectors: BTreeMap<String, SummaryVector>,
}

/// One loaded simulation run: a strictly increasing native time grid
/// (epoch seconds) and the vectors defined on it. Immutable after load.
#[derive(Debug)]
pub struct SummaryCase {
    path: PathBuf,
    times: Vec<i64>,
    vectors: BTreeMap<String, SummaryVector>,
}

impl SummaryCase {
    pub fn load(path: &Path) -> Result<Self, CaseError> {
        let data = fs::read(path).map_err(|source| CaseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &data)
    }

    /// Parses raw case JSON; `path` only labels the case in diagnostics.
    pub fn parse(path: &Path, data: &[u8]) -> Result<Self, CaseError> {
        let file: CaseFile = serde_json::from_slice(data).map_err(|source| CaseError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let times: Vec<i64> = file.time.iter().map(|t| t.timestamp()).collect();
        if times.is_empty() {
            return Err(CaseError::EmptyTime {
                path: path.to_path_buf(),
            });
        }
        if times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CaseError::UnsortedTime {
                path: path.to_path_buf(),
            });
        }
        for (key, vector) in &file.vectors {
            if vector.values.len() != times.len() {
                return Err(CaseError::LengthMismatch {
                    path: path.to_path_buf(),
                    key: key.clone(),
                    expected: times.len(),
                    found: vector.values.len(),
                });
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            times,
            vectors: file.vectors,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start_time(&self) -> i64 {
        self.times[0]
    }

    pub fn end_time(&self) -> i64 {
        self.times[self.times.len() - 1]
    }

    /// Whether `t` lies within the native time range, both ends inclusive.
    pub fn covers(&self, t: i64) -> bool {
        self.start_time() <= t && t <= self.end_time()
    }

    pub fn vector(&self, key: &str) -> Option<&SummaryVector> {
        self.vectors.get(key)
    }

    /// Vectors in sorted key order.
    pub fn vectors(&self) -> impl Iterator<Item = (&str, &SummaryVector)> {
        self.vectors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Value of `key` at time `t` on this case's native grid. State vectors
    /// interpolate linearly between the bracketing samples; rate vectors
    /// take the sample of the step ending at or after `t`.
    pub fn value_at(&self, key: &str, t: i64) -> Result<f64, LookupError> {
        let vector = self
            .vectors
            .get(key)
            .ok_or_else(|| LookupError::UnknownKey {
                key: key.to_string(),
                case: self.path.clone(),
            })?;
        if !self.covers(t) {
            return Err(LookupError::OutOfRange {
                case: self.path.clone(),
                time: t,
            });
        }
        match self.times.binary_search(&t) {
            Ok(i) => Ok(vector.values[i]),
            Err(i) => {
                // covers() guarantees 0 < i < len here
                if vector.rate {
                    Ok(vector.values[i])
                } else {
                    let t0 = self.times[i - 1] as f64;
                    let t1 = self.times[i] as f64;
                    let v0 = vector.values[i - 1];
                    let v1 = vector.values[i];
                    let w = (t as f64 - t0) / (t1 - t0);
                    Ok(v0 + w * (v1 - v0))
                }
            }
        }
    }
}
