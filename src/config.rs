use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::report::{OutputFormat, ParseFormatError};
use crate::resample::{ParseRequestError, QuantileRequest};

/// Interpolation point count when the config gives no NUM_INTERP.
pub const DEFAULT_NUM_INTERP: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("line {line}: unknown keyword '{keyword}'")]
    UnknownKeyword { keyword: String, line: usize },
    #[error("line {line}: {keyword} {requirement}")]
    Usage {
        keyword: &'static str,
        requirement: &'static str,
        line: usize,
    },
    #[error("line {line}: cannot interpret '{value}' as an interpolation point count")]
    BadInterpCount { value: String, line: usize },
    #[error("line {line}: interpolation point count must be at least 2, got {value}")]
    InterpCountTooSmall { value: usize, line: usize },
    #[error("line {line}: {source}")]
    BadFormat {
        line: usize,
        source: ParseFormatError,
    },
    #[error("line {line}: {source}")]
    BadRequest {
        line: usize,
        source: ParseRequestError,
    },
    #[error("config file declares no {keyword}")]
    MissingKeyword { keyword: &'static str },
}

/// One OUTPUT declaration: destination, layout and the requested columns.
#[derive(Debug)]
pub struct OutputSpec {
    pub file: PathBuf,
    pub format: OutputFormat,
    pub requests: Vec<QuantileRequest>,
}

#[derive(Debug)]
pub struct QuantileConfig {
    pub case_patterns: Vec<String>,
    pub num_interp: usize,
    pub outputs: Vec<OutputSpec>,
}

impl QuantileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses the keyword config format: one keyword plus its arguments per
    /// line, `--` opens a comment anywhere on a line, blank lines are
    /// skipped. CASE_LIST and OUTPUT accumulate across repeats; a repeated
    /// NUM_INTERP keeps the last value.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut case_patterns: Vec<String> = Vec::new();
        let mut num_interp = DEFAULT_NUM_INTERP;
        let mut outputs: Vec<OutputSpec> = Vec::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line = index + 1;
            let content = match raw_line.find("--") {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            };
            let mut tokens = content.split_whitespace();
            let keyword = match tokens.next() {
                Some(keyword) => keyword,
                None => continue,
            };
            let args: Vec<&str> = tokens.collect();

            match keyword {
                "CASE_LIST" => {
                    if args.is_empty() {
                        return Err(ConfigError::Usage {
                            keyword: "CASE_LIST",
                            requirement: "needs at least one glob pattern",
                            line,
                        });
                    }
                    case_patterns.extend(args.iter().map(|s| s.to_string()));
                }
                "NUM_INTERP" => {
                    if args.len() != 1 {
                        return Err(ConfigError::Usage {
                            keyword: "NUM_INTERP",
                            requirement: "takes exactly one integer argument",
                            line,
                        });
                    }
                    let value: usize =
                        args[0].parse().map_err(|_| ConfigError::BadInterpCount {
                            value: args[0].to_string(),
                            line,
                        })?;
                    if value < 2 {
                        return Err(ConfigError::InterpCountTooSmall { value, line });
                    }
                    num_interp = value;
                }
                "OUTPUT" => {
                    if args.len() < 3 {
                        return Err(ConfigError::Usage {
                            keyword: "OUTPUT",
                            requirement:
                                "needs a file, a format and at least one KEY:QUANTILE token",
                            line,
                        });
                    }
                    let file = PathBuf::from(args[0]);
                    let format = OutputFormat::from_str(args[1])
                        .map_err(|source| ConfigError::BadFormat { line, source })?;
                    let mut requests = Vec::with_capacity(args.len() - 2);
                    for token in &args[2..] {
                        let request = QuantileRequest::from_str(token)
                            .map_err(|source| ConfigError::BadRequest { line, source })?;
                        requests.push(request);
                    }
                    outputs.push(OutputSpec {
                        file,
                        format,
                        requests,
                    });
                }
                _ => {
                    return Err(ConfigError::UnknownKeyword {
                        keyword: keyword.to_string(),
                        line,
                    })
                }
            }
        }

        if case_patterns.is_empty() {
            return Err(ConfigError::MissingKeyword {
                keyword: "CASE_LIST",
            });
        }
        if outputs.is_empty() {
            return Err(ConfigError::MissingKeyword { keyword: "OUTPUT" });
        }
        Ok(Self {
            case_patterns,
            num_interp,
            outputs,
        })
    }
}
