use clap::Parser;
use std::path::PathBuf;

const KEYWORD_HELP: &str = "\
CONFIG KEYWORDS:
  CASE_LIST <glob>...              Glob patterns selecting the summary cases
                                   of the ensemble. Repeatable; at least 10
                                   cases must match in total.
  NUM_INTERP <count>               Number of evenly spaced interpolation
                                   points spanning the ensemble time range
                                   (default 50, minimum 2).
  OUTPUT <file> <format> <tok>...  Write one quantile table. <format> is
                                   PLAIN, HEADER or S3GRAPH. Each token is
                                   KEY:QUANTILE, e.g. FOPT:0.90,
                                   WWCT:OP_3:0.75 or BPR:10,10,5:0.50, with
                                   the quantile level in [0,1).

Lines may carry '--' comments. Rate vectors are sampled at the end of the
native step covering each interpolation point; all other vectors are
interpolated linearly between the two enclosing native points.";

/// Compute quantile tables over an ensemble of summary cases.
#[derive(Parser, Debug)]
#[command(version, about, after_help = KEYWORD_HELP)]
pub struct Args {
    /// Keyword config file driving the run
    pub config: PathBuf,
}
