use glob::glob;
use rayon::prelude::*;
use thiserror::Error;

use crate::summary::{CaseError, SummaryCase};

/// Quantiles over fewer realizations than this are not statistically
/// meaningful; `finalize` refuses such ensembles outright.
pub const MIN_REALIZATIONS: usize = 10;

#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error("invalid CASE_LIST pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("failed to expand CASE_LIST pattern '{pattern}': {source}")]
    Expand {
        pattern: String,
        source: glob::GlobError,
    },
    #[error(transparent)]
    Case(#[from] CaseError),
    #[error("no summary cases were loaded from any CASE_LIST pattern")]
    Empty,
    #[error(
        "ensemble has {found} realizations - at least {} are required for meaningful quantiles",
        MIN_REALIZATIONS
    )]
    TooFewRealizations { found: usize },
    #[error("interpolation point count must be at least 2, got {0}")]
    TooFewInterpPoints(usize),
}

/// The set of runs being aggregated, their combined time bounds, and (after
/// `finalize`) the shared interpolation axis every case is resampled onto.
/// Case order follows CASE_LIST declaration order, with matches of one
/// pattern sorted, so runs and logs are reproducible.
#[derive(Debug, Default)]
pub struct Ensemble {
    cases: Vec<SummaryCase>,
    start_time: i64,
    end_time: i64,
    interp_times: Vec<i64>,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a loaded case and folds its native range into the ensemble
    /// bounds. The first case sets both bounds unconditionally.
    pub fn add_case(&mut self, case: SummaryCase) {
        if self.cases.is_empty() {
            self.start_time = case.start_time();
            self.end_time = case.end_time();
        } else {
            self.start_time = self.start_time.min(case.start_time());
            self.end_time = self.end_time.max(case.end_time());
        }
        self.cases.push(case);
    }

    /// Expands one CASE_LIST pattern and loads every match. File reads and
    /// JSON parsing run in parallel; the loaded cases are appended in the
    /// sorted match order. Returns the number of cases loaded.
    pub fn load_from_glob(&mut self, pattern: &str) -> Result<usize, EnsembleError> {
        let entries = glob(pattern).map_err(|source| EnsembleError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| EnsembleError::Expand {
                pattern: pattern.to_string(),
                source,
            })?;
            paths.push(path);
        }
        for path in &paths {
            println!("Loading case: {}", path.display());
        }
        let cases = paths
            .par_iter()
            .map(|path| SummaryCase::load(path))
            .collect::<Result<Vec<_>, CaseError>>()?;
        let loaded = cases.len();
        for case in cases {
            self.add_case(case);
        }
        Ok(loaded)
    }

    /// Validates the assembled ensemble, reports metadata disagreements and
    /// builds the shared interpolation axis. Call once, after every
    /// CASE_LIST pattern has been expanded.
    pub fn finalize(&mut self, num_interp: usize) -> Result<(), EnsembleError> {
        if self.cases.is_empty() {
            return Err(EnsembleError::Empty);
        }
        if self.cases.len() < MIN_REALIZATIONS {
            return Err(EnsembleError::TooFewRealizations {
                found: self.cases.len(),
            });
        }
        for warning in self.metadata_mismatches() {
            eprintln!("Warning: {}", warning);
        }
        self.interp_times = interpolation_axis(self.start_time, self.end_time, num_interp)?;
        Ok(())
    }

    /// Unit/kind disagreements between the reference case and the rest of
    /// the ensemble. The reference case answers every metadata query, so a
    /// mismatch means some case will be formatted under the wrong label.
    fn metadata_mismatches(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let (reference, rest) = match self.cases.split_first() {
            Some(pair) => pair,
            None => return warnings,
        };
        for case in rest {
            for (key, vector) in case.vectors() {
                let ref_vector = match reference.vector(key) {
                    Some(v) => v,
                    None => continue,
                };
                if vector.unit != ref_vector.unit {
                    warnings.push(format!(
                        "case {} reports unit '{}' for {}, reference case {} has '{}'",
                        case.path().display(),
                        vector.unit,
                        key,
                        reference.path().display(),
                        ref_vector.unit
                    ));
                }
                if vector.kind != ref_vector.kind {
                    warnings.push(format!(
                        "case {} reports kind {:?} for {}, reference case {} has {:?}",
                        case.path().display(),
                        vector.kind,
                        key,
                        reference.path().display(),
                        ref_vector.kind
                    ));
                }
            }
        }
        warnings
    }

    pub fn cases(&self) -> &[SummaryCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// The case answering variable-metadata queries for formatting. Only
    /// meaningful once the ensemble holds at least one case.
    pub fn reference_case(&self) -> &SummaryCase {
        &self.cases[0]
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    /// The shared interpolation axis. Empty before `finalize`.
    pub fn interp_times(&self) -> &[i64] {
        &self.interp_times
    }
}

/// `num_interp` evenly spaced epoch-second stamps from `start` to `end`,
/// both inclusive. Spacing truncates to whole seconds, so interior points
/// can fall up to a second early; the endpoints are always exact.
pub fn interpolation_axis(
    start: i64,
    end: i64,
    num_interp: usize,
) -> Result<Vec<i64>, EnsembleError> {
    if num_interp < 2 {
        return Err(EnsembleError::TooFewInterpPoints(num_interp));
    }
    let span = end - start;
    let steps = (num_interp - 1) as i64;
    Ok((0..num_interp as i64)
        .map(|i| start + i * span / steps)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use proptest::prelude::*;
    use serde_json::json;
    use std::path::Path;

    fn rfc3339(t: i64) -> String {
        DateTime::from_timestamp(t, 0).unwrap().to_rfc3339()
    }

    fn constant_case(name: &str, start: i64, end: i64, value: f64) -> SummaryCase {
        let text = json!({
            "time": [rfc3339(start), rfc3339(end)],
            "vectors": { "FOPT": { "unit": "SM3", "kind": "field", "values": [value, value] } }
        })
        .to_string();
        SummaryCase::parse(Path::new(name), text.as_bytes()).unwrap()
    }

    #[test]
    fn axis_needs_at_least_two_points() {
        assert!(matches!(
            interpolation_axis(0, 100, 1),
            Err(EnsembleError::TooFewInterpPoints(1))
        ));
        assert!(matches!(
            interpolation_axis(0, 100, 0),
            Err(EnsembleError::TooFewInterpPoints(0))
        ));
    }

    #[test]
    fn two_point_axis_is_the_bounds() {
        assert_eq!(interpolation_axis(0, 100, 2).unwrap(), vec![0, 100]);
    }

    #[test]
    fn axis_truncates_interior_points() {
        // 10 / 3 truncates, the end stays exact
        assert_eq!(interpolation_axis(0, 10, 4).unwrap(), vec![0, 3, 6, 10]);
    }

    #[test]
    fn bounds_are_order_independent() {
        let ranges = [(20i64, 80i64), (0, 50), (10, 100), (30, 40)];
        let mut forward = Ensemble::new();
        for (i, (s, e)) in ranges.iter().enumerate() {
            forward.add_case(constant_case(&format!("f{}", i), *s, *e, 1.0));
        }
        let mut reverse = Ensemble::new();
        for (i, (s, e)) in ranges.iter().enumerate().rev() {
            reverse.add_case(constant_case(&format!("r{}", i), *s, *e, 1.0));
        }
        assert_eq!(forward.start_time(), 0);
        assert_eq!(forward.end_time(), 100);
        assert_eq!(reverse.start_time(), forward.start_time());
        assert_eq!(reverse.end_time(), forward.end_time());
    }

    #[test]
    fn first_case_sets_both_bounds() {
        let mut ensemble = Ensemble::new();
        ensemble.add_case(constant_case("a", 5, 10, 1.0));
        assert_eq!(ensemble.start_time(), 5);
        assert_eq!(ensemble.end_time(), 10);
    }

    #[test]
    fn finalize_rejects_small_ensembles() {
        let mut ensemble = Ensemble::new();
        assert!(matches!(ensemble.finalize(50), Err(EnsembleError::Empty)));

        for i in 0..5 {
            ensemble.add_case(constant_case(&format!("c{}", i), 0, 100, i as f64));
        }
        assert!(matches!(
            ensemble.finalize(50),
            Err(EnsembleError::TooFewRealizations { found: 5 })
        ));
    }

    #[test]
    fn finalize_accepts_ten_cases_and_builds_the_axis() {
        let mut ensemble = Ensemble::new();
        for i in 0..MIN_REALIZATIONS {
            ensemble.add_case(constant_case(&format!("c{}", i), 0, 100, i as f64));
        }
        ensemble.finalize(5).unwrap();
        assert_eq!(ensemble.interp_times(), &[0, 25, 50, 75, 100]);
    }

    #[test]
    fn metadata_mismatches_are_reported() {
        let mut ensemble = Ensemble::new();
        ensemble.add_case(constant_case("ref", 0, 100, 1.0));
        let odd = json!({
            "time": [rfc3339(0), rfc3339(100)],
            "vectors": { "FOPT": { "unit": "M3", "kind": "well", "values": [1.0, 1.0] } }
        })
        .to_string();
        ensemble.add_case(SummaryCase::parse(Path::new("odd"), odd.as_bytes()).unwrap());

        let warnings = ensemble.metadata_mismatches();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("unit 'M3'"));
        assert!(warnings[1].contains("kind"));
    }

    #[test]
    fn keys_missing_from_the_reference_case_are_not_flagged() {
        let mut ensemble = Ensemble::new();
        ensemble.add_case(constant_case("ref", 0, 100, 1.0));
        let extra = json!({
            "time": [rfc3339(0), rfc3339(100)],
            "vectors": { "WWCT:OP_1": { "kind": "well", "values": [0.1, 0.2] } }
        })
        .to_string();
        ensemble.add_case(SummaryCase::parse(Path::new("extra"), extra.as_bytes()).unwrap());
        assert!(ensemble.metadata_mismatches().is_empty());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut ensemble = Ensemble::new();
        assert!(matches!(
            ensemble.load_from_glob("cases/***.json"),
            Err(EnsembleError::Pattern { .. })
        ));
    }

    proptest! {
        #[test]
        fn axis_spans_the_bounds_evenly(
            start in -1_000_000_000i64..1_000_000_000,
            span in 1i64..2_000_000_000,
            n in 2usize..200,
        ) {
            let end = start + span;
            let axis = interpolation_axis(start, end, n).unwrap();
            prop_assert_eq!(axis.len(), n);
            prop_assert_eq!(axis[0], start);
            prop_assert_eq!(axis[n - 1], end);
            let ideal = span as f64 / (n - 1) as f64;
            for w in axis.windows(2) {
                prop_assert!(w[1] >= w[0]);
                prop_assert!(((w[1] - w[0]) as f64 - ideal).abs() <= 1.0);
            }
        }
    }
}
