use std::cmp::Ordering;

/// Empirical quantile of an ascending-sorted sample set, computed with
/// linear interpolation between order statistics at fractional rank
/// `level * (n - 1)` (the R type 7 convention). Returns `None` for an empty
/// sample set; a single sample is returned for every level.
pub fn empirical_quantile_sorted(sorted: &[f64], level: f64) -> Option<f64> {
    assert!(
        (0.0..=1.0).contains(&level),
        "quantile level out of range: {}",
        level
    );
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let rank = level * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - rank.floor();
    if lo + 1 >= n {
        return Some(sorted[n - 1]);
    }
    Some(sorted[lo] + frac * (sorted[lo + 1] - sorted[lo]))
}

/// Sorts `values` ascending, then computes the empirical quantile.
pub fn empirical_quantile(values: &mut [f64], level: f64) -> Option<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    empirical_quantile_sorted(values, level)
}
