//! Statistical helpers shared by analyzers and the scorer.
//!
//! Everything here is total: empty input, zero means and non-finite values
//! produce a defined result rather than NaN or a panic.

use ndarray::Array1;

use crate::Series;

/// Minimum threshold for a mean or standard deviation to be treated as non-zero.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Clamp into [0, 1]. NaN maps to 0.
#[must_use]
pub const fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Arithmetic mean of the finite values, `None` when there are none.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    let finite: Array1<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    finite.mean()
}

/// Sample standard deviation (ddof = 1) of the finite values.
///
/// Returns `None` with fewer than two finite values.
#[must_use]
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let finite: Array1<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    (finite.len() >= 2).then(|| finite.std(1.0))
}

/// Compound annual growth rate between `first` and `last` over `periods` years.
///
/// Both endpoints must be positive and `periods` non-zero.
#[must_use]
pub fn cagr(first: f64, last: f64, periods: usize) -> Option<f64> {
    if periods == 0 || first <= 0.0 || last <= 0.0 || !first.is_finite() || !last.is_finite() {
        return None;
    }
    Some((last / first).powf(1.0 / periods as f64) - 1.0)
}

/// CAGR between the first and last present values of a series.
///
/// Periods are the year distance between those slots, so gaps in the middle
/// do not shorten the horizon.
#[must_use]
pub fn series_cagr(series: &Series) -> Option<f64> {
    let (first, last, periods) = series.endpoints()?;
    cagr(first, last, periods)
}

/// Sample coefficient of variation, `std / |mean|`.
///
/// `None` with fewer than two values or a mean indistinguishable from zero.
#[must_use]
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if m.abs() < MIN_STD_THRESHOLD {
        return None;
    }
    sample_std(values).map(|s| s / m.abs())
}

/// Stability of a series in [0, 1]: `1 / (1 + CV)`.
///
/// Fewer than two values or a zero mean score 0.
#[must_use]
pub fn stability_score(values: &[f64]) -> f64 {
    coefficient_of_variation(values).map_or(0.0, |cv| 1.0 / (1.0 + cv))
}

/// Direction and strength of a series in [-1, 1].
///
/// Averages the sequential relative changes (a zero base counts as no change)
/// and squashes the average with `2 / (1 + e^(-5x)) - 1`.
#[must_use]
pub fn trend_score(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let changes: Vec<f64> = values
        .windows(2)
        .map(|pair| {
            if pair[0] == 0.0 {
                0.0
            } else {
                (pair[1] - pair[0]) / pair[0].abs()
            }
        })
        .collect();
    let avg = mean(&changes).unwrap_or(0.0);
    2.0 / (1.0 + (-5.0 * avg).exp()) - 1.0
}

/// [`trend_score`] rescaled to [0, 1]; a flat series scores 0.5.
#[must_use]
pub fn trend_unit(values: &[f64]) -> f64 {
    clamp_unit((trend_score(values) + 1.0) / 2.0)
}

/// Fraction of values that are strictly positive. `None` when empty.
#[must_use]
pub fn positive_fraction(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let positive = values.iter().filter(|v| **v > 0.0).count();
    Some(positive as f64 / values.len() as f64)
}

/// 1-based average ranks, ascending. Ties share the mean of their ranks.
///
/// NaN sorts below every number.
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end hold equal values; ranks are start+1 ..= end.
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clamp_unit() {
        assert_relative_eq!(clamp_unit(0.4), 0.4);
        assert_relative_eq!(clamp_unit(-3.0), 0.0);
        assert_relative_eq!(clamp_unit(f64::INFINITY), 1.0);
        assert_relative_eq!(clamp_unit(f64::NAN), 0.0);
    }

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values).unwrap(), 5.0);
        assert_relative_eq!(sample_std(&values).unwrap(), 2.138_089_935, epsilon = 1e-8);
        assert!(mean(&[]).is_none());
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_cagr() {
        assert_relative_eq!(cagr(100.0, 121.0, 2).unwrap(), 0.10, epsilon = 1e-12);
        assert!(cagr(0.0, 121.0, 2).is_none());
        assert!(cagr(100.0, -5.0, 2).is_none());
        assert!(cagr(100.0, 121.0, 0).is_none());
    }

    #[test]
    fn test_series_cagr_spans_gaps() {
        let series = Series::new(vec![Some(100.0), None, Some(121.0)]);
        assert_relative_eq!(series_cagr(&series).unwrap(), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_stability() {
        assert_relative_eq!(stability_score(&[5.0, 5.0, 5.0]), 1.0);
        assert_relative_eq!(stability_score(&[5.0]), 0.0);
        assert_relative_eq!(stability_score(&[-1.0, 1.0]), 0.0);
        let s = stability_score(&[1.0, 2.0, 3.0]);
        assert!(s > 0.0 && s < 1.0);
    }

    #[test]
    fn test_trend() {
        assert_relative_eq!(trend_score(&[1.0, 1.0, 1.0]), 0.0);
        assert!(trend_score(&[1.0, 2.0, 4.0]) > 0.0);
        assert!(trend_score(&[4.0, 2.0, 1.0]) < 0.0);
        assert_relative_eq!(trend_unit(&[3.0, 3.0]), 0.5);
        // A zero base contributes no change.
        assert_relative_eq!(trend_score(&[0.0, 10.0]), 0.0);
        for values in [[1e9, -1e9], [-1.0, 1e12]] {
            let t = trend_score(&values);
            assert!((-1.0..=1.0).contains(&t));
        }
    }

    #[test]
    fn test_positive_fraction() {
        assert_relative_eq!(positive_fraction(&[1.0, -1.0, 2.0, 0.0]).unwrap(), 0.5);
        assert!(positive_fraction(&[]).is_none());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[0.5, 0.2, 0.5, 0.9]);
        assert_eq!(ranks, vec![2.5, 1.0, 2.5, 4.0]);
        assert!(average_ranks(&[]).is_empty());
    }
}
