//! Inter-pulse gap computation
//!
//! Converts an increasing sequence of event offsets within a recording, plus the
//! recording's total duration, into the gaps between consecutive events. The gap
//! before the first event and the gap after the last one are included, so the
//! gaps always cover the whole recording.

use crate::error::ComputeError;

/// Compute the gaps between sorted event offsets spanning `0..=total`.
///
/// Conceptually `0` is prepended and `total` appended to `values`, then
/// consecutive differences are taken. The result always has
/// `values.len() + 1` elements and sums to `total`.
///
/// # Errors
/// Returns [`ComputeError::InvalidInput`] when `values` is not sorted in
/// non-decreasing order, starts below zero, exceeds `total`, or when `total`
/// is negative or not finite.
///
/// # Example
/// ```
/// use vitals_flux::deltas::deltas;
///
/// let gaps = deltas(&[1.0, 2.5], 4.0).unwrap();
/// assert_eq!(gaps, vec![1.0, 1.5, 1.5]);
/// assert_eq!(deltas(&[], 4.0).unwrap(), vec![4.0]);
/// ```
pub fn deltas(values: &[f64], total: f64) -> Result<Vec<f64>, ComputeError> {
    check_preconditions(values, total)?;

    let mut gaps = Vec::with_capacity(values.len() + 1);
    let mut previous = 0.0;
    for &value in values {
        gaps.push(value - previous);
        previous = value;
    }
    gaps.push(total - previous);

    Ok(gaps)
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean gap of a recording; shorthand for `mean(&deltas(values, total)?)`
pub fn mean_gap(values: &[f64], total: f64) -> Result<f64, ComputeError> {
    let gaps = deltas(values, total)?;
    // deltas never returns an empty sequence
    Ok(gaps.iter().sum::<f64>() / gaps.len() as f64)
}

fn check_preconditions(values: &[f64], total: f64) -> Result<(), ComputeError> {
    if !total.is_finite() {
        return Err(ComputeError::InvalidInput(format!(
            "total duration must be finite, got {total}"
        )));
    }

    if let Some(pos) = values.iter().position(|v| v.is_nan()) {
        return Err(ComputeError::InvalidInput(format!(
            "value at position {pos} is NaN"
        )));
    }

    if let Some(pos) = values.windows(2).position(|w| w[0] > w[1]) {
        return Err(ComputeError::InvalidInput(format!(
            "values are not sorted: {} at position {} is followed by {}",
            values[pos],
            pos,
            values[pos + 1]
        )));
    }

    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) => {
            if first < 0.0 {
                return Err(ComputeError::InvalidInput(format!(
                    "values must be non-negative, first value is {first}"
                )));
            }
            if last > total {
                return Err(ComputeError::InvalidInput(format!(
                    "last value {last} exceeds total duration {total}"
                )));
            }
        }
        _ => {
            if total < 0.0 {
                return Err(ComputeError::InvalidInput(format!(
                    "total duration must be non-negative, got {total}"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: &[f64], expected: &[f64], rtol: f64) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!(
                (a - e).abs() <= rtol * e.abs().max(f64::MIN_POSITIVE),
                "{actual:?} vs {expected:?}"
            );
        }
    }

    #[test]
    fn test_worked_example() {
        let gaps = deltas(&[0.98, 2.51, 2.82, 3.39], 4.0).unwrap();
        assert_close(&gaps, &[0.98, 1.53, 0.31, 0.57, 0.61], 1e-3);
    }

    #[test]
    fn test_length_is_one_more_than_values() {
        let gaps = deltas(&[0.98, 2.51, 2.82], 4.0).unwrap();
        assert_eq!(gaps.len(), 4);
    }

    #[test]
    fn test_empty_values_span_whole_duration() {
        assert_eq!(deltas(&[], 4.0).unwrap(), vec![4.0]);
        assert_eq!(deltas(&[], 0.0).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_unsorted_values_rejected() {
        let result = deltas(&[2.0, 1.0], 4.0);
        assert!(matches!(result, Err(ComputeError::InvalidInput(_))));
    }

    #[test]
    fn test_value_beyond_total_rejected() {
        let result = deltas(&[1.0, 5.0], 4.0);
        assert!(matches!(result, Err(ComputeError::InvalidInput(_))));
    }

    #[test]
    fn test_negative_total_on_empty_rejected() {
        let result = deltas(&[], -1.0);
        assert!(matches!(result, Err(ComputeError::InvalidInput(_))));
    }

    #[test]
    fn test_negative_first_value_rejected() {
        let result = deltas(&[-0.5, 1.0], 4.0);
        assert!(matches!(result, Err(ComputeError::InvalidInput(_))));
    }

    #[test]
    fn test_nan_rejected() {
        assert!(deltas(&[1.0, f64::NAN, 2.0], 4.0).is_err());
        assert!(deltas(&[f64::NAN], 4.0).is_err());
        assert!(deltas(&[1.0], f64::NAN).is_err());
        assert!(deltas(&[], f64::INFINITY).is_err());
    }

    #[test]
    fn test_repeated_and_boundary_values() {
        assert_eq!(deltas(&[1.0, 1.0], 1.0).unwrap(), vec![1.0, 0.0, 0.0]);
        assert_eq!(deltas(&[0.0], 0.0).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_mean_gap() {
        // 4 seconds split into 5 gaps
        let value = mean_gap(&[0.98, 2.51, 2.82, 3.39], 4.0).unwrap();
        assert!((value - 0.8).abs() < 1e-12);
        assert!(mean_gap(&[3.0, 2.0], 4.0).is_err());
    }

    fn sorted_values_and_total() -> impl Strategy<Value = (Vec<f64>, f64)> {
        (prop::collection::vec(0.0f64..1_000.0, 0..64), 0.0f64..100.0).prop_map(
            |(mut values, slack)| {
                values.sort_by(|a, b| a.partial_cmp(b).unwrap());
                let total = values.last().copied().unwrap_or(0.0) + slack;
                (values, total)
            },
        )
    }

    proptest! {
        #[test]
        fn prop_gaps_cover_total((values, total) in sorted_values_and_total()) {
            let gaps = deltas(&values, total).unwrap();

            prop_assert_eq!(gaps.len(), values.len() + 1);
            prop_assert!(gaps.iter().all(|g| *g >= 0.0));

            let sum: f64 = gaps.iter().sum();
            prop_assert!((sum - total).abs() <= 1e-9 * total.max(1.0));
        }

        #[test]
        fn prop_matches_padded_differences((values, total) in sorted_values_and_total()) {
            let mut padded = vec![0.0];
            padded.extend_from_slice(&values);
            padded.push(total);
            let expected: Vec<f64> = padded.windows(2).map(|w| w[1] - w[0]).collect();

            prop_assert_eq!(deltas(&values, total).unwrap(), expected);
        }
    }
}
