//! Probabilistic choice points.
//!
//! A [`ChoicePoint`] is one probabilistic decision made by code under
//! exploration. It is created the first time its decision site is reached and
//! then replayed: every later visit advances it to the next alternative until
//! all alternatives with non-zero probability have been taken. A
//! [`ChoiceTable`] owns the choice points of a run, keyed by decision site.
//!
//! The [`sample`] module holds the primitives that code *under* exploration
//! calls when it runs outside a search: draw an alternative from an explicit
//! distribution, a uniform one, a fair coin, or a six-sided die.

pub mod choice;
pub mod sample;
pub mod table;

pub use choice::ChoicePoint;
pub use sample::{choose, coin, die, uniform};
pub use table::ChoiceTable;

use thiserror::Error;

/// Tolerance on `|Σp - 1|` for explicit probability vectors.
pub const SUM_EPSILON: f64 = 1e-10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChoiceError {
    #[error("a choice needs at least one probability")]
    Empty,

    #[error("probability at index {index} must be a finite number in [0, 1], got {value}")]
    InvalidProbability { index: usize, value: f64 },

    #[error("probabilities must sum to 1.0, got {sum}")]
    SumMismatch { sum: f64 },

    #[error("a uniform choice needs at least one alternative")]
    ZeroAlternatives,

    #[error("a choice holds at most {max} alternatives, got {len}", max = u32::MAX)]
    TooManyAlternatives { len: usize },
}

/// Validate an explicit probability vector.
///
/// Entries are summed in ascending order, which keeps the round-off of many
/// small terms from swamping the comparison against 1.0.
pub(crate) fn check_probabilities(probabilities: &[f64]) -> Result<(), ChoiceError> {
    if probabilities.is_empty() {
        return Err(ChoiceError::Empty);
    }
    for (index, &value) in probabilities.iter().enumerate() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ChoiceError::InvalidProbability { index, value });
        }
    }

    let mut sorted = probabilities.to_vec();
    sorted.sort_by(f64::total_cmp);
    let sum: f64 = sorted.iter().sum();
    if (sum - 1.0).abs() > SUM_EPSILON {
        return Err(ChoiceError::SumMismatch { sum });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_sum() {
        assert!(matches!(
            check_probabilities(&[0.5, 0.49]),
            Err(ChoiceError::SumMismatch { .. })
        ));
    }

    #[test]
    fn test_accepts_exact_and_near_sums() {
        assert_eq!(check_probabilities(&[0.5, 0.5]), Ok(()));
        assert_eq!(check_probabilities(&[0.33, 0.33, 0.34]), Ok(()));
        assert_eq!(check_probabilities(&[0.1; 10]), Ok(()));
    }

    #[test]
    fn test_rejects_out_of_range_entries() {
        assert_eq!(
            check_probabilities(&[1.5, -0.5]),
            Err(ChoiceError::InvalidProbability {
                index: 0,
                value: 1.5
            })
        );
        assert!(matches!(
            check_probabilities(&[0.5, f64::NAN]),
            Err(ChoiceError::InvalidProbability { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(check_probabilities(&[]), Err(ChoiceError::Empty));
    }
}
