//! Weighted distributions for probability-guided search.
//!
//! A [`Distribution`] is a bag of elements, each carrying a strictly positive
//! weight. It supports exactly three mutations:
//!
//! 1. **`add`** an element with a weight
//! 2. **`remove`** an element chosen at random, element `e` being chosen with
//!    probability `weight(e) / Σ weights`
//! 3. **`remove_max`** an element of maximum weight (ties resolve to the most
//!    recently inserted element)
//!
//! Elements are only ever reached by removing them. There is no
//! iteration or lookup in the contract.
//!
//! # Implementations
//!
//! - [`WeightedTree`]: red-black tree keyed by weight and augmented with
//!   subtree weight sums. `O(log n)` for every operation.
//! - [`SortedList`]: a vector re-sorted before every extraction. `O(n log n)`
//!   per extraction; useful for tiny frontiers and as a reference oracle.
//!
//! # Example
//!
//! ```
//! use probex_distribution::{Distribution, WeightedTree};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut tree = WeightedTree::new();
//! tree.add("heads", 0.5).unwrap();
//! tree.add("tails", 0.5).unwrap();
//! tree.add("edge", 0.01).unwrap();
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let drawn = tree.remove(&mut rng).unwrap();
//! assert!(drawn.weight() > 0.0);
//!
//! let max = tree.remove_max().unwrap();
//! assert!(max.weight() >= 0.01);
//! ```

pub mod list;
pub mod tree;
pub mod weighted;

pub use list::SortedList;
pub use tree::WeightedTree;
pub use weighted::Weighted;

use rand::Rng;
use thiserror::Error;

/// Precondition violations of the distribution contract.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DistributionError {
    #[error("cannot extract from an empty distribution")]
    Empty,

    #[error("weight must be > 0, got {0}")]
    NonPositiveWeight(f64),

    #[error("weight must be finite, got {0}")]
    NonFiniteWeight(f64),
}

/// A multiset of weighted elements supporting weighted-random and
/// maximum-weight extraction.
pub trait Distribution<E> {
    /// Whether the distribution holds no elements.
    fn is_empty(&self) -> bool;

    /// Add `element` with the given `weight`.
    ///
    /// # Errors
    ///
    /// Returns an error if `weight` is not a finite number greater than zero.
    fn add(&mut self, element: E, weight: f64) -> Result<(), DistributionError>;

    /// Remove an element chosen at random with probability proportional to
    /// its weight.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::Empty`] if there is nothing to remove.
    fn remove<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Weighted<E>, DistributionError>;

    /// Remove an element of maximum weight. Among equal weights the most
    /// recently added element is removed first.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::Empty`] if there is nothing to remove.
    fn remove_max(&mut self) -> Result<Weighted<E>, DistributionError>;
}

/// Check the weight precondition shared by every implementation.
pub(crate) fn check_weight(weight: f64) -> Result<(), DistributionError> {
    if weight.is_nan() || weight.is_infinite() {
        return Err(DistributionError::NonFiniteWeight(weight));
    }
    if weight <= 0.0 {
        return Err(DistributionError::NonPositiveWeight(weight));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_weight_accepts_positive() {
        assert!(check_weight(1e-300).is_ok());
        assert!(check_weight(12.5).is_ok());
    }

    #[test]
    fn test_check_weight_rejects_zero_and_negative() {
        assert_eq!(
            check_weight(0.0),
            Err(DistributionError::NonPositiveWeight(0.0))
        );
        assert_eq!(
            check_weight(-1.0),
            Err(DistributionError::NonPositiveWeight(-1.0))
        );
    }

    #[test]
    fn test_check_weight_rejects_non_finite() {
        assert!(matches!(
            check_weight(f64::NAN),
            Err(DistributionError::NonFiniteWeight(_))
        ));
        assert!(matches!(
            check_weight(f64::INFINITY),
            Err(DistributionError::NonFiniteWeight(_))
        ));
    }
}
