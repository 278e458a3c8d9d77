//! Sorted-list distribution.

use crate::weighted::Weighted;
use crate::{check_weight, Distribution, DistributionError};
use rand::Rng;

/// A [`Distribution`] backed by a vector that is sorted by weight before
/// every extraction.
///
/// Summing in ascending weight order keeps rounding error low, which makes
/// this the reference implementation that [`WeightedTree`](crate::WeightedTree)
/// is checked against.
#[derive(Debug, Clone)]
pub struct SortedList<E> {
    entries: Vec<Weighted<E>>,
}

impl<E> SortedList<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all stored weights, accumulated in ascending order.
    pub fn total_weight(&self) -> f64 {
        let mut weights: Vec<f64> = self.entries.iter().map(Weighted::weight).collect();
        weights.sort_by(f64::total_cmp);
        weights.iter().sum()
    }

    /// Stable sort, so equal weights keep insertion order.
    fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.weight().total_cmp(&b.weight()));
    }
}

impl<E> Default for SortedList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Distribution<E> for SortedList<E> {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn add(&mut self, element: E, weight: f64) -> Result<(), DistributionError> {
        check_weight(weight)?;
        self.entries.push(Weighted::new(element, weight));
        Ok(())
    }

    fn remove<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Weighted<E>, DistributionError> {
        if self.entries.is_empty() {
            return Err(DistributionError::Empty);
        }
        self.sort();

        let total: f64 = self.entries.iter().map(Weighted::weight).sum();
        let choice = total * rng.gen::<f64>();

        let mut index = 0;
        let mut running = self.entries[0].weight();
        while index + 1 < self.entries.len() && running < choice {
            index += 1;
            running += self.entries[index].weight();
        }
        Ok(self.entries.remove(index))
    }

    fn remove_max(&mut self) -> Result<Weighted<E>, DistributionError> {
        self.sort();
        self.entries.pop().ok_or(DistributionError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WeightedTree;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_list_empty() {
        let mut list: SortedList<&str> = SortedList::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(list.is_empty());
        assert_eq!(list.remove(&mut rng).unwrap_err(), DistributionError::Empty);
        assert_eq!(list.remove_max().unwrap_err(), DistributionError::Empty);
    }

    #[test]
    fn test_list_rejects_zero_weight() {
        let mut list = SortedList::new();
        assert!(list.add("x", 0.0).is_err());
        assert!(list.add("x", f64::INFINITY).is_err());
        assert!(list.is_empty());
    }

    #[test]
    fn test_list_remove_max_ties() {
        let mut list = SortedList::new();
        list.add("a", 0.5).unwrap();
        list.add("b", 0.9).unwrap();
        list.add("c", 0.9).unwrap();
        list.add("d", 0.1).unwrap();

        assert_eq!(*list.remove_max().unwrap().element(), "c");
        assert_eq!(*list.remove_max().unwrap().element(), "b");
        assert_eq!(*list.remove_max().unwrap().element(), "a");
        assert_eq!(*list.remove_max().unwrap().element(), "d");
        assert!(list.is_empty());
    }

    #[test]
    fn test_list_weight_conservation() {
        let mut list = SortedList::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for i in 0..50 {
            list.add(i, rng.gen_range(0.01..5.0)).unwrap();
        }
        while list.len() > 1 {
            let before = list.total_weight();
            let removed = list.remove(&mut rng).unwrap();
            assert_relative_eq!(list.total_weight(), before - removed.weight(), max_relative = 1e-9);
        }
    }

    #[test]
    fn test_list_sampling_frequencies() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let trials = 20_000;
        let mut light = 0;
        for _ in 0..trials {
            let mut list = SortedList::new();
            list.add("light", 1.0).unwrap();
            list.add("heavy", 3.0).unwrap();
            if *list.remove(&mut rng).unwrap().element() == "light" {
                light += 1;
            }
        }
        let observed = light as f64 / trials as f64;
        assert!((observed - 0.25).abs() < 0.02, "observed {observed}");
    }

    /// The tree and the list must agree on every maximum extraction,
    /// including which of several equal weights comes out first.
    #[test]
    fn test_tree_matches_list_on_max_extraction() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut tree = WeightedTree::new();
        let mut list = SortedList::new();

        for id in 0..400u32 {
            let w = f64::from(rng.gen_range(1..30u32)) / 8.0;
            tree.add(id, w).unwrap();
            list.add(id, w).unwrap();

            if rng.gen_bool(0.3) {
                let (a, wa) = tree.remove_max().unwrap().into_parts();
                let (b, wb) = list.remove_max().unwrap().into_parts();
                assert_eq!(a, b);
                assert_eq!(wa, wb);
            }
        }
        while !list.is_empty() {
            assert_eq!(
                tree.remove_max().unwrap().into_element(),
                list.remove_max().unwrap().into_element()
            );
        }
        assert!(tree.is_empty());
    }

    /// Both implementations must sample from the same distribution.
    #[test]
    fn test_tree_matches_list_on_sampling() {
        let weights = [0.05, 0.15, 0.3, 0.5];
        let trials = 20_000;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut tree_counts = [0usize; 4];
        let mut list_counts = [0usize; 4];

        for _ in 0..trials {
            let mut tree = WeightedTree::new();
            let mut list = SortedList::new();
            for (i, &w) in weights.iter().enumerate() {
                tree.add(i, w).unwrap();
                list.add(i, w).unwrap();
            }
            tree_counts[tree.remove(&mut rng).unwrap().into_element()] += 1;
            list_counts[list.remove(&mut rng).unwrap().into_element()] += 1;
        }

        for i in 0..weights.len() {
            let t = tree_counts[i] as f64 / trials as f64;
            let l = list_counts[i] as f64 / trials as f64;
            assert!((t - l).abs() < 0.025, "element {i}: tree {t}, list {l}");
        }
    }
}
