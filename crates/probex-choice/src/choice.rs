//! The replayable decision primitive.

use crate::{check_probabilities, ChoiceError};
use std::fmt;

/// One probabilistic decision site, replayed across a whole search.
///
/// A choice point is either *explicit*, carrying one probability per
/// alternative, or *uniform* over `total` alternatives. It starts before its
/// first alternative; each [`advance`](Self::advance) moves to the next
/// alternative whose probability is non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoicePoint {
    /// `None` for a uniform choice.
    probabilities: Option<Vec<f64>>,
    /// Index of the current alternative, -1 before the first advance.
    next: i64,
    processed: u32,
    total: u32,
    /// Host state at which the decision was first reached.
    state_id: i64,
}

impl ChoicePoint {
    /// Create a choice over explicit probabilities.
    ///
    /// # Errors
    ///
    /// Fails if `probabilities` is empty, holds an entry outside `[0, 1]`,
    /// or does not sum to 1.0 within [`SUM_EPSILON`](crate::SUM_EPSILON).
    pub fn explicit(state_id: i64, probabilities: Vec<f64>) -> Result<Self, ChoiceError> {
        check_probabilities(&probabilities)?;
        let total = alternative_count(probabilities.len())?;
        Ok(Self {
            probabilities: Some(probabilities),
            next: -1,
            processed: 0,
            total,
            state_id,
        })
    }

    /// Create a uniform choice over `n` alternatives.
    pub fn uniform(state_id: i64, n: u32) -> Result<Self, ChoiceError> {
        if n == 0 {
            return Err(ChoiceError::ZeroAlternatives);
        }
        Ok(Self {
            probabilities: None,
            next: -1,
            processed: 0,
            total: n,
            state_id,
        })
    }

    pub fn state_id(&self) -> i64 {
        self.state_id
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of alternatives taken so far.
    pub fn processed(&self) -> u32 {
        self.processed
    }

    pub fn is_uniform(&self) -> bool {
        self.probabilities.is_none()
    }

    /// The explicit probabilities, or `None` for a uniform choice.
    pub fn probabilities(&self) -> Option<&[f64]> {
        self.probabilities.as_deref()
    }

    /// Index of the current alternative, `None` before the first advance.
    pub fn next_choice(&self) -> Option<u32> {
        u32::try_from(self.next).ok()
    }

    /// Index of the next alternative with non-zero probability after the
    /// current one.
    fn following(&self) -> Option<i64> {
        let start = self.next + 1;
        match &self.probabilities {
            Some(p) => (start..i64::from(self.total)).find(|&i| p[i as usize] > 0.0),
            None => (start < i64::from(self.total)).then_some(start),
        }
    }

    /// Whether another alternative with non-zero probability remains.
    pub fn has_more_choices(&self) -> bool {
        self.following().is_some()
    }

    /// Move to the next alternative, skipping zero-probability ones.
    ///
    /// Returns `false`, leaving the choice point unchanged, once every
    /// alternative has been taken.
    pub fn advance(&mut self) -> bool {
        match self.following() {
            Some(index) => {
                self.next = index;
                self.processed += 1;
                true
            }
            None => false,
        }
    }

    /// Probability of the current alternative.
    pub fn probability(&self) -> Option<f64> {
        let index = usize::try_from(self.next).ok()?;
        match &self.probabilities {
            Some(p) => p.get(index).copied(),
            None => Some(1.0 / f64::from(self.total)),
        }
    }

    /// Probabilities of every alternative up to and including the current
    /// one, in alternative order. Skipped zero-probability alternatives are
    /// included as zeros.
    pub fn processed_probabilities(&self) -> Vec<f64> {
        let Ok(index) = usize::try_from(self.next) else {
            return Vec::new();
        };
        match &self.probabilities {
            Some(p) => p[..=index].to_vec(),
            None => vec![1.0 / f64::from(self.total); index + 1],
        }
    }

    /// Rewind to before the first alternative.
    pub fn reset(&mut self) {
        self.next = -1;
        self.processed = 0;
    }
}

impl fmt::Display for ChoicePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_uniform() { "uniform" } else { "explicit" };
        write!(
            f,
            "{kind} choice at state {} ({}/{} taken, current {})",
            self.state_id, self.processed, self.total, self.next
        )
    }
}

fn alternative_count(len: usize) -> Result<u32, ChoiceError> {
    u32::try_from(len).map_err(|_| ChoiceError::TooManyAlternatives { len })
}
