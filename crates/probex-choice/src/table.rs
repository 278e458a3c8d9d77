//! Replay table: one choice point per decision site.

use crate::{ChoiceError, ChoicePoint};
use std::collections::BTreeMap;

/// Owns the choice points of one search, keyed by decision-site identity.
///
/// The first visit to a site creates its choice point; every later visit
/// gets the same choice point back, with its progress intact.
#[derive(Debug, Clone)]
pub struct ChoiceTable<K> {
    points: BTreeMap<K, ChoicePoint>,
}

impl<K: Ord> ChoiceTable<K> {
    pub fn new() -> Self {
        Self {
            points: BTreeMap::new(),
        }
    }

    /// Return the choice point for `site`, creating it with `create` on the
    /// first visit.
    pub fn visit<F>(&mut self, site: K, create: F) -> Result<&mut ChoicePoint, ChoiceError>
    where
        F: FnOnce() -> Result<ChoicePoint, ChoiceError>,
    {
        use std::collections::btree_map::Entry;
        match self.points.entry(site) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(create()?)),
        }
    }

    /// Like [`visit`](Self::visit) for callers holding an already validated
    /// choice point.
    pub fn get_or_insert_with<F>(&mut self, site: K, create: F) -> &mut ChoicePoint
    where
        F: FnOnce() -> ChoicePoint,
    {
        self.points.entry(site).or_insert_with(create)
    }

    pub fn get(&self, site: &K) -> Option<&ChoicePoint> {
        self.points.get(site)
    }

    pub fn get_mut(&mut self, site: &K) -> Option<&mut ChoicePoint> {
        self.points.get_mut(site)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of sites whose alternatives are all taken.
    pub fn exhausted(&self) -> usize {
        self.points
            .values()
            .filter(|cp| cp.next_choice().is_some() && !cp.has_more_choices())
            .count()
    }

    /// Forget every site.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl<K: Ord> Default for ChoiceTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
