//! Weighted elements.

use std::cmp::Ordering;

/// An element paired with its weight.
///
/// Weighted values compare by weight only; the element plays no part in
/// equality or ordering.
#[derive(Debug, Clone)]
pub struct Weighted<E> {
    element: E,
    weight: f64,
}

impl<E> Weighted<E> {
    pub(crate) fn new(element: E, weight: f64) -> Self {
        Self { element, weight }
    }

    /// The element.
    pub fn element(&self) -> &E {
        &self.element
    }

    /// The weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Consume the pair, returning the element.
    pub fn into_element(self) -> E {
        self.element
    }

    /// Consume the pair, returning `(element, weight)`.
    pub fn into_parts(self) -> (E, f64) {
        (self.element, self.weight)
    }
}

impl<E> PartialEq for Weighted<E> {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
    }
}

impl<E> PartialOrd for Weighted<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.weight.partial_cmp(&other.weight)
    }
}
