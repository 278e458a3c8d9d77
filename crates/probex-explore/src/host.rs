//! The host exploration engine, seen from the search.
//!
//! A host executes the system under exploration one transition at a time,
//! hands out restorable snapshots, and reports the identity of the state it
//! is in. The search and its listeners never touch the host's internals:
//! listeners get the read-only [`HostView`], the search drives the full
//! [`Host`].

use probex_choice::ChoicePoint;
use serde::Serialize;
use std::fmt;

/// A property violation reported by the host after a forward step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyViolation {
    /// State in which the property failed.
    pub state_id: i64,
    /// Name of the violated property.
    pub property: String,
    /// Human-readable detail.
    pub message: String,
}

impl fmt::Display for PropertyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} violated in state {}: {}",
            self.property, self.state_id, self.message
        )
    }
}

/// Read-only view of the host, handed to listeners.
pub trait HostView {
    /// Id of the state the host is currently in.
    fn current_state_id(&self) -> i64;

    /// Whether the last forward step reached a state never seen before.
    fn is_new_state(&self) -> bool;

    /// Whether the current state has no successors.
    fn is_end_state(&self) -> bool;

    /// Whether the current state is excluded from further exploration.
    fn is_ignored_state(&self) -> bool;

    /// The probabilistic choice point that produced the last forward step,
    /// if that step was probabilistic.
    fn active_choice(&self) -> Option<&ChoicePoint>;

    /// The property violation raised by the last forward step, if any.
    fn violation(&self) -> Option<&PropertyViolation>;

    /// Atomic propositions holding in the current state, used to colour
    /// the state graph.
    fn state_labels(&self) -> Vec<String> {
        Vec::new()
    }
}

/// The host interface driven by the search engines.
pub trait Host: HostView {
    /// Restorable handle to a complete host state.
    type Snapshot;

    fn snapshot(&self) -> Self::Snapshot;

    /// Return to a previously captured state. Consumes the snapshot.
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Take the next untried transition out of the current state.
    /// Returns `false` when there is none.
    fn forward(&mut self) -> bool;

    /// Undo the last forward step.
    fn backtrack(&mut self);

    fn depth(&self, state_id: i64) -> u32;

    fn set_depth(&mut self, state_id: i64, depth: u32);

    /// Whether the host can still afford to store more states.
    fn within_budget(&self) -> bool;
}
