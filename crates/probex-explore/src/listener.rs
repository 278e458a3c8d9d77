//! Search event notifications.

use crate::host::{HostView, PropertyViolation};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A listener failure. Aborts the search after the current step.
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A limit the search ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchConstraint {
    /// A selected snapshot sat at the depth limit and was not expanded.
    DepthLimit(u32),
    /// The host ran out of room for new states.
    StateBudget,
}

impl SearchConstraint {
    /// Short tag used in output file names.
    pub fn tag(&self) -> &'static str {
        match self {
            SearchConstraint::DepthLimit(_) => "depth",
            SearchConstraint::StateBudget => "budget",
        }
    }
}

impl fmt::Display for SearchConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchConstraint::DepthLimit(limit) => write!(f, "depth limit reached: {limit}"),
            SearchConstraint::StateBudget => write!(f, "state budget exhausted"),
        }
    }
}

/// Observer of a search run. Every hook defaults to doing nothing.
///
/// Hooks run synchronously on the search thread, in this order for one
/// expansion: `state_restored`, then per forward step `state_advanced`,
/// optionally `property_violated` and `state_stored`, then
/// `state_backtracked`.
#[allow(unused_variables)]
pub trait SearchListener {
    fn search_started(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        Ok(())
    }

    fn state_advanced(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        Ok(())
    }

    fn state_backtracked(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        Ok(())
    }

    fn state_restored(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        Ok(())
    }

    fn state_stored(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        Ok(())
    }

    /// All successors of the restored state have been enumerated. Only the
    /// probability-first search reports this.
    fn state_processed(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        Ok(())
    }

    fn property_violated(
        &mut self,
        host: &dyn HostView,
        violation: &PropertyViolation,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    fn search_constraint_hit(
        &mut self,
        host: &dyn HostView,
        constraint: SearchConstraint,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    fn search_finished(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_tags_and_messages() {
        let depth = SearchConstraint::DepthLimit(5);
        assert_eq!(depth.tag(), "depth");
        assert_eq!(depth.to_string(), "depth limit reached: 5");
        assert_eq!(SearchConstraint::StateBudget.tag(), "budget");
    }

    #[test]
    fn test_write_error_names_path() {
        let err = ListenerError::Write {
            path: PathBuf::from("/out/run.tra"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "could not write /out/run.tra: denied");
    }
}
