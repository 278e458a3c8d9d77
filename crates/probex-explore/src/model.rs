//! A host that explores a Markov chain described in JSON.
//!
//! A model is a list of locations. Each location either makes a
//! probabilistic choice among targets, moves to a single target, or ends
//! the run:
//!
//! ```json
//! {
//!   "name": "coin",
//!   "locations": [
//!     { "kind": "choice", "probabilities": [0.5, 0.5], "targets": [1, 2] },
//!     { "kind": "end", "labels": ["heads"] },
//!     { "kind": "end", "labels": ["tails"], "violation": "fair" }
//!   ]
//! }
//! ```
//!
//! [`ModelHost`] drives a model as a [`Host`]: states are locations,
//! numbered in discovery order starting with the initial location at 0.

use crate::host::{Host, HostView, PropertyViolation};
use log::error;
use probex_choice::{ChoiceError, ChoicePoint, ChoiceTable};
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt, Snafu};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Errors from loading or validating a model.
#[derive(Debug, Snafu)]
pub enum ModelError {
    #[snafu(display("I/O error"), context(false))]
    Io { source: std::io::Error },

    #[snafu(display("JSON error"), context(false))]
    Json { source: serde_json::Error },

    #[snafu(display("model has no locations"))]
    NoLocations,

    #[snafu(display("initial location {initial} does not exist"))]
    UnknownInitial { initial: usize },

    #[snafu(display("location {location} targets missing location {target}"))]
    UnknownTarget { location: usize, target: usize },

    #[snafu(display(
        "location {location} has {probabilities} probabilities for {targets} targets"
    ))]
    ArityMismatch {
        location: usize,
        probabilities: usize,
        targets: usize,
    },

    #[snafu(display("location {location} has no targets"))]
    NoTargets { location: usize },

    #[snafu(display("location {location} has an invalid choice: {source}"))]
    InvalidChoice {
        location: usize,
        source: ChoiceError,
    },
}

fn default_name() -> String {
    "model".to_string()
}

/// A finite Markov chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub initial: usize,
    pub locations: Vec<Location>,
    /// Discovered-state budget. `None` means unlimited.
    #[serde(default)]
    pub max_states: Option<usize>,
}

/// One location of a [`Model`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(flatten)]
    pub kind: LocationKind,
    /// Reached but never expanded.
    #[serde(default)]
    pub ignored: bool,
    /// Name of a property that is violated on reaching this location.
    #[serde(default)]
    pub violation: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationKind {
    /// Probabilistic choice, one probability per target.
    Choice {
        probabilities: Vec<f64>,
        targets: Vec<usize>,
    },
    /// Uniform choice among the targets.
    Uniform { targets: Vec<usize> },
    /// Deterministic move.
    Step { target: usize },
    /// No successors.
    End,
}

impl LocationKind {
    pub fn targets(&self) -> &[usize] {
        match self {
            LocationKind::Choice { targets, .. } | LocationKind::Uniform { targets } => targets,
            LocationKind::Step { target } => std::slice::from_ref(target),
            LocationKind::End => &[],
        }
    }

    /// The choice point enumerating this location's targets.
    fn choice_point(&self, state_id: i64) -> Result<ChoicePoint, ChoiceError> {
        match self {
            LocationKind::Choice { probabilities, .. } => {
                ChoicePoint::explicit(state_id, probabilities.clone())
            }
            LocationKind::Uniform { targets } => ChoicePoint::uniform(state_id, targets.len() as u32),
            LocationKind::Step { .. } => ChoicePoint::uniform(state_id, 1),
            LocationKind::End => ChoicePoint::uniform(state_id, 0),
        }
    }
}

impl Location {
    pub fn new(kind: LocationKind) -> Self {
        Self {
            kind,
            ignored: false,
            violation: None,
            labels: Vec::new(),
        }
    }
}

impl Model {
    pub fn new(locations: Vec<Location>) -> Self {
        Self {
            name: default_name(),
            initial: 0,
            locations,
            max_states: None,
        }
    }

    /// Parse and validate a model.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Model = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Check that every target exists and every choice is well formed.
    pub fn validate(&self) -> Result<(), ModelError> {
        ensure!(!self.locations.is_empty(), NoLocationsSnafu);
        ensure!(
            self.initial < self.locations.len(),
            UnknownInitialSnafu {
                initial: self.initial
            }
        );

        for (index, location) in self.locations.iter().enumerate() {
            let targets = location.kind.targets();
            match &location.kind {
                LocationKind::End => {}
                LocationKind::Choice { probabilities, .. } => {
                    ensure!(!targets.is_empty(), NoTargetsSnafu { location: index });
                    ensure!(
                        probabilities.len() == targets.len(),
                        ArityMismatchSnafu {
                            location: index,
                            probabilities: probabilities.len(),
                            targets: targets.len(),
                        }
                    );
                }
                LocationKind::Uniform { .. } | LocationKind::Step { .. } => {
                    ensure!(!targets.is_empty(), NoTargetsSnafu { location: index });
                }
            }
            if let Some(&target) = targets.iter().find(|&&t| t >= self.locations.len()) {
                return UnknownTargetSnafu {
                    location: index,
                    target,
                }
                .fail();
            }
            if !targets.is_empty() {
                location
                    .kind
                    .choice_point(0)
                    .context(InvalidChoiceSnafu { location: index })?;
            }
        }
        Ok(())
    }
}

/// Load and validate a model from a JSON file.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model, ModelError> {
    let json = fs::read_to_string(path)?;
    Model::from_json(&json)
}

/// Restorable position of a [`ModelHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSnapshot {
    location: usize,
}

/// Explores a [`Model`] one transition at a time.
#[derive(Debug)]
pub struct ModelHost {
    model: Model,
    /// State id per location, assigned on discovery.
    ids: Vec<Option<i64>>,
    discovered: usize,
    current: usize,
    /// Locations to return to on backtrack.
    trail: Vec<usize>,
    choices: ChoiceTable<usize>,
    /// Location whose choice produced the last forward step.
    active: Option<usize>,
    new_state: bool,
    violation: Option<PropertyViolation>,
    depths: BTreeMap<i64, u32>,
}

impl ModelHost {
    pub fn new(model: Model) -> Result<Self, ModelError> {
        model.validate()?;
        let mut ids = vec![None; model.locations.len()];
        ids[model.initial] = Some(0);
        Ok(Self {
            current: model.initial,
            model,
            ids,
            discovered: 1,
            trail: Vec::new(),
            choices: ChoiceTable::new(),
            active: None,
            new_state: true,
            violation: None,
            depths: BTreeMap::new(),
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Number of distinct states reached so far.
    pub fn states_discovered(&self) -> usize {
        self.discovered
    }

    pub fn choices(&self) -> &ChoiceTable<usize> {
        &self.choices
    }

    fn state_id(&self, location: usize) -> i64 {
        self.ids[location].unwrap_or(-1)
    }

    fn location(&self) -> &Location {
        &self.model.locations[self.current]
    }
}

impl HostView for ModelHost {
    fn current_state_id(&self) -> i64 {
        self.state_id(self.current)
    }

    fn is_new_state(&self) -> bool {
        self.new_state
    }

    fn is_end_state(&self) -> bool {
        self.location().kind == LocationKind::End
    }

    fn is_ignored_state(&self) -> bool {
        self.location().ignored
    }

    fn active_choice(&self) -> Option<&ChoicePoint> {
        self.active.and_then(|location| self.choices.get(&location))
    }

    fn violation(&self) -> Option<&PropertyViolation> {
        self.violation.as_ref()
    }

    fn state_labels(&self) -> Vec<String> {
        self.location().labels.clone()
    }
}

impl Host for ModelHost {
    type Snapshot = ModelSnapshot;

    fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            location: self.current,
        }
    }

    fn restore(&mut self, snapshot: ModelSnapshot) {
        self.current = snapshot.location;
        self.trail.clear();
        if let Some(point) = self.choices.get_mut(&snapshot.location) {
            point.reset();
        }
        self.active = None;
        self.new_state = false;
        self.violation = None;
    }

    fn forward(&mut self) -> bool {
        let location = self.current;
        let state_id = self.state_id(location);
        let kind = &self.model.locations[location].kind;
        if *kind == LocationKind::End {
            return false;
        }

        let point = match self.choices.visit(location, || kind.choice_point(state_id)) {
            Ok(point) => point,
            Err(e) => {
                error!("Location {} has an invalid choice: {}", location, e);
                return false;
            }
        };
        if !point.advance() {
            return false;
        }
        let Some(target) = point
            .next_choice()
            .and_then(|alternative| kind.targets().get(alternative as usize).copied())
        else {
            return false;
        };

        self.trail.push(location);
        self.current = target;
        self.active = Some(location);
        self.new_state = self.ids[target].is_none();
        if self.new_state {
            self.ids[target] = Some(self.discovered as i64);
            self.discovered += 1;
        }
        let reached = self.state_id(target);
        self.violation = self.model.locations[target]
            .violation
            .as_ref()
            .map(|property| PropertyViolation {
                state_id: reached,
                property: property.clone(),
                message: format!("reached location {target}"),
            });
        true
    }

    fn backtrack(&mut self) {
        if let Some(previous) = self.trail.pop() {
            self.current = previous;
        }
        self.active = None;
        self.new_state = false;
        self.violation = None;
    }

    fn depth(&self, state_id: i64) -> u32 {
        self.depths.get(&state_id).copied().unwrap_or(0)
    }

    fn set_depth(&mut self, state_id: i64, depth: u32) {
        self.depths.insert(state_id, depth);
    }

    fn within_budget(&self) -> bool {
        self.model
            .max_states
            .map_or(true, |max| self.discovered < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const COIN: &str = r#"{
        "name": "coin",
        "locations": [
            { "kind": "choice", "probabilities": [0.5, 0.5], "targets": [1, 2] },
            { "kind": "end", "labels": ["heads"] },
            { "kind": "end", "labels": ["tails"], "violation": "fair" }
        ]
    }"#;

    #[test]
    fn test_parse_model() {
        let model = Model::from_json(COIN).unwrap();
        assert_eq!(model.name, "coin");
        assert_eq!(model.initial, 0);
        assert_eq!(model.max_states, None);
        assert_eq!(model.locations.len(), 3);
        assert_eq!(model.locations[0].kind.targets(), &[1, 2]);
        assert_eq!(model.locations[2].violation.as_deref(), Some("fair"));
        assert!(!model.locations[1].ignored);
    }

    #[test]
    fn test_default_name() {
        let model = Model::from_json(r#"{ "locations": [ { "kind": "end" } ] }"#).unwrap();
        assert_eq!(model.name, "model");
    }

    #[test]
    fn test_validation_errors() {
        let err = Model::from_json(r#"{ "locations": [] }"#).unwrap_err();
        assert!(matches!(err, ModelError::NoLocations));

        let err = Model::from_json(r#"{ "initial": 3, "locations": [ { "kind": "end" } ] }"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownInitial { initial: 3 }));

        let err = Model::from_json(r#"{ "locations": [ { "kind": "step", "target": 9 } ] }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnknownTarget {
                location: 0,
                target: 9
            }
        ));

        let err = Model::from_json(
            r#"{ "locations": [
                { "kind": "choice", "probabilities": [1.0], "targets": [0, 0] }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::ArityMismatch { location: 0, .. }));

        let err = Model::from_json(r#"{ "locations": [ { "kind": "uniform", "targets": [] } ] }"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::NoTargets { location: 0 }));

        let err = Model::from_json(
            r#"{ "locations": [
                { "kind": "choice", "probabilities": [0.5, 0.4], "targets": [0, 0] }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidChoice { location: 0, .. }));
        assert!(err.to_string().starts_with("location 0 has an invalid choice"));

        let err = Model::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ModelError::Json { .. }));
    }

    #[test]
    fn test_load_model() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(COIN.as_bytes()).unwrap();
        let model = load_model(file.path()).unwrap();
        assert_eq!(model.name, "coin");

        let err = load_model(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_host_walk() {
        let mut host = ModelHost::new(Model::from_json(COIN).unwrap()).unwrap();
        assert_eq!(host.current_state_id(), 0);
        assert!(!host.is_end_state());
        assert!(host.active_choice().is_none());

        assert!(host.forward());
        assert_eq!(host.current_state_id(), 1);
        assert!(host.is_new_state());
        assert!(host.is_end_state());
        assert_eq!(host.state_labels(), vec!["heads"]);
        let choice = host.active_choice().unwrap();
        assert_eq!(choice.state_id(), 0);
        assert_relative_eq!(choice.probability().unwrap(), 0.5);
        assert!(host.violation().is_none());
        // end locations have no successors
        assert!(!host.forward());

        host.backtrack();
        assert_eq!(host.current_state_id(), 0);
        assert!(host.active_choice().is_none());

        assert!(host.forward());
        assert_eq!(host.current_state_id(), 2);
        let violation = host.violation().unwrap();
        assert_eq!(violation.state_id, 2);
        assert_eq!(violation.property, "fair");
        assert!(!host.active_choice().unwrap().has_more_choices());

        host.backtrack();
        assert!(!host.forward());
        assert_eq!(host.states_discovered(), 3);
        assert_eq!(host.choices().exhausted(), 1);
    }

    #[test]
    fn test_restore_replays_choices() {
        let mut host = ModelHost::new(Model::from_json(COIN).unwrap()).unwrap();
        let start = host.snapshot();
        while host.forward() {
            host.backtrack();
        }

        host.restore(start);
        assert!(host.forward());
        assert_eq!(host.current_state_id(), 1);
        // already discovered
        assert!(!host.is_new_state());
    }

    #[test]
    fn test_step_location_is_a_certain_choice() {
        let model = Model::new(vec![
            Location::new(LocationKind::Step { target: 1 }),
            Location::new(LocationKind::End),
        ]);
        let mut host = ModelHost::new(model).unwrap();
        assert!(host.forward());
        let choice = host.active_choice().unwrap();
        assert_eq!(choice.probability(), Some(1.0));
        assert!(!choice.has_more_choices());
    }

    #[test]
    fn test_depth_and_budget() {
        let mut model = Model::from_json(COIN).unwrap();
        model.max_states = Some(2);
        let mut host = ModelHost::new(model).unwrap();
        assert_eq!(host.depth(0), 0);
        host.set_depth(4, 3);
        assert_eq!(host.depth(4), 3);

        assert!(host.within_budget());
        host.forward();
        assert!(!host.within_budget());
    }
}
