//! Recording a search as a discrete-time Markov chain.
//!
//! [`StateSpace`] listens to the search and turns every forward step into a
//! transition `source -> target` labelled with the probability of the step.
//! The transitions go to a [`TransitionSink`], which decides the output
//! format:
//!
//! - [`TextSink`]: the `.tra` format, a `"<states> <transitions>"` header
//!   followed by one `"<source> <target> <probability>"` line per transition
//! - [`DotSink`]: a Graphviz `digraph`, optionally styled by decorators
//!
//! The output is written when the search finishes (`<name>.<ext>`) and
//! whenever it hits a constraint (`<name>_<constraint>.<ext>`).

mod decorate;
mod dot;
mod text;

pub use decorate::{
    DotDecorator, ExploredStatesDecorator, InitialStateDecorator, StateLabelDecorator,
};
pub use dot::{DotGraph, DotSink};
pub use text::TextSink;

use crate::config::{check_precision, ConfigError};
use crate::host::HostView;
use crate::listener::{ListenerError, SearchConstraint, SearchListener};
use log::info;
use probex_choice::ChoicePoint;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of decimals probabilities are rounded to.
pub const DEFAULT_PRECISION: u32 = 2;

/// Output format of a [`StateSpace`].
pub trait TransitionSink {
    /// File extension, without the dot.
    fn extension(&self) -> &'static str;

    fn add_transition(&mut self, source: i64, target: i64, probability: f64);

    fn search_started(&mut self, _host: &dyn HostView) {}

    /// Called after the transitions of a forward step are recorded.
    fn state_advanced(&mut self, _host: &dyn HostView) {}

    fn render(&self, states: i64, transitions: u64) -> String;
}

/// Round `value` to `precision` decimals.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

/// Transition recorder.
pub struct StateSpace<S> {
    sink: S,
    /// Source of the next transition, -1 before the first restore.
    source: i64,
    max_state: i64,
    transitions: u64,
    precision: u32,
    output_dir: PathBuf,
    name: String,
    saved: bool,
}

impl<S: TransitionSink> StateSpace<S> {
    /// Create a recorder writing `statespace.<ext>` to the working
    /// directory.
    pub fn new(sink: S, precision: u32) -> Result<Self, ConfigError> {
        check_precision(precision)?;
        Ok(Self {
            sink,
            source: -1,
            max_state: 0,
            transitions: 0,
            precision,
            output_dir: PathBuf::from("."),
            name: "statespace".to_string(),
            saved: false,
        })
    }

    /// Write to `dir`, using `name` as the file stem.
    pub fn with_output(mut self, dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        self.output_dir = dir.into();
        self.name = name.into();
        self
    }

    /// Number of states in the emitted chain: the highest id seen plus two.
    pub fn states(&self) -> i64 {
        self.max_state + 2
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Whether the chain was written out when the search finished.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The chain recorded so far, in the sink's format.
    pub fn render(&self) -> String {
        self.sink.render(self.states(), self.transitions)
    }

    /// Path of the output file for `stem`.
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{stem}.{}", self.sink.extension()))
    }

    /// Write the chain recorded so far to `<output dir>/<stem>.<ext>`.
    pub fn write(&self, stem: &str) -> Result<PathBuf, ListenerError> {
        let path = self.output_path(stem);
        write_file(&path, &self.render())?;
        info!(
            "Wrote {} ({} states, {} transitions)",
            path.display(),
            self.states(),
            self.transitions
        );
        Ok(path)
    }

    /// Probability recorded for the step `choice` just took.
    ///
    /// The last alternative of a choice gets whatever mass the rounded
    /// earlier alternatives left, so every state's outgoing probabilities sum
    /// to exactly 1 at the configured precision.
    fn step_probability(&self, choice: &ChoicePoint) -> f64 {
        let Some(probability) = choice.probability() else {
            return 1.0;
        };
        if choice.has_more_choices() {
            return probability;
        }
        let mut earlier = choice.processed_probabilities();
        earlier.pop();
        earlier.sort_by(f64::total_cmp);
        let taken: f64 = earlier
            .iter()
            .map(|&p| round_to(p, self.precision))
            .sum();
        round_to(1.0 - taken, self.precision)
    }

    fn record(&mut self, source: i64, target: i64, probability: f64) {
        self.sink.add_transition(source, target, probability);
        self.transitions += 1;
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ListenerError> {
    fs::write(path, contents).map_err(|source| ListenerError::Write {
        path: path.to_path_buf(),
        source,
    })
}

impl<S: TransitionSink> SearchListener for StateSpace<S> {
    fn search_started(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        self.sink.search_started(host);
        Ok(())
    }

    fn state_advanced(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        let target = host.current_state_id();
        self.max_state = self.max_state.max(target);

        let probability = host
            .active_choice()
            .map_or(1.0, |choice| self.step_probability(choice));
        self.record(self.source, target, probability);
        if host.is_new_state() && host.is_end_state() {
            self.record(target, target, 1.0);
        }
        self.source = target;

        self.sink.state_advanced(host);
        Ok(())
    }

    fn state_backtracked(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        self.source = host.current_state_id();
        Ok(())
    }

    fn state_restored(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
        self.source = host.current_state_id();
        Ok(())
    }

    fn search_constraint_hit(
        &mut self,
        _host: &dyn HostView,
        constraint: SearchConstraint,
    ) -> Result<(), ListenerError> {
        let stem = format!("{}_{}", self.name, constraint.tag());
        self.write(&stem).map(|_| ())
    }

    fn search_finished(&mut self, _host: &dyn HostView) -> Result<(), ListenerError> {
        let written = self.write(&self.name);
        self.saved = written.is_ok();
        written.map(|_| ())
    }
}
