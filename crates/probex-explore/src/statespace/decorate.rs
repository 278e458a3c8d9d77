//! Node styling for the Graphviz output.

use super::DotGraph;
use crate::host::HostView;
use std::collections::{BTreeMap, BTreeSet};

/// Number of colours in the `set312` colour scheme.
const PALETTE_SIZE: usize = 12;

/// Injects node statements into a [`DotGraph`] as the search runs.
#[allow(unused_variables)]
pub trait DotDecorator {
    fn search_started(&mut self, host: &dyn HostView, graph: &mut DotGraph) {}

    /// Called after the transitions of a forward step are recorded.
    fn state_advanced(&mut self, host: &dyn HostView, graph: &mut DotGraph) {}
}

/// Draws the initial state with a thick border.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitialStateDecorator;

impl DotDecorator for InitialStateDecorator {
    fn search_started(&mut self, host: &dyn HostView, graph: &mut DotGraph) {
        graph.statement(&format!("{} [penwidth=3]", host.current_state_id()));
    }
}

/// Double-borders end states and states whose choices are all taken.
#[derive(Debug, Clone, Default)]
pub struct ExploredStatesDecorator {
    marked: BTreeSet<i64>,
}

impl ExploredStatesDecorator {
    pub fn new() -> Self {
        Self::default()
    }

    fn mark(&mut self, state_id: i64, graph: &mut DotGraph) {
        if state_id >= 0 && self.marked.insert(state_id) {
            graph.statement(&format!("{state_id} [peripheries=2]"));
        }
    }
}

impl DotDecorator for ExploredStatesDecorator {
    fn state_advanced(&mut self, host: &dyn HostView, graph: &mut DotGraph) {
        if host.is_end_state() {
            self.mark(host.current_state_id(), graph);
        }
        if let Some(choice) = host.active_choice() {
            if !choice.has_more_choices() {
                self.mark(choice.state_id(), graph);
            }
        }
    }
}

/// Colours states by the labels the host reports for them.
///
/// Each distinct label gets a colour of the `set312` scheme in order of
/// first appearance. A state with several labels is drawn as a wedge of
/// their colours.
#[derive(Debug, Clone, Default)]
pub struct StateLabelDecorator {
    colours: BTreeMap<String, usize>,
    labelled: BTreeSet<i64>,
}

impl StateLabelDecorator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Colour index of `label`, assigned on first use.
    fn colour(&mut self, label: &str) -> usize {
        let next = self.colours.len() % PALETTE_SIZE + 1;
        *self.colours.entry(label.to_string()).or_insert(next)
    }

    /// Labels seen so far with their colour indices, by colour.
    pub fn legend(&self) -> Vec<(usize, &str)> {
        let mut legend: Vec<(usize, &str)> = self
            .colours
            .iter()
            .map(|(label, &colour)| (colour, label.as_str()))
            .collect();
        legend.sort();
        legend
    }

    fn label_state(&mut self, host: &dyn HostView, graph: &mut DotGraph) {
        let state_id = host.current_state_id();
        if !self.labelled.insert(state_id) {
            return;
        }
        let labels = host.state_labels();
        if labels.is_empty() {
            return;
        }

        graph.prepend_once("node [colorscheme=\"set312\" style=wedged]");
        let colours: Vec<String> = labels
            .iter()
            .map(|label| self.colour(label).to_string())
            .collect();
        if let [colour] = colours.as_slice() {
            graph.statement(&format!("{state_id} [style=filled fillcolor={colour}]"));
        } else {
            graph.statement(&format!("{state_id} [fillcolor=\"{}\"]", colours.join(":")));
        }
    }
}

impl DotDecorator for StateLabelDecorator {
    fn search_started(&mut self, host: &dyn HostView, graph: &mut DotGraph) {
        self.label_state(host, graph);
    }

    fn state_advanced(&mut self, host: &dyn HostView, graph: &mut DotGraph) {
        self.label_state(host, graph);
    }
}
