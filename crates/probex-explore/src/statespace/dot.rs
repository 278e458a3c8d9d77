use super::{DotDecorator, TransitionSink};
use crate::config::{check_precision, ConfigError};
use crate::host::HostView;

/// Graphviz text under construction.
///
/// Edges and node statements share the body in the order they were added.
/// Preamble statements come first in the rendered graph.
#[derive(Debug, Clone, Default)]
pub struct DotGraph {
    preamble: Vec<String>,
    body: String,
}

impl DotGraph {
    /// Append a statement to the body.
    pub fn statement(&mut self, statement: &str) {
        self.body.push_str(statement);
        self.body.push('\n');
    }

    /// Put `statement` in the preamble unless it is already there.
    pub fn prepend_once(&mut self, statement: &str) {
        if !self.preamble.iter().any(|s| s == statement) {
            self.preamble.push(statement.to_string());
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn render(&self) -> String {
        let mut output = String::from("digraph statespace {\n");
        for statement in &self.preamble {
            output.push_str(statement);
            output.push('\n');
        }
        output.push_str(&self.body);
        output.push_str("}\n");
        output
    }
}

/// Accumulates transitions as a Graphviz `digraph`.
pub struct DotSink {
    graph: DotGraph,
    precision: u32,
    decorators: Vec<Box<dyn DotDecorator>>,
}

impl DotSink {
    /// Create a sink labelling edges with `precision` decimals.
    pub fn new(precision: u32) -> Result<Self, ConfigError> {
        check_precision(precision)?;
        Ok(Self {
            graph: DotGraph::default(),
            precision,
            decorators: Vec::new(),
        })
    }

    pub fn with_decorator(mut self, decorator: Box<dyn DotDecorator>) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn graph(&self) -> &DotGraph {
        &self.graph
    }
}

impl TransitionSink for DotSink {
    fn extension(&self) -> &'static str {
        "dot"
    }

    fn add_transition(&mut self, source: i64, target: i64, probability: f64) {
        let edge = format!(
            "{} -> {} [ label=\"{:.*}\" ];",
            source, target, self.precision as usize, probability
        );
        self.graph.statement(&edge);
    }

    fn search_started(&mut self, host: &dyn HostView) {
        for decorator in &mut self.decorators {
            decorator.search_started(host, &mut self.graph);
        }
    }

    fn state_advanced(&mut self, host: &dyn HostView) {
        for decorator in &mut self.decorators {
            decorator.state_advanced(host, &mut self.graph);
        }
    }

    fn render(&self, _states: i64, _transitions: u64) -> String {
        self.graph.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph() {
        let sink = DotSink::new(2).unwrap();
        assert_eq!(sink.render(2, 0), "digraph statespace {\n}\n");
        assert_eq!(sink.extension(), "dot");
    }

    #[test]
    fn test_edge_labels_use_precision() {
        let mut sink = DotSink::new(3).unwrap();
        sink.add_transition(0, 1, 1.0 / 3.0);
        assert_eq!(sink.graph().body(), "0 -> 1 [ label=\"0.333\" ];\n");
        assert!(DotSink::new(20).is_err());
    }

    #[test]
    fn test_preamble_precedes_body() {
        let mut graph = DotGraph::default();
        graph.statement("0 -> 1 [ label=\"1.00\" ];");
        graph.prepend_once("node [shape=circle]");
        graph.prepend_once("node [shape=circle]");
        assert_eq!(
            graph.render(),
            "digraph statespace {\nnode [shape=circle]\n0 -> 1 [ label=\"1.00\" ];\n}\n"
        );
    }
}
