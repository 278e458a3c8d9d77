//! Search reports.

use crate::host::PropertyViolation;
use serde::Serialize;
use std::fmt;

/// Why a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// Every stored snapshot was selected.
    FrontierExhausted,
    /// The host ran out of room for new states.
    StateBudget,
    /// A property violation ended the search.
    PropertyViolation,
    /// A listener failed, usually while writing its output.
    ListenerFailure,
    /// The stop flag was raised.
    Stopped,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::FrontierExhausted => "frontier exhausted",
            Termination::StateBudget => "state budget exhausted",
            Termination::PropertyViolation => "property violated",
            Termination::ListenerFailure => "listener failure",
            Termination::Stopped => "stopped",
        };
        f.write_str(text)
    }
}

/// Summary of one search run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub strategy: String,
    /// Snapshots taken off the frontier.
    pub snapshots_selected: u64,
    /// Selected snapshots whose successors were enumerated.
    pub snapshots_expanded: u64,
    /// Snapshots put on the frontier, the initial one included.
    pub states_stored: u64,
    /// Forward steps taken.
    pub transitions: u64,
    pub depth_limit_hits: u64,
    /// Distinct constraint messages, in order of first occurrence.
    pub constraints: Vec<String>,
    pub violations: Vec<PropertyViolation>,
    pub listener_failures: Vec<String>,
    pub termination: Termination,
}

impl SearchReport {
    pub fn new(strategy: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            snapshots_selected: 0,
            snapshots_expanded: 0,
            states_stored: 0,
            transitions: 0,
            depth_limit_hits: 0,
            constraints: Vec::new(),
            violations: Vec::new(),
            listener_failures: Vec::new(),
            termination: Termination::FrontierExhausted,
        }
    }

    pub(crate) fn record_constraint(&mut self, message: String) {
        if !self.constraints.contains(&message) {
            self.constraints.push(message);
        }
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Format a search report for human consumption.
pub fn format_report(report: &SearchReport) -> String {
    let mut output = String::new();

    output.push_str("═══════════════════════════════════════════════════════════════════════\n");
    output.push_str("  Probabilistic Search Report\n");
    output.push_str("═══════════════════════════════════════════════════════════════════════\n\n");

    output.push_str(&format!("Strategy:               {}\n", report.strategy));
    output.push_str(&format!("Terminated by:          {}\n", report.termination));
    output.push_str(&format!(
        "Snapshots selected:     {}\n",
        report.snapshots_selected
    ));
    output.push_str(&format!(
        "Snapshots expanded:     {}\n",
        report.snapshots_expanded
    ));
    output.push_str(&format!("States stored:          {}\n", report.states_stored));
    output.push_str(&format!("Transitions taken:      {}\n", report.transitions));
    if report.depth_limit_hits > 0 {
        output.push_str(&format!(
            "Depth limit hits:       {}\n",
            report.depth_limit_hits
        ));
    }
    output.push('\n');

    if !report.constraints.is_empty() {
        output.push_str("─── Search Constraints ────────────────────────────────────────────────\n");
        for constraint in &report.constraints {
            output.push_str(&format!("  {}\n", constraint));
        }
        output.push('\n');
    }

    if report.violations.is_empty() {
        output.push_str("─── No Violations ─────────────────────────────────────────────────────\n");
        output.push_str("No property violations detected during the search.\n\n");
    } else {
        output.push_str("─── Property Violations ───────────────────────────────────────────────\n");
        for (i, violation) in report.violations.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, violation));
        }
        output.push('\n');
    }

    if !report.listener_failures.is_empty() {
        output.push_str("─── Listener Failures ─────────────────────────────────────────────────\n");
        for failure in &report.listener_failures {
            output.push_str(&format!("  {}\n", failure));
        }
        output.push('\n');
    }

    output.push_str("═══════════════════════════════════════════════════════════════════════\n");

    output
}
