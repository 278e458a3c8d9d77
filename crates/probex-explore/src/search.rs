//! The frontier-driven search loop.
//!
//! Every policy runs the same loop:
//!
//! ```text
//! 1. Put the initial snapshot on the frontier
//! 2. Take a snapshot off the frontier
//!    - at the depth limit → report a constraint, go to 2
//! 3. Restore it, then for every transition out of it:
//!    forward → notify → check violation → store if new → backtrack
//! 4. Until the frontier is empty, the state budget runs out, a fatal
//!    violation occurs, a listener fails, or a stop is requested
//! ```
//!
//! [`Search`] implements the three weighted policies on top of a
//! [`Distribution`] and a [`SelectionStrategy`]. [`ProbabilityFirstSearch`]
//! replaces the distribution with a max-priority queue on path probability
//! and drains each snapshot's successors before taking the next one.

use crate::config::{ConfigError, FrontierKind, SearchConfig};
use crate::host::{Host, HostView};
use crate::listener::{ListenerError, SearchConstraint, SearchListener};
use crate::report::{SearchReport, Termination};
use crate::strategy::{Extraction, SelectionStrategy};
use log::{debug, error, info, warn};
use probex_choice::ChoicePoint;
use probex_distribution::{Distribution, DistributionError, SortedList, WeightedTree};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{self, AtomicBool};
use std::sync::Arc;
use thiserror::Error;

/// Errors from the search engines.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Frontier error: {0}")]
    Frontier(#[from] DistributionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A stored snapshot and the state it captures.
struct Pending<S> {
    snapshot: S,
    state_id: i64,
}

/// Keep underflowed weights on the frontier.
fn clamp_weight(weight: f64) -> f64 {
    weight.max(f64::MIN_POSITIVE)
}

/// Probability of the step the host just took.
fn step_probability(host: &dyn HostView) -> f64 {
    host.active_choice()
        .and_then(ChoicePoint::probability)
        .unwrap_or(1.0)
}

/// Fans each event out to every listener and remembers failures.
struct Listeners<'a, 'b> {
    listeners: &'a mut [&'b mut dyn SearchListener],
    failed: bool,
}

impl<'a, 'b> Listeners<'a, 'b> {
    fn new(listeners: &'a mut [&'b mut dyn SearchListener]) -> Self {
        Self {
            listeners,
            failed: false,
        }
    }

    fn notify<F>(&mut self, report: &mut SearchReport, mut event: F)
    where
        F: FnMut(&mut (dyn SearchListener + 'b)) -> Result<(), ListenerError>,
    {
        for listener in self.listeners.iter_mut() {
            if let Err(e) = event(&mut **listener) {
                error!("Listener failed, stopping search: {}", e);
                report.listener_failures.push(e.to_string());
                self.failed = true;
            }
        }
    }

    fn constraint_hit(
        &mut self,
        report: &mut SearchReport,
        host: &dyn HostView,
        constraint: SearchConstraint,
    ) {
        info!("Search constraint hit: {}", constraint);
        if let SearchConstraint::DepthLimit(_) = constraint {
            report.depth_limit_hits += 1;
        }
        report.record_constraint(constraint.to_string());
        self.notify(report, |l| l.search_constraint_hit(host, constraint));
    }
}

/// Frontier-driven search for the weighted policies.
pub struct Search {
    config: SearchConfig,
    strategy: Box<dyn SelectionStrategy>,
    rng: ChaCha8Rng,
    stop: Arc<AtomicBool>,
}

impl Search {
    /// Create a search. The selection strategy need not match
    /// `config.strategy`; the config supplies the remaining settings.
    pub fn new(
        config: SearchConfig,
        strategy: Box<dyn SelectionStrategy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            strategy,
            rng,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Raising this flag ends the run at the next frontier selection.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn supports_backtrack(&self) -> bool {
        true
    }

    /// Run the search to completion.
    pub fn run<H: Host>(
        &mut self,
        host: &mut H,
        listeners: &mut [&mut dyn SearchListener],
    ) -> Result<SearchReport, SearchError> {
        match self.config.frontier {
            FrontierKind::Tree => self.run_with(host, listeners, WeightedTree::new()),
            FrontierKind::List => self.run_with(host, listeners, SortedList::new()),
        }
    }

    fn run_with<H, D>(
        &mut self,
        host: &mut H,
        listeners: &mut [&mut dyn SearchListener],
        mut frontier: D,
    ) -> Result<SearchReport, SearchError>
    where
        H: Host,
        D: Distribution<Pending<H::Snapshot>>,
    {
        info!(
            "Starting {} search: seed {}, depth limit {:?}",
            self.strategy.name(),
            self.config.seed,
            self.config.depth_limit
        );

        let mut report = SearchReport::new(self.strategy.name());
        let mut listeners = Listeners::new(listeners);
        let mut termination = None;
        let mut done = false;

        listeners.notify(&mut report, |l| l.search_started(&*host));

        let initial = host.current_state_id();
        host.set_depth(initial, 0);
        frontier.add(
            Pending {
                snapshot: host.snapshot(),
                state_id: initial,
            },
            self.strategy.initial_weight(),
        )?;
        report.states_stored += 1;
        listeners.notify(&mut report, |l| l.state_stored(&*host));

        while !done && !listeners.failed && !frontier.is_empty() {
            if self.stop.load(atomic::Ordering::Relaxed) {
                info!("Stop requested, ending search");
                termination.get_or_insert(Termination::Stopped);
                break;
            }

            let extraction = self.strategy.select(&mut self.rng);
            let selected = match extraction {
                Extraction::Random => frontier.remove(&mut self.rng)?,
                Extraction::Max => frontier.remove_max()?,
            };
            let (Pending { snapshot, state_id }, weight) = selected.into_parts();
            report.snapshots_selected += 1;

            host.restore(snapshot);
            listeners.notify(&mut report, |l| l.state_restored(&*host));

            let depth = host.depth(host.current_state_id());
            debug!(
                "Selected state {} ({:?}, weight {:e}, depth {})",
                state_id, extraction, weight, depth
            );

            if let Some(limit) = self.config.depth_limit.filter(|&limit| depth >= limit) {
                listeners.constraint_hit(&mut report, &*host, SearchConstraint::DepthLimit(limit));
                continue;
            }
            report.snapshots_expanded += 1;

            while !listeners.failed {
                if !host.forward() {
                    break;
                }
                report.transitions += 1;
                listeners.notify(&mut report, |l| l.state_advanced(&*host));
                if listeners.failed {
                    break;
                }

                if let Some(violation) = host.violation().cloned() {
                    warn!("Property violation: {}", violation);
                    listeners.notify(&mut report, |l| l.property_violated(&*host, &violation));
                    report.violations.push(violation);
                    if self.config.stop_on_violation {
                        termination.get_or_insert(Termination::PropertyViolation);
                        done = true;
                        break;
                    }
                }

                if host.is_new_state() && !host.is_end_state() && !host.is_ignored_state() {
                    let child = clamp_weight(
                        self.strategy
                            .combine_weight(weight, step_probability(&*host)),
                    );
                    let target = host.current_state_id();
                    frontier.add(
                        Pending {
                            snapshot: host.snapshot(),
                            state_id: target,
                        },
                        child,
                    )?;
                    host.set_depth(target, depth + 1);
                    report.states_stored += 1;
                    debug!("Stored state {} with weight {:e}", target, child);
                    listeners.notify(&mut report, |l| l.state_stored(&*host));

                    if !host.within_budget() {
                        listeners.constraint_hit(
                            &mut report,
                            &*host,
                            SearchConstraint::StateBudget,
                        );
                        termination.get_or_insert(Termination::StateBudget);
                        done = true;
                        break;
                    }
                }

                host.backtrack();
                listeners.notify(&mut report, |l| l.state_backtracked(&*host));
            }
        }

        if listeners.failed {
            termination.get_or_insert(Termination::ListenerFailure);
        }
        report.termination = termination.unwrap_or(Termination::FrontierExhausted);
        listeners.notify(&mut report, |l| l.search_finished(&*host));

        info!(
            "Search finished ({}): {} selected, {} stored, {} transitions",
            report.termination, report.snapshots_selected, report.states_stored, report.transitions
        );
        Ok(report)
    }
}

/// Queue entry of the probability-first search.
struct Queued<S> {
    probability: f64,
    /// Insertion order; earlier entries win ties.
    sequence: u64,
    pending: Pending<S>,
}

impl<S> Ord for Queued<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.probability
            .total_cmp(&other.probability)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl<S> PartialOrd for Queued<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> PartialEq for Queued<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S> Eq for Queued<S> {}

/// Expands snapshots in order of decreasing path probability.
///
/// Each restored snapshot has all of its successors enumerated before the
/// next snapshot is taken off the queue; the search never resumes a
/// partially explored state.
pub struct ProbabilityFirstSearch {
    config: SearchConfig,
    stop: Arc<AtomicBool>,
    next_sequence: u64,
}

impl ProbabilityFirstSearch {
    pub fn new(config: SearchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            stop: Arc::new(AtomicBool::new(false)),
            next_sequence: 0,
        })
    }

    pub fn name(&self) -> &'static str {
        "probability-first"
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn supports_backtrack(&self) -> bool {
        false
    }

    fn queued<S>(&mut self, probability: f64, pending: Pending<S>) -> Queued<S> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Queued {
            probability,
            sequence,
            pending,
        }
    }

    pub fn run<H: Host>(
        &mut self,
        host: &mut H,
        listeners: &mut [&mut dyn SearchListener],
    ) -> Result<SearchReport, SearchError> {
        info!(
            "Starting probability-first search: depth limit {:?}",
            self.config.depth_limit
        );

        let mut report = SearchReport::new(self.name());
        let mut listeners = Listeners::new(listeners);
        let mut termination = None;
        let mut done = false;
        let mut queue = BinaryHeap::new();

        listeners.notify(&mut report, |l| l.search_started(&*host));

        let initial = host.current_state_id();
        host.set_depth(initial, 0);
        let entry = self.queued(
            1.0,
            Pending {
                snapshot: host.snapshot(),
                state_id: initial,
            },
        );
        queue.push(entry);
        report.states_stored += 1;
        listeners.notify(&mut report, |l| l.state_stored(&*host));

        while !done && !listeners.failed {
            if self.stop.load(atomic::Ordering::Relaxed) {
                info!("Stop requested, ending search");
                termination.get_or_insert(Termination::Stopped);
                break;
            }
            let Some(head) = queue.pop() else {
                break;
            };
            report.snapshots_selected += 1;
            let probability = head.probability;

            host.restore(head.pending.snapshot);
            listeners.notify(&mut report, |l| l.state_restored(&*host));

            let depth = host.depth(host.current_state_id());
            debug!(
                "Processing state {} (probability {:e}, depth {})",
                head.pending.state_id, probability, depth
            );

            if let Some(limit) = self.config.depth_limit.filter(|&limit| depth >= limit) {
                listeners.constraint_hit(&mut report, &*host, SearchConstraint::DepthLimit(limit));
            } else {
                report.snapshots_expanded += 1;
                while !listeners.failed {
                    if !host.forward() {
                        break;
                    }
                    report.transitions += 1;
                    listeners.notify(&mut report, |l| l.state_advanced(&*host));
                    if listeners.failed {
                        break;
                    }

                    if let Some(violation) = host.violation().cloned() {
                        warn!("Property violation: {}", violation);
                        listeners
                            .notify(&mut report, |l| l.property_violated(&*host, &violation));
                        report.violations.push(violation);
                        if self.config.stop_on_violation {
                            termination.get_or_insert(Termination::PropertyViolation);
                            done = true;
                            break;
                        }
                    }

                    if host.is_new_state() && !host.is_end_state() && !host.is_ignored_state() {
                        let child = clamp_weight(probability * step_probability(&*host));
                        let target = host.current_state_id();
                        host.set_depth(target, depth + 1);
                        let entry = self.queued(
                            child,
                            Pending {
                                snapshot: host.snapshot(),
                                state_id: target,
                            },
                        );
                        queue.push(entry);
                        report.states_stored += 1;
                        debug!("Queued state {} with probability {:e}", target, child);
                        listeners.notify(&mut report, |l| l.state_stored(&*host));
                    }

                    host.backtrack();
                    listeners.notify(&mut report, |l| l.state_backtracked(&*host));
                }
                listeners.notify(&mut report, |l| l.state_processed(&*host));
            }

            if !done && !host.within_budget() {
                listeners.constraint_hit(&mut report, &*host, SearchConstraint::StateBudget);
                termination.get_or_insert(Termination::StateBudget);
                done = true;
            }
        }

        if listeners.failed {
            termination.get_or_insert(Termination::ListenerFailure);
        }
        report.termination = termination.unwrap_or(Termination::FrontierExhausted);
        listeners.notify(&mut report, |l| l.search_finished(&*host));

        info!(
            "Search finished ({}): {} processed, {} stored, {} transitions",
            report.termination, report.snapshots_expanded, report.states_stored, report.transitions
        );
        Ok(report)
    }
}

/// Either search engine, chosen from a [`SearchConfig`].
pub enum Engine {
    Weighted(Search),
    ProbabilityFirst(ProbabilityFirstSearch),
}

impl Engine {
    pub fn from_config(config: &SearchConfig) -> Result<Self, ConfigError> {
        match config.selection_strategy()? {
            Some(strategy) => Ok(Engine::Weighted(Search::new(config.clone(), strategy)?)),
            None => Ok(Engine::ProbabilityFirst(ProbabilityFirstSearch::new(
                config.clone(),
            )?)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Engine::Weighted(search) => search.name(),
            Engine::ProbabilityFirst(search) => search.name(),
        }
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        match self {
            Engine::Weighted(search) => search.stop_handle(),
            Engine::ProbabilityFirst(search) => search.stop_handle(),
        }
    }

    pub fn supports_backtrack(&self) -> bool {
        match self {
            Engine::Weighted(search) => search.supports_backtrack(),
            Engine::ProbabilityFirst(search) => search.supports_backtrack(),
        }
    }

    pub fn run<H: Host>(
        &mut self,
        host: &mut H,
        listeners: &mut [&mut dyn SearchListener],
    ) -> Result<SearchReport, SearchError> {
        match self {
            Engine::Weighted(search) => search.run(host, listeners),
            Engine::ProbabilityFirst(search) => search.run(host, listeners),
        }
    }
}

/// Run the search policy `config` names against `host`.
pub fn explore<H: Host>(
    config: &SearchConfig,
    host: &mut H,
    listeners: &mut [&mut dyn SearchListener],
) -> Result<SearchReport, SearchError> {
    Engine::from_config(config)?.run(host, listeners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;
    use crate::host::PropertyViolation;
    use crate::model::{Location, LocationKind, Model, ModelHost};

    fn choice(probabilities: &[f64], targets: &[usize]) -> Location {
        Location::new(LocationKind::Choice {
            probabilities: probabilities.to_vec(),
            targets: targets.to_vec(),
        })
    }

    fn end() -> Location {
        Location::new(LocationKind::End)
    }

    fn step(target: usize) -> Location {
        Location::new(LocationKind::Step { target })
    }

    /// 0 --0.9--> 1 --> 3 --> 4 (end)
    /// 0 --0.1--> 2 (end)
    fn skewed_model() -> Model {
        Model::new(vec![
            choice(&[0.9, 0.1], &[1, 2]),
            step(3),
            end(),
            step(4),
            end(),
        ])
    }

    fn config(strategy: StrategyKind) -> SearchConfig {
        SearchConfig {
            strategy,
            ..Default::default()
        }
    }

    /// Records every event as a short string.
    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
        fail_on_store: bool,
    }

    impl SearchListener for EventLog {
        fn search_started(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
            self.events.push(format!("start {}", host.current_state_id()));
            Ok(())
        }

        fn state_advanced(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
            self.events.push(format!("advance {}", host.current_state_id()));
            Ok(())
        }

        fn state_restored(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
            self.events.push(format!("restore {}", host.current_state_id()));
            Ok(())
        }

        fn state_stored(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
            if self.fail_on_store && host.current_state_id() > 0 {
                return Err(ListenerError::Write {
                    path: "unwritable".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.events.push(format!("store {}", host.current_state_id()));
            Ok(())
        }

        fn state_processed(&mut self, host: &dyn HostView) -> Result<(), ListenerError> {
            self.events.push(format!("processed {}", host.current_state_id()));
            Ok(())
        }

        fn property_violated(
            &mut self,
            _host: &dyn HostView,
            violation: &PropertyViolation,
        ) -> Result<(), ListenerError> {
            self.events.push(format!("violation {}", violation.state_id));
            Ok(())
        }

        fn search_constraint_hit(
            &mut self,
            _host: &dyn HostView,
            constraint: SearchConstraint,
        ) -> Result<(), ListenerError> {
            self.events.push(format!("constraint {}", constraint.tag()));
            Ok(())
        }

        fn search_finished(&mut self, _host: &dyn HostView) -> Result<(), ListenerError> {
            self.events.push("finish".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_every_policy_explores_everything() {
        for strategy in [
            StrategyKind::Random,
            StrategyKind::EpsilonGreedy,
            StrategyKind::Softmax,
            StrategyKind::ProbabilityFirst,
        ] {
            let mut host = ModelHost::new(skewed_model()).unwrap();
            let report = explore(&config(strategy), &mut host, &mut []).unwrap();

            assert_eq!(report.termination, Termination::FrontierExhausted);
            assert_eq!(host.states_discovered(), 5, "{strategy:?}");
            // initial + the non-end states 1 and 3
            assert_eq!(report.states_stored, 3, "{strategy:?}");
            assert_eq!(report.transitions, 4, "{strategy:?}");
        }
    }

    #[test]
    fn test_list_frontier_matches_tree_frontier() {
        let mut tree_host = ModelHost::new(skewed_model()).unwrap();
        let mut list_host = ModelHost::new(skewed_model()).unwrap();
        let tree = explore(&config(StrategyKind::Random), &mut tree_host, &mut []).unwrap();
        let list = explore(
            &SearchConfig {
                frontier: FrontierKind::List,
                ..config(StrategyKind::Random)
            },
            &mut list_host,
            &mut [],
        )
        .unwrap();
        assert_eq!(tree.states_stored, list.states_stored);
        assert_eq!(tree.transitions, list.transitions);
    }

    #[test]
    fn test_event_order() {
        let mut host = ModelHost::new(skewed_model()).unwrap();
        let mut log = EventLog::default();
        explore(
            &config(StrategyKind::EpsilonGreedy),
            &mut host,
            &mut [&mut log],
        )
        .unwrap();

        assert_eq!(&log.events[..2], &["start 0", "store 0"]);
        assert_eq!(log.events[2], "restore 0");
        assert_eq!(log.events.last().unwrap(), "finish");
        assert!(log.events.contains(&"advance 2".to_string()));
        assert!(!log.events.iter().any(|e| e.starts_with("processed")));
    }

    #[test]
    fn test_probability_first_reports_processed_states() {
        let mut host = ModelHost::new(skewed_model()).unwrap();
        let mut log = EventLog::default();
        let mut engine = Engine::from_config(&config(StrategyKind::ProbabilityFirst)).unwrap();
        assert!(!engine.supports_backtrack());
        engine.run(&mut host, &mut [&mut log]).unwrap();

        let processed: Vec<&str> = log
            .events
            .iter()
            .filter(|e| e.starts_with("processed"))
            .map(String::as_str)
            .collect();
        assert_eq!(processed, vec!["processed 0", "processed 1", "processed 3"]);
    }

    #[test]
    fn test_probability_first_prefers_likely_paths() {
        // 0 --0.2--> 1 (step to 3, end)
        // 0 --0.8--> 2 (step to 4, end)
        let model = Model::new(vec![
            choice(&[0.2, 0.8], &[1, 2]),
            step(3),
            step(4),
            end(),
            end(),
        ]);
        let mut host = ModelHost::new(model).unwrap();
        let mut log = EventLog::default();
        explore(
            &config(StrategyKind::ProbabilityFirst),
            &mut host,
            &mut [&mut log],
        )
        .unwrap();

        let restores: Vec<&str> = log
            .events
            .iter()
            .filter(|e| e.starts_with("restore"))
            .map(String::as_str)
            .collect();
        // state 2 (probability 0.8) is expanded before state 1 (0.2)
        assert_eq!(restores, vec!["restore 0", "restore 2", "restore 1"]);
    }

    #[test]
    fn test_greedy_prefers_heavy_states() {
        let model = Model::new(vec![
            choice(&[0.2, 0.8], &[1, 2]),
            step(3),
            step(4),
            end(),
            end(),
        ]);
        let mut host = ModelHost::new(model).unwrap();
        let mut log = EventLog::default();
        let config = SearchConfig {
            strategy: StrategyKind::EpsilonGreedy,
            epsilon: 0.0,
            ..Default::default()
        };
        explore(&config, &mut host, &mut [&mut log]).unwrap();

        let restores: Vec<&str> = log
            .events
            .iter()
            .filter(|e| e.starts_with("restore"))
            .map(String::as_str)
            .collect();
        assert_eq!(restores, vec!["restore 0", "restore 2", "restore 1"]);
    }

    #[test]
    fn test_depth_limit_prunes_and_continues() {
        for strategy in [StrategyKind::Random, StrategyKind::ProbabilityFirst] {
            let mut host = ModelHost::new(skewed_model()).unwrap();
            let mut log = EventLog::default();
            let config = SearchConfig {
                depth_limit: Some(1),
                ..config(strategy)
            };
            let report = explore(&config, &mut host, &mut [&mut log]).unwrap();

            // state 1 sits at depth 1 and is never expanded
            assert_eq!(report.termination, Termination::FrontierExhausted);
            assert_eq!(report.depth_limit_hits, 1, "{strategy:?}");
            assert_eq!(report.snapshots_expanded, 1, "{strategy:?}");
            assert_eq!(report.constraints, vec!["depth limit reached: 1"]);
            assert!(log.events.contains(&"constraint depth".to_string()));
            assert!(!log.events.contains(&"advance 3".to_string()));
        }
    }

    #[test]
    fn test_state_budget_ends_search() {
        let mut model = skewed_model();
        model.max_states = Some(2);
        for strategy in [StrategyKind::Softmax, StrategyKind::ProbabilityFirst] {
            let mut host = ModelHost::new(model.clone()).unwrap();
            let report = explore(&config(strategy), &mut host, &mut []).unwrap();
            assert_eq!(report.termination, Termination::StateBudget, "{strategy:?}");
            assert_eq!(report.constraints, vec!["state budget exhausted"]);
        }
    }

    #[test]
    fn test_violation_stops_search() {
        let mut model = skewed_model();
        model.locations[1].violation = Some("unsafe".to_string());
        let mut host = ModelHost::new(model.clone()).unwrap();
        let mut log = EventLog::default();
        let report = explore(
            &config(StrategyKind::Random),
            &mut host,
            &mut [&mut log],
        )
        .unwrap();

        assert_eq!(report.termination, Termination::PropertyViolation);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].property, "unsafe");
        assert!(log.events.contains(&"violation 1".to_string()));
        assert_eq!(log.events.last().unwrap(), "finish");
    }

    #[test]
    fn test_violation_can_be_non_fatal() {
        let mut model = skewed_model();
        model.locations[1].violation = Some("unsafe".to_string());
        let mut host = ModelHost::new(model).unwrap();
        let config = SearchConfig {
            stop_on_violation: false,
            ..config(StrategyKind::ProbabilityFirst)
        };
        let report = explore(&config, &mut host, &mut []).unwrap();

        assert_eq!(report.termination, Termination::FrontierExhausted);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(host.states_discovered(), 5);
    }

    #[test]
    fn test_listener_failure_stops_cleanly() {
        let mut host = ModelHost::new(skewed_model()).unwrap();
        let mut log = EventLog {
            fail_on_store: true,
            ..Default::default()
        };
        let report = explore(
            &config(StrategyKind::Random),
            &mut host,
            &mut [&mut log],
        )
        .unwrap();

        assert_eq!(report.termination, Termination::ListenerFailure);
        assert_eq!(report.listener_failures.len(), 1);
        assert!(report.listener_failures[0].contains("disk full"));
        assert_eq!(report.snapshots_selected, 1);
        assert_eq!(log.events.last().unwrap(), "finish");
    }

    #[test]
    fn test_stop_flag() {
        let mut host = ModelHost::new(skewed_model()).unwrap();
        let mut engine = Engine::from_config(&config(StrategyKind::Softmax)).unwrap();
        engine
            .stop_handle()
            .store(true, atomic::Ordering::Relaxed);
        let report = engine.run(&mut host, &mut []).unwrap();
        assert_eq!(report.termination, Termination::Stopped);
        assert_eq!(report.snapshots_selected, 0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut host = ModelHost::new(skewed_model()).unwrap();
            let mut log = EventLog::default();
            let config = SearchConfig {
                seed,
                ..config(StrategyKind::Random)
            };
            explore(&config, &mut host, &mut [&mut log]).unwrap();
            log.events
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_clamp_weight() {
        assert_eq!(clamp_weight(0.0), f64::MIN_POSITIVE);
        assert_eq!(clamp_weight(1e-320), f64::MIN_POSITIVE);
        assert_eq!(clamp_weight(0.25), 0.25);
    }

    #[test]
    fn test_queue_order() {
        let mut search = ProbabilityFirstSearch::new(SearchConfig::default()).unwrap();
        let mut heap = BinaryHeap::new();
        for (id, p) in [(0, 0.5), (1, 0.9), (2, 0.5), (3, 0.1)] {
            let entry = search.queued(
                p,
                Pending {
                    snapshot: (),
                    state_id: id,
                },
            );
            heap.push(entry);
        }
        let order: Vec<i64> = std::iter::from_fn(|| heap.pop().map(|q| q.pending.state_id)).collect();
        assert_eq!(order, vec![1, 0, 2, 3]);
    }
}
