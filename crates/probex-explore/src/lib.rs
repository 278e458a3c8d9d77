//! Probability-guided state-space search.
//!
//! This crate drives a host exploration engine through a branching state
//! space whose transitions carry probabilities, and records what it sees as
//! a discrete-time Markov chain.
//!
//! # Architecture
//!
//! ```text
//! 1. Host reports a state → SNAPSHOT, onto the frontier with a weight
//! 2. Policy takes a snapshot off the frontier:
//!    - random:            weighted random
//!    - epsilon-greedy:    heaviest, or weighted random with probability ε
//!    - softmax:           weighted random on exp(P/τ)
//!    - probability-first: most probable path first, successors drained
//! 3. Restore it, step through every transition out of it
//! 4. Listeners see every step: the recorder turns them into a DTMC
//! 5. New states go onto the frontier with the path probability folded in
//! 6. Repeat until the frontier is empty or a limit is hit
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use probex_explore::model::{load_model, ModelHost};
//! use probex_explore::statespace::{StateSpace, TextSink};
//! use probex_explore::{explore, format_report, SearchConfig, StrategyKind};
//!
//! let model = load_model("coin.json").unwrap();
//! let mut host = ModelHost::new(model).unwrap();
//! let mut recorder = StateSpace::new(TextSink::new(), 2)
//!     .unwrap()
//!     .with_output("out", "coin");
//!
//! let config = SearchConfig {
//!     strategy: StrategyKind::Softmax,
//!     ..Default::default()
//! };
//! let report = explore(&config, &mut host, &mut [&mut recorder]).unwrap();
//!
//! println!("{}", format_report(&report));
//! ```
//!
//! # Module Structure
//!
//! - [`host`]: the host engine interface
//! - [`listener`]: search events and the listener trait
//! - [`strategy`]: how the weighted policies select and weigh snapshots
//! - [`search`]: the search loops
//! - [`statespace`]: the DTMC recorder and its output formats
//! - [`model`]: a host that explores a Markov chain loaded from JSON
//! - [`config`] and [`report`]: run configuration and summaries
//!
//! # Determinism
//!
//! A search is deterministic given its seed and a deterministic host. All
//! maps are `BTreeMap`s.

pub mod config;
pub mod host;
pub mod listener;
pub mod model;
pub mod report;
pub mod search;
pub mod statespace;
pub mod strategy;

pub use config::{ConfigError, FrontierKind, SearchConfig, StrategyKind};
pub use host::{Host, HostView, PropertyViolation};
pub use listener::{ListenerError, SearchConstraint, SearchListener};
pub use report::{format_report, SearchReport, Termination};
pub use search::{explore, Engine, ProbabilityFirstSearch, Search, SearchError};
pub use strategy::{EpsilonGreedy, Extraction, RandomSelection, SelectionStrategy, Softmax};
