//! Search configuration.

use crate::strategy::{EpsilonGreedy, RandomSelection, SelectionStrategy, Softmax};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest supported number of decimals when rounding probabilities.
pub const MAX_PRECISION: u32 = 15;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("epsilon must be in [0, 1], got {0}")]
    Epsilon(f64),

    #[error("temperature must be > 0 with exp(1/temperature) finite, got {0}")]
    Temperature(f64),

    #[error("precision must be at most 15 decimals, got {0}")]
    Precision(u32),

    #[error("depth limit must be at least 1")]
    DepthLimit,
}

/// Which search policy drives the exploration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Random,
    EpsilonGreedy,
    Softmax,
    ProbabilityFirst,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Random => "random",
            StrategyKind::EpsilonGreedy => "epsilon-greedy",
            StrategyKind::Softmax => "softmax",
            StrategyKind::ProbabilityFirst => "probability-first",
        }
    }
}

/// Which distribution backs the frontier of the weighted policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrontierKind {
    /// Red-black tree, logarithmic per operation.
    Tree,
    /// Re-sorted vector, for small frontiers.
    List,
}

/// Configuration for a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub strategy: StrategyKind,
    pub frontier: FrontierKind,
    /// Probability of a random pick under epsilon-greedy.
    pub epsilon: f64,
    /// Softmax temperature.
    pub temperature: f64,
    /// Snapshots at this depth are not expanded. `None` means unlimited.
    pub depth_limit: Option<u32>,
    /// End the whole search at the first property violation.
    pub stop_on_violation: bool,
    /// Master seed.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Random,
            frontier: FrontierKind::Tree,
            epsilon: 0.1,
            temperature: 0.5,
            depth_limit: None,
            stop_on_violation: true,
            seed: 42,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth_limit == Some(0) {
            return Err(ConfigError::DepthLimit);
        }
        self.selection_strategy().map(|_| ())
    }

    /// Build the selection strategy of a weighted policy. Returns `None` for
    /// probability-first, which orders its queue directly.
    pub fn selection_strategy(&self) -> Result<Option<Box<dyn SelectionStrategy>>, ConfigError> {
        let strategy: Box<dyn SelectionStrategy> = match self.strategy {
            StrategyKind::Random => Box::new(RandomSelection),
            StrategyKind::EpsilonGreedy => Box::new(EpsilonGreedy::new(self.epsilon)?),
            StrategyKind::Softmax => Box::new(Softmax::new(self.temperature)?),
            StrategyKind::ProbabilityFirst => return Ok(None),
        };
        Ok(Some(strategy))
    }
}

/// Check a rounding precision.
pub fn check_precision(precision: u32) -> Result<(), ConfigError> {
    if precision > MAX_PRECISION {
        return Err(ConfigError::Precision(precision));
    }
    Ok(())
}
