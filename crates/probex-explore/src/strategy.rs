//! Selection strategies for the weighted search policies.
//!
//! The three weighted policies share one search loop and differ in two
//! places only: which end of the frontier they extract from, and how a
//! newly discovered state's weight follows from its parent's weight and the
//! probability of the step that reached it.
//!
//! | strategy        | seed weight  | extraction                          | child weight    |
//! |-----------------|--------------|-------------------------------------|-----------------|
//! | random          | 1            | weighted random                     | `parent · p`    |
//! | epsilon-greedy  | 1            | max with prob. `1 - ε`, else random | `parent · p`    |
//! | softmax         | `exp(1/τ)`   | weighted random                     | `parent ^ p`    |
//!
//! For softmax, a state reached along steps with probabilities
//! `p1, p2, ..., pk` gets weight `exp(1/τ) ^ (p1 · p2 · ... · pk)`, which is
//! `exp(P/τ)` for the path probability `P`. Weighted-random extraction then
//! samples frontier states with probability `exp(P/τ) / Σ exp(P'/τ)`.

use crate::config::ConfigError;
use rand::RngCore;

/// Which end of the frontier to take the next snapshot from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    Random,
    Max,
}

/// The policy-specific half of a weighted search.
pub trait SelectionStrategy {
    fn name(&self) -> &'static str;

    /// Weight of the initial snapshot.
    fn initial_weight(&self) -> f64;

    /// Decide how the next snapshot is extracted.
    fn select(&mut self, rng: &mut dyn RngCore) -> Extraction;

    /// Weight of a state reached from a frontier entry of weight `parent`
    /// by a step of probability `step`.
    fn combine_weight(&self, parent: f64, step: f64) -> f64;
}

/// Pure weighted-random selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelection;

impl SelectionStrategy for RandomSelection {
    fn name(&self) -> &'static str {
        "random"
    }

    fn initial_weight(&self) -> f64 {
        1.0
    }

    fn select(&mut self, _rng: &mut dyn RngCore) -> Extraction {
        Extraction::Random
    }

    fn combine_weight(&self, parent: f64, step: f64) -> f64 {
        parent * step
    }
}

/// Greedy on path probability, exploring at random with probability
/// `epsilon`.
#[derive(Debug, Clone, Copy)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(ConfigError::Epsilon(epsilon));
        }
        Ok(Self { epsilon })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl SelectionStrategy for EpsilonGreedy {
    fn name(&self) -> &'static str {
        "epsilon-greedy"
    }

    fn initial_weight(&self) -> f64 {
        1.0
    }

    fn select(&mut self, rng: &mut dyn RngCore) -> Extraction {
        if uniform(rng) >= self.epsilon {
            Extraction::Max
        } else {
            Extraction::Random
        }
    }

    fn combine_weight(&self, parent: f64, step: f64) -> f64 {
        parent * step
    }
}

/// Samples states with probability proportional to `exp(P/τ)`.
#[derive(Debug, Clone, Copy)]
pub struct Softmax {
    temperature: f64,
    seed_weight: f64,
}

impl Softmax {
    pub fn new(temperature: f64) -> Result<Self, ConfigError> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(ConfigError::Temperature(temperature));
        }
        let seed_weight = (1.0 / temperature).exp();
        if !seed_weight.is_finite() {
            return Err(ConfigError::Temperature(temperature));
        }
        Ok(Self {
            temperature,
            seed_weight,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl SelectionStrategy for Softmax {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn initial_weight(&self) -> f64 {
        self.seed_weight
    }

    fn select(&mut self, _rng: &mut dyn RngCore) -> Extraction {
        Extraction::Random
    }

    fn combine_weight(&self, parent: f64, step: f64) -> f64 {
        parent.powf(step)
    }
}

/// A uniform draw from `[0, 1)` off a trait-object RNG.
fn uniform(rng: &mut dyn RngCore) -> f64 {
    use rand::Rng;
    rng.gen::<f64>()
}
