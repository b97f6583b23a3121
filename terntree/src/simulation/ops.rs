//! Operation generator for deterministic simulation testing.
//!
//! Generates random but reproducible operation sequences against a tree.
//! Keys are drawn from a bounded pool so a long run revisits keys,
//! exercising overwrites alongside splits.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Configuration for operation generation.
#[derive(Debug, Clone)]
pub struct OpGenConfig {
    /// Probability of generating a put (0.0 - 1.0).
    pub put_rate: f64,
    /// Probability of generating a find; the remainder after puts and
    /// finds becomes range queries.
    pub find_rate: f64,
    /// Keys are drawn from `0..key_space`.
    pub key_space: u32,
}

impl Default for OpGenConfig {
    fn default() -> Self {
        Self {
            put_rate: 0.6,
            find_rate: 0.25,
            key_space: 512,
        }
    }
}

/// A single generated tree operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Insert or overwrite a key.
    Put { key: u32, value: String },
    /// Point lookup.
    Find { key: u32 },
    /// Range query with `min <= max`.
    Range { min: u32, max: u32 },
}

/// Generator for random operation sequences.
///
/// Produces identical sequences for identical seeds.
pub struct OpGenerator {
    rng: StdRng,
    config: OpGenConfig,
    /// Monotonic counter so every put carries a distinct value.
    next_value_id: u64,
}

impl OpGenerator {
    /// Create a generator with the default configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, OpGenConfig::default())
    }

    /// Create a generator with custom configuration.
    #[must_use]
    pub fn with_config(seed: u64, config: OpGenConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
            next_value_id: 0,
        }
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &OpGenConfig {
        &self.config
    }

    /// Generate the next operation.
    pub fn next_op(&mut self) -> Op {
        let roll: f64 = self.rng.random();

        if roll < self.config.put_rate {
            let key = self.random_key();
            self.next_value_id += 1;
            Op::Put {
                key,
                value: format!("value-{key}-{}", self.next_value_id),
            }
        } else if roll < self.config.put_rate + self.config.find_rate {
            Op::Find {
                key: self.random_key(),
            }
        } else {
            let a = self.random_key();
            let b = self.random_key();
            Op::Range {
                min: a.min(b),
                max: a.max(b),
            }
        }
    }

    fn random_key(&mut self) -> u32 {
        self.rng.random_range(0..self.config.key_space.max(1))
    }
}
