//! Deterministic simulation testing (DST) infrastructure.
//!
//! This module provides tools for exercising the tree with:
//! - Reproducible random operation streams (seeded RNG)
//! - A reference model tracking the expected contents
//! - Structural invariant checking by full traversal
//! - Environment-variable configuration for reproducing runs
//!
//! Given the same seed, a simulation run is identical, so a failing run
//! can be replayed by exporting `TERNTREE_SIM_SEED`.

mod config;
mod invariants;
mod ops;

#[cfg(test)]
mod sim_tests;

pub use config::{ConfigError, SimConfig};
pub use invariants::{InvariantViolation, ModelHistory, check_tree};
pub use ops::{Op, OpGenConfig, OpGenerator};
