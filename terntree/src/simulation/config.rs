//! Simulation run configuration.
//!
//! # Environment Variables
//!
//! - `TERNTREE_SIM_SEED`: RNG seed for the operation stream (default: `12345`)
//! - `TERNTREE_SIM_OPS`: number of operations per run (default: `4000`)
//! - `TERNTREE_SIM_KEYSPACE`: size of the key pool (default: `512`)
//!
//! The key pool is deliberately small relative to the operation count so
//! runs exercise overwrites and repeated splits, not just fresh inserts.

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// RNG seed; the same seed replays the same run.
    pub seed: u64,
    /// Number of operations to generate.
    pub operations: usize,
    /// Keys are drawn from `0..key_space`.
    pub key_space: u32,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl SimConfig {
    /// Default RNG seed.
    pub const DEFAULT_SEED: u64 = 12345;
    /// Default operation count.
    pub const DEFAULT_OPERATIONS: usize = 4000;
    /// Default key pool size.
    pub const DEFAULT_KEY_SPACE: u32 = 512;

    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            seed: parse_env("TERNTREE_SIM_SEED", Self::DEFAULT_SEED)?,
            operations: parse_env("TERNTREE_SIM_OPS", Self::DEFAULT_OPERATIONS)?,
            key_space: parse_env("TERNTREE_SIM_KEYSPACE", Self::DEFAULT_KEY_SPACE)?,
        })
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            operations: Self::DEFAULT_OPERATIONS,
            key_space: Self::DEFAULT_KEY_SPACE,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' could not be parsed"),
        }),
        Err(_) => Ok(default),
    }
}
