//! Construction parameters for a sorted set.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::skip_list::{DEFAULT_PROBABILITY, MAX_LEVEL};

/// Tunables for the underlying skip list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Highest level a node may be drawn at, `1..=32`.
    pub max_level: usize,
    /// Probability that a node is promoted one more level, in `(0, 1)`.
    pub probability: f64,
    /// Fixed seed for level draws. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_level: MAX_LEVEL,
            probability: DEFAULT_PROBABILITY,
            seed: None,
        }
    }
}

impl Config {
    /// Default config with a fixed seed.
    pub fn seeded(seed: u64) -> Config {
        return Config {
            seed: Some(seed),
            ..Config::default()
        };
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_level == 0 || self.max_level > MAX_LEVEL {
            return Err(Error::InvalidConfig {
                field: "max_level",
                reason: format!("{} is outside 1..={}", self.max_level, MAX_LEVEL),
            });
        }
        // NaN fails both comparisons and lands here too.
        if !(self.probability > 0.0 && self.probability < 1.0) {
            return Err(Error::InvalidConfig {
                field: "probability",
                reason: format!("{} is outside (0, 1)", self.probability),
            });
        }
        return Ok(());
    }
}
