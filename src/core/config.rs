//! Tracker configuration with documented constants
//!
//! All tunables of the occupancy index live here. Values can be loaded from
//! a TOML file; anything omitted falls back to the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{OccupancyError, Result};

/// Number of strides taken through a sampled buffer.
///
/// Sampled registration reads `DEFAULT_SAMPLE_COUNT + 1` points, both buffer
/// ends included.
pub const DEFAULT_SAMPLE_COUNT: usize = 10;

/// Shard count used by the sharded discipline when none is configured
pub const DEFAULT_SHARD_COUNT: usize = 16;

/// How a tracker shared between planning workers synchronizes its tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    /// One exclusive lock guarding all four tables
    #[default]
    Exclusive,
    /// Agent-owned tables sharded by agent id, inverse tables behind a global lock
    Sharded,
}

/// Configuration for the occupancy tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Stride count for sampled (buffered) registration
    ///
    /// Higher values register more cells per long path: better coverage of
    /// curvy routes, higher update cost per tick.
    pub sample_count: usize,

    /// Synchronization strategy for shared trackers
    pub discipline: Discipline,

    /// Number of agent shards when `discipline = "sharded"`
    ///
    /// Roughly the number of planning workers is a good start. Only the
    /// sharded discipline reads this.
    pub shard_count: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            discipline: Discipline::Exclusive,
            shard_count: DEFAULT_SHARD_COUNT,
        }
    }
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TrackerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            "Loaded tracker config from {}: {:?}",
            path.as_ref().display(),
            config
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 {
            return Err(OccupancyError::InvalidConfig(
                "sample_count must be at least 1".into(),
            ));
        }

        if self.shard_count == 0 {
            return Err(OccupancyError::InvalidConfig(
                "shard_count must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
