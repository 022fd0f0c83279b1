//! Query defaults, loadable from TOML.
//!
//! ```toml
//! [symmetry]
//! radius = 25.0
//!
//! [neighbors]
//! max_dist = 4.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymmetryConfig {
    /// Search radius around the view centre, in Angstroms.
    pub radius: f64,
}

impl Default for SymmetryConfig {
    fn default() -> Self {
        Self { radius: 25.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NeighborConfig {
    /// Neighbour search radius, in Angstroms.
    pub max_dist: f32,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self { max_dist: 4.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub symmetry: SymmetryConfig,
    pub neighbors: NeighborConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.symmetry.radius.is_finite() && self.symmetry.radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "symmetry.radius must be positive, got {}",
                self.symmetry.radius
            )));
        }
        if !(self.neighbors.max_dist.is_finite() && self.neighbors.max_dist >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "neighbors.max_dist must be non-negative, got {}",
                self.neighbors.max_dist
            )));
        }
        Ok(())
    }
}
