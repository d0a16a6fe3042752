//! Engine configuration
//!
//! Everything here has a default, so an empty YAML document is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },
    #[error("invalid configuration: {0}")]
    Parse(String),
    #[error("invalid thresholds: {0}")]
    Thresholds(String),
}

/// Which bidder proposes the call before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidderKind {
    /// Rule store first, heuristic fallback when no rule matches
    #[default]
    Schema,
    /// The heuristic bidder on its own
    Reference,
}

/// Numbers the validation layer checks proposals against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    /// Combined HCP below which a small slam is refused
    pub small_slam: u8,
    /// Combined HCP below which a grand slam is refused
    pub grand_slam: u8,
    /// Shortfall in combined points a bid may carry unremarked
    pub strength_tolerance: u8,
    /// Further shortfall accepted with low confidence before the bid is
    /// lowered
    pub downgrade_margin: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            small_slam: 33,
            grand_slam: 37,
            strength_tolerance: 2,
            downgrade_margin: 3,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.small_slam >= self.grand_slam {
            return Err(ConfigError::Thresholds(format!(
                "small_slam ({}) must be below grand_slam ({})",
                self.small_slam, self.grand_slam
            )));
        }
        if self.grand_slam > 40 {
            return Err(ConfigError::Thresholds(format!(
                "grand_slam ({}) cannot exceed the 40 HCP in the deck",
                self.grand_slam
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub bidder: BidderKind,
    pub thresholds: Thresholds,
    /// Directory of additional rule modules, loaded next to the built-in ones
    pub extra_rules: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null rather than an empty map.
        let config: EngineConfig = if text.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.thresholds.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_yaml(&text)?;
        // Relative rule directories are relative to the config file.
        if let (Some(dir), Some(base)) = (&config.extra_rules, path.parent()) {
            if dir.is_relative() {
                config.extra_rules = Some(base.join(dir));
            }
        }
        Ok(config)
    }
}
