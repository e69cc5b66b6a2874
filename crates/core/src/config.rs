//! Pipeline configuration.
//!
//! Every field has a default, so a config file only needs the keys it changes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Lowest per-slide cost estimate the preview may show.
pub const MINIMUM_COST_FLOOR: u64 = 2;

/// Tunables for the analyze and translate paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum transform calls in flight at once, across all slides.
    pub max_concurrent_requests: usize,

    /// Per-call timeout for the transform, in seconds.
    pub request_timeout_secs: u64,

    /// Estimated cost per word used by the preview.
    pub cost_per_word: f64,

    /// Floor for a slide's estimated cost.
    pub minimum_cost: u64,

    /// Number of units joined into a slide's preview text.
    pub preview_units: usize,

    /// Maximum characters of preview text before truncation.
    pub preview_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            request_timeout_secs: 60,
            cost_per_word: 0.15,
            minimum_cost: 2,
            preview_units: 3,
            preview_chars: 100,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        log::debug!("Loaded pipeline config from {}", path.display());
        Self::from_json_str(&json)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_requests == 0 {
            return Err(Error::InvalidConfig(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.minimum_cost < MINIMUM_COST_FLOOR {
            return Err(Error::InvalidConfig(format!(
                "minimum_cost must be at least {}, got {}",
                MINIMUM_COST_FLOOR, self.minimum_cost
            )));
        }
        if !self.cost_per_word.is_finite() || self.cost_per_word < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "cost_per_word must be a non-negative number, got {}",
                self.cost_per_word
            )));
        }
        Ok(())
    }

    /// Per-call timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"max_concurrent_requests": 8}"#).unwrap();
        assert_eq!(config.max_concurrent_requests, 8);
        assert_eq!(config.minimum_cost, 2);
        assert_eq!(config.preview_chars, 100);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = PipelineConfig::from_json_str(r#"{"max_concurrent_requests": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_minimum_cost_below_floor_rejected() {
        let err = PipelineConfig::from_json_str(r#"{"minimum_cost": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(PipelineConfig::from_json_str(r#"{"minimum_cost": 5}"#).is_ok());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let config = PipelineConfig {
            cost_per_word: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            PipelineConfig::from_json_str("{not json"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
