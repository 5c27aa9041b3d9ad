//! Typed configuration for every tunable named in the orchestration
//! core's external interface: the orchestrator's concurrency cap and
//! deadlines, the retry/backoff policy, and the registry's selection
//! weights.
//!
//! Configuration loads from a TOML file (via [`OrchestratorConfig::from_toml_str`]
//! / [`OrchestratorConfig::load`]) or from [`OrchestratorConfig::default`],
//! and is validated on construction rather than at first use.

#![warn(missing_docs, clippy::pedantic)]

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The three weights the registry's selection score combines: success
/// rate, speed, and load. Must sum to `1.0` within [`SelectionWeights::WEIGHT_EPSILON`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionWeights {
    /// Weight applied to an agent's success rate. Default `0.5`.
    #[serde(default = "SelectionWeights::default_success")]
    pub success: f64,
    /// Weight applied to an agent's speed score. Default `0.3`.
    #[serde(default = "SelectionWeights::default_speed")]
    pub speed: f64,
    /// Weight applied to an agent's load score. Default `0.2`.
    #[serde(default = "SelectionWeights::default_load")]
    pub load: f64,
}

impl SelectionWeights {
    const fn default_success() -> f64 {
        0.5
    }

    const fn default_speed() -> f64 {
        0.3
    }

    const fn default_load() -> f64 {
        0.2
    }

    /// Tolerance allowed when validating that the three weights sum to `1.0`.
    pub const WEIGHT_EPSILON: f64 = 1e-6;

    /// Returns `true` when the weights sum to `1.0` within [`Self::WEIGHT_EPSILON`].
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        (self.success + self.speed + self.load - 1.0).abs() < Self::WEIGHT_EPSILON
    }
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            success: Self::default_success(),
            speed: Self::default_speed(),
            load: Self::default_load(),
        }
    }
}

/// Validated, typed configuration for an orchestrator instance. Every
/// field corresponds to a knob enumerated in the core's external
/// interface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Concurrency cap on in-flight subtasks within a single orchestrator
    /// instance, across all generations it is currently running. Default `10`.
    #[serde(default = "OrchestratorConfig::default_max_parallel_tasks")]
    pub max_parallel_tasks: usize,
    /// Deadline, in seconds, for an entire parent task. Default `300`.
    #[serde(default = "OrchestratorConfig::default_task_timeout_seconds")]
    pub task_timeout_seconds: u64,
    /// Deadline, in seconds, for a single delegation round-trip over the
    /// communication layer. Default `30.0`.
    #[serde(default = "OrchestratorConfig::default_delegation_timeout_seconds")]
    pub delegation_timeout_seconds: f64,
    /// Maximum number of attempts (the first try plus retries) per
    /// subtask before it is reported as failed. Default `3`.
    #[serde(default = "OrchestratorConfig::default_max_retries")]
    pub max_retries: u32,
    /// Base, in seconds, of the exponential retry backoff
    /// `base * 2^(attempt - 1)`, before jitter is added. Default `1.0`.
    #[serde(default = "OrchestratorConfig::default_retry_backoff_base_seconds")]
    pub retry_backoff_base_seconds: f64,
    /// Weighting applied by the registry's selection score.
    #[serde(default)]
    pub selection_weights: SelectionWeights,
}

impl OrchestratorConfig {
    const fn default_max_parallel_tasks() -> usize {
        10
    }

    const fn default_task_timeout_seconds() -> u64 {
        300
    }

    const fn default_delegation_timeout_seconds() -> f64 {
        30.0
    }

    const fn default_max_retries() -> u32 {
        3
    }

    const fn default_retry_backoff_base_seconds() -> f64 {
        1.0
    }

    /// Returns the parent task deadline as a [`Duration`].
    #[must_use]
    pub const fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_seconds)
    }

    /// Returns the per-delegation deadline as a [`Duration`].
    #[must_use]
    pub fn delegation_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.delegation_timeout_seconds.max(0.0))
    }

    /// Returns the retry backoff base as a [`Duration`].
    #[must_use]
    pub fn retry_backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.retry_backoff_base_seconds.max(0.0))
    }

    /// Validates every field, returning the config unchanged on success.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero concurrency cap, a
    /// zero retry budget, or negative timeouts/backoff, and
    /// [`ConfigError::UnnormalizedWeights`] when the selection weights do
    /// not sum to `1.0` within [`SelectionWeights::WEIGHT_EPSILON`].
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_parallel_tasks == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_parallel_tasks",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_retries",
                reason: "must be at least 1".into(),
            });
        }
        if self.delegation_timeout_seconds < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "delegation_timeout_seconds",
                reason: "must be non-negative".into(),
            });
        }
        if self.retry_backoff_base_seconds < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_backoff_base_seconds",
                reason: "must be non-negative".into(),
            });
        }
        if !self.selection_weights.is_normalized() {
            return Err(ConfigError::UnnormalizedWeights {
                success: self.selection_weights.success,
                speed: self.selection_weights.speed,
                load: self.selection_weights.load,
            });
        }
        Ok(self)
    }

    /// Parses and validates configuration from a TOML document. Fields
    /// absent from the document fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or
    /// [`ConfigError::InvalidValue`]/[`ConfigError::UnnormalizedWeights`]
    /// when validation fails.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()
    }

    /// Loads and validates configuration from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or the
    /// errors documented on [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "loaded orchestrator configuration");
        Self::from_toml_str(&contents)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_parallel_tasks: Self::default_max_parallel_tasks(),
            task_timeout_seconds: Self::default_task_timeout_seconds(),
            delegation_timeout_seconds: Self::default_delegation_timeout_seconds(),
            max_retries: Self::default_max_retries(),
            retry_backoff_base_seconds: Self::default_retry_backoff_base_seconds(),
            selection_weights: SelectionWeights::default(),
        }
    }
}

/// Errors produced while loading or validating [`OrchestratorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file `{path}`: {source}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML document could not be parsed into [`OrchestratorConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field held a value outside its accepted range.
    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable description of the violated constraint.
        reason: String,
    },

    /// The selection weights did not sum to `1.0`.
    #[error("selection weights must sum to 1.0, got {success} + {speed} + {load}")]
    UnnormalizedWeights {
        /// Configured success weight.
        success: f64,
        /// Configured speed weight.
        speed: f64,
        /// Configured load weight.
        load: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_external_interface_table() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_parallel_tasks, 10);
        assert_eq!(config.task_timeout_seconds, 300);
        assert!((config.delegation_timeout_seconds - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.max_retries, 3);
        assert!((config.retry_backoff_base_seconds - 1.0).abs() < f64::EPSILON);
        assert!(config.selection_weights.is_normalized());
        config.validate().expect("defaults must validate");
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let mut config = OrchestratorConfig::default();
        config.max_parallel_tasks = 0;
        let err = config.validate().expect_err("zero concurrency should fail");
        assert!(matches!(err, ConfigError::InvalidValue { field: "max_parallel_tasks", .. }));
    }

    #[test]
    fn unnormalized_weights_are_rejected() {
        let mut config = OrchestratorConfig::default();
        config.selection_weights = SelectionWeights {
            success: 0.5,
            speed: 0.5,
            load: 0.5,
        };
        let err = config.validate().expect_err("unnormalized weights should fail");
        assert!(matches!(err, ConfigError::UnnormalizedWeights { .. }));
    }

    #[test]
    fn partial_toml_document_fills_in_defaults() {
        let config = OrchestratorConfig::from_toml_str("max_parallel_tasks = 4\n")
            .expect("partial document should parse");
        assert_eq!(config.max_parallel_tasks, 4);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = OrchestratorConfig::from_toml_str("max_parallel_tasks = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
