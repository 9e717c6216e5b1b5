//! Run configuration loading and validation.
//!
//! A [`RunConfig`] is loaded from a TOML document, validated once, and then
//! treated as immutable. Command-line overrides never mutate a loaded
//! config; they produce a new validated instance, so one process can hold
//! several configs without cross-run contamination.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::sampling::{SamplingPlan, Temperature};

/// Default device count when the config omits one.
pub const DEFAULT_GPUS: u32 = 1;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// An opaque credential. Redacted in `Debug` output so it never reaches
/// logs through a formatted config.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value. Call sites must not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// Validated description of one inference run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Identifier the engine resolves to load weights and tokenizer.
    pub model_name: String,
    /// Devices to shard the model across.
    #[serde(default = "default_gpus")]
    pub gpus: u32,
    /// Newline-delimited JSON record file of prompts.
    pub input_path: PathBuf,
    /// Root directory for run output; created during validation.
    pub output_path: PathBuf,
    /// Model-access credential. Never logged or persisted by the harness.
    pub hf_token: Secret,
    /// Generation parameters; single deterministic-length sample if absent.
    #[serde(default)]
    pub sampling_params: SamplingPlan,
}

fn default_gpus() -> u32 {
    DEFAULT_GPUS
}

/// Command-line overrides applied on top of a loaded config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub temperature: Option<f64>,
    pub max_new_tokens: Option<u32>,
    pub n: Option<u32>,
    pub gpus: Option<u32>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.max_new_tokens.is_none()
            && self.n.is_none()
            && self.gpus.is_none()
    }
}

impl RunConfig {
    /// Load and validate a configuration from a TOML file.
    ///
    /// Side effect: creates the output directory tree if absent. Creation
    /// is idempotent; an existing directory is not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.finalize()?;
        Ok(config)
    }

    /// Produce a new validated config with the given overrides applied.
    ///
    /// `self` is left untouched; override values pass through the same
    /// rules as an initial load.
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        if let Some(t) = overrides.temperature {
            config.sampling_params.temperature = Temperature::Scalar(t);
        }
        if let Some(m) = overrides.max_new_tokens {
            config.sampling_params.max_new_tokens = m;
        }
        if let Some(n) = overrides.n {
            config.sampling_params.n = n;
        }
        if let Some(g) = overrides.gpus {
            config.gpus = g;
        }
        config.finalize()?;
        Ok(config)
    }

    /// Validate field invariants and create the output directory.
    fn finalize(&self) -> Result<(), ConfigError> {
        self.validate()?;
        fs::create_dir_all(&self.output_path).map_err(|source| ConfigError::OutputDir {
            path: self.output_path.clone(),
            source,
        })?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::Invalid("model_name must be non-empty".into()));
        }
        if self.gpus == 0 {
            return Err(ConfigError::Invalid("gpus must be >= 1".into()));
        }
        if self.hf_token.is_empty() {
            return Err(ConfigError::Invalid("hf_token must be non-empty".into()));
        }
        let plan = &self.sampling_params;
        match &plan.temperature {
            Temperature::Scalar(t) => {
                if *t < 0.0 {
                    return Err(ConfigError::Invalid("temperature must be >= 0".into()));
                }
            }
            Temperature::List(values) => {
                if values.is_empty() {
                    return Err(ConfigError::Invalid(
                        "temperature list must be non-empty".into(),
                    ));
                }
                if values.iter().any(|t| *t < 0.0) {
                    return Err(ConfigError::Invalid(
                        "temperature values must be >= 0".into(),
                    ));
                }
                if values.len() > 1 {
                    warn!(
                        ignored = values.len() - 1,
                        "temperature list given; only the first value drives generation"
                    );
                }
            }
        }
        if plan.n == 0 {
            return Err(ConfigError::Invalid("n must be >= 1".into()));
        }
        if plan.max_new_tokens == 0 {
            return Err(ConfigError::Invalid("max_new_tokens must be >= 1".into()));
        }
        Ok(())
    }
}
