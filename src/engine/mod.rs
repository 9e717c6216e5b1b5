//! Generation engine collaborators.
//!
//! The harness drives an opaque engine through the [`TextGenerator`] trait
//! and renders conversations into engine-ready text through [`ChatTemplate`].
//! A concrete llama-cpp-2 backend ships behind the `gguf` cargo feature.

pub mod error;
pub mod gguf;
pub mod template;

use std::path::PathBuf;

use crate::config::{RunConfig, Secret};
use crate::sampling::EngineRequest;

pub use error::EngineError;
pub use gguf::GgufEngine;
pub use template::{ChatMlTemplate, ChatTemplate};

/// Default model cache directory for hub-style loaders.
pub const DEFAULT_CACHE_DIR: &str = "workspace/models";

/// Default context window when the backend is not told otherwise.
pub const DEFAULT_CONTEXT_TOKENS: u32 = 4096;

/// A batched text-generation engine.
///
/// One call covers the whole run: `prompts.len()` rendered prompt strings
/// in, one row of `request.samples_per_prompt` completions per prompt out,
/// in prompt order. Implementations batch internally; the orchestration
/// layer never serializes per-prompt calls around this trait.
pub trait TextGenerator {
    fn generate(
        &self,
        prompts: &[String],
        request: &EngineRequest,
    ) -> Result<Vec<Vec<String>>, EngineError>;
}

/// Everything an engine backend needs at construction time.
///
/// Credential and cache location travel here as explicit fields. Backends
/// that can only read environment-style configuration apply them exactly
/// once, at construction — never scattered across entry points.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Identifier used for run naming and hub resolution.
    pub model_name: String,
    /// Local weights path override; `model_name` is used as a path if absent.
    pub model_path: Option<PathBuf>,
    /// Devices to shard the model across.
    pub gpus: u32,
    /// Context window the backend allocates (prompt + generated tokens).
    pub context_tokens: u32,
    /// Model-access credential.
    pub hf_token: Secret,
    /// Cache directory for downloaded weights, if the loader uses one.
    pub cache_dir: Option<PathBuf>,
}

impl EngineOptions {
    /// Build engine options from a validated run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            model_name: config.model_name.clone(),
            model_path: None,
            gpus: config.gpus,
            context_tokens: DEFAULT_CONTEXT_TOKENS,
            hf_token: config.hf_token.clone(),
            cache_dir: Some(PathBuf::from(DEFAULT_CACHE_DIR)),
        }
    }

    /// Path the backend loads weights from.
    pub fn weights_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.model_name))
    }
}
