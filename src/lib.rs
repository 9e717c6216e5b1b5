//! voice-bench — offline batch inference harness.
//!
//! Given a configuration describing a model, an input file of
//! conversational prompts, and sampling parameters, produce one or more
//! generated responses per prompt and persist them to a run-unique output
//! layout. Built for evaluating a model's stylistic output ("voice") over
//! a fixed prompt set, not for interactive serving.
//!
//! # Pipeline
//!
//! validate config → load prompts → load model → generate → write
//!
//! One synchronous, batched engine call per run; no partial results, no
//! retries inside the core. The generation engine and chat template are
//! collaborators behind [`engine::TextGenerator`] and
//! [`engine::ChatTemplate`]; a llama-cpp-2 GGUF backend ships behind the
//! `gguf` cargo feature.

pub mod config;
pub mod driver;
pub mod engine;
pub mod logging;
pub mod pipeline;
pub mod prompts;
pub mod sampling;
pub mod writer;

pub use config::{ConfigError, ConfigOverrides, RunConfig, Secret};
pub use driver::{GenerationResult, InferenceDriver};
pub use engine::{
    ChatMlTemplate, ChatTemplate, EngineError, EngineOptions, GgufEngine, TextGenerator,
};
pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use pipeline::{run, run_with_engine, RunError};
pub use prompts::{load_prompts, ChatMessage, ChatRole, PromptError, PromptRecord};
pub use sampling::{EngineRequest, SamplingPlan, Temperature};
pub use writer::{ResultWriter, WriteError};
