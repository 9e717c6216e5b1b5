//! Engine error types.

use thiserror::Error;

/// Errors surfaced by the generation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine or tokenizer failed to initialize: bad identifier, rejected
    /// credential, insufficient devices. Raised before any output I/O.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// The batched generation call failed. Fatal for the whole batch;
    /// there is no partial-results mode.
    #[error("generation failed: {0}")]
    Generation(String),
}
