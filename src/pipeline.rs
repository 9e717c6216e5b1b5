//! End-to-end orchestration of one batch-generation run.
//!
//! Stage ordering is fixed: validate config → load prompts → load model →
//! generate → write. Prompts load before the model so a bad input file
//! never wastes a costly model load. A run is all-or-nothing; any failure
//! aborts with nothing published under a run directory.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, RunConfig};
use crate::driver::InferenceDriver;
use crate::engine::{ChatMlTemplate, EngineError, EngineOptions, GgufEngine, TextGenerator};
use crate::prompts::{load_prompts, PromptError, PromptRecord};
use crate::writer::{ResultWriter, WriteError};

/// Any failure of one run, mapped to a human-readable message at the
/// command surface. Nothing here is retried; re-running the command is
/// the retry.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Prompts(#[from] PromptError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Run one batch against the built-in GGUF backend.
///
/// `model_path` points at local weights; absent, `model_name` is used as
/// the path.
pub fn run(config: &RunConfig, model_path: Option<PathBuf>) -> Result<PathBuf, RunError> {
    let prompts = load_stage(config)?;
    let mut options = EngineOptions::from_config(config);
    options.model_path = model_path;
    info!(model = %config.model_name, gpus = config.gpus, "loading model");
    let engine = GgufEngine::load(&options)?;
    execute(config, &prompts, engine)
}

/// Run one batch against any engine. The engine is constructed by the
/// caller; prompts are still loaded before it is touched.
pub fn run_with_engine<E: TextGenerator>(
    config: &RunConfig,
    engine: E,
) -> Result<PathBuf, RunError> {
    let prompts = load_stage(config)?;
    execute(config, &prompts, engine)
}

fn load_stage(config: &RunConfig) -> Result<Vec<PromptRecord>, RunError> {
    log_effective(config);
    let prompts = load_prompts(&config.input_path)?;
    info!(
        count = prompts.len(),
        path = %config.input_path.display(),
        "loaded question pairs"
    );
    Ok(prompts)
}

fn execute<E: TextGenerator>(
    config: &RunConfig,
    prompts: &[PromptRecord],
    engine: E,
) -> Result<PathBuf, RunError> {
    let request = config.sampling_params.resolve();
    let driver = InferenceDriver::new(engine, ChatMlTemplate::new());
    let results = driver.run(prompts, &request)?;
    let writer = ResultWriter::new(config);
    let path = writer.write(&results)?;
    info!(path = %path.display(), "inference run complete");
    Ok(path)
}

/// Log the run's effective settings. The credential never appears here.
fn log_effective(config: &RunConfig) {
    let request = config.sampling_params.resolve();
    info!(
        model = %config.model_name,
        gpus = config.gpus,
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        temperature = request.temperature,
        n = request.samples_per_prompt,
        max_new_tokens = request.max_new_tokens,
        "starting inference run"
    );
}
