//! Result persistence into a run-unique output directory.
//!
//! Directory names combine model slug, sampling settings, and a
//! second-resolution timestamp: `{model_slug}_temp{T}[_n{N}]_{timestamp}`.
//! Two runs against the same settings collide only when started within the
//! same second — an accepted limitation, not a uniqueness guarantee.
//!
//! Every file is published atomically: serialized to a temp file in the
//! run directory, then persisted to its final name. A failed write never
//! leaves a truncated file behind at the final path.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::RunConfig;
use crate::driver::GenerationResult;

/// Second-resolution timestamp suffix for run directories.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Errors raised while persisting results.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create run directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize results for {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to publish results file {path}: {source}")]
    Publish {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Shape of one persisted entry.
#[derive(Serialize)]
struct ResponseEntry<'a> {
    gen_response: &'a str,
}

/// Writes one run's results beneath the configured output root.
pub struct ResultWriter {
    run_dir: PathBuf,
    samples: u32,
}

impl ResultWriter {
    /// Writer for a run starting now.
    pub fn new(config: &RunConfig) -> Self {
        Self::with_timestamp(config, Local::now())
    }

    /// Writer with an explicit start time. Lets tests pin directory names;
    /// production callers use [`ResultWriter::new`].
    pub fn with_timestamp(config: &RunConfig, timestamp: DateTime<Local>) -> Self {
        let request = config.sampling_params.resolve();
        let mut name = format!(
            "{}_temp{}",
            model_slug(&config.model_name),
            request.temperature
        );
        if request.samples_per_prompt > 1 {
            name.push_str(&format!("_n{}", request.samples_per_prompt));
        }
        name.push_str(&format!("_{}", timestamp.format(TIMESTAMP_FORMAT)));
        Self {
            run_dir: config.output_path.join(name),
            samples: request.samples_per_prompt,
        }
    }

    /// The run directory this writer publishes into.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Persist all results; returns the run directory path.
    ///
    /// One `results.json` for single-sample runs; `results_{i}.json` per
    /// sample index otherwise. Each file holds every prompt's response for
    /// that sample index, in prompt order.
    pub fn write(&self, results: &[GenerationResult]) -> Result<PathBuf, WriteError> {
        fs::create_dir_all(&self.run_dir).map_err(|source| WriteError::CreateDir {
            path: self.run_dir.clone(),
            source,
        })?;

        for sample in 0..self.samples as usize {
            let mut entries: Vec<&GenerationResult> = results
                .iter()
                .filter(|r| r.sample_index == sample)
                .collect();
            entries.sort_by_key(|r| r.prompt_index);
            let responses: Vec<ResponseEntry<'_>> = entries
                .iter()
                .map(|r| ResponseEntry {
                    gen_response: &r.text,
                })
                .collect();

            let file_name = if self.samples == 1 {
                "results.json".to_string()
            } else {
                format!("results_{sample}.json")
            };
            self.publish(&self.run_dir.join(file_name), &responses)?;
        }

        info!(path = %self.run_dir.display(), files = self.samples, "results written");
        Ok(self.run_dir.clone())
    }

    /// Serialize to a temp file in the run directory, then atomically
    /// persist to the final name.
    fn publish(&self, path: &Path, responses: &[ResponseEntry<'_>]) -> Result<(), WriteError> {
        let mut temp =
            tempfile::NamedTempFile::new_in(&self.run_dir).map_err(|source| {
                WriteError::Publish {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        serde_json::to_writer_pretty(&mut temp, responses).map_err(|source| {
            WriteError::Serialize {
                path: path.to_path_buf(),
                source,
            }
        })?;
        temp.persist(path).map_err(|e| WriteError::Publish {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }
}

/// Filesystem-safe transform of a model identifier: lowercased, path
/// separators replaced.
fn model_slug(model_name: &str) -> String {
    model_name.to_lowercase().replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lowercases_and_replaces_separators() {
        assert_eq!(model_slug("Qwen/Qwen3-8B"), "qwen_qwen3-8b");
        assert_eq!(model_slug("plain-model"), "plain-model");
    }
}
