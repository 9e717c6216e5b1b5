//! Inference driver: turns prompt records into generation results.
//!
//! Owns the engine handle for the lifetime of one run. Formats every
//! record through the chat-template collaborator, issues exactly one
//! batched generation call, and maps the engine's rows back onto stable
//! `(prompt_index, sample_index)` coordinates.

use tracing::info;

use crate::engine::{ChatTemplate, EngineError, TextGenerator};
use crate::prompts::PromptRecord;
use crate::sampling::EngineRequest;

/// One generated completion, addressed by its position in the input batch
/// and its position among the samples requested for that prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Position in the original input batch (0-based, defines output order).
    pub prompt_index: usize,
    /// Position among the sample variants for this prompt (0-based).
    pub sample_index: usize,
    /// The generated completion.
    pub text: String,
}

/// Drives one batched generation run against an engine.
pub struct InferenceDriver<E, T> {
    engine: E,
    template: T,
}

impl<E: TextGenerator, T: ChatTemplate> InferenceDriver<E, T> {
    /// Extended-reasoning framing is off for every prompt this harness
    /// renders; voice evaluation wants the answer, not the deliberation.
    /// Fixed for the whole system, not configurable per run.
    pub const REASONING_ENABLED: bool = false;

    /// Every rendered prompt ends with an opened assistant turn.
    pub const ADD_GENERATION_PROMPT: bool = true;

    pub fn new(engine: E, template: T) -> Self {
        Self { engine, template }
    }

    /// Run the whole batch: exactly one engine call, results in prompt
    /// order with `sample_index` in the order the engine produced them.
    pub fn run(
        &self,
        prompts: &[PromptRecord],
        request: &EngineRequest,
    ) -> Result<Vec<GenerationResult>, EngineError> {
        let texts: Vec<String> = prompts
            .iter()
            .map(|record| {
                self.template.format(
                    &record.messages,
                    Self::ADD_GENERATION_PROMPT,
                    Self::REASONING_ENABLED,
                )
            })
            .collect();

        info!(
            prompts = texts.len(),
            samples_per_prompt = request.samples_per_prompt,
            "dispatching batched generation"
        );
        let rows = self.engine.generate(&texts, request)?;

        if rows.len() != prompts.len() {
            return Err(EngineError::Generation(format!(
                "engine returned {} rows for {} prompts",
                rows.len(),
                prompts.len()
            )));
        }

        let samples = request.samples_per_prompt as usize;
        let mut results = Vec::with_capacity(prompts.len() * samples);
        for (prompt_index, row) in rows.into_iter().enumerate() {
            if row.len() != samples {
                return Err(EngineError::Generation(format!(
                    "engine returned {} samples for prompt {prompt_index}, expected {samples}",
                    row.len()
                )));
            }
            for (sample_index, text) in row.into_iter().enumerate() {
                results.push(GenerationResult {
                    prompt_index,
                    sample_index,
                    text,
                });
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChatMlTemplate;
    use crate::prompts::{ChatMessage, ChatRole};
    use std::cell::Cell;

    struct EchoEngine {
        calls: Cell<usize>,
    }

    impl TextGenerator for EchoEngine {
        fn generate(
            &self,
            prompts: &[String],
            request: &EngineRequest,
        ) -> Result<Vec<Vec<String>>, EngineError> {
            self.calls.set(self.calls.get() + 1);
            Ok(prompts
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    (0..request.samples_per_prompt)
                        .map(|s| format!("p{i}s{s}"))
                        .collect()
                })
                .collect())
        }
    }

    struct ShortRowEngine;

    impl TextGenerator for ShortRowEngine {
        fn generate(
            &self,
            prompts: &[String],
            _request: &EngineRequest,
        ) -> Result<Vec<Vec<String>>, EngineError> {
            Ok(prompts.iter().map(|_| vec![]).collect())
        }
    }

    fn records(count: usize) -> Vec<PromptRecord> {
        (0..count)
            .map(|i| PromptRecord {
                messages: vec![ChatMessage {
                    role: ChatRole::User,
                    content: format!("question {i}"),
                }],
            })
            .collect()
    }

    fn request(samples: u32) -> EngineRequest {
        EngineRequest {
            temperature: 0.7,
            max_new_tokens: 16,
            samples_per_prompt: samples,
        }
    }

    #[test]
    fn one_engine_call_covers_the_whole_batch() {
        let engine = EchoEngine { calls: Cell::new(0) };
        let driver = InferenceDriver::new(engine, ChatMlTemplate::new());
        let results = driver.run(&records(3), &request(2)).unwrap();
        assert_eq!(driver.engine.calls.get(), 1);
        assert_eq!(results.len(), 6);
    }

    #[test]
    fn indices_are_stable_and_unique() {
        let engine = EchoEngine { calls: Cell::new(0) };
        let driver = InferenceDriver::new(engine, ChatMlTemplate::new());
        let results = driver.run(&records(2), &request(3)).unwrap();
        let mut pairs: Vec<(usize, usize)> = results
            .iter()
            .map(|r| (r.prompt_index, r.sample_index))
            .collect();
        pairs.dedup();
        assert_eq!(pairs.len(), 6);
        assert_eq!(results[0].text, "p0s0");
        assert_eq!(results[5].text, "p1s2");
    }

    #[test]
    fn wrong_sample_count_is_a_generation_failure() {
        let driver = InferenceDriver::new(ShortRowEngine, ChatMlTemplate::new());
        assert!(matches!(
            driver.run(&records(1), &request(2)),
            Err(EngineError::Generation(_))
        ));
    }
}
