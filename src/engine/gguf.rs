//! llama-cpp-2 backend for GGUF models.
//!
//! Compiled in behind the `gguf` cargo feature. Without the feature the
//! type still exists so callers compile, but loading reports that no
//! backend is available.

use super::{EngineError, EngineOptions, TextGenerator};
use crate::sampling::EngineRequest;

/// Text-generation engine backed by llama-cpp-2.
///
/// Owns the loaded model for the lifetime of one run; device resources are
/// released when the engine is dropped, including on failure paths.
pub struct GgufEngine {
    #[cfg(feature = "gguf")]
    inner: backend::LlamaEngineInner,
}

#[cfg(feature = "gguf")]
impl GgufEngine {
    /// Load model weights from `options.weights_path()`.
    pub fn load(options: &EngineOptions) -> Result<Self, EngineError> {
        Ok(Self {
            inner: backend::LlamaEngineInner::load(options)?,
        })
    }
}

#[cfg(not(feature = "gguf"))]
impl GgufEngine {
    pub fn load(options: &EngineOptions) -> Result<Self, EngineError> {
        Err(EngineError::ModelLoad(format!(
            "cannot load {}: built without the `gguf` feature, no generation backend available",
            options.model_name
        )))
    }
}

#[cfg(feature = "gguf")]
impl TextGenerator for GgufEngine {
    fn generate(
        &self,
        prompts: &[String],
        request: &EngineRequest,
    ) -> Result<Vec<Vec<String>>, EngineError> {
        self.inner.generate_batch(prompts, request)
    }
}

#[cfg(not(feature = "gguf"))]
impl TextGenerator for GgufEngine {
    fn generate(
        &self,
        _prompts: &[String],
        _request: &EngineRequest,
    ) -> Result<Vec<Vec<String>>, EngineError> {
        Err(EngineError::Generation(
            "no generation backend compiled in".into(),
        ))
    }
}

#[cfg(feature = "gguf")]
mod backend {
    use std::num::NonZeroU32;

    use llama_cpp_2::context::params::LlamaContextParams;
    use llama_cpp_2::context::LlamaContext;
    use llama_cpp_2::llama_backend::LlamaBackend;
    use llama_cpp_2::llama_batch::LlamaBatch;
    use llama_cpp_2::model::params::LlamaModelParams;
    use llama_cpp_2::model::{AddBos, LlamaModel};
    use llama_cpp_2::sampling::LlamaSampler;
    use llama_cpp_2::token::LlamaToken;

    use super::super::{EngineError, EngineOptions};
    use crate::sampling::EngineRequest;

    /// Base RNG seed; sample `s` of a prompt uses `SAMPLE_SEED_BASE + s`
    /// so multi-sample fan-out yields independent variants.
    const SAMPLE_SEED_BASE: u32 = 42;

    pub(super) struct LlamaEngineInner {
        backend: LlamaBackend,
        model: LlamaModel,
        n_ctx: u32,
        n_threads: i32,
    }

    // SAFETY: LlamaModel and LlamaBackend are Send+Sync in llama-cpp-2.
    unsafe impl Send for LlamaEngineInner {}
    unsafe impl Sync for LlamaEngineInner {}

    impl LlamaEngineInner {
        pub(super) fn load(options: &EngineOptions) -> Result<Self, EngineError> {
            apply_process_env(options);
            let backend = LlamaBackend::init()
                .map_err(|e| EngineError::ModelLoad(format!("backend init: {e}")))?;
            let path = options.weights_path();
            let model_params =
                LlamaModelParams::default().with_n_gpu_layers(gpu_layers(options.gpus));
            let model = LlamaModel::load_from_file(&backend, &path, &model_params)
                .map_err(|e| EngineError::ModelLoad(format!("{}: {e}", path.display())))?;
            Ok(Self {
                backend,
                model,
                n_ctx: options.context_tokens,
                n_threads: resolve_threads(),
            })
        }

        /// Generate all samples for all prompts in one pass.
        pub(super) fn generate_batch(
            &self,
            prompts: &[String],
            request: &EngineRequest,
        ) -> Result<Vec<Vec<String>>, EngineError> {
            let mut rows = Vec::with_capacity(prompts.len());
            for text in prompts {
                let tokens = self.tokenize(text)?;
                let mut samples = Vec::with_capacity(request.samples_per_prompt as usize);
                for s in 0..request.samples_per_prompt {
                    let out = self.sample_once(&tokens, request, SAMPLE_SEED_BASE + s)?;
                    samples.push(self.detokenize(&out)?);
                }
                rows.push(samples);
            }
            Ok(rows)
        }

        fn sample_once(
            &self,
            tokens: &[LlamaToken],
            request: &EngineRequest,
            seed: u32,
        ) -> Result<Vec<LlamaToken>, EngineError> {
            let mut ctx = self.create_context()?;
            let mut batch = LlamaBatch::new(tokens.len(), 1);
            add_seq(&mut batch, tokens)?;
            decode(&mut ctx, &mut batch)?;
            let mut sampler = build_sampler(request, seed);
            sampler.accept_many(tokens.iter().copied());
            let mut out = Vec::new();
            let mut pos = tokens.len() as i32;
            for _ in 0..request.max_new_tokens {
                // Sample from the last token that had logits computed
                let tok = sampler.sample(&ctx, -1);
                sampler.accept(tok);
                if self.model.is_eog_token(tok) {
                    break;
                }
                out.push(tok);
                batch.clear();
                add_one(&mut batch, tok, pos)?;
                decode(&mut ctx, &mut batch)?;
                pos += 1;
            }
            Ok(out)
        }

        fn tokenize(&self, text: &str) -> Result<Vec<LlamaToken>, EngineError> {
            self.model
                .str_to_token(text, AddBos::Always)
                .map_err(|e| EngineError::Generation(format!("tokenize: {e}")))
        }

        fn detokenize(&self, tokens: &[LlamaToken]) -> Result<String, EngineError> {
            let mut dec = encoding_rs::UTF_8.new_decoder();
            let mut out = String::new();
            for &t in tokens {
                let piece = self
                    .model
                    .token_to_piece(t, &mut dec, false, None)
                    .map_err(|e| EngineError::Generation(format!("detokenize: {e}")))?;
                out.push_str(&piece);
            }
            Ok(out)
        }

        fn create_context(&self) -> Result<LlamaContext<'_>, EngineError> {
            let p = LlamaContextParams::default()
                .with_n_ctx(NonZeroU32::new(self.n_ctx))
                .with_n_threads(self.n_threads)
                .with_n_threads_batch(self.n_threads);
            self.model
                .new_context(&self.backend, p)
                .map_err(|e| EngineError::Generation(format!("context: {e}")))
        }
    }

    /// The single point where credential and cache location reach process
    /// environment; hub-style loaders read only env. Called once, at
    /// engine construction.
    fn apply_process_env(options: &EngineOptions) {
        if let Some(dir) = &options.cache_dir {
            std::env::set_var("HF_HOME", dir);
        }
        if !options.hf_token.is_empty() {
            std::env::set_var("HF_TOKEN", options.hf_token.expose());
        }
    }

    /// Offload all layers whenever devices are available; llama.cpp splits
    /// them across the visible device set.
    fn gpu_layers(gpus: u32) -> u32 {
        if gpus == 0 {
            0
        } else {
            1_000_000
        }
    }

    fn resolve_threads() -> i32 {
        // Memory-bound workload; cap to avoid diminishing returns on
        // high-core systems.
        let optimal = num_cpus::get().max(1).min(16);
        i32::try_from(optimal).unwrap_or(4)
    }

    fn add_seq(batch: &mut LlamaBatch, tokens: &[LlamaToken]) -> Result<(), EngineError> {
        // Only the last token needs logits; that is where sampling starts.
        let n = tokens.len();
        for (i, &tok) in tokens.iter().enumerate() {
            let logits = i + 1 == n;
            batch
                .add(tok, i as i32, &[0], logits)
                .map_err(|e| EngineError::Generation(format!("batch: {e}")))?;
        }
        Ok(())
    }

    fn add_one(batch: &mut LlamaBatch, tok: LlamaToken, pos: i32) -> Result<(), EngineError> {
        batch
            .add(tok, pos, &[0], true)
            .map_err(|e| EngineError::Generation(format!("batch: {e}")))
    }

    fn decode(ctx: &mut LlamaContext<'_>, batch: &mut LlamaBatch) -> Result<(), EngineError> {
        ctx.decode(batch)
            .map_err(|e| EngineError::Generation(format!("decode: {e}")))
    }

    fn build_sampler(request: &EngineRequest, seed: u32) -> LlamaSampler {
        if request.temperature == 0.0 {
            return LlamaSampler::greedy();
        }
        LlamaSampler::chain_simple(vec![
            LlamaSampler::temp(request.temperature as f32),
            LlamaSampler::dist(seed),
        ])
    }
}
