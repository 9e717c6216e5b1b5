//! Sampling parameters and their resolution into engine-facing requests.
//!
//! A [`SamplingPlan`] is validated once, at configuration-load time.
//! Nothing downstream re-validates or re-interprets sampling values;
//! [`SamplingPlan::resolve`] is a pure projection onto the engine's shape.

use serde::{Deserialize, Serialize};

/// Default sampling temperature when the config omits one.
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

/// Default number of samples per prompt.
pub const DEFAULT_SAMPLES: u32 = 1;

/// Default upper bound on generated tokens per sample.
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 2048;

/// Sampling temperature, as written in the configuration file.
///
/// A list is accepted for forward compatibility with temperature sweeps,
/// but only its first element drives generation; the rest are ignored
/// with a logged warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Temperature {
    Scalar(f64),
    List(Vec<f64>),
}

impl Default for Temperature {
    fn default() -> Self {
        Self::Scalar(DEFAULT_TEMPERATURE)
    }
}

/// Generation parameters for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPlan {
    /// Sampling temperature (0.0 = deterministic).
    pub temperature: Temperature,
    /// Independent generations per prompt.
    pub n: u32,
    /// Upper bound on generated tokens per sample.
    pub max_new_tokens: u32,
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self {
            temperature: Temperature::default(),
            n: DEFAULT_SAMPLES,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }
}

/// Engine-facing generation parameters, resolved from a [`SamplingPlan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineRequest {
    pub temperature: f64,
    pub max_new_tokens: u32,
    /// Completions the engine must return per prompt, in one batched call.
    pub samples_per_prompt: u32,
}

impl SamplingPlan {
    /// Resolve this plan into the concrete request sent to the engine.
    ///
    /// Expects a plan that already passed configuration validation. A list
    /// temperature resolves to its first element; extra elements are not
    /// swept over in this release.
    pub fn resolve(&self) -> EngineRequest {
        let temperature = match &self.temperature {
            Temperature::Scalar(t) => *t,
            Temperature::List(values) => {
                values.first().copied().unwrap_or(DEFAULT_TEMPERATURE)
            }
        };
        EngineRequest {
            temperature,
            max_new_tokens: self.max_new_tokens,
            samples_per_prompt: self.n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_is_single_deterministic_sample() {
        let plan = SamplingPlan::default();
        assert_eq!(plan.temperature, Temperature::Scalar(1.0));
        assert_eq!(plan.n, 1);
        assert_eq!(plan.max_new_tokens, 2048);
    }

    #[test]
    fn scalar_temperature_passes_through() {
        let plan = SamplingPlan {
            temperature: Temperature::Scalar(0.7),
            n: 2,
            max_new_tokens: 16,
        };
        let request = plan.resolve();
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.samples_per_prompt, 2);
        assert_eq!(request.max_new_tokens, 16);
    }

    #[test]
    fn list_temperature_resolves_to_first_element() {
        let plan = SamplingPlan {
            temperature: Temperature::List(vec![0.3, 0.9, 1.5]),
            ..SamplingPlan::default()
        };
        assert_eq!(plan.resolve().temperature, 0.3);
    }

    #[test]
    fn temperature_deserializes_from_scalar_and_list() {
        let scalar: SamplingPlan = toml::from_str("temperature = 0.5").unwrap();
        assert_eq!(scalar.temperature, Temperature::Scalar(0.5));

        let list: SamplingPlan = toml::from_str("temperature = [0.5, 1.0]").unwrap();
        assert_eq!(list.temperature, Temperature::List(vec![0.5, 1.0]));
    }

    #[test]
    fn integer_temperature_deserializes_as_scalar() {
        let plan: SamplingPlan = toml::from_str("temperature = 1").unwrap();
        assert_eq!(plan.temperature, Temperature::Scalar(1.0));
    }
}
