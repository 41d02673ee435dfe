use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MedicError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicConfig {
    pub encoder: EncoderConfig,
    pub classifier: ClassifierConfig,
    pub policy: PolicyConfig,
    pub evaluator: EvaluatorConfig,
    pub simulator: SimulatorConfig,
}

impl MedicConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| MedicError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values for consistency and safety.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.encoder.retry_cap == 0 {
            errors.push("encoder.retry_cap must be greater than 0");
        }
        if self.encoder.time_cap_secs == 0 {
            errors.push("encoder.time_cap_secs must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.classifier.generic_confidence) {
            errors.push("classifier.generic_confidence must be between 0.0 and 1.0");
        }
        if self.classifier.message_cap == 0 {
            errors.push("classifier.message_cap must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.classifier.visual_threshold) {
            errors.push("classifier.visual_threshold must be between 0.0 and 1.0");
        }
        let visual_weight_sum =
            self.classifier.visual_region_weight + self.classifier.visual_text_weight;
        if !(0.0..=1.0).contains(&visual_weight_sum) {
            errors.push("classifier visual weights must sum to at most 1.0");
        }

        if self.policy.fallback_limit == 0 {
            errors.push("policy.fallback_limit must be greater than 0");
        }
        // The policy denormalizes retry counts out of the state vector, so
        // its cap has to match the encoder's.
        if self.policy.retry_cap != self.encoder.retry_cap {
            errors.push("policy.retry_cap must equal encoder.retry_cap");
        }

        if self.simulator.max_steps == 0 {
            errors.push("simulator.max_steps must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MedicError::Config(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Retry count at which the normalized retry feature saturates.
    pub retry_cap: u32,
    /// Elapsed seconds at which the normalized time feature saturates.
    pub time_cap_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            retry_cap: 5,
            time_cap_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Fixed confidence for the generic-keyword fallback classification.
    pub generic_confidence: f64,
    /// Byte cap for messages built from raw log lines.
    pub message_cap: usize,
    pub visual_region_weight: f64,
    pub visual_text_weight: f64,
    /// Visual confidence at or below which the result is discarded.
    pub visual_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            generic_confidence: 0.3,
            message_cap: 100,
            visual_region_weight: 0.4,
            visual_text_weight: 0.6,
            visual_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Retry count past which every retryable decision becomes an abort.
    pub abort_threshold: u32,
    /// Deployment errors stop retrying at this count.
    pub deployment_retry_limit: u32,
    /// Unknown errors stop retrying at this count.
    pub unknown_retry_limit: u32,
    pub fallback_limit: usize,
    /// Must match `encoder.retry_cap`; used to denormalize retry counts
    /// read back out of a state vector.
    pub retry_cap: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            abort_threshold: 3,
            deployment_retry_limit: 2,
            unknown_retry_limit: 1,
            fallback_limit: 3,
            retry_cap: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub success_reward: f64,
    pub partial_reward: f64,
    pub failure_reward: f64,
    pub appropriate_bonus: f64,
    pub inappropriate_penalty: f64,
    /// Extra penalty for plain retries past the threshold.
    pub retry_loop_penalty: f64,
    pub retry_penalty_threshold: u32,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            success_reward: 1.0,
            partial_reward: 0.5,
            failure_reward: -0.5,
            appropriate_bonus: 0.2,
            inappropriate_penalty: 0.3,
            retry_loop_penalty: 0.4,
            retry_penalty_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub max_steps: u32,
    /// Seconds added to `time_since_error` after every step.
    pub time_increment_secs: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_steps: 5,
            time_increment_secs: 30,
        }
    }
}
