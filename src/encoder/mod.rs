//! Deterministic encoding of an error signature plus context into a
//! fixed-length state vector.
//!
//! The vector is laid out as contiguous, non-overlapping segments so every
//! feature keeps a fixed meaning across calls:
//!
//! ```text
//! [ 0.. 6)  one-hot error kind
//! [ 6]      classifier confidence
//! [ 7]      normalized retry count        min(retry / retry_cap, 1)
//! [ 8]      normalized elapsed time       min(secs / time_cap_secs, 1)
//! [ 9]      platform priority scalar
//! [10..18)  keyword bag over the message
//! [18]      historical success ratio
//! [19]      historical failure ratio
//! [20]      most-common past action bucket
//! [21..25)  additional context (project bucket, build cmd, deps, prod flag)
//! [25..64)  reserved, zero
//! ```
//!
//! Encoding is pure: identical inputs always produce identical vectors.

use tracing::warn;

use crate::config::EncoderConfig;
use crate::error::{MedicError, Result};
use crate::signature::{ErrorSignature, RecoveryContext};

/// Fixed width of every state vector.
pub const STATE_DIM: usize = 64;

pub type StateVector = [f32; STATE_DIM];

const TYPE_REGION: usize = 0;
const CONFIDENCE_SLOT: usize = 6;
const RETRY_SLOT: usize = 7;
const ELAPSED_SLOT: usize = 8;
const PLATFORM_SLOT: usize = 9;
const KEYWORD_REGION: usize = 10;
const SUCCESS_RATIO_SLOT: usize = 18;
const FAILURE_RATIO_SLOT: usize = 19;
const COMMON_ACTION_SLOT: usize = 20;
const ADDITIONAL_REGION: usize = 21;

/// Keyword bag over the signature message, in fixed slot order.
const MESSAGE_KEYWORDS: [&str; 8] = [
    "timeout", "memory", "network", "auth", "build", "deploy", "error", "failed",
];

/// Known platforms and their fixed priority scalar. Unknown platforms
/// encode as 0.
const PLATFORM_PRIORITIES: [(&str, f32); 6] = [
    ("vercel", 1.0),
    ("render", 0.8),
    ("netlify", 0.6),
    ("github", 0.5),
    ("docker", 0.4),
    ("local", 0.2),
];

/// Stable string-to-bucket feature: FNV-1a over UTF-8 bytes, mod 1000,
/// scaled to [0, 1). Portable replacement for runtime-dependent hashing.
pub fn stable_bucket(s: &str) -> f32 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash % 1000) as f32 / 1000.0
}

pub struct StateEncoder {
    config: EncoderConfig,
}

impl StateEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Encode a signature and context into a state vector.
    ///
    /// Fails with [`MedicError::Encoding`] when the signature carries a
    /// non-finite confidence; all other missing context encodes as zero.
    pub fn encode(
        &self,
        signature: &ErrorSignature,
        context: &RecoveryContext,
    ) -> Result<StateVector> {
        if !signature.confidence.is_finite() {
            return Err(MedicError::Encoding(format!(
                "non-finite confidence for {} signature",
                signature.kind
            )));
        }

        let mut state = [0.0f32; STATE_DIM];

        state[TYPE_REGION + signature.kind.slot()] = 1.0;
        state[CONFIDENCE_SLOT] = signature.confidence.clamp(0.0, 1.0) as f32;
        state[RETRY_SLOT] =
            (context.retry_count as f32 / self.config.retry_cap as f32).min(1.0);
        state[ELAPSED_SLOT] = (context.time_since_error_secs as f32
            / self.config.time_cap_secs as f32)
            .min(1.0);
        state[PLATFORM_SLOT] = platform_priority(context.platform.as_deref());

        let message = signature.message.to_lowercase();
        for (i, keyword) in MESSAGE_KEYWORDS.iter().enumerate() {
            if message.contains(keyword) {
                state[KEYWORD_REGION + i] = 1.0;
            }
        }

        state[SUCCESS_RATIO_SLOT] = context.success_ratio() as f32;
        state[FAILURE_RATIO_SLOT] = context.failure_ratio() as f32;
        if let Some(action) = most_common_action(context) {
            state[COMMON_ACTION_SLOT] = stable_bucket(action);
        }

        self.encode_additional(context, &mut state);

        Ok(state)
    }

    /// Degraded-mode encoding: on failure, log and fall back to the zero
    /// vector instead of crashing the decision pipeline.
    pub fn encode_or_zero(
        &self,
        signature: &ErrorSignature,
        context: &RecoveryContext,
    ) -> StateVector {
        match self.encode(signature, context) {
            Ok(state) => state,
            Err(e) => {
                warn!(kind = %signature.kind, error = %e, "Encoding failed, using zero vector");
                [0.0; STATE_DIM]
            }
        }
    }

    fn encode_additional(&self, context: &RecoveryContext, state: &mut StateVector) {
        if let Some(project_type) = context.additional_str("project_type") {
            state[ADDITIONAL_REGION] = stable_bucket(project_type);
        }
        if let Some(build_command) = context.additional_str("build_command") {
            state[ADDITIONAL_REGION + 1] = (build_command.len() as f32 / 100.0).min(1.0);
        }
        if let Some(deps) = context
            .additional
            .get("dependencies")
            .and_then(|v| v.as_array())
        {
            state[ADDITIONAL_REGION + 2] = (deps.len() as f32 / 100.0).min(1.0);
        }
        if context.additional_str("environment") == Some("production") {
            state[ADDITIONAL_REGION + 3] = 1.0;
        }
    }
}

fn platform_priority(platform: Option<&str>) -> f32 {
    let Some(name) = platform else { return 0.0 };
    PLATFORM_PRIORITIES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, priority)| *priority)
        .unwrap_or(0.0)
}

fn most_common_action(context: &RecoveryContext) -> Option<&str> {
    let history = &context.recovery_history;
    // Ties resolve to the earliest-seen action for determinism.
    let mut best: Option<(&str, usize)> = None;
    for record in history {
        let count = history
            .iter()
            .filter(|r| r.action == record.action)
            .count();
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((record.action.as_str(), count));
        }
    }
    best.map(|(action, _)| action)
}
