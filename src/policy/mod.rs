//! Recovery-action selection.
//!
//! Two entry points produce the same decision shape: the rule-driven path
//! over a classified [`ErrorSignature`], and the vector-driven path over an
//! encoded [`StateVector`] (which reconstructs the signature facts from the
//! vector's fixed segments and delegates to the rules). Both are pure:
//! identical inputs always yield identical decisions.

mod actions;
mod fallback;
mod params;

pub use actions::RecoveryAction;
pub use fallback::{fallbacks, FallbackOption, FALLBACK_CONFIDENCE};
pub use params::{parameterize, parameterize_by_name, ActionParams};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PolicyConfig;
use crate::encoder::StateVector;
use crate::signature::{ErrorKind, ErrorSignature, RecoveryContext, Severity};

/// The outcome of one decision call: a primary action with execution
/// parameters, plus ranked lower-confidence alternatives.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecoveryDecision {
    pub action: RecoveryAction,
    pub params: ActionParams,
    pub expected_effect: String,
    /// Combined confidence in [0, 1].
    pub confidence: f64,
    pub reasoning: String,
    pub fallback: Vec<FallbackOption>,
}

pub struct RecoveryPolicy {
    config: PolicyConfig,
}

impl RecoveryPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Rule-driven decision for a classified error.
    pub fn decide_from_signature(
        &self,
        signature: &ErrorSignature,
        context: &RecoveryContext,
    ) -> RecoveryDecision {
        let (action, base_confidence, reasoning) = self.select(signature.kind, context);
        let (action, base_confidence, reasoning) =
            self.apply_abort_override(action, base_confidence, reasoning, context);

        let confidence = (base_confidence * signature.confidence).clamp(0.0, 1.0);
        debug!(
            kind = %signature.kind,
            action = %action,
            confidence = confidence,
            "Recovery decision"
        );

        RecoveryDecision {
            action,
            params: parameterize(action, signature, context),
            expected_effect: action.description().to_string(),
            confidence,
            reasoning,
            fallback: fallbacks(action, self.config.fallback_limit),
        }
    }

    /// Vector-driven decision. Reads the error kind, confidence and retry
    /// count back out of the state vector's fixed segments, then applies
    /// the same rules as the signature path.
    pub fn decide(&self, state: &StateVector) -> RecoveryDecision {
        let kind = dominant_kind(state);
        let confidence = f64::from(state[6]).clamp(0.0, 1.0);
        let retry_count =
            (f64::from(state[7]) * f64::from(self.config.retry_cap)).round() as u32;

        let signature = ErrorSignature::new(kind, "", severity_for(kind))
            .with_confidence(confidence);
        let context = RecoveryContext::new().with_retry_count(retry_count);
        self.decide_from_signature(&signature, &context)
    }

    /// Type-to-action rule table with the per-type retry ceilings.
    fn select(
        &self,
        kind: ErrorKind,
        context: &RecoveryContext,
    ) -> (RecoveryAction, f64, String) {
        match kind {
            ErrorKind::AuthError => (
                RecoveryAction::ReAuth,
                0.9,
                "Authentication error detected, suggesting re-authentication".to_string(),
            ),
            ErrorKind::BuildError => (
                RecoveryAction::FixDependencies,
                0.85,
                "Build error detected, suggesting dependency fix".to_string(),
            ),
            ErrorKind::ConfigError => (
                RecoveryAction::FixConfig,
                0.88,
                "Configuration error detected, suggesting config fix".to_string(),
            ),
            ErrorKind::TimeoutError => (
                RecoveryAction::RetryWithTimeout,
                0.82,
                "Timeout error detected, suggesting retry with increased timeout".to_string(),
            ),
            ErrorKind::DeploymentError => {
                if context.retry_count < self.config.deployment_retry_limit {
                    (
                        RecoveryAction::Retry,
                        0.8,
                        "Deployment error, suggesting retry".to_string(),
                    )
                } else {
                    (
                        RecoveryAction::Abort,
                        0.7,
                        "Multiple deployment failures, suggesting abort".to_string(),
                    )
                }
            }
            ErrorKind::Unknown => {
                if context.retry_count < self.config.unknown_retry_limit {
                    (
                        RecoveryAction::Retry,
                        0.6,
                        "Unknown error, suggesting simple retry".to_string(),
                    )
                } else {
                    (
                        RecoveryAction::Abort,
                        0.5,
                        "Unknown error with retries exhausted, suggesting abort".to_string(),
                    )
                }
            }
        }
    }

    /// Global tie-break: past the abort threshold, every retryable choice
    /// becomes an abort regardless of error type.
    fn apply_abort_override(
        &self,
        action: RecoveryAction,
        base_confidence: f64,
        reasoning: String,
        context: &RecoveryContext,
    ) -> (RecoveryAction, f64, String) {
        if action.is_retryable() && context.retry_count > self.config.abort_threshold {
            (
                RecoveryAction::Abort,
                0.7,
                format!(
                    "Retry budget exhausted ({} attempts), aborting",
                    context.retry_count
                ),
            )
        } else {
            (action, base_confidence, reasoning)
        }
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

/// Error kind with the highest value in the one-hot type region. An
/// all-zero region (the degraded-mode zero vector) reads as `Unknown`.
fn dominant_kind(state: &StateVector) -> ErrorKind {
    let mut best = ErrorKind::Unknown;
    let mut best_value = 0.0f32;
    for kind in ErrorKind::ALL {
        let value = state[kind.slot()];
        if value > best_value {
            best = kind;
            best_value = value;
        }
    }
    best
}

fn severity_for(kind: ErrorKind) -> Severity {
    match kind {
        ErrorKind::AuthError | ErrorKind::BuildError | ErrorKind::DeploymentError => {
            Severity::High
        }
        ErrorKind::ConfigError | ErrorKind::TimeoutError => Severity::Medium,
        ErrorKind::Unknown => Severity::Low,
    }
}
