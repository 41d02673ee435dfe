//! Scoring of recovery attempts for policy improvement.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::EvaluatorConfig;
use crate::policy::RecoveryAction;
use crate::signature::ErrorKind;

/// Observed result of executing a recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Partial,
    Failure,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Partial => write!(f, "partial"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Actions considered appropriate for each error kind. Appropriateness
/// earns the bonus in [`RewardEvaluator::evaluate`]; anything else is
/// penalized.
pub fn appropriate_actions(kind: ErrorKind) -> &'static [RecoveryAction] {
    match kind {
        ErrorKind::AuthError => &[RecoveryAction::ReAuth],
        ErrorKind::BuildError => &[RecoveryAction::FixDependencies],
        ErrorKind::DeploymentError => &[RecoveryAction::Retry, RecoveryAction::Abort],
        ErrorKind::ConfigError => &[RecoveryAction::FixConfig],
        ErrorKind::TimeoutError => &[RecoveryAction::RetryWithTimeout],
        ErrorKind::Unknown => &[RecoveryAction::Retry, RecoveryAction::Abort],
    }
}

pub struct RewardEvaluator {
    config: EvaluatorConfig,
}

impl RewardEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// Deterministic reward for one (action, error, outcome) triple.
    ///
    /// Base reward by outcome, an appropriateness adjustment for the error
    /// kind, and an extra penalty for retrying past the retry-loop
    /// threshold.
    pub fn evaluate(
        &self,
        action: RecoveryAction,
        kind: ErrorKind,
        retry_count: u32,
        outcome: Outcome,
    ) -> f64 {
        let mut reward = match outcome {
            Outcome::Success => self.config.success_reward,
            Outcome::Partial => self.config.partial_reward,
            Outcome::Failure => self.config.failure_reward,
        };

        if appropriate_actions(kind).contains(&action) {
            reward += self.config.appropriate_bonus;
        } else {
            reward -= self.config.inappropriate_penalty;
        }

        if action == RecoveryAction::Retry && retry_count > self.config.retry_penalty_threshold {
            reward -= self.config.retry_loop_penalty;
        }

        reward
    }
}

impl Default for RewardEvaluator {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> RewardEvaluator {
        RewardEvaluator::default()
    }

    #[test]
    fn appropriate_success_beats_inappropriate_success() {
        let e = evaluator();
        let matching = e.evaluate(
            RecoveryAction::ReAuth,
            ErrorKind::AuthError,
            0,
            Outcome::Success,
        );
        let mismatched = e.evaluate(
            RecoveryAction::ReAuth,
            ErrorKind::BuildError,
            0,
            Outcome::Success,
        );
        assert!(matching > mismatched);
        assert!((matching - 1.2).abs() < 1e-9);
        assert!((mismatched - 0.7).abs() < 1e-9);
    }

    #[test]
    fn outcome_base_rewards() {
        let e = evaluator();
        let success = e.evaluate(
            RecoveryAction::FixConfig,
            ErrorKind::ConfigError,
            0,
            Outcome::Success,
        );
        let partial = e.evaluate(
            RecoveryAction::FixConfig,
            ErrorKind::ConfigError,
            0,
            Outcome::Partial,
        );
        let failure = e.evaluate(
            RecoveryAction::FixConfig,
            ErrorKind::ConfigError,
            0,
            Outcome::Failure,
        );
        assert!((success - 1.2).abs() < 1e-9);
        assert!((partial - 0.7).abs() < 1e-9);
        assert!((failure + 0.3).abs() < 1e-9);
    }

    #[test]
    fn retry_loop_penalty_applies_past_threshold() {
        let e = evaluator();
        let within = e.evaluate(
            RecoveryAction::Retry,
            ErrorKind::DeploymentError,
            3,
            Outcome::Failure,
        );
        let beyond = e.evaluate(
            RecoveryAction::Retry,
            ErrorKind::DeploymentError,
            4,
            Outcome::Failure,
        );
        assert!((within - beyond - 0.4).abs() < 1e-9);
    }

    #[test]
    fn retry_penalty_only_for_retry_action() {
        let e = evaluator();
        let abort = e.evaluate(
            RecoveryAction::Abort,
            ErrorKind::DeploymentError,
            5,
            Outcome::Failure,
        );
        // Abort is appropriate for deployment errors: -0.5 + 0.2, no loop penalty.
        assert!((abort + 0.3).abs() < 1e-9);
    }

    #[test]
    fn evaluation_is_pure() {
        let e = evaluator();
        let a = e.evaluate(
            RecoveryAction::RetryWithTimeout,
            ErrorKind::TimeoutError,
            2,
            Outcome::Partial,
        );
        let b = e.evaluate(
            RecoveryAction::RetryWithTimeout,
            ErrorKind::TimeoutError,
            2,
            Outcome::Partial,
        );
        assert_eq!(a, b);
    }
}
