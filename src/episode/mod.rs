//! Bounded recovery-episode simulation.
//!
//! An episode drives the full loop — encode, decide, execute, evaluate,
//! update context — against a simulated execution backend until the error
//! is resolved, the policy aborts, or the step budget runs out. The only
//! randomness lives in the outcome draw, isolated behind [`OutcomeSource`]
//! so tests can script every step.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SimulatorConfig;
use crate::encoder::StateEncoder;
use crate::error::{MedicError, Result};
use crate::policy::{RecoveryAction, RecoveryPolicy};
use crate::reward::{Outcome, RewardEvaluator};
use crate::signature::{ErrorKind, ErrorSignature, RecoveryContext};

/// Source of uniform draws in [0, 1) for outcome simulation.
pub trait OutcomeSource {
    fn draw(&mut self) -> f64;
}

/// Seeded ChaCha8 source; identical seeds reproduce identical episodes.
pub struct SeededOutcomeSource {
    rng: ChaCha8Rng,
}

impl SeededOutcomeSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl OutcomeSource for SeededOutcomeSource {
    fn draw(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}

/// Fixed sequence of draws for deterministic tests. Once the script is
/// exhausted every further draw returns 1.0 (always a failure outcome).
pub struct ScriptedOutcomeSource {
    draws: std::collections::VecDeque<f64>,
}

impl ScriptedOutcomeSource {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }
}

impl OutcomeSource for ScriptedOutcomeSource {
    fn draw(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FinalOutcome {
    Success,
    Aborted,
    Timeout,
    Error,
}

impl std::fmt::Display for FinalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Aborted => write!(f, "aborted"),
            Self::Timeout => write!(f, "timeout"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One executed step of an episode.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StepRecord {
    pub step: u32,
    pub action: RecoveryAction,
    pub confidence: f64,
    pub reasoning: String,
    pub outcome: Outcome,
}

/// Result of one bounded recovery attempt sequence.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Episode {
    pub initial_error: ErrorSignature,
    pub actions_taken: Vec<StepRecord>,
    pub final_outcome: FinalOutcome,
    pub total_reward: f64,
    pub steps: u32,
    pub started_at: DateTime<Utc>,
}

pub struct EpisodeSimulator {
    encoder: StateEncoder,
    policy: RecoveryPolicy,
    evaluator: RewardEvaluator,
    config: SimulatorConfig,
}

impl EpisodeSimulator {
    pub fn new(
        encoder: StateEncoder,
        policy: RecoveryPolicy,
        evaluator: RewardEvaluator,
        config: SimulatorConfig,
    ) -> Self {
        Self {
            encoder,
            policy,
            evaluator,
            config,
        }
    }

    /// Run one episode against the simulated backend. The caller's context
    /// is copied; the original is never mutated.
    ///
    /// Step failures never propagate: they terminate the episode with
    /// [`FinalOutcome::Error`], a flat −1.0 reward and an empty action log.
    pub fn run(
        &self,
        signature: &ErrorSignature,
        context: &RecoveryContext,
        source: &mut dyn OutcomeSource,
    ) -> Episode {
        let started_at = Utc::now();
        match self.run_inner(signature, context, source, started_at) {
            Ok(episode) => episode,
            Err(e) => {
                warn!(error = %e, "Episode failed, containing");
                Episode {
                    initial_error: signature.clone(),
                    actions_taken: Vec::new(),
                    final_outcome: FinalOutcome::Error,
                    total_reward: -1.0,
                    steps: 0,
                    started_at,
                }
            }
        }
    }

    fn run_inner(
        &self,
        signature: &ErrorSignature,
        context: &RecoveryContext,
        source: &mut dyn OutcomeSource,
        started_at: DateTime<Utc>,
    ) -> Result<Episode> {
        let mut current = context.clone();
        let mut actions_taken = Vec::new();
        let mut total_reward = 0.0;
        let mut final_outcome = FinalOutcome::Timeout;

        for step in 1..=self.config.max_steps {
            debug!(step = step, max = self.config.max_steps, "Recovery step");

            let state = self.encoder.encode(signature, &current).map_err(|e| {
                MedicError::Simulation {
                    step,
                    message: e.to_string(),
                }
            })?;
            let decision = self.policy.decide(&state);

            let outcome = self.simulate_outcome(
                decision.action,
                signature.kind,
                current.retry_count,
                source,
            );

            actions_taken.push(StepRecord {
                step,
                action: decision.action,
                confidence: decision.confidence,
                reasoning: decision.reasoning.clone(),
                outcome,
            });

            total_reward += self.evaluator.evaluate(
                decision.action,
                signature.kind,
                current.retry_count,
                outcome,
            );

            current.retry_count += 1;
            current.time_since_error_secs += self.config.time_increment_secs;
            current.record_attempt(decision.action.as_str(), outcome == Outcome::Success);

            if outcome == Outcome::Success {
                final_outcome = FinalOutcome::Success;
                break;
            }
            if outcome == Outcome::Failure && decision.action == RecoveryAction::Abort {
                final_outcome = FinalOutcome::Aborted;
                break;
            }
        }

        let steps = actions_taken.len() as u32;
        info!(outcome = %final_outcome, steps = steps, reward = total_reward, "Episode completed");

        Ok(Episode {
            initial_error: signature.clone(),
            actions_taken,
            final_outcome,
            total_reward,
            steps,
            started_at,
        })
    }

    /// Draw an outcome from the action/error-dependent success probability.
    /// Threshold ordering is fixed: success below p, partial below p + 0.2,
    /// failure otherwise.
    fn simulate_outcome(
        &self,
        action: RecoveryAction,
        kind: ErrorKind,
        retry_count: u32,
        source: &mut dyn OutcomeSource,
    ) -> Outcome {
        let p = success_probability(action, kind, retry_count);
        let value = source.draw();
        if value < p {
            Outcome::Success
        } else if value < p + 0.2 {
            Outcome::Partial
        } else {
            Outcome::Failure
        }
    }
}

/// Simulated success probability for executing `action` against an error of
/// `kind` after `retry_count` prior attempts.
pub fn success_probability(action: RecoveryAction, kind: ErrorKind, retry_count: u32) -> f64 {
    match action {
        RecoveryAction::ReAuth => {
            if kind == ErrorKind::AuthError {
                0.8
            } else {
                0.3
            }
        }
        RecoveryAction::FixDependencies => {
            if kind == ErrorKind::BuildError {
                0.7
            } else {
                0.2
            }
        }
        RecoveryAction::FixConfig => {
            if kind == ErrorKind::ConfigError {
                0.6
            } else {
                0.1
            }
        }
        RecoveryAction::Retry => {
            if retry_count < 2 {
                0.4
            } else {
                0.1
            }
        }
        RecoveryAction::RetryWithTimeout => {
            if kind == ErrorKind::TimeoutError {
                0.5
            } else {
                0.2
            }
        }
        // Terminal hand-offs never "succeed" at fixing the error themselves.
        RecoveryAction::Abort | RecoveryAction::EscalateSupport => 0.0,
        RecoveryAction::RetryClean
        | RecoveryAction::ClearCache
        | RecoveryAction::RollbackChanges => 0.1,
    }
}
