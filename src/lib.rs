pub mod classify;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod episode;
pub mod error;
pub mod policy;
pub mod reward;
pub mod signature;
pub mod utils;

pub use classify::{Classification, ErrorClassifier, VisualEvidence};
pub use config::MedicConfig;
pub use encoder::{StateEncoder, StateVector, STATE_DIM};
pub use episode::{
    Episode, EpisodeSimulator, FinalOutcome, OutcomeSource, ScriptedOutcomeSource,
    SeededOutcomeSource,
};
pub use error::{MedicError, Result};
pub use policy::{RecoveryAction, RecoveryDecision, RecoveryPolicy};
pub use reward::{Outcome, RewardEvaluator};
pub use signature::{ErrorKind, ErrorSignature, RecoveryContext, Severity};
