//! Canonical recovery-action catalog.
//!
//! One closed set of ten actions serves the whole crate: the policy's rule
//! table, the parameter templates, the fallback pool and the episode
//! simulator all refer to the variants defined here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    Retry,
    RetryClean,
    ReAuth,
    FixDependencies,
    FixConfig,
    RetryWithTimeout,
    ClearCache,
    RollbackChanges,
    EscalateSupport,
    Abort,
}

impl RecoveryAction {
    /// Full catalog in stable declaration order.
    pub const ALL: [RecoveryAction; 10] = [
        Self::Retry,
        Self::RetryClean,
        Self::ReAuth,
        Self::FixDependencies,
        Self::FixConfig,
        Self::RetryWithTimeout,
        Self::ClearCache,
        Self::RollbackChanges,
        Self::EscalateSupport,
        Self::Abort,
    ];

    /// Ordered pool of common actions the fallback generator draws from.
    pub const COMMON: [RecoveryAction; 5] = [
        Self::Retry,
        Self::RetryClean,
        Self::ReAuth,
        Self::ClearCache,
        Self::RetryWithTimeout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::RetryClean => "retry_clean",
            Self::ReAuth => "re_auth",
            Self::FixDependencies => "fix_dependencies",
            Self::FixConfig => "fix_config",
            Self::RetryWithTimeout => "retry_with_timeout",
            Self::ClearCache => "clear_cache",
            Self::RollbackChanges => "rollback_changes",
            Self::EscalateSupport => "escalate_support",
            Self::Abort => "abort",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Human-readable expected effect of the action.
    pub fn description(self) -> &'static str {
        match self {
            Self::Retry => "Retry the operation without changes",
            Self::RetryClean => "Retry the operation with clean cache and dependencies",
            Self::ReAuth => "Refresh authentication token and retry",
            Self::FixDependencies => "Check and update dependencies, then retry",
            Self::FixConfig => "Fix configuration values and retry",
            Self::RetryWithTimeout => "Increase timeout limits and retry",
            Self::ClearCache => "Clear all caches and retry",
            Self::RollbackChanges => "Rollback recent changes and retry",
            Self::EscalateSupport => "Escalate to human support",
            Self::Abort => "Stop recovery; manual intervention required",
        }
    }

    /// Ordered remediation steps suggested alongside the action.
    pub fn suggested_steps(self) -> &'static [&'static str] {
        match self {
            Self::Retry => &["Simple retry", "Check for temporary issues"],
            Self::RetryClean => &[
                "Clear build cache",
                "Reinstall dependencies",
                "Retry the operation",
            ],
            Self::ReAuth => &[
                "Refresh authentication token",
                "Re-login to platform",
                "Check token permissions",
            ],
            Self::FixDependencies => &[
                "Check package manifest for missing dependencies",
                "Run the package-manager install step",
                "Clear the module cache and reinstall",
            ],
            Self::FixConfig => &[
                "Check environment variables",
                "Verify build settings",
                "Update configuration files",
            ],
            Self::RetryWithTimeout => &[
                "Increase timeout settings",
                "Check network connection",
                "Retry with exponential backoff",
            ],
            Self::ClearCache => &["Clear all platform caches", "Retry the operation"],
            Self::RollbackChanges => &[
                "Identify the last known-good revision",
                "Roll back recent changes",
                "Retry the operation",
            ],
            Self::EscalateSupport => &[
                "Collect relevant logs",
                "Open a support ticket",
                "Check platform status page",
            ],
            Self::Abort => &[
                "Review error logs",
                "Contact platform support",
                "Check platform status page",
            ],
        }
    }

    /// Whether the action retries the failed operation (as opposed to
    /// handing off to a human).
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::EscalateSupport | Self::Abort)
    }
}

impl std::fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
