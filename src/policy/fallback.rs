//! Ranked fallback alternatives offered alongside a primary decision.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::actions::RecoveryAction;

/// Flat confidence assigned to every fallback entry. Deliberately lower
/// than any primary decision to signal reduced trust.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FallbackOption {
    pub action: RecoveryAction,
    pub confidence: f64,
    pub description: String,
}

/// Alternatives to try if the primary action fails: the common-action pool
/// minus the primary, in pool order, truncated to `limit`.
pub fn fallbacks(primary: RecoveryAction, limit: usize) -> Vec<FallbackOption> {
    RecoveryAction::COMMON
        .into_iter()
        .filter(|a| *a != primary)
        .take(limit)
        .map(|action| FallbackOption {
            action,
            confidence: FALLBACK_CONFIDENCE,
            description: action.description().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_primary_action() {
        let options = fallbacks(RecoveryAction::Retry, 3);
        assert_eq!(options.len(), 3);
        assert!(options.iter().all(|o| o.action != RecoveryAction::Retry));
    }

    #[test]
    fn preserves_pool_order() {
        let options = fallbacks(RecoveryAction::ReAuth, 3);
        let actions: Vec<_> = options.iter().map(|o| o.action).collect();
        assert_eq!(
            actions,
            vec![
                RecoveryAction::Retry,
                RecoveryAction::RetryClean,
                RecoveryAction::ClearCache,
            ]
        );
    }

    #[test]
    fn respects_limit() {
        assert_eq!(fallbacks(RecoveryAction::Abort, 2).len(), 2);
        // Primary outside the pool: full pool is available.
        assert_eq!(fallbacks(RecoveryAction::Abort, 10).len(), 5);
    }

    #[test]
    fn fallback_confidence_is_flat() {
        for option in fallbacks(RecoveryAction::FixConfig, 5) {
            assert_eq!(option.confidence, FALLBACK_CONFIDENCE);
        }
    }
}
