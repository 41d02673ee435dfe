//! Rule-based error classification from log text and visual evidence.
//!
//! The pattern table is an explicitly ordered priority list: entries are
//! tried in declaration order and the first matching pattern wins, so
//! classification is deterministic even when several types' patterns would
//! match the same input.

use regex::Regex;
use tracing::{debug, info};

use crate::config::ClassifierConfig;
use crate::policy::RecoveryAction;
use crate::signature::{ErrorKind, ErrorSignature, Severity};
use crate::utils::first_line_truncated;

/// One row of the priority-ordered pattern table.
struct PatternEntry {
    kind: ErrorKind,
    patterns: &'static [&'static str],
    severity: Severity,
    default_action: RecoveryAction,
}

/// Declaration order is the classification priority.
const PATTERN_TABLE: [PatternEntry; 5] = [
    PatternEntry {
        kind: ErrorKind::AuthError,
        patterns: &[
            r"authentication failed",
            r"invalid token",
            r"unauthorized",
            r"login required",
            r"session expired",
        ],
        severity: Severity::High,
        default_action: RecoveryAction::ReAuth,
    },
    PatternEntry {
        kind: ErrorKind::BuildError,
        patterns: &[
            r"build failed",
            r"compilation error",
            r"module not found",
            r"dependency error",
            r"npm err",
            r"yarn err",
        ],
        severity: Severity::High,
        default_action: RecoveryAction::FixDependencies,
    },
    PatternEntry {
        kind: ErrorKind::DeploymentError,
        patterns: &[
            r"deployment failed",
            r"deploy error",
            r"failed to deploy",
            r"timeout",
            r"connection error",
        ],
        severity: Severity::High,
        default_action: RecoveryAction::Retry,
    },
    PatternEntry {
        kind: ErrorKind::ConfigError,
        patterns: &[
            r"configuration error",
            r"invalid config",
            r"missing environment variable",
            r"env var not found",
        ],
        severity: Severity::Medium,
        default_action: RecoveryAction::FixConfig,
    },
    PatternEntry {
        kind: ErrorKind::TimeoutError,
        patterns: &[
            r"request timeout",
            r"operation timed out",
            r"connection timeout",
        ],
        severity: Severity::Medium,
        default_action: RecoveryAction::RetryWithTimeout,
    },
];

/// Generic failure keywords used when no specific pattern matches.
const GENERIC_KEYWORDS: [&str; 3] = ["error", "failed", "timeout"];

/// A classified error plus the table's suggested default action.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct Classification {
    pub signature: ErrorSignature,
    pub suggested_action: RecoveryAction,
    pub suggested_steps: Vec<String>,
}

/// Non-text evidence extracted from a screenshot or rendered page.
#[derive(Debug, Clone, Default)]
pub struct VisualEvidence {
    /// Number of significant error-colored regions found.
    pub error_regions: u32,
    /// Error keywords detected in the image text.
    pub detected_keywords: Vec<String>,
}

pub struct ErrorClassifier {
    config: ClassifierConfig,
    compiled: Vec<(usize, Vec<Regex>)>,
}

impl ErrorClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let compiled = PATTERN_TABLE
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let regexes = entry
                    .patterns
                    .iter()
                    // Patterns are static lowercase literals; compilation
                    // cannot fail for them.
                    .filter_map(|p| Regex::new(p).ok())
                    .collect();
                (i, regexes)
            })
            .collect();
        Self { config, compiled }
    }

    /// Classify raw log text. Returns `None` when nothing looks like an
    /// error at all; that is a valid negative result, not a failure.
    pub fn classify_from_text(&self, logs: &str) -> Option<Classification> {
        let logs_lower = logs.to_lowercase();

        for (index, regexes) in &self.compiled {
            let entry = &PATTERN_TABLE[*index];
            for regex in regexes {
                if let Some(found) = regex.find(&logs_lower) {
                    let matched = found.as_str();
                    let confidence = (matched.len() as f64 / 20.0).min(1.0);
                    info!(kind = %entry.kind, matched = matched, "Detected error pattern");

                    let signature =
                        ErrorSignature::new(entry.kind, matched, entry.severity)
                            .with_confidence(confidence);
                    return Some(self.classification(signature, entry.default_action));
                }
            }
        }

        // No specific pattern matched; fall back to generic failure keywords
        // with fixed low confidence.
        if GENERIC_KEYWORDS.iter().any(|k| logs_lower.contains(k)) {
            let message = first_line_truncated(logs, self.config.message_cap);
            debug!(message = %message, "Generic failure keywords only");
            let signature = ErrorSignature::new(ErrorKind::Unknown, message, Severity::Low)
                .with_confidence(self.config.generic_confidence);
            return Some(self.classification(signature, RecoveryAction::Retry));
        }

        None
    }

    /// Classify from visual evidence. Confidence is a weighted sum of the
    /// two boolean signals; results below the acceptance threshold are
    /// discarded.
    pub fn classify_from_visual_signal(
        &self,
        evidence: &VisualEvidence,
    ) -> Option<Classification> {
        let mut confidence = 0.0;
        if evidence.error_regions > 0 {
            confidence += self.config.visual_region_weight;
        }
        if !evidence.detected_keywords.is_empty() {
            confidence += self.config.visual_text_weight;
        }

        if confidence <= self.config.visual_threshold {
            return None;
        }

        let message = if evidence.detected_keywords.is_empty() {
            format!("{} error-colored regions detected", evidence.error_regions)
        } else {
            evidence.detected_keywords.join(" ")
        };

        info!(confidence = confidence, message = %message, "Visual error detected");
        let signature = ErrorSignature::new(ErrorKind::Unknown, message, Severity::Medium)
            .with_confidence(confidence);
        Some(self.classification(signature, RecoveryAction::Retry))
    }

    fn classification(
        &self,
        signature: ErrorSignature,
        action: RecoveryAction,
    ) -> Classification {
        Classification {
            signature,
            suggested_action: action,
            suggested_steps: action
                .suggested_steps()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ErrorClassifier {
        ErrorClassifier::default()
    }

    #[test]
    fn classifies_auth_error() {
        let c = classifier()
            .classify_from_text("Error: Authentication failed. Invalid token provided.")
            .unwrap();
        assert_eq!(c.signature.kind, ErrorKind::AuthError);
        assert_eq!(c.signature.severity, Severity::High);
        assert_eq!(c.suggested_action, RecoveryAction::ReAuth);
        // "authentication failed" is 21 bytes, so confidence saturates.
        assert_eq!(c.signature.confidence, 1.0);
    }

    #[test]
    fn classifies_build_error() {
        let c = classifier()
            .classify_from_text("npm ERR! Module not found: Can't resolve 'react'")
            .unwrap();
        assert_eq!(c.signature.kind, ErrorKind::BuildError);
        assert_eq!(c.suggested_action, RecoveryAction::FixDependencies);
    }

    #[test]
    fn classifies_deployment_error() {
        let c = classifier()
            .classify_from_text("Deployment failed: Connection timeout after 30 seconds")
            .unwrap();
        assert_eq!(c.signature.kind, ErrorKind::DeploymentError);
    }

    #[test]
    fn classifies_config_error() {
        let c = classifier()
            .classify_from_text("Missing environment variable: API_KEY is required")
            .unwrap();
        assert_eq!(c.signature.kind, ErrorKind::ConfigError);
        assert_eq!(c.signature.severity, Severity::Medium);
        assert_eq!(c.suggested_action, RecoveryAction::FixConfig);
    }

    #[test]
    fn classifies_timeout_error() {
        let c = classifier()
            .classify_from_text("Operation timed out after 60 seconds")
            .unwrap();
        assert_eq!(c.signature.kind, ErrorKind::TimeoutError);
        assert_eq!(c.suggested_action, RecoveryAction::RetryWithTimeout);
    }

    #[test]
    fn bare_timeout_resolves_by_priority_order() {
        // Both the deployment and timeout rows carry timeout-ish patterns;
        // the deployment row is declared first and wins.
        let c = classifier().classify_from_text("timeout").unwrap();
        assert_eq!(c.signature.kind, ErrorKind::DeploymentError);
    }

    #[test]
    fn generic_fallback_is_low_confidence_unknown() {
        let logs = "Something failed badly\nmore detail here";
        let c = classifier().classify_from_text(logs).unwrap();
        assert_eq!(c.signature.kind, ErrorKind::Unknown);
        assert_eq!(c.signature.severity, Severity::Low);
        assert_eq!(c.signature.confidence, 0.3);
        assert_eq!(c.signature.message, "Something failed badly");
        assert_eq!(c.suggested_action, RecoveryAction::Retry);
    }

    #[test]
    fn generic_fallback_caps_message_length() {
        let logs = format!("error {}", "x".repeat(300));
        let c = classifier().classify_from_text(&logs).unwrap();
        assert!(c.signature.message.len() <= 100);
    }

    #[test]
    fn clean_logs_return_none() {
        assert!(classifier()
            .classify_from_text("nothing abnormal here")
            .is_none());
    }

    #[test]
    fn classification_is_case_insensitive() {
        let c = classifier()
            .classify_from_text("BUILD FAILED with exit code 1")
            .unwrap();
        assert_eq!(c.signature.kind, ErrorKind::BuildError);
    }

    #[test]
    fn visual_both_signals() {
        let evidence = VisualEvidence {
            error_regions: 3,
            detected_keywords: vec!["error".into(), "failed".into()],
        };
        let c = classifier().classify_from_visual_signal(&evidence).unwrap();
        assert!((c.signature.confidence - 1.0).abs() < 1e-9);
        assert_eq!(c.signature.message, "error failed");
    }

    #[test]
    fn visual_text_only_passes_threshold() {
        let evidence = VisualEvidence {
            error_regions: 0,
            detected_keywords: vec!["error".into()],
        };
        let c = classifier().classify_from_visual_signal(&evidence).unwrap();
        assert!((c.signature.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn visual_regions_only_below_threshold() {
        let evidence = VisualEvidence {
            error_regions: 2,
            detected_keywords: vec![],
        };
        // 0.4 does not clear the 0.5 acceptance threshold.
        assert!(classifier().classify_from_visual_signal(&evidence).is_none());
    }

    #[test]
    fn visual_no_signals_is_none() {
        assert!(classifier()
            .classify_from_visual_signal(&VisualEvidence::default())
            .is_none());
    }
}
