//! Error signatures and the mutable recovery context that travels with them.
//!
//! An [`ErrorSignature`] is the classified description of a failure (kind,
//! message, severity, confidence). A [`RecoveryContext`] carries everything
//! the encoder and policy need beyond the signature itself: platform,
//! retry count, elapsed time and the history of past recovery attempts.
//! Both can be built from loosely-typed JSON payloads coming from a serving
//! layer; missing or malformed fields coerce to safe defaults.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical error taxonomy. `Unknown` covers the generic-keyword fallback
/// classification and anything a caller could not categorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthError,
    BuildError,
    DeploymentError,
    ConfigError,
    TimeoutError,
    Unknown,
}

impl ErrorKind {
    /// All known kinds, in one-hot slot order. `Unknown` occupies the last
    /// slot so that the encoder's type region has a fixed width.
    pub const ALL: [ErrorKind; 6] = [
        Self::AuthError,
        Self::BuildError,
        Self::DeploymentError,
        Self::ConfigError,
        Self::TimeoutError,
        Self::Unknown,
    ];

    /// One-hot slot index for the state-vector type region.
    pub fn slot(self) -> usize {
        match self {
            Self::AuthError => 0,
            Self::BuildError => 1,
            Self::DeploymentError => 2,
            Self::ConfigError => 3,
            Self::TimeoutError => 4,
            Self::Unknown => 5,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "auth_error" => Self::AuthError,
            "build_error" => Self::BuildError,
            "deployment_error" => Self::DeploymentError,
            "config_error" => Self::ConfigError,
            "timeout_error" => Self::TimeoutError,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthError => "auth_error",
            Self::BuildError => "build_error",
            Self::DeploymentError => "deployment_error",
            Self::ConfigError => "config_error",
            Self::TimeoutError => "timeout_error",
            Self::Unknown => "unknown_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Classified description of a failure. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorSignature {
    pub kind: ErrorKind,
    pub message: String,
    pub severity: Severity,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
}

impl ErrorSignature {
    pub fn new(kind: ErrorKind, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind,
            message: message.into(),
            severity,
            confidence: 1.0,
            detected_at: Utc::now(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Build from a loosely-typed JSON payload. Missing or malformed fields
    /// coerce to defaults: unknown kind, empty message, low severity, zero
    /// confidence. Never fails.
    pub fn from_value(value: &Value) -> Self {
        let kind = value
            .get("type")
            .or_else(|| value.get("error_type"))
            .and_then(Value::as_str)
            .map(ErrorKind::parse)
            .unwrap_or(ErrorKind::Unknown);
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let severity = match value.get("severity").and_then(Value::as_str) {
            Some("high") => Severity::High,
            Some("medium") => Severity::Medium,
            _ => Severity::Low,
        };
        let confidence = value
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        Self {
            kind,
            message,
            severity,
            confidence,
            detected_at: Utc::now(),
        }
    }
}

/// One past recovery attempt: which action ran and whether it worked.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AttemptRecord {
    pub action: String,
    pub success: bool,
}

/// Mutable context accompanying a recovery decision. Owned by the caller;
/// the encoder reads it without mutation and the episode simulator mutates
/// a private copy per episode.
///
/// `retry_count` and `time_since_error_secs` only ever increase within an
/// episode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecoveryContext {
    pub platform: Option<String>,
    pub retry_count: u32,
    pub time_since_error_secs: u64,
    pub recovery_history: Vec<AttemptRecord>,
    /// Free-form extra fields (project_type, build_command, dependencies,
    /// environment, service_name, config_file, ...).
    pub additional: BTreeMap<String, Value>,
}

impl RecoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    pub fn with_elapsed_secs(mut self, secs: u64) -> Self {
        self.time_since_error_secs = secs;
        self
    }

    pub fn record_attempt(&mut self, action: impl Into<String>, success: bool) {
        self.recovery_history.push(AttemptRecord {
            action: action.into(),
            success,
        });
    }

    /// Fraction of past attempts that succeeded; 0 when history is empty.
    pub fn success_ratio(&self) -> f64 {
        if self.recovery_history.is_empty() {
            return 0.0;
        }
        let successes = self.recovery_history.iter().filter(|a| a.success).count();
        successes as f64 / self.recovery_history.len() as f64
    }

    /// Fraction of past attempts that failed; 0 when history is empty.
    pub fn failure_ratio(&self) -> f64 {
        if self.recovery_history.is_empty() {
            return 0.0;
        }
        1.0 - self.success_ratio()
    }

    pub fn additional_str(&self, key: &str) -> Option<&str> {
        self.additional.get(key).and_then(Value::as_str)
    }

    /// Build from a loosely-typed JSON payload, coercing missing or
    /// malformed fields to defaults. Never fails.
    pub fn from_value(value: &Value) -> Self {
        let platform = value
            .get("platform")
            .and_then(Value::as_str)
            .map(String::from);
        let retry_count = value
            .get("retry_count")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .min(u32::MAX as u64) as u32;
        let time_since_error_secs = value
            .get("time_since_error")
            .or_else(|| value.get("time_since_error_secs"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let recovery_history = value
            .get("recovery_history")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| AttemptRecord {
                        action: e
                            .get("action")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        success: e.get("success").and_then(Value::as_bool).unwrap_or(false),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let known = [
            "platform",
            "retry_count",
            "time_since_error",
            "time_since_error_secs",
            "recovery_history",
        ];
        let additional = value
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter(|(k, _)| !known.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            platform,
            retry_count,
            time_since_error_secs,
            recovery_history,
            additional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_slots_are_distinct_and_dense() {
        let mut seen = [false; 6];
        for kind in ErrorKind::ALL {
            let slot = kind.slot();
            assert!(slot < 6);
            assert!(!seen[slot], "duplicate slot {}", slot);
            seen[slot] = true;
        }
    }

    #[test]
    fn kind_name_round_trip() {
        for kind in ErrorKind::ALL {
            if kind == ErrorKind::Unknown {
                continue;
            }
            assert_eq!(ErrorKind::parse(kind.as_str()), kind);
        }
        assert_eq!(ErrorKind::parse("not a kind"), ErrorKind::Unknown);
    }

    #[test]
    fn signature_from_loose_payload() {
        let sig = ErrorSignature::from_value(&json!({
            "type": "auth_error",
            "message": "Authentication failed",
            "severity": "high",
            "confidence": 0.9,
        }));
        assert_eq!(sig.kind, ErrorKind::AuthError);
        assert_eq!(sig.severity, Severity::High);
        assert!((sig.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn signature_from_empty_payload_defaults() {
        let sig = ErrorSignature::from_value(&json!({}));
        assert_eq!(sig.kind, ErrorKind::Unknown);
        assert_eq!(sig.severity, Severity::Low);
        assert_eq!(sig.confidence, 0.0);
        assert!(sig.message.is_empty());
    }

    #[test]
    fn signature_confidence_clamped() {
        let sig = ErrorSignature::from_value(&json!({"confidence": 7.5}));
        assert_eq!(sig.confidence, 1.0);
    }

    #[test]
    fn context_from_loose_payload() {
        let ctx = RecoveryContext::from_value(&json!({
            "platform": "vercel",
            "retry_count": 2,
            "time_since_error": 60,
            "recovery_history": [
                {"action": "retry", "success": false},
                {"action": "re_auth", "success": true},
            ],
            "project_type": "nextjs",
        }));
        assert_eq!(ctx.platform.as_deref(), Some("vercel"));
        assert_eq!(ctx.retry_count, 2);
        assert_eq!(ctx.time_since_error_secs, 60);
        assert_eq!(ctx.recovery_history.len(), 2);
        assert_eq!(ctx.additional_str("project_type"), Some("nextjs"));
        assert!((ctx.success_ratio() - 0.5).abs() < 1e-9);
        assert!((ctx.failure_ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn context_ratios_zero_when_empty() {
        let ctx = RecoveryContext::new();
        assert_eq!(ctx.success_ratio(), 0.0);
        assert_eq!(ctx.failure_ratio(), 0.0);
    }

    #[test]
    fn context_from_non_object_defaults() {
        let ctx = RecoveryContext::from_value(&json!("garbage"));
        assert_eq!(ctx.retry_count, 0);
        assert!(ctx.recovery_history.is_empty());
    }
}
