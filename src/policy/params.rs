//! Per-action execution parameter templates.
//!
//! Every catalog action expands into a typed parameter block the execution
//! layer consumes as-is. Templates are static apart from the few fields
//! filled in from the signature and context (platform, config file, service
//! name).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{MedicError, Result};
use crate::signature::{ErrorSignature, RecoveryContext};

use super::actions::RecoveryAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionParams {
    Retry {
        max_retries: u32,
        delay_secs: u64,
    },
    RetryClean {
        clean_cache: bool,
        clean_dependencies: bool,
        max_retries: u32,
    },
    ReAuth {
        platform: String,
        retry_auth: bool,
    },
    FixDependencies {
        update_outdated: bool,
        check_security: bool,
    },
    FixConfig {
        config_file: String,
        backup: bool,
    },
    RetryWithTimeout {
        timeout_multiplier: f64,
        max_timeout_secs: u64,
    },
    ClearCache {
        cache_types: Vec<String>,
        force: bool,
    },
    RollbackChanges {
        rollback_steps: u32,
        backup_restore: bool,
    },
    EscalateSupport {
        priority: String,
        include_logs: bool,
    },
    Abort {
        description: String,
        estimated_minutes: u32,
    },
}

/// Expand an action into its parameter template.
pub fn parameterize(
    action: RecoveryAction,
    signature: &ErrorSignature,
    context: &RecoveryContext,
) -> ActionParams {
    match action {
        RecoveryAction::Retry => ActionParams::Retry {
            max_retries: 3,
            delay_secs: 5,
        },
        RecoveryAction::RetryClean => ActionParams::RetryClean {
            clean_cache: true,
            clean_dependencies: false,
            max_retries: 3,
        },
        RecoveryAction::ReAuth => ActionParams::ReAuth {
            platform: context
                .platform
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            retry_auth: true,
        },
        RecoveryAction::FixDependencies => ActionParams::FixDependencies {
            update_outdated: true,
            check_security: true,
        },
        RecoveryAction::FixConfig => ActionParams::FixConfig {
            config_file: context
                .additional_str("config_file")
                .unwrap_or("package.json")
                .to_string(),
            backup: true,
        },
        RecoveryAction::RetryWithTimeout => ActionParams::RetryWithTimeout {
            timeout_multiplier: 2.0,
            max_timeout_secs: 300,
        },
        RecoveryAction::ClearCache => ActionParams::ClearCache {
            cache_types: vec!["npm".to_string(), "build".to_string(), "temp".to_string()],
            force: true,
        },
        RecoveryAction::RollbackChanges => ActionParams::RollbackChanges {
            rollback_steps: 1,
            backup_restore: true,
        },
        RecoveryAction::EscalateSupport => ActionParams::EscalateSupport {
            priority: "high".to_string(),
            include_logs: true,
        },
        RecoveryAction::Abort => ActionParams::Abort {
            description: format!(
                "Manual intervention required for {} error",
                signature.kind
            ),
            estimated_minutes: 30,
        },
    }
}

/// Expand an action given by name, as received from an external caller.
/// Unknown names are a programmer/integration error and surface immediately.
pub fn parameterize_by_name(
    name: &str,
    signature: &ErrorSignature,
    context: &RecoveryContext,
) -> Result<ActionParams> {
    let action = RecoveryAction::from_name(name)
        .ok_or_else(|| MedicError::UnknownAction(name.to_string()))?;
    Ok(parameterize(action, signature, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{ErrorKind, Severity};

    fn signature() -> ErrorSignature {
        ErrorSignature::new(ErrorKind::AuthError, "auth failed", Severity::High)
    }

    #[test]
    fn every_action_has_a_template() {
        let sig = signature();
        let ctx = RecoveryContext::new();
        for action in RecoveryAction::ALL {
            // Tag on the serialized form must match the action name.
            let params = parameterize(action, &sig, &ctx);
            let value = serde_json::to_value(&params).unwrap();
            assert_eq!(value["action"], action.as_str());
        }
    }

    #[test]
    fn re_auth_picks_up_platform() {
        let ctx = RecoveryContext::new().with_platform("vercel");
        match parameterize(RecoveryAction::ReAuth, &signature(), &ctx) {
            ActionParams::ReAuth {
                platform,
                retry_auth,
            } => {
                assert_eq!(platform, "vercel");
                assert!(retry_auth);
            }
            other => panic!("unexpected params: {:?}", other),
        }
    }

    #[test]
    fn fix_config_defaults_config_file() {
        match parameterize(RecoveryAction::FixConfig, &signature(), &RecoveryContext::new()) {
            ActionParams::FixConfig {
                config_file,
                backup,
            } => {
                assert_eq!(config_file, "package.json");
                assert!(backup);
            }
            other => panic!("unexpected params: {:?}", other),
        }
    }

    #[test]
    fn abort_description_names_error_kind() {
        match parameterize(RecoveryAction::Abort, &signature(), &RecoveryContext::new()) {
            ActionParams::Abort { description, .. } => {
                assert!(description.contains("auth_error"));
            }
            other => panic!("unexpected params: {:?}", other),
        }
    }

    #[test]
    fn unknown_action_name_is_an_error() {
        let err =
            parameterize_by_name("reformat_disk", &signature(), &RecoveryContext::new())
                .unwrap_err();
        assert!(matches!(err, MedicError::UnknownAction(_)));
    }

    #[test]
    fn known_action_name_resolves() {
        let params =
            parameterize_by_name("retry_clean", &signature(), &RecoveryContext::new()).unwrap();
        assert!(matches!(params, ActionParams::RetryClean { .. }));
    }
}
