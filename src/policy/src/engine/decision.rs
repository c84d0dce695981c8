//! Authorization decision types

use crate::types::ScopeType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of [`crate::Enforcer::authorize`]
///
/// Plain value: the same `(catalog, overrides, rule, context)` always produces an
/// equal decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    /// Request is allowed
    Allow,

    /// Request is denied
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }
}

/// Why a request was denied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DenyReason {
    /// Token scope is not one the rule accepts; the check was not evaluated
    ScopeMismatch {
        requested: ScopeType,
        allowed: Vec<ScopeType>,
    },

    /// Effective check evaluated to false
    CheckFailed,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::ScopeMismatch { requested, allowed } => {
                let allowed: Vec<&str> = allowed.iter().map(|s| s.as_str()).collect();
                write!(
                    f,
                    "{}-scoped request, rule accepts [{}]",
                    requested,
                    allowed.join(", ")
                )
            }
            DenyReason::CheckFailed => f.write_str("check failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_accessors() {
        assert!(Decision::Allow.is_allowed());
        assert!(Decision::Allow.deny_reason().is_none());

        let deny = Decision::Deny(DenyReason::CheckFailed);
        assert!(!deny.is_allowed());
        assert_eq!(deny.deny_reason(), Some(&DenyReason::CheckFailed));
    }

    #[test]
    fn test_deny_reason_display() {
        let reason = DenyReason::ScopeMismatch {
            requested: ScopeType::Project,
            allowed: vec![ScopeType::System],
        };
        assert_eq!(reason.to_string(), "project-scoped request, rule accepts [system]");
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(Decision::Deny(DenyReason::CheckFailed)).unwrap();
        assert_eq!(json["decision"], "deny");
        assert_eq!(json["reason"]["type"], "check_failed");

        let json = serde_json::to_value(Decision::Allow).unwrap();
        assert_eq!(json["decision"], "allow");
    }
}
