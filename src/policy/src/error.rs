//! Error types for the policy registry

use thiserror::Error;

/// Policy registry errors
///
/// Everything except [`PolicyError::Forbidden`] is raised while the catalog or the
/// enforcer is being built and is fatal to startup. Request-time denials are ordinary
/// [`crate::Decision`] values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Two rules share a name
    #[error("Duplicate rule name: {name} (registered by {first} and {second})")]
    DuplicateRuleName {
        name: String,
        first: String,
        second: String,
    },

    /// Rule not present in the catalog
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    /// Operator override targets a name that is neither a rule, a deprecated rule nor an alias
    #[error("Override targets unknown rule: {0}")]
    UnknownOverrideTarget(String),

    /// `rule:` references form a cycle
    #[error("Cyclic rule reference: {0}")]
    CyclicRuleReference(String),

    /// Invalid rule definition
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Check string could not be parsed
    #[error("Invalid check expression `{text}`: {message}")]
    InvalidExpression { text: String, message: String },

    /// Scope name outside the known vocabulary
    #[error("Unknown scope type: {0}")]
    UnknownScopeType(String),

    /// Request denied by [`crate::Enforcer::enforce`]
    #[error("Policy {rule} does not allow this request: {reason}")]
    Forbidden { rule: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while loading overrides
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PolicyError {
    fn from(err: std::io::Error) -> Self {
        PolicyError::Io(err.to_string())
    }
}

impl PolicyError {
    pub(crate) fn invalid_expression(text: &str, message: impl Into<String>) -> Self {
        PolicyError::InvalidExpression {
            text: text.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for policy registry operations
pub type Result<T> = std::result::Result<T, PolicyError>;
