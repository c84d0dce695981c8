//! Rule definitions

use crate::check::CheckExpression;
use crate::error::{PolicyError, Result};
use crate::types::{Method, Operation, Release, ScopeType};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9_]+$").expect("static pattern is valid"))
}

/// Namespaced rule name (`<namespace>:<operation>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleName(String);

impl RuleName {
    /// Combine a namespace and an operation suffix
    ///
    /// Both segments must match `[a-z0-9_]+`.
    pub fn new(namespace: &str, operation: &str) -> Result<Self> {
        for (label, segment) in [("namespace", namespace), ("operation", operation)] {
            if !segment_pattern().is_match(segment) {
                return Err(PolicyError::InvalidRule(format!(
                    "{} `{}` must match [a-z0-9_]+",
                    label, segment
                )));
            }
        }
        Ok(Self(format!("{}:{}", namespace, operation)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RuleName> for String {
    fn from(name: RuleName) -> Self {
        name.0
    }
}

/// Prior rule that a rule supersedes
///
/// Attached when the rule is authored. The enforcer consults it only to decide whether
/// an operator override of the prior name must be merged into the new default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationInfo {
    /// Name of the superseded rule (may equal the new rule's name)
    pub prior_name: String,

    /// Check the superseded rule used by default
    pub prior_check: CheckExpression,

    /// Release that introduced the new default
    pub since: Release,

    /// Operator-facing explanation
    pub reason: String,
}

impl DeprecationInfo {
    pub fn new(
        prior_name: impl Into<String>,
        prior_check: CheckExpression,
        since: Release,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            prior_name: prior_name.into(),
            prior_check,
            since,
            reason: reason.into(),
        }
    }
}

/// Named authorization rule for one protected operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Globally unique name (e.g., "identity:get_endpoint")
    pub name: String,

    /// Default check
    pub check: CheckExpression,

    /// Scope types a request may carry
    pub scope_types: BTreeSet<ScopeType>,

    /// Human-readable description
    pub description: String,

    /// API operations governed by this rule
    pub operations: Vec<Operation>,

    /// Deprecated rule this one replaces
    pub deprecation: Option<DeprecationInfo>,
}

impl Rule {
    /// Create a rule with no scope types or operations yet
    pub fn new(
        name: impl Into<String>,
        check: CheckExpression,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            check,
            scope_types: BTreeSet::new(),
            description: description.into(),
            operations: Vec::new(),
            deprecation: None,
        }
    }

    /// Add allowed scope types
    pub fn with_scope_types(mut self, scope_types: impl IntoIterator<Item = ScopeType>) -> Self {
        self.scope_types.extend(scope_types);
        self
    }

    /// Append a documented API operation
    pub fn with_operation(mut self, method: Method, path: impl Into<String>) -> Self {
        self.operations.push(Operation::new(method, path));
        self
    }

    /// Mark this rule as replacing a deprecated one
    pub fn deprecates(mut self, info: DeprecationInfo) -> Self {
        self.deprecation = Some(info);
        self
    }

    /// Whether a request of `scope_type` may be evaluated against this rule
    pub fn allows_scope(&self, scope_type: ScopeType) -> bool {
        self.scope_types.contains(&scope_type)
    }

    /// Validate the rule definition
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PolicyError::InvalidRule(
                "Rule name cannot be empty".to_string(),
            ));
        }

        if self.scope_types.is_empty() {
            return Err(PolicyError::InvalidRule(format!(
                "Rule '{}' must allow at least one scope type",
                self.name
            )));
        }

        if let Some(name) = self.check.malformed_name() {
            return Err(PolicyError::InvalidRule(format!(
                "Rule '{}' uses '{}', which cannot be written as a check string",
                self.name, name
            )));
        }

        if let Some(deprecation) = &self.deprecation {
            if let Some(name) = deprecation.prior_check.malformed_name() {
                return Err(PolicyError::InvalidRule(format!(
                    "Rule '{}' deprecates a check using '{}', which cannot be written as a check string",
                    self.name, name
                )));
            }
            if deprecation.prior_name.trim().is_empty() {
                return Err(PolicyError::InvalidRule(format!(
                    "Rule '{}' deprecates a rule with an empty name",
                    self.name
                )));
            }
            if deprecation.reason.trim().is_empty() {
                return Err(PolicyError::InvalidRule(format!(
                    "Rule '{}' must give a deprecation reason",
                    self.name
                )));
            }
        }

        Ok(())
    }
}
