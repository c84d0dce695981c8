//! Check expressions
//!
//! A [`CheckExpression`] is an immutable boolean predicate over a
//! [`RequestContext`]. Expressions are trees: combinators own their children, so a
//! value can never refer back to itself. Named references (`rule:<name>`) are the one
//! indirection; the enforcer inlines them when it is built.
//!
//! Expressions are written in check-string syntax:
//!
//! ```text
//! role:reader and system_scope:all
//! rule:admin_required or (role:member and not scope:domain)
//! ```

mod parser;

use crate::error::{PolicyError, Result};
use crate::types::{RequestContext, ScopeType};
use std::fmt;
use std::str::FromStr;

/// Deepest nesting accepted in a check string or an inlined effective check
pub(crate) const MAX_DEPTH: usize = 128;

/// Largest effective check, in nodes, an enforcer will build
pub(crate) const MAX_NODES: usize = 10_000;

/// Boolean predicate over request identity attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CheckExpression {
    /// Constant result (`@` is true, `!` is false)
    Literal(bool),

    /// Request must hold the role (exact, case-sensitive)
    RoleRequired(String),

    /// Request must be issued for the scope type
    ScopeIs(ScopeType),

    /// All children must pass; empty is true
    And(Vec<CheckExpression>),

    /// Any child must pass; empty is false
    Or(Vec<CheckExpression>),

    /// Negation
    Not(Box<CheckExpression>),

    /// Reference to a named rule or alias, inlined at enforcer build
    RuleRef(String),
}

impl CheckExpression {
    /// Always passes
    pub fn always() -> Self {
        CheckExpression::Literal(true)
    }

    /// Never passes
    pub fn never() -> Self {
        CheckExpression::Literal(false)
    }

    /// Role check. The name must satisfy [`CheckExpression::is_valid_name`] for the
    /// expression to be accepted by a catalog or enforcer.
    pub fn role(name: impl Into<String>) -> Self {
        CheckExpression::RoleRequired(name.into())
    }

    pub fn scope(scope_type: ScopeType) -> Self {
        CheckExpression::ScopeIs(scope_type)
    }

    pub fn rule(name: impl Into<String>) -> Self {
        CheckExpression::RuleRef(name.into())
    }

    pub fn and(children: Vec<CheckExpression>) -> Self {
        CheckExpression::And(children)
    }

    pub fn or(children: Vec<CheckExpression>) -> Self {
        CheckExpression::Or(children)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: CheckExpression) -> Self {
        CheckExpression::Not(Box::new(inner))
    }

    /// Parse check-string syntax
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse(text)
    }

    /// Evaluate against a request context
    ///
    /// Pure and total. Unresolved `RuleRef`s evaluate to false.
    pub fn evaluate(&self, ctx: &RequestContext) -> bool {
        match self {
            CheckExpression::Literal(value) => *value,
            CheckExpression::RoleRequired(role) => ctx.has_role(role),
            CheckExpression::ScopeIs(scope_type) => ctx.scope_type == *scope_type,
            CheckExpression::And(children) => children.iter().all(|c| c.evaluate(ctx)),
            CheckExpression::Or(children) => children.iter().any(|c| c.evaluate(ctx)),
            CheckExpression::Not(inner) => !inner.evaluate(ctx),
            CheckExpression::RuleRef(_) => false,
        }
    }

    /// Names referenced through `rule:`, in order of appearance
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            CheckExpression::RuleRef(name) => names.push(name),
            CheckExpression::And(children) | CheckExpression::Or(children) => {
                for child in children {
                    child.collect_references(names);
                }
            }
            CheckExpression::Not(inner) => inner.collect_references(names),
            _ => {}
        }
    }

    /// Whether the expression contains no `rule:` references
    pub fn is_resolved(&self) -> bool {
        self.references().is_empty()
    }

    /// Whether `name` can follow `role:` or `rule:` in check-string syntax
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c == '(' || c == ')')
    }

    /// First role or rule name that would not render back to the same check
    pub fn malformed_name(&self) -> Option<&str> {
        match self {
            CheckExpression::RoleRequired(name) | CheckExpression::RuleRef(name) => {
                (!Self::is_valid_name(name)).then_some(name.as_str())
            }
            CheckExpression::And(children) | CheckExpression::Or(children) => {
                children.iter().find_map(CheckExpression::malformed_name)
            }
            CheckExpression::Not(inner) => inner.malformed_name(),
            _ => None,
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        match self {
            CheckExpression::And(children) | CheckExpression::Or(children) => {
                1 + children.iter().map(CheckExpression::node_count).sum::<usize>()
            }
            CheckExpression::Not(inner) => 1 + inner.node_count(),
            _ => 1,
        }
    }

    /// Length of the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        match self {
            CheckExpression::And(children) | CheckExpression::Or(children) => {
                1 + children.iter().map(CheckExpression::depth).max().unwrap_or(0)
            }
            CheckExpression::Not(inner) => 1 + inner.depth(),
            _ => 1,
        }
    }

    /// Replace every `rule:` reference using `lookup`
    pub(crate) fn substitute<F>(&self, lookup: &mut F) -> Result<CheckExpression>
    where
        F: FnMut(&str) -> Result<CheckExpression>,
    {
        Ok(match self {
            CheckExpression::RuleRef(name) => lookup(name)?,
            CheckExpression::And(children) => CheckExpression::And(
                children
                    .iter()
                    .map(|c| c.substitute(lookup))
                    .collect::<Result<Vec<_>>>()?,
            ),
            CheckExpression::Or(children) => CheckExpression::Or(
                children
                    .iter()
                    .map(|c| c.substitute(lookup))
                    .collect::<Result<Vec<_>>>()?,
            ),
            CheckExpression::Not(inner) => CheckExpression::not(inner.substitute(lookup)?),
            other => other.clone(),
        })
    }

    /// And/Or with more than one child; needs parentheses as an operand
    fn is_compound(&self) -> bool {
        match self {
            CheckExpression::And(children) | CheckExpression::Or(children) => {
                match children.as_slice() {
                    [] => false,
                    [only] => only.is_compound(),
                    _ => true,
                }
            }
            _ => false,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_compound() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }

    fn fmt_joined(
        f: &mut fmt::Formatter<'_>,
        children: &[CheckExpression],
        op: &str,
        empty: &str,
    ) -> fmt::Result {
        match children {
            [] => f.write_str(empty),
            [only] => write!(f, "{}", only),
            _ => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op)?;
                    }
                    child.fmt_operand(f)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for CheckExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckExpression::Literal(true) => f.write_str("@"),
            CheckExpression::Literal(false) => f.write_str("!"),
            CheckExpression::RoleRequired(role) => write!(f, "role:{}", role),
            CheckExpression::ScopeIs(ScopeType::System) => f.write_str("system_scope:all"),
            CheckExpression::ScopeIs(scope_type) => write!(f, "scope:{}", scope_type),
            CheckExpression::RuleRef(name) => write!(f, "rule:{}", name),
            CheckExpression::And(children) => Self::fmt_joined(f, children, "and", "@"),
            CheckExpression::Or(children) => Self::fmt_joined(f, children, "or", "!"),
            CheckExpression::Not(inner) => {
                f.write_str("not ")?;
                inner.fmt_operand(f)
            }
        }
    }
}

impl FromStr for CheckExpression {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
