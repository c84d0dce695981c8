//! # Policy Registry
//!
//! Named authorization rules with deprecation-aware resolution.
//!
//! ## Features
//!
//! - **Rule catalog** built once from independently authored rule groups, with
//!   deterministic duplicate detection
//! - **Check expressions** (`role:`, `rule:`, `system_scope:all`, `and`/`or`/`not`)
//! - **Scope validation** before any check is evaluated
//! - **Deprecation merge**: an operator override of a deprecated rule is OR'd with the
//!   new default, with a one-time advisory
//! - **Override files** in YAML or JSON
//! - **Sample policy generation** from the catalog
//!
//! ## Example
//!
//! ```rust
//! use policy_registry::{
//!     Catalog, CheckExpression, Enforcer, OverrideTable, RequestContext, Rule, RuleSet,
//!     ScopeType,
//! };
//!
//! # fn main() -> policy_registry::Result<()> {
//! let rules = vec![Rule::new(
//!     "identity:get_endpoint",
//!     CheckExpression::parse("role:reader and system_scope:all")?,
//!     "Show endpoint details.",
//! )
//! .with_scope_types([ScopeType::System])];
//!
//! let catalog = Catalog::from_groups([RuleSet::new("endpoints", rules)])?;
//! let enforcer = Enforcer::builder(catalog)
//!     .with_overrides(OverrideTable::new())
//!     .build()?;
//!
//! let ctx = RequestContext::system().with_role("reader");
//! assert!(enforcer.authorize("identity:get_endpoint", &ctx)?.is_allowed());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod check;
pub mod config;
pub mod docs;
pub mod engine;
pub mod error;
pub mod overrides;
pub mod rule;
pub mod types;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogBuilder, RuleGroup, RuleSet};
pub use check::CheckExpression;
pub use config::EnforcerConfig;
pub use engine::{
    AdvisorySink, Decision, DenyReason, DeprecationNotice, Enforcer, EnforcerBuilder,
    EnforcerMetrics, TracingAdvisorySink,
};
pub use error::{PolicyError, Result};
pub use overrides::{FileFormat, FileOverrideSource, InMemoryOverrideSource, OverrideSource, OverrideTable};
pub use rule::{DeprecationInfo, Rule, RuleName};
pub use types::{Method, Operation, Release, RequestContext, ScopeType, ADMIN_ROLE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
