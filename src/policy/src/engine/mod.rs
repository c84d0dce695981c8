//! Resolution engine
//!
//! Builds the effective check of every catalog rule once (deprecation merge, alias
//! overrides, `rule:` inlining) and answers authorization requests against them.
//!
//! # Pipeline
//!
//! ```text
//! authorize(rule, ctx) → lookup → scope check → effective check → Decision
//!                           ↓          ↓ (deny, check skipped)        ↓
//!                      UnknownRule   ScopeMismatch               [Metrics]
//! ```

pub mod advisory;
pub mod decision;
mod merge;
pub mod metrics;
mod resolve;

pub use advisory::{AdvisorySink, DeprecationNotice, TracingAdvisorySink};
pub use decision::{Decision, DenyReason};
pub use metrics::EnforcerMetrics;

use crate::catalog::Catalog;
use crate::check::CheckExpression;
use crate::config::EnforcerConfig;
use crate::error::{PolicyError, Result};
use crate::overrides::{FileOverrideSource, OverrideSource, OverrideTable};
use crate::types::RequestContext;
use advisory::AdvisoryLog;
use metrics::MetricsCollector;
use resolve::ReferenceResolver;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Enforcer construction
///
/// All validation happens in [`EnforcerBuilder::build`]; a builder that fails leaves
/// nothing behind.
pub struct EnforcerBuilder {
    catalog: Arc<Catalog>,
    overrides: OverrideTable,
    aliases: BTreeMap<String, CheckExpression>,
    config: EnforcerConfig,
    sink: Arc<dyn AdvisorySink>,
}

impl EnforcerBuilder {
    pub fn new(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            overrides: OverrideTable::new(),
            aliases: BTreeMap::new(),
            config: EnforcerConfig::default(),
            sink: Arc::new(TracingAdvisorySink),
        }
    }

    /// Operator overrides
    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.overrides = overrides;
        self
    }

    /// Named base rule that checks may reference as `rule:<name>`
    pub fn with_alias(mut self, name: impl Into<String>, check: CheckExpression) -> Self {
        self.aliases.insert(name.into(), check);
        self
    }

    pub fn with_aliases<I, K>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, CheckExpression)>,
        K: Into<String>,
    {
        self.aliases
            .extend(aliases.into_iter().map(|(name, check)| (name.into(), check)));
        self
    }

    pub fn with_config(mut self, config: EnforcerConfig) -> Self {
        self.config = config;
        self
    }

    /// Receiver for deprecation advisories (default: `tracing` warnings)
    pub fn with_advisory_sink(mut self, sink: Arc<dyn AdvisorySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the overrides with the contents of `source`
    pub async fn load_overrides(mut self, source: &dyn OverrideSource) -> Result<Self> {
        self.overrides = source.load().await?;
        Ok(self)
    }

    /// Load overrides from the configured policy file, if any
    pub async fn load_configured_overrides(self) -> Result<Self> {
        match self.config.policy_file.clone() {
            Some(path) => {
                let source = FileOverrideSource::new(path)?;
                self.load_overrides(&source).await
            }
            None => Ok(self),
        }
    }

    /// Validate the inputs and compute every effective check
    ///
    /// # Errors
    ///
    /// - [`PolicyError::DuplicateRuleName`] if an alias shadows a catalog rule
    /// - [`PolicyError::UnknownOverrideTarget`] if an override names nothing known
    /// - [`PolicyError::CyclicRuleReference`] if `rule:` references loop
    /// - [`PolicyError::InvalidRule`] if a check references an undefined name, uses a
    ///   name that cannot be written as a check string, or expands past the size limits
    ///
    /// Every legacy override detected is reported to the advisory sink once, here.
    pub fn build(self) -> Result<Enforcer> {
        let catalog = self.catalog;

        for name in self.aliases.keys() {
            if !CheckExpression::is_valid_name(name) {
                return Err(PolicyError::InvalidRule(format!(
                    "Alias name '{}' cannot be referenced as rule:{}",
                    name, name
                )));
            }
            if catalog.contains(name) {
                return Err(PolicyError::DuplicateRuleName {
                    name: name.clone(),
                    first: "catalog".to_string(),
                    second: "aliases".to_string(),
                });
            }
        }

        for (name, check) in &self.aliases {
            if let Some(bad) = check.malformed_name() {
                return Err(PolicyError::InvalidRule(format!(
                    "Alias '{}' uses '{}', which cannot be written as a check string",
                    name, bad
                )));
            }
        }

        let deprecated = catalog.deprecated_names();
        for (name, check) in self.overrides.iter() {
            if !catalog.contains(name)
                && !deprecated.contains(name)
                && !self.aliases.contains_key(name)
            {
                return Err(PolicyError::UnknownOverrideTarget(name.to_string()));
            }
            if let Some(bad) = check.malformed_name() {
                return Err(PolicyError::InvalidRule(format!(
                    "Override for '{}' uses '{}', which cannot be written as a check string",
                    name, bad
                )));
            }
        }

        let mut sources: BTreeMap<String, CheckExpression> = BTreeMap::new();
        for (name, default) in &self.aliases {
            let check = self.overrides.get(name).unwrap_or(default);
            sources.insert(name.clone(), check.clone());
        }

        let mut notices = HashMap::new();
        for rule in catalog.iter() {
            let outcome = merge::merge(rule, &self.overrides, self.config.enforce_new_defaults);
            if let Some(notice) = outcome.notice {
                debug!("Legacy override detected for {}", rule.name);
                notices.insert(rule.name.clone(), notice);
            }
            sources.insert(rule.name.clone(), outcome.check);
        }

        let mut effective = ReferenceResolver::new(&sources).resolve_all()?;
        effective.retain(|name, _| catalog.contains(name));

        info!(
            "Enforcer built: {} rules, {} aliases, {} overrides, {} legacy overrides, enforce_new_defaults={}",
            catalog.len(),
            self.aliases.len(),
            self.overrides.len(),
            notices.len(),
            self.config.enforce_new_defaults
        );

        let advisories = AdvisoryLog::new(self.sink);
        let mut pending: Vec<&DeprecationNotice> = notices.values().collect();
        pending.sort_by(|a, b| a.rule.cmp(&b.rule));
        for notice in pending {
            advisories.notify_once(notice);
        }

        Ok(Enforcer {
            catalog,
            effective,
            notices,
            advisories,
            metrics: MetricsCollector::default(),
            config: self.config,
        })
    }
}

/// Deprecation-aware policy enforcer
///
/// Read-only after construction apart from the decision counters, so it can be shared
/// across request handlers behind an `Arc`.
pub struct Enforcer {
    /// Rule definitions
    catalog: Arc<Catalog>,

    /// rule name -> resolved effective check
    effective: HashMap<String, CheckExpression>,

    /// Rules whose effective check involved a legacy override
    notices: HashMap<String, DeprecationNotice>,

    /// Advisories already reported
    advisories: AdvisoryLog,

    /// Decision counters
    metrics: MetricsCollector,

    config: EnforcerConfig,
}

impl Enforcer {
    pub fn builder(catalog: impl Into<Arc<Catalog>>) -> EnforcerBuilder {
        EnforcerBuilder::new(catalog)
    }

    /// Authorize a request against a rule
    ///
    /// 1. Look up the rule (`UnknownRule` if absent)
    /// 2. Deny with `ScopeMismatch` if the token scope is not accepted; the check is
    ///    not evaluated
    /// 3. Evaluate the effective check; deny with `CheckFailed` unless it passes
    pub fn authorize(&self, rule_name: &str, ctx: &RequestContext) -> Result<Decision> {
        let rule = self.catalog.lookup(rule_name)?;

        let decision = if !rule.allows_scope(ctx.scope_type) {
            debug!(
                "Scope mismatch for {}: {} not in {:?}",
                rule_name, ctx.scope_type, rule.scope_types
            );
            Decision::Deny(DenyReason::ScopeMismatch {
                requested: ctx.scope_type,
                allowed: rule.scope_types.iter().copied().collect(),
            })
        } else {
            let check = self.effective_check(rule_name)?;
            if check.evaluate(ctx) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::CheckFailed)
            }
        };

        debug!(
            "Decision for {}: {}",
            rule_name,
            if decision.is_allowed() { "ALLOW" } else { "DENY" }
        );

        self.metrics.record(&decision);
        Ok(decision)
    }

    /// Like [`Enforcer::authorize`], with a denial turned into [`PolicyError::Forbidden`]
    pub fn enforce(&self, rule_name: &str, ctx: &RequestContext) -> Result<()> {
        match self.authorize(rule_name, ctx)? {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(PolicyError::Forbidden {
                rule: rule_name.to_string(),
                reason: reason.to_string(),
            }),
        }
    }

    /// Resolved check that governs `rule_name`
    pub fn effective_check(&self, rule_name: &str) -> Result<&CheckExpression> {
        self.effective
            .get(rule_name)
            .ok_or_else(|| PolicyError::UnknownRule(rule_name.to_string()))
    }

    /// Legacy override notices, in rule name order
    pub fn deprecation_notices(&self) -> Vec<&DeprecationNotice> {
        let mut notices: Vec<&DeprecationNotice> = self.notices.values().collect();
        notices.sort_by(|a, b| a.rule.cmp(&b.rule));
        notices
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EnforcerConfig {
        &self.config
    }

    /// Decision counters
    pub fn metrics(&self) -> EnforcerMetrics {
        self.metrics.snapshot()
    }

    /// Number of rules an advisory has been emitted for
    pub fn advisories_emitted(&self) -> usize {
        self.advisories.warned_count()
    }
}
