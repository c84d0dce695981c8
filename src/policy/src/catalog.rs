//! Rule catalog
//!
//! The catalog is the complete, validated set of rules an enforcer may evaluate. It is
//! assembled once from independently authored [`RuleGroup`]s and never changes
//! afterwards.

use crate::error::{PolicyError, Result};
use crate::rule::Rule;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Source of rules for one resource type (e.g., endpoints, service providers)
pub trait RuleGroup {
    /// Group name used in duplicate-name errors
    fn name(&self) -> &str;

    /// Rules the group contributes
    fn list_rules(&self) -> Vec<Rule>;
}

/// Plain named list of rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

impl RuleGroup for RuleSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_rules(&self) -> Vec<Rule> {
        self.rules.clone()
    }
}

impl<G: RuleGroup + ?Sized> RuleGroup for &G {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list_rules(&self) -> Vec<Rule> {
        (**self).list_rules()
    }
}

impl<G: RuleGroup + ?Sized> RuleGroup for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list_rules(&self) -> Vec<Rule> {
        (**self).list_rules()
    }
}

/// Incremental catalog construction
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    /// rule name -> (rule, registering group)
    rules: BTreeMap<String, (Rule, String)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule outside of any named group
    pub fn register(&mut self, rule: Rule) -> Result<()> {
        self.register_from("<direct>", rule)
    }

    /// Register a rule on behalf of `group`
    ///
    /// # Errors
    ///
    /// - [`PolicyError::InvalidRule`] if the rule fails validation
    /// - [`PolicyError::DuplicateRuleName`] if the name is already registered
    pub fn register_from(&mut self, group: &str, rule: Rule) -> Result<()> {
        rule.validate()?;

        if let Some((_, first)) = self.rules.get(&rule.name) {
            return Err(PolicyError::DuplicateRuleName {
                name: rule.name.clone(),
                first: first.clone(),
                second: group.to_string(),
            });
        }

        debug!("Registered rule {} from {}", rule.name, group);
        self.rules.insert(rule.name.clone(), (rule, group.to_string()));
        Ok(())
    }

    pub fn build(self) -> Catalog {
        let rules: BTreeMap<String, Rule> = self
            .rules
            .into_iter()
            .map(|(name, (rule, _))| (name, rule))
            .collect();

        info!("Rule catalog built with {} rules", rules.len());
        Catalog { rules }
    }
}

/// Immutable name -> rule mapping
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rules: BTreeMap<String, Rule>,
}

impl Catalog {
    /// Aggregate rule groups into a catalog
    ///
    /// Rules are sorted by `(rule name, group name)` before registration, so the
    /// duplicate reported on failure is the same whatever order the groups come in.
    /// Nothing is returned unless every rule registers.
    pub fn from_groups<I, G>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = G>,
        G: RuleGroup,
    {
        let mut pending: Vec<(String, Rule)> = Vec::new();
        for group in groups {
            let group_name = group.name().to_string();
            pending.extend(
                group
                    .list_rules()
                    .into_iter()
                    .map(|rule| (group_name.clone(), rule)),
            );
        }

        pending.sort_by(|(group_a, rule_a), (group_b, rule_b)| {
            rule_a
                .name
                .cmp(&rule_b.name)
                .then_with(|| group_a.cmp(group_b))
        });

        let mut builder = CatalogBuilder::new();
        for (group, rule) in pending {
            builder.register_from(&group, rule)?;
        }

        Ok(builder.build())
    }

    /// Look up a rule by name
    pub fn lookup(&self, name: &str) -> Result<&Rule> {
        self.rules
            .get(name)
            .ok_or_else(|| PolicyError::UnknownRule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in name order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    /// Names of rules superseded by catalog rules
    pub fn deprecated_names(&self) -> BTreeSet<&str> {
        self.rules
            .values()
            .filter_map(|rule| rule.deprecation.as_ref())
            .map(|d| d.prior_name.as_str())
            .collect()
    }
}
