//! `rule:` reference resolution
//!
//! Inlines every named reference so that the checks the enforcer evaluates are plain
//! trees. Uses depth-first search with an explicit visiting stack; meeting a name that
//! is still on the stack is a cycle, reported with its full path.
//!
//! Inlining copies the referenced tree, so expansion is bounded: reference chains,
//! the depth of the result, and its node count all have fixed limits.

use crate::check::{CheckExpression, MAX_DEPTH, MAX_NODES};
use crate::error::{PolicyError, Result};
use std::collections::{BTreeMap, HashMap};

pub(crate) struct ReferenceResolver<'a> {
    /// name -> unresolved check (aliases and merged rule checks)
    sources: &'a BTreeMap<String, CheckExpression>,

    /// Fully resolved checks
    resolved: HashMap<String, CheckExpression>,

    /// Names currently being resolved, outermost first
    visiting: Vec<String>,
}

impl<'a> ReferenceResolver<'a> {
    pub(crate) fn new(sources: &'a BTreeMap<String, CheckExpression>) -> Self {
        Self {
            sources,
            resolved: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    /// Resolved check for `name`
    pub(crate) fn resolve(&mut self, name: &str) -> Result<CheckExpression> {
        if let Some(done) = self.resolved.get(name) {
            return Ok(done.clone());
        }

        if let Some(start) = self.visiting.iter().position(|n| n == name) {
            let mut cycle: Vec<&str> = self.visiting[start..].iter().map(String::as_str).collect();
            cycle.push(name);
            return Err(PolicyError::CyclicRuleReference(cycle.join(" -> ")));
        }

        let source = match self.sources.get(name) {
            Some(source) => source.clone(),
            None => {
                return Err(match self.visiting.last() {
                    Some(from) => PolicyError::InvalidRule(format!(
                        "Rule '{}' references unknown rule '{}'",
                        from, name
                    )),
                    None => PolicyError::UnknownRule(name.to_string()),
                })
            }
        };

        if self.visiting.len() >= MAX_DEPTH {
            return Err(PolicyError::InvalidRule(format!(
                "Rule '{}' is reached through more than {} nested references",
                name, MAX_DEPTH
            )));
        }

        let too_large = || {
            PolicyError::InvalidRule(format!(
                "Rule '{}' expands to more than {} checks",
                name, MAX_NODES
            ))
        };

        let mut expanded = source.node_count();
        self.visiting.push(name.to_string());
        let result = source.substitute(&mut |reference: &str| {
            let check = self.resolve(reference)?;
            expanded += check.node_count() - 1;
            if expanded > MAX_NODES {
                return Err(too_large());
            }
            Ok(check)
        });
        self.visiting.pop();

        let resolved = result?;
        if expanded > MAX_NODES {
            return Err(too_large());
        }
        if resolved.depth() > MAX_DEPTH {
            return Err(PolicyError::InvalidRule(format!(
                "Rule '{}' nests deeper than {} levels once references are inlined",
                name, MAX_DEPTH
            )));
        }
        self.resolved.insert(name.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Resolve every source
    pub(crate) fn resolve_all(mut self) -> Result<HashMap<String, CheckExpression>> {
        let sources = self.sources;
        for name in sources.keys() {
            self.resolve(name)?;
        }
        Ok(self.resolved)
    }
}
