//! Deprecation merge
//!
//! Computes a rule's effective (still unresolved) check from its definition and the
//! operator override table. Pure: no logging, no shared state.

use super::advisory::DeprecationNotice;
use crate::check::CheckExpression;
use crate::overrides::OverrideTable;
use crate::rule::Rule;

/// Effective check of one rule plus the advisory it owes, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergeOutcome {
    pub(crate) check: CheckExpression,
    pub(crate) notice: Option<DeprecationNotice>,
}

impl MergeOutcome {
    fn plain(check: CheckExpression) -> Self {
        Self {
            check,
            notice: None,
        }
    }
}

/// Resolve which check governs `rule`
///
/// - no deprecation: the operator's override of the rule, else its default
/// - deprecated under a different name and the new name is overridden: that override
/// - prior name overridden: `new default OR legacy override`, or just the new default
///   when `enforce_new_defaults` is set
/// - otherwise: the new default
pub(crate) fn merge(rule: &Rule, overrides: &OverrideTable, enforce_new_defaults: bool) -> MergeOutcome {
    let Some(deprecation) = &rule.deprecation else {
        return MergeOutcome::plain(
            overrides
                .get(&rule.name)
                .cloned()
                .unwrap_or_else(|| rule.check.clone()),
        );
    };

    if deprecation.prior_name != rule.name {
        if let Some(adopted) = overrides.get(&rule.name) {
            return MergeOutcome::plain(adopted.clone());
        }
    }

    let Some(legacy) = overrides.get(&deprecation.prior_name) else {
        return MergeOutcome::plain(rule.check.clone());
    };

    let notice = DeprecationNotice {
        rule: rule.name.clone(),
        prior_name: deprecation.prior_name.clone(),
        since: deprecation.since.clone(),
        reason: deprecation.reason.clone(),
        override_ignored: enforce_new_defaults,
    };

    let check = if enforce_new_defaults {
        rule.check.clone()
    } else {
        CheckExpression::or(vec![rule.check.clone(), legacy.clone()])
    };

    MergeOutcome {
        check,
        notice: Some(notice),
    }
}
