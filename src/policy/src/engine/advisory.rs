//! Deprecation advisories
//!
//! When an operator override of a deprecated rule is merged (or ignored under
//! `enforce_new_defaults`), the operator is told once per rule when the enforcer is
//! built, whether or not the rule is ever requested.

use crate::types::Release;
use dashmap::DashSet;
use std::sync::Arc;
use tracing::warn;

/// Details of one detected legacy override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationNotice {
    /// Rule whose effective check is affected
    pub rule: String,

    /// Deprecated name the operator overrode
    pub prior_name: String,

    /// Release that deprecated the prior rule
    pub since: Release,

    /// Deprecation reason from the rule definition
    pub reason: String,

    /// Override was dropped because new defaults are enforced
    pub override_ignored: bool,
}

impl DeprecationNotice {
    /// Operator-facing advisory text
    pub fn message(&self) -> String {
        if self.override_ignored {
            format!(
                "Policy \"{}\" was deprecated in {} in favor of \"{}\". Your override of \"{}\" \
                 is ignored because new defaults are enforced. Reason: {}",
                self.prior_name,
                self.since,
                self.rule,
                self.prior_name,
                self.reason.trim()
            )
        } else {
            format!(
                "Policy \"{}\" was deprecated in {} in favor of \"{}\". Your override of \"{}\" \
                 is OR'd with the new default until it is updated. Reason: {}",
                self.prior_name,
                self.since,
                self.rule,
                self.prior_name,
                self.reason.trim()
            )
        }
    }
}

/// Receiver of deprecation advisories
pub trait AdvisorySink: Send + Sync {
    fn deprecated_override(&self, notice: &DeprecationNotice);
}

/// Emits advisories as `tracing` warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAdvisorySink;

impl AdvisorySink for TracingAdvisorySink {
    fn deprecated_override(&self, notice: &DeprecationNotice) {
        warn!(
            rule = %notice.rule,
            prior = %notice.prior_name,
            since = %notice.since,
            "{}",
            notice.message()
        );
    }
}

/// Process-wide record of which rules have already been warned about
pub(crate) struct AdvisoryLog {
    warned: DashSet<String>,
    sink: Arc<dyn AdvisorySink>,
}

impl AdvisoryLog {
    pub(crate) fn new(sink: Arc<dyn AdvisorySink>) -> Self {
        Self {
            warned: DashSet::new(),
            sink,
        }
    }

    /// Forward `notice` to the sink unless this rule was already reported
    ///
    /// `DashSet::insert` is the atomic check-and-set, so concurrent callers produce
    /// exactly one advisory.
    pub(crate) fn notify_once(&self, notice: &DeprecationNotice) -> bool {
        if self.warned.insert(notice.rule.clone()) {
            self.sink.deprecated_override(notice);
            true
        } else {
            false
        }
    }

    pub(crate) fn warned_count(&self) -> usize {
        self.warned.len()
    }
}
