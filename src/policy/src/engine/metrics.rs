//! Decision counters

use super::decision::{Decision, DenyReason};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of enforcer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnforcerMetrics {
    /// Total number of decisions
    pub total_decisions: u64,

    /// Allowed decisions
    pub allowed: u64,

    /// Denied before evaluation because of the token scope
    pub scope_mismatches: u64,

    /// Denied because the effective check failed
    pub check_failures: u64,
}

impl EnforcerMetrics {
    /// Fraction of decisions that allowed the request
    pub fn allow_rate(&self) -> f64 {
        if self.total_decisions == 0 {
            0.0
        } else {
            self.allowed as f64 / self.total_decisions as f64
        }
    }
}

/// Lock-free decision counters
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    total: AtomicU64,
    allowed: AtomicU64,
    scope_mismatches: AtomicU64,
    check_failures: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn record(&self, decision: &Decision) {
        self.total.fetch_add(1, Ordering::Relaxed);
        let counter = match decision {
            Decision::Allow => &self.allowed,
            Decision::Deny(DenyReason::ScopeMismatch { .. }) => &self.scope_mismatches,
            Decision::Deny(DenyReason::CheckFailed) => &self.check_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> EnforcerMetrics {
        EnforcerMetrics {
            total_decisions: self.total.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            scope_mismatches: self.scope_mismatches.load(Ordering::Relaxed),
            check_failures: self.check_failures.load(Ordering::Relaxed),
        }
    }
}
