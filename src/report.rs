//! Run outcome reporting.
//!
//! The sideband through which personas mark an HTTP call's outcome
//! independently of its transport status. Every soft failure, token failure
//! and transport error is counted, logged, and kept with its reason so the
//! end-of-run summary can show what was attempted versus what was observed.
//! A configuration skip is not a failure; it is counted separately and
//! logged at informational level.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

/// Maximum failure detail records kept in memory; counters keep counting
/// past this.
const MAX_FAILURE_RECORDS: usize = 1000;

/// One recorded failure with its attempted action and observed detail.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    /// What the persona was trying to do
    pub action: String,
    /// Expected condition and observed actual value
    pub reason: String,
}

/// Serializable summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub successes: u64,
    pub soft_failures: u64,
    pub token_failures: u64,
    pub transport_errors: u64,
    pub skips: u64,
    pub failures: Vec<FailureRecord>,
}

/// Shared outcome recorder; one per run, cloned behind an Arc into every
/// virtual user.
#[derive(Debug)]
pub struct Reporter {
    started_at: DateTime<Utc>,
    successes: AtomicU64,
    soft_failures: AtomicU64,
    token_failures: AtomicU64,
    transport_errors: AtomicU64,
    skips: AtomicU64,
    failures: Mutex<Vec<FailureRecord>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            successes: AtomicU64::new(0),
            soft_failures: AtomicU64::new(0),
            token_failures: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            skips: AtomicU64::new(0),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Record a call that met its expectation.
    pub fn record_success(&self, action: &str) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(action, "step succeeded");
    }

    /// Record a completed call that missed its expectation.
    pub fn record_soft_failure(&self, action: &str, reason: &str) {
        self.soft_failures.fetch_add(1, Ordering::Relaxed);
        warn!(action, reason, "soft failure");
        self.push_failure(action, reason);
    }

    /// Record a token fetch that did not yield a token.
    pub fn record_token_failure(&self, action: &str, reason: &str) {
        self.token_failures.fetch_add(1, Ordering::Relaxed);
        warn!(action, reason, "token fetch failed");
        self.push_failure(action, reason);
    }

    /// Record a network/timeout failure.
    pub fn record_transport_error(&self, action: &str, reason: &str) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
        warn!(action, reason, "transport error");
        self.push_failure(action, reason);
    }

    /// Record a step intentionally skipped by configuration.
    pub fn record_skip(&self, action: &str, reason: &str) {
        self.skips.fetch_add(1, Ordering::Relaxed);
        info!(action, reason, "step skipped");
    }

    fn push_failure(&self, action: &str, reason: &str) {
        let mut failures = self.failures.lock();
        if failures.len() < MAX_FAILURE_RECORDS {
            failures.push(FailureRecord {
                action: action.to_string(),
                reason: reason.to_string(),
            });
        }
    }

    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn soft_failures(&self) -> u64 {
        self.soft_failures.load(Ordering::Relaxed)
    }

    pub fn token_failures(&self) -> u64 {
        self.token_failures.load(Ordering::Relaxed)
    }

    pub fn transport_errors(&self) -> u64 {
        self.transport_errors.load(Ordering::Relaxed)
    }

    pub fn skips(&self) -> u64 {
        self.skips.load(Ordering::Relaxed)
    }

    /// Snapshot the current counters and failure details.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            started_at: self.started_at,
            successes: self.successes(),
            soft_failures: self.soft_failures(),
            token_failures: self.token_failures(),
            transport_errors: self.transport_errors(),
            skips: self.skips(),
            failures: self.failures.lock().clone(),
        }
    }

    /// Log the end-of-run summary.
    pub fn log_summary(&self) {
        let summary = self.summary();
        info!(
            successes = summary.successes,
            soft_failures = summary.soft_failures,
            token_failures = summary.token_failures,
            transport_errors = summary.transport_errors,
            skips = summary.skips,
            "Run finished"
        );
        for failure in summary.failures.iter().take(20) {
            info!(action = %failure.action, reason = %failure.reason, "recorded failure");
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
