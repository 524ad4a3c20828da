//! Response classification.
//!
//! The platform signals the outcome of a form submission through the URL it
//! redirects to (a successful login lands in the projects area, a failed one
//! back on the login page), so success is decided by a declarative
//! expectation over the final URL and status rather than per-call-site
//! string matching. A missed expectation is a soft failure: it is reported
//! with expected-versus-observed detail and blocks the dependent steps of
//! the persona, but never raises.

use std::fmt;

use crate::http::CompletedCall;

// ─────────────────────────────────────────────────────────────────
// Expectation
// ─────────────────────────────────────────────────────────────────

/// Declarative success predicate for one HTTP call.
#[derive(Debug, Clone, Default)]
pub struct Expectation {
    action: String,
    url_contains: Option<String>,
    url_lacks: Option<String>,
    require_status_ok: bool,
}

impl Expectation {
    /// Start an expectation for a named action; the name is echoed in
    /// failure reasons.
    pub fn for_action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    /// Require the final URL to contain `needle`.
    pub fn url_contains(mut self, needle: impl Into<String>) -> Self {
        self.url_contains = Some(needle.into());
        self
    }

    /// Require the final URL to NOT contain `needle`.
    pub fn url_lacks(mut self, needle: impl Into<String>) -> Self {
        self.url_lacks = Some(needle.into());
        self
    }

    /// Require a 2xx final status.
    pub fn require_status_ok(mut self) -> Self {
        self.require_status_ok = true;
        self
    }

    /// The action label this expectation belongs to.
    pub fn action(&self) -> &str {
        &self.action
    }
}

// ─────────────────────────────────────────────────────────────────
// Verdict
// ─────────────────────────────────────────────────────────────────

/// Outcome of classifying a completed call against an expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The call satisfied its expectation.
    Success,
    /// The call completed but missed its expectation; the reason carries
    /// expected and observed detail.
    SoftFailure(String),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }

    /// Failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Success => None,
            Verdict::SoftFailure(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Success => write!(f, "success"),
            Verdict::SoftFailure(reason) => write!(f, "soft failure: {}", reason),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Classifier
// ─────────────────────────────────────────────────────────────────

/// Evaluate a completed call against its expectation.
pub fn classify(call: &CompletedCall, expect: &Expectation) -> Verdict {
    if expect.require_status_ok && !call.status.is_success() {
        return Verdict::SoftFailure(format!(
            "{}: expected a success status, got {} at URL {}",
            expect.action, call.status, call.final_url
        ));
    }

    if let Some(ref needle) = expect.url_contains {
        if !call.final_url.contains(needle.as_str()) {
            return Verdict::SoftFailure(format!(
                "{}: expected final URL to contain '{}', got '{}' (status {})",
                expect.action, needle, call.final_url, call.status
            ));
        }
    }

    if let Some(ref needle) = expect.url_lacks {
        if call.final_url.contains(needle.as_str()) {
            return Verdict::SoftFailure(format!(
                "{}: expected final URL to not contain '{}', got '{}' (status {})",
                expect.action, needle, call.final_url, call.status
            ));
        }
    }

    Verdict::Success
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
