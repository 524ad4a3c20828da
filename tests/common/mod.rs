//! Common test utilities and fixtures
//!
//! Provides fixture paths and an in-process mock transport that scripts
//! responses and records every call a persona makes.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;

use serve_loadgen::error::Result;
use serve_loadgen::http::{CompletedCall, StatusCode, Transport};

// ─────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────

/// Get the path to the test fixtures directory
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

// ─────────────────────────────────────────────────────────────────
// Recorded calls
// ─────────────────────────────────────────────────────────────────

/// One call a persona made against the mock transport.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub fields: Vec<(String, String)>,
}

impl RecordedCall {
    #[allow(dead_code)]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────
// Scripted responses
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Rule {
    method: &'static str,
    path_contains: String,
    status: StatusCode,
    final_url: String,
    body: String,
    set_cookie: Option<(String, String)>,
    /// Remaining matches; None = unlimited
    remaining: Option<usize>,
}

/// Scripted, recording transport. Rules are matched in insertion order by
/// method and path substring; unmatched calls get a plain 200 whose final
/// URL echoes the requested path.
#[derive(Debug, Default)]
pub struct MockTransport {
    rules: Mutex<Vec<Rule>>,
    cookies: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(
        self,
        method: &'static str,
        path_contains: &str,
        status: StatusCode,
        final_url: &str,
        body: &str,
        set_cookie: Option<(&str, &str)>,
        remaining: Option<usize>,
    ) -> Self {
        self.rules.lock().push(Rule {
            method,
            path_contains: path_contains.to_string(),
            status,
            final_url: final_url.to_string(),
            body: body.to_string(),
            set_cookie: set_cookie.map(|(name, value)| (name.to_string(), value.to_string())),
            remaining,
        });
        self
    }

    /// Script a GET response.
    pub fn on_get(self, path_contains: &str, status: StatusCode, final_url: &str) -> Self {
        self.rule("GET", path_contains, status, final_url, "", None, None)
    }

    /// Script a GET response that also drops a cookie into the jar, the way
    /// the platform issues its anti-forgery token.
    pub fn on_get_with_cookie(
        self,
        path_contains: &str,
        cookie_name: &str,
        cookie_value: &str,
    ) -> Self {
        self.rule(
            "GET",
            path_contains,
            StatusCode::OK,
            path_contains,
            "",
            Some((cookie_name, cookie_value)),
            None,
        )
    }

    /// Script a failing GET that issues no cookie.
    pub fn on_get_error(self, path_contains: &str, status: StatusCode) -> Self {
        self.rule("GET", path_contains, status, path_contains, "", None, None)
    }

    /// Script a POST response.
    pub fn on_post(self, path_contains: &str, status: StatusCode, final_url: &str) -> Self {
        self.rule("POST", path_contains, status, final_url, "", None, None)
    }

    /// Script a POST response that matches exactly once, with a body;
    /// used for form probes followed by a real submission to the same URL.
    pub fn on_post_once_with_body(
        self,
        path_contains: &str,
        status: StatusCode,
        final_url: &str,
        body: &str,
    ) -> Self {
        self.rule("POST", path_contains, status, final_url, body, None, Some(1))
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls matching a method and path substring.
    pub fn calls_matching(&self, method: &str, path_contains: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method && call.path.contains(path_contains))
            .cloned()
            .collect()
    }

    fn respond(
        &self,
        method: &'static str,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> CompletedCall {
        self.calls.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            fields,
        });

        let mut rules = self.rules.lock();
        for rule in rules.iter_mut() {
            if rule.method != method || !path.contains(&rule.path_contains) {
                continue;
            }
            if let Some(remaining) = rule.remaining.as_mut() {
                if *remaining == 0 {
                    continue;
                }
                *remaining -= 1;
            }
            if let Some((name, value)) = &rule.set_cookie {
                self.cookies.lock().insert(name.clone(), value.clone());
            }
            return CompletedCall::new(rule.status, rule.final_url.clone(), rule.body.clone());
        }

        CompletedCall::new(StatusCode::OK, path, "")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<CompletedCall> {
        Ok(self.respond("GET", path, Vec::new()))
    }

    async fn post_form(&self, path: &str, fields: &[(&str, String)]) -> Result<CompletedCall> {
        let fields = fields
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        Ok(self.respond("POST", path, fields))
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).cloned()
    }
}
