//! HTTP transport for persona sessions.
//!
//! Personas only ever see the `Transport` trait: GET and form-POST with
//! redirect following, the *final* URL and status of the redirect chain, and
//! read access to the per-session cookie jar (the platform issues its
//! anti-forgery token as a cookie). The reqwest-backed implementation owns
//! one client and one jar per virtual user, so cookie state is never shared
//! between sessions.
//!
//! Mutating POSTs carry a Referer header; the platform's CSRF protection
//! rejects form submissions without one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::REFERER;
use reqwest::redirect;
use url::Url;

pub use reqwest::StatusCode;

use crate::config::LoadConfig;
use crate::error::{Error, Result};

/// Referer value sent with every form submission.
const FORM_REFERER: &str = "foo";

// ─────────────────────────────────────────────────────────────────
// Completed Call
// ─────────────────────────────────────────────────────────────────

/// Snapshot of an HTTP exchange after redirects have been followed.
#[derive(Debug, Clone)]
pub struct CompletedCall {
    /// Final status of the redirect chain
    pub status: StatusCode,
    /// Final URL of the redirect chain
    pub final_url: String,
    /// Response body
    pub body: String,
}

impl CompletedCall {
    /// Build a call snapshot; test helpers use this directly.
    pub fn new(status: StatusCode, final_url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            final_url: final_url.into(),
            body: body.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Transport Trait
// ─────────────────────────────────────────────────────────────────

/// The HTTP collaborator a persona session drives.
///
/// `path` arguments may be relative (resolved against the configured base
/// URL) or absolute `http(s)://` URLs (used verbatim, e.g. the app viewer's
/// rewritten host).
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a page, following redirects.
    async fn get(&self, path: &str) -> Result<CompletedCall>;

    /// POST a form, following redirects. A Referer header is attached.
    async fn post_form(&self, path: &str, fields: &[(&str, String)]) -> Result<CompletedCall>;

    /// Read a cookie value from this session's jar.
    fn cookie(&self, name: &str) -> Option<String>;
}

// ─────────────────────────────────────────────────────────────────
// Reqwest-backed Transport
// ─────────────────────────────────────────────────────────────────

/// Real transport: one reqwest client and cookie jar per virtual user.
pub struct HttpTransport {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
}

impl HttpTransport {
    /// Build a transport for one session from the loaded configuration.
    pub fn new(config: &LoadConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url()).map_err(|e| Error::InvalidUrl {
            url: config.target.base_url.clone(),
            message: e.to_string(),
        })?;

        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .redirect(redirect::Policy::limited(config.http.max_redirects))
            .danger_accept_invalid_certs(!config.target.verify_tls)
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .user_agent(concat!("serve-loadgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, jar, base })
    }

    /// Resolve a possibly-relative path against the base URL.
    fn resolve(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|e| Error::InvalidUrl {
                url: path.to_string(),
                message: e.to_string(),
            });
        }
        self.base.join(path).map_err(|e| Error::InvalidUrl {
            url: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn complete(action: &str, response: reqwest::Response) -> Result<CompletedCall> {
        let status = response.status();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(action.to_string(), e))?;
        Ok(CompletedCall {
            status,
            final_url,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<CompletedCall> {
        let url = self.resolve(path)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(format!("GET {}", path), e))?;
        Self::complete(path, response).await
    }

    async fn post_form(&self, path: &str, fields: &[(&str, String)]) -> Result<CompletedCall> {
        let url = self.resolve(path)?;
        let response = self
            .client
            .post(url)
            .header(REFERER, FORM_REFERER)
            .form(fields)
            .send()
            .await
            .map_err(|e| Error::transport(format!("POST {}", path), e))?;
        Self::complete(path, response).await
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let header = header.to_str().ok()?;
        cookie_value(header, name)
    }
}

/// Pull one cookie's value out of a `Cookie` header string
/// (`"a=1; b=2"` style).
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Ensure a URL carries exactly one trailing slash; the platform's project
/// URLs are canonical in that form.
pub fn ensure_trailing_slash(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadConfig;

    #[test]
    fn test_cookie_value_parsing() {
        assert_eq!(
            cookie_value("csrftoken=abc123; sessionid=xyz", "csrftoken"),
            Some("abc123".to_string())
        );
        assert_eq!(
            cookie_value("sessionid=xyz; csrftoken=abc123", "csrftoken"),
            Some("abc123".to_string())
        );
        assert_eq!(cookie_value("sessionid=xyz", "csrftoken"), None);
        assert_eq!(cookie_value("", "csrftoken"), None);
    }

    #[test]
    fn test_ensure_trailing_slash() {
        assert_eq!(
            ensure_trailing_slash("https://h.example/projects/p"),
            "https://h.example/projects/p/"
        );
        assert_eq!(
            ensure_trailing_slash("https://h.example/projects/p/"),
            "https://h.example/projects/p/"
        );
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = LoadConfig::default();
        let transport = HttpTransport::new(&config).unwrap();

        let relative = transport.resolve("/home/").unwrap();
        assert_eq!(relative.as_str(), "https://serve-dev.example/home/");

        let absolute = transport
            .resolve("https://loadtest-shinyproxy.serve-dev.example/app/x")
            .unwrap();
        assert_eq!(absolute.host_str(), Some("loadtest-shinyproxy.serve-dev.example"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = LoadConfig::default();
        config.target.base_url = "https://".to_string();
        assert!(HttpTransport::new(&config).is_err());
    }

    #[test]
    fn test_completed_call_constructor() {
        let call = CompletedCall::new(StatusCode::OK, "https://h.example/projects/", "");
        assert_eq!(call.status, StatusCode::OK);
        assert!(call.final_url.contains("/projects/"));
    }
}
