//! Anti-forgery token acquisition.
//!
//! The platform issues a fresh CSRF token as a cookie whenever a form page
//! is fetched, scoped to the page last visited. Mutating steps therefore
//! fetch the relevant form page immediately before submitting, and the
//! session caches only the latest value.

use tracing::debug;

use crate::error::{Error, Result};
use crate::http::Transport;

/// Fetches anti-forgery tokens from form pages via the session cookie jar.
#[derive(Debug, Clone)]
pub struct TokenManager {
    cookie_name: String,
}

impl TokenManager {
    /// Create a manager reading the named token cookie.
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    /// Fetch `page` and return the token it issued.
    ///
    /// Fails with [`Error::TokenFetch`] when the page does not respond with
    /// a success status or no token cookie is present afterwards. Callers
    /// must not proceed to the dependent mutating step on failure.
    pub async fn fetch(&self, transport: &dyn Transport, page: &str) -> Result<String> {
        let call = transport.get(page).await?;

        if !call.status.is_success() {
            return Err(Error::token_fetch(
                page,
                format!("page returned status {}", call.status),
            ));
        }

        let token = transport.cookie(&self.cookie_name).ok_or_else(|| {
            Error::token_fetch(
                page,
                format!("cookie '{}' absent after fetch", self.cookie_name),
            )
        })?;

        debug!(page, token_len = token.len(), "Fetched anti-forgery token");
        Ok(token)
    }
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new("csrftoken")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::error::Result;
    use crate::http::{CompletedCall, StatusCode};

    /// A page that answers with a fixed status and cookie jar contents.
    struct PageStub {
        status: StatusCode,
        cookies: HashMap<String, String>,
    }

    impl PageStub {
        fn new(status: StatusCode, cookies: &[(&str, &str)]) -> Self {
            Self {
                status,
                cookies: cookies
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Transport for PageStub {
        async fn get(&self, path: &str) -> Result<CompletedCall> {
            Ok(CompletedCall::new(self.status, path, ""))
        }

        async fn post_form(&self, path: &str, _fields: &[(&str, String)]) -> Result<CompletedCall> {
            Ok(CompletedCall::new(self.status, path, ""))
        }

        fn cookie(&self, name: &str) -> Option<String> {
            self.cookies.get(name).cloned()
        }
    }

    #[test]
    fn test_default_cookie_name() {
        let manager = TokenManager::default();
        assert_eq!(manager.cookie_name, "csrftoken");
    }

    #[test]
    fn test_custom_cookie_name() {
        let manager = TokenManager::new("xsrf");
        assert_eq!(manager.cookie_name, "xsrf");
    }

    #[test]
    fn test_fetch_returns_issued_token() {
        let stub = PageStub::new(StatusCode::OK, &[("csrftoken", "tok-abc")]);
        let token =
            tokio_test::block_on(TokenManager::default().fetch(&stub, "/signup/")).unwrap();
        assert_eq!(token, "tok-abc");
    }

    #[test]
    fn test_fetch_fails_when_cookie_absent() {
        let stub = PageStub::new(StatusCode::OK, &[("sessionid", "xyz")]);
        let err =
            tokio_test::block_on(TokenManager::default().fetch(&stub, "/signup/")).unwrap_err();
        assert!(matches!(err, Error::TokenFetch { .. }));
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn test_fetch_fails_on_error_status() {
        let stub = PageStub::new(StatusCode::INTERNAL_SERVER_ERROR, &[("csrftoken", "tok")]);
        let err =
            tokio_test::block_on(TokenManager::default().fetch(&stub, "/accounts/login/"))
                .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_fetch_reads_configured_cookie() {
        let stub = PageStub::new(StatusCode::OK, &[("xsrf", "tok-custom")]);
        let token = tokio_test::block_on(TokenManager::new("xsrf").fetch(&stub, "/signup/")).unwrap();
        assert_eq!(token, "tok-custom");
    }
}
