//! The persona session state machine.
//!
//! `SessionDriver` advances one `PersonaSession` through its steps: fetch an
//! anti-forgery token, authenticate, create and tear down resources, log
//! out. Every step absorbs its own failures at the boundary: a missed
//! expectation or a transport error marks the step failed in the reporter
//! and blocks the steps depending on it, but never panics and never
//! terminates the virtual user. Mutating steps refresh the token
//! immediately before submitting, because the platform scopes the token to
//! the page last fetched.

use tracing::{debug, info, warn};

use crate::classify::{classify, Expectation, Verdict};
use crate::config::{DeleteMethod, LoadConfig};
use crate::error::Error;
use crate::http::{ensure_trailing_slash, Transport};
use crate::report::Reporter;
use crate::session::PersonaSession;
use crate::token::TokenManager;

// Form pages and endpoints of the target platform
pub const LOGIN_PAGE: &str = "/accounts/login/";
pub const LOGOUT_PAGE: &str = "/accounts/logout/";
pub const SIGNUP_PAGE: &str = "/signup/";
pub const PROJECTS_PAGE: &str = "/projects";
pub const PROJECT_CREATE_PAGE: &str = "/projects/create/?template=Default%20project";

/// Name given to the app the power workflow creates.
const APP_NAME: &str = "locust-jupyterlab-app";

// ─────────────────────────────────────────────────────────────────
// Driver Settings
// ─────────────────────────────────────────────────────────────────

/// The slice of configuration the state machine needs, captured once at
/// persona construction and immutable for the run.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Base URL of the target host (used by the app viewer rewrite)
    pub base_url: String,
    /// Shared password of the pre-provisioned test accounts
    pub password: String,
    /// Whether resource-mutating steps may run
    pub create_resources: bool,
    /// Request method for project deletion
    pub delete_method: DeleteMethod,
}

impl DriverSettings {
    pub fn from_config(config: &LoadConfig) -> Self {
        Self {
            base_url: config.base_url(),
            password: config.credentials.password.clone(),
            create_resources: config.features.create_resources,
            delete_method: config.features.delete_method,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Session Driver
// ─────────────────────────────────────────────────────────────────

/// Advances one session through its steps. Only ever used by the single
/// task that owns the session.
pub struct SessionDriver<'a> {
    transport: &'a dyn Transport,
    session: &'a mut PersonaSession,
    tokens: &'a TokenManager,
    reporter: &'a Reporter,
    settings: &'a DriverSettings,
}

impl<'a> SessionDriver<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        session: &'a mut PersonaSession,
        tokens: &'a TokenManager,
        reporter: &'a Reporter,
        settings: &'a DriverSettings,
    ) -> Self {
        Self {
            transport,
            session,
            tokens,
            reporter,
            settings,
        }
    }

    pub fn session(&mut self) -> &mut PersonaSession {
        self.session
    }

    pub fn settings(&self) -> &DriverSettings {
        self.settings
    }

    pub fn reporter(&self) -> &Reporter {
        self.reporter
    }

    /// Route a step-level error to the right reporter channel.
    fn absorb(&self, action: &str, err: Error) {
        match err {
            Error::TokenFetch { .. } => self.reporter.record_token_failure(action, &err.to_string()),
            Error::Transport { .. } => self.reporter.record_transport_error(action, &err.to_string()),
            other => self
                .reporter
                .record_transport_error(action, &other.to_string()),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Read steps
    // ─────────────────────────────────────────────────────────────

    /// Plain page read with no expectation beyond the request completing.
    pub async fn browse(&mut self, path: &str) -> bool {
        match self.transport.get(path).await {
            Ok(_) => {
                self.reporter.record_success(&format!("GET {}", path));
                true
            }
            Err(err) => {
                self.absorb(&format!("GET {}", path), err);
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token acquisition
    // ─────────────────────────────────────────────────────────────

    /// Fetch a fresh anti-forgery token from `page` and cache it on the
    /// session, replacing any previous value. Returns false (and records
    /// the failure) when no token could be obtained; the caller must not
    /// proceed to the dependent mutating step.
    pub async fn acquire_token(&mut self, page: &str) -> bool {
        match self.tokens.fetch(self.transport, page).await {
            Ok(token) => {
                self.session.set_csrf_token(token);
                true
            }
            Err(err) => {
                self.absorb(&format!("token fetch from {}", page), err);
                false
            }
        }
    }

    /// The cached token, or a recorded failure when a mutating step was
    /// reached without one.
    fn require_token(&self, action: &str) -> Option<String> {
        match self.session.csrf_token() {
            Some(token) => Some(token.to_string()),
            None => {
                self.reporter.record_token_failure(
                    action,
                    "no anti-forgery token on session; a token fetch must precede this step",
                );
                None
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────

    /// Submit credentials. A successful login redirects into the projects
    /// area; anything else leaves the session unauthenticated and blocks
    /// all authenticated-only steps for this run.
    pub async fn login(&mut self) -> bool {
        let username = self.session.username();
        let action = format!("login as {}", username);

        let Some(token) = self.require_token(&action) else {
            return false;
        };

        let fields = [
            ("username", username.clone()),
            ("password", self.settings.password.clone()),
            ("csrfmiddlewaretoken", token),
        ];

        let call = match self.transport.post_form(LOGIN_PAGE, &fields).await {
            Ok(call) => call,
            Err(err) => {
                self.absorb(&action, err);
                return false;
            }
        };

        let expect = Expectation::for_action(action.as_str()).url_contains("/projects");
        match classify(&call, &expect) {
            Verdict::Success => {
                self.session.mark_authenticated();
                self.reporter.record_success(&action);
                info!(user = %username, "login verified");
                true
            }
            Verdict::SoftFailure(reason) => {
                self.reporter.record_soft_failure(&action, &reason);
                false
            }
        }
    }

    /// Best-effort logout; runs once if the session ever authenticated and
    /// ignores the response outcome.
    pub async fn logout(&mut self) {
        if !self.session.authenticated() {
            self.session.mark_logged_out();
            return;
        }

        let username = self.session.username();
        let token = self.session.csrf_token().unwrap_or_default().to_string();
        let fields = [
            ("username", username.clone()),
            ("csrfmiddlewaretoken", token),
        ];

        if let Err(err) = self.transport.post_form(LOGOUT_PAGE, &fields).await {
            self.absorb(&format!("logout {}", username), err);
        }
        debug!(user = %username, "logged out");
        self.session.mark_logged_out();
    }

    // ─────────────────────────────────────────────────────────────
    // Registration (visitor variant)
    // ─────────────────────────────────────────────────────────────

    /// Register a brand-new account. A successful signup redirects to the
    /// login page; on failure the response body is logged for diagnosis.
    pub async fn register(&mut self) -> bool {
        let email = self.session.registration_email();
        let action = format!("register {}", email);

        if !self.acquire_token(SIGNUP_PAGE).await {
            return false;
        }
        let Some(token) = self.require_token(&action) else {
            return false;
        };

        info!(email = %email, "registering new user account");

        let fields = [
            ("email", email.clone()),
            ("why_account_needed", "For load testing".to_string()),
            ("first_name", "Delete".to_string()),
            ("last_name", "Me".to_string()),
            ("affiliation", "other".to_string()),
            ("department", "Dept ABC".to_string()),
            ("password1", "Ac3ya89ni3wk!".to_string()),
            ("password2", "Ac3ya89ni3wk!".to_string()),
            ("note", String::new()),
            ("csrfmiddlewaretoken", token),
        ];

        let call = match self.transport.post_form(SIGNUP_PAGE, &fields).await {
            Ok(call) => call,
            Err(err) => {
                self.absorb(&action, err);
                return false;
            }
        };

        let expect = Expectation::for_action(action.as_str()).url_contains("/accounts/login");
        match classify(&call, &expect) {
            Verdict::Success => {
                self.reporter.record_success(&action);
                true
            }
            Verdict::SoftFailure(reason) => {
                debug!(body = %snippet(&call.body), "signup response body");
                self.reporter.record_soft_failure(&action, &reason);
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Project lifecycle (power variant)
    // ─────────────────────────────────────────────────────────────

    /// Create a uniquely named project. Requires authentication and the
    /// resource-mutation flag; stores the project URL on success.
    pub async fn create_project(&mut self) -> bool {
        let project_name = self.session.project_name();
        let action = format!("create project {}", project_name);

        if !self.session.authenticated() {
            self.reporter
                .record_skip(&action, "session is not authenticated");
            return false;
        }
        if !self.settings.create_resources {
            self.reporter
                .record_skip(&action, "resource creation disabled by configuration");
            return false;
        }

        // The token is scoped to the creation form
        if !self.acquire_token(PROJECT_CREATE_PAGE).await {
            return false;
        }
        let Some(token) = self.require_token(&action) else {
            return false;
        };

        let fields = [
            ("name", project_name.clone()),
            ("template_id", "1".to_string()),
            ("description", "Project desc".to_string()),
            ("csrfmiddlewaretoken", token),
        ];

        let call = match self.transport.post_form(PROJECT_CREATE_PAGE, &fields).await {
            Ok(call) => call,
            Err(err) => {
                self.absorb(&action, err);
                return false;
            }
        };

        let expect = Expectation::for_action(action.as_str()).url_contains(project_name.as_str());
        match classify(&call, &expect) {
            Verdict::Success => {
                info!(project = %project_name, url = %call.final_url, "project created");
                self.session
                    .set_project_url(ensure_trailing_slash(&call.final_url));
                self.reporter.record_success(&action);
                true
            }
            Verdict::SoftFailure(reason) => {
                self.reporter.record_soft_failure(&action, &reason);
                false
            }
        }
    }

    /// Open the created project page; no verification beyond the request
    /// completing.
    pub async fn open_project(&mut self) -> bool {
        let Some(url) = self.session.project_url().map(str::to_string) else {
            debug!("no project to open");
            return false;
        };

        info!(url = %url, "opening project");
        let completed = self.browse(&url).await;
        if completed {
            self.session.mark_resource_opened();
        }
        completed
    }

    /// Create a JupyterLab app inside the created project: probe the form,
    /// read the server-selected volume/flavor/environment defaults out of
    /// the returned HTML, then submit the creation form.
    pub async fn create_app(&mut self) -> bool {
        let project_name = self.session.project_name();
        let action = format!("create app in {}", project_name);

        let Some(project_url) = self.session.project_url().map(str::to_string) else {
            debug!("no project to create an app in");
            return false;
        };
        let app_create_url = format!("{}apps/create/jupyter-lab?from=overview", project_url);

        if !self.acquire_token(&app_create_url).await {
            return false;
        }
        let Some(token) = self.require_token(&action) else {
            return false;
        };

        // Bare POST to get the rendered form with its default selections
        let probe_fields = [("csrfmiddlewaretoken", token.clone())];
        let probe = match self.transport.post_form(&app_create_url, &probe_fields).await {
            Ok(call) => call,
            Err(err) => {
                self.absorb(&action, err);
                return false;
            }
        };

        let mut fields = vec![
            ("name", APP_NAME.to_string()),
            ("access", "project".to_string()),
            ("description", "Project desc".to_string()),
            ("csrfmiddlewaretoken", token),
        ];
        for field in ["volume", "flavor", "environment"] {
            match crate::html::extract_option_value(&probe.body, field) {
                Some(value) => fields.push((field, value)),
                None => warn!(field, "option element not found in app creation form"),
            }
        }

        let call = match self.transport.post_form(&app_create_url, &fields).await {
            Ok(call) => call,
            Err(err) => {
                self.absorb(&action, err);
                return false;
            }
        };

        // Success leaves the create-app page behind
        let expect = Expectation::for_action(action.as_str())
            .url_contains(project_name.as_str())
            .url_lacks("create/jupyter-lab");
        match classify(&call, &expect) {
            Verdict::Success => {
                info!(app = APP_NAME, project = %project_name, "app created");
                self.reporter.record_success(&action);
                true
            }
            Verdict::SoftFailure(reason) => {
                self.reporter.record_soft_failure(&action, &reason);
                false
            }
        }
    }

    /// Delete the created project. Success clears the resource handle; a
    /// failure means the project leaked and is reported, not retried.
    pub async fn delete_project(&mut self) -> bool {
        let action = format!("delete project {}", self.session.project_name());

        let Some(project_url) = self.session.project_url().map(str::to_string) else {
            debug!("no project to delete");
            return false;
        };

        // Fresh token against the listing page before deleting
        if !self.acquire_token(PROJECTS_PAGE).await {
            return false;
        }
        let Some(token) = self.require_token(&action) else {
            return false;
        };

        let delete_url = format!("{}delete/", project_url);
        info!(url = %delete_url, method = %self.settings.delete_method, "deleting project");

        let result = match self.settings.delete_method {
            DeleteMethod::Get => self.transport.get(&delete_url).await,
            DeleteMethod::Post => {
                let fields = [("csrfmiddlewaretoken", token)];
                self.transport.post_form(&delete_url, &fields).await
            }
        };

        let call = match result {
            Ok(call) => call,
            Err(err) => {
                self.absorb(&action, err);
                warn!(url = %project_url, "project may have leaked");
                return false;
            }
        };

        // Success returns to the listing page with a plain 200
        let expect = Expectation::for_action(action.as_str())
            .require_status_ok()
            .url_contains("/projects");
        match classify(&call, &expect) {
            Verdict::Success => {
                info!(url = %project_url, "project deleted");
                self.session.clear_project_url();
                self.reporter.record_success(&action);
                true
            }
            Verdict::SoftFailure(reason) => {
                self.reporter.record_soft_failure(&action, &reason);
                warn!(url = %project_url, "project may have leaked");
                false
            }
        }
    }
}

/// First line-ish of a response body for diagnostic logs.
fn snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(idx, _)| idx)
        .unwrap_or(body.len());
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_truncates() {
        let long = "x".repeat(500);
        assert_eq!(snippet(&long).len(), 200);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let body = "å".repeat(300);
        // Must not panic on multi-byte boundaries
        assert_eq!(snippet(&body).chars().count(), 200);
    }

    #[test]
    fn test_driver_settings_from_config() {
        let mut config = LoadConfig::default();
        config.features.create_resources = true;
        config.credentials.password = "pw".to_string();

        let settings = DriverSettings::from_config(&config);
        assert!(settings.create_resources);
        assert_eq!(settings.password, "pw");
        assert_eq!(settings.base_url, "https://serve-dev.example");
        assert_eq!(settings.delete_method, DeleteMethod::Get);
    }
}
