//! Per-virtual-user session state.
//!
//! A `PersonaSession` is the single mutable record a persona carries through
//! its run: which kind of user it simulates, its process-unique individual
//! id, the identities derived from that id, the currently cached
//! anti-forgery token, the handle of any created resource, and the named
//! once-only completion flags that make at-most-once steps an explicit
//! contract instead of scattered booleans.
//!
//! A session is only ever advanced by one logical task at a time; nothing in
//! here is shared across virtual users.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Persona Kind
// ─────────────────────────────────────────────────────────────────

/// The persona variants the generator can simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonaKind {
    /// Anonymous visitor browsing public pages only.
    Visitor,
    /// Visitor that may additionally register one new user account.
    RegisteringVisitor,
    /// Authenticated user that creates and tears down projects and apps.
    PowerUser,
    /// Fire-and-forget opener of a hosted user app.
    AppViewer,
    /// Client system issuing read-only API calls.
    ApiClient,
}

impl PersonaKind {
    /// Number of persona kinds; sizes the identity allocator's counter table.
    pub const COUNT: usize = 5;

    /// Slug used in logs and CLI args.
    pub fn slug(&self) -> &'static str {
        match self {
            PersonaKind::Visitor => "visitor",
            PersonaKind::RegisteringVisitor => "registering-visitor",
            PersonaKind::PowerUser => "power-user",
            PersonaKind::AppViewer => "app-viewer",
            PersonaKind::ApiClient => "api-client",
        }
    }

    /// Stable index into per-kind tables.
    pub fn index(&self) -> usize {
        match self {
            PersonaKind::Visitor => 0,
            PersonaKind::RegisteringVisitor => 1,
            PersonaKind::PowerUser => 2,
            PersonaKind::AppViewer => 3,
            PersonaKind::ApiClient => 4,
        }
    }

    /// All persona kinds.
    pub fn all() -> &'static [PersonaKind] {
        &[
            PersonaKind::Visitor,
            PersonaKind::RegisteringVisitor,
            PersonaKind::PowerUser,
            PersonaKind::AppViewer,
            PersonaKind::ApiClient,
        ]
    }
}

impl fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for PersonaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "visitor" => Ok(PersonaKind::Visitor),
            "registering-visitor" | "registering_visitor" => Ok(PersonaKind::RegisteringVisitor),
            "power-user" | "power_user" | "poweruser" => Ok(PersonaKind::PowerUser),
            "app-viewer" | "app_viewer" | "appviewer" => Ok(PersonaKind::AppViewer),
            "api-client" | "api_client" | "apiclient" => Ok(PersonaKind::ApiClient),
            _ => Err(format!(
                "Unknown persona kind '{}'. Valid: visitor, registering-visitor, power-user, app-viewer, api-client",
                s
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Session State
// ─────────────────────────────────────────────────────────────────

/// Where a session is in its lifecycle. Optional states are skipped by
/// variants that never perform the corresponding steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no token fetched yet.
    Idle,
    /// A fresh anti-forgery token is cached on the session.
    TokenAcquired,
    /// Login verified successful.
    Authenticated,
    /// A project was created and its handle stored.
    ResourceCreated,
    /// The created project page was opened.
    ResourceOpened,
    /// The project was deleted and the handle cleared.
    ResourceDeleted,
    /// Logout completed (or was a no-op for never-authenticated sessions).
    LoggedOut,
    /// Session is finished; no further steps run.
    Terminal,
}

// ─────────────────────────────────────────────────────────────────
// Completion Flags
// ─────────────────────────────────────────────────────────────────

/// Named once-only flags. Each transitions false→true exactly once and is
/// never reset, so a step stays done even when the scheduler keeps invoking
/// the task that wraps it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionFlags {
    registration_attempted: bool,
    workflow_attempted: bool,
}

impl CompletionFlags {
    /// Claim the one-time registration step. Returns true on the first call
    /// only.
    pub fn try_begin_registration(&mut self) -> bool {
        if self.registration_attempted {
            false
        } else {
            self.registration_attempted = true;
            true
        }
    }

    /// Claim the one-time main workflow. Returns true on the first call only.
    pub fn try_begin_workflow(&mut self) -> bool {
        if self.workflow_attempted {
            false
        } else {
            self.workflow_attempted = true;
            true
        }
    }

    /// Whether registration has been attempted.
    pub fn registration_attempted(&self) -> bool {
        self.registration_attempted
    }

    /// Whether the main workflow has been attempted.
    pub fn workflow_attempted(&self) -> bool {
        self.workflow_attempted
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona Session
// ─────────────────────────────────────────────────────────────────

/// One simulated user's state, alive for the duration of its virtual user.
#[derive(Debug)]
pub struct PersonaSession {
    kind: PersonaKind,
    individual_id: u64,

    // Derived identities, computed lazily at most once
    username: Option<String>,
    email: Option<String>,
    project_name: Option<String>,

    /// Latest anti-forgery token; None until the first token fetch
    csrf_token: Option<String>,

    /// Canonical URL of the created project; None until creation succeeds,
    /// cleared again after successful teardown
    project_url: Option<String>,

    authenticated: bool,
    state: SessionState,
    flags: CompletionFlags,
}

impl PersonaSession {
    /// Create a session for a freshly spawned virtual user.
    ///
    /// `individual_id` comes from the identity allocator and must be unique
    /// within `kind` for the process lifetime.
    pub fn new(kind: PersonaKind, individual_id: u64) -> Self {
        Self {
            kind,
            individual_id,
            username: None,
            email: None,
            project_name: None,
            csrf_token: None,
            project_url: None,
            authenticated: false,
            state: SessionState::Idle,
            flags: CompletionFlags::default(),
        }
    }

    pub fn kind(&self) -> PersonaKind {
        self.kind
    }

    pub fn individual_id(&self) -> u64 {
        self.individual_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn flags_mut(&mut self) -> &mut CompletionFlags {
        &mut self.flags
    }

    pub fn flags(&self) -> &CompletionFlags {
        &self.flags
    }

    // ─────────────────────────────────────────────────────────────
    // Derived identities
    // ─────────────────────────────────────────────────────────────

    /// Login username of the pre-provisioned test account for this id.
    pub fn username(&mut self) -> String {
        if self.username.is_none() {
            self.username = Some(format!("locust_test_user_{}@test.uu.net", self.individual_id));
        }
        self.username.clone().unwrap_or_default()
    }

    /// Email used when registering a brand new account.
    pub fn registration_email(&mut self) -> String {
        if self.email.is_none() {
            self.email = Some(format!(
                "locust_test_user_created_by_testrun_{}@test.uu.net",
                self.individual_id
            ));
        }
        self.email.clone().unwrap_or_default()
    }

    /// Name of the project this session creates, unique per id.
    pub fn project_name(&mut self) -> String {
        if self.project_name.is_none() {
            self.project_name = Some(format!("locust_test_project_new_{}", self.individual_id));
        }
        self.project_name.clone().unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────
    // Token
    // ─────────────────────────────────────────────────────────────

    /// Overwrite the cached token with a freshly fetched one.
    pub fn set_csrf_token(&mut self, token: String) {
        self.csrf_token = Some(token);
        if self.state == SessionState::Idle {
            self.state = SessionState::TokenAcquired;
        }
    }

    /// Current token, if one has been fetched.
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    // ─────────────────────────────────────────────────────────────
    // State transitions
    // ─────────────────────────────────────────────────────────────

    /// Record a verified login.
    pub fn mark_authenticated(&mut self) {
        self.authenticated = true;
        self.state = SessionState::Authenticated;
    }

    /// Record a verified project creation.
    pub fn set_project_url(&mut self, url: String) {
        self.project_url = Some(url);
        self.state = SessionState::ResourceCreated;
    }

    /// Handle of the created project, if any.
    pub fn project_url(&self) -> Option<&str> {
        self.project_url.as_deref()
    }

    /// Record that the project page was opened.
    pub fn mark_resource_opened(&mut self) {
        self.state = SessionState::ResourceOpened;
    }

    /// Record a verified project deletion and drop the handle.
    pub fn clear_project_url(&mut self) {
        self.project_url = None;
        self.state = SessionState::ResourceDeleted;
    }

    /// Record logout completion. Also reached by sessions that never
    /// authenticated, so the terminal path is uniform.
    pub fn mark_logged_out(&mut self) {
        self.authenticated = false;
        self.state = SessionState::LoggedOut;
    }

    /// Session is done; no further steps run.
    pub fn mark_terminal(&mut self) {
        self.state = SessionState::Terminal;
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
