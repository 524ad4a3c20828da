//! Configuration system for serve-loadgen
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (SERVE_LOADGEN_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values
//!
//! The whole configuration is read once at startup and treated as immutable
//! for the duration of a run.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Main load generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Target host settings
    pub target: TargetSettings,

    /// Test-account credentials
    pub credentials: CredentialSettings,

    /// Feature flags controlling resource-mutating steps
    pub features: FeatureSettings,

    /// HTTP transport settings
    pub http: HttpSettings,

    /// Run shape: plan, user count, duration
    pub run: RunSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Target host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSettings {
    /// Base URL of the platform under test
    pub base_url: String,

    /// Verify TLS certificates (test environments often use self-signed certs)
    pub verify_tls: bool,
}

/// Credentials for pre-provisioned test accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    /// Shared password of the pre-created `locust_test_user_{N}` accounts
    pub password: String,

    /// Relative URL of a login-protected page used by authenticated checks
    pub protected_page: String,
}

/// Feature flags for resource-mutating steps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    /// Allow personas to create server-side objects (accounts, projects, apps)
    pub create_resources: bool,

    /// HTTP method used for project deletion; the platform has accepted both
    /// across releases, so this is a per-deployment setting
    pub delete_method: DeleteMethod,

    /// Name of the cookie carrying the anti-forgery token
    pub token_cookie: String,
}

/// Request method used for the project delete step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMethod {
    /// GET against `<project>/delete/` (current platform contract)
    #[default]
    Get,
    /// Form POST against `<project>/delete/`
    Post,
}

impl fmt::Display for DeleteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteMethod::Get => write!(f, "get"),
            DeleteMethod::Post => write!(f, "post"),
        }
    }
}

impl FromStr for DeleteMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "get" => Ok(DeleteMethod::Get),
            "post" => Ok(DeleteMethod::Post),
            _ => Err(format!("Unknown delete method '{}'. Valid: get, post", s)),
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum redirects to follow before giving up
    pub max_redirects: usize,
}

/// Run shape settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Test plan name: classroom, normal, verify
    pub plan: String,

    /// Number of concurrent virtual users
    pub users: usize,

    /// Run duration in seconds
    pub duration_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            target: TargetSettings::default(),
            credentials: CredentialSettings::default(),
            features: FeatureSettings::default(),
            http: HttpSettings::default(),
            run: RunSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            base_url: "https://serve-dev.example".to_string(),
            verify_tls: false,
        }
    }
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            password: String::new(),
            protected_page: "/projects/".to_string(),
        }
    }
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            create_resources: false,
            delete_method: DeleteMethod::Get,
            token_cookie: "csrftoken".to_string(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_redirects: 10,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            plan: "normal".to_string(),
            users: 10,
            duration_secs: 60,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_files: 5,
            json_format: false,
        }
    }
}

impl LoadConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
            config = toml::from_str(&content).map_err(|e| Error::config_parse(e.to_string()))?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let expanded = shellexpand::tilde(path);
            let path = PathBuf::from(expanded.as_ref());
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::config_not_found(path));
            }
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("serve-loadgen.toml"),
            PathBuf::from("loadgen.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("serve-loadgen").join("config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".serve-loadgen").join("config.toml"))
                .unwrap_or_default(),
            // System config (Linux)
            PathBuf::from("/etc/serve-loadgen/config.toml"),
        ];

        for path in &search_paths {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        // Target settings
        if let Ok(val) = std::env::var("SERVE_LOADGEN_BASE_URL") {
            self.target.base_url = val;
        }
        if let Ok(val) = std::env::var("SERVE_LOADGEN_VERIFY_TLS") {
            self.target.verify_tls = parse_bool(&val);
        }

        // Credentials
        if let Ok(val) = std::env::var("SERVE_LOADGEN_TEST_USER_PASS") {
            self.credentials.password = val;
        }
        if let Ok(val) = std::env::var("SERVE_LOADGEN_PROTECTED_PAGE") {
            self.credentials.protected_page = val;
        }

        // Features
        if let Ok(val) = std::env::var("SERVE_LOADGEN_DO_CREATE_OBJECTS") {
            self.features.create_resources = parse_bool(&val);
        }
        if let Ok(val) = std::env::var("SERVE_LOADGEN_DELETE_METHOD") {
            if let Ok(method) = val.parse() {
                self.features.delete_method = method;
            }
        }
        if let Ok(val) = std::env::var("SERVE_LOADGEN_TOKEN_COOKIE") {
            self.features.token_cookie = val;
        }

        // HTTP settings
        if let Ok(val) = std::env::var("SERVE_LOADGEN_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.http.timeout_secs = n;
            }
        }

        // Run settings
        if let Ok(val) = std::env::var("SERVE_LOADGEN_PLAN") {
            self.run.plan = val;
        }
        if let Ok(val) = std::env::var("SERVE_LOADGEN_USERS") {
            if let Ok(n) = val.parse() {
                self.run.users = n;
            }
        }
        if let Ok(val) = std::env::var("SERVE_LOADGEN_DURATION_SECS") {
            if let Ok(n) = val.parse() {
                self.run.duration_secs = n;
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("SERVE_LOADGEN_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("SERVE_LOADGEN_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("SERVE_LOADGEN_LOG_JSON") {
            self.logging.json_format = parse_bool(&val);
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate target URL
        if self.target.base_url.is_empty() {
            return Err(Error::Config("Target base URL cannot be empty".to_string()));
        }
        if !self.target.base_url.starts_with("http://") && !self.target.base_url.starts_with("https://")
        {
            return Err(Error::Config(
                "Target base URL must start with http:// or https://".to_string(),
            ));
        }

        // Validate run shape
        if self.run.users == 0 {
            return Err(Error::Config("run.users must be at least 1".to_string()));
        }
        if self.run.duration_secs == 0 {
            return Err(Error::Config(
                "run.duration_secs must be at least 1".to_string(),
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// The base URL without a trailing slash, for joining relative paths
    pub fn base_url(&self) -> String {
        self.target.base_url.trim_end_matches('/').to_string()
    }
}

fn parse_bool(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<()> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".serve-loadgen")
                .join("config.toml")
        });

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    // Generate default config with comments
    let config_content = generate_default_config();

    // Write the file
    fs::write(&config_path, config_content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

    println!("Configuration file created: {}", config_path.display());
    Ok(())
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# serve-loadgen configuration
# https://github.com/serve-platform/serve-loadgen

[target]
# Base URL of the platform under test
base_url = "https://serve-dev.example"

# Verify TLS certificates (test environments often use self-signed certs)
verify_tls = false

[credentials]
# Shared password of the pre-created locust_test_user_{N} accounts.
# Usually supplied via SERVE_LOADGEN_TEST_USER_PASS instead of this file.
password = ""

# Relative URL of a login-protected page used by authenticated checks
protected_page = "/projects/"

[features]
# Allow personas to create server-side objects (accounts, projects, apps).
# Keep this off unless the target environment is disposable.
create_resources = false

# HTTP method used for project deletion: "get" or "post"
delete_method = "get"

# Name of the cookie carrying the anti-forgery token
token_cookie = "csrftoken"

[http]
# Per-request timeout in seconds
timeout_secs = 30

# Maximum redirects to follow before giving up
max_redirects = 10

[run]
# Test plan: classroom, normal, verify
plan = "normal"

# Number of concurrent virtual users
users = 10

# Run duration in seconds
duration_secs = 60

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.serve-loadgen/logs/loadgen.log"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
