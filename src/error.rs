//! Error types for serve-loadgen
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for the CLI
//!
//! Soft failures (an HTTP exchange that completed but missed its success
//! expectation) are deliberately NOT errors; they are verdicts produced by
//! the response classifier and recorded through the reporter. Only failures
//! that prevent a step from completing at all surface here.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for loadgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoNotFound = 202,

    // Transport errors (3xx)
    TransportRequest = 300,
    TransportTimeout = 301,

    // Token errors (4xx)
    TokenPageFailed = 400,
    TokenMissing = 401,

    // Workflow errors (5xx)
    WorkflowStep = 500,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for the CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Transport errors
            400..=499 => 40, // Token errors
            500..=599 => 50, // Workflow errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the load generator
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Transport Errors
    // ─────────────────────────────────────────────────────────────

    /// Network, TLS, or timeout failure while talking to the target host
    #[error("Transport error during {action}: {source}")]
    Transport {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    /// The target base URL could not be parsed or joined
    #[error("Invalid target URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Token Errors
    // ─────────────────────────────────────────────────────────────

    /// The anti-forgery token could not be obtained from a form page
    #[error("Token fetch from '{page}' failed: {reason}")]
    TokenFetch { page: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Workflow / Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// A persona workflow step could not run at all
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::IoWrite,

            Error::Transport { source, .. } => {
                if source.is_timeout() {
                    ErrorCode::TransportTimeout
                } else {
                    ErrorCode::TransportRequest
                }
            }
            Error::InvalidUrl { .. } => ErrorCode::ConfigValidation,

            Error::TokenFetch { reason, .. } => {
                if reason.contains("absent") {
                    ErrorCode::TokenMissing
                } else {
                    ErrorCode::TokenPageFailed
                }
            }

            Error::Workflow(_) => ErrorCode::WorkflowStep,
            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error only blocks the current step (the persona keeps
    /// running and may retry the action on a later scheduling round)
    pub fn is_step_local(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::TokenFetch { .. } | Error::Workflow(_)
        )
    }

    /// Check if the error is fatal (the process should exit)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::Config(_)
                | Error::InvalidUrl { .. }
                | Error::Internal(_)
        )
    }

    /// Get the exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => {
                Some("Run 'serve-loadgen config init' to create a default configuration file.")
            }
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'serve-loadgen config validate' to see details.",
            ),
            Error::Config(_) => Some(
                "Review the configuration file and fix the invalid values. See documentation for valid options.",
            ),
            Error::InvalidUrl { .. } => {
                Some("The target base URL must be an absolute http:// or https:// URL.")
            }
            Error::Transport { .. } => Some(
                "Check your network connection and verify the target host is reachable. \
                 For self-signed certificates set target.verify_tls = false.",
            ),
            Error::TokenFetch { .. } => Some(
                "The form page did not issue an anti-forgery token. Verify the target host and \
                 features.token_cookie match the deployment.",
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", code.as_str(), self);

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }

    // ─────────────────────────────────────────────────────────────
    // Error Constructors
    // ─────────────────────────────────────────────────────────────

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
        }
    }

    /// Create a transport error with the attempted action attached
    pub fn transport(action: impl Into<String>, source: reqwest::Error) -> Self {
        Error::Transport {
            action: action.into(),
            source,
        }
    }

    /// Create a token fetch error
    pub fn token_fetch(page: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::TokenFetch {
            page: page.into(),
            reason: reason.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::TransportRequest.as_str(), "E300");
        assert_eq!(ErrorCode::TokenMissing.as_str(), "E401");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::TransportTimeout.exit_code(), 30);
        assert_eq!(ErrorCode::TokenPageFailed.exit_code(), 40);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_token_fetch_codes() {
        let err = Error::token_fetch("/signup/", "cookie 'csrftoken' absent after fetch");
        assert_eq!(err.code(), ErrorCode::TokenMissing);

        let err = Error::token_fetch("/signup/", "page returned status 500");
        assert_eq!(err.code(), ErrorCode::TokenPageFailed);
    }

    #[test]
    fn test_step_local_vs_fatal() {
        let err = Error::token_fetch("/signup/", "page returned status 500");
        assert!(err.is_step_local());
        assert!(!err.is_fatal());

        let err = Error::config_not_found("/test");
        assert!(err.is_fatal());
        assert!(!err.is_step_local());
    }

    #[test]
    fn test_error_suggestions() {
        let err = Error::config_not_found("/test");
        assert!(err.suggestion().unwrap().contains("config init"));

        let err = Error::token_fetch("/signup/", "page returned status 500");
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_terminal();

        assert!(formatted.contains("E100"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E100]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
