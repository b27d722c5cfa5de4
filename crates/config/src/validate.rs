//! Configuration validation.
//!
//! Checks a loaded [`JeevesConfig`] for values the bot cannot run with and
//! for settings that are legal but probably unintended.

use std::path::PathBuf;

use crate::schema::JeevesConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "missing-value", "invalid-value", "security"
    pub category: &'static str,
    /// Dotted path, e.g. "client.max_attempts"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

fn push(
    out: &mut Vec<Diagnostic>,
    severity: Severity,
    category: &'static str,
    path: &str,
    message: impl Into<String>,
) {
    out.push(Diagnostic {
        severity,
        category,
        path: path.to_string(),
        message: message.into(),
    });
}

/// Validate a loaded config. `config_path` is carried through for reporting.
#[must_use]
pub fn validate(config: &JeevesConfig, config_path: Option<PathBuf>) -> ValidationResult {
    let mut diagnostics = Vec::new();

    if config.chat.hostname.trim().is_empty() {
        push(
            &mut diagnostics,
            Severity::Error,
            "missing-value",
            "chat.hostname",
            "chat hostname must not be empty",
        );
    } else if config.chat.hostname.contains("://") {
        push(
            &mut diagnostics,
            Severity::Error,
            "invalid-value",
            "chat.hostname",
            "hostname must not include a scheme; use chat.secure instead",
        );
    }

    if !config.chat.secure {
        push(
            &mut diagnostics,
            Severity::Warning,
            "security",
            "chat.secure",
            "anti-forgery token will be sent over plain http",
        );
    }

    if config.chat.rooms.is_empty() {
        push(
            &mut diagnostics,
            Severity::Warning,
            "missing-value",
            "chat.rooms",
            "no rooms configured; the bot will not post anywhere",
        );
    }

    if config.chat.fkey.is_none() {
        push(
            &mut diagnostics,
            Severity::Warning,
            "missing-value",
            "chat.fkey",
            "no fkey configured; set JEEVES_FKEY or chat.fkey before posting",
        );
    }

    if config.client.max_attempts == 0 {
        push(
            &mut diagnostics,
            Severity::Error,
            "invalid-value",
            "client.max_attempts",
            "at least one attempt is required",
        );
    }

    if config.client.request_timeout_secs == 0 {
        push(
            &mut diagnostics,
            Severity::Warning,
            "invalid-value",
            "client.request_timeout_secs",
            "a zero timeout disables the per-request bound",
        );
    }

    if config.client.recovery_message.trim().is_empty() {
        push(
            &mut diagnostics,
            Severity::Info,
            "missing-value",
            "client.recovery_message",
            "empty recovery message; failed posts will not be announced",
        );
    }

    if config.commands.prefix.is_empty() {
        push(
            &mut diagnostics,
            Severity::Error,
            "invalid-value",
            "commands.prefix",
            "command prefix must not be empty",
        );
    } else if config.commands.prefix.chars().any(char::is_whitespace) {
        push(
            &mut diagnostics,
            Severity::Error,
            "invalid-value",
            "commands.prefix",
            "command prefix must not contain whitespace",
        );
    }

    diagnostics.sort_by_key(|d| d.severity);

    ValidationResult {
        diagnostics,
        config_path,
    }
}
