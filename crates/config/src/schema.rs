/// Config schema types (chat host, protocol client, diagnostics, commands, plugins).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JeevesConfig {
    pub chat: ChatConfig,
    pub client: ClientConfig,
    pub diagnostics: DiagnosticsConfig,
    pub commands: CommandsConfig,
    pub plugins: PluginsConfig,
}

/// Chat backend connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Chat host, e.g. "chat.stackoverflow.com".
    pub hostname: String,
    /// Use https when talking to the host.
    pub secure: bool,
    /// Rooms the bot posts into.
    pub rooms: Vec<u64>,
    /// Anti-forgery token. Normally supplied by the session layer or
    /// `JEEVES_FKEY`.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub fkey: Option<Secret<String>>,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("hostname", &self.hostname)
            .field("secure", &self.secure)
            .field("rooms", &self.rooms)
            .field("fkey", &self.fkey.as_ref().map(|_| "[REDACTED]"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            hostname: "chat.stackoverflow.com".into(),
            secure: true,
            rooms: Vec::new(),
            fkey: None,
            user_agent: format!("jeeves/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_str(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// Retry and recovery behaviour of the chat protocol client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Attempts per post/edit before giving up. Defaults to 5.
    pub max_attempts: u32,
    /// Seconds added to a backend "try again in N seconds" hint.
    pub rate_limit_buffer_secs: u64,
    /// Step for the escalating wait after a `{"id":null}` reply (ms).
    pub null_reply_backoff_ms: u64,
    /// Pause before the in-room failure notice (ms).
    pub recovery_delay_ms: u64,
    /// Text posted into the room after a post ultimately fails.
    pub recovery_message: String,
    /// Per-request timeout at the HTTP boundary.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_buffer_secs: 2,
            null_reply_backoff_ms: 1000,
            recovery_delay_ms: 2000,
            recovery_message: "error has been logged. Fix it fix it fix it fix it.".into(),
            request_timeout_secs: 30,
        }
    }
}

/// Where fatal post failures are recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Append-only exception log. Defaults to `<data_dir>/exceptions.txt`.
    pub exceptions_log: Option<PathBuf>,
}

/// Command parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Prefix that marks a message as a command.
    pub prefix: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: "!!".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Names of bundled plugins that should not be registered.
    pub disabled: Vec<String>,
}

impl PluginsConfig {
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.iter().any(|d| d.eq_ignore_ascii_case(name))
    }
}
