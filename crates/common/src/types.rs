//! Value types shared between the protocol client and the plugin layer.

use serde::{Deserialize, Serialize};

/// Numeric identifier of a chat room on a host.
pub type RoomId = u64;

/// Chat host a room lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    pub hostname: String,
    /// `https` when true, `http` otherwise.
    pub secure: bool,
}

impl Host {
    pub fn new(hostname: impl Into<String>, secure: bool) -> Self {
        Self {
            hostname: hostname.into(),
            secure,
        }
    }

    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    /// Build `{scheme}://{hostname}/{path}`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}://{}/{}",
            self.scheme(),
            self.hostname,
            path.trim_start_matches('/')
        )
    }
}

/// An addressable chat room. Immutable once resolved by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub host: Host,
}

impl Room {
    pub fn new(id: RoomId, host: Host) -> Self {
        Self { id, host }
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.host.hostname, self.id)
    }
}

/// Confirmation of a delivered chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub id: u64,
    pub time: i64,
}
