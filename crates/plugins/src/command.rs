//! Parsed user instructions.

use jeeves_chat::{EventKind, MessageEvent};

use jeeves_common::Room;

/// A command extracted from a room message. Consumed by exactly one handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    room: Room,
    user_id: u64,
    user_name: String,
    message_id: u64,
    name: String,
    parameters: Vec<String>,
    raw_text: String,
}

impl Command {
    pub fn new(
        room: Room,
        user_id: u64,
        message_id: u64,
        name: impl Into<String>,
        parameters: Vec<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            room,
            user_id,
            user_name: String::new(),
            message_id,
            name: name.into().to_lowercase(),
            parameters,
            raw_text: raw_text.into(),
        }
    }

    #[must_use]
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    /// Build a command from a new-message event whose text starts with
    /// `prefix`. Edits and ordinary chatter yield `None`.
    #[must_use]
    pub fn from_event(prefix: &str, event: &MessageEvent) -> Option<Self> {
        if event.kind != EventKind::NewMessage {
            return None;
        }
        let (name, parameters) = parse_text(prefix, &event.text)?;
        Some(
            Self::new(
                event.room.clone(),
                event.user_id,
                event.message_id,
                name,
                parameters,
                event.text.clone(),
            )
            .with_user_name(event.user_name.clone()),
        )
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Id of the message that carried the command, for replies.
    pub fn message_id(&self) -> u64 {
        self.message_id
    }

    /// Lower-cased command name, without the prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}

/// Split `text` into a command name and its parameters.
///
/// The name must follow the prefix directly: `!!urban foo bar` gives
/// `("urban", ["foo", "bar"])`, `!! urban` gives `None`.
#[must_use]
pub fn parse_text(prefix: &str, text: &str) -> Option<(String, Vec<String>)> {
    if prefix.is_empty() {
        return None;
    }
    let rest = text.trim_start().strip_prefix(prefix)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?.to_lowercase();
    let parameters = tokens.map(str::to_string).collect();
    Some((name, parameters))
}
