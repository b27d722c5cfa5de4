//! Inbound room events from the push channel.
//!
//! The backend pushes frames keyed by room (`"r11": {"e": [...]}`); each entry
//! of `e` is one event. Only new and edited messages are surfaced.

use {
    serde::Deserialize,
    serde_json::Value,
    tracing::{trace, warn},
};

use {
    crate::Result,
    jeeves_common::{Host, Room},
};

/// Kind of a message event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NewMessage,
    MessageEdited,
}

impl EventKind {
    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::NewMessage),
            2 => Some(Self::MessageEdited),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    event_type: u8,
    id: u64,
    time_stamp: i64,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    user_id: Option<u64>,
    #[serde(default)]
    user_name: Option<String>,
    room_id: u64,
    #[serde(default)]
    message_id: Option<u64>,
}

/// A message posted or edited in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub kind: EventKind,
    pub event_id: u64,
    pub timestamp: i64,
    pub room: Room,
    pub user_id: u64,
    pub user_name: String,
    pub message_id: u64,
    /// Message content reduced to plain text.
    pub text: String,
}

/// Decode one push frame into the message events it carries, in order.
///
/// Events that are not messages (joins, leaves, stars, ...) are skipped, as
/// are entries that do not decode. Only a frame that is not JSON fails.
pub fn parse_frame(frame: &str, host: &Host) -> Result<Vec<MessageEvent>> {
    let value: Value = serde_json::from_str(frame)?;
    let mut events = Vec::new();

    let Some(rooms) = value.as_object() else {
        return Ok(events);
    };

    for (key, room_data) in rooms {
        if !key.starts_with('r') {
            continue;
        }
        let Some(entries) = room_data.get("e").and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            let raw: RawEvent = match RawEvent::deserialize(entry) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(room = %key, error = %e, "skipping malformed event entry");
                    continue;
                },
            };
            if let Some(event) = from_raw(raw, host) {
                events.push(event);
            }
        }
    }

    Ok(events)
}

fn from_raw(raw: RawEvent, host: &Host) -> Option<MessageEvent> {
    let Some(kind) = EventKind::from_code(raw.event_type) else {
        trace!(
            event_type = raw.event_type,
            event_id = raw.id,
            "skipping non-message event"
        );
        return None;
    };
    Some(MessageEvent {
        kind,
        event_id: raw.id,
        timestamp: raw.time_stamp,
        room: Room::new(raw.room_id, host.clone()),
        user_id: raw.user_id?,
        user_name: raw.user_name.unwrap_or_default(),
        message_id: raw.message_id?,
        text: html_to_text(raw.content.as_deref().unwrap_or_default()),
    })
}

/// Strip tags and decode the handful of entities the backend emits.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut chars = html.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {},
            '&' => {
                let mut entity = String::new();
                while let Some(&next) = chars.peek() {
                    if next == ';' || entity.len() > 8 {
                        break;
                    }
                    entity.push(next);
                    chars.next();
                }
                match (decode_entity(&entity), chars.peek()) {
                    (Some(decoded), Some(';')) => {
                        chars.next();
                        out.push(decoded);
                    },
                    _ => {
                        out.push('&');
                        out.push_str(&entity);
                    },
                }
            },
            _ => out.push(ch),
        }
    }

    out.trim().to_string()
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        },
    }
}
