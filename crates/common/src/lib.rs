//! Shared value types and error helpers used across all jeeves crates.

pub mod error;
pub mod types;

pub use {
    error::FromMessage,
    types::{Host, PostedMessage, Room, RoomId},
};
