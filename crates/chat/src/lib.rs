//! Chat-room message-posting protocol client.
//!
//! [`ChatClient`] turns "post/edit this text" into a serialized, rate-limit
//! aware, retried HTTP interaction with the chat backend. Posts into one
//! room never overlap; a failed post is recorded in the diagnostic log and
//! announced in the room.

pub mod client;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod fkey;
pub mod locks;
pub mod rate_limit;
pub mod transport;

pub use {
    client::{ChatClient, RetryPolicy},
    diagnostics::{DiagnosticLog, FileDiagnosticLog},
    error::{Error, PostFailure, Result},
    event::{EventKind, MessageEvent},
    fkey::FKey,
    jeeves_common::{Host, PostedMessage, Room, RoomId},
    locks::RoomLocks,
    transport::{ChatRequest, ChatResponse, ReqwestTransport, Transport},
};
