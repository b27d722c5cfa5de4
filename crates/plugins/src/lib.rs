//! Plugin system: commands, command endpoints, and dispatch.
//!
//! A plugin exposes named [`PluginCommandEndpoint`]s. The
//! [`CommandDispatcher`] holds every registered endpoint, refuses duplicate
//! command names at registration, and runs exactly one handler per inbound
//! [`Command`].

pub mod bundled;
pub mod command;
pub mod dispatcher;
pub mod endpoint;
pub mod error;

pub use {
    command::Command,
    dispatcher::CommandDispatcher,
    endpoint::{CommandHandler, Plugin, PluginCommandEndpoint},
    error::{Error, Result},
};
