//! Plugin contract: named command endpoints plus optional event handling.

use std::{future::Future, sync::Arc};

use {
    async_trait::async_trait,
    futures::future::{BoxFuture, FutureExt},
};

use jeeves_chat::MessageEvent;

use crate::command::Command;

/// Boxed async command handler.
pub type CommandHandler =
    Arc<dyn Fn(Command) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Binds a command name to a handler and a display name.
#[derive(Clone)]
pub struct PluginCommandEndpoint {
    display_name: String,
    command_name: String,
    handler: CommandHandler,
}

impl PluginCommandEndpoint {
    pub fn new<F, Fut>(
        display_name: impl Into<String>,
        command_name: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(Command) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            display_name: display_name.into(),
            command_name: command_name.into().to_lowercase(),
            handler: Arc::new(move |command| handler(command).boxed()),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Run the handler for `command`.
    pub async fn invoke(&self, command: Command) -> anyhow::Result<()> {
        (self.handler)(command).await
    }
}

impl std::fmt::Debug for PluginCommandEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCommandEndpoint")
            .field("display_name", &self.display_name)
            .field("command_name", &self.command_name)
            .finish_non_exhaustive()
    }
}

/// A loaded plugin.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin identifier, used in logs and for disabling.
    fn name(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str;

    /// Command endpoints this plugin handles. Called once at registration.
    fn command_endpoints(self: Arc<Self>) -> Vec<PluginCommandEndpoint>;

    /// Command-only plugins never see non-command room events. Read once
    /// at registration.
    fn is_command_only(&self) -> bool {
        false
    }

    /// Called for every message that is not a command, unless the plugin is
    /// command-only.
    async fn handle_event(&self, _event: &MessageEvent) -> anyhow::Result<()> {
        Ok(())
    }
}
