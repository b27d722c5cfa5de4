//! Wiring from a loaded config to a running client and dispatcher.

use std::{sync::Arc, time::Duration};

use {secrecy::ExposeSecret, tracing::debug};

use {
    jeeves_chat::{ChatClient, FKey, FileDiagnosticLog, ReqwestTransport, RetryPolicy},
    jeeves_common::{Host, Room},
    jeeves_config::{ClientConfig, JeevesConfig},
    jeeves_plugins::{CommandDispatcher, bundled},
};

pub struct App {
    pub config: JeevesConfig,
    pub host: Host,
    pub client: Arc<ChatClient>,
}

impl App {
    pub fn build(config: JeevesConfig) -> anyhow::Result<Self> {
        let host = Host::new(config.chat.hostname.clone(), config.chat.secure);
        let transport = ReqwestTransport::new(
            &config.chat.user_agent,
            Duration::from_secs(config.client.request_timeout_secs),
        )?;
        let fkey = FKey::new(
            config
                .chat
                .fkey
                .as_ref()
                .map(|s| s.expose_secret().clone())
                .unwrap_or_default(),
        );
        let log_path = config.exceptions_log_path();
        debug!(path = %log_path.display(), "diagnostic log");

        let client = ChatClient::new(
            Arc::new(transport),
            fkey,
            Arc::new(FileDiagnosticLog::new(log_path)),
        )
        .with_policy(retry_policy(&config.client));

        Ok(Self {
            config,
            host,
            client: Arc::new(client),
        })
    }

    pub fn room(&self, id: u64) -> Room {
        Room::new(id, self.host.clone())
    }

    /// Dispatcher holding every bundled plugin not disabled in config.
    pub fn dispatcher(&self) -> anyhow::Result<CommandDispatcher> {
        build_dispatcher(&self.config, Arc::clone(&self.client))
    }
}

pub fn retry_policy(client: &ClientConfig) -> RetryPolicy {
    RetryPolicy {
        max_attempts: client.max_attempts,
        rate_limit_buffer: Duration::from_secs(client.rate_limit_buffer_secs),
        null_reply_backoff: Duration::from_millis(client.null_reply_backoff_ms),
        recovery_delay: Duration::from_millis(client.recovery_delay_ms),
        recovery_message: client.recovery_message.clone(),
    }
}

pub fn build_dispatcher(
    config: &JeevesConfig,
    client: Arc<ChatClient>,
) -> anyhow::Result<CommandDispatcher> {
    let mut dispatcher = CommandDispatcher::new(config.commands.prefix.clone());
    for plugin in bundled::all(client) {
        if !config.plugins.is_enabled(plugin.name()) {
            debug!(plugin = plugin.name(), "plugin disabled by config");
            continue;
        }
        dispatcher.register(plugin)?;
    }
    Ok(dispatcher)
}
