use std::sync::Arc;

use {async_trait::async_trait, jeeves_chat::ChatClient};

use crate::{
    command::Command,
    endpoint::{Plugin, PluginCommandEndpoint},
};

const REPOSITORY: &str = env!("CARGO_PKG_REPOSITORY");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `!!version`: links the running release.
pub struct VersionPlugin {
    client: Arc<ChatClient>,
}

impl VersionPlugin {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }

    async fn handle(&self, command: Command) -> anyhow::Result<()> {
        self.client
            .post_message(command.room(), &version_message())
            .await?;
        Ok(())
    }
}

fn version_message() -> String {
    format!("[v{VERSION}]({REPOSITORY}/tree/v{VERSION})")
}

#[async_trait]
impl Plugin for VersionPlugin {
    fn name(&self) -> &str {
        "Version"
    }

    fn description(&self) -> &str {
        "Posts the running version with a link to its release tag"
    }

    fn command_endpoints(self: Arc<Self>) -> Vec<PluginCommandEndpoint> {
        vec![PluginCommandEndpoint::new(
            "Version",
            "version",
            move |command| {
                let plugin = Arc::clone(&self);
                async move { plugin.handle(command).await }
            },
        )]
    }

    fn is_command_only(&self) -> bool {
        true
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::bundled::test_support::{self, QueueTransport},
    };

    #[tokio::test]
    async fn posts_version_link_to_command_room() {
        let transport = QueueTransport::new([(200, r#"{"id":5,"time":6}"#)]);
        let plugin = Arc::new(VersionPlugin::new(test_support::client(Arc::clone(
            &transport,
        ))));
        let endpoint = plugin.command_endpoints().remove(0);

        endpoint
            .invoke(test_support::command("version", &[]))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].uri,
            "https://chat.stackoverflow.com/chats/11/messages/new"
        );
        let text = requests[0].field("text").unwrap();
        assert!(text.starts_with(&format!("[v{VERSION}]")));
        assert!(text.ends_with(&format!("/tree/v{VERSION})")));
    }
}
