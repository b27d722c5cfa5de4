//! Urban Dictionary lookups.

use std::sync::Arc;

use {
    async_trait::async_trait,
    jeeves_chat::ChatClient,
    serde::Deserialize,
    tracing::debug,
};

use crate::{
    command::Command,
    endpoint::{Plugin, PluginCommandEndpoint},
};

const DEFAULT_API_BASE: &str = "http://api.urbandictionary.com/v0/define";

const NO_RESULTS: &str = "whatchoo talkin bout willis";

#[derive(Debug, Deserialize)]
struct Lookup {
    #[serde(default)]
    result_type: Option<String>,
    #[serde(default)]
    list: Vec<Definition>,
}

#[derive(Debug, Deserialize)]
struct Definition {
    word: String,
    permalink: String,
    definition: String,
}

/// `!!urban <term>`: posts the top definition for a term.
pub struct UrbanPlugin {
    client: Arc<ChatClient>,
    api_base: String,
}

impl UrbanPlugin {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self::with_api_base(client, DEFAULT_API_BASE)
    }

    pub fn with_api_base(client: Arc<ChatClient>, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    fn lookup_uri(&self, parameters: &[String]) -> String {
        format!(
            "{}?term={}",
            self.api_base,
            urlencoding::encode(&parameters.join(" "))
        )
    }

    async fn handle(&self, command: Command) -> anyhow::Result<()> {
        if !command.has_parameters() {
            return Ok(());
        }

        let response = self
            .client
            .request(self.lookup_uri(command.parameters()))
            .await?;
        let lookup: Lookup = serde_json::from_str(&response.body)?;
        debug!(
            term = %command.parameters().join(" "),
            results = lookup.list.len(),
            "urban dictionary lookup"
        );

        self.client
            .post_message(command.room(), &format_lookup(&lookup))
            .await?;
        Ok(())
    }
}

fn format_lookup(lookup: &Lookup) -> String {
    if lookup.result_type.as_deref() == Some("no_results") {
        return NO_RESULTS.to_string();
    }
    match lookup.list.first() {
        Some(top) => format!(
            "[ [{}]({}) ] {}",
            top.word,
            top.permalink,
            top.definition.replace("\r\n", " ")
        ),
        None => NO_RESULTS.to_string(),
    }
}

#[async_trait]
impl Plugin for UrbanPlugin {
    fn name(&self) -> &str {
        "Urban"
    }

    fn description(&self) -> &str {
        "Looks up a term on Urban Dictionary"
    }

    fn command_endpoints(self: Arc<Self>) -> Vec<PluginCommandEndpoint> {
        vec![PluginCommandEndpoint::new("Urban", "urban", move |command| {
            let plugin = Arc::clone(&self);
            async move { plugin.handle(command).await }
        })]
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
        jeeves_chat::transport::Method,
    };

    const FOUND: &str = r#"{"result_type":"exact","list":[{"word":"yeet","permalink":"http://yeet.urbanup.com/1","definition":"to throw\r\nwith force"},{"word":"other","permalink":"x","definition":"y"}]}"#;

    fn plugin(transport: &Arc<QueueTransport>) -> Arc<UrbanPlugin> {
        Arc::new(UrbanPlugin::with_api_base(
            test_support::client(Arc::clone(transport)),
            "http://urban.test/v0/define",
        ))
    }

    #[tokio::test]
    async fn posts_top_definition() {
        let transport = QueueTransport::new([(200, FOUND), (200, r#"{"id":1,"time":2}"#)]);
        let endpoint = plugin(&transport).command_endpoints().remove(0);

        endpoint
            .invoke(test_support::command("urban", &["big", "yeet"]))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].uri, "http://urban.test/v0/define?term=big%20yeet");
        assert_eq!(
            requests[1].field("text"),
            Some("[ [yeet](http://yeet.urbanup.com/1) ] to throw with force")
        );
    }

    #[tokio::test]
    async fn no_results_reply() {
        let transport = QueueTransport::new([(200, r#"{"result_type":"no_results","list":[]}"#)]);
        let endpoint = plugin(&transport).command_endpoints().remove(0);

        endpoint
            .invoke(test_support::command("urban", &["zzzq"]))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[1].field("text"), Some(NO_RESULTS));
    }

    #[tokio::test]
    async fn empty_list_is_no_results() {
        let transport = QueueTransport::new([(200, r#"{"list":[]}"#)]);
        let endpoint = plugin(&transport).command_endpoints().remove(0);

        endpoint
            .invoke(test_support::command("urban", &["zzzq"]))
            .await
            .unwrap();

        assert_eq!(transport.requests()[1].field("text"), Some(NO_RESULTS));
    }

    #[tokio::test]
    async fn without_parameters_does_nothing() {
        let transport = QueueTransport::new([]);
        let endpoint = plugin(&transport).command_endpoints().remove(0);

        endpoint
            .invoke(test_support::command("urban", &[]))
            .await
            .unwrap();

        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn garbage_response_fails_handler() {
        let transport = QueueTransport::new([(500, "<html>oops</html>")]);
        let endpoint = plugin(&transport).command_endpoints().remove(0);

        assert!(
            endpoint
                .invoke(test_support::command("urban", &["yeet"]))
                .await
                .is_err()
        );
        assert_eq!(transport.requests().len(), 1);
    }
}
