//! Routes commands to exactly one registered endpoint.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, info, warn};

use jeeves_chat::MessageEvent;

use crate::{
    command::Command,
    endpoint::{Plugin, PluginCommandEndpoint},
    error::{Error, Result},
};

struct Route {
    plugin: String,
    endpoint: PluginCommandEndpoint,
}

/// Registry of loaded plugins and their command endpoints.
pub struct CommandDispatcher {
    prefix: String,
    routes: HashMap<String, Route>,
    plugins: Vec<Arc<dyn Plugin>>,
    listeners: Vec<Arc<dyn Plugin>>,
}

impl CommandDispatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            routes: HashMap::new(),
            plugins: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a plugin and all its endpoints.
    ///
    /// Either every endpoint is added or none is. A command name already
    /// held by the dispatcher, or repeated within the plugin, fails here.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let name = plugin.name().to_string();
        let command_only = plugin.is_command_only();
        let endpoints = Arc::clone(&plugin).command_endpoints();

        if command_only && endpoints.is_empty() {
            return Err(Error::NoCommands { plugin: name });
        }

        let mut batch: HashMap<String, PluginCommandEndpoint> = HashMap::new();
        for endpoint in endpoints {
            let command = endpoint.command_name().to_string();
            if command.is_empty() || command.chars().any(char::is_whitespace) {
                return Err(Error::InvalidCommandName {
                    command,
                    plugin: name,
                });
            }
            if let Some(route) = self.routes.get(&command) {
                return Err(Error::DuplicateCommand {
                    command,
                    plugin: name,
                    existing: route.plugin.clone(),
                });
            }
            if batch.contains_key(&command) {
                return Err(Error::DuplicateCommand {
                    command,
                    plugin: name.clone(),
                    existing: name,
                });
            }
            batch.insert(command, endpoint);
        }

        let commands = batch.len();
        for (command, endpoint) in batch {
            self.routes.insert(command, Route {
                plugin: name.clone(),
                endpoint,
            });
        }
        if !command_only {
            self.listeners.push(Arc::clone(&plugin));
        }
        self.plugins.push(plugin);

        info!(plugin = %name, commands, command_only, "plugin registered");
        Ok(())
    }

    /// Registered command names, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn endpoint(&self, command: &str) -> Option<&PluginCommandEndpoint> {
        self.routes.get(command).map(|route| &route.endpoint)
    }

    /// Plugins in registration order.
    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// Run the endpoint matching `command`. Returns `false` when nothing
    /// matched, which is not an error.
    pub async fn dispatch(&self, command: Command) -> Result<bool> {
        let Some(route) = self.routes.get(command.name()) else {
            debug!(command = command.name(), "no endpoint for command");
            return Ok(false);
        };

        let name = command.name().to_string();
        info!(
            command = %name,
            plugin = %route.plugin,
            room_id = command.room().id,
            user_id = command.user_id(),
            "dispatching command"
        );
        route
            .endpoint
            .invoke(command)
            .await
            .map_err(|e| Error::handler(name, e))?;
        Ok(true)
    }

    /// Handle one inbound room event.
    ///
    /// Commands go to their endpoint. Other new or edited messages are
    /// handed to every plugin that is not command-only; a failing
    /// listener is logged and does not stop the others.
    pub async fn handle_event(&self, event: &MessageEvent) -> Result<bool> {
        if let Some(command) = Command::from_event(&self.prefix, event) {
            return self.dispatch(command).await;
        }

        for plugin in &self.listeners {
            if let Err(e) = plugin.handle_event(event).await {
                warn!(
                    plugin = plugin.name(),
                    room_id = event.room.id,
                    message_id = event.message_id,
                    error = %e,
                    "plugin failed to handle event"
                );
            }
        }
        Ok(false)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        jeeves_chat::EventKind,
        jeeves_common::{Host, Room},
        std::sync::Mutex,
    };

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, entry: String) {
            self.calls.lock().unwrap().push(entry);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct TestPlugin {
        name: &'static str,
        commands: Vec<&'static str>,
        command_only: bool,
        fail: bool,
        recorder: Arc<Recorder>,
    }

    impl TestPlugin {
        fn new(name: &'static str, commands: &[&'static str], recorder: &Arc<Recorder>) -> Self {
            Self {
                name,
                commands: commands.to_vec(),
                command_only: true,
                fail: false,
                recorder: Arc::clone(recorder),
            }
        }
    }

    #[async_trait]
    impl Plugin for TestPlugin {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "test plugin"
        }

        fn command_endpoints(self: Arc<Self>) -> Vec<PluginCommandEndpoint> {
            self.commands
                .iter()
                .map(|&command| {
                    let plugin = Arc::clone(&self);
                    PluginCommandEndpoint::new(command, command, move |cmd: Command| {
                        let plugin = Arc::clone(&plugin);
                        async move {
                            plugin.recorder.push(format!(
                                "{}:{}:{}",
                                plugin.name,
                                cmd.name(),
                                cmd.parameters().join(",")
                            ));
                            if plugin.fail {
                                anyhow::bail!("boom");
                            }
                            Ok(())
                        }
                    })
                })
                .collect()
        }

        fn is_command_only(&self) -> bool {
            self.command_only
        }

        async fn handle_event(&self, event: &MessageEvent) -> anyhow::Result<()> {
            self.recorder.push(format!("{}:event:{}", self.name, event.text));
            if self.fail {
                anyhow::bail!("listener failed");
            }
            Ok(())
        }
    }

    fn room() -> Room {
        Room::new(11, Host::new("chat.stackoverflow.com", true))
    }

    fn command(name: &str, params: &[&str]) -> Command {
        Command::new(
            room(),
            1,
            2,
            name,
            params.iter().map(|p| p.to_string()).collect(),
            format!("!!{name}"),
        )
    }

    fn event(text: &str) -> MessageEvent {
        MessageEvent {
            kind: EventKind::NewMessage,
            event_id: 1,
            timestamp: 0,
            room: room(),
            user_id: 5,
            user_name: "user".into(),
            message_id: 9,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn dispatches_to_exactly_one_endpoint() {
        let rec = Arc::new(Recorder::default());
        let mut dispatcher = CommandDispatcher::new("!!");
        dispatcher
            .register(Arc::new(TestPlugin::new("a", &["foo", "bar"], &rec)))
            .unwrap();
        dispatcher
            .register(Arc::new(TestPlugin::new("b", &["baz"], &rec)))
            .unwrap();

        assert!(dispatcher.dispatch(command("bar", &["x", "y"])).await.unwrap());
        assert_eq!(rec.calls(), vec!["a:bar:x,y".to_string()]);
        assert_eq!(dispatcher.command_names(), vec!["bar", "baz", "foo"]);
    }

    #[tokio::test]
    async fn unmatched_command_is_ignored() {
        let rec = Arc::new(Recorder::default());
        let mut dispatcher = CommandDispatcher::new("!!");
        dispatcher
            .register(Arc::new(TestPlugin::new("a", &["foo"], &rec)))
            .unwrap();

        assert!(!dispatcher.dispatch(command("nope", &[])).await.unwrap());
        assert!(rec.calls().is_empty());
    }

    #[test]
    fn duplicate_across_plugins_fails_at_registration() {
        let rec = Arc::new(Recorder::default());
        let mut dispatcher = CommandDispatcher::new("!!");
        dispatcher
            .register(Arc::new(TestPlugin::new("a", &["foo"], &rec)))
            .unwrap();

        let err = dispatcher
            .register(Arc::new(TestPlugin::new("b", &["qux", "foo"], &rec)))
            .unwrap_err();
        match err {
            Error::DuplicateCommand {
                command,
                plugin,
                existing,
            } => {
                assert_eq!(command, "foo");
                assert_eq!(plugin, "b");
                assert_eq!(existing, "a");
            },
            other => panic!("unexpected error: {other}"),
        }
        // Nothing from the rejected plugin was kept.
        assert_eq!(dispatcher.command_names(), vec!["foo"]);
        assert_eq!(dispatcher.plugins().len(), 1);
    }

    #[test]
    fn duplicate_within_plugin_fails() {
        let rec = Arc::new(Recorder::default());
        let mut dispatcher = CommandDispatcher::new("!!");
        let err = dispatcher
            .register(Arc::new(TestPlugin::new("a", &["foo", "FOO"], &rec)))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateCommand { .. }));
        assert!(dispatcher.command_names().is_empty());
    }

    #[test]
    fn invalid_names_are_rejected() {
        let rec = Arc::new(Recorder::default());
        let mut dispatcher = CommandDispatcher::new("!!");
        let err = dispatcher
            .register(Arc::new(TestPlugin::new("a", &["two words"], &rec)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCommandName { .. }));
    }

    #[test]
    fn command_only_plugin_needs_commands() {
        let rec = Arc::new(Recorder::default());
        let mut dispatcher = CommandDispatcher::new("!!");
        let err = dispatcher
            .register(Arc::new(TestPlugin::new("empty", &[], &rec)))
            .unwrap_err();
        assert!(matches!(err, Error::NoCommands { .. }));

        let mut listener = TestPlugin::new("listener", &[], &rec);
        listener.command_only = false;
        dispatcher.register(Arc::new(listener)).unwrap();
    }

    #[tokio::test]
    async fn handler_error_propagates_to_caller() {
        let rec = Arc::new(Recorder::default());
        let mut dispatcher = CommandDispatcher::new("!!");
        let mut plugin = TestPlugin::new("a", &["foo"], &rec);
        plugin.fail = true;
        dispatcher.register(Arc::new(plugin)).unwrap();

        let err = dispatcher.dispatch(command("foo", &[])).await.unwrap_err();
        assert!(matches!(err, Error::Handler { ref command, .. } if command == "foo"));
    }

    #[tokio::test]
    async fn non_commands_reach_only_listeners() {
        let rec = Arc::new(Recorder::default());
        let mut dispatcher = CommandDispatcher::new("!!");
        dispatcher
            .register(Arc::new(TestPlugin::new("cmd", &["foo"], &rec)))
            .unwrap();
        let mut failing = TestPlugin::new("first", &[], &rec);
        failing.command_only = false;
        failing.fail = true;
        dispatcher.register(Arc::new(failing)).unwrap();
        let mut listener = TestPlugin::new("second", &[], &rec);
        listener.command_only = false;
        dispatcher.register(Arc::new(listener)).unwrap();

        assert!(!dispatcher.handle_event(&event("hello there")).await.unwrap());
        assert_eq!(rec.calls(), vec![
            "first:event:hello there".to_string(),
            "second:event:hello there".to_string(),
        ]);
    }

    #[tokio::test]
    async fn command_events_skip_listeners() {
        let rec = Arc::new(Recorder::default());
        let mut dispatcher = CommandDispatcher::new("!!");
        dispatcher
            .register(Arc::new(TestPlugin::new("cmd", &["foo"], &rec)))
            .unwrap();
        let mut listener = TestPlugin::new("listener", &[], &rec);
        listener.command_only = false;
        dispatcher.register(Arc::new(listener)).unwrap();

        assert!(dispatcher.handle_event(&event("!!Foo a")).await.unwrap());
        assert_eq!(rec.calls(), vec!["cmd:foo:a".to_string()]);
    }
}
