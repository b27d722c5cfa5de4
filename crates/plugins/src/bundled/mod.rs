//! Plugins shipped with the bot.

use std::sync::Arc;

use jeeves_chat::ChatClient;

use crate::endpoint::Plugin;

pub mod urban;
pub mod version;

pub use {urban::UrbanPlugin, version::VersionPlugin};

/// Every bundled plugin, wired to `client`.
pub fn all(client: Arc<ChatClient>) -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(VersionPlugin::new(Arc::clone(&client))),
        Arc::new(UrbanPlugin::new(client)),
    ]
}
