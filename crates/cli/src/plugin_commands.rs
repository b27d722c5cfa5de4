use std::sync::Arc;

use {anyhow::Result, clap::Subcommand, jeeves_plugins::Plugin};

use crate::app::App;

#[derive(Subcommand)]
pub enum PluginAction {
    /// List bundled plugins and the commands they handle.
    List,
}

pub fn handle_plugins(app: &App, action: PluginAction) -> Result<()> {
    match action {
        PluginAction::List => {
            let dispatcher = app.dispatcher()?;
            if dispatcher.plugins().is_empty() {
                println!("No plugins enabled.");
                return Ok(());
            }
            let prefix = dispatcher.prefix().to_string();
            for plugin in dispatcher.plugins() {
                let commands: Vec<String> = Arc::clone(plugin)
                    .command_endpoints()
                    .iter()
                    .map(|e| format!("{prefix}{}", e.command_name()))
                    .collect();
                println!(
                    "  {}: {} [{}]",
                    plugin.name(),
                    plugin.description(),
                    commands.join(", ")
                );
            }
        },
    }
    Ok(())
}
