mod app;
mod chat_commands;
mod config_commands;
mod plugin_commands;
mod run_command;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::app::App;

#[derive(Parser)]
#[command(name = "jeeves", about = "Jeeves, a chat-room bot", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and ~/.config/jeeves/).
    #[arg(long, global = true, env = "JEEVES_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read push frames from stdin and dispatch commands.
    Run,
    #[command(flatten)]
    Chat(chat_commands::ChatAction),
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Plugin listing.
    Plugins {
        #[command(subcommand)]
        action: plugin_commands::PluginAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "jeeves starting");

    let explicit = cli.config.as_deref();
    match cli.command {
        Commands::Config { action } => config_commands::handle_config(action, explicit),
        Commands::Plugins { action } => {
            let app = App::build(jeeves_config::discover_and_load(explicit)?)?;
            plugin_commands::handle_plugins(&app, action)
        },
        Commands::Run => {
            let app = App::build(jeeves_config::discover_and_load(explicit)?)?;
            run_command::run(&app).await
        },
        Commands::Chat(action) => {
            let app = App::build(jeeves_config::discover_and_load(explicit)?)?;
            chat_commands::handle_chat(&app, action).await
        },
    }
}
