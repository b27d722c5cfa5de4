use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("command '{command}' from plugin '{plugin}' is already registered by '{existing}'")]
    DuplicateCommand {
        command: String,
        plugin: String,
        existing: String,
    },

    #[error("invalid command name '{command}' in plugin '{plugin}'")]
    InvalidCommandName { command: String, plugin: String },

    #[error("plugin '{plugin}' is command-only but exposes no commands")]
    NoCommands { plugin: String },

    #[error("command '{command}' failed: {source}")]
    Handler {
        command: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Chat(#[from] jeeves_chat::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn handler(command: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Handler {
            command: command.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
