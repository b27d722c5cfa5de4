use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection or IO failure below the protocol layer. Never retried here.
    #[error("transport error: {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

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
    pub fn transport(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl jeeves_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

jeeves_common::impl_context!();

/// Terminal outcome of a post attempt loop. Absorbed by the recovery path,
/// never returned to callers of [`crate::ChatClient::post_message`].
#[derive(Debug, Error)]
pub enum PostFailure {
    /// Body was neither JSON nor a rate-limit notice.
    #[error(
        "a response that could not be decoded as JSON or otherwise handled was received ({detail})"
    )]
    MalformedResponse { detail: String, body: String },

    #[error("sending the message failed after {attempts} attempts")]
    RetryBudgetExhausted {
        attempts: u32,
        last_body: Option<String>,
    },
}

impl PostFailure {
    /// Last response body seen before giving up, if any.
    #[must_use]
    pub fn last_body(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { body, .. } => Some(body),
            Self::RetryBudgetExhausted { last_body, .. } => last_body.as_deref(),
        }
    }
}
