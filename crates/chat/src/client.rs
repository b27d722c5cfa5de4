//! The chat protocol client.
//!
//! Every post or edit against a room runs under that room's lock, so
//! concurrent plugin tasks queue instead of interleaving their requests.
//! Inside the lock a post goes through this loop, capped at
//! [`RetryPolicy::max_attempts`]:
//!
//! 1. non-JSON body carrying a throttling notice: wait the advertised time
//!    plus a buffer, try again
//! 2. non-JSON body without a notice: fatal
//! 3. `{"id": .., "time": ..}`: delivered
//! 4. `{"id": null, ..}`: wait `attempt * null_reply_backoff`, try again
//! 5. anything else: try again immediately
//!
//! A fatal outcome (or running out of attempts) is written to the
//! [`DiagnosticLog`] and announced in the room with one follow-up post that
//! cannot itself trigger recovery.

use std::{sync::Arc, time::Duration};

use {
    futures::future::try_join_all,
    serde_json::Value,
    tracing::{debug, error, info, warn},
};

use crate::{
    FKey, PostFailure, Result,
    diagnostics::DiagnosticLog,
    locks::RoomLocks,
    rate_limit::rate_limit_delay,
    transport::{ChatRequest, ChatResponse, Transport},
};

use jeeves_common::{PostedMessage, Room};

/// Retry and recovery knobs for posts and edits.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per post/edit, including the first.
    pub max_attempts: u32,
    /// Added on top of the backend's advertised wait.
    pub rate_limit_buffer: Duration,
    /// Multiplied by the attempt number after a `{"id": null}` reply.
    pub null_reply_backoff: Duration,
    /// Pause before announcing a failed post in the room.
    pub recovery_delay: Duration,
    /// Text of the in-room failure notice. Empty disables the notice.
    pub recovery_message: String,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_buffer: Duration::from_secs(2),
            null_reply_backoff: Duration::from_millis(1000),
            recovery_delay: Duration::from_millis(2000),
            recovery_message: "error has been logged. Fix it fix it fix it fix it.".into(),
        }
    }
}

/// What one post attempt told us.
enum PostStep {
    Delivered(PostedMessage),
    RetryAfter(Duration),
    Fatal(PostFailure),
    Retry,
}

/// Protocol client for the chat backend. Share it behind an `Arc`.
pub struct ChatClient {
    transport: Arc<dyn Transport>,
    fkey: FKey,
    diagnostics: Arc<dyn DiagnosticLog>,
    locks: RoomLocks,
    policy: RetryPolicy,
}

impl ChatClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        fkey: FKey,
        diagnostics: Arc<dyn DiagnosticLog>,
    ) -> Self {
        Self {
            transport,
            fkey,
            diagnostics,
            locks: RoomLocks::new(),
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Anti-forgery token handle; refresh it through [`FKey::set`].
    #[must_use]
    pub fn fkey(&self) -> &FKey {
        &self.fkey
    }

    /// Single pass-through request. No retry, status surfaced as-is.
    pub async fn request(&self, request: impl Into<ChatRequest>) -> Result<ChatResponse> {
        self.transport.request(request.into()).await
    }

    /// Issue all requests concurrently. Results keep the input order; the
    /// first failure aborts the batch.
    pub async fn request_multi<R>(
        &self,
        requests: impl IntoIterator<Item = R>,
    ) -> Result<Vec<ChatResponse>>
    where
        R: Into<ChatRequest>,
    {
        try_join_all(
            requests
                .into_iter()
                .map(|r| self.transport.request(r.into())),
        )
        .await
    }

    /// Fetch a room-scoped message resource.
    pub async fn get_message(&self, room: &Room, id: u64) -> Result<ChatResponse> {
        self.request(room.host.url(&format!("message/{id}"))).await
    }

    /// Post `text` into `room`.
    ///
    /// `Ok(None)` means the post was not confirmed: the failure has been
    /// logged and announced, and callers should assume it was not delivered.
    /// Only transport failures are returned as errors.
    pub async fn post_message(&self, room: &Room, text: &str) -> Result<Option<PostedMessage>> {
        let _guard = self.locks.lock(room).await;

        match self.post_locked(room, text).await? {
            Ok(posted) => Ok(Some(posted)),
            Err(failure) => {
                self.recover(room, &failure).await;
                Ok(None)
            },
        }
    }

    /// Post `text` as a reply to `origin_message_id`.
    pub async fn post_reply(
        &self,
        room: &Room,
        origin_message_id: u64,
        text: &str,
    ) -> Result<Option<PostedMessage>> {
        self.post_message(room, &format!(":{origin_message_id} {text}"))
            .await
    }

    /// Replace the text of message `id`. Best effort: when attempts run out
    /// the edit is silently dropped.
    pub async fn edit_message(&self, room: &Room, id: u64, text: &str) -> Result<()> {
        let _guard = self.locks.lock(room).await;

        let request = ChatRequest::post_form(room.host.url(&format!("messages/{id}")), [
            ("text", text.to_string()),
            ("fkey", self.fkey.expose()),
        ]);

        for attempt in 1..=self.policy.max_attempts {
            let response = self.transport.request(request.clone()).await?;
            let Some(wait) = rate_limit_delay(&response.body, self.policy.rate_limit_buffer)
            else {
                debug!(room_id = room.id, message_id = id, attempt, "message edited");
                return Ok(());
            };
            warn!(
                room_id = room.id,
                message_id = id,
                attempt,
                retry_after_secs = wait.as_secs(),
                "chat backend rate limited edit, waiting before retry"
            );
            tokio::time::sleep(wait).await;
        }

        warn!(
            room_id = room.id,
            message_id = id,
            max_attempts = self.policy.max_attempts,
            "giving up on edit after repeated rate limiting"
        );
        Ok(())
    }

    /// The attempt loop. Caller must hold the room lock.
    async fn post_locked(
        &self,
        room: &Room,
        text: &str,
    ) -> Result<std::result::Result<PostedMessage, PostFailure>> {
        let request = ChatRequest::post_form(
            room.host.url(&format!("chats/{}/messages/new", room.id)),
            [("text", text.to_string()), ("fkey", self.fkey.expose())],
        );
        let mut last_body = None;

        for attempt in 1..=self.policy.max_attempts {
            let response = self.transport.request(request.clone()).await?;

            match self.classify(attempt, &response.body) {
                PostStep::Delivered(posted) => {
                    info!(
                        room_id = room.id,
                        message_id = posted.id,
                        attempt,
                        "message posted"
                    );
                    return Ok(Ok(posted));
                },
                PostStep::RetryAfter(wait) => {
                    warn!(
                        room_id = room.id,
                        attempt,
                        retry_after_secs = wait.as_secs(),
                        "chat backend rate limited post, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
                PostStep::Fatal(failure) => return Ok(Err(failure)),
                PostStep::Retry => {
                    debug!(room_id = room.id, attempt, "post not confirmed, retrying");
                },
            }
            last_body = Some(response.body);
        }

        Ok(Err(PostFailure::RetryBudgetExhausted {
            attempts: self.policy.max_attempts,
            last_body,
        }))
    }

    fn classify(&self, attempt: u32, body: &str) -> PostStep {
        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                return match rate_limit_delay(body, self.policy.rate_limit_buffer) {
                    Some(wait) => PostStep::RetryAfter(wait),
                    None => PostStep::Fatal(PostFailure::MalformedResponse {
                        detail: e.to_string(),
                        body: body.to_string(),
                    }),
                };
            },
        };

        let Some(reply) = value.as_object() else {
            return PostStep::Fatal(PostFailure::MalformedResponse {
                detail: "expected a JSON object".into(),
                body: body.to_string(),
            });
        };

        let id = reply.get("id");
        let time = reply.get("time").and_then(Value::as_i64);
        if let (Some(id), Some(time)) = (id.and_then(Value::as_u64), time) {
            return PostStep::Delivered(PostedMessage { id, time });
        }

        if matches!(id, Some(Value::Null)) {
            // Backend occasionally answers {"id":null,"time":null}.
            let wait = self.policy.null_reply_backoff.saturating_mul(attempt);
            return PostStep::RetryAfter(wait);
        }

        PostStep::Retry
    }

    /// Record the failure and announce it in the room. Runs under the room
    /// lock; the announcement never recovers again.
    async fn recover(&self, room: &Room, failure: &PostFailure) {
        error!(room_id = room.id, error = %failure, "posting message failed");

        if let Err(e) = self
            .diagnostics
            .record(&failure.to_string(), failure.last_body())
            .await
        {
            warn!(room_id = room.id, error = %e, "failed to write diagnostic record");
        }

        if self.policy.recovery_message.is_empty() {
            return;
        }

        tokio::time::sleep(self.policy.recovery_delay).await;

        match self.post_locked(room, &self.policy.recovery_message).await {
            Ok(Ok(posted)) => info!(
                room_id = room.id,
                message_id = posted.id,
                "failure notice posted"
            ),
            Ok(Err(failure)) => {
                warn!(room_id = room.id, error = %failure, "failure notice could not be posted");
            },
            Err(e) => warn!(room_id = room.id, error = %e, "failure notice could not be sent"),
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
