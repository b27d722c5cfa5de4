//! Event loop: push frames in, commands dispatched.
//!
//! Frames arrive as JSON lines on stdin, one push payload per line, as
//! produced by the websocket session that owns the login.

use std::sync::Arc;

use {
    tokio::{
        io::{AsyncBufReadExt, BufReader},
        task::JoinSet,
    },
    tracing::{debug, error, info, warn},
};

use {
    jeeves_chat::{MessageEvent, event::parse_frame},
    jeeves_plugins::CommandDispatcher,
};

use crate::app::App;

pub async fn run(app: &App) -> anyhow::Result<()> {
    let dispatcher = Arc::new(app.dispatcher()?);
    info!(
        host = %app.host.hostname,
        rooms = ?app.config.chat.rooms,
        commands = ?dispatcher.command_names(),
        "jeeves listening for events on stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                for event in decode(&line, app) {
                    let dispatcher = Arc::clone(&dispatcher);
                    tasks.spawn(async move { handle(&dispatcher, event).await });
                }
            },
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "event task panicked");
                }
            },
            _ = &mut shutdown => {
                info!("interrupted, waiting for in-flight commands");
                break;
            },
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "event task panicked");
        }
    }
    info!("event stream closed");
    Ok(())
}

fn decode(line: &str, app: &App) -> Vec<MessageEvent> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    match parse_frame(line, &app.host) {
        Ok(events) => events
            .into_iter()
            .filter(|ev| watching(&app.config.chat.rooms, ev.room.id))
            .collect(),
        Err(e) => {
            warn!(error = %e, "skipping undecodable frame");
            Vec::new()
        },
    }
}

/// An empty room list watches everything.
fn watching(rooms: &[u64], room_id: u64) -> bool {
    rooms.is_empty() || rooms.contains(&room_id)
}

async fn handle(dispatcher: &CommandDispatcher, event: MessageEvent) {
    match dispatcher.handle_event(&event).await {
        Ok(true) => debug!(message_id = event.message_id, "command handled"),
        Ok(false) => {},
        Err(e) => error!(
            room_id = event.room.id,
            message_id = event.message_id,
            error = %e,
            "command failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_filter() {
        assert!(watching(&[], 11));
        assert!(watching(&[11, 17], 17));
        assert!(!watching(&[11], 17));
    }
}
