//! One-shot chat operations from the command line.

use {anyhow::Result, clap::Subcommand, jeeves_common::PostedMessage};

use crate::app::App;

#[derive(Subcommand)]
pub enum ChatAction {
    /// Post a message into a room.
    Post {
        #[arg(long)]
        room: u64,
        text: String,
    },
    /// Reply to a message.
    Reply {
        #[arg(long)]
        room: u64,
        /// Id of the message being replied to.
        #[arg(long)]
        to: u64,
        text: String,
    },
    /// Replace the text of one of the bot's messages.
    Edit {
        #[arg(long)]
        room: u64,
        #[arg(long)]
        id: u64,
        text: String,
    },
    /// Fetch a message resource and print the raw response.
    Get {
        #[arg(long)]
        room: u64,
        #[arg(long)]
        id: u64,
    },
}

pub async fn handle_chat(app: &App, action: ChatAction) -> Result<()> {
    match action {
        ChatAction::Post { room, text } => {
            let posted = app.client.post_message(&app.room(room), &text).await?;
            report(app, posted);
        },
        ChatAction::Reply { room, to, text } => {
            let posted = app.client.post_reply(&app.room(room), to, &text).await?;
            report(app, posted);
        },
        ChatAction::Edit { room, id, text } => {
            app.client.edit_message(&app.room(room), id, &text).await?;
            println!("edit sent for message {id}");
        },
        ChatAction::Get { room, id } => {
            let response = app.client.get_message(&app.room(room), id).await?;
            println!("{}", response.status);
            println!("{}", response.body);
        },
    }
    Ok(())
}

fn report(app: &App, posted: Option<PostedMessage>) {
    match posted {
        Some(msg) => println!("posted message {} at {}", msg.id, msg.time),
        None => eprintln!(
            "post not confirmed; details in {}",
            app.config.exceptions_log_path().display()
        ),
    }
}
