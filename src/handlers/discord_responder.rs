use std::sync::atomic::{AtomicBool, Ordering};

use serenity::all::CommandInteraction;
use serenity::async_trait;
use serenity::builder::{
    CreateInteractionResponse, CreateInteractionResponseMessage, EditInteractionResponse,
};
use serenity::prelude::Context;
use tracing::warn;

#[async_trait]
pub trait InteractionResponder: Send + Sync {
    /// Acknowledges the interaction before slow work (email, OpenAI) so
    /// Discord does not time it out. The later reply edits the placeholder.
    async fn defer(&self);
    async fn reply_ephemeral(&self, content: &str);
}

pub struct SerenityResponder<'a> {
    ctx: &'a Context,
    command: &'a CommandInteraction,
    deferred: AtomicBool,
}

impl<'a> SerenityResponder<'a> {
    pub fn for_command(ctx: &'a Context, command: &'a CommandInteraction) -> Self {
        Self {
            ctx,
            command,
            deferred: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl InteractionResponder for SerenityResponder<'_> {
    async fn defer(&self) {
        match self.command.defer_ephemeral(&self.ctx.http).await {
            Ok(()) => self.deferred.store(true, Ordering::SeqCst),
            Err(err) => warn!(error = ?err, command = %self.command.data.name, "failed to defer interaction"),
        }
    }

    async fn reply_ephemeral(&self, content: &str) {
        let result = if self.deferred.load(Ordering::SeqCst) {
            self.command
                .edit_response(&self.ctx.http, EditInteractionResponse::new().content(content))
                .await
                .map(|_| ())
        } else {
            self.command
                .create_response(
                    &self.ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .content(content)
                            .ephemeral(true),
                    ),
                )
                .await
        };
        if let Err(err) = result {
            warn!(error = ?err, command = %self.command.data.name, "failed to reply to interaction");
        }
    }
}
