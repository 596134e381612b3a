use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serenity::all::{CommandDataOptionValue, CommandInteraction, Interaction as DiscordInteraction};
use serenity::async_trait;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{error, info};

use crate::handlers::discord_responder::{InteractionResponder, SerenityResponder};
use crate::models::event::{CalendarEvent, EventChanges, NewEvent};
use crate::service::date_resolver::DateResolver;
use crate::service::event_service::{EventService, UpdateOutcome};
use crate::service::otp_issuer::{LinkRequest, OtpIssuer};
use crate::service::otp_verifier::OtpVerifier;

/// Events shown by `/list-events` before the reply is cut short.
const LIST_LIMIT: usize = 15;

/// Options of `/create-event`, dates still as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct CreateEventArgs {
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    pub description: Option<String>,
    pub all_day: Option<bool>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub price: Option<f64>,
}

/// Options of `/update-event`. Only supplied options are considered.
#[derive(Debug, Clone, Default)]
pub struct UpdateEventArgs {
    pub event_id: String,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
    pub all_day: Option<bool>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub price: Option<f64>,
}

pub struct BotHandler {
    issuer: Arc<OtpIssuer>,
    verifier: Arc<OtpVerifier>,
    events: Arc<EventService>,
    dates: Arc<dyn DateResolver>,
}

fn discord_time(at: DateTime<Utc>) -> String {
    format!("<t:{}:f>", at.timestamp())
}

fn render_event_line(event: &CalendarEvent) -> String {
    let mut line = format!("- **{}** {}", event.title, discord_time(event.start));
    if let Some(location) = &event.location {
        line.push_str(&format!(" at {}", location));
    }
    line.push_str(&format!(" (id: `{}`)", event.id));
    line
}

pub fn render_event_list(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return "No events found".to_string();
    }
    let mut lines: Vec<String> = events.iter().take(LIST_LIMIT).map(render_event_line).collect();
    if events.len() > LIST_LIMIT {
        lines.push(format!("...and {} more", events.len() - LIST_LIMIT));
    }
    lines.join("\n")
}

impl BotHandler {
    pub fn new(
        issuer: Arc<OtpIssuer>,
        verifier: Arc<OtpVerifier>,
        events: Arc<EventService>,
        dates: Arc<dyn DateResolver>,
    ) -> Self {
        BotHandler {
            issuer,
            verifier,
            events,
            dates,
        }
    }

    async fn resolve_date(&self, text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        self.dates
            .resolve(text, now)
            .await
            .ok_or_else(|| format!("Could not understand the date \"{}\"", text.trim()))
    }

    pub async fn handle_ping_with(&self, responder: &dyn InteractionResponder) {
        responder.reply_ephemeral("Pong!").await;
    }

    pub async fn handle_link_account_with(
        &self,
        responder: &dyn InteractionResponder,
        request: &LinkRequest,
    ) {
        responder.defer().await;
        match self.issuer.issue(request).await {
            Ok(_) => {
                responder
                    .reply_ephemeral(
                        "Linking account, please check your email for the verification code",
                    )
                    .await
            }
            Err(err) => responder.reply_ephemeral(&err.to_string()).await,
        }
    }

    pub async fn handle_verify_link_with(
        &self,
        responder: &dyn InteractionResponder,
        discord_user_id: &str,
        token: &str,
    ) {
        match self.verifier.verify(discord_user_id, token).await {
            Ok(_) => responder.reply_ephemeral("Verification successful").await,
            Err(err) => responder.reply_ephemeral(&err.to_string()).await,
        }
    }

    pub async fn handle_create_event_with(
        &self,
        responder: &dyn InteractionResponder,
        discord_user_id: &str,
        args: CreateEventArgs,
        now: DateTime<Utc>,
    ) {
        responder.defer().await;
        let start = match self.resolve_date(&args.start, now).await {
            Ok(start) => start,
            Err(message) => return responder.reply_ephemeral(&message).await,
        };
        let end = match args.end.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(text) => match self.resolve_date(text, now).await {
                Ok(end) => end,
                Err(message) => return responder.reply_ephemeral(&message).await,
            },
            None => start + Duration::hours(1),
        };

        let new_event = NewEvent {
            title: args.title,
            description: args.description,
            start,
            end,
            all_day: args.all_day.unwrap_or(false),
            color: args.color,
            location: args.location,
            price: args.price,
        };
        match self.events.create(discord_user_id, new_event).await {
            Ok(event) => {
                responder
                    .reply_ephemeral(&format!(
                        "Event created: **{}** {} (id: `{}`)",
                        event.title,
                        discord_time(event.start),
                        event.id
                    ))
                    .await
            }
            Err(err) => responder.reply_ephemeral(&err.to_string()).await,
        }
    }

    pub async fn handle_list_events_with(
        &self,
        responder: &dyn InteractionResponder,
        discord_user_id: &str,
    ) {
        match self.events.list(discord_user_id).await {
            Ok(events) => responder.reply_ephemeral(&render_event_list(&events)).await,
            Err(err) => responder.reply_ephemeral(&err.to_string()).await,
        }
    }

    pub async fn handle_update_event_with(
        &self,
        responder: &dyn InteractionResponder,
        discord_user_id: &str,
        args: UpdateEventArgs,
        now: DateTime<Utc>,
    ) {
        responder.defer().await;
        let mut changes = EventChanges {
            title: args.title,
            description: args.description,
            all_day: args.all_day,
            color: args.color,
            location: args.location,
            price: args.price,
            ..Default::default()
        };
        for (text, slot) in [(&args.start, &mut changes.start), (&args.end, &mut changes.end)] {
            if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
                match self.resolve_date(text, now).await {
                    Ok(at) => *slot = Some(at),
                    Err(message) => return responder.reply_ephemeral(&message).await,
                }
            }
        }

        match self.events.update(discord_user_id, &args.event_id, changes).await {
            Ok(UpdateOutcome::Updated(_)) => responder.reply_ephemeral("Event updated").await,
            Ok(UpdateOutcome::Unchanged(_)) => {
                responder.reply_ephemeral("Nothing to update").await
            }
            Err(err) => responder.reply_ephemeral(&err.to_string()).await,
        }
    }

    pub async fn handle_delete_event_with(
        &self,
        responder: &dyn InteractionResponder,
        discord_user_id: &str,
        event_id: &str,
    ) {
        match self.events.delete(discord_user_id, event_id).await {
            Ok(()) => responder.reply_ephemeral("Event deleted").await,
            Err(err) => responder.reply_ephemeral(&err.to_string()).await,
        }
    }

    pub async fn handle_unknown_with(&self, responder: &dyn InteractionResponder) {
        responder.reply_ephemeral("Unknown command").await;
    }

    async fn dispatch(&self, responder: &dyn InteractionResponder, command: &CommandInteraction) {
        let options = CommandOptions(command);
        let discord_user_id = command.user.id.to_string();
        info!(command = %command.data.name, %discord_user_id, "command received");

        match command.data.name.as_str() {
            "ping" => self.handle_ping_with(responder).await,
            "link-account" => {
                let request = LinkRequest {
                    discord_user_id,
                    discord_username: command.user.name.clone(),
                    discord_discriminator: command
                        .user
                        .discriminator
                        .map(|d| format!("{:04}", d.get())),
                    email: options.string("email").unwrap_or_default(),
                };
                self.handle_link_account_with(responder, &request).await
            }
            "verify-link" => {
                let token = options.string("token").unwrap_or_default();
                self.handle_verify_link_with(responder, &discord_user_id, &token)
                    .await
            }
            "create-event" => {
                let args = CreateEventArgs {
                    title: options.string("title").unwrap_or_default(),
                    start: options.string("start").unwrap_or_default(),
                    end: options.string("end"),
                    description: options.string("description"),
                    all_day: options.boolean("all-day"),
                    location: options.string("location"),
                    color: options.string("color"),
                    price: options.number("price"),
                };
                self.handle_create_event_with(responder, &discord_user_id, args, Utc::now())
                    .await
            }
            "list-events" => self.handle_list_events_with(responder, &discord_user_id).await,
            "update-event" => {
                let args = UpdateEventArgs {
                    event_id: options.string("event-id").unwrap_or_default(),
                    title: options.string("title"),
                    start: options.string("start"),
                    end: options.string("end"),
                    description: options.string("description"),
                    all_day: options.boolean("all-day"),
                    location: options.string("location"),
                    color: options.string("color"),
                    price: options.number("price"),
                };
                self.handle_update_event_with(responder, &discord_user_id, args, Utc::now())
                    .await
            }
            "delete-event" => {
                let event_id = options.string("event-id").unwrap_or_default();
                self.handle_delete_event_with(responder, &discord_user_id, &event_id)
                    .await
            }
            _ => self.handle_unknown_with(responder).await,
        }
    }
}

struct CommandOptions<'a>(&'a CommandInteraction);

impl CommandOptions<'_> {
    fn value(&self, name: &str) -> Option<&CommandDataOptionValue> {
        self.0
            .data
            .options
            .iter()
            .find(|opt| opt.name == name)
            .map(|opt| &opt.value)
    }

    fn string(&self, name: &str) -> Option<String> {
        match self.value(name)? {
            CommandDataOptionValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn boolean(&self, name: &str) -> Option<bool> {
        match self.value(name)? {
            CommandDataOptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        match self.value(name)? {
            CommandDataOptionValue::Number(n) => Some(*n),
            CommandDataOptionValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected to discord");
    }

    async fn interaction_create(&self, ctx: Context, interaction: DiscordInteraction) {
        match interaction {
            DiscordInteraction::Command(command) => {
                let responder = SerenityResponder::for_command(&ctx, &command);
                self.dispatch(&responder, &command).await;
            }
            other => {
                error!(kind = ?other.kind(), "unsupported interaction");
            }
        }
    }
}
