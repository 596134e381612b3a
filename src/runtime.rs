use std::sync::Arc;

use serenity::model::gateway::GatewayIntents;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::handlers::discord::BotHandler;
use crate::service::date_resolver::{DateResolver, HeuristicDateResolver, OpenAIDateResolver};
use crate::service::email_service::{EmailSender, LogEmailSender, ResendEmailService};
use crate::service::event_service::EventService;
use crate::service::identity_lookup::IdentityLookup;
use crate::service::openai_service::OpenAIService;
use crate::service::otp_code::RandomDigits;
use crate::service::otp_issuer::OtpIssuer;
use crate::service::otp_verifier::OtpVerifier;
use crate::store::LocalStore;
use crate::tasks::task_runner::TaskRunner;
use crate::tasks::verification_sweep;

/// Everything the bot and the CLI operate on, wired over one store.
pub struct Services {
    pub store: Arc<LocalStore>,
    pub issuer: Arc<OtpIssuer>,
    pub verifier: Arc<OtpVerifier>,
    pub lookup: IdentityLookup,
    pub events: Arc<EventService>,
    pub dates: Arc<dyn DateResolver>,
}

fn email_sender(settings: &Settings) -> Arc<dyn EmailSender> {
    match &settings.resend_api_key {
        Some(api_key) => Arc::new(ResendEmailService::new(
            api_key.clone(),
            settings.resend_sender.clone(),
        )),
        None => {
            warn!("RESEND_API_KEY not set, verification emails will only be logged");
            Arc::new(LogEmailSender)
        }
    }
}

fn date_resolver(settings: &Settings) -> Arc<dyn DateResolver> {
    match &settings.openai_api_key {
        Some(api_key) => {
            let openai = Arc::new(OpenAIService::new(
                api_key.clone(),
                settings.timezone.name().to_string(),
            ));
            Arc::new(OpenAIDateResolver::new(openai, settings.timezone))
        }
        None => Arc::new(HeuristicDateResolver::new(settings.timezone)),
    }
}

pub fn build_services(settings: &Settings, store: Arc<LocalStore>) -> Services {
    let lookup = IdentityLookup::new(store.clone());
    let issuer = OtpIssuer::new(
        store.clone(),
        store.clone(),
        email_sender(settings),
        Arc::new(RandomDigits::default()),
    );
    let verifier = OtpVerifier::new(store.clone(), store.clone());
    let events = EventService::new(lookup.clone(), store.clone());
    Services {
        store,
        issuer: Arc::new(issuer),
        verifier: Arc::new(verifier),
        lookup,
        events: Arc::new(events),
        dates: date_resolver(settings),
    }
}

pub async fn run_bot(settings: Settings, services: Services) {
    let Some(token) = settings.discord_token.clone() else {
        error!("DISCORD_TOKEN must be set for bot mode");
        return;
    };

    let mut task_runner = TaskRunner::new();
    task_runner.add_task(
        "verification_sweep",
        verification_sweep::run_verification_sweep(services.store.clone(), settings.sweep_interval),
    );
    let _handles = task_runner.start_all();

    let handler = BotHandler::new(
        services.issuer,
        services.verifier,
        services.events,
        services.dates,
    );
    let intents = GatewayIntents::GUILDS;
    let mut client = match serenity::Client::builder(token, intents)
        .event_handler(handler)
        .await
    {
        Ok(client) => client,
        Err(err) => {
            error!(error = ?err, "error creating serenity client");
            return;
        }
    };

    info!(db_location = %settings.db_location.display(), "starting discord client");
    if let Err(why) = client.start().await {
        error!(error = ?why, "client error");
    }
}
