use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use inquire::Text;

use crate::runtime::Services;
use crate::service::event_service::EventService;
use crate::service::otp_issuer::LinkRequest;
use crate::tasks::verification_sweep::sweep_once;

#[derive(Parser)]
#[command(about = "Operate the picnic bot's account links and calendar from a terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Email a verification code linking a Discord user to an address.
    LinkAccount {
        discord_user_id: String,
        username: String,
        email: String,
        #[arg(long)]
        discriminator: Option<String>,
    },
    /// Submit a verification code. Prompts for it when omitted.
    VerifyLink {
        discord_user_id: String,
        code: Option<String>,
    },
    Lookup {
        discord_user_id: String,
    },
    ListEvents {
        discord_user_id: String,
    },
    /// Delete every unused verification record that has expired.
    PurgeExpired,
}

pub async fn cli(services: Services) {
    // Fine to exit here on bad arguments
    let cli = Cli::parse();
    if let Err(e) = run(cli.command, &services).await {
        println!("{}", e);
    }
}

async fn run(command: Commands, services: &Services) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::LinkAccount {
            discord_user_id,
            username,
            email,
            discriminator,
        } => {
            let request = LinkRequest {
                discord_user_id,
                discord_username: username,
                discord_discriminator: discriminator,
                email,
            };
            let dispatch_id = services.issuer.issue(&request).await?;
            println!("Verification code sent (dispatch {})", dispatch_id);
        }
        Commands::VerifyLink {
            discord_user_id,
            code,
        } => {
            let code = match code {
                Some(code) => code,
                None => specify_code()?,
            };
            let account = services.verifier.verify(&discord_user_id, &code).await?;
            println!("Linked {} to {}", account.discord_username, account.email);
        }
        Commands::Lookup { discord_user_id } => match services.lookup.find_link(&discord_user_id).await? {
            Some(account) => println!("{}", serde_json::to_string_pretty(&account)?),
            None => println!("No account linked to {}", discord_user_id),
        },
        Commands::ListEvents { discord_user_id } => {
            list_events(&services.events, &discord_user_id).await?;
        }
        Commands::PurgeExpired => {
            let purged = sweep_once(services.store.as_ref(), Utc::now(), Duration::zero()).await?;
            println!("Purged {} expired verification record(s)", purged);
        }
    }
    Ok(())
}

async fn list_events(events: &EventService, discord_user_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let events = events.list(discord_user_id).await?;
    if events.is_empty() {
        println!("No events found");
    }
    for event in events {
        println!(
            "{}  {} -> {}  {}",
            event.id,
            event.start.to_rfc3339(),
            event.end.to_rfc3339(),
            event.title
        );
    }
    Ok(())
}

fn specify_code() -> Result<String, inquire::InquireError> {
    Text::new("Verification code:")
        .with_help_message("The 6 digit code from the email")
        .prompt()
}
