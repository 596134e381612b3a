#![allow(non_snake_case)]

use std::env;
use std::sync::Arc;

use picnicBot::cli;
use picnicBot::config::{AppConfig, RunMode, Settings};
use picnicBot::runtime;
use picnicBot::store::LocalStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match env::var("CONFIG_FILE") {
        Ok(path) => match AppConfig::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                error!(%path, error = %err, "failed to load config file");
                return;
            }
        },
        Err(_) => AppConfig::default(),
    };

    let settings = match Settings::from_config(&config) {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return;
        }
    };

    let store = match LocalStore::open(&settings.db_location) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!(db_location = %settings.db_location.display(), error = %err, "unable to load database");
            return;
        }
    };
    let services = runtime::build_services(&settings, store);

    match settings.run_mode {
        RunMode::Bot => {
            info!("running in bot mode");
            runtime::run_bot(settings, services).await;
        }
        RunMode::Cli => cli::cli(services).await,
    }
}
