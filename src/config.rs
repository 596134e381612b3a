use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::ConfigError;

pub const DEFAULT_DB_LOCATION: &str = "./data";
pub const DEFAULT_RESEND_SENDER: &str = "Picnic Bot <noreply@picnic.app>";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;
pub const DEFAULT_SWEEP_SECS: u64 = 3600;

#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// File value first, then the process environment. Blank values count
    /// as unset.
    pub fn get_or_env(&self, key: &str) -> Option<String> {
        self.get(key)
            .or_else(|| env::var(key).ok())
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Bot,
    Cli,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub run_mode: RunMode,
    pub discord_token: Option<String>,
    pub db_location: PathBuf,
    pub resend_api_key: Option<String>,
    pub resend_sender: String,
    pub openai_api_key: Option<String>,
    pub timezone: Tz,
    pub sweep_interval: Duration,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let run_mode = match config.get_or_env("RUN_MODE").as_deref() {
            None | Some("cli") => RunMode::Cli,
            Some("bot") => RunMode::Bot,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "RUN_MODE",
                    message: format!("expected bot or cli, got {other}"),
                });
            }
        };

        let discord_token = config.get_or_env("DISCORD_TOKEN");
        if run_mode == RunMode::Bot && discord_token.is_none() {
            return Err(ConfigError::MissingRequired("DISCORD_TOKEN"));
        }

        let timezone = match config.get_or_env("PICNIC_TIMEZONE") {
            Some(name) => name.parse::<Tz>().map_err(|e| ConfigError::InvalidValue {
                key: "PICNIC_TIMEZONE",
                message: e.to_string(),
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let sweep_secs = match config.get_or_env("VERIFICATION_SWEEP_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "VERIFICATION_SWEEP_SECS",
                    message: format!("expected a positive number of seconds, got {raw}"),
                })?,
            None => DEFAULT_SWEEP_SECS,
        };

        Ok(Self {
            run_mode,
            discord_token,
            db_location: config
                .get_or_env("DB_LOCATION")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_LOCATION)),
            resend_api_key: config.get_or_env("RESEND_API_KEY"),
            resend_sender: config
                .get_or_env("RESEND_SENDER")
                .unwrap_or_else(|| DEFAULT_RESEND_SENDER.to_string()),
            openai_api_key: config.get_or_env("OPENAI_API_KEY"),
            timezone,
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}
