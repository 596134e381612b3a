use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serenity::async_trait;
use tracing::warn;

use super::date_parse::parse_when;
use crate::service::openai_service::OpenAIClient;

#[async_trait]
pub trait DateResolver: Send + Sync {
    async fn resolve(&self, text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

pub struct HeuristicDateResolver {
    tz: Tz,
}

impl HeuristicDateResolver {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

#[async_trait]
impl DateResolver for HeuristicDateResolver {
    async fn resolve(&self, text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        parse_when(text, now, self.tz)
    }
}

/// Tries the local parser first and only asks OpenAI about phrases it
/// could not read.
pub struct OpenAIDateResolver {
    openai: Arc<dyn OpenAIClient>,
    tz: Tz,
}

impl OpenAIDateResolver {
    pub fn new(openai: Arc<dyn OpenAIClient>, tz: Tz) -> Self {
        Self { openai, tz }
    }
}

#[async_trait]
impl DateResolver for OpenAIDateResolver {
    async fn resolve(&self, text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if let Some(parsed) = parse_when(text, now, self.tz) {
            return Some(parsed);
        }
        if text.trim().is_empty() {
            return None;
        }
        match self.openai.generate_prompt(text, "event_time").await {
            Ok(payload) => parse_time_payload(&payload),
            Err(err) => {
                warn!(error = %err, "openai date resolution failed");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TimePayload {
    time: Option<String>,
}

fn parse_time_payload(payload: &str) -> Option<DateTime<Utc>> {
    let parsed: TimePayload = serde_json::from_str(payload.trim()).ok()?;
    let time = parsed.time?;
    DateTime::parse_from_rfc3339(time.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
