use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::verification::VerificationRecord;

/// A Picnic account linked to exactly one Discord identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub discord_user_id: String,
    pub discord_username: String,
    pub discord_discriminator: Option<String>,
    pub email: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub verified_at: DateTime<Utc>,
    pub active: bool,
}

impl Account {
    /// Builds the account a successful verification creates.
    pub fn from_verification(record: &VerificationRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            discord_user_id: record.discord_user_id.clone(),
            discord_username: record.discord_username.clone(),
            discord_discriminator: record.discord_discriminator.clone(),
            email: record.email.clone(),
            created_at: now,
            verified_at: now,
            active: true,
        }
    }
}
