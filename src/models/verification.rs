use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long an issued code stays valid.
pub const CODE_TTL_MINUTES: i64 = 10;

/// A code sent to an email address to prove the Discord user controls it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: String,
    pub discord_user_id: String,
    pub discord_username: String,
    pub discord_discriminator: Option<String>,
    pub email: String,
    pub code: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    Pending,
    Used,
    Expired,
}

impl VerificationRecord {
    pub fn new(
        discord_user_id: &str,
        discord_username: &str,
        discord_discriminator: Option<&str>,
        email: &str,
        code: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            discord_user_id: discord_user_id.to_string(),
            discord_username: discord_username.to_string(),
            discord_discriminator: discord_discriminator.map(str::to_string),
            email: email.to_string(),
            code,
            created_at: now,
            expires_at: now + Duration::minutes(CODE_TTL_MINUTES),
            used_at: None,
        }
    }

    /// Derived at read time; expiry is never written back.
    pub fn state(&self, now: DateTime<Utc>) -> VerificationState {
        if self.used_at.is_some() {
            VerificationState::Used
        } else if now >= self.expires_at {
            VerificationState::Expired
        } else {
            VerificationState::Pending
        }
    }

    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == VerificationState::Pending
    }
}
