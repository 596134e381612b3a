use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::otp_code::codes_match;
use crate::error::{LinkError, StoreError};
use crate::models::account::Account;
use crate::models::verification::VerificationState;
use crate::store::{AccountStore, VerificationStore};

pub struct OtpVerifier {
    accounts: Arc<dyn AccountStore>,
    verifications: Arc<dyn VerificationStore>,
}

impl OtpVerifier {
    pub fn new(accounts: Arc<dyn AccountStore>, verifications: Arc<dyn VerificationStore>) -> Self {
        Self {
            accounts,
            verifications,
        }
    }

    pub async fn verify(&self, discord_user_id: &str, code: &str) -> Result<Account, LinkError> {
        self.verify_at(discord_user_id, code, Utc::now()).await
    }

    /// Checks `code` against the latest record for the user and, on success,
    /// consumes the record and creates the linked account. A wrong code
    /// writes nothing.
    pub async fn verify_at(
        &self,
        discord_user_id: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, LinkError> {
        let record = self
            .verifications
            .latest_for(discord_user_id)
            .await?
            .ok_or(LinkError::NotFound)?;

        // Wrong, expired and used codes are indistinguishable to the caller.
        let usable = record.state(now) == VerificationState::Pending;
        if !codes_match(&record.code, code.trim()) || !usable {
            warn!(discord_user_id, record_id = %record.id, "rejected verification attempt");
            return Err(LinkError::InvalidToken);
        }

        if self
            .accounts
            .find_by_discord_id(discord_user_id)
            .await?
            .is_some()
        {
            return Err(LinkError::AlreadyLinked);
        }
        if self.accounts.find_by_email(&record.email).await?.is_some() {
            return Err(LinkError::DuplicateEmail);
        }

        // A failed account insert below leaves a used record and no account.
        match self.verifications.mark_used(&record.id, now).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(LinkError::InvalidToken),
            Err(err) => return Err(err.into()),
        }

        let account = Account::from_verification(&record, now);
        match self.accounts.insert_unique(account.clone()).await {
            Ok(()) => {}
            Err(StoreError::Conflict("email")) => return Err(LinkError::DuplicateEmail),
            Err(StoreError::Conflict(_)) => return Err(LinkError::AlreadyLinked),
            Err(err) => {
                error!(discord_user_id, record_id = %record.id, error = %err, "account insert failed after the code was consumed");
                return Err(err.into());
            }
        }

        info!(discord_user_id, account_id = %account.id, "linked discord account");
        Ok(account)
    }
}
