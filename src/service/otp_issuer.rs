use std::sync::Arc;

use chrono::{DateTime, Utc};
use email_address::{EmailAddress, Options};
use tracing::{error, info, warn};

use super::email_service::EmailSender;
use super::link_email::{LINK_EMAIL_SUBJECT, render_link_email};
use super::otp_code::CodeGenerator;
use crate::error::{LinkError, StoreError};
use crate::models::verification::VerificationRecord;
use crate::store::{AccountStore, VerificationStore};

/// A Discord user asking to link their identity to `email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    pub discord_user_id: String,
    pub discord_username: String,
    pub discord_discriminator: Option<String>,
    pub email: String,
}

/// Trims `raw`, validates it as a bare RFC 5322 address with a dotted domain
/// and returns it lowercased.
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let options = Options::default()
        .without_display_text()
        .without_domain_literal()
        .with_required_tld();
    EmailAddress::parse_with_options(trimmed, options).ok()?;
    Some(trimmed.to_lowercase())
}

pub struct OtpIssuer {
    accounts: Arc<dyn AccountStore>,
    verifications: Arc<dyn VerificationStore>,
    email: Arc<dyn EmailSender>,
    codes: Arc<dyn CodeGenerator>,
}

impl OtpIssuer {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        verifications: Arc<dyn VerificationStore>,
        email: Arc<dyn EmailSender>,
        codes: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self {
            accounts,
            verifications,
            email,
            codes,
        }
    }

    pub async fn issue(&self, request: &LinkRequest) -> Result<String, LinkError> {
        self.issue_at(request, Utc::now()).await
    }

    /// Creates a verification record and emails its code. Returns the
    /// dispatch id from the email collaborator.
    pub async fn issue_at(
        &self,
        request: &LinkRequest,
        now: DateTime<Utc>,
    ) -> Result<String, LinkError> {
        let discord_user_id = request.discord_user_id.as_str();
        let email = normalize_email(&request.email).ok_or(LinkError::InvalidEmail)?;

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(LinkError::DuplicateEmail);
        }
        if self
            .accounts
            .find_by_discord_id(discord_user_id)
            .await?
            .is_some()
        {
            return Err(LinkError::DuplicateIdentity);
        }

        let code = self.codes.generate();
        let html = render_link_email(&request.discord_username, &code).map_err(|err| {
            error!(discord_user_id, error = %err, "failed to render verification email");
            LinkError::DispatchFailed(err.to_string())
        })?;
        let record = VerificationRecord::new(
            discord_user_id,
            &request.discord_username,
            request.discord_discriminator.as_deref(),
            &email,
            code.clone(),
            now,
        );
        let record_id = record.id.clone();
        match self.verifications.insert_pending(record, now).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(LinkError::PendingRequestExists),
            Err(err) => return Err(err.into()),
        }
        info!(discord_user_id, %record_id, "issued verification code");

        match self.email.send(&email, LINK_EMAIL_SUBJECT, &html).await {
            Ok(dispatch_id) => {
                info!(discord_user_id, %dispatch_id, "verification email dispatched");
                Ok(dispatch_id)
            }
            Err(reason) => {
                error!(discord_user_id, %record_id, %reason, "verification email failed");
                warn!(discord_user_id, "re-issuance blocked until the code expires");
                Err(LinkError::DispatchFailed(reason))
            }
        }
    }
}
