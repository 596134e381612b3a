use thiserror::Error;

use crate::storage::DBError;

/// Failures of the store traits.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional insert or update lost against existing data.
    #[error("conflict on {0}")]
    Conflict(&'static str),
    #[error("record {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Persistence(#[from] DBError),
}

/// Errors of the account-linking protocol. The `Display` text is what the
/// bot shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Please provide a valid email address")]
    InvalidEmail,
    #[error("Email already exists")]
    DuplicateEmail,
    #[error("Discord account already exists")]
    DuplicateIdentity,
    #[error("Verification code already exists, check your email or wait for it to expire")]
    PendingRequestExists,
    #[error("Failed to send the verification email, try again once the code expires")]
    DispatchFailed(String),
    #[error("No verification request found, run /link-account first")]
    NotFound,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Discord account already linked")]
    AlreadyLinked,
    #[error("Something went wrong, please try again later")]
    Storage(String),
}

impl From<StoreError> for LinkError {
    fn from(err: StoreError) -> Self {
        LinkError::Storage(err.to_string())
    }
}

/// Errors of the calendar event operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Discord link not found")]
    NotLinked,
    #[error("Event not found or not authorized")]
    NotFound,
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
    #[error("Something went wrong, please try again later")]
    Storage(String),
}

impl From<StoreError> for EventError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => EventError::NotFound,
            other => EventError::Storage(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config line {line}: {content}")]
    InvalidLine { line: usize, content: String },
    #[error("{0} must be set")]
    MissingRequired(&'static str),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_event_not_found() {
        let err: EventError = StoreError::NotFound("e1".to_string()).into();
        assert_eq!(err, EventError::NotFound);
    }

    #[test]
    fn invalid_token_message_is_generic() {
        assert_eq!(LinkError::InvalidToken.to_string(), "Invalid token");
    }
}
