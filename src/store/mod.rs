//! Persistence seams. Services only see these traits; `LocalStore` is the
//! JSON-file implementation used by the bot and the tests.

pub mod local;

use chrono::{DateTime, Utc};
use serenity::async_trait;

use crate::error::StoreError;
use crate::models::account::Account;
use crate::models::event::CalendarEvent;
use crate::models::verification::VerificationRecord;

pub use local::LocalStore;

#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Inserts `record` unless the same Discord user already has a pending
    /// record at `now`, in which case `StoreError::Conflict` is returned and
    /// nothing is written.
    async fn insert_pending(
        &self,
        record: VerificationRecord,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Most recently issued record for the Discord user, in any state.
    async fn latest_for(
        &self,
        discord_user_id: &str,
    ) -> Result<Option<VerificationRecord>, StoreError>;

    /// Stamps `used_at`. Fails with `Conflict` when the record was already used.
    async fn mark_used(&self, record_id: &str, used_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Deletes unused records whose expiry is at or before `cutoff`.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_discord_id(&self, discord_user_id: &str)
    -> Result<Option<Account>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Inserts the account unless one already exists for the same Discord id
    /// (`Conflict("discord_user_id")`) or email (`Conflict("email")`).
    async fn insert_unique(&self, account: Account) -> Result<(), StoreError>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: CalendarEvent) -> Result<(), StoreError>;

    async fn get_event(&self, event_id: &str) -> Result<Option<CalendarEvent>, StoreError>;

    async fn events_by_owner(&self, owner_id: &str) -> Result<Vec<CalendarEvent>, StoreError>;

    /// Replaces an existing event; `NotFound` if it was deleted meanwhile.
    async fn replace_event(&self, event: CalendarEvent) -> Result<(), StoreError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), StoreError>;
}
