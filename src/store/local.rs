use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serenity::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{AccountStore, EventStore, VerificationStore};
use crate::error::StoreError;
use crate::models::account::Account;
use crate::models::event::CalendarEvent;
use crate::models::verification::VerificationRecord;
use crate::storage::{DB, load_db, save_db};

const VERIFICATIONS_FILE: &str = "discord_verification_codes.json";
const ACCOUNTS_FILE: &str = "users.json";
const EVENTS_FILE: &str = "events.json";

/// Tables held in memory behind one mutex each. With a directory, every
/// mutation is written through to disk before the lock is released.
pub struct LocalStore {
    dir: Option<PathBuf>,
    verifications: Mutex<DB<VerificationRecord>>,
    accounts: Mutex<DB<Account>>,
    events: Mutex<DB<CalendarEvent>>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            verifications: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            events: Mutex::new(HashMap::new()),
        }
    }

    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        let store = Self {
            verifications: Mutex::new(load_db(&dir.join(VERIFICATIONS_FILE))?),
            accounts: Mutex::new(load_db(&dir.join(ACCOUNTS_FILE))?),
            events: Mutex::new(load_db(&dir.join(EVENTS_FILE))?),
            dir: Some(dir),
        };
        debug!(dir = ?store.dir, "opened local store");
        Ok(store)
    }

    pub fn location(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Writes `next` to disk and only then replaces the in-memory table, so a
    /// failed write leaves both sides unchanged.
    fn commit<T: Serialize>(
        &self,
        file: &str,
        db: &mut DB<T>,
        next: DB<T>,
    ) -> Result<(), StoreError> {
        if let Some(dir) = &self.dir {
            save_db(&dir.join(file), &next)?;
        }
        *db = next;
        Ok(())
    }
}

#[async_trait]
impl VerificationStore for LocalStore {
    async fn insert_pending(
        &self,
        record: VerificationRecord,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut db = self.verifications.lock().await;
        let has_pending = db
            .values()
            .any(|r| r.discord_user_id == record.discord_user_id && r.is_pending(now));
        if has_pending {
            return Err(StoreError::Conflict("discord_user_id"));
        }
        let mut next = db.clone();
        next.insert(record.id.clone(), record);
        self.commit(VERIFICATIONS_FILE, &mut db, next)
    }

    async fn latest_for(
        &self,
        discord_user_id: &str,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let db = self.verifications.lock().await;
        Ok(db
            .values()
            .filter(|r| r.discord_user_id == discord_user_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn mark_used(&self, record_id: &str, used_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut db = self.verifications.lock().await;
        let mut next = db.clone();
        let record = next
            .get_mut(record_id)
            .ok_or_else(|| StoreError::NotFound(record_id.to_string()))?;
        if record.used_at.is_some() {
            return Err(StoreError::Conflict("used_at"));
        }
        record.used_at = Some(used_at);
        self.commit(VERIFICATIONS_FILE, &mut db, next)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut db = self.verifications.lock().await;
        let mut next = db.clone();
        next.retain(|_, r| r.used_at.is_some() || r.expires_at > cutoff);
        let removed = db.len() - next.len();
        if removed > 0 {
            self.commit(VERIFICATIONS_FILE, &mut db, next)?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl AccountStore for LocalStore {
    async fn find_by_discord_id(
        &self,
        discord_user_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        let db = self.accounts.lock().await;
        Ok(db
            .values()
            .find(|a| a.active && a.discord_user_id == discord_user_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let db = self.accounts.lock().await;
        Ok(db
            .values()
            .find(|a| a.active && a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_unique(&self, account: Account) -> Result<(), StoreError> {
        let mut db = self.accounts.lock().await;
        for existing in db.values().filter(|a| a.active) {
            if existing.discord_user_id == account.discord_user_id {
                return Err(StoreError::Conflict("discord_user_id"));
            }
            if existing.email.eq_ignore_ascii_case(&account.email) {
                return Err(StoreError::Conflict("email"));
            }
        }
        let mut next = db.clone();
        next.insert(account.id.clone(), account);
        self.commit(ACCOUNTS_FILE, &mut db, next)
    }
}

#[async_trait]
impl EventStore for LocalStore {
    async fn insert_event(&self, event: CalendarEvent) -> Result<(), StoreError> {
        let mut db = self.events.lock().await;
        let mut next = db.clone();
        next.insert(event.id.clone(), event);
        self.commit(EVENTS_FILE, &mut db, next)
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<CalendarEvent>, StoreError> {
        let db = self.events.lock().await;
        Ok(db.get(event_id).cloned())
    }

    async fn events_by_owner(&self, owner_id: &str) -> Result<Vec<CalendarEvent>, StoreError> {
        let db = self.events.lock().await;
        let mut events: Vec<CalendarEvent> = db
            .values()
            .filter(|e| e.created_by == owner_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    async fn replace_event(&self, event: CalendarEvent) -> Result<(), StoreError> {
        let mut db = self.events.lock().await;
        if !db.contains_key(&event.id) {
            return Err(StoreError::NotFound(event.id));
        }
        let mut next = db.clone();
        next.insert(event.id.clone(), event);
        self.commit(EVENTS_FILE, &mut db, next)
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), StoreError> {
        let mut db = self.events.lock().await;
        let mut next = db.clone();
        if next.remove(event_id).is_none() {
            return Err(StoreError::NotFound(event_id.to_string()));
        }
        self.commit(EVENTS_FILE, &mut db, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap()
    }

    fn record(user: &str, issued: DateTime<Utc>) -> VerificationRecord {
        VerificationRecord::new(user, "alice", None, "a@x.com", "123456".to_string(), issued)
    }

    #[tokio::test]
    async fn second_pending_insert_conflicts() {
        let store = LocalStore::in_memory();
        store.insert_pending(record("u1", now()), now()).await.unwrap();
        let err = store
            .insert_pending(record("u1", now()), now() + Duration::minutes(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict("discord_user_id")));
    }

    #[tokio::test]
    async fn expired_record_does_not_block_insert() {
        let store = LocalStore::in_memory();
        store.insert_pending(record("u1", now()), now()).await.unwrap();
        let later = now() + Duration::minutes(11);
        store.insert_pending(record("u1", later), later).await.unwrap();
        let latest = store.latest_for("u1").await.unwrap().unwrap();
        assert_eq!(latest.created_at, later);
    }

    #[tokio::test]
    async fn mark_used_twice_conflicts() {
        let store = LocalStore::in_memory();
        let rec = record("u1", now());
        let id = rec.id.clone();
        store.insert_pending(rec, now()).await.unwrap();
        store.mark_used(&id, now()).await.unwrap();
        assert!(matches!(
            store.mark_used(&id, now()).await,
            Err(StoreError::Conflict("used_at"))
        ));
    }

    #[tokio::test]
    async fn purge_keeps_used_and_live_records() {
        let store = LocalStore::in_memory();
        let used = record("used", now());
        let used_id = used.id.clone();
        store.insert_pending(used, now()).await.unwrap();
        store.mark_used(&used_id, now()).await.unwrap();
        store.insert_pending(record("stale", now()), now()).await.unwrap();
        let fresh_at = now() + Duration::minutes(30);
        store.insert_pending(record("fresh", fresh_at), fresh_at).await.unwrap();

        let removed = store.purge_expired(now() + Duration::minutes(30)).await.unwrap();

        assert_eq!(removed, 1);
        assert!(store.latest_for("stale").await.unwrap().is_none());
        assert!(store.latest_for("used").await.unwrap().is_some());
        assert!(store.latest_for("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn insert_unique_rejects_duplicate_email_case_insensitively() {
        let store = LocalStore::in_memory();
        let rec = record("u1", now());
        store.insert_unique(Account::from_verification(&rec, now())).await.unwrap();

        let mut other = record("u2", now());
        other.email = "A@X.COM".to_string();
        let err = store
            .insert_unique(Account::from_verification(&other, now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict("email")));
    }

    #[tokio::test]
    async fn replace_missing_event_is_not_found() {
        let store = LocalStore::in_memory();
        let event = CalendarEvent::create(
            "acc",
            crate::models::event::NewEvent {
                title: "t".to_string(),
                description: None,
                start: now(),
                end: now(),
                all_day: false,
                color: None,
                location: None,
                price: None,
            },
            now(),
        );
        assert!(matches!(
            store.replace_event(event).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
