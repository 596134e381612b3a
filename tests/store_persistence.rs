use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use picnicBot::error::{LinkError, StoreError};
use picnicBot::models::account::Account;
use picnicBot::models::verification::{VerificationRecord, VerificationState};
use picnicBot::service::email_service::EmailSender;
use picnicBot::service::identity_lookup::IdentityLookup;
use picnicBot::service::otp_code::CodeGenerator;
use picnicBot::service::otp_issuer::{LinkRequest, OtpIssuer};
use picnicBot::service::otp_verifier::OtpVerifier;
use picnicBot::store::{AccountStore, LocalStore, VerificationStore};
use picnicBot::tasks::verification_sweep::sweep_once;

struct FixedCode;

impl CodeGenerator for FixedCode {
    fn generate(&self) -> String {
        "123456".to_string()
    }
}

struct AcceptingEmailSender;

#[serenity::async_trait]
impl EmailSender for AcceptingEmailSender {
    async fn send(&self, _to: &str, _subject: &str, _html_body: &str) -> Result<String, String> {
        Ok("dispatch".to_string())
    }
}

/// A directory where the table's temp file would go makes the next save fail.
fn block_writes(dir: &Path, table: &str) -> std::path::PathBuf {
    let blocker = dir.join(format!("{table}.tmp"));
    std::fs::create_dir_all(&blocker).unwrap();
    blocker
}

fn alice() -> LinkRequest {
    LinkRequest {
        discord_user_id: "u1".to_string(),
        discord_username: "alice".to_string(),
        discord_discriminator: None,
        email: "a@x.com".to_string(),
    }
}

#[tokio::test]
async fn records_survive_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().to_path_buf();
    let now = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();
    let record = VerificationRecord::new("u1", "alice", None, "a@x.com", "123456".to_string(), now);

    {
        let store = LocalStore::open(&dir).unwrap();
        assert_eq!(store.location(), Some(dir.as_path()));
        store.insert_pending(record.clone(), now).await.unwrap();
        store.mark_used(&record.id, now).await.unwrap();
        store
            .insert_unique(Account::from_verification(&record, now))
            .await
            .unwrap();
    }

    let reopened = LocalStore::open(&dir).unwrap();
    let latest = reopened.latest_for("u1").await.unwrap().unwrap();
    assert_eq!(latest.code, "123456");
    assert_eq!(latest.used_at, Some(now));
    let account = reopened.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(account.discord_user_id, "u1");
}

#[tokio::test]
async fn sweep_removes_only_expired_unused_records() {
    let store = LocalStore::in_memory();
    let t0 = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();

    let stale = VerificationRecord::new("u1", "alice", None, "a@x.com", "111111".to_string(), t0);
    let used = VerificationRecord::new("u2", "bob", None, "b@x.com", "222222".to_string(), t0);
    let fresh = VerificationRecord::new(
        "u3",
        "carol",
        None,
        "c@x.com",
        "333333".to_string(),
        t0 + Duration::hours(2),
    );
    store.insert_pending(stale, t0).await.unwrap();
    store.insert_pending(used.clone(), t0).await.unwrap();
    store.mark_used(&used.id, t0).await.unwrap();
    store.insert_pending(fresh, t0 + Duration::hours(2)).await.unwrap();

    let purged = sweep_once(&store, t0 + Duration::hours(2), Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(purged, 1);
    assert!(store.latest_for("u1").await.unwrap().is_none());
    assert!(store.latest_for("u2").await.unwrap().is_some());
    assert!(store.latest_for("u3").await.unwrap().is_some());
}

#[tokio::test]
async fn failed_save_leaves_table_unchanged() {
    let temp = tempfile::tempdir().unwrap();
    let store = LocalStore::open(temp.path()).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();
    let record = VerificationRecord::new("u1", "alice", None, "a@x.com", "123456".to_string(), now);

    let blocker = block_writes(temp.path(), "discord_verification_codes.json");
    let result = store.insert_pending(record.clone(), now).await;
    assert!(matches!(result, Err(StoreError::Persistence(_))));
    assert!(store.latest_for("u1").await.unwrap().is_none());

    std::fs::remove_dir(&blocker).unwrap();
    store.insert_pending(record, now).await.unwrap();
    let reopened = LocalStore::open(temp.path()).unwrap();
    assert!(reopened.latest_for("u1").await.unwrap().is_some());
}

#[tokio::test]
async fn issue_can_be_retried_after_a_failed_save() {
    let temp = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::open(temp.path()).unwrap());
    let issuer = OtpIssuer::new(
        store.clone(),
        store.clone(),
        Arc::new(AcceptingEmailSender),
        Arc::new(FixedCode),
    );
    let now = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();

    let blocker = block_writes(temp.path(), "discord_verification_codes.json");
    let failed = issuer.issue_at(&alice(), now).await;
    assert!(matches!(failed, Err(LinkError::Storage(_))));

    std::fs::remove_dir(&blocker).unwrap();
    let retried = issuer.issue_at(&alice(), now + Duration::minutes(1)).await;
    assert_eq!(retried, Ok("dispatch".to_string()));
}

#[tokio::test]
async fn failed_account_save_never_leaves_a_usable_code() {
    let temp = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::open(temp.path()).unwrap());
    let issuer = OtpIssuer::new(
        store.clone(),
        store.clone(),
        Arc::new(AcceptingEmailSender),
        Arc::new(FixedCode),
    );
    let verifier = OtpVerifier::new(store.clone(), store.clone());
    let lookup = IdentityLookup::new(store.clone());
    let now = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();
    issuer.issue_at(&alice(), now).await.unwrap();

    let blocker = block_writes(temp.path(), "users.json");
    let failed = verifier.verify_at("u1", "123456", now).await;
    assert!(matches!(failed, Err(LinkError::Storage(_))));
    assert!(!lookup.exists("u1").await.unwrap());
    std::fs::remove_dir(&blocker).unwrap();

    let reopened = LocalStore::open(temp.path()).unwrap();
    let record = reopened.latest_for("u1").await.unwrap().unwrap();
    assert_eq!(record.state(now), VerificationState::Used);
    assert!(reopened.find_by_discord_id("u1").await.unwrap().is_none());

    let again = verifier.verify_at("u1", "123456", now).await;
    assert_eq!(again, Err(LinkError::InvalidToken));
    issuer.issue_at(&alice(), now + Duration::minutes(1)).await.unwrap();
}
