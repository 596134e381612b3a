use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use picnicBot::error::EventError;
use picnicBot::models::account::Account;
use picnicBot::models::event::{EventChanges, NewEvent};
use picnicBot::service::event_service::{EventService, UpdateOutcome};
use picnicBot::service::identity_lookup::IdentityLookup;
use picnicBot::store::{AccountStore, LocalStore};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 20, 16, 0, 0).unwrap()
}

fn account(id: &str, discord_user_id: &str, email: &str) -> Account {
    Account {
        id: id.to_string(),
        discord_user_id: discord_user_id.to_string(),
        discord_username: format!("user-{discord_user_id}"),
        discord_discriminator: None,
        email: email.to_string(),
        created_at: start(),
        verified_at: start(),
        active: true,
    }
}

fn picnic(title: &str, offset_days: i64) -> NewEvent {
    let at = start() + Duration::days(offset_days);
    NewEvent {
        title: title.to_string(),
        description: Some("bring a blanket".to_string()),
        start: at,
        end: at + Duration::hours(2),
        all_day: false,
        color: None,
        location: Some("Riverside Park".to_string()),
        price: None,
    }
}

async fn service() -> EventService {
    let store = Arc::new(LocalStore::in_memory());
    store.insert_unique(account("acc1", "u1", "a@x.com")).await.unwrap();
    store.insert_unique(account("acc2", "u2", "b@x.com")).await.unwrap();
    EventService::new(IdentityLookup::new(store.clone()), store)
}

#[tokio::test]
async fn create_and_list_in_start_order() {
    let events = service().await;
    events.create("u1", picnic("Second", 2)).await.unwrap();
    let first = events.create("u1", picnic("First", 1)).await.unwrap();
    assert_eq!(first.created_by, "acc1");

    let listed = events.list("u1").await.unwrap();
    let titles: Vec<_> = listed.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["First", "Second"]);
    assert!(events.list("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn unlinked_users_cannot_create() {
    let events = service().await;
    let result = events.create("stranger", picnic("Picnic", 0)).await;
    assert_eq!(result, Err(EventError::NotLinked));
    assert!(events.list("stranger").await.unwrap().is_empty());
}

#[tokio::test]
async fn rejects_invalid_events() {
    let events = service().await;
    let mut blank = picnic("  ", 0);
    assert!(matches!(
        events.create("u1", blank.clone()).await,
        Err(EventError::InvalidEvent(_))
    ));
    blank.title = "Backwards".to_string();
    blank.end = blank.start - Duration::minutes(1);
    assert!(matches!(
        events.create("u1", blank).await,
        Err(EventError::InvalidEvent(_))
    ));
}

#[tokio::test]
async fn update_applies_only_changed_fields() {
    let events = service().await;
    let created = events.create("u1", picnic("Picnic", 0)).await.unwrap();

    let outcome = events
        .update(
            "u1",
            &created.id,
            EventChanges {
                title: Some("Picnic".to_string()),
                location: Some("Lakeside".to_string()),
                price: Some(5.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let UpdateOutcome::Updated(updated) = outcome else {
        panic!("expected an update");
    };
    assert_eq!(updated.location.as_deref(), Some("Lakeside"));
    assert_eq!(updated.price, Some(5.0));
    assert_eq!(updated.description, created.description);
    assert!(updated.updated_at >= created.updated_at);

    let listed = events.list("u1").await.unwrap();
    assert_eq!(listed, vec![updated]);
}

#[tokio::test]
async fn update_without_changes_is_a_no_op() {
    let events = service().await;
    let created = events.create("u1", picnic("Picnic", 0)).await.unwrap();
    let outcome = events
        .update(
            "u1",
            &created.id,
            EventChanges {
                title: Some("Picnic".to_string()),
                description: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Unchanged(created));
}

#[tokio::test]
async fn update_that_breaks_ordering_is_rejected() {
    let events = service().await;
    let created = events.create("u1", picnic("Picnic", 0)).await.unwrap();
    let result = events
        .update(
            "u1",
            &created.id,
            EventChanges {
                end: Some(created.start - Duration::hours(1)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(EventError::InvalidEvent(_))));
    assert_eq!(events.list("u1").await.unwrap(), vec![created]);
}

#[tokio::test]
async fn other_accounts_events_are_not_found() {
    let events = service().await;
    let created = events.create("u1", picnic("Picnic", 0)).await.unwrap();

    let update = events
        .update(
            "u2",
            &created.id,
            EventChanges {
                title: Some("Mine now".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(update, Err(EventError::NotFound));
    assert_eq!(events.delete("u2", &created.id).await, Err(EventError::NotFound));
    assert_eq!(events.delete("u1", "missing").await, Err(EventError::NotFound));

    events.delete("u1", &created.id).await.unwrap();
    assert!(events.list("u1").await.unwrap().is_empty());
}
