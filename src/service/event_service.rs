use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::identity_lookup::IdentityLookup;
use crate::error::EventError;
use crate::models::account::Account;
use crate::models::event::{CalendarEvent, EventChanges, NewEvent};
use crate::store::EventStore;

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(CalendarEvent),
    /// Every supplied field already had the requested value.
    Unchanged(CalendarEvent),
}

fn validate(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), EventError> {
    if title.trim().is_empty() {
        return Err(EventError::InvalidEvent("title is required".to_string()));
    }
    if end < start {
        return Err(EventError::InvalidEvent("end must not be before start".to_string()));
    }
    Ok(())
}

/// Calendar CRUD scoped to the account linked to a Discord user.
pub struct EventService {
    lookup: IdentityLookup,
    events: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(lookup: IdentityLookup, events: Arc<dyn EventStore>) -> Self {
        Self { lookup, events }
    }

    async fn linked_account(&self, discord_user_id: &str) -> Result<Account, EventError> {
        self.lookup
            .find_link(discord_user_id)
            .await?
            .ok_or(EventError::NotLinked)
    }

    async fn owned_event(&self, owner: &Account, event_id: &str) -> Result<CalendarEvent, EventError> {
        match self.events.get_event(event_id).await? {
            Some(event) if event.created_by == owner.id => Ok(event),
            _ => Err(EventError::NotFound),
        }
    }

    /// Events of the linked account ordered by start. Unlinked users have none.
    pub async fn list(&self, discord_user_id: &str) -> Result<Vec<CalendarEvent>, EventError> {
        match self.lookup.find_link(discord_user_id).await? {
            Some(account) => Ok(self.events.events_by_owner(&account.id).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn create(
        &self,
        discord_user_id: &str,
        new_event: NewEvent,
    ) -> Result<CalendarEvent, EventError> {
        let account = self.linked_account(discord_user_id).await?;
        validate(&new_event.title, new_event.start, new_event.end)?;
        let event = CalendarEvent::create(&account.id, new_event, Utc::now());
        self.events.insert_event(event.clone()).await?;
        info!(discord_user_id, event_id = %event.id, "created event");
        Ok(event)
    }

    pub async fn update(
        &self,
        discord_user_id: &str,
        event_id: &str,
        changes: EventChanges,
    ) -> Result<UpdateOutcome, EventError> {
        let account = self.linked_account(discord_user_id).await?;
        let mut event = self.owned_event(&account, event_id).await?;

        let patch = event.diff(&changes);
        if patch.is_empty() {
            return Ok(UpdateOutcome::Unchanged(event));
        }
        event.apply(patch, Utc::now());
        validate(&event.title, event.start, event.end)?;
        self.events.replace_event(event.clone()).await?;
        info!(discord_user_id, event_id, "updated event");
        Ok(UpdateOutcome::Updated(event))
    }

    pub async fn delete(&self, discord_user_id: &str, event_id: &str) -> Result<(), EventError> {
        let account = self.linked_account(discord_user_id).await?;
        self.owned_event(&account, event_id).await?;
        self.events.delete_event(event_id).await?;
        info!(discord_user_id, event_id, "deleted event");
        Ok(())
    }
}
