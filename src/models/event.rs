use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    pub color: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating an event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub color: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
}

/// A partial update. `None` leaves the field alone; blank strings are
/// treated as not supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub color: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self == &EventChanges::default()
    }
}

fn changed_text(requested: &Option<String>, current: Option<&str>) -> Option<String> {
    let value = requested.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
    (current != Some(value)).then(|| value.to_string())
}

fn changed<T: PartialEq + Copy>(requested: Option<T>, current: T) -> Option<T> {
    requested.filter(|value| *value != current)
}

impl CalendarEvent {
    pub fn create(owner_id: &str, new_event: NewEvent, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: new_event.title.trim().to_string(),
            description: new_event.description,
            start: new_event.start,
            end: new_event.end,
            all_day: new_event.all_day,
            color: new_event.color,
            location: new_event.location,
            price: new_event.price,
            created_by: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Keeps only the requested fields whose value differs from this event.
    pub fn diff(&self, requested: &EventChanges) -> EventChanges {
        EventChanges {
            title: changed_text(&requested.title, Some(self.title.as_str())),
            description: changed_text(&requested.description, self.description.as_deref()),
            start: changed(requested.start, self.start),
            end: changed(requested.end, self.end),
            all_day: changed(requested.all_day, self.all_day),
            color: changed_text(&requested.color, self.color.as_deref()),
            location: changed_text(&requested.location, self.location.as_deref()),
            price: requested.price.filter(|price| self.price != Some(*price)),
        }
    }

    pub fn apply(&mut self, patch: EventChanges, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if let Some(start) = patch.start {
            self.start = start;
        }
        if let Some(end) = patch.end {
            self.end = end;
        }
        if let Some(all_day) = patch.all_day {
            self.all_day = all_day;
        }
        if patch.color.is_some() {
            self.color = patch.color;
        }
        if patch.location.is_some() {
            self.location = patch.location;
        }
        if patch.price.is_some() {
            self.price = patch.price;
        }
        self.updated_at = now;
    }
}
