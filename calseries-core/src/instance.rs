//! Materialized event instances.
//!
//! One `EventInstance` exists per occurrence. Instances generated from the
//! same rule share a `series_id`; the engine only reads and writes the
//! identity fields (`id`, `series_id`, `date`) and the denormalized
//! `recurrence`, the rest is payload edited through `EventPatch`.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rule::RecurrenceRule;

/// A single calendar event, possibly one occurrence of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInstance {
    pub id: String,
    /// Present while the instance still belongs to the series it was
    /// generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    pub date: NaiveDate,
    /// Copy of the rule that produced this instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,

    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// None for all-day events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    pub created: DateTime<Utc>,
}

impl EventInstance {
    pub fn is_series_member(&self) -> bool {
        self.series_id.is_some()
    }

    pub fn in_series(&self, series_id: &str) -> bool {
        self.series_id.as_deref() == Some(series_id)
    }

    pub fn is_all_day(&self) -> bool {
        self.start_time.is_none()
    }

    /// Remove the instance from its series for good.
    pub fn detach(&mut self) {
        self.series_id = None;
    }

    /// "2025-11-04" for all-day events, "2025-11-04 09:30-10:00" otherwise.
    pub fn render_when(&self) -> String {
        let date = self.date.format("%Y-%m-%d");
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                format!("{} {}-{}", date, start.format("%H:%M"), end.format("%H:%M"))
            }
            (Some(start), None) => format!("{} {}", date, start.format("%H:%M")),
            _ => date.to_string(),
        }
    }
}

impl fmt::Display for EventInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// The payload shared by every instance a materializer creates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
}

impl EventTemplate {
    pub fn new(title: impl Into<String>) -> Self {
        EventTemplate {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Replacement values for an edit. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    /// Moves a single occurrence. Ignored by edits that span several
    /// instances, which keep each instance's own date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    /// Overwrite the non-identity fields of `instance`.
    pub fn apply_payload(&self, instance: &mut EventInstance) {
        if let Some(title) = &self.title {
            instance.title = title.clone();
        }
        if let Some(description) = &self.description {
            instance.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            instance.location = Some(location.clone());
        }
        if let Some(start_time) = self.start_time {
            instance.start_time = Some(start_time);
        }
        if let Some(end_time) = self.end_time {
            instance.end_time = Some(end_time);
        }
        if let Some(recurrence) = &self.recurrence {
            instance.recurrence = Some(recurrence.clone());
        }
    }

    /// Payload plus the date, for edits aimed at one instance.
    pub fn apply_to_single(&self, instance: &mut EventInstance) {
        self.apply_payload(instance);
        if let Some(date) = self.date {
            instance.date = date;
        }
    }
}
