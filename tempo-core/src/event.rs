//! Event types shared across the engine.
//!
//! `EventTemplate` is what the store persists: standalone events and
//! recurring masters. `EventInstance` is a derived occurrence, recomputed
//! for every visible window and never persisted.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;

/// Separator between parent id and date in synthetic instance ids.
const INSTANCE_ID_SEPARATOR: char = '_';

/// A stored event: either a standalone event or a recurring master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplate {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    /// Provenance link for events forked out of a recurring series.
    /// Never consulted during expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_parent_id: Option<String>,
    /// Dates excluded from expansion of this master.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub recurrence_exceptions: BTreeSet<NaiveDate>,
}

impl EventTemplate {
    /// Create a standalone event with a fresh store id.
    pub fn new(title: &str, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        EventTemplate {
            id: format!("local-{}", uuid::Uuid::new_v4()),
            title: title.to_string(),
            description: None,
            starts_at,
            ends_at,
            color: None,
            is_locked: false,
            is_recurring: false,
            recurrence: None,
            recurrence_parent_id: None,
            recurrence_exceptions: BTreeSet::new(),
        }
    }

    /// Turn this event into a recurring master.
    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        self.is_recurring = true;
        self.recurrence = Some(rule);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn locked(mut self) -> Self {
        self.is_locked = true;
        self
    }

    /// Duration implied by the first occurrence. Preserved across every
    /// expansion and move.
    pub fn duration(&self) -> Duration {
        self.ends_at - self.starts_at
    }
}

/// A materialized occurrence within a window. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInstance {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_parent_id: Option<String>,
}

impl EventInstance {
    /// Materialize a standalone template under its own id.
    pub fn standalone(template: &EventTemplate) -> Self {
        EventInstance {
            id: template.id.clone(),
            title: template.title.clone(),
            description: template.description.clone(),
            starts_at: template.starts_at,
            ends_at: template.ends_at,
            color: template.color.clone(),
            is_locked: template.is_locked,
            recurrence_parent_id: template.recurrence_parent_id.clone(),
        }
    }

    /// Materialize one occurrence of a recurring master at `starts_at`.
    pub fn occurrence(template: &EventTemplate, starts_at: DateTime<Utc>) -> Self {
        EventInstance {
            id: instance_id(&template.id, starts_at.date_naive()),
            title: template.title.clone(),
            description: template.description.clone(),
            starts_at,
            ends_at: starts_at + template.duration(),
            color: template.color.clone(),
            is_locked: template.is_locked,
            recurrence_parent_id: Some(template.id.clone()),
        }
    }

    pub fn duration(&self) -> Duration {
        self.ends_at - self.starts_at
    }

    /// Calendar date this instance renders on.
    pub fn date(&self) -> NaiveDate {
        self.starts_at.date_naive()
    }

    /// Whether this instance was derived from a recurring master.
    pub fn is_derived(&self) -> bool {
        parse_instance_id(&self.id).is_some()
    }
}

/// Compose the synthetic id for an occurrence of `parent_id` on `date`.
pub fn instance_id(parent_id: &str, date: NaiveDate) -> String {
    format!(
        "{}{}{}",
        parent_id,
        INSTANCE_ID_SEPARATOR,
        date.format("%Y-%m-%d")
    )
}

/// Split a synthetic instance id back into parent id and occurrence date.
/// Returns `None` for ordinary store ids.
pub fn parse_instance_id(id: &str) -> Option<(&str, NaiveDate)> {
    let (parent, date) = id.rsplit_once(INSTANCE_ID_SEPARATOR)?;
    if parent.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((parent, date))
}
