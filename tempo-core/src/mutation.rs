//! Store mutation payloads.
//!
//! The engine never writes storage itself. Reschedules and occurrence
//! deletions compile down to these records, which the hosting store
//! applies transactionally.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::event::EventTemplate;

/// A single write request for the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Persist a brand-new event template.
    Create { event: EventTemplate },
    /// Move an existing event in place.
    Update {
        id: String,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
    /// Exclude one date from a recurring master's expansion. A missing
    /// parent makes this a no-op at the store, never an error.
    AddException { parent_id: String, date: NaiveDate },
}
