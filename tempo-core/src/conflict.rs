//! Conflict detection between expanded instances.
//!
//! Overlap is judged on half-open `[starts_at, ends_at)` intervals, so
//! back-to-back events never conflict. Severity grades how much of the
//! shorter event is covered; suggestions probe the candidate's day for
//! nearby free slots.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::event::EventInstance;

/// Step used when probing for free alternative slots.
const SUGGESTION_STEP_MINUTES: i64 = 15;

/// Maximum number of alternative times suggested per conflict.
const MAX_SUGGESTIONS: usize = 3;

/// How badly two events collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

/// A detected scheduling conflict for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub event_id: String,
    pub conflicting_event_ids: BTreeSet<String>,
    pub severity: ConflictSeverity,
    /// Human-readable alternative start times, nearest first.
    pub suggestions: Vec<String>,
}

fn overlaps(a: &EventInstance, b: &EventInstance) -> bool {
    a.starts_at < b.ends_at && b.starts_at < a.ends_at
}

/// Grade one overlapping pair by how much of the shorter event is covered.
fn grade(a: &EventInstance, b: &EventInstance) -> ConflictSeverity {
    let overlap = a.ends_at.min(b.ends_at) - a.starts_at.max(b.starts_at);
    let shorter = a.duration().min(b.duration());
    let ratio = if shorter > Duration::zero() {
        overlap.num_seconds() as f64 / shorter.num_seconds() as f64
    } else {
        // A zero-length event inside another is fully covered.
        1.0
    };

    if ratio >= 0.75 {
        ConflictSeverity::High
    } else if ratio >= 0.25 {
        ConflictSeverity::Medium
    } else {
        ConflictSeverity::Low
    }
}

/// Compute the conflicts of `candidate` against an expanded instance set.
///
/// All overlapping events are grouped into one `Conflict` graded by the
/// worst pair. Symmetric: if A's conflict lists B, then B's lists A for
/// the same instance set.
pub fn detect(candidate: &EventInstance, all: &[EventInstance]) -> Vec<Conflict> {
    let overlapping: Vec<&EventInstance> = all
        .iter()
        .filter(|other| other.id != candidate.id)
        .filter(|other| overlaps(candidate, other))
        .collect();

    if overlapping.is_empty() {
        return Vec::new();
    }

    let severity = overlapping
        .iter()
        .map(|other| grade(candidate, other))
        .max()
        .unwrap_or(ConflictSeverity::Low);
    let suggestions = suggest(candidate, all);

    vec![Conflict {
        event_id: candidate.id.clone(),
        conflicting_event_ids: overlapping.iter().map(|o| o.id.clone()).collect(),
        severity,
        suggestions,
    }]
}

/// Conflicts for every instance in the set.
pub fn detect_all(instances: &[EventInstance]) -> Vec<Conflict> {
    instances
        .iter()
        .flat_map(|instance| detect(instance, instances))
        .collect()
}

fn is_free(
    start: DateTime<Utc>,
    duration: Duration,
    skip_id: &str,
    all: &[EventInstance],
) -> bool {
    let end = start + duration;
    all.iter()
        .filter(|other| other.id != skip_id)
        .all(|other| !(start < other.ends_at && other.starts_at < end))
}

/// Probe the candidate's day for up to three free start times, nearest
/// first, stepping outward in 15-minute increments. Falls back to the
/// next day at the same time when the whole day is booked.
fn suggest(candidate: &EventInstance, all: &[EventInstance]) -> Vec<String> {
    let duration = candidate.duration();
    let day = candidate.date();
    let day_start = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let day_end = day_start + Duration::days(1);
    let step = Duration::minutes(SUGGESTION_STEP_MINUTES);

    let mut found = Vec::new();
    let mut k = 1i32;
    loop {
        let after = candidate.starts_at + step * k;
        let before = candidate.starts_at - step * k;
        let after_fits = after + duration <= day_end;
        let before_fits = before >= day_start;

        if !after_fits && !before_fits {
            break;
        }
        if after_fits && is_free(after, duration, &candidate.id, all) {
            found.push(after);
        }
        if found.len() < MAX_SUGGESTIONS
            && before_fits
            && is_free(before, duration, &candidate.id, all)
        {
            found.push(before);
        }
        if found.len() >= MAX_SUGGESTIONS {
            found.truncate(MAX_SUGGESTIONS);
            break;
        }
        k += 1;
    }

    if found.is_empty() {
        found.push(candidate.starts_at + Duration::days(1));
    }
    found.iter().map(|at| format_suggestion(*at)).collect()
}

/// e.g. "Thu 10:15"
fn format_suggestion(at: DateTime<Utc>) -> String {
    at.format("%a %H:%M").to_string()
}
