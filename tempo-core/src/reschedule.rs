//! Drag-and-drop rescheduling.
//!
//! Converts a drop position into a concrete move. Plain events update in
//! place; derived instances of a recurring series fork: the original date
//! becomes an exception on the parent and a standalone replacement is
//! created at the new time. The drag payload is an explicit value passed
//! end to end, never ambient state.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::event::{parse_instance_id, EventInstance, EventTemplate};
use crate::mutation::Mutation;

/// Drop positions snap to this grid.
pub const SNAP_MINUTES: i64 = 30;

/// The JSON payload handed around by drag-and-drop.
///
/// The engine's one wire format; it must round-trip through JSON exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub time_end: NaiveTime,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_parent_id: Option<String>,
}

impl DragPayload {
    pub fn from_instance(instance: &EventInstance) -> Self {
        DragPayload {
            id: instance.id.clone(),
            title: instance.title.clone(),
            description: instance.description.clone(),
            date: instance.date(),
            time_start: instance.starts_at.time(),
            time_end: instance.ends_at.time(),
            is_locked: instance.is_locked,
            color: instance.color.clone(),
            recurrence_parent_id: instance.recurrence_parent_id.clone(),
        }
    }

    /// Duration implied by the payload times. An end at or before the
    /// start means the event runs past midnight.
    pub fn duration(&self) -> Duration {
        let duration = self.time_end - self.time_start;
        if duration < Duration::zero() {
            duration + Duration::days(1)
        } else {
            duration
        }
    }
}

/// "HH:MM" times on the drag wire format.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Exception-add request targeted at a recurring master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionAdd {
    pub parent_id: String,
    pub date: NaiveDate,
}

/// Outcome of a reschedule: what the store should persist.
#[derive(Debug, Clone, PartialEq)]
pub enum Reschedule {
    /// Plain event: move it in place.
    Update {
        id: String,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
    /// Derived instance: except the original date on the parent and
    /// create a standalone replacement at the new time.
    ForkAndException {
        exception: ExceptionAdd,
        replacement: EventTemplate,
    },
}

impl Reschedule {
    /// Store-write payloads for this outcome, in application order.
    pub fn into_mutations(self) -> Vec<Mutation> {
        match self {
            Reschedule::Update {
                id,
                starts_at,
                ends_at,
            } => vec![Mutation::Update {
                id,
                starts_at,
                ends_at,
            }],
            Reschedule::ForkAndException {
                exception,
                replacement,
            } => vec![
                Mutation::AddException {
                    parent_id: exception.parent_id,
                    date: exception.date,
                },
                Mutation::Create { event: replacement },
            ],
        }
    }
}

/// Snap a minutes-from-midnight drop offset to the nearest half-hour
/// cell. Exact quarter-hour midpoints round up.
pub fn snap_offset(pointer_offset_minutes: i64) -> i64 {
    let snapped =
        (pointer_offset_minutes + SNAP_MINUTES / 2).div_euclid(SNAP_MINUTES) * SNAP_MINUTES;
    snapped.clamp(0, 24 * 60 - SNAP_MINUTES)
}

/// Reschedule a dropped event to `target_date` at the snapped offset.
///
/// The original duration is always preserved. Only a synthetic instance
/// id takes the fork path: a stored event that carries a provenance
/// `recurrence_parent_id` from an earlier fork still updates in place,
/// so repeating a reschedule never stacks exceptions.
pub fn reschedule(
    dropped: &DragPayload,
    target_date: NaiveDate,
    pointer_offset_minutes: i64,
) -> ScheduleResult<Reschedule> {
    if dropped.is_locked {
        return Err(ScheduleError::LockedEvent {
            id: dropped.id.clone(),
        });
    }

    let offset = snap_offset(pointer_offset_minutes);
    let starts_at = (target_date.and_time(NaiveTime::MIN) + Duration::minutes(offset)).and_utc();
    let ends_at = starts_at + dropped.duration();

    match parse_instance_id(&dropped.id) {
        Some((parent, original_date)) => {
            let parent_id = dropped
                .recurrence_parent_id
                .clone()
                .unwrap_or_else(|| parent.to_string());

            let mut replacement = EventTemplate::new(&dropped.title, starts_at, ends_at);
            replacement.description = dropped.description.clone();
            replacement.color = dropped.color.clone();
            replacement.recurrence_parent_id = Some(parent_id.clone());

            Ok(Reschedule::ForkAndException {
                exception: ExceptionAdd {
                    parent_id,
                    date: original_date,
                },
                replacement,
            })
        }
        None => Ok(Reschedule::Update {
            id: dropped.id.clone(),
            starts_at,
            ends_at,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn standup_instance() -> DragPayload {
        // Tuesday occurrence of a recurring standup
        DragPayload {
            id: "local-standup_2024-01-09".to_string(),
            title: "Standup".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            time_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            time_end: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            is_locked: false,
            color: Some("teal".to_string()),
            recurrence_parent_id: Some("local-standup".to_string()),
        }
    }

    #[test]
    fn test_snap_offset_to_half_hours() {
        assert_eq!(snap_offset(0), 0);
        assert_eq!(snap_offset(14), 0);
        assert_eq!(snap_offset(15), 30);
        assert_eq!(snap_offset(44), 30);
        assert_eq!(snap_offset(45), 60);
        assert_eq!(snap_offset(614), 600);
        assert_eq!(snap_offset(1439), 1410);
        assert_eq!(snap_offset(-10), 0);
    }

    #[test]
    fn test_instance_drop_forks_with_exception() {
        let payload = standup_instance();
        let thursday = NaiveDate::from_ymd_opt(2024, 1, 11).unwrap();

        let outcome = reschedule(&payload, thursday, 14 * 60).unwrap();
        let Reschedule::ForkAndException {
            exception,
            replacement,
        } = outcome
        else {
            panic!("expected fork");
        };

        assert_eq!(exception.parent_id, "local-standup");
        assert_eq!(exception.date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(
            replacement.starts_at,
            Utc.with_ymd_and_hms(2024, 1, 11, 14, 0, 0).unwrap()
        );
        assert_eq!(
            replacement.ends_at,
            Utc.with_ymd_and_hms(2024, 1, 11, 14, 30, 0).unwrap()
        );
        assert_eq!(
            replacement.recurrence_parent_id,
            Some("local-standup".to_string())
        );
        assert!(!replacement.is_recurring);
        assert!(replacement.id.starts_with("local-"));
        assert_eq!(replacement.color, Some("teal".to_string()));
    }

    #[test]
    fn test_forked_event_updates_in_place() {
        // The standalone created by a fork keeps its provenance link but
        // has a real store id: moving it again is a plain update.
        let payload = DragPayload {
            id: "local-77aa12".to_string(),
            recurrence_parent_id: Some("local-standup".to_string()),
            ..standup_instance()
        };
        let friday = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();

        let outcome = reschedule(&payload, friday, 10 * 60).unwrap();
        match outcome {
            Reschedule::Update { id, starts_at, ends_at } => {
                assert_eq!(id, "local-77aa12");
                assert_eq!(starts_at, Utc.with_ymd_and_hms(2024, 1, 12, 10, 0, 0).unwrap());
                assert_eq!(ends_at - starts_at, Duration::minutes(30));
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_locked_event_is_rejected() {
        let payload = DragPayload {
            id: "local-locked".to_string(),
            is_locked: true,
            recurrence_parent_id: None,
            ..standup_instance()
        };
        let target = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();

        assert!(matches!(
            reschedule(&payload, target, 600),
            Err(ScheduleError::LockedEvent { .. })
        ));
    }

    #[test]
    fn test_duration_preserved_through_snapping() {
        let payload = DragPayload {
            id: "local-review".to_string(),
            time_start: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            time_end: NaiveTime::from_hms_opt(14, 45, 0).unwrap(),
            recurrence_parent_id: None,
            ..standup_instance()
        };
        let target = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        // 11:20 snaps to 11:30
        let outcome = reschedule(&payload, target, 11 * 60 + 20).unwrap();
        match outcome {
            Reschedule::Update { starts_at, ends_at, .. } => {
                assert_eq!(starts_at, Utc.with_ymd_and_hms(2024, 2, 1, 11, 30, 0).unwrap());
                assert_eq!(ends_at - starts_at, Duration::minutes(105));
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_fork_mutations_in_application_order() {
        let payload = standup_instance();
        let target = NaiveDate::from_ymd_opt(2024, 1, 11).unwrap();

        let mutations = reschedule(&payload, target, 14 * 60)
            .unwrap()
            .into_mutations();

        assert_eq!(mutations.len(), 2);
        assert!(matches!(mutations[0], Mutation::AddException { .. }));
        assert!(matches!(mutations[1], Mutation::Create { .. }));
    }

    #[test]
    fn test_payload_roundtrips_exactly() {
        let payload = standup_instance();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": "local-standup_2024-01-09",
                "title": "Standup",
                "date": "2024-01-09",
                "timeStart": "09:00",
                "timeEnd": "09:30",
                "isLocked": false,
                "color": "teal",
                "recurrenceParentId": "local-standup",
            })
        );

        let back: DragPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_payload_from_instance() {
        let instance = EventInstance {
            id: "local-gym_2024-03-04".to_string(),
            title: "Gym".to_string(),
            description: Some("Leg day".to_string()),
            starts_at: Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2024, 3, 4, 19, 0, 0).unwrap(),
            color: None,
            is_locked: false,
            recurrence_parent_id: Some("local-gym".to_string()),
        };
        let payload = DragPayload::from_instance(&instance);

        assert_eq!(payload.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(payload.time_start, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(payload.duration(), Duration::hours(1));
    }
}
