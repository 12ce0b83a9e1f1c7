//! Move an event or a single occurrence to a new slot.
//!
//! The CLI equivalent of a drag-and-drop: build the payload, run the
//! rescheduler, apply the resulting mutations to the store.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime, Timelike};
use owo_colors::OwoColorize;
use tempo_core::{
    parse_instance_id, recurrence, reschedule, DragPayload, EventInstance, Reschedule,
    ScheduleError, ScheduleResult,
};

use crate::commands::day_window;
use crate::store::Store;

pub fn run(
    store: &mut Store,
    id: &str,
    target_date: NaiveDate,
    time: Option<NaiveTime>,
    offset: Option<i64>,
) -> Result<()> {
    let payload = payload_for(store, id)?;

    let offset_minutes = match (time, offset) {
        (Some(time), _) => i64::from(time.hour()) * 60 + i64::from(time.minute()),
        (None, Some(offset)) => offset,
        // No drop time given: keep the event's current start time
        (None, None) => {
            i64::from(payload.time_start.hour()) * 60 + i64::from(payload.time_start.minute())
        }
    };

    match reschedule::reschedule(&payload, target_date, offset_minutes) {
        Ok(outcome) => {
            describe(&outcome, &payload);
            for mutation in outcome.into_mutations() {
                store.apply(mutation);
            }
            store.save()?;
            Ok(())
        }
        Err(ScheduleError::LockedEvent { .. }) => {
            println!("{}", "Rejected: locked".red());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn describe(outcome: &Reschedule, payload: &DragPayload) {
    match outcome {
        Reschedule::Update { starts_at, ends_at, .. } => {
            println!(
                "Moved {} to {}",
                payload.title.bold(),
                format!(
                    "{} {}-{}",
                    starts_at.format("%a %b %-d"),
                    starts_at.format("%H:%M"),
                    ends_at.format("%H:%M")
                )
            );
        }
        Reschedule::ForkAndException { exception, replacement } => {
            println!(
                "Forked {} out of its series: {} is now excepted, new event at {} {}",
                payload.title.bold(),
                exception.date,
                replacement.starts_at.format("%a %b %-d"),
                replacement.starts_at.format("%H:%M")
            );
        }
    }
}

/// Build the drag payload for a store id or a synthetic occurrence id.
fn payload_for(store: &Store, id: &str) -> ScheduleResult<DragPayload> {
    if let Some((parent, date)) = parse_instance_id(id) {
        let template = store
            .get(parent)
            .ok_or_else(|| ScheduleError::UnknownEvent(parent.to_string()))?;

        // Re-expand just that day to confirm the occurrence exists
        let (window_start, window_end) = day_window(date, date);
        let expansion = recurrence::expand(template, window_start, window_end)?;
        let instance = expansion
            .instances
            .into_iter()
            .find(|instance| instance.id == id)
            .ok_or_else(|| ScheduleError::UnknownEvent(id.to_string()))?;

        Ok(DragPayload::from_instance(&instance))
    } else {
        let template = store
            .get(id)
            .ok_or_else(|| ScheduleError::UnknownEvent(id.to_string()))?;
        Ok(DragPayload::from_instance(&EventInstance::standalone(
            template,
        )))
    }
}
