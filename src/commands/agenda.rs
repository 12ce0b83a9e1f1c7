//! Windowed agenda: expanded instances grouped by day.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use owo_colors::OwoColorize;
use tempo_core::{conflict, recurrence};

use crate::commands::{day_window, AGENDA_DAYS};
use crate::render;
use crate::store::Store;

pub fn run(store: &Store, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let from = from.unwrap_or(today);
    let to = to.unwrap_or(from + Duration::days(AGENDA_DAYS - 1));
    let (window_start, window_end) = day_window(from, to);

    // One expansion pass feeds both the listing and conflict markers
    let expansion = recurrence::expand_window(&store.events, window_start, window_end);
    if expansion.truncated {
        println!(
            "{}",
            "Some events were cut off by the expansion cap; narrow the range to see everything."
                .yellow()
        );
    }

    if expansion.instances.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    let conflicts = conflict::detect_all(&expansion.instances);
    let conflicted: HashSet<&str> = conflicts.iter().map(|c| c.event_id.as_str()).collect();

    let mut current: Option<NaiveDate> = None;
    for instance in &expansion.instances {
        let date = instance.date();
        if current != Some(date) {
            if current.is_some() {
                println!();
            }
            println!("{}", render::date_label(date).bold());
            current = Some(date);
        }

        let marker = if conflicted.contains(instance.id.as_str()) {
            format!(" {}", "(conflict)".yellow())
        } else {
            String::new()
        };
        println!(
            "  {} {}{}",
            render::time_range(instance),
            instance.title,
            marker
        );
    }

    Ok(())
}
