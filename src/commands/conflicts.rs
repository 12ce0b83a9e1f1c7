//! List scheduling conflicts with suggested alternatives.

use std::collections::HashMap;

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

    let expansion = recurrence::expand_window(&store.events, window_start, window_end);
    let conflicts = conflict::detect_all(&expansion.instances);

    if conflicts.is_empty() {
        println!("{}", "No conflicts".green());
        return Ok(());
    }

    let titles: HashMap<&str, &str> = expansion
        .instances
        .iter()
        .map(|i| (i.id.as_str(), i.title.as_str()))
        .collect();

    for conflict in &conflicts {
        let title = *titles.get(conflict.event_id.as_str()).unwrap_or(&"?");
        let others: Vec<String> = conflict
            .conflicting_event_ids
            .iter()
            .map(|id| titles.get(id.as_str()).unwrap_or(&"?").to_string())
            .collect();

        println!("{}", render::conflict_line(conflict, title, &others));
        for suggestion in &conflict.suggestions {
            println!("    try {}", suggestion.dimmed());
        }
    }

    Ok(())
}
