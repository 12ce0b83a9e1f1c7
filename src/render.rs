//! Terminal rendering helpers for engine types.

use chrono::NaiveDate;
use owo_colors::OwoColorize;
use tempo_core::{Conflict, ConflictSeverity, EventInstance};

/// Format a date as a human-readable label (e.g. "Today", "Wed Jan 10")
pub fn date_label(date: NaiveDate) -> String {
    let today = chrono::Local::now().date_naive();

    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Format the time span of an instance (e.g. "09:00-09:30")
pub fn time_range(instance: &EventInstance) -> String {
    format!(
        "{}-{}",
        instance.starts_at.format("%H:%M"),
        instance.ends_at.format("%H:%M")
    )
}

pub fn severity(severity: ConflictSeverity) -> String {
    match severity {
        ConflictSeverity::High => "high".red().bold().to_string(),
        ConflictSeverity::Medium => "medium".yellow().to_string(),
        ConflictSeverity::Low => "low".dimmed().to_string(),
    }
}

/// One-line summary of a conflict, titles resolved by the caller.
pub fn conflict_line(conflict: &Conflict, title: &str, others: &[String]) -> String {
    format!(
        "{} {} overlaps {}",
        severity(conflict.severity),
        title.bold(),
        others.join(", ")
    )
}
