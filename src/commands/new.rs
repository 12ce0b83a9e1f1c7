//! Create a new event, with advisory conflict and focus-time checks.

use anyhow::{anyhow, bail, Result};
use chrono::Duration;
use clap::Args;
use owo_colors::OwoColorize;
use tempo_core::{
    conflict, focus, recurrence, EventInstance, EventTemplate, FocusBlock, Frequency, Mutation,
    RecurrenceRule,
};

use crate::commands::{day_window, parse_datetime};
use crate::store::Store;

#[derive(Args)]
pub struct NewArgs {
    /// Event title
    pub title: String,

    /// Start date/time (e.g., "2025-03-20T15:00")
    #[arg(short, long)]
    pub start: String,

    /// End date/time
    #[arg(short, long, conflicts_with = "duration")]
    pub end: Option<String>,

    /// Duration (e.g., "30m", "1h", "2h 30m")
    #[arg(short, long, conflicts_with = "end")]
    pub duration: Option<String>,

    /// Event description
    #[arg(long)]
    pub description: Option<String>,

    /// Display color
    #[arg(long)]
    pub color: Option<String>,

    /// Protect the event from drag rescheduling
    #[arg(long)]
    pub lock: bool,

    /// Repeat frequency: daily, weekly, monthly or yearly
    #[arg(long)]
    pub repeat: Option<String>,

    /// Repeat every N days/weeks/months/years
    #[arg(long, default_value_t = 1)]
    pub interval: u32,

    /// Weekdays for weekly rules (e.g., "mon,wed,fri")
    #[arg(long)]
    pub on: Option<String>,

    /// Day of month for monthly rules
    #[arg(long)]
    pub day_of_month: Option<u32>,

    /// Month for yearly rules (1-12)
    #[arg(long)]
    pub month: Option<u32>,

    /// Stop after this many occurrences
    #[arg(long, conflicts_with = "until")]
    pub count: Option<u32>,

    /// Stop before this date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "count")]
    pub until: Option<chrono::NaiveDate>,
}

pub fn run(store: &mut Store, focus_blocks: &[FocusBlock], args: NewArgs) -> Result<()> {
    let starts_at = parse_datetime(&args.start)?;

    let ends_at = if let Some(end) = &args.end {
        parse_datetime(end)?
    } else if let Some(duration) = &args.duration {
        let duration = humantime::parse_duration(duration)
            .map_err(|e| anyhow!("Invalid duration '{}': {}", duration, e))?;
        starts_at + Duration::from_std(duration)?
    } else {
        starts_at + Duration::hours(1)
    };

    if ends_at <= starts_at {
        bail!("Event must end after it starts");
    }

    let mut template = EventTemplate::new(&args.title, starts_at, ends_at);
    if let Some(description) = &args.description {
        template = template.with_description(description);
    }
    if let Some(color) = &args.color {
        template = template.with_color(color);
    }
    if args.lock {
        template = template.locked();
    }
    if let Some(repeat) = &args.repeat {
        let rule = build_rule(repeat, &args)?;
        rule.validate().map_err(|reason| anyhow!("Invalid recurrence rule: {}", reason))?;
        template = template.with_rule(rule);
    }

    // Advisory checks: warn, never block
    let (window_start, window_end) = day_window(starts_at.date_naive(), starts_at.date_naive());
    let existing = recurrence::expand_window(&store.events, window_start, window_end);
    let candidate = EventInstance::standalone(&template);
    for conflict in conflict::detect(&candidate, &existing.instances) {
        println!(
            "{} overlaps {} other event(s) that day",
            "Heads up:".yellow(),
            conflict.conflicting_event_ids.len()
        );
        for suggestion in &conflict.suggestions {
            println!("    try {}", suggestion.dimmed());
        }
    }
    if let Some(block) = focus::protecting_block(starts_at, focus_blocks) {
        println!(
            "{} this lands in your focus time ({:02}:00-{:02}:00)",
            "Heads up:".yellow(),
            block.start_hour,
            block.end_hour
        );
    }

    let id = template.id.clone();
    store.apply(Mutation::Create { event: template });
    store.save()?;

    println!("Created: {} ({})", args.title, id);
    Ok(())
}

fn build_rule(repeat: &str, args: &NewArgs) -> Result<RecurrenceRule> {
    let frequency = match repeat {
        "daily" => Frequency::Daily,
        "weekly" => Frequency::Weekly,
        "monthly" => Frequency::Monthly,
        "yearly" => Frequency::Yearly,
        other => bail!(
            "Unknown frequency '{}'. Expected daily, weekly, monthly or yearly",
            other
        ),
    };

    let mut rule = match frequency {
        Frequency::Daily => RecurrenceRule::daily(),
        Frequency::Weekly => RecurrenceRule::weekly(),
        Frequency::Monthly => RecurrenceRule::monthly(),
        Frequency::Yearly => RecurrenceRule::yearly(),
    }
    .every(args.interval);

    if let Some(days) = &args.on {
        rule.days_of_week = days
            .split(',')
            .map(|day| parse_weekday(day.trim()))
            .collect::<Result<_>>()?;
    }
    rule.day_of_month = args.day_of_month;
    rule.month_of_year = args.month;
    rule.count = args.count;
    rule.end_date = args.until;

    Ok(rule)
}

/// Parse a weekday name to the engine's 0 = Sunday numbering.
fn parse_weekday(day: &str) -> Result<u8> {
    match day.to_ascii_lowercase().as_str() {
        "sun" | "sunday" => Ok(0),
        "mon" | "monday" => Ok(1),
        "tue" | "tuesday" => Ok(2),
        "wed" | "wednesday" => Ok(3),
        "thu" | "thursday" => Ok(4),
        "fri" | "friday" => Ok(5),
        "sat" | "saturday" => Ok(6),
        other => Err(anyhow!("Unknown weekday '{}'", other)),
    }
}
