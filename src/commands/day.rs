//! Single-day view with side-by-side lanes and focus-block flags.

use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use tempo_core::{focus, layout, recurrence, FocusBlock};

use crate::commands::day_window;
use crate::render;
use crate::store::Store;

pub fn run(store: &Store, date: NaiveDate, focus_blocks: &[FocusBlock]) -> Result<()> {
    let (window_start, window_end) = day_window(date, date);

    let expansion = recurrence::expand_window(&store.events, window_start, window_end);
    let lanes = layout::layout_day(&expansion.instances);

    println!("{}", render::date_label(date).bold());

    if expansion.instances.is_empty() {
        println!("  {}", "No events".dimmed());
        return Ok(());
    }

    for instance in &expansion.instances {
        let lane_tag = match lanes.get(&instance.id) {
            Some(lane) if lane.total_columns > 1 => {
                format!(" [{}/{}]", lane.column + 1, lane.total_columns)
            }
            _ => String::new(),
        };
        let focus_tag = match focus::protecting_block(instance.starts_at, focus_blocks) {
            Some(_) => format!(" {}", "(focus time)".purple()),
            None => String::new(),
        };

        println!(
            "  {} {}{}{}",
            render::time_range(instance),
            instance.title,
            lane_tag.dimmed(),
            focus_tag
        );
    }

    Ok(())
}
