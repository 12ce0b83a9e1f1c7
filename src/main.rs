mod commands;
mod config;
mod render;
mod store;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::store::Store;

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "Plan your days: recurring events, conflicts and focus time in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new event
    New(commands::new::NewArgs),
    /// List events in a date window, grouped by day
    Agenda {
        /// First day (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD, default a week out)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Show one day with side-by-side lanes and focus blocks
    Day {
        /// The day to show (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// List scheduling conflicts with suggested alternatives
    Conflicts {
        /// First day (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD, default a week out)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Move an event or a single occurrence to a new slot
    Move {
        /// Event id, or occurrence id like "<id>_YYYY-MM-DD"
        id: String,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// Drop time (HH:MM, snapped to half hours)
        #[arg(long, conflicts_with = "offset")]
        time: Option<NaiveTime>,
        /// Drop offset in minutes from midnight
        #[arg(long)]
        offset: Option<i64>,
    },
    /// Delete an event, or exclude a single occurrence
    Remove {
        id: String,
        /// Only remove the occurrence on this date (YYYY-MM-DD)
        #[arg(long)]
        occurrence: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TEMPO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;
    let mut store = Store::open(&config::store_path(&cfg)?)?;
    let focus_blocks = cfg.focus();

    match cli.command {
        Commands::New(args) => commands::new::run(&mut store, &focus_blocks, args),
        Commands::Agenda { from, to } => commands::agenda::run(&store, from, to),
        Commands::Day { date } => commands::day::run(&store, date, &focus_blocks),
        Commands::Conflicts { from, to } => commands::conflicts::run(&store, from, to),
        Commands::Move {
            id,
            to,
            time,
            offset,
        } => commands::move_cmd::run(&mut store, &id, to, time, offset),
        Commands::Remove { id, occurrence } => commands::remove::run(&mut store, &id, occurrence),
    }
}
