mod commands;
mod dates;
mod render;

use anyhow::{Context, Result};
use calseries_core::config::CalseriesConfig;
use calseries_core::store::EventStore;
use calseries_core::{EventPatch, Scope};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::RuleArgs;
use dates::{parse_date, parse_time};

#[derive(Parser)]
#[command(name = "calseries")]
#[command(about = "Create recurring events and change them one occurrence, forward, or whole series at a time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dates a recurrence rule produces
    Expand {
        /// First occurrence (YYYY-MM-DD or e.g. "next monday")
        anchor: String,

        #[command(flatten)]
        rule: RuleArgs,

        /// Print dates as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Create an event, or a recurring series when --freq is given
    New {
        title: String,

        /// Date of the (first) event
        #[arg(short, long)]
        start: String,

        /// Start time (HH:MM); omit for all-day events
        #[arg(long)]
        at: Option<String>,

        /// End time (HH:MM)
        #[arg(long)]
        end_time: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[command(flatten)]
        rule: RuleArgs,
    },
    /// List stored events
    List {
        /// Only events of this series
        #[arg(long)]
        series: Option<String>,

        /// Only events on or after this date
        #[arg(long)]
        from: Option<String>,
    },
    /// Edit an event, its following occurrences, or its whole series
    Edit {
        /// Event id (or a unique prefix)
        id: String,

        /// this, future or all; asked interactively for recurring events
        #[arg(long)]
        scope: Option<Scope>,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Move the event to another date (single-event edits only)
        #[arg(long)]
        date: Option<String>,

        /// New start time (HH:MM)
        #[arg(long)]
        at: Option<String>,

        /// New end time (HH:MM)
        #[arg(long)]
        end_time: Option<String>,
    },
    /// Delete an event, its following occurrences, or its whole series
    Delete {
        /// Event id (or a unique prefix)
        id: String,

        /// this, future or all; asked interactively for recurring events
        #[arg(long)]
        scope: Option<Scope>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CalseriesConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log_level);

    tracing::debug!(store = %config.store_path().display(), "Configuration loaded");

    let store = EventStore::new(config.store_path());
    let limits = config.sequence_limits();

    match cli.command {
        Commands::Expand { anchor, rule, json } => commands::expand::run(&anchor, &rule, json, &limits),
        Commands::New {
            title,
            start,
            at,
            end_time,
            location,
            description,
            rule,
        } => {
            let new = commands::new::NewEvent {
                title,
                start,
                at,
                end_time,
                location,
                description,
            };
            commands::new::run(&store, new, &rule, limits)
        }
        Commands::List { series, from } => {
            let from = from.as_deref().map(parse_date).transpose()?;
            commands::list::run(&store, series.as_deref(), from)
        }
        Commands::Edit {
            id,
            scope,
            title,
            location,
            description,
            date,
            at,
            end_time,
        } => {
            let patch = EventPatch {
                title,
                location,
                description,
                date: date.as_deref().map(parse_date).transpose()?,
                start_time: at.as_deref().map(parse_time).transpose()?,
                end_time: end_time.as_deref().map(parse_time).transpose()?,
                recurrence: None,
            };
            commands::edit::run(&store, &id, scope, patch)
        }
        Commands::Delete { id, scope } => commands::delete::run(&store, &id, scope),
    }
}

/// Log to stderr. RUST_LOG wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
