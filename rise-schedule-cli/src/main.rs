mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::OutputFormat;

#[derive(Parser)]
#[command(name = "rise-schedule")]
#[command(about = "Expand Rise facility schedules into calendar events")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand one weekly schedule into occurrences
    Expand {
        /// Day of week (Monday..Sunday, any case)
        #[arg(short, long)]
        day: String,

        /// First possible date (YYYY-MM-DD), defaults to today
        #[arg(short = 's', long)]
        start_date: Option<String>,

        /// Last possible date (YYYY-MM-DD), defaults to five months after the start
        #[arg(short = 'e', long)]
        end_date: Option<String>,

        /// Daily start time (HH:MM)
        #[arg(long)]
        start_time: String,

        /// Daily end time (HH:MM)
        #[arg(long)]
        end_time: String,

        /// Event title used in ICS output
        #[arg(long, default_value = "Practice")]
        title: String,

        /// Write a single recurring VEVENT instead of one per occurrence (ICS only)
        #[arg(long)]
        collapse: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Output file path, stdout when absent
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Expand the seed practice tables into event rows
    Seed {
        /// JSON practices file, built-in tables when absent
        #[arg(long)]
        file: Option<String>,

        /// Email recorded as creator of every row
        #[arg(long, default_value = rise_schedule_core::seed::DEFAULT_SEED_AUTHOR)]
        created_by: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Output file path, stdout when absent
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List membership eligibility of the seed practices
    Eligibility {
        /// JSON practices file, built-in tables when absent
        #[arg(long)]
        file: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Output file path, stdout when absent
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List accepted day names
    Days,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rise_schedule_cli={log_level},rise_schedule_core={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Expand {
            day,
            start_date,
            end_date,
            start_time,
            end_time,
            title,
            collapse,
            format,
            output,
        } => commands::expand_command(commands::ExpandParams {
            day,
            start_date,
            end_date,
            start_time,
            end_time,
            title,
            collapse,
            format,
            output,
        }),

        Commands::Seed {
            file,
            created_by,
            format,
            output,
        } => commands::seed_command(commands::SeedParams {
            file,
            created_by,
            format,
            output,
        }),

        Commands::Eligibility {
            file,
            format,
            output,
        } => commands::eligibility_command(file.as_deref(), format, output.as_deref()),

        Commands::Days => commands::days_command(),
    }
}
