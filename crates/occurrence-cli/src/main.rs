//! `occur` CLI — expand stored team events into calendar occurrences.
//!
//! ## Usage
//!
//! ```sh
//! # Occurrences on one day (templates as a JSON array on stdin)
//! cat events.json | occur on 2024-01-03
//!
//! # A week's agenda in the team's time zone
//! occur --tz America/Chicago agenda 2024-01-01 2024-01-07 -i events.json
//!
//! # Same agenda as JSON keyed by day
//! occur agenda 2024-01-01 2024-01-07 -i events.json --json
//!
//! # Show which repeat type each template expands with (fixed clock)
//! occur --now 2024-06-01T00:00:00Z infer -i events.json
//! ```
//!
//! Set `RUST_LOG` (or pass `-v`) to see which templates are skipped or have
//! their repeat type inferred.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use occurrence_engine::{
    Clock, DstPolicy, EventOccurrence, EventTemplate, ExpandOptions, FixedClock, SystemClock,
};
use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "occur",
    version,
    about = "Expand repeating team events into calendar occurrences"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Calendar time zone (IANA name) used to decide which day an occurrence is on
    #[arg(long, global = true, default_value = "UTC")]
    tz: String,

    /// Current time for the repeat-type fallback (RFC 3339); defaults to the system clock
    #[arg(long, global = true)]
    now: Option<String>,

    /// Maximum instances generated per template
    #[arg(long, global = true)]
    max_instances: Option<u32>,

    /// Drop occurrences whose local time falls in a DST gap instead of shifting them
    #[arg(long, global = true)]
    skip_dst_gaps: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List occurrences on a single calendar day as JSON
    On {
        /// Calendar day (YYYY-MM-DD)
        date: String,
        /// Templates JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show occurrences between two days, grouped by day
    Agenda {
        /// First day (YYYY-MM-DD)
        from: String,
        /// Last day, inclusive (YYYY-MM-DD)
        to: String,
        /// Templates JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Print JSON keyed by day instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the repeat type each template expands with
    Infer {
        /// Templates JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = build_options(&cli)?;
    let clock = build_clock(cli.now.as_deref())?;

    match cli.command {
        Commands::On {
            date,
            input,
            output,
        } => {
            let templates = read_templates(input.as_deref())?;
            let date = parse_day(&date)?;
            let occurrences: Vec<EventOccurrence> = templates
                .iter()
                .flat_map(|t| occurrence_engine::occurrences_on_date(t, date, &options, &*clock))
                .collect();
            let json = serde_json::to_string_pretty(&occurrences)?;
            write_output(output.as_deref(), &json)?;
        }
        Commands::Agenda {
            from,
            to,
            input,
            output,
            json,
        } => {
            let templates = read_templates(input.as_deref())?;
            let from = parse_day(&from)?;
            let to = parse_day(&to)?;
            if from > to {
                anyhow::bail!("Agenda start {} is after its end {}", from, to);
            }
            let days = occurrence_engine::agenda(&templates, from, to, &options, &*clock);
            let rendered = if json {
                let keyed: BTreeMap<String, Vec<EventOccurrence>> = days
                    .into_iter()
                    .map(|(day, occurrences)| (day.to_string(), occurrences))
                    .collect();
                serde_json::to_string_pretty(&keyed)?
            } else {
                render_agenda(&days, &options)
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Infer { input } => {
            let templates = read_templates(input.as_deref())?;
            let now = clock.now();
            for template in &templates {
                println!("{}", describe_repeat_type(template, now));
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn build_options(cli: &Cli) -> Result<ExpandOptions> {
    let timezone = occurrence_engine::parse_timezone(&cli.tz)
        .with_context(|| format!("Unknown time zone: {}", cli.tz))?;
    let mut options = ExpandOptions::new().with_timezone(timezone);
    if let Some(max) = cli.max_instances {
        options = options.with_max_instances(max);
    }
    if cli.skip_dst_gaps {
        options = options.with_dst_policy(DstPolicy::Skip);
    }
    Ok(options)
}

fn build_clock(now: Option<&str>) -> Result<Box<dyn Clock>> {
    match now {
        Some(s) => {
            let now = occurrence_engine::parse_datetime(s)
                .with_context(|| format!("Invalid --now value: {}", s))?;
            Ok(Box::new(FixedClock(now)))
        }
        None => Ok(Box::new(SystemClock)),
    }
}

fn parse_day(s: &str) -> Result<NaiveDate> {
    occurrence_engine::parse_date(s).with_context(|| format!("Invalid date: {}", s))
}

/// One line per template: id, repeat type, and where the type came from.
fn describe_repeat_type(template: &EventTemplate, now: chrono::DateTime<chrono::Utc>) -> String {
    if !template.repeats() {
        return format!("{}\t-\tone-off", template.id);
    }
    let source = if template.repeat_type.is_some() {
        "explicit"
    } else {
        "inferred"
    };
    let repeat_type = occurrence_engine::effective_repeat_type(template, now);
    format!("{}\t{}\t{}", template.id, repeat_type, source)
}

fn render_agenda(
    days: &BTreeMap<NaiveDate, Vec<EventOccurrence>>,
    options: &ExpandOptions,
) -> String {
    let mut out = String::new();
    for (day, occurrences) in days {
        out.push_str(&format!("{}\n", day.format("%a %Y-%m-%d")));
        for occ in occurrences {
            let local = occ.start_time.with_timezone(&options.timezone);
            let number = if occ.is_recurring_instance {
                format!(" #{}", occ.occurrence_number)
            } else {
                String::new()
            };
            out.push_str(&format!(
                "  {}  {} ({}){}\n",
                local.format("%H:%M"),
                occ.name,
                occ.id,
                number
            ));
        }
    }
    out
}

fn read_templates(path: Option<&str>) -> Result<Vec<EventTemplate>> {
    let json = read_input(path)?;
    occurrence_engine::templates_from_json(&json).context("Failed to parse event templates")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None if content.ends_with('\n') => print!("{}", content),
        None => println!("{}", content),
    }
    Ok(())
}
