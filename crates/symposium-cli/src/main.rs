//! Symposium CLI - starvation-free dining-philosophers demo

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use symposium_core::config::Config;
use symposium_core::events::{
    events_file_path, read_recent_events, EventSink, FanoutSink, JsonlEventSink, TracingSink,
};
use symposium_core::sim::Simulation;
use tracing::info;

#[derive(Parser)]
#[command(name = "symposium")]
#[command(author, version, about = "Starvation-free dining-philosophers arbiter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a dining simulation and print the final statistics
    Run {
        /// Number of seats in the ring
        #[arg(short, long)]
        seats: Option<usize>,

        /// Run duration in seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Upper bound for randomized think/eat phases, in milliseconds
        #[arg(long)]
        max_delay: Option<u64>,

        /// Join grace period after the stop signal, in seconds
        #[arg(long)]
        grace: Option<u64>,

        /// RNG seed for reproducible phase durations
        #[arg(long)]
        seed: Option<u64>,

        /// End the run early after this many meals
        #[arg(long)]
        max_meals: Option<u64>,

        /// Append protocol events to this JSONL file
        #[arg(long)]
        events_file: Option<PathBuf>,

        /// Narrate every transition through the logger
        #[arg(long)]
        narrate: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show recent entries from an event log
    Events {
        /// Event log file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the active configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write the default configuration file
    Init,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing; logs go to stderr so report output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("symposium_core=info".parse()?)
                .add_directive("symposium_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            seats,
            duration,
            max_delay,
            grace,
            seed,
            max_meals,
            events_file,
            narrate,
        } => {
            let mut config = Config::load()?;
            if let Some(seats) = seats {
                config.table.seats = seats;
            }
            if let Some(duration) = duration {
                config.run.duration_secs = duration;
            }
            if let Some(max_delay) = max_delay {
                config.delay.max_phase_delay_ms = max_delay;
            }
            if let Some(grace) = grace {
                config.run.grace_secs = grace;
            }
            if let Some(seed) = seed {
                config.delay.seed = Some(seed);
            }
            if max_meals.is_some() {
                config.run.max_meals = max_meals;
            }
            cmd_run(config, events_file, narrate, cli.format, cli.quiet)
        }

        Commands::Config { action } => cmd_config(action, cli.format),

        Commands::Events { file, count } => cmd_events(file, count, cli.format),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn cmd_run(
    config: Config,
    events_file: Option<PathBuf>,
    narrate: bool,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut sinks: Vec<Arc<dyn EventSink>> = Vec::new();
    if narrate {
        sinks.push(Arc::new(TracingSink));
    }
    if let Some(path) = &events_file {
        let sink = JsonlEventSink::create(path)?;
        info!(path = %path.display(), run_id = %sink.run_id(), "writing event log");
        sinks.push(Arc::new(sink));
    }

    let mut simulation = Simulation::new(config);
    if !sinks.is_empty() {
        simulation = simulation.with_sink(Arc::new(FanoutSink::new(sinks)));
    }

    let report = simulation.run()?;

    match format {
        OutputFormat::Text => {
            if !quiet {
                println!("{}", report);
            } else {
                println!("{}", report.total_meals());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            match format {
                OutputFormat::Text => print!("{}", toml::to_string_pretty(&config)?),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
        ConfigAction::Init => {
            let config = Config::default();
            config.save()?;
            println!("Wrote {}", Config::config_path()?.display());
        }
    }
    Ok(())
}

fn cmd_events(file: Option<PathBuf>, count: usize, format: OutputFormat) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(events_file_path);
    let records = read_recent_events(&path, count);

    match format {
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No events in {}", path.display());
            }
            for record in &records {
                println!(
                    "{} {}",
                    record.timestamp.format("%H:%M:%S%.3f"),
                    serde_json::to_string(&record.event)?
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
