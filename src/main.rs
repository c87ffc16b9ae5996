//! CLI entry point: run the causal chain under each configured clock discipline and print the reports.

use std::path::PathBuf;

use causal_clocks::{load_config, ClockDiscipline, Config, LogMode, Simulation};
use clap::Parser;

/// Logical clock demonstration
#[derive(Parser, Debug)]
#[command(name = "causal-clocks", about = "Compare simple counters and Lamport clocks over the same causal chain.")]
pub struct Cli {
    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Clock discipline to run; repeat to run several (default: simple, then lamport)
    #[arg(short, long = "discipline", value_parser = parse_discipline)]
    disciplines: Vec<ClockDiscipline>,

    /// Event log concurrency model: channel or direct
    #[arg(long, value_parser = parse_log_mode)]
    log_mode: Option<LogMode>,

    /// Print reports as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Diagnostics level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_discipline(s: &str) -> Result<ClockDiscipline, String> {
    s.parse().map_err(|e: causal_clocks::SimError| e.to_string())
}

fn parse_log_mode(s: &str) -> Result<LogMode, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(&path.to_string_lossy())?,
        None => Config::default(),
    };
    if !cli.disciplines.is_empty() {
        config.simulation.disciplines = cli.disciplines.clone();
    }
    if let Some(mode) = cli.log_mode {
        config.simulation.log_mode = mode;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;

    // Diagnostics go to stderr so they never interleave with the reports.
    tracing_subscriber::fmt()
        .with_max_level(config.logging.max_level()?)
        .with_writer(std::io::stderr)
        .init();

    let simulation = Simulation::from_config(&config)?;
    let outcomes = simulation.run_all(&config.simulation.disciplines).await?;

    for outcome in &outcomes {
        if cli.json {
            println!("{}", outcome.report.to_json()?);
        } else {
            println!("{}", outcome.report);
        }
    }

    Ok(())
}
