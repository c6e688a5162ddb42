// Retarget attack simulator
// Replays hash-rate spikes against the retarget algorithms and prints every block

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use retarget_core::RetargetAlgorithm;
use retarget_miner::simulation::{compare, AttackSimulator, ScenarioPreset, SimEvent};
use retarget_miner::SimConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "retarget-sim")]
#[command(about = "Replay hash-rate attacks against proof-of-work retarget algorithms", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Retarget algorithm (lwma, zcash); overrides the configuration file
    #[arg(short, long)]
    algorithm: Option<RetargetAlgorithm>,

    /// Scenario preset (no-attack, spike-5m, spike-1h, spike-24h)
    #[arg(short, long)]
    scenario: Option<ScenarioPreset>,

    /// Play the scenario under every algorithm and compare the results
    #[arg(long)]
    compare: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Only print phase transitions and summaries
    #[arg(short, long)]
    quiet: bool,

    /// Log every block to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Write the default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for reports
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.write_default_config {
        SimConfig::default()
            .save(path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default configuration written to {}", path.display());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(preset) = cli.scenario {
        info!(preset = %preset, "using scenario preset");
        config.scenario = preset.scenario();
    }

    if cli.compare {
        return run_compare(&config, cli.format);
    }

    let mut simulator = AttackSimulator::new(config.algorithm, config.consensus, config.scenario)
        .context("Failed to set up simulation")?;

    let mut write_error = None;
    let outcome = simulator.run_with(|event| {
        if cli.quiet && !event.is_transition() {
            return;
        }
        if let Err(e) = print_event(event, cli.format) {
            write_error.get_or_insert(e);
        }
    });
    if let Some(e) = write_error {
        return Err(e);
    }

    match cli.format {
        OutputFormat::Text => println!("{}", outcome.render_text()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&outcome).context("Failed to encode outcome")?
        ),
    }

    Ok(())
}

fn run_compare(config: &SimConfig, format: OutputFormat) -> Result<()> {
    let outcomes = compare(&config.consensus, &config.scenario)
        .context("Failed to run comparison")?;

    for outcome in &outcomes {
        match format {
            OutputFormat::Text => println!("{}", outcome.render_text()),
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string(outcome).context("Failed to encode outcome")?
            ),
        }
    }

    Ok(())
}

fn print_event(event: &SimEvent, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for line in event.render_text() {
                println!("{line}");
            }
        }
        OutputFormat::Json => {
            println!("{}", event.render_json().context("Failed to encode event")?);
        }
    }
    Ok(())
}
