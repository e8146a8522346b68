//! sigwatch CLI
//!
//! Detects and ranks signals in exported data points, checks configured feeds
//! and prints the effective configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sigwatch_core::{AggregationConfig, DataPoint, SourceConfiguration, SourceType, TimeWindow};
use sigwatch_runtime::{SignalDetector, SigwatchConfig};
use sigwatch_sources::MemorySource;

#[derive(Parser)]
#[command(name = "sigwatch")]
#[command(author, version, about = "sigwatch: signal detection and scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect signals in a JSON file of data points
    Detect {
        /// JSON array of data points
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write detected signals as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only consider the last N hours (default: the span of the input)
        #[arg(long)]
        since_hours: Option<i64>,

        /// Number of ranked signals to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Check availability of the configured feeds
    Health {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let result = match cli.command {
        Commands::Detect {
            input,
            config,
            output,
            since_hours,
            limit,
        } => run_detect(&input, config.as_deref(), output, since_hours, limit).await,
        Commands::Health { config } => check_health(&config).await,
        Commands::Config { config } => print_config(config.as_deref()),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SigwatchConfig> {
    match path {
        Some(path) => SigwatchConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(SigwatchConfig::default()),
    }
}

async fn run_detect(
    input: &Path,
    config_path: Option<&Path>,
    output: Option<PathBuf>,
    since_hours: Option<i64>,
    limit: usize,
) -> Result<()> {
    let config = load_config(config_path)?;

    let text = fs::read_to_string(input)
        .with_context(|| format!("reading data points from {}", input.display()))?;
    let points: Vec<DataPoint> = serde_json::from_str(&text)
        .with_context(|| format!("parsing data points in {}", input.display()))?;

    println!("📥 Loaded {} data points from {}", points.len(), input.display());

    let window = match since_hours {
        Some(hours) => TimeWindow::try_last_hours(hours)
            .ok_or_else(|| anyhow::anyhow!("--since-hours {} is out of range", hours))?,
        None => TimeWindow::covering(&points)
            .ok_or_else(|| anyhow::anyhow!("{} contains no data points", input.display()))?,
    };

    // One in-memory source per source type present in the input
    let mut by_type: BTreeMap<SourceType, Vec<DataPoint>> = BTreeMap::new();
    for point in points {
        by_type.entry(point.source_type).or_default().push(point);
    }

    let aggregator = config.aggregator();
    for (source_type, points) in by_type.iter() {
        let configuration = config
            .sources
            .iter()
            .find(|entry| entry.source_type == *source_type)
            .map(|entry| entry.configuration())
            .unwrap_or_else(|| SourceConfiguration::new(*source_type));
        let source = MemorySource::new(source_type.as_str(), points.clone());
        aggregator.register_source(Arc::new(source), configuration);
    }

    let request = AggregationConfig::new(by_type.keys().copied().collect(), window)
        .with_min_data_points(config.detection.min_evidence_points);

    let detector = SignalDetector::new(Arc::new(aggregator), config.detection.clone())
        .with_scoring_weights(config.scoring);
    detector.on_signal_detected(|signal| {
        info!("{} {} ({:?})", signal.signal_type, signal.title, signal.strength);
        Ok(())
    });

    println!("🔎 Detecting signals over {:.1}h...\n", window.hours());
    let signals = detector.detect_from_sources(&request).await;

    if signals.is_empty() {
        println!("⚠️  No signals detected.");
        println!("   Try a wider window or lower thresholds in the config.");
    } else {
        println!("✅ Detected {} signals\n", signals.len());
        for (rank, trending) in detector.get_trending_signals(limit).iter().enumerate() {
            let signal = &trending.signal;
            println!(
                "{:>2}. [{}] {} | score {:.2} | confidence {:.2} | relevance {:.2} | {:?}",
                rank + 1,
                signal.signal_type,
                signal.title,
                trending.score.overall_score,
                signal.confidence,
                signal.relevance,
                signal.strength,
            );
            if !signal.keywords.is_empty() {
                println!("    keywords: {}", signal.keywords.join(", "));
            }
        }
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&signals)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("\n📄 Signals saved to: {}", path.display());
    }

    let stats = detector.statistics();
    println!("\n📊 Active signals: {}", stats.active_signals);
    for (signal_type, count) in &stats.signals_by_type {
        println!("   {}: {}", signal_type, count);
    }

    Ok(())
}

async fn check_health(config_path: &Path) -> Result<()> {
    let config = load_config(Some(config_path))?;
    let aggregator = config.aggregator();
    let registered = config.register_feeds(&aggregator)?;

    if registered == 0 {
        println!("⚠️  No feeds with an endpoint in {}", config_path.display());
        return Ok(());
    }

    println!("🔌 Checking {} feeds...\n", registered);
    for (source_type, healthy) in aggregator.check_sources_health().await {
        let endpoint = aggregator
            .get_source_configuration(source_type)
            .and_then(|c| c.settings.endpoint)
            .unwrap_or_default();
        if healthy {
            println!("✅ {} ({})", source_type, endpoint);
        } else {
            println!("❌ {} ({})", source_type, endpoint);
        }
    }

    Ok(())
}

fn print_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
