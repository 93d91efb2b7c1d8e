//! Command-line interface for logs-monitor
//!
//! Reads an HTTP access log, once or continuously, and prints most-common
//! section reports and high-traffic alerts on the terminal.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use logs_monitor::aggregation::{AnalyticsConfig, TrafficMetric};
use logs_monitor::consumer::AnalyticsProcessor;
use logs_monitor::init_tracing;
use logs_monitor::notify::TerminalNotifier;
use logs_monitor::reader::{LogReader, ReaderConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// Monitor an HTTP access log for traffic patterns and spikes
#[derive(Parser, Debug)]
#[command(name = "logs-monitor")]
#[command(version = logs_monitor::VERSION)]
#[command(about = "Streaming analytics over HTTP access logs", long_about = None)]
struct Cli {
    /// Path to the HTTP access log (CSV)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Keep watching the file for new records until interrupted
    #[arg(short, long)]
    follow: bool,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON structured logging
    #[arg(long)]
    json_logs: bool,

    /// Disable colored alerts
    #[arg(long)]
    no_color: bool,

    /// YAML file with analytics settings; flags below override it
    #[arg(short, long, value_name = "YAML")]
    config: Option<PathBuf>,

    /// Window of the most-common report in seconds (<= 0 disables it)
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    stats_interval: Option<i64>,

    /// Window of the high-traffic alarm in seconds (<= 0 disables it)
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    high_traffic_interval: Option<i64>,

    /// Volume that raises the high-traffic alarm (<= 0 disables it)
    #[arg(long, value_name = "HITS", allow_negative_numbers = true)]
    high_traffic_threshold: Option<i64>,

    /// Seconds of out-of-order arrival tolerated
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    lateness_tolerance: Option<i64>,

    /// How traffic volume is measured against the threshold
    #[arg(long, value_enum)]
    traffic_metric: Option<MetricArg>,

    /// Delay between two reads in follow mode
    #[arg(long, value_name = "MILLIS", default_value = "1000")]
    poll_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    /// Number of hits in the window
    Count,
    /// Hits per second over the window
    Average,
}

impl From<MetricArg> for TrafficMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Count => TrafficMetric::Count,
            MetricArg::Average => TrafficMetric::Average,
        }
    }
}

impl Cli {
    /// Settings file as base, explicit flags on top
    fn analytics_config(&self) -> Result<AnalyticsConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyticsConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AnalyticsConfig::default(),
        };

        if let Some(seconds) = self.stats_interval {
            config.most_common_interval = seconds;
        }
        if let Some(seconds) = self.high_traffic_interval {
            config.high_traffic_interval = seconds;
        }
        if let Some(threshold) = self.high_traffic_threshold {
            config.high_traffic_threshold = threshold;
        }
        if let Some(seconds) = self.lateness_tolerance {
            config.lateness_tolerance = seconds;
        }
        if let Some(metric) = self.traffic_metric {
            config.traffic_metric = metric.into();
        }
        Ok(config)
    }

    fn reader_config(&self) -> ReaderConfig {
        ReaderConfig::new(&self.file)
            .follow(self.follow)
            .poll_interval(Duration::from_millis(self.poll_interval_ms))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(if cli.verbose { "debug" } else { "info" }, cli.json_logs);

    let config = cli.analytics_config()?;
    let notifier = Arc::new(TerminalNotifier::with_writer(
        Box::new(std::io::stdout()),
        !cli.no_color,
    ));
    notifier.print_header();

    let mut processor =
        AnalyticsProcessor::new(&config, notifier).context("Invalid analytics configuration")?;
    for calculator in processor.active_calculators() {
        info!(
            "Calculator {} active over {}s",
            calculator.name, calculator.window_size
        );
    }

    let mut reader = LogReader::new(cli.reader_config());
    if cli.follow {
        reader.follow(&mut processor, shutdown_signal()).await;
    } else {
        reader
            .run_once(&mut processor)
            .with_context(|| format!("Failed to read HTTP log file {}", cli.file.display()))?;
    }

    let stats = processor.stats();
    info!(
        accepted = stats.accepted,
        dropped_late = stats.dropped_late,
        groups_released = stats.groups_released,
        groups_evicted = stats.groups_evicted,
        "Done"
    );
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => {
            error!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
