//! Zaino Monitor - flow-meter polling client
//!
//! Entry point for the terminal dashboard.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{info, warn};
use zaino_monitor::chart::{gauge_fraction, sparkline};
use zaino_monitor::source::backend::{BackendClient, StationId};
use zaino_monitor::{FlowSummary, HttpFlowSource, MonitorConfig, SampleStream, FLOW_UNIT};

/// Width of the text gauge in characters
const GAUGE_WIDTH: usize = 20;

/// Command-line overrides applied on top of the config file
#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    url: Option<String>,
    interval_ms: Option<u64>,
    capacity: Option<usize>,
    field: Option<String>,
    json: bool,
}

enum Command {
    Run(CliOptions),
    Exit,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("zaino_monitor=info".parse()?)
                .add_directive("zaino_core=info".parse()?),
        )
        .init();

    let options = match parse_args(std::env::args().skip(1))? {
        Command::Run(options) => options,
        Command::Exit => return Ok(()),
    };

    let mut config = match &options.config {
        Some(path) => MonitorConfig::load_from(path),
        None => MonitorConfig::load(),
    };
    apply_overrides(&mut config, &options);
    config.validate().context("invalid configuration")?;

    println!("╔════════════════════════════════════════════════════════════╗");
    println!(
        "║            Zaino Monitor v{} - Flow Dashboard            ║",
        zaino_monitor::VERSION
    );
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    show_home_cards(&config).await;
    run(&config, options.json).await
}

fn print_help() {
    println!("Usage: zaino-monitor [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config PATH       Read settings from PATH");
    println!("  -u, --url URL           Dashboard backend base URL");
    println!("  -i, --interval MS       Poll interval in milliseconds");
    println!("  -n, --capacity N        Samples kept in the rolling chart");
    println!("  -f, --field NAME        Sensor field to chart (constflow, instflow)");
    println!("      --json              Print each update as a JSON line");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
    println!();
    println!("Examples:");
    println!("  zaino-monitor -u http://192.168.1.20:5000 -i 5000");
    println!("  zaino-monitor --field instflow --capacity 60");
}

fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut options = CliOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-v" => {
                println!("zaino-monitor {}", zaino_monitor::VERSION);
                return Ok(Command::Exit);
            }
            "--help" | "-h" => {
                print_help();
                return Ok(Command::Exit);
            }
            "--config" | "-c" => {
                options.config = Some(PathBuf::from(value_for(&arg, args.next())?));
            }
            "--url" | "-u" => {
                options.url = Some(value_for(&arg, args.next())?);
            }
            "--interval" | "-i" => {
                let raw = value_for(&arg, args.next())?;
                let ms = raw
                    .parse()
                    .with_context(|| format!("invalid interval: {}", raw))?;
                options.interval_ms = Some(ms);
            }
            "--capacity" | "-n" => {
                let raw = value_for(&arg, args.next())?;
                let capacity = raw
                    .parse()
                    .with_context(|| format!("invalid capacity: {}", raw))?;
                options.capacity = Some(capacity);
            }
            "--field" | "-f" => {
                options.field = Some(value_for(&arg, args.next())?);
            }
            "--json" => options.json = true,
            other => {
                print_help();
                bail!("unknown argument: {}", other);
            }
        }
    }

    Ok(Command::Run(options))
}

fn value_for(flag: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => bail!("{} requires a value", flag),
    }
}

fn apply_overrides(config: &mut MonitorConfig, options: &CliOptions) {
    if let Some(url) = &options.url {
        config.base_url = url.clone();
    }
    if let Some(ms) = options.interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(capacity) = options.capacity {
        config.capacity = capacity;
    }
    if let Some(field) = &options.field {
        config.flow_field = field.clone();
    }
}

/// Visit counter and weather card; failures only warn
async fn show_home_cards(config: &MonitorConfig) {
    let backend = BackendClient::new(&config.base_url, config.fetch_timeout());

    match backend.register_visit().await {
        Ok(visits) => println!("Visits: {}", visits),
        Err(e) => warn!(error = %e, "Failed to register visit"),
    }

    let Some(raw) = &config.weather_station else {
        return;
    };
    let station = match StationId::parse(raw) {
        Ok(station) => station,
        Err(e) => {
            warn!(error = %e, "Skipping weather card");
            return;
        }
    };

    match backend.weather(&station).await {
        Ok(report) => {
            let fmt = |v: Option<f64>, unit: &str| {
                v.map(|v| format!("{:.1}{}", v, unit))
                    .unwrap_or_else(|| "--".to_string())
            };
            println!(
                "Weather {}: {} | humidity {} | wind {}",
                station,
                fmt(report.temp, "°C"),
                fmt(report.hum, "%"),
                fmt(report.wspd, " m/s"),
            );
        }
        Err(e) => warn!(station = %station, error = %e, "Failed to fetch weather"),
    }
    println!();
}

async fn run(config: &MonitorConfig, json: bool) -> Result<()> {
    let source = HttpFlowSource::new(&config.base_url, config.extractor(), config.fetch_timeout());
    info!(url = source.url(), field = %config.flow_field, "Polling flow meter");

    let last_line = Mutex::new(String::new());
    let stream = SampleStream::builder(source)
        .fetch_timeout(config.fetch_timeout())
        .initial_capacity(config.capacity)
        .on_update(move |summary| {
            if json {
                match serde_json::to_string(summary) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!(error = %e, "Failed to encode summary"),
                }
                return;
            }

            // Only print if changed (reduce spam)
            let line = status_line(summary);
            let mut last = last_line.lock().unwrap_or_else(|e| e.into_inner());
            if *last != line {
                println!("{}  {}", summary.updated_at.format("%H:%M:%S"), line);
                *last = line;
            }
        })
        .build();

    // Set up Ctrl+C handler
    let shutdown = Arc::new(Notify::new());
    let notify = Arc::clone(&shutdown);
    ctrlc::set_handler(move || notify.notify_one()).context("failed to install Ctrl+C handler")?;

    stream.start(config.poll_interval(), config.capacity)?;
    println!("Monitoring started. Press Ctrl+C to stop.");
    println!("────────────────────────────────────────");

    shutdown.notified().await;

    println!();
    println!("Stopping...");
    stream.stop();
    println!("Done.");
    Ok(())
}

fn status_line(summary: &FlowSummary) -> String {
    let filled = (gauge_fraction(summary.current, summary.max) * GAUGE_WIDTH as f64).round() as usize;
    let gauge: String = "█".repeat(filled) + &"░".repeat(GAUGE_WIDTH - filled.min(GAUGE_WIDTH));

    format!(
        "Flow: {:>7.2} {} [{}] | Avg: {:>6.2} | Min: {:>6.2} | Max: {:>6.2} | {}",
        summary.current,
        FLOW_UNIT,
        gauge,
        summary.average,
        summary.min,
        summary.max,
        sparkline(&summary.buffer, summary.min, summary.max)
    )
}
