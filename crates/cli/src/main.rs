mod config;
mod report;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use config::ConfigOverrides;
use report::{OutputFormat, ReportWriter};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use trailstop_indicators::{AmwTrend, FilterKind};

#[derive(Parser)]
#[command(name = "trailstop")]
#[command(about = "Replay price bars through the AMW trend trailing stop")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the indicator over a CSV file of bars
    Run {
        /// Path to CSV data file
        #[arg(short, long)]
        data: PathBuf,

        /// TOML file with indicator parameters
        #[arg(short, long = "config", env = "TRAILSTOP_CONFIG")]
        config_file: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only report bars where the direction flipped
        #[arg(long)]
        flips_only: bool,

        /// Decimal places shown in table output
        #[arg(long, default_value = "4")]
        decimals: u32,
    },

    /// Print the default indicator parameters as TOML
    Defaults,

    /// List available smoothing filters
    Filters,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing on stderr so reports on stdout stay clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            data,
            config_file,
            overrides,
            format,
            output,
            flips_only,
            decimals,
        } => {
            let mut params = config::load_config(config_file.as_deref())?;
            overrides.apply(&mut params);
            let amw = AmwTrend::new(params).context("Invalid indicator parameters")?;

            let sink: Box<dyn Write> = match &output {
                Some(path) => Box::new(std::io::BufWriter::new(
                    std::fs::File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?,
                )),
                None => Box::new(std::io::stdout().lock()),
            };
            let writer = ReportWriter::new(sink, format, decimals);
            run_indicator(data, amw, writer, flips_only)?;
        }
        Commands::Defaults => {
            print!("{}", config::default_config_toml()?);
        }
        Commands::Filters => {
            println!("Available smoothing filters:");
            for kind in FilterKind::ALL {
                println!("  {:<8} - {}", kind.label(), kind.description());
            }
        }
    }

    Ok(())
}

/// Totals for one replay of a bar file.
#[derive(Debug, Clone, PartialEq)]
struct ReplaySummary {
    bars: usize,
    flips: usize,
    ready_at: Option<DateTime<Utc>>,
}

fn run_indicator<W: Write>(
    data_path: PathBuf,
    mut amw: AmwTrend,
    mut writer: ReportWriter<W>,
    flips_only: bool,
) -> Result<ReplaySummary> {
    tracing::info!(
        data = %data_path.display(),
        config = ?amw.config(),
        warm_up = amw.warm_up_period(),
        "Starting replay"
    );

    let bars = trailstop_data::load_bars_from_csv(&data_path)?;
    if bars.is_empty() {
        anyhow::bail!("No bars loaded from CSV file");
    }
    if bars.len() < amw.warm_up_period() {
        tracing::warn!(
            bars = bars.len(),
            warm_up = amw.warm_up_period(),
            "Fewer bars than the warm-up period; output never becomes ready"
        );
    }

    let mut flips = 0usize;
    let mut ready_at = None;
    for bar in &bars {
        let point = amw.step(bar);
        if point.flipped {
            flips += 1;
        }
        if point.ready && ready_at.is_none() {
            ready_at = Some(point.timestamp);
        }
        if !flips_only || point.flipped {
            writer.write(&point)?;
        }
    }
    writer.finish()?;

    tracing::info!(
        bars = bars.len(),
        flips,
        ready_at = ?ready_at,
        direction = ?amw.direction(),
        level = ?amw.value(),
        "Replay complete"
    );
    Ok(ReplaySummary {
        bars: bars.len(),
        flips,
        ready_at,
    })
}
