//! RangeLab CLI — 52-week range percentile for a single ticker.
//!
//! Commands:
//! - `analyze` — fetch daily bars from Yahoo Finance, enrich, print or export
//! - `config` — print the default configuration as TOML

mod config;
mod export;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Months, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use rangelab_core::data::{CircuitBreaker, YahooProvider};
use rangelab_core::{analyze, CloseValidation, EnrichedSeries, UndefinedPolicy};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "rangelab",
    about = "RangeLab CLI — rolling 52-week high/low band and percentile"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a ticker and compute its range percentile series.
    Analyze {
        /// Ticker symbol (e.g., SPY).
        ticker: String,

        /// Start date (YYYY-MM-DD). Defaults to two years before --end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), exclusive. Defaults to tomorrow.
        #[arg(long)]
        end: Option<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write output to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Number of trailing rows shown by the table format.
        #[arg(long, default_value_t = 10)]
        rows: usize,

        /// Drop rows whose derived values are undefined.
        #[arg(long, default_value_t = false)]
        drop_undefined: bool,

        /// Fail on missing or non-finite closes instead of propagating NaN.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print the default configuration as TOML.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

struct AnalyzeArgs {
    ticker: String,
    start: Option<String>,
    end: Option<String>,
    config: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
    rows: usize,
    drop_undefined: bool,
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            ticker,
            start,
            end,
            config,
            format,
            output,
            rows,
            drop_undefined,
            strict,
        } => run_analyze(AnalyzeArgs {
            ticker,
            start,
            end,
            config,
            format,
            output,
            rows,
            drop_undefined,
            strict,
        }),
        Commands::Config => {
            print!("{}", AppConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid {flag} date '{value}', expected YYYY-MM-DD"))
}

fn resolve_range(start: Option<&str>, end: Option<&str>) -> Result<(NaiveDate, NaiveDate)> {
    let end_date = match end {
        Some(s) => parse_date(s, "--end")?,
        None => chrono::Local::now()
            .date_naive()
            .succ_opt()
            .context("current date is out of range")?,
    };
    let start_date = match start {
        Some(s) => parse_date(s, "--start")?,
        None => end_date
            .checked_sub_months(Months::new(24))
            .context("--end is too early to derive a default --start")?,
    };
    Ok((start_date, end_date))
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let mut app = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    init_tracing(&app.logging.level);

    if args.drop_undefined {
        app.analyzer.undefined_policy = UndefinedPolicy::Drop;
    }
    if args.strict {
        app.analyzer.close_validation = CloseValidation::Strict;
    }

    let (start, end) = resolve_range(args.start.as_deref(), args.end.as_deref())?;
    tracing::info!(ticker = %args.ticker, %start, %end, "analyzing");

    let circuit_breaker = Arc::new(CircuitBreaker::new(
        Duration::from_secs(app.provider.cooldown_secs),
        app.provider.failure_threshold,
    ));
    let provider = YahooProvider::new(&app.provider, circuit_breaker)?;

    let series = analyze(&provider, &args.ticker, start, end, &app.analyzer)
        .with_context(|| format!("analysis failed for {}", args.ticker))?;

    let rendered = render(&series, args.format, args.rows)?;
    match &args.output {
        Some(path) => {
            export::write_output(path, &rendered)?;
            eprintln!("Wrote {} rows to {}", series.len(), path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn render(series: &EnrichedSeries, format: OutputFormat, rows: usize) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(export::render_table(series, rows)),
        OutputFormat::Csv => export::export_csv(series),
        OutputFormat::Json => export::export_json(series),
    }
}
