//! quotescan CLI — fetch historical quotes and inspect window plans.
//!
//! Commands:
//! - `fetch` — run a windowed query against the quote service and write
//!   the rows to stdout as CSV or JSON lines
//! - `windows` — print the planned window partition for a query without
//!   fetching anything
//! - `intervals` — list the accepted interval tokens

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use quotescan_core::{
    interval, CsvFetcher, HistoryScan, Interval, PageState, QuerySpec, QuoteRow, SourceConfig,
};

#[derive(Parser)]
#[command(name = "quotescan", about = "quotescan CLI — windowed historical quote fetcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch historical quotes for a symbol and write rows to stdout.
    Fetch {
        /// Symbol to fetch (e.g., SPY). Not needed with --config.
        symbol: Option<String>,

        /// Start date (YYYY-MM-DD). Defaults to 10 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Sampling interval token: 1d, 5d, 1wk, 1mo, 3mo.
        #[arg(long, default_value = "1d")]
        interval: String,

        /// Output format.
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,

        /// Override the quote service base URL.
        #[arg(long)]
        base_url: Option<String>,

        /// Read symbol/start/end/interval from a TOML file instead.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the planned window partition for a query without fetching.
    Windows {
        /// Symbol the plan is for.
        symbol: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Sampling interval token: 1d, 5d, 1wk, 1mo, 3mo.
        #[arg(long, default_value = "1d")]
        interval: String,
    },
    /// List the accepted interval tokens and their meanings.
    Intervals,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

/// TOML query file for `fetch --config`:
///
/// ```toml
/// [query]
/// symbol = "SPY"
/// start = "2020-01-02"
/// end = "2024-12-31"
/// interval = "1d"
/// ```
#[derive(Deserialize)]
struct QueryFile {
    query: QuerySection,
}

#[derive(Deserialize)]
struct QuerySection {
    symbol: String,
    start: String,
    end: String,
    interval: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            symbol,
            start,
            end,
            interval,
            format,
            base_url,
            config,
        } => run_fetch(symbol, start, end, interval, format, base_url, config),
        Commands::Windows {
            symbol,
            start,
            end,
            interval,
        } => run_windows(&symbol, &start, &end, &interval),
        Commands::Intervals => {
            println!("{}", interval::TOKEN_HELP);
            Ok(())
        }
    }
}

fn run_fetch(
    symbol: Option<String>,
    start: Option<String>,
    end: Option<String>,
    interval: String,
    format: Format,
    base_url: Option<String>,
    config: Option<PathBuf>,
) -> Result<()> {
    let (symbol, start, end, interval) = if let Some(path) = config {
        if symbol.is_some() {
            bail!("--config and a positional symbol are mutually exclusive");
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file: QueryFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        (
            file.query.symbol,
            file.query.start,
            file.query.end,
            file.query.interval,
        )
    } else {
        let Some(symbol) = symbol else {
            bail!("a symbol is required unless --config is given");
        };
        let start = start.unwrap_or_else(|| {
            (chrono::Local::now().date_naive() - chrono::Duration::days(365 * 10)).to_string()
        });
        let end = end.unwrap_or_else(|| chrono::Local::now().date_naive().to_string());
        (symbol, start, end, interval)
    };

    let interval: Interval = interval.parse()?;
    let mut source = SourceConfig::default();
    if let Some(base) = base_url {
        source.base_url = base;
    }
    let fetcher = CsvFetcher::new(&source);

    let mut scan = HistoryScan::open_at(
        fetcher,
        &source.base_url,
        symbol,
        start.as_str(),
        end.as_str(),
        interval,
    )?;

    let mut total = 0usize;
    let mut windows = 0usize;
    match format {
        Format::Csv => {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            let names: Vec<&str> = scan.schema().columns().iter().map(|c| c.name).collect();
            wtr.write_record(&names)?;
            while let Some(batch) = scan.next_batch()? {
                windows += 1;
                for row in &batch {
                    write_csv_row(&mut wtr, row)?;
                }
                total += batch.len();
            }
            wtr.flush()?;
        }
        Format::Json => {
            while let Some(batch) = scan.next_batch()? {
                windows += 1;
                for row in &batch {
                    println!("{}", serde_json::to_string(row)?);
                }
                total += batch.len();
            }
        }
    }

    eprintln!("{total} rows across {windows} windows");
    Ok(())
}

fn write_csv_row(wtr: &mut csv::Writer<io::Stdout>, row: &QuoteRow) -> Result<()> {
    wtr.write_record([
        row.date.to_string(),
        fmt_price(row.open),
        fmt_price(row.high),
        fmt_price(row.low),
        fmt_price(row.close),
        fmt_price(row.adj_close),
        row.volume.map_or_else(|| "null".to_string(), |v| v.to_string()),
    ])?;
    Ok(())
}

fn fmt_price(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| format!("{v}"))
}

fn run_windows(symbol: &str, start: &str, end: &str, interval: &str) -> Result<()> {
    let interval: Interval = interval.parse()?;
    let spec = QuerySpec::new(symbol, start, end, interval)?;
    let mut state = PageState::new(&spec);

    println!(
        "{} from {} to {} at {} (step {}s)",
        spec.symbol,
        fmt_epoch(spec.from_epoch),
        fmt_epoch(spec.to_epoch),
        spec.interval,
        state.step(),
    );
    println!();
    println!("{:<4} {:>12} {:>12}  {:<12} {:<12}", "#", "period1", "period2", "from", "to");
    println!("{}", "-".repeat(56));

    let mut index = 0usize;
    while let Some(w) = state.next_window(spec.to_epoch) {
        index += 1;
        println!(
            "{:<4} {:>12} {:>12}  {:<12} {:<12}",
            index,
            w.from,
            w.to,
            fmt_epoch(w.from),
            fmt_epoch(w.to),
        );
    }
    println!();
    println!("{index} window(s)");
    Ok(())
}

fn fmt_epoch(epoch: i64) -> String {
    match DateTime::from_timestamp(epoch, 0) {
        Some(dt) => dt.date_naive().to_string(),
        None => epoch.to_string(),
    }
}
