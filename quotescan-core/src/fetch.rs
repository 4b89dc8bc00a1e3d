//! Fetch descriptors and the CSV download executor.
//!
//! The pagination core never performs I/O itself: it builds a
//! [`FetchRequest`] per window and hands it to a [`RowFetcher`]. The
//! production fetcher is an HTTP GET plus CSV decode; tests substitute a
//! canned implementation.

use std::time::Duration;

use chrono::NaiveDate;

use crate::error::QuoteError;
use crate::plan::{FetchWindow, QuerySpec};
use crate::quote::{QuoteRow, RowBatch};
use crate::schema::TableSchema;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/download";

/// Connection settings for the remote quote service.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// CSV decode options carried by every fetch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// First row names the columns.
    pub header: bool,
    /// Literal field value the service writes for missing data.
    pub null_marker: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { header: true, null_marker: "null".to_string() }
    }
}

/// Fully parameterized request for one window of data: URL, declared
/// column shape, and decode options.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub schema: TableSchema,
    pub options: FetchOptions,
}

impl FetchRequest {
    /// Build the download descriptor for one window of a query.
    pub fn for_window(base_url: &str, spec: &QuerySpec, window: FetchWindow) -> Self {
        let url = format!(
            "{base_url}/{symbol}?period1={from}&period2={to}&interval={interval}&events=history",
            symbol = spec.symbol,
            from = window.from,
            to = window.to,
            interval = spec.interval,
        );
        FetchRequest {
            url,
            schema: TableSchema::quotes(),
            options: FetchOptions::default(),
        }
    }
}

/// The single seam between pagination and I/O.
///
/// Given a descriptor, return the typed rows it names, or fail. The
/// pagination core is tested against a canned implementation; the real
/// one is [`CsvFetcher`].
pub trait RowFetcher {
    fn fetch_rows(&self, request: &FetchRequest) -> Result<RowBatch, QuoteError>;
}

impl<F: RowFetcher + ?Sized> RowFetcher for &F {
    fn fetch_rows(&self, request: &FetchRequest) -> Result<RowBatch, QuoteError> {
        (**self).fetch_rows(request)
    }
}

/// Production fetcher: blocking HTTP GET, then CSV decode against the
/// request's declared schema.
pub struct CsvFetcher {
    client: reqwest::blocking::Client,
}

impl CsvFetcher {
    pub fn new(config: &SourceConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

impl RowFetcher for CsvFetcher {
    fn fetch_rows(&self, request: &FetchRequest) -> Result<RowBatch, QuoteError> {
        let resp = self
            .client
            .get(&request.url)
            .send()
            .map_err(|e| QuoteError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(QuoteError::Status {
                code: status.as_u16(),
                url: request.url.clone(),
            });
        }
        let body = resp.text().map_err(|e| QuoteError::Network(e.to_string()))?;
        decode_csv(&body, &request.schema, &request.options)
    }
}

/// Decode one window's CSV payload into typed rows.
pub fn decode_csv(
    body: &str,
    schema: &TableSchema,
    options: &FetchOptions,
) -> Result<RowBatch, QuoteError> {
    // A window with no data in range comes back bodyless.
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.header)
        .from_reader(body.as_bytes());

    if options.header {
        let headers = reader
            .headers()
            .map_err(|e| QuoteError::Malformed(e.to_string()))?;
        schema.validate_header(headers.iter())?;
    }

    let arity = schema.columns().len();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| QuoteError::Malformed(e.to_string()))?;
        if record.len() != arity {
            return Err(QuoteError::Malformed(format!(
                "expected {arity} fields per row, got {}",
                record.len()
            )));
        }
        rows.push(parse_row(&record, options)?);
    }
    Ok(rows)
}

fn parse_row(record: &csv::StringRecord, options: &FetchOptions) -> Result<QuoteRow, QuoteError> {
    let field = |i: usize| record.get(i).unwrap_or("");
    Ok(QuoteRow {
        date: NaiveDate::parse_from_str(field(0), "%Y-%m-%d")
            .map_err(|_| QuoteError::Malformed(format!("bad date field '{}'", field(0))))?,
        open: parse_nullable(field(1), options)?,
        high: parse_nullable(field(2), options)?,
        low: parse_nullable(field(3), options)?,
        close: parse_nullable(field(4), options)?,
        adj_close: parse_nullable(field(5), options)?,
        volume: parse_nullable(field(6), options)?,
    })
}

fn parse_nullable<T: std::str::FromStr>(
    raw: &str,
    options: &FetchOptions,
) -> Result<Option<T>, QuoteError> {
    if raw.is_empty() || raw == options.null_marker {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| QuoteError::Malformed(format!("bad numeric field '{raw}'")))
}
