//! quotescan-core — windowed pagination over a remote historical-quote
//! service.
//!
//! The service's download endpoint caps how many sampled points one
//! request may span, so a logical query (symbol, date range, interval) is
//! decomposed into a bounded sequence of sub-range fetches. [`HistoryScan`]
//! validates and plans the query, then drives the windows lazily, one CSV
//! fetch per pull, concatenating the rows into a single stream.
//!
//! I/O goes through the [`RowFetcher`] seam: [`CsvFetcher`] is the real
//! HTTP+CSV implementation, and tests drive the pagination with canned
//! fetchers.

pub mod error;
pub mod fetch;
pub mod interval;
pub mod plan;
pub mod quote;
pub mod scan;
pub mod schema;

pub use error::QuoteError;
pub use fetch::{CsvFetcher, FetchOptions, FetchRequest, RowFetcher, SourceConfig, DEFAULT_BASE_URL};
pub use interval::Interval;
pub use plan::{DateArg, FetchWindow, PageState, QuerySpec};
pub use quote::{QuoteRow, RowBatch};
pub use scan::HistoryScan;
pub use schema::{Column, ColumnKind, TableSchema};
