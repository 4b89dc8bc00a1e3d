//! QuoteRow — the fixed row shape returned by the download endpoint.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One sampled data point for a symbol.
///
/// Price and volume fields are optional because the service writes a null
/// marker for days with no trades (market holidays in a multi-day window).
/// Volume is declared in the service's huge-integer range, hence `i128`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<i128>,
}

impl QuoteRow {
    /// True when every price and volume field is missing (a non-trading day).
    pub fn is_void(&self) -> bool {
        self.open.is_none()
            && self.high.is_none()
            && self.low.is_none()
            && self.close.is_none()
            && self.adj_close.is_none()
            && self.volume.is_none()
    }
}

/// Rows produced by executing one window's fetch request.
pub type RowBatch = Vec<QuoteRow>;
