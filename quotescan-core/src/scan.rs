//! HistoryScan — pull-based iteration over a windowed historical query.
//!
//! One scan owns the query spec, the pagination cursor, and the fetcher
//! for its whole lifetime. Each pull executes exactly one window and the
//! cursor advances before the fetch runs, so a failed window can never be
//! replayed; callers that want the data again restart the scan.

use crate::error::QuoteError;
use crate::fetch::{FetchRequest, RowFetcher, DEFAULT_BASE_URL};
use crate::interval::Interval;
use crate::plan::{DateArg, PageState, QuerySpec};
use crate::quote::{QuoteRow, RowBatch};
use crate::schema::TableSchema;

pub struct HistoryScan<F> {
    spec: QuerySpec,
    state: PageState,
    fetcher: F,
    base_url: String,
    schema: TableSchema,
    /// Descriptor for the next window; `None` once the scan is exhausted
    /// or a window has failed.
    pending: Option<FetchRequest>,
}

impl<F: RowFetcher> HistoryScan<F> {
    /// Validate the query and plan its windows against the default service
    /// endpoint. No network activity happens here.
    pub fn open(
        fetcher: F,
        symbol: impl Into<String>,
        start: impl Into<DateArg>,
        end: impl Into<DateArg>,
        interval: Interval,
    ) -> Result<Self, QuoteError> {
        Self::open_at(fetcher, DEFAULT_BASE_URL, symbol, start, end, interval)
    }

    /// As [`open`](Self::open), against a caller-chosen base URL.
    pub fn open_at(
        fetcher: F,
        base_url: &str,
        symbol: impl Into<String>,
        start: impl Into<DateArg>,
        end: impl Into<DateArg>,
        interval: Interval,
    ) -> Result<Self, QuoteError> {
        let spec = QuerySpec::new(symbol, start, end, interval)?;
        Ok(Self::from_spec(fetcher, base_url, spec))
    }

    /// Plan a scan from an already-validated spec.
    pub fn from_spec(fetcher: F, base_url: &str, spec: QuerySpec) -> Self {
        let mut state = PageState::new(&spec);
        // The first window's descriptor is materialized up front so the
        // declared output shape is known before any row-producing call.
        let pending = state
            .next_window(spec.to_epoch)
            .map(|w| FetchRequest::for_window(base_url, &spec, w));
        let schema = pending
            .as_ref()
            .map_or_else(TableSchema::quotes, |r| r.schema.clone());
        Self {
            spec,
            state,
            fetcher,
            base_url: base_url.to_string(),
            schema,
            pending,
        }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Declared output shape, fixed for the scan's lifetime.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Produce the next window's rows, or `None` once the requested span
    /// is exhausted.
    ///
    /// Exhaustion is terminal and idempotent: further calls keep returning
    /// `None` without touching the network. A window that returns zero
    /// rows is a valid empty batch, not exhaustion. A fetch error
    /// propagates immediately and ends the scan; the cursor is not rolled
    /// back.
    pub fn next_batch(&mut self) -> Result<Option<RowBatch>, QuoteError> {
        let Some(request) = self.pending.take() else {
            return Ok(None);
        };
        self.pending = self
            .state
            .next_window(self.spec.to_epoch)
            .map(|w| FetchRequest::for_window(&self.base_url, &self.spec, w));
        match self.fetcher.fetch_rows(&request) {
            Ok(rows) => Ok(Some(rows)),
            Err(e) => {
                self.pending = None;
                Err(e)
            }
        }
    }

    /// Drain the scan, concatenating every window's rows in order.
    pub fn rows(mut self) -> Result<Vec<QuoteRow>, QuoteError> {
        let mut all = Vec::new();
        while let Some(batch) = self.next_batch()? {
            all.extend(batch);
        }
        Ok(all)
    }
}

impl<F: RowFetcher> Iterator for HistoryScan<F> {
    type Item = Result<RowBatch, QuoteError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays a scripted sequence of per-window outcomes, recording every
    /// URL it is asked for. Windows beyond the script return empty batches.
    struct ScriptedFetcher {
        calls: RefCell<Vec<String>>,
        outcomes: RefCell<VecDeque<Result<RowBatch, QuoteError>>>,
    }

    impl ScriptedFetcher {
        fn new(outcomes: Vec<Result<RowBatch, QuoteError>>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcomes: RefCell::new(outcomes.into()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl RowFetcher for ScriptedFetcher {
        fn fetch_rows(&self, request: &FetchRequest) -> Result<RowBatch, QuoteError> {
            self.calls.borrow_mut().push(request.url.clone());
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn row(day: u32) -> QuoteRow {
        QuoteRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: Some(100.0),
            high: Some(101.0),
            low: Some(99.0),
            close: Some(100.5),
            adj_close: Some(100.5),
            volume: Some(1_000),
        }
    }

    /// Two windows: epoch range [0, 10_000_000] at 1d splits at 5_000_000.
    fn two_window_scan(fetcher: &ScriptedFetcher) -> HistoryScan<&ScriptedFetcher> {
        let spec = QuerySpec::from_epochs("SPY", 0, 10_000_000, Interval::D1).unwrap();
        HistoryScan::from_spec(fetcher, DEFAULT_BASE_URL, spec)
    }

    #[test]
    fn schema_is_declared_before_any_fetch() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let scan = two_window_scan(&fetcher);
        assert_eq!(scan.schema(), &TableSchema::quotes());
        assert_eq!(fetcher.call_count(), 0);
    }

    #[test]
    fn batches_arrive_one_window_at_a_time_until_exhaustion() {
        let fetcher = ScriptedFetcher::new(vec![Ok(vec![row(2), row(3)]), Ok(vec![row(4)])]);
        let mut scan = two_window_scan(&fetcher);

        assert_eq!(scan.next_batch().unwrap().unwrap().len(), 2);
        assert_eq!(scan.next_batch().unwrap().unwrap().len(), 1);
        assert!(scan.next_batch().unwrap().is_none());
        // Terminal state stays terminal and never re-fetches.
        assert!(scan.next_batch().unwrap().is_none());
        assert_eq!(fetcher.call_count(), 2);
    }

    #[test]
    fn window_urls_tile_the_requested_span() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let mut scan = two_window_scan(&fetcher);
        while scan.next_batch().unwrap().is_some() {}
        let calls = fetcher.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("period1=0&period2=5000000&interval=1d"));
        assert!(calls[1].contains("period1=5000000&period2=10000000&interval=1d"));
    }

    #[test]
    fn empty_window_is_a_batch_not_exhaustion() {
        let fetcher = ScriptedFetcher::new(vec![Ok(Vec::new()), Ok(vec![row(5)])]);
        let mut scan = two_window_scan(&fetcher);

        let first = scan.next_batch().unwrap().unwrap();
        assert!(first.is_empty());
        let second = scan.next_batch().unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert!(scan.next_batch().unwrap().is_none());
    }

    #[test]
    fn fetch_failure_aborts_the_scan() {
        // Three windows: span 15_000_000 at 1d gives step 5_000_000.
        let spec = QuerySpec::from_epochs("SPY", 0, 15_000_000, Interval::D1).unwrap();
        let fetcher = ScriptedFetcher::new(vec![
            Ok(vec![row(2)]),
            Err(QuoteError::Network("connection reset".into())),
            Ok(vec![row(9)]),
        ]);
        let mut scan = HistoryScan::from_spec(&fetcher, DEFAULT_BASE_URL, spec);

        assert!(scan.next_batch().is_ok());
        assert!(scan.next_batch().is_err());
        // The failure ends the query: later windows are never requested.
        assert!(scan.next_batch().unwrap().is_none());
        assert!(scan.next_batch().unwrap().is_none());
        assert_eq!(fetcher.call_count(), 2);
    }

    #[test]
    fn rows_concatenates_all_windows() {
        let fetcher = ScriptedFetcher::new(vec![Ok(vec![row(2), row(3)]), Ok(vec![row(4)])]);
        let scan = two_window_scan(&fetcher);
        let rows = scan.rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn rows_surfaces_the_first_window_error() {
        let fetcher =
            ScriptedFetcher::new(vec![Err(QuoteError::Status { code: 404, url: "u".into() })]);
        let scan = two_window_scan(&fetcher);
        assert!(matches!(scan.rows(), Err(QuoteError::Status { code: 404, .. })));
    }

    #[test]
    fn scan_drives_as_an_iterator() {
        let fetcher = ScriptedFetcher::new(vec![Ok(vec![row(2)]), Ok(vec![row(3)])]);
        let scan = two_window_scan(&fetcher);
        let batches: Vec<_> = scan.collect::<Result<Vec<RowBatch>, _>>().unwrap();
        assert_eq!(batches.len(), 2);
    }
}
