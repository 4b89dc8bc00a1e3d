//! Query validation and window planning.
//!
//! A logical query names a symbol, two date endpoints, and an interval.
//! The service caps how many sampled points one request may span, so the
//! planner sizes a fixed step that partitions the range into windows of
//! roughly sixty points each. Planning performs no network activity.

use chrono::NaiveDate;

use crate::error::QuoteError;
use crate::interval::Interval;

/// How many sampled points one request to the service may carry.
const POINTS_PER_REQUEST: i64 = 60;

/// Caller-supplied endpoint: a calendar date, or a string parseable as one.
#[derive(Debug, Clone)]
pub enum DateArg {
    Date(NaiveDate),
    Text(String),
}

impl From<NaiveDate> for DateArg {
    fn from(date: NaiveDate) -> Self {
        DateArg::Date(date)
    }
}

impl From<&str> for DateArg {
    fn from(text: &str) -> Self {
        DateArg::Text(text.to_string())
    }
}

impl From<String> for DateArg {
    fn from(text: String) -> Self {
        DateArg::Text(text)
    }
}

impl DateArg {
    fn resolve(&self) -> Result<NaiveDate, QuoteError> {
        match self {
            DateArg::Date(date) => Ok(*date),
            DateArg::Text(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|_| QuoteError::InvalidDate(text.clone())),
        }
    }
}

/// Epoch seconds at UTC midnight.
fn date_epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
}

/// Immutable parameters for one historical query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub symbol: String,
    pub from_epoch: i64,
    pub to_epoch: i64,
    pub interval: Interval,
}

impl QuerySpec {
    /// Validate date endpoints and build the spec.
    pub fn new(
        symbol: impl Into<String>,
        start: impl Into<DateArg>,
        end: impl Into<DateArg>,
        interval: Interval,
    ) -> Result<Self, QuoteError> {
        let from = start.into().resolve()?;
        let to = end.into().resolve()?;
        Self::from_epochs(symbol, date_epoch(from), date_epoch(to), interval)
    }

    /// Build the spec from already-resolved epoch bounds.
    pub fn from_epochs(
        symbol: impl Into<String>,
        from_epoch: i64,
        to_epoch: i64,
        interval: Interval,
    ) -> Result<Self, QuoteError> {
        if to_epoch <= from_epoch {
            return Err(QuoteError::EmptyRange);
        }
        Ok(QuerySpec {
            symbol: symbol.into(),
            from_epoch,
            to_epoch,
            interval,
        })
    }

    /// Total seconds the query spans.
    pub fn span(&self) -> i64 {
        self.to_epoch - self.from_epoch
    }
}

/// One sub-range of the requested span, consumed to build a single fetch
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub from: i64,
    pub to: i64,
}

/// Mutable pagination cursor for one open query.
///
/// `(cursor_from, cursor_to)` is the next sub-range to fetch, if any;
/// `step` is fixed at plan time. `cursor_from <= cursor_to <= to_epoch`
/// and `cursor_to - cursor_from <= step` hold at all times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub cursor_from: i64,
    pub cursor_to: i64,
    step: i64,
}

impl PageState {
    /// Size the window step for a query.
    ///
    /// The arithmetic is two truncating integer divisions and deliberately
    /// approximate: a window can hold somewhat more than sixty points for
    /// some ranges, which the service tolerates. Changing it would move
    /// window boundaries for existing queries.
    pub fn new(spec: &QuerySpec) -> Self {
        let span = spec.span();
        let expected_points = span / spec.interval.seconds() + 1;
        let step = if expected_points > POINTS_PER_REQUEST {
            span / (expected_points / POINTS_PER_REQUEST + 1)
        } else {
            span
        };
        PageState {
            cursor_from: spec.from_epoch,
            cursor_to: (spec.from_epoch + step).min(spec.to_epoch),
            step,
        }
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Snapshot the next window and advance past it.
    ///
    /// Returns `None` once the cursor has reached `to_epoch`; that state is
    /// terminal. The upper cursor clamps to `to_epoch`, so the produced
    /// windows tile the requested span exactly, sharing only boundary
    /// points.
    pub fn next_window(&mut self, to_epoch: i64) -> Option<FetchWindow> {
        if self.cursor_from >= to_epoch {
            return None;
        }
        let window = FetchWindow { from: self.cursor_from, to: self.cursor_to };
        self.cursor_from = (self.cursor_from + self.step).min(to_epoch);
        self.cursor_to = (self.cursor_from + self.step).min(to_epoch);
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(from_epoch: i64, to_epoch: i64, interval: Interval) -> QuerySpec {
        QuerySpec::from_epochs("SPY", from_epoch, to_epoch, interval).unwrap()
    }

    fn windows(spec: &QuerySpec) -> Vec<FetchWindow> {
        let mut state = PageState::new(spec);
        let mut out = Vec::new();
        while let Some(w) = state.next_window(spec.to_epoch) {
            out.push(w);
        }
        out
    }

    #[test]
    fn date_strings_resolve_to_utc_midnight_epochs() {
        let spec = QuerySpec::new("SPY", "1970-01-01", "1970-01-03", Interval::D1).unwrap();
        assert_eq!(spec.from_epoch, 0);
        assert_eq!(spec.to_epoch, 2 * 86_400);
    }

    #[test]
    fn date_values_are_accepted_directly() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let spec = QuerySpec::new("QQQ", start, end, Interval::W1).unwrap();
        assert_eq!(spec.span(), (end - start).num_days() * 86_400);
    }

    #[test]
    fn unparseable_date_string_fails() {
        let err = QuerySpec::new("SPY", "not-a-date", "2024-01-02", Interval::D1).unwrap_err();
        assert!(matches!(err, QuoteError::InvalidDate(ref s) if s == "not-a-date"));
    }

    #[test]
    fn end_not_after_start_fails() {
        let err = QuerySpec::new("SPY", "2024-01-02", "2024-01-02", Interval::D1).unwrap_err();
        assert!(matches!(err, QuoteError::EmptyRange));
        let err = QuerySpec::from_epochs("SPY", 100, 50, Interval::D1).unwrap_err();
        assert!(matches!(err, QuoteError::EmptyRange));
    }

    #[test]
    fn short_range_fits_one_window() {
        // 100_000 / 86_400 + 1 = 2 expected points, under the cap: the
        // step covers the whole range.
        let spec = spec(0, 100_000, Interval::D1);
        let state = PageState::new(&spec);
        assert_eq!(state.step(), 100_000);
        assert_eq!(state.cursor_from, 0);
        assert_eq!(state.cursor_to, 100_000);
        assert_eq!(windows(&spec), vec![FetchWindow { from: 0, to: 100_000 }]);
    }

    #[test]
    fn long_range_splits_with_truncating_arithmetic() {
        // 10_000_000 / 86_400 + 1 = 116 points; 116 / 60 + 1 = 2;
        // step = 10_000_000 / 2 = 5_000_000.
        let spec = spec(0, 10_000_000, Interval::D1);
        let state = PageState::new(&spec);
        assert_eq!(state.step(), 5_000_000);
        assert_eq!(
            windows(&spec),
            vec![
                FetchWindow { from: 0, to: 5_000_000 },
                FetchWindow { from: 5_000_000, to: 10_000_000 },
            ]
        );
    }

    #[test]
    fn tail_window_clamps_to_range_end() {
        // 10_400_000 / 86_400 + 1 = 121 points; 121 / 60 + 1 = 3;
        // step = 3_466_666 leaves a 2-second tail window.
        let spec = spec(0, 10_400_000, Interval::D1);
        let ws = windows(&spec);
        assert_eq!(ws.len(), 4);
        assert_eq!(ws[0], FetchWindow { from: 0, to: 3_466_666 });
        assert_eq!(ws[3], FetchWindow { from: 10_399_998, to: 10_400_000 });
    }

    #[test]
    fn exhaustion_is_terminal() {
        let spec = spec(0, 100_000, Interval::D1);
        let mut state = PageState::new(&spec);
        assert!(state.next_window(spec.to_epoch).is_some());
        assert!(state.next_window(spec.to_epoch).is_none());
        assert!(state.next_window(spec.to_epoch).is_none());
    }

    #[test]
    fn cursor_invariants_hold_after_every_advance() {
        let spec = spec(500, 10_400_500, Interval::D1);
        let mut state = PageState::new(&spec);
        loop {
            assert!(state.cursor_from <= state.cursor_to);
            assert!(state.cursor_to <= spec.to_epoch);
            assert!(state.cursor_to - state.cursor_from <= state.step());
            if state.next_window(spec.to_epoch).is_none() {
                break;
            }
        }
    }
}
