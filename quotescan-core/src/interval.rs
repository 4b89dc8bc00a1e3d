//! Sampling intervals accepted by the quote service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

pub const SECS_PER_DAY: i64 = 86_400;

/// Token list for validation errors and the CLI help surface.
pub const TOKEN_HELP: &str = "1d: 1 day interval\n\
                              5d: 5 day interval\n\
                              1wk: 1 week interval\n\
                              1mo: 1 month interval\n\
                              3mo: 3 month interval";

/// Sampling granularity of returned data points.
///
/// The service accepts a fixed token set; the month intervals use the
/// service's own 30/90-day approximations, not calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "5d")]
    D5,
    #[serde(rename = "1wk")]
    W1,
    #[serde(rename = "1mo")]
    Mo1,
    #[serde(rename = "3mo")]
    Mo3,
}

impl Interval {
    pub const ALL: [Interval; 5] = [
        Interval::D1,
        Interval::D5,
        Interval::W1,
        Interval::Mo1,
        Interval::Mo3,
    ];

    /// Wire token, as it appears in request URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::D1 => "1d",
            Interval::D5 => "5d",
            Interval::W1 => "1wk",
            Interval::Mo1 => "1mo",
            Interval::Mo3 => "3mo",
        }
    }

    /// Fixed duration of one sampled point, in epoch seconds.
    pub fn seconds(self) -> i64 {
        match self {
            Interval::D1 => SECS_PER_DAY,
            Interval::D5 => 5 * SECS_PER_DAY,
            Interval::W1 => 7 * SECS_PER_DAY,
            Interval::Mo1 => 30 * SECS_PER_DAY,
            Interval::Mo3 => 90 * SECS_PER_DAY,
        }
    }
}

impl FromStr for Interval {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Interval::D1),
            "5d" => Ok(Interval::D5),
            "1wk" => Ok(Interval::W1),
            "1mo" => Ok(Interval::Mo1),
            "3mo" => Ok(Interval::Mo3),
            _ => Err(QuoteError::UnknownInterval { token: s.to_string() }),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
