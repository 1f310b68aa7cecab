use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting granularity of an archive file.
///
/// Each station publishes one file per month per granularity it supports;
/// the granularity picks the interval letter in the archive filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interval {
    /// One row per hour, timestamped by the hour it ends.
    Hourly,
    /// One row per 15 minutes.
    FifteenMinute,
    /// One row per 5 minutes.
    FiveMinute,
    /// One row per minute.
    OneMinute,
}

impl Interval {
    /// Minutes covered by one row at this granularity.
    pub fn minutes(&self) -> u32 {
        match self {
            Interval::Hourly => 60,
            Interval::FifteenMinute => 15,
            Interval::FiveMinute => 5,
            Interval::OneMinute => 1,
        }
    }

    /// Rows an archive file holds per hour of coverage.
    pub fn rows_per_hour(&self) -> u32 {
        60 / self.minutes()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Interval::Hourly => "hourly",
            Interval::FifteenMinute => "15-minute",
            Interval::FiveMinute => "5-minute",
            Interval::OneMinute => "1-minute",
        };
        write!(f, "{}", label)
    }
}
