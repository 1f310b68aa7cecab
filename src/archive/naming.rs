//! The archive's filename conventions, and pure resolution of which files
//! cover a requested station/date range.
//!
//! Archival files live under `download/Archive/` and are named
//! `{prefix}{interval code}{YY}{MM}.txt`, e.g. `EUPH1801.txt` for Eugene's
//! hourly file of January 2018. The interval letters have changed over the
//! archive's lifetime, so the letter mapping is configuration on
//! [`NamingScheme`] rather than something callers hard-code.

use crate::archive::error::FetchError;
use crate::types::interval::Interval;
use crate::types::raw_file::StemInfo;
use crate::types::station::StationRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Base URL of the archive.
pub const DEFAULT_BASE_URL: &str = "http://solardat.uoregon.edu";

/// URL directory holding both the monthly text files and the yearly bundles.
pub const ARCHIVE_DIR: &str = "download/Archive";

/// Years in stems are two digits; the archive's records start in the 1970s.
const CENTURY_PIVOT: i32 = 70;

/// One compressed bundle and the member stems of interest inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBundle {
    /// Archive URL path of the bundle, e.g. `download/Archive/EUPH2018.zip`.
    pub path: String,
    /// Stems of the members covering the requested range, chronological.
    pub members: Vec<String>,
}

/// The filename convention in force for a session.
#[derive(Debug, Clone)]
pub struct NamingScheme {
    codes: HashMap<Interval, char>,
}

impl Default for NamingScheme {
    fn default() -> Self {
        NamingScheme {
            codes: HashMap::from([
                (Interval::Hourly, 'H'),
                (Interval::FifteenMinute, 'Q'),
                (Interval::FiveMinute, 'F'),
                (Interval::OneMinute, 'O'),
            ]),
        }
    }
}

impl NamingScheme {
    /// A scheme with caller-supplied interval letters, for archive volumes
    /// that predate or postdate the current convention.
    pub fn with_codes(codes: HashMap<Interval, char>) -> Self {
        NamingScheme { codes }
    }

    /// The filename letter for `interval` under this scheme.
    pub fn code(&self, interval: Interval) -> Result<char, FetchError> {
        self.codes
            .get(&interval)
            .copied()
            .ok_or(FetchError::UnsupportedInterval(interval))
    }

    /// The granularity a filename letter stands for, if any.
    pub fn interval_for(&self, code: char) -> Option<Interval> {
        self.codes
            .iter()
            .find(|(_, c)| **c == code)
            .map(|(interval, _)| *interval)
    }

    /// Filename stem for one station/month, e.g. `EUPH1801`.
    pub fn stem(
        &self,
        station: &StationRecord,
        interval: Interval,
        year: i32,
        month: u32,
    ) -> Result<String, FetchError> {
        let code = self.code(interval)?;
        Ok(format!(
            "{}{}{:02}{:02}",
            station.prefix,
            code,
            year.rem_euclid(100),
            month
        ))
    }

    /// Resolves the ordered archive paths covering `[start, end]` for one
    /// station at one granularity. Pure; no I/O.
    ///
    /// The cover is chronological, gap-free and duplicate-free, one path per
    /// month. Only the month and year of `start` and `end` are used.
    pub fn find_files(
        &self,
        station: &StationRecord,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, FetchError> {
        check_coverage(station, start, end)?;
        month_span(start, end)
            .into_iter()
            .map(|(year, month)| {
                let stem = self.stem(station, interval, year, month)?;
                Ok(file_path(&stem))
            })
            .collect()
    }

    /// Resolves the yearly bundles covering `[start, end]`, with the member
    /// stems of interest per bundle. Pure; no I/O.
    ///
    /// Bundles aggregate a whole year, so bulk ranges need far fewer round
    /// trips than per-month files.
    pub fn find_compressed(
        &self,
        station: &StationRecord,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CompressedBundle>, FetchError> {
        check_coverage(station, start, end)?;
        let code = self.code(interval)?;

        let mut bundles: Vec<CompressedBundle> = Vec::new();
        for (year, month) in month_span(start, end) {
            let bundle_path = format!("{}/{}{}{}.zip", ARCHIVE_DIR, station.prefix, code, year);
            let stem = self.stem(station, interval, year, month)?;
            match bundles.last_mut() {
                Some(bundle) if bundle.path == bundle_path => bundle.members.push(stem),
                _ => bundles.push(CompressedBundle {
                    path: bundle_path,
                    members: vec![stem],
                }),
            }
        }
        Ok(bundles)
    }

    /// What a filename stem claims about its contents, if it follows the
    /// `{prefix}{code}{YY}{MM}` convention.
    pub fn parse_stem(&self, stem: &str) -> Option<StemInfo> {
        // Conforming stems are pure ASCII; anything else is unparseable,
        // not a panic. Bundle member names come from the server.
        if stem.len() != 8 || !stem.is_ascii() {
            return None;
        }
        let (name, digits) = stem.split_at(4);
        if !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let yy: i32 = digits[..2].parse().ok()?;
        let month: u32 = digits[2..].parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        let year = if yy >= CENTURY_PIVOT { 1900 + yy } else { 2000 + yy };

        let code = name.chars().nth(3)?;
        Some(StemInfo {
            prefix: name[..3].to_string(),
            interval: self.interval_for(code),
            year,
            month,
        })
    }
}

/// URL path of one monthly text file.
pub fn file_path(stem: &str) -> String {
    format!("{}/{}.txt", ARCHIVE_DIR, stem)
}

/// Filename stem of an archive URL path.
pub fn stem_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".txt")
        .or_else(|| name.strip_suffix(".zip"))
        .unwrap_or(name)
}

/// The inclusive `(year, month)` sequence from `start` to `end`.
fn month_span(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    let last = (end.year(), end.month());
    while (year, month) <= last {
        months.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

/// Rejects ranges that start before the station's coverage or end after it,
/// at month granularity. Inverted ranges resolve to an empty month span and
/// are rejected the same way.
fn check_coverage(
    station: &StationRecord,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), FetchError> {
    let range_error = || FetchError::Range {
        station: station.name.clone(),
        start,
        end,
    };

    if (start.year(), start.month()) > (end.year(), end.month()) {
        return Err(range_error());
    }
    let coverage = &station.coverage;
    if (start.year(), start.month()) < (coverage.start.year(), coverage.start.month()) {
        return Err(range_error());
    }
    if let Some(coverage_end) = coverage.end {
        if (end.year(), end.month()) > (coverage_end.year(), coverage_end.month()) {
            return Err(range_error());
        }
    }
    Ok(())
}
