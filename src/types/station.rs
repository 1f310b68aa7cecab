//! Static metadata describing the archive's measurement stations.
//!
//! Station records are read-only. They are deserialized from the bundled
//! JSON table (see [`crate::StationIndex`]) or supplied by the caller, and
//! are never constructed or mutated by the fetch pipeline itself.

use crate::types::interval::Interval;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A geographical coordinate as (latitude, longitude) in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// One station of the monitoring network and the data it exposes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StationRecord {
    /// The numeric archive identifier, as it appears in file headers
    /// (e.g. `94255` for Eugene).
    pub id: u32,
    /// The three-letter prefix the archive uses in this station's filenames
    /// (e.g. `EUP`, so the hourly file for January 2018 is `EUPH1801.txt`).
    pub prefix: String,
    /// Human-readable station name (e.g. `"Eugene, OR"`).
    pub name: String,
    /// Where the station is.
    pub location: Location,
    /// Element codes this station reports (e.g. `"1000"` for global
    /// irradiance).
    pub elements: Vec<String>,
    /// Granularities the archive publishes for this station.
    pub intervals: Vec<Interval>,
    /// The period the archive claims to hold data for.
    pub coverage: Coverage,
}

/// Geographical location of a station.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
    /// Elevation above sea level in meters, if known.
    pub elevation: Option<f64>,
}

/// The period a station's archive holds data for.
///
/// An absent `end` means the station is still reporting.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl Coverage {
    /// Whether the coverage period intersects `[start, end]`.
    ///
    /// Open sides of the query impose no constraint.
    pub fn overlaps(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
        let starts_in_time = match end {
            Some(query_end) => self.start <= query_end,
            None => true,
        };
        let ends_in_time = match (start, self.end) {
            (Some(query_start), Some(coverage_end)) => query_start <= coverage_end,
            _ => true,
        };
        starts_in_time && ends_in_time
    }
}
