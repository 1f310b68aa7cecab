//! Filtering of the read-only station metadata table.
//!
//! The table is an injected dependency: the index never constructs station
//! records itself, it only holds and filters whatever table it was given.
//! A copy of the archive's current network ships with the crate.

use crate::stations::error::MetadataError;
use crate::types::interval::Interval;
use crate::types::station::{LatLon, StationRecord};
use chrono::NaiveDate;
use haversine::{distance, Location as HaversineLocation, Units};

const BUNDLED_STATIONS: &str = include_str!("../../resources/stations.json");

/// All station search filters. Every filter is optional; omitted filters
/// impose no constraint, present ones combine with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct StationQuery<'a> {
    /// Case-insensitive substring of the station name.
    pub name: Option<&'a str>,
    /// Element codes of interest; a station matches when it reports at
    /// least one of them.
    pub elements: Option<&'a [&'a str]>,
    /// Start of the period of interest; stations whose coverage ends
    /// earlier are excluded.
    pub start: Option<NaiveDate>,
    /// End of the period of interest; stations whose coverage starts later
    /// are excluded.
    pub end: Option<NaiveDate>,
    /// Required sampling granularity.
    pub interval: Option<Interval>,
    /// Center of a geographic search.
    pub near: Option<LatLon>,
    /// Radius for `near`, in kilometers. Default 50.
    pub max_distance_km: Option<f64>,
}

const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

/// A read-only, deterministically ordered view over the station table.
#[derive(Debug, Clone)]
pub struct StationIndex {
    records: Vec<StationRecord>,
}

impl StationIndex {
    /// The station table bundled with the crate.
    pub fn bundled() -> Result<Self, MetadataError> {
        let records: Vec<StationRecord> =
            serde_json::from_str(BUNDLED_STATIONS).map_err(MetadataError::TableParse)?;
        Ok(Self::from_records(records))
    }

    /// An index over a caller-supplied table.
    pub fn from_records(mut records: Vec<StationRecord>) -> Self {
        // Stable output order regardless of the table's own order.
        records.sort_by_key(|record| record.id);
        StationIndex { records }
    }

    /// Every station, ascending by identifier.
    pub fn records(&self) -> &[StationRecord] {
        &self.records
    }

    /// Looks a station up by numeric identifier or filename prefix,
    /// case-insensitively.
    pub fn get(&self, station: &str) -> Option<&StationRecord> {
        if let Ok(id) = station.parse::<u32>() {
            return self.records.iter().find(|record| record.id == id);
        }
        self.records
            .iter()
            .find(|record| record.prefix.eq_ignore_ascii_case(station))
    }

    /// Stations matching every provided filter, ascending by identifier.
    /// An unmatched query yields an empty vector, never an error.
    pub fn search(&self, query: &StationQuery<'_>) -> Vec<StationRecord> {
        self.records
            .iter()
            .filter(|record| matches(record, query))
            .cloned()
            .collect()
    }
}

fn matches(record: &StationRecord, query: &StationQuery<'_>) -> bool {
    if let Some(name) = query.name {
        if !record.name.to_lowercase().contains(&name.to_lowercase()) {
            return false;
        }
    }
    if let Some(elements) = query.elements {
        let reported = &record.elements;
        if !elements.iter().any(|code| reported.iter().any(|r| r == code)) {
            return false;
        }
    }
    if !record.coverage.overlaps(query.start, query.end) {
        return false;
    }
    if let Some(interval) = query.interval {
        if !record.intervals.contains(&interval) {
            return false;
        }
    }
    if let Some(LatLon(latitude, longitude)) = query.near {
        let km = distance(
            HaversineLocation {
                latitude,
                longitude,
            },
            HaversineLocation {
                latitude: record.location.latitude,
                longitude: record.location.longitude,
            },
            Units::Kilometers,
        );
        if km > query.max_distance_km.unwrap_or(DEFAULT_MAX_DISTANCE_KM) {
            return false;
        }
    }
    true
}
