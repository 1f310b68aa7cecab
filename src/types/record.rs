//! Decoded measurement rows.

use crate::decode::schema::FileSchema;
use chrono::NaiveDateTime;
use std::fmt;
use std::sync::Arc;

/// The value part of a measurement, keeping the archive's "missing" sentinel
/// distinct from any real reading (including `0.0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// A real measured value.
    Value(f64),
    /// The archive reported no data for this element at this time.
    Missing,
}

impl Reading {
    /// The measured value, or `None` when the archive marked it missing.
    pub fn value(self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Reading::Missing)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", v),
            Reading::Missing => write!(f, "missing"),
        }
    }
}

/// One measured element: its reading and the archive's quality flag for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub reading: Reading,
    /// The archive-provided quality code for this reading.
    pub flag: u8,
}

/// One decoded row of an archival file.
///
/// Records are immutable and only produced by the decoder. Each record keeps
/// a handle to the file's column schema, so lookups by element code work
/// without storing the codes per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivalRecord {
    station_id: u32,
    ending_time: NaiveDateTime,
    schema: Arc<FileSchema>,
    measurements: Vec<Measurement>,
}

impl ArchivalRecord {
    pub(crate) fn new(
        schema: Arc<FileSchema>,
        ending_time: NaiveDateTime,
        measurements: Vec<Measurement>,
    ) -> Self {
        ArchivalRecord {
            station_id: schema.station_id,
            ending_time,
            schema,
            measurements,
        }
    }

    /// Numeric archive identifier of the reporting station, taken from the
    /// file header.
    pub fn station_id(&self) -> u32 {
        self.station_id
    }

    /// End of the interval this row covers.
    pub fn ending_time(&self) -> NaiveDateTime {
        self.ending_time
    }

    /// The measurement for `code`, if the file carries that element.
    pub fn measurement(&self, code: &str) -> Option<Measurement> {
        let position = self
            .schema
            .columns()
            .iter()
            .position(|column| column.code == code)?;
        self.measurements.get(position).copied()
    }

    /// Iterate over `(element code, measurement)` pairs in file column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Measurement)> {
        self.schema
            .columns()
            .iter()
            .zip(self.measurements.iter())
            .map(|(column, measurement)| (column.code.as_str(), *measurement))
    }

    /// Number of elements this row reports.
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::schema::FileSchema;

    fn schema() -> Arc<FileSchema> {
        Arc::new(
            FileSchema::from_header(&["94255", "2018", "1000", "0", "9301", "0"]).unwrap(),
        )
    }

    #[test]
    fn lookup_by_code() {
        let record = ArchivalRecord::new(
            schema(),
            chrono::NaiveDate::from_ymd_opt(2018, 1, 1)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap(),
            vec![
                Measurement {
                    reading: Reading::Value(0.0),
                    flag: 12,
                },
                Measurement {
                    reading: Reading::Missing,
                    flag: 99,
                },
            ],
        );
        assert_eq!(record.station_id(), 94255);
        assert_eq!(record.measurement("1000").unwrap().reading, Reading::Value(0.0));
        assert!(record.measurement("9301").unwrap().reading.is_missing());
        assert!(record.measurement("2010").is_none());

        let codes: Vec<&str> = record.iter().map(|(code, _)| code).collect();
        assert_eq!(codes, ["1000", "9301"]);
    }

    #[test]
    fn missing_is_not_zero() {
        assert_ne!(Reading::Missing, Reading::Value(0.0));
        assert_eq!(Reading::Missing.value(), None);
        assert_eq!(Reading::Value(0.0).value(), Some(0.0));
    }
}
