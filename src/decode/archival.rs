//! Decoder for the archive's fixed-field text format.
//!
//! Translation is deterministic and side-effect free: the same bytes always
//! decode to the same record sequence, in input line order. All I/O happens
//! elsewhere; this module only ever sees text.

use crate::decode::error::DecodeError;
use crate::decode::schema::FileSchema;
use crate::types::record::{ArchivalRecord, Measurement, Reading};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

/// The reserved numeric value the archive writes where no measurement
/// exists. Decodes to [`Reading::Missing`], never to a real value.
pub const MISSING_SENTINEL: f64 = -999.0;

const DELIMITER: char = '\t';

/// Everything decoded from one archival file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFile {
    /// The column schema built from the file's header row.
    pub schema: Arc<FileSchema>,
    /// The decoded rows, in file (chronological) order.
    pub records: Vec<ArchivalRecord>,
}

impl DecodedFile {
    /// Numeric archive identifier of the station, from the header.
    pub fn station_id(&self) -> u32 {
        self.schema.station_id
    }
}

/// Splits archival text into per-line field lists.
///
/// The first returned line is the header row. Lines are tokenized on tabs,
/// falling back to whitespace for the occasional space-padded file; trailing
/// blank lines are tolerated and dropped.
pub fn read_raw(text: &str) -> Result<Vec<Vec<&str>>, DecodeError> {
    let lines: Vec<Vec<&str>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(tokenize)
        .collect();

    if lines.is_empty() {
        return Err(DecodeError::EmptyFile);
    }
    Ok(lines)
}

fn tokenize(line: &str) -> Vec<&str> {
    if line.contains(DELIMITER) {
        line.split(DELIMITER).map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Decodes one file's text into an ordered sequence of [`ArchivalRecord`].
///
/// The header row declares the station, the year and the element columns;
/// every following row must carry exactly the field count the header
/// implies, or decoding fails with a field-count error. Values equal to
/// [`MISSING_SENTINEL`] decode to [`Reading::Missing`].
pub fn parse_archival(text: &str) -> Result<DecodedFile, DecodeError> {
    let lines = read_raw(text)?;
    let schema = Arc::new(FileSchema::from_header(&lines[0])?);

    let mut records = Vec::with_capacity(lines.len() - 1);
    for (index, fields) in lines[1..].iter().enumerate() {
        // Line numbers are 1-based and count the header.
        records.push(parse_row(&schema, fields, index + 2)?);
    }

    Ok(DecodedFile { schema, records })
}

fn parse_row(
    schema: &Arc<FileSchema>,
    fields: &[&str],
    line: usize,
) -> Result<ArchivalRecord, DecodeError> {
    if fields.len() != schema.field_count() {
        return Err(DecodeError::FieldCount {
            line,
            expected: schema.field_count(),
            found: fields.len(),
        });
    }

    let doy: u32 = fields[0]
        .parse()
        .map_err(|_| DecodeError::InvalidDay {
            line,
            doy: 0,
            year: schema.year,
        })
        .and_then(|doy| {
            if (1..=366).contains(&doy) {
                Ok(doy)
            } else {
                Err(DecodeError::InvalidDay {
                    line,
                    doy,
                    year: schema.year,
                })
            }
        })?;
    let date = NaiveDate::from_yo_opt(schema.year, doy).ok_or(DecodeError::InvalidDay {
        line,
        doy,
        year: schema.year,
    })?;

    let ending_time = parse_ending_time(date, fields[1], line)?;

    let mut measurements = Vec::with_capacity(schema.columns().len());
    for column in schema.columns() {
        let value_field = fields[column.value_index];
        let flag_field = fields[column.flag_index];

        let value: f64 = value_field.parse().map_err(|e| DecodeError::InvalidNumber {
            line,
            value: value_field.to_string(),
            source: e,
        })?;
        let flag: u8 = flag_field.parse().map_err(|e| DecodeError::InvalidFlag {
            line,
            value: flag_field.to_string(),
            source: e,
        })?;

        let reading = if value == MISSING_SENTINEL {
            Reading::Missing
        } else {
            Reading::Value(value)
        };
        measurements.push(Measurement { reading, flag });
    }

    Ok(ArchivalRecord::new(
        Arc::clone(schema),
        ending_time,
        measurements,
    ))
}

/// Parses an HHMM interval ending time and anchors it to `date`.
///
/// The archive writes `2400` for the last interval of a day, which lands on
/// the following day's midnight.
fn parse_ending_time(
    date: NaiveDate,
    field: &str,
    line: usize,
) -> Result<chrono::NaiveDateTime, DecodeError> {
    let invalid = || DecodeError::InvalidTime {
        line,
        value: field.to_string(),
    };

    let raw: u32 = field.parse().map_err(|_| invalid())?;
    let (hours, minutes) = (raw / 100, raw % 100);
    if hours > 24 || minutes > 59 || (hours == 24 && minutes != 0) {
        return Err(invalid());
    }

    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    midnight
        .checked_add_signed(Duration::minutes((hours * 60 + minutes) as i64))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // A small hourly file in the archive layout: header declaring three
    // elements, then value/flag pairs per row.
    const SAMPLE: &str = "94255\t2018\t1000\t0\t2010\t0\t9301\t0\n\
        1\t100\t0.0\t12\t0.0\t12\t3.4\t11\n\
        1\t200\t0.0\t12\t-999\t99\t3.1\t11\n\
        1\t2400\t12.5\t11\t8.2\t11\t-2.0\t11\n\
        2\t100\t0.0\t12\t0.0\t12\t-1.5\t11\n\n";

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn decodes_sample_file() {
        let decoded = parse_archival(SAMPLE).unwrap();

        assert_eq!(decoded.station_id(), 94255);
        assert_eq!(decoded.records.len(), 4);

        let first = &decoded.records[0];
        assert_eq!(first.ending_time(), datetime(2018, 1, 1, 1, 0));
        assert_eq!(first.measurement("1000").unwrap().reading, Reading::Value(0.0));
        assert_eq!(first.measurement("9301").unwrap().flag, 11);
    }

    #[test]
    fn decode_is_deterministic() {
        let once = parse_archival(SAMPLE).unwrap();
        let twice = parse_archival(SAMPLE).unwrap();
        assert_eq!(once.records, twice.records);
    }

    #[test]
    fn preserves_input_order() {
        let decoded = parse_archival(SAMPLE).unwrap();
        let times: Vec<_> = decoded.records.iter().map(|r| r.ending_time()).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[test]
    fn sentinel_decodes_to_missing() {
        let decoded = parse_archival(SAMPLE).unwrap();
        let measurement = decoded.records[1].measurement("2010").unwrap();
        assert!(measurement.reading.is_missing());
        assert_eq!(measurement.flag, 99);
        // Missing must stay distinct from a real zero in the same row.
        assert_eq!(
            decoded.records[1].measurement("1000").unwrap().reading,
            Reading::Value(0.0)
        );
    }

    #[test]
    fn ending_time_2400_rolls_to_next_day() {
        let decoded = parse_archival(SAMPLE).unwrap();
        assert_eq!(decoded.records[2].ending_time(), datetime(2018, 1, 2, 0, 0));
    }

    #[test]
    fn wrong_field_count_is_an_error() {
        let malformed = "94255\t2018\t1000\t0\n1\t100\t0.0\n";
        match parse_archival(malformed) {
            Err(DecodeError::FieldCount {
                line,
                expected,
                found,
            }) => {
                assert_eq!(line, 2);
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
            }
            other => panic!("expected field count error, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse_archival("\n\n"), Err(DecodeError::EmptyFile)));
    }

    #[test]
    fn tolerates_trailing_blank_lines() {
        let padded = format!("{}\n\n\n", SAMPLE);
        assert_eq!(parse_archival(&padded).unwrap().records.len(), 4);
    }

    #[test]
    fn tokenizes_space_padded_lines() {
        let spaced = "94255 2018 1000 0\n1 100 0.0 12\n";
        let decoded = parse_archival(spaced).unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(
            decoded.records[0].measurement("1000").unwrap().reading,
            Reading::Value(0.0)
        );
    }

    #[test]
    fn rejects_bad_day_of_year() {
        let bad = "94255\t2018\t1000\t0\n367\t100\t0.0\t12\n";
        assert!(matches!(
            parse_archival(bad),
            Err(DecodeError::InvalidDay { doy: 367, .. })
        ));
    }

    #[test]
    fn rejects_bad_ending_time() {
        let bad = "94255\t2018\t1000\t0\n1\t2461\t0.0\t12\n";
        assert!(matches!(
            parse_archival(bad),
            Err(DecodeError::InvalidTime { .. })
        ));
    }

    #[test]
    fn fifteen_minute_times_parse() {
        let quarter = "94249\t2016\t1001\t0\n1\t15\t0.0\t12\n1\t30\t0.0\t12\n";
        let decoded = parse_archival(quarter).unwrap();
        assert_eq!(decoded.records[0].ending_time(), datetime(2016, 1, 1, 0, 15));
        assert_eq!(decoded.records[1].ending_time(), datetime(2016, 1, 1, 0, 30));
    }
}
