//! Column schema of an archival file, built once from its header row.
//!
//! The archive's convention is implicit in the data: every element's value
//! column is immediately followed by its quality-flag column. The schema
//! makes that pairing explicit, so row parsing never has to infer which
//! column belongs to which element.

use crate::decode::error::DecodeError;

/// One element's pair of columns within a data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementColumn {
    /// The archive element code, e.g. `"1000"`.
    pub code: String,
    /// Zero-based index of the value field within a data row.
    pub value_index: usize,
    /// Zero-based index of the quality-flag field, always `value_index + 1`.
    pub flag_index: usize,
}

/// The decoded header of an archival file.
///
/// A header row reads `station_id <TAB> year <TAB> (element <TAB> 0)*`; data
/// rows then carry `doy <TAB> ending_time` followed by one `(value, flag)`
/// pair per element, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSchema {
    /// Numeric archive identifier of the station, e.g. `94255`.
    pub station_id: u32,
    /// Year all rows of the file belong to.
    pub year: i32,
    columns: Vec<ElementColumn>,
}

/// Fields of a data row that precede the element pairs: day-of-year and
/// HHMM ending time.
pub const LEADING_FIELDS: usize = 2;

impl FileSchema {
    /// Builds the schema from the tokenized header row.
    pub fn from_header(fields: &[&str]) -> Result<FileSchema, DecodeError> {
        let (station_field, year_field) = match fields {
            [station, year, ..] => (*station, *year),
            _ => {
                return Err(DecodeError::MalformedHeader(format!(
                    "expected at least a station id and a year, found {} fields",
                    fields.len()
                )))
            }
        };

        let station_id: u32 = station_field.parse().map_err(|_| {
            DecodeError::MalformedHeader(format!("'{}' is not a station id", station_field))
        })?;
        let year: i32 = year_field.parse().map_err(|_| {
            DecodeError::MalformedHeader(format!("'{}' is not a year", year_field))
        })?;

        let descriptors = &fields[LEADING_FIELDS..];
        if descriptors.len() % 2 != 0 {
            return Err(DecodeError::MalformedHeader(format!(
                "odd number of element descriptor fields ({})",
                descriptors.len()
            )));
        }

        let columns = descriptors
            .chunks_exact(2)
            .enumerate()
            .map(|(position, pair)| ElementColumn {
                code: pair[0].to_string(),
                value_index: LEADING_FIELDS + 2 * position,
                flag_index: LEADING_FIELDS + 2 * position + 1,
            })
            .collect();

        Ok(FileSchema {
            station_id,
            year,
            columns,
        })
    }

    /// The element columns, in file order.
    pub fn columns(&self) -> &[ElementColumn] {
        &self.columns
    }

    /// Total fields every data row must carry.
    pub fn field_count(&self) -> usize {
        LEADING_FIELDS + 2 * self.columns.len()
    }

    /// The element codes, in file order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.code.as_str())
    }
}
