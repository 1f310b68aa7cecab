use thiserror::Error;

/// The archive text does not match the expected layout.
///
/// These errors indicate genuinely malformed input and are never retried.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("archival file is empty, expected a header row")]
    EmptyFile,

    #[error("malformed header row: {0}")]
    MalformedHeader(String),

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid numeric value '{value}'")]
    InvalidNumber {
        line: usize,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("line {line}: invalid quality flag '{value}'")]
    InvalidFlag {
        line: usize,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("line {line}: day-of-year {doy} is not valid for year {year}")]
    InvalidDay { line: usize, doy: u32, year: i32 },

    #[error("line {line}: '{value}' is not a valid HHMM ending time")]
    InvalidTime { line: usize, value: String },
}
