//! Human descriptions for the archive's element and quality-flag codes.
//!
//! The archive identifies measurements by numeric codes (`1000` for global
//! irradiance and so on) and annotates readings with two-digit quality
//! flags. A reference table ships with the crate; callers can substitute
//! their own.

use crate::stations::error::MetadataError;
use serde::Deserialize;
use std::collections::HashMap;

const BUNDLED_DESCRIPTIONS: &str = include_str!("../../resources/descriptions.json");

const QC_FLAG_LENGTH: usize = 2;
const ELEMENT_CODE_LENGTH: usize = 3;
const INSTRUMENT_CODE_LENGTH: usize = 4;

#[derive(Debug, Deserialize)]
struct RawTables {
    flags: HashMap<String, String>,
    elements: HashMap<String, String>,
}

/// Lookup table from element and flag codes to descriptions.
#[derive(Debug, Clone)]
pub struct DescriptionTable {
    merged: HashMap<String, String>,
}

impl DescriptionTable {
    /// The reference table bundled with the crate.
    pub fn bundled() -> Result<Self, MetadataError> {
        let tables: RawTables =
            serde_json::from_str(BUNDLED_DESCRIPTIONS).map_err(MetadataError::DescriptionsParse)?;
        let mut merged = tables.elements;
        merged.extend(tables.flags);
        Ok(DescriptionTable { merged })
    }

    /// A table from caller-supplied code/description pairs.
    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        DescriptionTable { merged: entries }
    }

    /// Describes a quality flag (2 characters) or element code (3 or 4
    /// characters).
    ///
    /// Four-character codes carry an instrument number in their final
    /// digit; when the full code is not listed, the lookup falls back to
    /// the three-character element family.
    pub fn lookup(&self, code: &str) -> Result<&str, MetadataError> {
        match code.len() {
            QC_FLAG_LENGTH | ELEMENT_CODE_LENGTH => self
                .merged
                .get(code)
                .map(String::as_str)
                .ok_or_else(|| MetadataError::UnknownCode(code.to_string())),
            INSTRUMENT_CODE_LENGTH => self
                .merged
                .get(code)
                .or_else(|| self.merged.get(&code[..ELEMENT_CODE_LENGTH]))
                .map(String::as_str)
                .ok_or_else(|| MetadataError::UnknownCode(code.to_string())),
            _ => Err(MetadataError::InvalidCodeLength(code.to_string())),
        }
    }
}
