mod archive;
mod decode;
mod error;
mod solardat;
mod stations;
mod types;

pub use error::SolardatError;
pub use solardat::*;

pub use archive::error::FetchError;
pub use archive::fetcher::{ArchiveFetcher, FetchOutcome};
pub use archive::naming::{CompressedBundle, NamingScheme, ARCHIVE_DIR, DEFAULT_BASE_URL};
pub use archive::transport::{HttpTransport, Transport};

pub use decode::archival::{parse_archival, read_raw, DecodedFile, MISSING_SENTINEL};
pub use decode::error::DecodeError;
pub use decode::schema::{ElementColumn, FileSchema};

pub use stations::descriptions::DescriptionTable;
pub use stations::error::MetadataError;
pub use stations::search::{StationIndex, StationQuery};

pub use types::interval::Interval;
pub use types::raw_file::{FileOrigin, RawFile, StemInfo};
pub use types::record::{ArchivalRecord, Measurement, Reading};
pub use types::station::{Coverage, LatLon, Location, StationRecord};
