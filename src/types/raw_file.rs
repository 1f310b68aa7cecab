//! Fetched archive units, before decoding.

use crate::types::interval::Interval;
use std::sync::Arc;

/// How a [`RawFile`] reached the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOrigin {
    /// Retrieved directly from the archive by this call.
    Download,
    /// Extracted from a compressed bundle by this call.
    Bundle,
    /// Served from the session cache.
    Cache,
}

/// What a filename stem claims about its contents.
///
/// Derived purely from the archive's naming convention; the decoder is the
/// authority on what the file actually holds.
#[derive(Debug, Clone, PartialEq)]
pub struct StemInfo {
    /// Station file prefix, e.g. `EUP`.
    pub prefix: String,
    /// Granularity encoded in the interval letter, if the letter is known to
    /// the naming scheme in use.
    pub interval: Option<Interval>,
    /// Full year, e.g. `2018`.
    pub year: i32,
    /// Month, 1 through 12.
    pub month: u32,
}

/// The text of one fetched archive unit: a single station/month file, either
/// retrieved directly or extracted from a bundle.
///
/// Immutable after construction. Contents are shared, so cloning a `RawFile`
/// (as the session cache does on every hit) does not copy the file text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFile {
    /// Filename without directory or extension, e.g. `EUPH1801`.
    pub stem: String,
    /// Archive URL path this file was (or would be) fetched from.
    pub path: String,
    /// Station and month the filename claims to cover, when the stem follows
    /// the archive convention.
    pub claim: Option<StemInfo>,
    /// Whether this instance came from the network, a bundle, or the cache.
    pub origin: FileOrigin,
    contents: Arc<str>,
}

impl RawFile {
    pub(crate) fn new(
        stem: impl Into<String>,
        path: impl Into<String>,
        claim: Option<StemInfo>,
        origin: FileOrigin,
        contents: impl Into<Arc<str>>,
    ) -> Self {
        RawFile {
            stem: stem.into(),
            path: path.into(),
            claim,
            origin,
            contents: contents.into(),
        }
    }

    /// The file's text.
    pub fn text(&self) -> &str {
        &self.contents
    }

    pub(crate) fn with_origin(mut self, origin: FileOrigin) -> Self {
        self.origin = origin;
        self
    }
}
