use crate::decode::error::DecodeError;
use crate::types::interval::Interval;
use chrono::NaiveDate;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The requested range falls outside the station's known coverage.
    /// Raised during resolution, before any network work.
    #[error("range {start} to {end} is outside the coverage of station '{station}'")]
    Range {
        station: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// The naming scheme in use has no filename code for this granularity.
    #[error("no filename code configured for {0} data")]
    UnsupportedInterval(Interval),

    /// The archive has no file at this path. Distinct from transport
    /// failure and never retried.
    #[error("archive has no file at '{0}'")]
    NotFound(String),

    /// The request itself failed (connection, timeout, protocol). Retried
    /// with backoff before being surfaced.
    #[error("network request failed for {0}")]
    Transport(String, #[source] reqwest::Error),

    /// The server answered with a non-success status other than 404.
    #[error("HTTP request for {url} failed with status {status}")]
    HttpStatus { url: String, status: StatusCode },

    /// A fetched file is not valid UTF-8 text.
    #[error("response for '{path}' is not valid UTF-8 text")]
    NotText {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// A compressed bundle could not be opened or walked.
    #[error("failed to read bundle '{path}'")]
    BundleRead {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// A bundle member could not be extracted as text.
    #[error("failed to extract member '{member}' from bundle '{path}'")]
    BundleMember {
        path: String,
        member: String,
        #[source]
        source: std::io::Error,
    },

    /// The session cache holds different contents for this path than a
    /// bundle extraction produced. Always a defect, never expected.
    #[error("cache state conflict for '{0}'")]
    CacheConflict(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl FetchError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(..) => true,
            FetchError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
