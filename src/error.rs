use crate::archive::error::FetchError;
use crate::decode::error::DecodeError;
use crate::stations::error::MetadataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolardatError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("unknown station '{0}'")]
    UnknownStation(String),
}
