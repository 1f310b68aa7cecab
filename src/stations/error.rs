use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to parse station metadata table")]
    TableParse(#[source] serde_json::Error),

    #[error("failed to parse element description table")]
    DescriptionsParse(#[source] serde_json::Error),

    #[error("code '{0}' must be 2, 3 or 4 characters long")]
    InvalidCodeLength(String),

    #[error("unknown element or flag code '{0}'")]
    UnknownCode(String),
}
