#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A page content line showed up before any page header.
    #[error("line before page (line {line})")]
    LineBeforePage { line: usize },

    /// A header record is missing required fields or has the wrong types.
    #[error("invalid page header at line {line}: {reason}")]
    InvalidHeader { line: usize, reason: String },

    /// A content block could not be decoded.
    #[error("invalid block: {0}")]
    InvalidBlock(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error reading either level of a packet archive.
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
