use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated: expected {expected} more bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid numeric token for field {field:?}: {token:?}")]
    NumericParse { field: String, token: String },

    #[error("string pool index {0} out of range")]
    StringIndexOutOfRange(u64),

    #[error("malformed string pool: offsets are not non-decreasing")]
    MalformedStringPool,

    #[error("malformed XML line: {0:?}")]
    MalformedLine(String),
}

pub type Result<T> = std::result::Result<T, Error>;
