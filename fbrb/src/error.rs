use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated: expected {expected} more bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("string table offset {0} out of range")]
    StringOffsetOutOfRange(u32),

    #[error("payload range [{offset}, {offset}+{len}) out of bounds for a payload of {total} bytes")]
    PayloadOutOfBounds {
        offset: u32,
        len: u32,
        total: usize,
    },

    #[error("entry {index}: duplicated payload_len fields disagree ({a} != {b})")]
    MismatchedLength { index: usize, a: u32, b: u32 },

    #[error("entry path {0:?} escapes the output root")]
    UnsafePath(String),

    #[error("unknown extension {0:?}")]
    UnknownExtension(String),
}

pub type Result<T> = std::result::Result<T, Error>;
