use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("DBX error: {0}")]
    Dbx(#[from] dbx::Error),

    #[error("FBRB error: {0}")]
    Fbrb(#[from] fbrb::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
