use std::io;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("required binary `{0}` not available")]
    MissingBin(String),

    #[error("{0}")]
    IO(io::Error),

    #[error("command killed after {0:?}")]
    CommandTimeout(Duration),

    #[error("invalid config {0}: {1}")]
    InvalidConfig(String, String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::IO(err)
    }
}
