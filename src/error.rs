use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid tracking window: {0} minutes, must be at least 1")]
    InvalidWindow(u32),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    #[inline]
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
