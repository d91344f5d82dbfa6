use gatekeeper_store::StoreError;
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Key cannot be mapped to a file inside the store directory.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),
}

impl StoreError for Error {}
