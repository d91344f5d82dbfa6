use thiserror::Error;

/// Result type for access list operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when managing the access list.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The persisted record exists but cannot be parsed or breaks an invariant.
    #[error("access list record is corrupt: {0}")]
    CorruptState(String),

    /// A caller supplied a value outside the accepted domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The in-memory state could not be encoded for storage.
    #[error("failed to encode access list: {0}")]
    Serialize(String),

    /// The backing store could not be read or written.
    #[error("access list storage unavailable: {0}")]
    StorageUnavailable(String),
}
