//! Error kinds for the storage core (§7).
//!
//! `SubstrateError` is the ordered-KV substrate's error surface; `Error` is
//! the core's own public surface and never leaks a backend-specific type —
//! callers only ever see `SubstrateError` wrapped in `Error::Unavailable`.

#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
    #[error("sled backend error: {0}")]
    Sled(#[from] sled::Error),

    #[error("substrate I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned from `get` when the current-pointer is absent.
    #[error("key not found")]
    NotFound,

    /// Substrate read/write failure. Surfaced as-is; the core neither
    /// retries indefinitely nor masks it.
    #[error("substrate unavailable: {0}")]
    Unavailable(#[from] SubstrateError),

    /// The read-repair retry cap in 4.3.3 was exceeded without the
    /// consistency witness ever converging.
    #[error("read retry cap exceeded; back off and retry")]
    ReadLiveLock,

    /// The substrate could not be opened at construction time. Fatal.
    #[error("failed to open storage engine: {0}")]
    OpenFailure(String),
}
