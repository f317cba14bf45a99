//! Blob store trait.
//!
//! File storage boundary: the portal only ever uploads opaque bytes and asks
//! for a public URL to hand back to clients.

use crate::BoxFuture;
use thiserror::Error;

/// Errors from the blob store boundary.
#[derive(Error, Debug)]
pub enum BlobError {
    /// The transfer failed or was rejected by the backing service.
    #[error("blob transport error: {0}")]
    Transport(String),

    /// The handle does not refer to a stored blob.
    #[error("unknown blob: {0}")]
    UnknownBlob(String),
}

/// Reference to an uploaded blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobHandle(pub String);

impl BlobHandle {
    /// The storage path backing this handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque byte storage with publicly resolvable URLs.
pub trait BlobStore: Send + Sync {
    /// Uploads `bytes` under `path` and returns a handle to the stored blob.
    ///
    /// # Errors
    ///
    /// - `Transport`: the transfer failed
    fn upload(&self, path: String, bytes: Vec<u8>) -> BoxFuture<'_, Result<BlobHandle, BlobError>>;

    /// Resolves a handle to a URL that clients can fetch directly.
    ///
    /// # Errors
    ///
    /// - `UnknownBlob`: the handle does not refer to a stored blob
    /// - `Transport`: the backing service call failed
    fn public_url(&self, handle: &BlobHandle) -> BoxFuture<'_, Result<String, BlobError>>;
}
