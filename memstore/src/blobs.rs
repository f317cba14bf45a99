//! In-memory blob store.

use campus_portal_core::blob::{BlobError, BlobHandle, BlobStore};
use campus_portal_core::BoxFuture;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Path-keyed byte storage with deterministic public URLs.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn upload(&self, path: String, bytes: Vec<u8>) -> BoxFuture<'_, Result<BlobHandle, BlobError>> {
        Box::pin(async move {
            self.blobs
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(path.clone(), bytes);
            Ok(BlobHandle(path))
        })
    }

    fn public_url(&self, handle: &BlobHandle) -> BoxFuture<'_, Result<String, BlobError>> {
        let handle = handle.clone();
        Box::pin(async move {
            let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
            if blobs.contains_key(handle.as_str()) {
                Ok(format!("memstore://{}", handle.as_str()))
            } else {
                Err(BlobError::UnknownBlob(handle.as_str().to_string()))
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uploaded_blob_resolves_to_url() {
        let store = MemoryBlobStore::new();
        let handle = store
            .upload("event_images/poster.png".into(), vec![1, 2, 3])
            .await
            .unwrap();
        let url = store.public_url(&handle).await.unwrap();
        assert_eq!(url, "memstore://event_images/poster.png");
    }

    #[tokio::test]
    async fn unknown_handle_is_an_error() {
        let store = MemoryBlobStore::new();
        let missing = BlobHandle("nope".into());
        assert!(matches!(
            store.public_url(&missing).await,
            Err(BlobError::UnknownBlob(_))
        ));
    }
}
