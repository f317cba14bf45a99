//! Document store trait and subscription types.
//!
//! This is the portal's persistence boundary: a collection/document database
//! that supports keyed and auto-keyed writes, partial updates, filtered and
//! ordered reads, and live collection subscriptions.
//!
//! # Design
//!
//! The trait is deliberately minimal — exactly the operations the portal
//! consumes from its hosted backend:
//!
//! - `insert` / `put` to create documents (auto-keyed vs. caller-keyed)
//! - `get` / `list` to read
//! - `update` for partial field merges
//! - `delete`, idempotent
//! - `subscribe` for a standing stream of collection snapshots
//!
//! Per-document write serialization and durability are the implementation's
//! responsibility; the trait promises only last-write-wins semantics.
//!
//! # Implementations
//!
//! - `MemoryDocumentStore` (in `campus-portal-memstore`): in-process
//!   implementation used for development and tests.

use crate::BoxFuture;
use crate::document::{CollectionPath, Document, FieldFilter, OrderBy};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors that can occur during document store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing service could not be reached or rejected the call.
    #[error("store transport error: {0}")]
    Transport(String),

    /// A payload could not be serialized or deserialized.
    #[error("store serialization error: {0}")]
    Serialization(String),

    /// A keyed operation referenced a malformed path or key.
    #[error("invalid document address: {0}")]
    InvalidAddress(String),
}

/// Point-in-time contents of one collection.
///
/// Snapshots are whole-collection: subscribers derive whatever view they
/// need (most commonly the cardinality) rather than applying deltas.
#[derive(Clone, Debug)]
pub struct CollectionSnapshot {
    /// Collection the snapshot describes.
    pub path: CollectionPath,
    /// All documents currently in the collection, in enumeration order.
    pub documents: Vec<Document>,
}

impl CollectionSnapshot {
    /// Number of documents in the collection at snapshot time.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the collection was empty at snapshot time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// A standing observation of one collection.
///
/// The first call to [`Subscription::recv`] yields the collection's state at
/// subscription time; every later call yields the state after a mutation.
/// Holders must drop the subscription when the observed collection leaves
/// view — the store keeps publishing for as long as any receiver exists.
///
/// A subscriber that falls behind skips to newer snapshots: intermediate
/// states may be missed, but delivery is monotonic and converges on the
/// settled state.
pub struct Subscription {
    initial: Option<CollectionSnapshot>,
    receiver: broadcast::Receiver<CollectionSnapshot>,
}

impl Subscription {
    /// Creates a subscription from the snapshot taken at subscribe time and
    /// the collection's broadcast receiver.
    #[must_use]
    pub const fn new(
        initial: CollectionSnapshot,
        receiver: broadcast::Receiver<CollectionSnapshot>,
    ) -> Self {
        Self {
            initial: Some(initial),
            receiver,
        }
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the store side has gone away and all pending
    /// snapshots have been drained.
    pub async fn recv(&mut self) -> Option<CollectionSnapshot> {
        if let Some(first) = self.initial.take() {
            return Some(first);
        }
        loop {
            match self.receiver.recv().await {
                Ok(snapshot) => return Some(snapshot),
                // Fell behind: newer snapshots supersede the missed ones.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("initial_pending", &self.initial.is_some())
            .finish_non_exhaustive()
    }
}

/// Collection/document database abstraction.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the application shares one
/// instance behind an `Arc` across all request handlers.
pub trait DocumentStore: Send + Sync {
    /// Creates a document with a store-assigned key and returns that key.
    ///
    /// # Errors
    ///
    /// - `Transport`: the backing service call failed
    fn insert(
        &self,
        path: CollectionPath,
        data: Value,
    ) -> BoxFuture<'_, Result<String, StoreError>>;

    /// Creates or overwrites the document at `id` (last write wins).
    ///
    /// Writing to an existing key replaces the previous payload, which is
    /// what makes deterministic keys an idempotency mechanism for callers.
    ///
    /// # Errors
    ///
    /// - `Transport`: the backing service call failed
    fn put(
        &self,
        path: CollectionPath,
        id: String,
        data: Value,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Reads one document by key. `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// - `Transport`: the backing service call failed
    fn get(
        &self,
        path: CollectionPath,
        id: String,
    ) -> BoxFuture<'_, Result<Option<Document>, StoreError>>;

    /// Reads all documents in a collection, optionally filtered and ordered.
    ///
    /// Without an `order`, documents come back in the store's enumeration
    /// order. A collection that does not exist yet reads as empty.
    ///
    /// # Errors
    ///
    /// - `Transport`: the backing service call failed
    fn list(
        &self,
        path: CollectionPath,
        filter: Option<FieldFilter>,
        order: Option<OrderBy>,
    ) -> BoxFuture<'_, Result<Vec<Document>, StoreError>>;

    /// Merges `fields` into the document at `id`.
    ///
    /// Only the provided top-level fields change. Updating a missing
    /// document is a no-op, not an error — callers that need
    /// create-or-update semantics use [`DocumentStore::put`].
    ///
    /// # Errors
    ///
    /// - `Transport`: the backing service call failed
    fn update(
        &self,
        path: CollectionPath,
        id: String,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Deletes the document at `id`. Deleting an absent key is a no-op.
    ///
    /// Sub-collections under the deleted document are untouched; they remain
    /// addressable by their full path.
    ///
    /// # Errors
    ///
    /// - `Transport`: the backing service call failed
    fn delete(&self, path: CollectionPath, id: String) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Opens a standing observation of a collection.
    ///
    /// The subscription's first snapshot is the collection's current state;
    /// every mutation of the collection afterwards produces a new snapshot
    /// with no gap between the initial read and the change feed.
    ///
    /// # Errors
    ///
    /// - `Transport`: the backing service call failed
    fn subscribe(&self, path: CollectionPath) -> BoxFuture<'_, Result<Subscription, StoreError>>;
}
