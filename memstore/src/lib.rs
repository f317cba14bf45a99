//! # Campus Portal Memstore
//!
//! In-memory implementations of the portal's boundary collaborators:
//!
//! - [`MemoryDocumentStore`] — last-write-wins document collections with
//!   live collection subscriptions
//! - [`MemoryBlobStore`] — path-keyed byte storage with deterministic URLs
//! - [`MemoryIdentity`] — email/password accounts with an auth watch
//!
//! These are the development and test stand-ins for the hosted services the
//! deployed portal talks to. They hold everything in process memory and
//! persist nothing.

pub mod blobs;
pub mod documents;
pub mod identity;

pub use blobs::MemoryBlobStore;
pub use documents::MemoryDocumentStore;
pub use identity::MemoryIdentity;
