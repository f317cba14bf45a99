//! # Campus Portal Core
//!
//! Boundary-collaborator abstractions for the campus event portal.
//!
//! The portal delegates persistence, authentication, and file storage to
//! managed backend services. This crate defines those collaborators as
//! traits, so the application is written against interfaces while the
//! concrete transports live in sibling crates:
//!
//! - [`store::DocumentStore`] — a collection/document database with live
//!   collection subscriptions
//! - [`blob::BlobStore`] — opaque byte storage with public URLs
//! - [`identity::IdentityService`] — account creation, sign-in, and a
//!   push-driven view of the current identity
//! - [`environment::Clock`] — injected time, so domain logic never reads
//!   the ambient clock directly
//!
//! # Dyn Compatibility
//!
//! The collaborator traits use explicit `Pin<Box<dyn Future>>` returns
//! instead of `async fn` so they can be held as trait objects
//! (`Arc<dyn DocumentStore>`) and shared across the application state.

pub use chrono::{DateTime, Utc};

pub mod blob;
pub mod document;
pub mod environment;
pub mod identity;
pub mod store;

pub use blob::{BlobError, BlobHandle, BlobStore};
pub use document::{CollectionPath, Document, FieldFilter, OrderBy};
pub use environment::{Clock, SystemClock};
pub use identity::{AuthSignal, AuthWatch, Identity, IdentityError, IdentityService};
pub use store::{CollectionSnapshot, DocumentStore, StoreError, Subscription};

/// Boxed future type used by the collaborator traits.
pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;
