//! Application state for the portal HTTP server.
//!
//! Contains every shared resource handlers need: the session provider, the
//! event repository, the registration subsystem, the clock, and the loaded
//! configuration. Cloned cheaply (all Arcs) per request.

use crate::config::Config;
use crate::events::EventRepository;
use crate::registration::RegistrationService;
use crate::session::SessionProvider;
use campus_portal_core::blob::BlobStore;
use campus_portal_core::environment::{Clock, SystemClock};
use campus_portal_core::identity::IdentityService;
use campus_portal_core::store::DocumentStore;
use campus_portal_memstore::{MemoryBlobStore, MemoryDocumentStore, MemoryIdentity};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Session provider: identity, roles, tokens.
    pub sessions: Arc<SessionProvider>,
    /// Event repository.
    pub events: Arc<EventRepository>,
    /// Registration subsystem.
    pub registrations: Arc<RegistrationService>,
    /// Injected time source.
    pub clock: Arc<dyn Clock>,
    /// Loaded configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the application onto the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityService>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        let sessions = Arc::new(SessionProvider::new(
            identity,
            store.clone(),
            &config.auth,
        ));
        let events = Arc::new(EventRepository::new(
            store.clone(),
            blobs,
            clock.clone(),
            config.storage.image_prefix.clone(),
        ));
        let registrations = Arc::new(RegistrationService::new(store, clock.clone()));
        Self {
            sessions,
            events,
            registrations,
            clock,
            config: Arc::new(config),
        }
    }

    /// State backed entirely by the in-memory collaborators — the
    /// development and test configuration.
    #[must_use]
    pub fn in_memory(config: Config) -> Self {
        Self::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryIdentity::new()),
            Arc::new(SystemClock),
            config,
        )
    }
}
