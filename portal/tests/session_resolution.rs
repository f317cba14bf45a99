//! Liveness of initial session resolution.

#![allow(clippy::unwrap_used)]

use campus_portal::config::AuthConfig;
use campus_portal::{AuthState, SessionProvider};
use campus_portal_memstore::{MemoryDocumentStore, MemoryIdentity};
use campus_portal_testing::StalledIdentity;
use std::sync::Arc;
use std::time::Duration;

fn auth_config(timeout_secs: u64) -> AuthConfig {
    AuthConfig {
        session_resolve_timeout: timeout_secs,
        coordinator_enrollment_key: "key".into(),
    }
}

#[tokio::test]
async fn stalled_identity_service_resolves_to_anonymous() {
    let sessions = SessionProvider::new(
        Arc::new(StalledIdentity::new()),
        Arc::new(MemoryDocumentStore::new()),
        &auth_config(1),
    );
    let mut state = sessions.watch_state();
    assert_eq!(*state.borrow(), AuthState::Loading);

    // Must finish despite the identity service never reporting: the timeout
    // is the upper bound, so give it a little headroom and no more.
    tokio::time::timeout(Duration::from_secs(3), sessions.resolve_initial())
        .await
        .unwrap();

    state.changed().await.unwrap();
    assert_eq!(*state.borrow(), AuthState::Anonymous);
}

#[tokio::test]
async fn responsive_identity_service_resolves_before_the_bound() {
    let sessions = SessionProvider::new(
        Arc::new(MemoryIdentity::new()),
        Arc::new(MemoryDocumentStore::new()),
        &auth_config(10),
    );

    // Resolves from the service's signal, not the timeout.
    tokio::time::timeout(Duration::from_millis(500), sessions.resolve_initial())
        .await
        .unwrap();
    assert_eq!(*sessions.watch_state().borrow(), AuthState::Anonymous);
}
