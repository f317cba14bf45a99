//! In-memory identity service.
//!
//! Dev/test stand-in for the hosted authentication service. Accounts live in
//! a process-local map and are never persisted; real credential storage is
//! the hosted collaborator's job.

use campus_portal_core::identity::{
    AuthSignal, AuthWatch, Identity, IdentityError, IdentityService,
};
use campus_portal_core::BoxFuture;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;
use uuid::Uuid;

struct Account {
    uid: Uuid,
    password: String,
}

/// Email/password accounts with a watchable current-identity signal.
pub struct MemoryIdentity {
    accounts: RwLock<HashMap<String, Account>>,
    auth: watch::Sender<AuthSignal>,
}

impl MemoryIdentity {
    /// Creates an identity service with no accounts and no signed-in user.
    ///
    /// Unlike the hosted service, the in-memory one has no persisted session
    /// to check, so the auth signal starts already resolved to signed-out.
    #[must_use]
    pub fn new() -> Self {
        let (auth, _) = watch::channel(AuthSignal::SignedOut);
        Self {
            accounts: RwLock::new(HashMap::new()),
            auth,
        }
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityService for MemoryIdentity {
    fn sign_up(
        &self,
        email: String,
        password: String,
    ) -> BoxFuture<'_, Result<Identity, IdentityError>> {
        Box::pin(async move {
            let mut accounts = self
                .accounts
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if accounts.contains_key(&email) {
                return Err(IdentityError::EmailInUse(email));
            }
            let uid = Uuid::new_v4();
            accounts.insert(email.clone(), Account { uid, password });
            let identity = Identity { uid, email };
            let _ = self.auth.send(AuthSignal::SignedIn(identity.clone()));
            Ok(identity)
        })
    }

    fn sign_in(
        &self,
        email: String,
        password: String,
    ) -> BoxFuture<'_, Result<Identity, IdentityError>> {
        Box::pin(async move {
            let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
            let account = accounts
                .get(&email)
                .filter(|account| account.password == password)
                .ok_or(IdentityError::InvalidCredentials)?;
            let identity = Identity {
                uid: account.uid,
                email,
            };
            let _ = self.auth.send(AuthSignal::SignedIn(identity.clone()));
            Ok(identity)
        })
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), IdentityError>> {
        Box::pin(async move {
            let _ = self.auth.send(AuthSignal::SignedOut);
            Ok(())
        })
    }

    fn watch_auth(&self) -> AuthWatch {
        self.auth.subscribe()
    }
}
