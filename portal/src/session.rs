//! Session provider.
//!
//! One instance is created at application start and injected everywhere a
//! current identity or role is needed — there is no ambient global lookup.
//! It owns three things:
//!
//! - the portal's view of the identity service's current-auth signal,
//!   exposed as a [`AuthState`] watch for navigation policy
//! - the signup/login/logout flows, including role assignment and the
//!   login-time role check
//! - opaque session tokens for the HTTP surface
//!
//! The initial auth resolution is raced against a configured timeout: if the
//! identity service never reports, the state resolves to anonymous with a
//! diagnostic instead of hanging. That bound is the portal's one explicit
//! liveness guarantee.

use crate::collections;
use crate::config::AuthConfig;
use crate::error::PortalError;
use crate::types::{RegistrantId, Role, UserProfile};
use campus_portal_core::identity::{AuthSignal, IdentityService};
use campus_portal_core::store::DocumentStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Current authentication state as seen by the view layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    /// Initial session resolution is still in flight.
    Loading,
    /// Nobody is signed in.
    Anonymous,
    /// A user is signed in with a resolved role.
    Authenticated {
        /// The signed-in registrant.
        registrant: RegistrantId,
        /// Their account email.
        email: String,
        /// Their resolved role.
        role: Role,
    },
}

/// A validated session: who is calling and as what role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    /// The authenticated registrant.
    pub registrant: RegistrantId,
    /// Account email.
    pub email: String,
    /// Resolved role.
    pub role: Role,
}

/// Opaque bearer token identifying a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(Uuid);

impl SessionToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a token from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Auth`] when the string is not a valid token.
    pub fn parse(raw: &str) -> Result<Self, PortalError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| PortalError::Auth("malformed session token".into()))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Details a signup provides beyond credentials.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SignupProfile {
    /// Display name.
    pub name: Option<String>,
    /// Institution-assigned identifier.
    pub unique_id: Option<String>,
    /// Branch of study.
    pub branch: Option<String>,
    /// Year of study.
    pub year: Option<String>,
    /// Class section.
    pub section: Option<String>,
}

/// Session provider backed by the identity service and the profile store.
pub struct SessionProvider {
    identity: Arc<dyn IdentityService>,
    store: Arc<dyn DocumentStore>,
    state: watch::Sender<AuthState>,
    sessions: RwLock<HashMap<SessionToken, AuthSession>>,
    resolve_timeout: Duration,
    coordinator_enrollment_key: String,
}

impl SessionProvider {
    /// Creates the provider in the [`AuthState::Loading`] state.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        store: Arc<dyn DocumentStore>,
        auth: &AuthConfig,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            identity,
            store,
            state,
            sessions: RwLock::new(HashMap::new()),
            resolve_timeout: Duration::from_secs(auth.session_resolve_timeout),
            coordinator_enrollment_key: auth.coordinator_enrollment_key.clone(),
        }
    }

    /// A watch over the current [`AuthState`].
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Waits for the identity service's first resolved auth signal and
    /// publishes the corresponding [`AuthState`].
    ///
    /// If no signal arrives within the configured bound, the state resolves
    /// to [`AuthState::Anonymous`] and a diagnostic is logged — the loading
    /// state never hangs indefinitely.
    pub async fn resolve_initial(&self) {
        let mut auth_watch = self.identity.watch_auth();
        let resolved = tokio::time::timeout(self.resolve_timeout, async {
            loop {
                let signal = auth_watch.borrow_and_update().clone();
                if signal != AuthSignal::Unresolved {
                    return signal;
                }
                if auth_watch.changed().await.is_err() {
                    return AuthSignal::SignedOut;
                }
            }
        })
        .await;

        let next = match resolved {
            Ok(AuthSignal::SignedIn(identity)) => {
                let registrant = RegistrantId::from_uuid(identity.uid);
                AuthState::Authenticated {
                    registrant,
                    email: identity.email,
                    role: self.role_of(registrant).await,
                }
            }
            Ok(AuthSignal::SignedOut | AuthSignal::Unresolved) => AuthState::Anonymous,
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.resolve_timeout.as_secs(),
                    "auth resolution timed out - treating session as anonymous; \
                     check connectivity to the identity service"
                );
                AuthState::Anonymous
            }
        };
        let _ = self.state.send(next);
    }

    /// Creates an account and its profile document.
    ///
    /// The coordinator role is granted only when the request carries the
    /// configured enrollment key; a coordinator request with a missing or
    /// wrong key is rejected rather than silently downgraded.
    ///
    /// Signup does not start a session — the caller signs in afterwards.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Validation`]: blank email or password
    /// - [`PortalError::Auth`]: email already in use, or bad enrollment key
    /// - [`PortalError::Transport`]: identity or store call failed
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        coordinator: bool,
        enrollment_key: Option<&str>,
        details: SignupProfile,
    ) -> Result<RegistrantId, PortalError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(PortalError::Validation(
                "email and password are required".into(),
            ));
        }
        let role = if coordinator {
            if enrollment_key != Some(self.coordinator_enrollment_key.as_str()) {
                return Err(PortalError::Auth("invalid coordinator enrollment key".into()));
            }
            Role::Coordinator
        } else {
            Role::User
        };

        let identity = self
            .identity
            .sign_up(email.to_string(), password.to_string())
            .await?;
        let registrant = RegistrantId::from_uuid(identity.uid);

        let profile = UserProfile {
            email: identity.email,
            role,
            name: details.name,
            unique_id: details.unique_id,
            branch: details.branch,
            year: details.year,
            section: details.section,
        };
        self.store
            .put(
                collections::users(),
                registrant.key(),
                serde_json::to_value(&profile)?,
            )
            .await?;

        tracing::info!(%registrant, %role, "account created");
        Ok(registrant)
    }

    /// Authenticates and opens a session.
    ///
    /// The caller states which role they are signing in as; a mismatch with
    /// the stored role is rejected so a user cannot reach coordinator
    /// screens by picking the wrong door.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Auth`]: bad credentials, missing account record, or
    ///   role mismatch
    /// - [`PortalError::Transport`]: identity or store call failed
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        expected_role: Role,
    ) -> Result<(SessionToken, AuthSession), PortalError> {
        let identity = self
            .identity
            .sign_in(email.to_string(), password.to_string())
            .await?;
        let registrant = RegistrantId::from_uuid(identity.uid);

        let Some(profile) = self.load_profile(registrant).await? else {
            return Err(PortalError::Auth("user record not found".into()));
        };
        if profile.role != expected_role {
            return Err(PortalError::Auth(format!(
                "this account is registered as a {}; select the correct role",
                profile.role
            )));
        }

        let session = AuthSession {
            registrant,
            email: identity.email.clone(),
            role: profile.role,
        };
        let token = SessionToken::new();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token, session.clone());
        let _ = self.state.send(AuthState::Authenticated {
            registrant,
            email: identity.email,
            role: profile.role,
        });

        tracing::info!(%registrant, role = %session.role, "signed in");
        Ok((token, session))
    }

    /// Looks up the session for a bearer token.
    #[must_use]
    pub fn validate(&self, token: SessionToken) -> Option<AuthSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&token)
            .cloned()
    }

    /// Ends a session and signs the identity out.
    ///
    /// Unknown tokens are a no-op: logout must always leave the caller
    /// signed out.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the identity service call failed
    pub async fn sign_out(&self, token: SessionToken) -> Result<(), PortalError> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&token);
        self.identity.sign_out().await?;
        let _ = self.state.send(AuthState::Anonymous);
        Ok(())
    }

    /// Reads a registrant's profile document.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed or the document
    ///   did not decode
    pub async fn load_profile(
        &self,
        registrant: RegistrantId,
    ) -> Result<Option<UserProfile>, PortalError> {
        let doc = self
            .store
            .get(collections::users(), registrant.key())
            .await?;
        doc.map(|d| serde_json::from_value(d.data).map_err(PortalError::from))
            .transpose()
    }

    /// Merges the provided demographic fields into the registrant's profile
    /// document. The role field is never part of the merge — roles are fixed
    /// at signup. Absent fields are left untouched; updating a registrant
    /// with no profile document is a store-level no-op.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed
    pub async fn update_profile(
        &self,
        registrant: RegistrantId,
        details: SignupProfile,
    ) -> Result<(), PortalError> {
        let mut fields = serde_json::Map::new();
        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                fields.insert(key.to_string(), serde_json::Value::String(value));
            }
        };
        set("name", details.name);
        set("uniqueId", details.unique_id);
        set("branch", details.branch);
        set("year", details.year);
        set("section", details.section);
        if fields.is_empty() {
            return Ok(());
        }
        self.store
            .update(collections::users(), registrant.key(), fields)
            .await?;
        Ok(())
    }

    /// All profiles with the plain user role, for the coordinator's student
    /// list.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed or a profile did
    ///   not decode
    pub async fn list_students(&self) -> Result<Vec<UserProfile>, PortalError> {
        let docs = self
            .store
            .list(
                collections::users(),
                Some(campus_portal_core::document::FieldFilter::equals(
                    "role",
                    Role::User.as_str(),
                )),
                None,
            )
            .await?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc.data).map_err(PortalError::from))
            .collect()
    }

    /// Resolves a registrant's role: missing profile reads as [`Role::User`],
    /// and a failed lookup degrades to [`Role::User`] with a logged error so
    /// the auth state never wedges on a flaky profile read.
    pub async fn role_of(&self, registrant: RegistrantId) -> Role {
        match self.load_profile(registrant).await {
            Ok(Some(profile)) => profile.role,
            Ok(None) => Role::User,
            Err(err) => {
                tracing::error!(%registrant, error = %err, "profile lookup failed; defaulting role");
                Role::User
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campus_portal_memstore::{MemoryDocumentStore, MemoryIdentity};

    fn provider() -> SessionProvider {
        let auth = AuthConfig {
            session_resolve_timeout: 1,
            coordinator_enrollment_key: "super-secret".into(),
        };
        SessionProvider::new(
            Arc::new(MemoryIdentity::new()),
            Arc::new(MemoryDocumentStore::new()),
            &auth,
        )
    }

    #[tokio::test]
    async fn signup_without_enrollment_key_cannot_become_coordinator() {
        let sessions = provider();
        let err = sessions
            .sign_up("c@campus.edu", "pw", true, Some("guess"), SignupProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Auth(_)));
    }

    #[tokio::test]
    async fn login_rejects_role_mismatch() {
        let sessions = provider();
        sessions
            .sign_up("u@campus.edu", "pw", false, None, SignupProfile::default())
            .await
            .unwrap();

        let err = sessions
            .sign_in("u@campus.edu", "pw", Role::Coordinator)
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Auth(_)));

        let (_, session) = sessions.sign_in("u@campus.edu", "pw", Role::User).await.unwrap();
        assert_eq!(session.role, Role::User);
    }

    #[tokio::test]
    async fn tokens_validate_until_sign_out() {
        let sessions = provider();
        sessions
            .sign_up("u@campus.edu", "pw", false, None, SignupProfile::default())
            .await
            .unwrap();
        let (token, session) = sessions.sign_in("u@campus.edu", "pw", Role::User).await.unwrap();

        assert_eq!(sessions.validate(token), Some(session));
        sessions.sign_out(token).await.unwrap();
        assert_eq!(sessions.validate(token), None);
    }

    #[tokio::test]
    async fn profile_update_never_touches_the_role() {
        let sessions = provider();
        let registrant = sessions
            .sign_up(
                "c@campus.edu",
                "pw",
                true,
                Some("super-secret"),
                SignupProfile::default(),
            )
            .await
            .unwrap();

        sessions
            .update_profile(
                registrant,
                SignupProfile {
                    name: Some("Coordinator C".into()),
                    ..SignupProfile::default()
                },
            )
            .await
            .unwrap();

        let profile = sessions.load_profile(registrant).await.unwrap().unwrap();
        assert_eq!(profile.name.as_deref(), Some("Coordinator C"));
        assert_eq!(profile.role, Role::Coordinator);
    }

    #[tokio::test]
    async fn student_list_excludes_coordinators() {
        let sessions = provider();
        sessions
            .sign_up("u@campus.edu", "pw", false, None, SignupProfile::default())
            .await
            .unwrap();
        sessions
            .sign_up(
                "c@campus.edu",
                "pw",
                true,
                Some("super-secret"),
                SignupProfile::default(),
            )
            .await
            .unwrap();

        let students = sessions.list_students().await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].email, "u@campus.edu");
    }

    #[tokio::test]
    async fn missing_profile_reads_as_user_role() {
        let sessions = provider();
        let ghost = RegistrantId::from_uuid(Uuid::new_v4());
        assert_eq!(sessions.role_of(ghost).await, Role::User);
    }
}
