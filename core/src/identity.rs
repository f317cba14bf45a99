//! Identity service trait.
//!
//! Authentication boundary: account creation, credential sign-in, sign-out,
//! and a push-driven view of the current identity. The portal never stores
//! credentials itself.

use crate::BoxFuture;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

/// Errors from the identity boundary.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Credentials were wrong or the account does not exist.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account already exists for the email.
    #[error("an account already exists for {0}")]
    EmailInUse(String),

    /// The backing service could not be reached.
    #[error("identity transport error: {0}")]
    Transport(String),
}

/// An authenticated identity as reported by the identity service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Stable identifier assigned by the identity service.
    pub uid: Uuid,
    /// Email the account was created with.
    pub email: String,
}

/// Current authentication state pushed by the identity service.
///
/// `Unresolved` is the service's state before it has determined whether a
/// persisted session exists; consumers bound the time they wait for it to
/// resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthSignal {
    /// The service has not yet reported an initial state.
    Unresolved,
    /// No identity is signed in.
    SignedOut,
    /// This identity is signed in.
    SignedIn(Identity),
}

/// Push channel of [`AuthSignal`] changes, latest value wins.
pub type AuthWatch = watch::Receiver<AuthSignal>;

/// Hosted authentication service abstraction.
pub trait IdentityService: Send + Sync {
    /// Creates an account and returns its identity.
    ///
    /// # Errors
    ///
    /// - `EmailInUse`: an account already exists for this email
    /// - `Transport`: the backing service call failed
    fn sign_up(
        &self,
        email: String,
        password: String,
    ) -> BoxFuture<'_, Result<Identity, IdentityError>>;

    /// Authenticates with email and password.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials`: unknown account or wrong password
    /// - `Transport`: the backing service call failed
    fn sign_in(
        &self,
        email: String,
        password: String,
    ) -> BoxFuture<'_, Result<Identity, IdentityError>>;

    /// Signs the current identity out.
    ///
    /// # Errors
    ///
    /// - `Transport`: the backing service call failed
    fn sign_out(&self) -> BoxFuture<'_, Result<(), IdentityError>>;

    /// A watch over the current authentication state.
    ///
    /// The watch starts at whatever the service currently knows — possibly
    /// [`AuthSignal::Unresolved`] while a persisted session is being checked.
    fn watch_auth(&self) -> AuthWatch;
}
