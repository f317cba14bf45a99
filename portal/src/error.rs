//! Portal error taxonomy.
//!
//! Every failure path returns the caller to an interactive state with an
//! explanation; nothing here is fatal to the process. Transport failures are
//! surfaced, never swallowed, and never retried automatically.

use campus_portal_core::blob::BlobError;
use campus_portal_core::identity::IdentityError;
use campus_portal_core::store::StoreError;
use thiserror::Error;

/// Application-level errors for the campus event portal.
#[derive(Error, Debug)]
pub enum PortalError {
    /// A required form field was missing or malformed. Recovered inline.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Bad credentials, an unknown session, or a role mismatch.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A boundary-service call failed (document store, identity, blobs).
    #[error("service call failed: {0}")]
    Transport(String),

    /// An image transfer failed. Aborts the enclosing create or edit
    /// entirely — no partially-imaged event document is ever written.
    #[error("image upload failed: {0}")]
    Upload(String),

    /// The addressed entity does not exist.
    #[error("{0} not found")]
    NotFound(String),
}

impl From<StoreError> for PortalError {
    fn from(err: StoreError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<IdentityError> for PortalError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials | IdentityError::EmailInUse(_) => {
                Self::Auth(err.to_string())
            }
            IdentityError::Transport(message) => Self::Transport(message),
        }
    }
}

impl From<BlobError> for PortalError {
    fn from(err: BlobError) -> Self {
        Self::Upload(err.to_string())
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transport(format!("document decode failed: {err}"))
    }
}
