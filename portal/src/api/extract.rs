//! Authentication extractors.
//!
//! Axum extractors for:
//! - Bearer token extraction from the Authorization header
//! - Session validation ([`SessionUser`])
//! - Role-based access control ([`RequireCoordinator`])
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn register(
//!     session: SessionUser,
//! ) -> Result<Json<RegistrationStatus>, AppError> {
//!     // session.0.registrant is guaranteed valid
//! }
//!
//! async fn create_event(
//!     coordinator: RequireCoordinator,
//! ) -> Result<Json<EventResponse>, AppError> {
//!     // coordinator.0.role is guaranteed Coordinator
//! }
//! ```

use crate::api::error::AppError;
use crate::policy;
use crate::server::state::AppState;
use crate::session::{AuthSession, SessionToken};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Bearer token extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub SessionToken);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let raw = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
        })?;
        if raw.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        let token = SessionToken::parse(raw)
            .map_err(|_| AppError::unauthorized("Invalid session token format"))?;
        Ok(Self(token))
    }
}

/// Authenticated session user.
///
/// Validates the bearer token against the session provider. Use as a handler
/// parameter to require authentication.
#[derive(Debug, Clone)]
pub struct SessionUser(pub AuthSession);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let session = state
            .sessions
            .validate(token)
            .ok_or_else(|| AppError::unauthorized("Session expired or unknown"))?;
        Ok(Self(session))
    }
}

/// Require the coordinator role.
///
/// Returns 403 Forbidden for authenticated plain users; the role decision
/// itself is delegated to the central policy function.
#[derive(Debug, Clone)]
pub struct RequireCoordinator(pub AuthSession);

#[async_trait]
impl FromRequestParts<AppState> for RequireCoordinator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionUser(session) = SessionUser::from_request_parts(parts, state).await?;
        if !policy::can_manage_events(session.role) {
            return Err(AppError::forbidden(
                "You don't have permission to manage events",
            ));
        }
        Ok(Self(session))
    }
}
