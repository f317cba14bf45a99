//! Authentication API endpoints.
//!
//! - POST /api/auth/signup — create an account (role chosen at signup)
//! - POST /api/auth/login — open a session, stating the expected role
//! - POST /api/auth/logout — end the session
//! - GET  /api/auth/session — describe the current session

use crate::api::error::AppError;
use crate::api::extract::{BearerToken, SessionUser};
use crate::server::state::AppState;
use crate::session::SignupProfile;
use crate::types::{RegistrantId, Role};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

/// Request to create an account.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Request the coordinator role.
    #[serde(default)]
    pub coordinator: bool,
    /// Enrollment key required when `coordinator` is set.
    #[serde(default)]
    pub enrollment_key: Option<String>,
    /// Optional demographic details stored on the profile.
    #[serde(flatten)]
    pub details: SignupProfile,
}

/// Response after account creation.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// The new registrant id.
    pub registrant: RegistrantId,
    /// Success message.
    pub message: String,
}

/// Request to open a session.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Role the caller believes they hold; a mismatch is rejected.
    #[serde(default = "default_login_role")]
    pub role: Role,
}

const fn default_login_role() -> Role {
    Role::User
}

/// Response to a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The signed-in registrant.
    pub registrant: RegistrantId,
    /// Account email.
    pub email: String,
    /// Resolved role.
    pub role: Role,
}

/// Description of the current session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The signed-in registrant.
    pub registrant: RegistrantId,
    /// Account email.
    pub email: String,
    /// Resolved role.
    pub role: Role,
}

/// Create an account. Signup does not open a session; log in afterwards.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let registrant = state
        .sessions
        .sign_up(
            &request.email,
            &request.password,
            request.coordinator,
            request.enrollment_key.as_deref(),
            request.details,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            registrant,
            message: "Registration successful! You can log in now.".to_string(),
        }),
    ))
}

/// Open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, session) = state
        .sessions
        .sign_in(&request.email, &request.password, request.role)
        .await?;
    Ok(Json(LoginResponse {
        token: token.to_string(),
        registrant: session.registrant,
        email: session.email,
        role: session.role,
    }))
}

/// End the session behind the presented bearer token.
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, AppError> {
    state.sessions.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Describe the current session.
pub async fn session(SessionUser(session): SessionUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        registrant: session.registrant,
        email: session.email,
        role: session.role,
    })
}
