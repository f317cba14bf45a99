//! Profile API endpoints.
//!
//! - GET /api/profile — the calling user's profile plus their events:
//!   registered events for users, created events for coordinators
//! - PUT /api/profile — update demographic fields (the role never changes)
//! - GET /api/students — every plain-user profile (coordinator)

use crate::api::error::AppError;
use crate::api::events::EventResponse;
use crate::api::extract::{RequireCoordinator, SessionUser};
use crate::policy;
use crate::server::state::AppState;
use crate::session::SignupProfile;
use crate::types::{Role, UserProfile};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

/// The calling user's profile view.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Account email.
    pub email: String,
    /// Account role.
    pub role: Role,
    /// Stored profile document, when one exists.
    pub profile: Option<UserProfile>,
    /// Events the user is registered for (plain users).
    pub registered_events: Vec<EventResponse>,
    /// Events the user created (coordinators).
    pub created_events: Vec<EventResponse>,
}

/// Request to update demographic profile fields.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
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

/// The calling user's profile, with the role-appropriate event list.
pub async fn get_profile(
    SessionUser(session): SessionUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.sessions.load_profile(session.registrant).await?;

    let mut registered_events = Vec::new();
    let mut created_events = Vec::new();
    if policy::can_manage_events(session.role) {
        created_events = state
            .events
            .events_created_by(&session.email)
            .await?
            .into_iter()
            .map(EventResponse::from)
            .collect();
    } else {
        for event_id in state
            .registrations
            .registrations_of(session.registrant)
            .await?
        {
            if let Some(event) = state.events.get_event(&event_id).await? {
                registered_events.push(EventResponse::from(event));
            }
        }
    }

    Ok(Json(ProfileResponse {
        email: session.email,
        role: session.role,
        profile,
        registered_events,
        created_events,
    }))
}

/// Update the calling user's demographic fields. Role is untouched.
pub async fn update_profile(
    SessionUser(session): SessionUser,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .update_profile(
            session.registrant,
            SignupProfile {
                name: request.name,
                unique_id: request.unique_id,
                branch: request.branch,
                year: request.year,
                section: request.section,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Every plain-user profile, for the coordinator's student list.
pub async fn list_students(
    RequireCoordinator(_session): RequireCoordinator,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let students = state.sessions.list_students().await?;
    Ok(Json(students))
}
