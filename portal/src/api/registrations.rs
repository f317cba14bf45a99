//! Registration API endpoints.
//!
//! - POST   /api/events/:id/registrations — register the calling user
//! - DELETE /api/events/:id/registrations?confirm=true — unregister
//! - GET    /api/events/:id/registrations/me — own registration state
//! - GET    /api/events/:id/registrations — profile-joined list (coordinator)
//! - GET    /api/events/:id/roster — roster workbook download (coordinator)

use crate::api::error::AppError;
use crate::api::extract::{RequireCoordinator, SessionUser};
use crate::roster;
use crate::server::state::AppState;
use crate::types::{Attendee, EventId};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// The calling user's registration state for one event.
#[derive(Debug, Serialize)]
pub struct RegistrationStatus {
    /// Event in question.
    pub event_id: String,
    /// Whether the caller currently holds a registration.
    pub registered: bool,
}

/// One profile-joined roster row.
#[derive(Debug, Serialize)]
pub struct AttendeeResponse {
    /// Registrant id.
    pub registrant: String,
    /// Best-known email.
    pub email: String,
    /// Display name, when a profile exists.
    pub name: Option<String>,
    /// Institution-assigned identifier, when a profile exists.
    pub unique_id: Option<String>,
    /// Branch, when a profile exists.
    pub branch: Option<String>,
    /// Year, when a profile exists.
    pub year: Option<String>,
    /// Section, when a profile exists.
    pub section: Option<String>,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
}

impl From<Attendee> for AttendeeResponse {
    fn from(attendee: Attendee) -> Self {
        let email = attendee.email().to_string();
        let profile = attendee.profile;
        Self {
            registrant: attendee.registration.registrant.to_string(),
            email,
            name: profile.as_ref().and_then(|p| p.name.clone()),
            unique_id: profile.as_ref().and_then(|p| p.unique_id.clone()),
            branch: profile.as_ref().and_then(|p| p.branch.clone()),
            year: profile.as_ref().and_then(|p| p.year.clone()),
            section: profile.as_ref().and_then(|p| p.section.clone()),
            registered_at: attendee.registration.registered_at,
        }
    }
}

/// Query parameters for unregistering.
#[derive(Debug, Deserialize)]
pub struct UnregisterQuery {
    /// Must be `true`; unregistering is irreversible from the user's point
    /// of view, so the client asks for explicit confirmation first.
    #[serde(default)]
    pub confirm: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register the calling user for an event. Idempotent: registering twice
/// leaves a single registration.
pub async fn register(
    SessionUser(session): SessionUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RegistrationStatus>), AppError> {
    let event = EventId::new(id.clone());
    state
        .registrations
        .register(&event, session.registrant, &session.email)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegistrationStatus {
            event_id: id,
            registered: true,
        }),
    ))
}

/// Unregister the calling user. Requires `?confirm=true`; removing an absent
/// registration is a no-op.
pub async fn unregister(
    SessionUser(session): SessionUser,
    Path(id): Path<String>,
    Query(query): Query<UnregisterQuery>,
    State(state): State<AppState>,
) -> Result<Json<RegistrationStatus>, AppError> {
    if !query.confirm {
        return Err(AppError::bad_request(
            "Unregistering needs explicit confirmation: pass confirm=true",
        ));
    }
    let event = EventId::new(id.clone());
    state
        .registrations
        .unregister(&event, session.registrant)
        .await?;
    Ok(Json(RegistrationStatus {
        event_id: id,
        registered: false,
    }))
}

/// The calling user's registration state for an event.
pub async fn my_registration(
    SessionUser(session): SessionUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RegistrationStatus>, AppError> {
    let event = EventId::new(id.clone());
    let registered = state
        .registrations
        .is_registered(&event, session.registrant)
        .await?;
    Ok(Json(RegistrationStatus {
        event_id: id,
        registered,
    }))
}

/// Profile-joined registration list for an event.
pub async fn list_registrations(
    RequireCoordinator(_session): RequireCoordinator,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttendeeResponse>>, AppError> {
    let event = EventId::new(id);
    let attendees = state.registrations.list_with_profiles(&event).await?;
    Ok(Json(
        attendees.into_iter().map(AttendeeResponse::from).collect(),
    ))
}

/// Download the roster workbook for an event.
///
/// Responds 404 with an explanatory body when the event has no
/// registrations — no file is produced for an empty roster.
pub async fn download_roster(
    RequireCoordinator(_session): RequireCoordinator,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let event_id = EventId::new(id.clone());
    let event = state
        .events
        .get_event(&event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event", id))?;

    let Some(file) = roster::export_roster(&state.registrations, &event_id, &event.title).await?
    else {
        return Err(AppError::new(
            StatusCode::NOT_FOUND,
            "No registrations to export yet".to_string(),
            "EMPTY_ROSTER".to_string(),
        ));
    };

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.bytes,
    )
        .into_response())
}
