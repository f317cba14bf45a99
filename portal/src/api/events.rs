//! Event management API endpoints.
//!
//! - GET    /api/events — list events, soonest first
//! - GET    /api/events/next — the next upcoming event
//! - GET    /api/events/:id — event details
//! - GET    /api/calendar/:date — events on a calendar day
//! - POST   /api/events — create (coordinator)
//! - PUT    /api/events/:id — partial update (coordinator)
//! - DELETE /api/events/:id — delete (coordinator)

use crate::api::error::AppError;
use crate::api::extract::RequireCoordinator;
use crate::events::{CreateEventInput, EventPatch, ImageUpload};
use crate::server::state::AppState;
use crate::types::{Event, EventId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use campus_portal_core::environment::Clock as _;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// An image attached to a create request.
#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    /// Original file name.
    pub filename: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

/// Request to create a new event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Local start, e.g. `2025-09-01T10:00`.
    pub date: String,
    /// Images to upload with the event.
    #[serde(default)]
    pub images: Vec<ImagePayload>,
}

/// Request to update an event. Absent fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    /// Updated title.
    pub title: Option<String>,
    /// Updated description.
    pub description: Option<String>,
    /// Updated local start string.
    pub date: Option<String>,
    /// Replacement image URL list.
    pub image_urls: Option<Vec<String>>,
}

/// Event details response.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event id.
    pub id: String,
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Absolute start timestamp.
    pub date: DateTime<Utc>,
    /// Creator email.
    pub created_by: String,
    /// Image URLs in creation order.
    pub image_urls: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-edit timestamp, if any.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id.to_string(),
            title: event.title,
            description: event.description,
            date: event.starts_at,
            created_by: event.created_by,
            image_urls: event.image_urls,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List all events, ascending by start time. Public.
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.events.list_events().await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

/// The soonest event starting after now. Public.
pub async fn next_event(
    State(state): State<AppState>,
) -> Result<Json<Option<EventResponse>>, AppError> {
    let next = state.events.next_upcoming(state.clock.now()).await?;
    Ok(Json(next.map(EventResponse::from)))
}

/// Event details. Public.
pub async fn get_event(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<EventResponse>, AppError> {
    let event_id = EventId::new(id.clone());
    let event = state
        .events
        .get_event(&event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event", id))?;
    Ok(Json(event.into()))
}

/// Events on a calendar day (`YYYY-MM-DD`). Public.
pub async fn events_on_day(
    Path(date): Path<NaiveDate>,
    State(state): State<AppState>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.events.events_on(date).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

/// Create a new event. The authenticated coordinator becomes the creator.
pub async fn create_event(
    RequireCoordinator(session): RequireCoordinator,
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    let event = state
        .events
        .create_event(CreateEventInput {
            title: request.title,
            description: request.description,
            starts_at_local: request.date,
            created_by: session.email,
            images: request
                .images
                .into_iter()
                .map(|image| ImageUpload {
                    filename: image.filename,
                    bytes: image.bytes,
                })
                .collect(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

/// Partially update an event.
pub async fn update_event(
    RequireCoordinator(_session): RequireCoordinator,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<StatusCode, AppError> {
    state
        .events
        .update_event(
            &EventId::new(id),
            EventPatch {
                title: request.title,
                description: request.description,
                starts_at_local: request.date,
                image_urls: request.image_urls,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete an event. Registrations under it are intentionally left in place.
pub async fn delete_event(
    RequireCoordinator(_session): RequireCoordinator,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.events.delete_event(&EventId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
