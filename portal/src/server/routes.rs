//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{auth, events, profile, registrations, ws};
use axum::{
    routing::{delete, get, post, put},
    Router,
};

/// Build the complete Axum router.
///
/// - Health checks (no authentication)
/// - Authentication endpoints
/// - Event browsing, management, and calendar
/// - Registration, live counts, and roster export
/// - Profile and student list
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Authentication
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session))
        // Events
        .route("/events", get(events::list_events))
        .route("/events", post(events::create_event))
        .route("/events/next", get(events::next_event))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id", put(events::update_event))
        .route("/events/:id", delete(events::delete_event))
        .route("/calendar/:date", get(events::events_on_day))
        // Registrations
        .route("/events/:id/registrations", post(registrations::register))
        .route("/events/:id/registrations", delete(registrations::unregister))
        .route(
            "/events/:id/registrations",
            get(registrations::list_registrations),
        )
        .route(
            "/events/:id/registrations/me",
            get(registrations::my_registration),
        )
        .route("/events/:id/roster", get(registrations::download_roster))
        // Live registration counts
        .route("/ws/events/:id/registrations", get(ws::registration_counts))
        // Profiles
        .route("/profile", get(profile::get_profile))
        .route("/profile", put(profile::update_profile))
        .route("/students", get(profile::list_students));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .with_state(state)
}
