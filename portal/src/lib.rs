//! Campus Event Portal
//!
//! A campus event portal service: users browse events and register or
//! unregister; coordinators create, edit, and delete events and export
//! registration rosters. Persistence, authentication, and file storage are
//! delegated to boundary collaborators (see `campus-portal-core`); this
//! crate holds the domain logic and the HTTP/WebSocket surface.
//!
//! # Architecture
//!
//! ```text
//!                 ┌───────────────────────────────┐
//!                 │        HTTP / WebSocket        │
//!                 │  (axum handlers + extractors)  │
//!                 └──────┬─────────┬──────────┬────┘
//!                        │         │          │
//!              ┌─────────▼──┐ ┌────▼──────┐ ┌─▼──────────────┐
//!              │  Session   │ │   Event   │ │  Registration  │
//!              │  Provider  │ │ Repository│ │   Subsystem    │
//!              └─────┬──────┘ └────┬──────┘ └─┬──────────────┘
//!                    │             │          │   live count
//!                    │             │          │   subscriptions
//!              ┌─────▼─────────────▼──────────▼────┐
//!              │   Boundary collaborators (traits)  │
//!              │  document store · identity · blobs │
//!              └────────────────────────────────────┘
//! ```
//!
//! # The consistency model
//!
//! Registrations are keyed by the registrant's identity inside each event's
//! registration sub-collection. Deterministic keying makes registration
//! idempotent without locking; live counts are derived from collection
//! cardinality and pushed to subscribers on every change, so concurrent
//! viewers converge on the settled count without polling.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod policy;
pub mod registration;
pub mod roster;
pub mod server;
pub mod session;
pub mod types;

mod collections;

pub use config::Config;
pub use error::PortalError;
pub use events::{CreateEventInput, EventPatch, EventRepository, ImageUpload};
pub use registration::{CountWatch, RegistrationService};
pub use roster::{export_roster, RosterFile};
pub use server::{build_router, AppState};
pub use session::{AuthSession, AuthState, SessionProvider, SessionToken, SignupProfile};
pub use types::{Attendee, Event, EventId, Registration, RegistrantId, Role, UserProfile};
