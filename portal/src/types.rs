//! Domain types for the campus event portal.
//!
//! Value objects and entities shared across the repositories, the
//! registration subsystem, and the HTTP surface. Serialized field names
//! match the document layout the portal has always stored (`date`,
//! `createdBy`, `imageUrls`, …), so the in-memory store and a hosted
//! backend read the same documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
///
/// Event keys are assigned by the document store; the string form is the
/// store key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    /// Wraps a store-assigned key.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// The underlying store key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a registrant (the identity service's uid).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrantId(Uuid);

impl RegistrantId {
    /// Wraps an identity-service uid.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The string form used as a document key.
    #[must_use]
    pub fn key(&self) -> String {
        self.0.simple().to_string()
    }
}

impl fmt::Display for RegistrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Roles
// ============================================================================

/// Account role. Closed set; there is no UI or API path that mutates a role
/// after signup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular attendee: browses and registers.
    User,
    /// Event coordinator: creates, edits, deletes events and exports rosters.
    Coordinator,
}

impl Role {
    /// The stored string form (`"user"` / `"coordinator"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Coordinator => "coordinator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A scheduled campus event.
///
/// Title, description, and start time are always present once the event has
/// been created; the image list may be empty and preserves upload order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier.
    #[serde(skip)]
    pub id: EventId,
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Absolute start timestamp.
    #[serde(rename = "date")]
    pub starts_at: DateTime<Utc>,
    /// Email of the coordinator who created the event.
    #[serde(rename = "createdBy")]
    pub created_by: String,
    /// Public URLs of uploaded images, in creation order.
    #[serde(rename = "imageUrls", default)]
    pub image_urls: Vec<String>,
    /// When the event document was written.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// When the event was last edited, if ever.
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Whether this event starts strictly after `now`.
    #[must_use]
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.starts_at > now
    }
}

/// One registrant's registration for one event.
///
/// The registrant id doubles as the document key inside the event's
/// registration sub-collection, so there can never be two registrations for
/// the same `(event, registrant)` pair — re-registering overwrites.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// Who registered.
    #[serde(rename = "userId")]
    pub registrant: RegistrantId,
    /// Registrant email at registration time.
    pub email: String,
    /// When the registration was written.
    #[serde(rename = "timestamp")]
    pub registered_at: DateTime<Utc>,
}

/// Stored account profile.
///
/// Absence of a profile document is treated as role [`Role::User`]
/// everywhere a role is derived.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account email.
    pub email: String,
    /// Account role, fixed at signup.
    pub role: Role,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Institution-assigned identifier.
    #[serde(rename = "uniqueId", skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    /// Branch of study.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Year of study.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Class section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl UserProfile {
    /// A bare profile carrying only email and role.
    #[must_use]
    pub const fn bare(email: String, role: Role) -> Self {
        Self {
            email,
            role,
            name: None,
            unique_id: None,
            branch: None,
            year: None,
            section: None,
        }
    }
}

/// A registration joined with its registrant's profile.
///
/// `profile` is `None` when the registrant has no profile document; consumers
/// fall back to the bare registration fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attendee {
    /// The underlying registration.
    pub registration: Registration,
    /// The registrant's profile, when one exists.
    pub profile: Option<UserProfile>,
}

impl Attendee {
    /// Best-known email: the profile's when present, otherwise the one
    /// captured at registration time.
    #[must_use]
    pub fn email(&self) -> &str {
        self.profile
            .as_ref()
            .map_or(self.registration.email.as_str(), |p| p.email.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_to_lowercase_strings() {
        assert_eq!(serde_json::json!(Role::User), serde_json::json!("user"));
        assert_eq!(
            serde_json::json!(Role::Coordinator),
            serde_json::json!("coordinator")
        );
    }

    #[test]
    fn event_round_trips_through_store_field_names() {
        let event = Event {
            id: EventId::new("e1".into()),
            title: "Orientation".into(),
            description: "Welcome week".into(),
            starts_at: "2025-09-01T10:00:00Z".parse().unwrap(),
            created_by: "coord@campus.edu".into(),
            image_urls: vec!["memstore://event_images/a.png".into()],
            created_at: "2025-08-01T00:00:00Z".parse().unwrap(),
            updated_at: None,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("date").is_some());
        assert!(value.get("createdBy").is_some());
        assert!(value.get("imageUrls").is_some());
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn attendee_email_prefers_profile() {
        let registration = Registration {
            registrant: RegistrantId::from_uuid(Uuid::nil()),
            email: "old@campus.edu".into(),
            registered_at: Utc::now(),
        };
        let mut attendee = Attendee {
            registration,
            profile: None,
        };
        assert_eq!(attendee.email(), "old@campus.edu");

        attendee.profile = Some(UserProfile::bare("new@campus.edu".into(), Role::User));
        assert_eq!(attendee.email(), "new@campus.edu");
    }
}
