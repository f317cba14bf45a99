//! Collection addresses used by the portal.

use crate::types::EventId;
use campus_portal_core::document::CollectionPath;

/// The root `events` collection.
pub(crate) fn events() -> CollectionPath {
    CollectionPath::root("events")
}

/// The `registrations` sub-collection of one event.
pub(crate) fn registrations(event: &EventId) -> CollectionPath {
    events().subcollection(event.as_str(), "registrations")
}

/// The root `users` profile collection.
pub(crate) fn users() -> CollectionPath {
    CollectionPath::root("users")
}
