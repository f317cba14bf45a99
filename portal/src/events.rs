//! Event repository.
//!
//! Typed CRUD over the `events` collection. Owns the event entity shape and
//! the normalization of user-supplied local date/time strings into absolute
//! timestamps.

use crate::collections;
use crate::error::PortalError;
use crate::types::{Event, EventId};
use campus_portal_core::blob::BlobStore;
use campus_portal_core::document::{Document, FieldFilter, OrderBy};
use campus_portal_core::environment::Clock;
use campus_portal_core::store::DocumentStore;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

/// An image attached to a create or edit, before upload.
#[derive(Clone, Debug)]
pub struct ImageUpload {
    /// Original file name; used to derive the storage path.
    pub filename: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

/// Everything needed to create an event.
#[derive(Clone, Debug)]
pub struct CreateEventInput {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// User-supplied local start, e.g. `2025-09-01T10:00`.
    pub starts_at_local: String,
    /// Creator's email.
    pub created_by: String,
    /// Images to upload before the event document is written. May be empty.
    pub images: Vec<ImageUpload>,
}

/// Partial update for an event; absent fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct EventPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New local start string.
    pub starts_at_local: Option<String>,
    /// Replacement image URL list (already-uploaded URLs, creation order).
    pub image_urls: Option<Vec<String>>,
}

impl EventPatch {
    /// Whether the patch changes anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.starts_at_local.is_none()
            && self.image_urls.is_none()
    }
}

/// CRUD over event documents.
pub struct EventRepository {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    image_prefix: String,
}

impl EventRepository {
    /// Creates a repository over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        image_prefix: String,
    ) -> Self {
        Self {
            store,
            blobs,
            clock,
            image_prefix,
        }
    }

    /// All events, ascending by start timestamp.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed or a document did
    ///   not decode
    pub async fn list_events(&self) -> Result<Vec<Event>, PortalError> {
        let docs = self
            .store
            .list(collections::events(), None, Some(OrderBy::ascending("date")))
            .await?;
        docs.into_iter().map(decode_event).collect()
    }

    /// One event by id.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed or the document
    ///   did not decode
    pub async fn get_event(&self, id: &EventId) -> Result<Option<Event>, PortalError> {
        let doc = self
            .store
            .get(collections::events(), id.as_str().to_string())
            .await?;
        doc.map(decode_event).transpose()
    }

    /// The soonest event starting strictly after `now`, if any.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed
    pub async fn next_upcoming(&self, now: DateTime<Utc>) -> Result<Option<Event>, PortalError> {
        let events = self.list_events().await?;
        Ok(events.into_iter().find(|event| event.is_upcoming(now)))
    }

    /// Events starting on the given calendar day (UTC), ascending.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed
    pub async fn events_on(&self, day: NaiveDate) -> Result<Vec<Event>, PortalError> {
        let mut events = self.list_events().await?;
        events.retain(|event| event.starts_at.date_naive() == day);
        Ok(events)
    }

    /// Events created by the given coordinator email, ascending by start.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed or a document did
    ///   not decode
    pub async fn events_created_by(&self, email: &str) -> Result<Vec<Event>, PortalError> {
        let docs = self
            .store
            .list(
                collections::events(),
                Some(FieldFilter::equals("createdBy", email)),
                Some(OrderBy::ascending("date")),
            )
            .await?;
        docs.into_iter().map(decode_event).collect()
    }

    /// Creates an event.
    ///
    /// Images are uploaded first, in order; any single failure aborts the
    /// whole create before the event document is written, so no event ever
    /// persists claiming images it does not have. An event with zero images
    /// is fine — the asymmetry (one bad image kills an otherwise valid
    /// create) is intentional.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Validation`]: a required field is blank or the start
    ///   string does not parse
    /// - [`PortalError::Upload`]: an image transfer failed
    /// - [`PortalError::Transport`]: the store call failed
    pub async fn create_event(&self, input: CreateEventInput) -> Result<Event, PortalError> {
        let blank: Vec<&str> = [
            ("title", input.title.trim()),
            ("description", input.description.trim()),
            ("date", input.starts_at_local.trim()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.is_empty().then_some(name))
        .collect();
        if !blank.is_empty() {
            return Err(PortalError::Validation(format!(
                "fill in all fields: {} missing",
                blank.join(", ")
            )));
        }
        let starts_at = parse_local_start(&input.starts_at_local)?;

        let image_urls = self.upload_images(input.images).await?;

        let now = self.clock.now();
        let event = Event {
            id: EventId::default(),
            title: input.title,
            description: input.description,
            starts_at,
            created_by: input.created_by,
            image_urls,
            created_at: now,
            updated_at: None,
        };
        let id = self
            .store
            .insert(collections::events(), serde_json::to_value(&event)?)
            .await?;

        tracing::info!(event = %id, title = %event.title, "event created");
        Ok(Event {
            id: EventId::new(id),
            ..event
        })
    }

    /// Applies a partial update and stamps `updatedAt`.
    ///
    /// Deliberately does not check that the event still exists: the
    /// store-level update on a missing document is a no-op.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Validation`]: a provided start string does not parse
    /// - [`PortalError::Transport`]: the store call failed
    pub async fn update_event(&self, id: &EventId, patch: EventPatch) -> Result<(), PortalError> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut fields = Map::new();
        if let Some(title) = patch.title {
            fields.insert("title".into(), Value::String(title));
        }
        if let Some(description) = patch.description {
            fields.insert("description".into(), Value::String(description));
        }
        if let Some(local) = patch.starts_at_local {
            let starts_at = parse_local_start(&local)?;
            fields.insert("date".into(), serde_json::to_value(starts_at)?);
        }
        if let Some(urls) = patch.image_urls {
            fields.insert("imageUrls".into(), serde_json::to_value(urls)?);
        }
        fields.insert("updatedAt".into(), serde_json::to_value(self.clock.now())?);

        self.store
            .update(collections::events(), id.as_str().to_string(), fields)
            .await?;
        tracing::info!(event = %id, "event updated");
        Ok(())
    }

    /// Removes the event document.
    ///
    /// The event's registration sub-collection is left in place and remains
    /// addressable by its full path; whether deletion should cascade is an
    /// open product question, so the current behavior is kept and flagged
    /// rather than changed quietly.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed
    pub async fn delete_event(&self, id: &EventId) -> Result<(), PortalError> {
        self.store
            .delete(collections::events(), id.as_str().to_string())
            .await?;
        tracing::info!(event = %id, "event deleted");
        Ok(())
    }

    /// Uploads images in order, resolving each to a public URL. The first
    /// failure aborts the batch.
    async fn upload_images(&self, images: Vec<ImageUpload>) -> Result<Vec<String>, PortalError> {
        let mut urls = Vec::with_capacity(images.len());
        let stamp = self.clock.now().timestamp_millis();
        for image in images {
            let path = format!("{}/{}{stamp}", self.image_prefix, image.filename);
            let handle = self
                .blobs
                .upload(path, image.bytes)
                .await
                .map_err(|err| PortalError::Upload(err.to_string()))?;
            let url = self
                .blobs
                .public_url(&handle)
                .await
                .map_err(|err| PortalError::Upload(err.to_string()))?;
            urls.push(url);
        }
        Ok(urls)
    }
}

/// Decodes a stored document into an [`Event`], keyed by the document id.
fn decode_event(doc: Document) -> Result<Event, PortalError> {
    let mut event: Event = serde_json::from_value(doc.data)?;
    event.id = EventId::new(doc.id);
    Ok(event)
}

/// Normalizes a user-supplied local date/time string into UTC.
///
/// Accepts the browser's `datetime-local` forms (`2025-09-01T10:00`, with
/// optional seconds) and full RFC 3339 timestamps.
fn parse_local_start(raw: &str) -> Result<DateTime<Utc>, PortalError> {
    if let Ok(absolute) = DateTime::parse_from_rfc3339(raw) {
        return Ok(absolute.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(PortalError::Validation(format!(
        "unrecognized date/time: {raw}"
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campus_portal_core::blob::{BlobError, BlobHandle};
    use campus_portal_core::BoxFuture;
    use campus_portal_memstore::{MemoryBlobStore, MemoryDocumentStore};
    use campus_portal_testing::test_clock;

    /// Blob store whose uploads always fail, for abort-path tests.
    struct BrokenBlobStore;

    impl BlobStore for BrokenBlobStore {
        fn upload(
            &self,
            _path: String,
            _bytes: Vec<u8>,
        ) -> BoxFuture<'_, Result<BlobHandle, BlobError>> {
            Box::pin(async { Err(BlobError::Transport("storage quota exceeded".into())) })
        }

        fn public_url(&self, handle: &BlobHandle) -> BoxFuture<'_, Result<String, BlobError>> {
            let handle = handle.clone();
            Box::pin(async move { Err(BlobError::UnknownBlob(handle.as_str().to_string())) })
        }
    }

    fn repository(store: Arc<MemoryDocumentStore>) -> EventRepository {
        EventRepository::new(
            store,
            Arc::new(MemoryBlobStore::new()),
            Arc::new(test_clock()),
            "event_images".into(),
        )
    }

    fn input(title: &str, local: &str) -> CreateEventInput {
        CreateEventInput {
            title: title.into(),
            description: "desc".into(),
            starts_at_local: local.into(),
            created_by: "coord@campus.edu".into(),
            images: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_required_fields() {
        let repo = repository(Arc::new(MemoryDocumentStore::new()));
        let err = repo.create_event(input("  ", "2025-09-01T10:00")).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));
    }

    #[tokio::test]
    async fn create_normalizes_local_datetime_to_utc() {
        let repo = repository(Arc::new(MemoryDocumentStore::new()));
        let event = repo
            .create_event(input("Orientation", "2025-09-01T10:00"))
            .await
            .unwrap();
        assert_eq!(event.starts_at, "2025-09-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert!(event.image_urls.is_empty());
        assert!(event.updated_at.is_none());
    }

    #[tokio::test]
    async fn image_failure_aborts_the_whole_create() {
        let store = Arc::new(MemoryDocumentStore::new());
        let repo = EventRepository::new(
            store.clone(),
            Arc::new(BrokenBlobStore),
            Arc::new(test_clock()),
            "event_images".into(),
        );

        let mut with_image = input("Orientation", "2025-09-01T10:00");
        with_image.images = vec![ImageUpload {
            filename: "poster.png".into(),
            bytes: vec![0xFF],
        }];

        let err = repo.create_event(with_image).await.unwrap_err();
        assert!(matches!(err, PortalError::Upload(_)));
        // No event document was written.
        assert!(repository(store).list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn images_upload_in_order_before_the_event_document() {
        let repo = repository(Arc::new(MemoryDocumentStore::new()));
        let mut with_images = input("Fair", "2025-09-05T09:00");
        with_images.images = vec![
            ImageUpload {
                filename: "first.png".into(),
                bytes: vec![1],
            },
            ImageUpload {
                filename: "second.png".into(),
                bytes: vec![2],
            },
        ];

        let event = repo.create_event(with_images).await.unwrap();
        assert_eq!(event.image_urls.len(), 2);
        assert!(event.image_urls[0].contains("first.png"));
        assert!(event.image_urls[1].contains("second.png"));
    }

    #[tokio::test]
    async fn list_orders_by_start_for_any_insertion_order() {
        let repo = repository(Arc::new(MemoryDocumentStore::new()));
        repo.create_event(input("Late", "2025-09-03T10:00")).await.unwrap();
        repo.create_event(input("Early", "2025-09-01T10:00")).await.unwrap();
        repo.create_event(input("Middle", "2025-09-02T10:00")).await.unwrap();

        let events = repo.list_events().await.unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Early", "Middle", "Late"]);
    }

    #[tokio::test]
    async fn update_merges_fields_and_stamps_updated_at() {
        let repo = repository(Arc::new(MemoryDocumentStore::new()));
        let event = repo.create_event(input("Orientation", "2025-09-01T10:00")).await.unwrap();

        repo.update_event(
            &event.id,
            EventPatch {
                title: Some("Orientation Week".into()),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap();

        let updated = repo.get_event(&event.id).await.unwrap().unwrap();
        assert_eq!(updated.title, "Orientation Week");
        assert_eq!(updated.description, "desc");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn update_of_missing_event_is_a_noop() {
        let repo = repository(Arc::new(MemoryDocumentStore::new()));
        repo.update_event(
            &EventId::new("ghost".into()),
            EventPatch {
                title: Some("x".into()),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap();
        assert!(repo.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn next_upcoming_skips_past_events() {
        let repo = repository(Arc::new(MemoryDocumentStore::new()));
        repo.create_event(input("Past", "2025-07-01T10:00")).await.unwrap();
        repo.create_event(input("Soon", "2025-08-15T10:00")).await.unwrap();
        repo.create_event(input("Later", "2025-09-01T10:00")).await.unwrap();

        let now = "2025-08-01T00:00:00Z".parse().unwrap();
        let next = repo.next_upcoming(now).await.unwrap().unwrap();
        assert_eq!(next.title, "Soon");
    }

    #[tokio::test]
    async fn events_on_filters_by_calendar_day() {
        let repo = repository(Arc::new(MemoryDocumentStore::new()));
        repo.create_event(input("Morning", "2025-09-01T09:00")).await.unwrap();
        repo.create_event(input("Evening", "2025-09-01T18:00")).await.unwrap();
        repo.create_event(input("NextDay", "2025-09-02T09:00")).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let on_day = repo.events_on(day).await.unwrap();
        let titles: Vec<&str> = on_day.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Morning", "Evening"]);
    }

    #[tokio::test]
    async fn created_by_filter_returns_only_own_events() {
        let repo = repository(Arc::new(MemoryDocumentStore::new()));
        repo.create_event(input("Mine", "2025-09-01T10:00")).await.unwrap();
        let mut other = input("Theirs", "2025-09-02T10:00");
        other.created_by = "other@campus.edu".into();
        repo.create_event(other).await.unwrap();

        let mine = repo.events_created_by("coord@campus.edu").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Mine");
    }
}
