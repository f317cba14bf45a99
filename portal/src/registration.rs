//! Registration subsystem.
//!
//! Manages the per-event set of registrants, live registration counts, and
//! the current user's registration state. This is the one place with real
//! invariants:
//!
//! - at most one registration per `(event, registrant)` pair, enforced by
//!   using the registrant's identity as the document key — re-registration
//!   is an idempotent overwrite, never a duplicate insert, with no
//!   client-side locking
//! - unregistering an absent registration is a no-op
//! - counts are push-driven, never polled: every live subscriber observes
//!   the new cardinality as a consequence of the write itself, with no
//!   separate notification channel
//!
//! Live counts are managed through an explicit registry mapping event id to
//! its observer, so observers are released deterministically when an event
//! leaves view instead of leaking one subscription per rendered row.

use crate::collections;
use crate::error::PortalError;
use crate::types::{Attendee, EventId, Registration, RegistrantId, UserProfile};
use campus_portal_core::environment::Clock;
use campus_portal_core::store::DocumentStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Live view of one event's registration count.
///
/// `borrow()` reads the latest count; `changed().await` wakes on the next
/// push. Dropping the watch releases nothing by itself — the registry owns
/// the underlying store subscription.
pub type CountWatch = watch::Receiver<usize>;

struct CountObserver {
    watch: CountWatch,
    task: JoinHandle<()>,
}

/// Registry of live count observers, keyed by event.
///
/// One observer per watched event, shared by every watcher of that event.
/// Releasing an event aborts its listener task, which drops the store
/// subscription.
#[derive(Default)]
struct CountRegistry {
    observers: Mutex<HashMap<EventId, CountObserver>>,
}

impl CountRegistry {
    fn existing(&self, event: &EventId) -> Option<CountWatch> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map(|observer| observer.watch.clone())
    }

    /// Installs a freshly built observer unless a concurrent caller beat us
    /// to it, in which case the new observer is torn down and the existing
    /// watch wins.
    fn install(&self, event: EventId, watch: CountWatch, task: JoinHandle<()>) -> CountWatch {
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = observers.get(&event) {
            task.abort();
            return existing.watch.clone();
        }
        observers.insert(event, CountObserver { watch: watch.clone(), task });
        watch
    }

    fn release(&self, event: &EventId) {
        if let Some(observer) = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(event)
        {
            observer.task.abort();
        }
    }

    fn release_absent(&self, keep: &[EventId]) {
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        observers.retain(|event, observer| {
            if keep.contains(event) {
                true
            } else {
                observer.task.abort();
                false
            }
        });
    }

    fn watched(&self) -> Vec<EventId> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl Drop for CountRegistry {
    fn drop(&mut self) {
        for observer in self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
        {
            observer.task.abort();
        }
    }
}

/// Registrations, live counts, and profile joins for events.
pub struct RegistrationService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    counts: CountRegistry,
}

impl RegistrationService {
    /// Creates the service over the given store and clock.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            counts: CountRegistry::default(),
        }
    }

    /// Registers `registrant` for the event.
    ///
    /// The write is keyed by the registrant's identity, so concurrent
    /// duplicate calls collapse into one record and the operation needs no
    /// locking. Live count subscribers observe the new cardinality as a
    /// side effect of the write.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed
    pub async fn register(
        &self,
        event: &EventId,
        registrant: RegistrantId,
        email: &str,
    ) -> Result<Registration, PortalError> {
        let registration = Registration {
            registrant,
            email: email.to_string(),
            registered_at: self.clock.now(),
        };
        self.store
            .put(
                collections::registrations(event),
                registrant.key(),
                serde_json::to_value(&registration)?,
            )
            .await?;
        tracing::info!(%event, %registrant, "registered");
        Ok(registration)
    }

    /// Removes `registrant`'s registration. Deleting an absent registration
    /// is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed
    pub async fn unregister(
        &self,
        event: &EventId,
        registrant: RegistrantId,
    ) -> Result<(), PortalError> {
        self.store
            .delete(collections::registrations(event), registrant.key())
            .await?;
        tracing::info!(%event, %registrant, "unregistered");
        Ok(())
    }

    /// Whether `registrant` currently holds a registration for the event,
    /// derived from key existence.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed
    pub async fn is_registered(
        &self,
        event: &EventId,
        registrant: RegistrantId,
    ) -> Result<bool, PortalError> {
        let doc = self
            .store
            .get(collections::registrations(event), registrant.key())
            .await?;
        Ok(doc.is_some())
    }

    /// Opens (or joins) the live count observation for an event.
    ///
    /// The returned watch starts at the current cardinality and is pushed on
    /// every change of the event's registration set, in the order the store
    /// emits them. One underlying store subscription is shared by all
    /// watchers of the same event.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: opening the store subscription failed
    pub async fn subscribe_count(&self, event: &EventId) -> Result<CountWatch, PortalError> {
        if let Some(existing) = self.counts.existing(event) {
            return Ok(existing);
        }

        let mut subscription = self
            .store
            .subscribe(collections::registrations(event))
            .await?;
        let initial = subscription.recv().await.map_or(0, |snapshot| snapshot.len());
        let (sender, watch) = watch::channel(initial);
        let task = tokio::spawn(async move {
            while let Some(snapshot) = subscription.recv().await {
                if sender.send(snapshot.len()).is_err() {
                    break;
                }
            }
        });

        Ok(self.counts.install(event.clone(), watch, task))
    }

    /// Releases the live count observation for one event.
    pub fn release_count(&self, event: &EventId) {
        self.counts.release(event);
    }

    /// Reconciles the watched set against the events currently in view:
    /// observers for events that left the list are released, and missing
    /// observers are opened. Call whenever the rendered event list changes.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: opening a new subscription failed
    pub async fn sync_counts(&self, in_view: &[EventId]) -> Result<(), PortalError> {
        self.counts.release_absent(in_view);
        for event in in_view {
            self.subscribe_count(event).await?;
        }
        Ok(())
    }

    /// Event ids currently holding a live count observer.
    #[must_use]
    pub fn watched_counts(&self) -> Vec<EventId> {
        self.counts.watched()
    }

    /// All registrations for an event, in store enumeration order.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: the store call failed or a document did
    ///   not decode
    pub async fn list_registrations(
        &self,
        event: &EventId,
    ) -> Result<Vec<Registration>, PortalError> {
        let docs = self
            .store
            .list(collections::registrations(event), None, None)
            .await?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc.data).map_err(PortalError::from))
            .collect()
    }

    /// Registrations joined with registrant profiles.
    ///
    /// Registrants without a profile document keep their bare registration
    /// fields. Order follows store enumeration order, not registration time.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: a store call failed
    pub async fn list_with_profiles(&self, event: &EventId) -> Result<Vec<Attendee>, PortalError> {
        let registrations = self.list_registrations(event).await?;
        let mut attendees = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let profile = self.profile_of(registration.registrant).await?;
            attendees.push(Attendee {
                registration,
                profile,
            });
        }
        Ok(attendees)
    }

    /// Events the registrant currently holds a registration for, in event
    /// enumeration order.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Transport`]: a store call failed
    pub async fn registrations_of(
        &self,
        registrant: RegistrantId,
    ) -> Result<Vec<EventId>, PortalError> {
        let events = self.store.list(collections::events(), None, None).await?;
        let mut registered = Vec::new();
        for doc in events {
            let event = EventId::new(doc.id);
            if self.is_registered(&event, registrant).await? {
                registered.push(event);
            }
        }
        Ok(registered)
    }

    async fn profile_of(
        &self,
        registrant: RegistrantId,
    ) -> Result<Option<UserProfile>, PortalError> {
        let doc = self
            .store
            .get(collections::users(), registrant.key())
            .await?;
        doc.map(|d| serde_json::from_value(d.data).map_err(PortalError::from))
            .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Role;
    use campus_portal_memstore::MemoryDocumentStore;
    use campus_portal_testing::test_clock;
    use uuid::Uuid;

    fn service() -> RegistrationService {
        RegistrationService::new(Arc::new(MemoryDocumentStore::new()), Arc::new(test_clock()))
    }

    fn event(id: &str) -> EventId {
        EventId::new(id.into())
    }

    fn registrant() -> RegistrantId {
        RegistrantId::from_uuid(Uuid::new_v4())
    }

    #[tokio::test]
    async fn registered_then_unregistered_round_trip() {
        let service = service();
        let orientation = event("e1");
        let alice = registrant();

        assert!(!service.is_registered(&orientation, alice).await.unwrap());
        service.register(&orientation, alice, "alice@campus.edu").await.unwrap();
        assert!(service.is_registered(&orientation, alice).await.unwrap());
        service.unregister(&orientation, alice).await.unwrap();
        assert!(!service.is_registered(&orientation, alice).await.unwrap());
    }

    #[tokio::test]
    async fn double_register_leaves_one_record() {
        let service = service();
        let orientation = event("e1");
        let alice = registrant();

        service.register(&orientation, alice, "alice@campus.edu").await.unwrap();
        service.register(&orientation, alice, "alice@campus.edu").await.unwrap();

        let registrations = service.list_registrations(&orientation).await.unwrap();
        assert_eq!(registrations.len(), 1);
    }

    #[tokio::test]
    async fn unregister_of_absent_registration_is_a_noop() {
        let service = service();
        service.unregister(&event("e1"), registrant()).await.unwrap();
    }

    #[tokio::test]
    async fn count_watch_tracks_register_and_unregister() {
        let service = service();
        let orientation = event("e1");
        let alice = registrant();
        let bob = registrant();

        let mut counts = service.subscribe_count(&orientation).await.unwrap();
        assert_eq!(*counts.borrow(), 0);

        service.register(&orientation, alice, "alice@campus.edu").await.unwrap();
        counts.changed().await.unwrap();
        assert_eq!(*counts.borrow_and_update(), 1);

        service.register(&orientation, bob, "bob@campus.edu").await.unwrap();
        counts.changed().await.unwrap();
        assert_eq!(*counts.borrow_and_update(), 2);

        service.unregister(&orientation, alice).await.unwrap();
        counts.changed().await.unwrap();
        assert_eq!(*counts.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn second_registration_push_is_not_duplicated_for_same_user() {
        let service = service();
        let orientation = event("e1");
        let alice = registrant();

        let mut counts = service.subscribe_count(&orientation).await.unwrap();
        service.register(&orientation, alice, "alice@campus.edu").await.unwrap();
        counts.changed().await.unwrap();
        assert_eq!(*counts.borrow_and_update(), 1);

        // Overwriting the same key publishes again but the cardinality holds.
        service.register(&orientation, alice, "alice@campus.edu").await.unwrap();
        counts.changed().await.unwrap();
        assert_eq!(*counts.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn sync_counts_releases_departed_and_adds_new() {
        let service = service();
        let first = event("e1");
        let second = event("e2");

        service.sync_counts(&[first.clone()]).await.unwrap();
        assert_eq!(service.watched_counts(), vec![first.clone()]);

        service.sync_counts(&[second.clone()]).await.unwrap();
        let watched = service.watched_counts();
        assert_eq!(watched, vec![second.clone()]);

        service.release_count(&second);
        assert!(service.watched_counts().is_empty());
    }

    #[tokio::test]
    async fn join_falls_back_to_bare_registration_without_profile() {
        let store = Arc::new(MemoryDocumentStore::new());
        let service = RegistrationService::new(store.clone(), Arc::new(test_clock()));
        let orientation = event("e1");
        let with_profile = registrant();
        let without_profile = registrant();

        store
            .put(
                collections::users(),
                with_profile.key(),
                serde_json::to_value(UserProfile {
                    email: "alice@campus.edu".into(),
                    role: Role::User,
                    name: Some("Alice".into()),
                    unique_id: Some("CS-001".into()),
                    branch: Some("CSE".into()),
                    year: Some("2".into()),
                    section: Some("A".into()),
                })
                .unwrap(),
            )
            .await
            .unwrap();

        service.register(&orientation, with_profile, "alice@campus.edu").await.unwrap();
        service.register(&orientation, without_profile, "ghost@campus.edu").await.unwrap();

        let attendees = service.list_with_profiles(&orientation).await.unwrap();
        assert_eq!(attendees.len(), 2);
        let profiled = attendees
            .iter()
            .find(|a| a.registration.registrant == with_profile)
            .unwrap();
        assert_eq!(profiled.profile.as_ref().unwrap().name.as_deref(), Some("Alice"));
        let bare = attendees
            .iter()
            .find(|a| a.registration.registrant == without_profile)
            .unwrap();
        assert!(bare.profile.is_none());
        assert_eq!(bare.email(), "ghost@campus.edu");
    }

    #[tokio::test]
    async fn registrations_survive_event_document_deletion() {
        let store = Arc::new(MemoryDocumentStore::new());
        let service = RegistrationService::new(store.clone(), Arc::new(test_clock()));
        let orientation = event("e1");
        let alice = registrant();

        store
            .put(
                collections::events(),
                "e1".into(),
                serde_json::json!({"title": "Orientation"}),
            )
            .await
            .unwrap();
        service.register(&orientation, alice, "alice@campus.edu").await.unwrap();

        store.delete(collections::events(), "e1".into()).await.unwrap();

        // Known gap: the sub-collection is still addressable by direct path.
        assert!(service.is_registered(&orientation, alice).await.unwrap());
    }
}
