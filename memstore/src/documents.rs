//! In-memory document store.
//!
//! Collections are independent maps keyed by their full path, so deleting a
//! document never disturbs sub-collections nested under it — they stay
//! addressable, exactly like the hosted store behaves.

use campus_portal_core::document::{CollectionPath, Document, FieldFilter, OrderBy};
use campus_portal_core::store::{CollectionSnapshot, DocumentStore, StoreError, Subscription};
use campus_portal_core::BoxFuture;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Snapshots buffered per subscriber before older ones are superseded.
const SNAPSHOT_BUFFER: usize = 64;

struct Collection {
    documents: BTreeMap<String, Value>,
    publisher: broadcast::Sender<CollectionSnapshot>,
}

impl Collection {
    fn new() -> Self {
        let (publisher, _) = broadcast::channel(SNAPSHOT_BUFFER);
        Self {
            documents: BTreeMap::new(),
            publisher,
        }
    }

    fn snapshot(&self, path: &CollectionPath) -> CollectionSnapshot {
        CollectionSnapshot {
            path: path.clone(),
            documents: self
                .documents
                .iter()
                .map(|(id, data)| Document::new(id.clone(), data.clone()))
                .collect(),
        }
    }

    fn publish(&self, path: &CollectionPath) {
        // Nobody listening is fine; send only fails without receivers.
        let _ = self.publisher.send(self.snapshot(path));
    }
}

/// In-process, last-write-wins document store with live subscriptions.
///
/// Every mutation of a collection publishes a fresh whole-collection
/// snapshot to that collection's subscribers. Publication happens under the
/// same lock as the mutation, so subscribers observe changes in mutation
/// order with no gap between a subscription's initial snapshot and the
/// change feed.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_collection<T>(
        &self,
        path: &CollectionPath,
        f: impl FnOnce(&mut Collection) -> T,
    ) -> T {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let collection = collections
            .entry(path.as_str().to_string())
            .or_insert_with(Collection::new);
        f(collection)
    }

    fn read_collection<T>(
        &self,
        path: &CollectionPath,
        f: impl FnOnce(Option<&Collection>) -> T,
    ) -> T {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(collections.get(path.as_str()))
    }
}

/// Total order over JSON values for `OrderBy`: nulls, then booleans, then
/// numbers, then strings, then everything else; ties keep enumeration order.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn insert(
        &self,
        path: CollectionPath,
        data: Value,
    ) -> BoxFuture<'_, Result<String, StoreError>> {
        Box::pin(async move {
            let id = Uuid::new_v4().simple().to_string();
            self.with_collection(&path, |collection| {
                collection.documents.insert(id.clone(), data);
                collection.publish(&path);
            });
            Ok(id)
        })
    }

    fn put(
        &self,
        path: CollectionPath,
        id: String,
        data: Value,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.with_collection(&path, |collection| {
                collection.documents.insert(id, data);
                collection.publish(&path);
            });
            Ok(())
        })
    }

    fn get(
        &self,
        path: CollectionPath,
        id: String,
    ) -> BoxFuture<'_, Result<Option<Document>, StoreError>> {
        Box::pin(async move {
            Ok(self.read_collection(&path, |collection| {
                collection.and_then(|c| {
                    c.documents
                        .get(&id)
                        .map(|data| Document::new(id.clone(), data.clone()))
                })
            }))
        })
    }

    fn list(
        &self,
        path: CollectionPath,
        filter: Option<FieldFilter>,
        order: Option<OrderBy>,
    ) -> BoxFuture<'_, Result<Vec<Document>, StoreError>> {
        Box::pin(async move {
            let mut documents = self.read_collection(&path, |collection| {
                collection.map_or_else(Vec::new, |c| c.snapshot(&path).documents)
            });
            if let Some(filter) = filter {
                documents.retain(|doc| filter.matches(doc));
            }
            if let Some(order) = order {
                documents.sort_by(|a, b| {
                    let ordering =
                        compare_values(a.data.get(&order.field), b.data.get(&order.field));
                    if order.ascending {
                        ordering
                    } else {
                        ordering.reverse()
                    }
                });
            }
            Ok(documents)
        })
    }

    fn update(
        &self,
        path: CollectionPath,
        id: String,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.with_collection(&path, |collection| {
                // Updating an absent document is a no-op by contract.
                let Some(existing) = collection.documents.get_mut(&id) else {
                    return;
                };
                if let Value::Object(existing_fields) = existing {
                    for (key, value) in fields {
                        existing_fields.insert(key, value);
                    }
                } else {
                    *existing = Value::Object(fields);
                }
                collection.publish(&path);
            });
            Ok(())
        })
    }

    fn delete(&self, path: CollectionPath, id: String) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.with_collection(&path, |collection| {
                if collection.documents.remove(&id).is_some() {
                    collection.publish(&path);
                }
            });
            Ok(())
        })
    }

    fn subscribe(&self, path: CollectionPath) -> BoxFuture<'_, Result<Subscription, StoreError>> {
        Box::pin(async move {
            Ok(self.with_collection(&path, |collection| {
                Subscription::new(collection.snapshot(&path), collection.publisher.subscribe())
            }))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn events() -> CollectionPath {
        CollectionPath::root("events")
    }

    #[tokio::test]
    async fn put_overwrites_existing_document() {
        let store = MemoryDocumentStore::new();
        store
            .put(events(), "e1".into(), json!({"title": "first"}))
            .await
            .unwrap();
        store
            .put(events(), "e1".into(), json!({"title": "second"}))
            .await
            .unwrap();

        let doc = store.get(events(), "e1".into()).await.unwrap().unwrap();
        assert_eq!(doc.str_field("title"), Some("second"));
        assert_eq!(store.list(events(), None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_merges_fields_and_skips_missing_documents() {
        let store = MemoryDocumentStore::new();
        store
            .put(events(), "e1".into(), json!({"title": "t", "description": "d"}))
            .await
            .unwrap();

        let mut patch = Map::new();
        patch.insert("title".into(), json!("renamed"));
        store.update(events(), "e1".into(), patch.clone()).await.unwrap();
        store.update(events(), "ghost".into(), patch).await.unwrap();

        let doc = store.get(events(), "e1".into()).await.unwrap().unwrap();
        assert_eq!(doc.str_field("title"), Some("renamed"));
        assert_eq!(doc.str_field("description"), Some("d"));
        assert!(store.get(events(), "ghost".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store.put(events(), "e1".into(), json!({})).await.unwrap();
        store.delete(events(), "e1".into()).await.unwrap();
        store.delete(events(), "e1".into()).await.unwrap();
        assert!(store.get(events(), "e1".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_parent_document_keeps_subcollection() {
        let store = MemoryDocumentStore::new();
        let regs = events().subcollection("e1", "registrations");
        store.put(events(), "e1".into(), json!({"title": "t"})).await.unwrap();
        store
            .put(regs.clone(), "u1".into(), json!({"email": "a@campus.edu"}))
            .await
            .unwrap();

        store.delete(events(), "e1".into()).await.unwrap();

        assert!(store.get(events(), "e1".into()).await.unwrap().is_none());
        assert_eq!(store.list(regs, None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_orders_by_field() {
        let store = MemoryDocumentStore::new();
        store
            .put(events(), "b".into(), json!({"date": "2025-09-02T10:00:00Z"}))
            .await
            .unwrap();
        store
            .put(events(), "a".into(), json!({"date": "2025-09-03T10:00:00Z"}))
            .await
            .unwrap();
        store
            .put(events(), "c".into(), json!({"date": "2025-09-01T10:00:00Z"}))
            .await
            .unwrap();

        let docs = store
            .list(events(), None, Some(OrderBy::ascending("date")))
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn subscription_sees_initial_state_then_changes() {
        let store = MemoryDocumentStore::new();
        store.put(events(), "e1".into(), json!({})).await.unwrap();

        let mut subscription = store.subscribe(events()).await.unwrap();
        let initial = subscription.recv().await.unwrap();
        assert_eq!(initial.len(), 1);

        store.put(events(), "e2".into(), json!({})).await.unwrap();
        let after_insert = subscription.recv().await.unwrap();
        assert_eq!(after_insert.len(), 2);

        store.delete(events(), "e1".into()).await.unwrap();
        let after_delete = subscription.recv().await.unwrap();
        assert_eq!(after_delete.len(), 1);
    }
}
