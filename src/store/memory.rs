//! In-process document store.
//!
//! Keeps every collection in memory, counts reads and committed batches, and
//! can be told to fail specific batches. The test suite uses it to drive the
//! engine through backup failures, update failures and transient throttling.

use super::{
    apply_batch, commit_timestamp, subcollection_path, CollectionImage, Document, DocumentStore,
    Fields, Write,
};
use crate::errors::StoreError;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;

/// A scripted failure for batch writes to one collection.
#[derive(Debug, Clone)]
pub struct WriteFault {
    /// Batches to let through before failing.
    pub skip_batches: usize,
    /// How many consecutive batches fail once triggered.
    pub failures: usize,
    /// Fail as transient unavailability instead of a rejection.
    pub retryable: bool,
}

impl WriteFault {
    /// Fail every batch from the `skip_batches`-th onwards with a rejection.
    pub fn reject_after(skip_batches: usize) -> Self {
        Self {
            skip_batches,
            failures: usize::MAX,
            retryable: false,
        }
    }

    /// Fail `failures` batches as transient unavailability, then recover.
    pub fn throttle(failures: usize) -> Self {
        Self {
            skip_batches: 0,
            failures,
            retryable: true,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Calls to `list_all`.
    pub reads: usize,
    /// Batches committed successfully.
    pub batches_committed: usize,
    /// Document writes inside committed batches.
    pub writes_committed: usize,
    /// Batches that failed, injected or not.
    pub batches_failed: usize,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, CollectionImage>>,
    write_faults: Mutex<BTreeMap<String, WriteFault>>,
    read_faults: Mutex<Vec<String>>,
    stats: Mutex<StoreStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `documents` in `collection`.
    pub fn with_collection(collection: &str, documents: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        for doc in documents {
            store.insert(collection, doc);
        }
        store
    }

    /// Seed a document without counting it as a write.
    pub fn insert(&self, collection: &str, document: Document) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(document.id, document.fields);
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Fields> {
        self.collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Documents of a collection, in id order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Documents of a parent's sub-collection, in id order.
    pub fn subcollection(&self, parent_collection: &str, parent_id: &str, sub: &str) -> Vec<Document> {
        self.documents(&subcollection_path(parent_collection, parent_id, sub))
    }

    /// Names of every collection holding at least one document.
    pub fn collection_names(&self) -> Vec<String> {
        self.collections
            .read()
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        *self.stats.lock()
    }

    /// Script a failure for batches written to `collection`.
    pub fn fail_writes(&self, collection: &str, fault: WriteFault) {
        self.write_faults.lock().insert(collection.to_string(), fault);
    }

    /// Make every read of `collection` fail.
    pub fn fail_reads(&self, collection: &str) {
        self.read_faults.lock().push(collection.to_string());
    }

    fn check_write_fault(&self, collection: &str) -> Result<(), StoreError> {
        let mut faults = self.write_faults.lock();
        let Some(fault) = faults.get_mut(collection) else {
            return Ok(());
        };

        if fault.skip_batches > 0 {
            fault.skip_batches -= 1;
            return Ok(());
        }
        if fault.failures == 0 {
            return Ok(());
        }
        fault.failures = fault.failures.saturating_sub(1);

        let message = "injected fault".to_string();
        Err(if fault.retryable {
            StoreError::Unavailable {
                collection: collection.to_string(),
                message,
            }
        } else {
            StoreError::Rejected {
                collection: collection.to_string(),
                message,
            }
        })
    }

    fn commit(&self, collection: &str, writes: &[Write]) -> Result<(), StoreError> {
        if let Err(err) = self.check_write_fault(collection) {
            self.stats.lock().batches_failed += 1;
            return Err(err);
        }

        let mut collections = self.collections.write();
        let mut image = collections.get(collection).cloned().unwrap_or_default();

        if let Err(message) = apply_batch(&mut image, writes, &commit_timestamp()) {
            self.stats.lock().batches_failed += 1;
            return Err(StoreError::Rejected {
                collection: collection.to_string(),
                message,
            });
        }

        collections.insert(collection.to_string(), image);
        let mut stats = self.stats.lock();
        stats.batches_committed += 1;
        stats.writes_committed += writes.len();
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.stats.lock().reads += 1;
        if self.read_faults.lock().iter().any(|c| c == collection) {
            return Err(StoreError::Read {
                collection: collection.to_string(),
                message: "injected fault".into(),
            });
        }
        Ok(self.documents(collection))
    }

    fn batch_write(&self, collection: &str, writes: &[Write]) -> Result<(), StoreError> {
        self.commit(collection, writes)
    }

    fn subcollection_batch_write(
        &self,
        parent_collection: &str,
        parent_id: &str,
        subcollection: &str,
        writes: &[Write],
    ) -> Result<(), StoreError> {
        self.commit(
            &subcollection_path(parent_collection, parent_id, subcollection),
            writes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(fields) => Document::new(id, fields),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_list_all_returns_id_order() {
        let store = MemoryStore::with_collection(
            "remisiones",
            vec![doc("b", json!({})), doc("a", json!({}))],
        );
        let ids: Vec<_> = store
            .list_all("remisiones")
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.list_all("remisiones").unwrap().is_empty());
    }

    #[test]
    fn test_rejected_fault_after_skipped_batches() {
        let store = MemoryStore::new();
        store.fail_writes("c", WriteFault::reject_after(1));
        let write = Write::replace("a", &serde_json::Map::new());

        assert!(store.batch_write("c", std::slice::from_ref(&write)).is_ok());
        let err = store.batch_write("c", &[write]).unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(store.stats().batches_committed, 1);
        assert_eq!(store.stats().batches_failed, 1);
    }

    #[test]
    fn test_throttle_fault_recovers() {
        let store = MemoryStore::new();
        store.fail_writes("c", WriteFault::throttle(1));
        let write = Write::replace("a", &serde_json::Map::new());

        assert!(store
            .batch_write("c", std::slice::from_ref(&write))
            .unwrap_err()
            .is_retryable());
        assert!(store.batch_write("c", &[write]).is_ok());
    }

    #[test]
    fn test_failed_batch_leaves_collection_untouched() {
        let store = MemoryStore::with_collection("c", vec![doc("a", json!({"x": 1}))]);
        store.fail_writes("c", WriteFault::reject_after(0));

        let write = Write::replace("a", &serde_json::Map::new());
        assert!(store.batch_write("c", &[write]).is_err());
        assert_eq!(store.get("c", "a").unwrap()["x"], json!(1));
    }

    #[test]
    fn test_read_fault() {
        let store = MemoryStore::new();
        store.fail_reads("remisiones");
        assert!(matches!(
            store.list_all("remisiones"),
            Err(StoreError::Read { .. })
        ));
    }

    #[test]
    fn test_subcollection_writes_are_scoped_to_parent() {
        let store = MemoryStore::new();
        let write = Write::replace("h1", &serde_json::Map::new());
        store
            .subcollection_batch_write("remisiones", "X1", "historial", &[write])
            .unwrap();

        assert_eq!(store.subcollection("remisiones", "X1", "historial").len(), 1);
        assert!(store.subcollection("remisiones", "X2", "historial").is_empty());
        assert!(store.documents("remisiones").is_empty());
    }
}
