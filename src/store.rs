//! Document store abstraction.
//!
//! The migration engine never talks to a database directly. Everything it reads
//! and writes goes through [`DocumentStore`], which models a transactional
//! document database with:
//!
//! - full collection scans ([`DocumentStore::list_all`])
//! - atomic, all-or-nothing batch writes in replace or merge mode
//! - the same batches scoped under a parent document (sub-collections)
//! - a server-timestamp sentinel resolved by the store at commit time
//!
//! Two implementations ship with the crate: [`MemoryStore`] for tests and
//! [`FileStore`], a JSON snapshot of a project's collections on disk.

pub mod file;
pub mod memory;
pub mod retry;

pub use file::FileStore;
pub use memory::{MemoryStore, WriteFault};
pub use retry::commit_with_retry;

use crate::errors::StoreError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// A document as read from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// A value in a write payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A concrete value written as-is.
    Value(Value),
    /// Replaced by the store's commit time.
    ServerTimestamp,
    /// Removes the field. Only valid in merge writes.
    Delete,
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Field map of a write. Ordered so payloads compare and print deterministically.
pub type WritePayload = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// The document becomes exactly the payload.
    Replace,
    /// Only the payload's keys are touched; other stored fields survive.
    Merge,
}

/// One document write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub id: String,
    pub payload: WritePayload,
    pub mode: WriteMode,
}

impl Write {
    /// Replace-write of a plain field map.
    pub fn replace(id: impl Into<String>, fields: &Fields) -> Self {
        Self {
            id: id.into(),
            payload: fields
                .iter()
                .map(|(key, value)| (key.clone(), FieldValue::Value(value.clone())))
                .collect(),
            mode: WriteMode::Replace,
        }
    }

    pub fn replace_payload(id: impl Into<String>, payload: WritePayload) -> Self {
        Self {
            id: id.into(),
            payload,
            mode: WriteMode::Replace,
        }
    }

    pub fn merge(id: impl Into<String>, payload: WritePayload) -> Self {
        Self {
            id: id.into(),
            payload,
            mode: WriteMode::Merge,
        }
    }
}

/// Transactional document store consumed by the migration engine.
///
/// Implementations must make each batch atomic: either every write in the
/// slice is applied or none is.
pub trait DocumentStore: Send + Sync {
    /// Read every document of a collection, in the store's iteration order.
    ///
    /// # Errors
    ///
    /// Fails if the collection cannot be read in full. Partial results are
    /// never returned.
    fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Atomically apply `writes` to `collection`.
    fn batch_write(&self, collection: &str, writes: &[Write]) -> Result<(), StoreError>;

    /// Atomically apply `writes` to the `subcollection` of one parent document.
    fn subcollection_batch_write(
        &self,
        parent_collection: &str,
        parent_id: &str,
        subcollection: &str,
        writes: &[Write],
    ) -> Result<(), StoreError>;

    /// Sentinel the store replaces with its own commit time.
    fn server_timestamp(&self) -> FieldValue {
        FieldValue::ServerTimestamp
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        (**self).list_all(collection)
    }

    fn batch_write(&self, collection: &str, writes: &[Write]) -> Result<(), StoreError> {
        (**self).batch_write(collection, writes)
    }

    fn subcollection_batch_write(
        &self,
        parent_collection: &str,
        parent_id: &str,
        subcollection: &str,
        writes: &[Write],
    ) -> Result<(), StoreError> {
        (**self).subcollection_batch_write(parent_collection, parent_id, subcollection, writes)
    }

    fn server_timestamp(&self) -> FieldValue {
        (**self).server_timestamp()
    }
}

/// Path of a sub-collection under its parent document.
pub fn subcollection_path(parent_collection: &str, parent_id: &str, subcollection: &str) -> String {
    format!("{parent_collection}/{parent_id}/{subcollection}")
}

/// In-memory image of one collection, keyed by document id.
pub(crate) type CollectionImage = BTreeMap<String, Fields>;

/// Apply a batch to a collection image.
///
/// Works on the image it is given; callers pass a copy and swap it in only on
/// success, which is what makes the batch atomic. Every write is validated
/// before anything is applied.
pub(crate) fn apply_batch(
    image: &mut CollectionImage,
    writes: &[Write],
    commit_time: &Value,
) -> Result<(), String> {
    for write in writes {
        validate_write(write)?;
    }

    for write in writes {
        match write.mode {
            WriteMode::Replace => {
                let fields = write
                    .payload
                    .iter()
                    .filter_map(|(key, value)| resolve(value, commit_time).map(|v| (key.clone(), v)))
                    .collect();
                image.insert(write.id.clone(), fields);
            }
            WriteMode::Merge => {
                let doc = image.entry(write.id.clone()).or_default();
                for (key, value) in &write.payload {
                    match resolve(value, commit_time) {
                        Some(v) => {
                            doc.insert(key.clone(), v);
                        }
                        None => {
                            doc.remove(key);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn validate_write(write: &Write) -> Result<(), String> {
    if write.id.is_empty() || write.id.contains('/') {
        return Err(format!("invalid document id `{}`", write.id));
    }
    if write.payload.keys().any(String::is_empty) {
        return Err(format!("empty field name in write to `{}`", write.id));
    }
    if write.mode == WriteMode::Replace
        && write.payload.values().any(|v| *v == FieldValue::Delete)
    {
        return Err(format!(
            "delete sentinel in replace write to `{}`; deletes need merge mode",
            write.id
        ));
    }
    Ok(())
}

fn resolve(value: &FieldValue, commit_time: &Value) -> Option<Value> {
    match value {
        FieldValue::Value(v) => Some(v.clone()),
        FieldValue::ServerTimestamp => Some(commit_time.clone()),
        FieldValue::Delete => None,
    }
}

/// Commit time in the form stores resolve server timestamps to.
pub(crate) fn commit_timestamp() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}
