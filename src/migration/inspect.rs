//! Migration status of a live collection. Read-only.

use crate::record::{
    extract_services, extract_technicians, LegacyRecord, FIELD_SCHEMA_VERSION, SCHEMA_VERSION,
};
use serde::Serialize;
use serde_json::Value;

/// Shape of one stored remisión.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordState {
    /// Numbered fields, not yet migrated.
    Legacy,
    /// Migrated, no extractable numbered values left.
    Normalized,
    /// Migrated, but numbered values were written again afterwards.
    Mixed,
    /// Neither numbered fields nor the current schema version.
    Other,
}

impl RecordState {
    pub fn of(record: &LegacyRecord) -> Self {
        let migrated = record
            .extra()
            .get(FIELD_SCHEMA_VERSION)
            .and_then(Value::as_str)
            == Some(SCHEMA_VERSION);
        let pending =
            !extract_services(record).is_empty() || !extract_technicians(record).is_empty();

        match (migrated, pending) {
            (true, false) => Self::Normalized,
            (true, true) => Self::Mixed,
            (false, _) if record.has_numbered_fields() => Self::Legacy,
            (false, _) => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub collection: String,
    pub total: usize,
    pub legacy: usize,
    pub normalized: usize,
    pub mixed: usize,
    pub other: usize,
    /// Ids of mixed records, which need a re-run.
    pub mixed_ids: Vec<String>,
}

impl MigrationStatus {
    /// Records an apply run would still change.
    pub fn pending(&self) -> usize {
        self.legacy + self.mixed
    }

    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }
}

pub fn inspect(collection: &str, records: &[LegacyRecord]) -> MigrationStatus {
    let mut status = MigrationStatus {
        collection: collection.to_string(),
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        match RecordState::of(record) {
            RecordState::Legacy => status.legacy += 1,
            RecordState::Normalized => status.normalized += 1,
            RecordState::Mixed => {
                status.mixed += 1;
                status.mixed_ids.push(record.id().to_string());
            }
            RecordState::Other => status.other += 1,
        }
    }

    status
}
