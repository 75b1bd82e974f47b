//! Historial seeding.
//!
//! For every remisión that already carries a non-empty `services` array, one
//! initial-migration entry per service is written to the remisión's
//! `historial` sub-collection. All entries of one parent form one atomic
//! batch; parents are processed one after another. Parents are never altered.

use crate::config::{HistorialSettings, RetryConfig};
use crate::errors::MigrationError;
use crate::progress::{stages, ProgressSink};
use crate::record::{NumberedItem, FIELD_SERVICES, FIELD_STATUS, FIELD_TECHNICIANS};
use crate::store::{
    commit_with_retry, Document, DocumentStore, FieldValue, Fields, Write, WritePayload,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub const ENTRY_KIND: &str = "initial-migration";
const ENTRY_ID_PREFIX: &str = "migracion-inicial";

/// Which technician an entry is attributed to.
///
/// Services and technicians are paired by position in their arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TechnicianAssignment {
    /// Same position, else the first technician, else none.
    #[default]
    SameOrdinalOrFirst,
    /// Same position, else none.
    SameOrdinal,
    /// Never attribute.
    None,
}

impl TechnicianAssignment {
    pub fn assign<'a>(
        self,
        position: usize,
        technicians: &'a [NumberedItem],
    ) -> Option<&'a NumberedItem> {
        match self {
            Self::SameOrdinalOrFirst => technicians.get(position).or_else(|| technicians.first()),
            Self::SameOrdinal => technicians.get(position),
            Self::None => None,
        }
    }
}

/// One initial-migration entry of a remisión's historial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorialEntry {
    pub technician_name: Option<String>,
    pub activity: String,
    pub activity_description: String,
    pub status: String,
    pub service_ordinal: u32,
}

impl HistorialEntry {
    /// Deterministic id, so re-seeding overwrites instead of duplicating.
    pub fn id(&self) -> String {
        format!("{ENTRY_ID_PREFIX}-{}", self.service_ordinal)
    }

    /// Entry document, with `timestamp` as the store's commit-time sentinel.
    pub fn to_payload(&self, timestamp: FieldValue) -> WritePayload {
        let value = |v: Value| FieldValue::Value(v);
        WritePayload::from([
            ("activityTimestamp".to_string(), timestamp),
            (
                "technicianName".to_string(),
                value(
                    self.technician_name
                        .clone()
                        .map_or(Value::Null, Value::String),
                ),
            ),
            ("activity".to_string(), value(self.activity.clone().into())),
            (
                "activityDescription".to_string(),
                value(self.activity_description.clone().into()),
            ),
            ("materials".to_string(), value(Value::Array(Vec::new()))),
            ("durationMinutes".to_string(), value(Value::Null)),
            ("status".to_string(), value(self.status.clone().into())),
            ("kind".to_string(), value(ENTRY_KIND.into())),
            (
                "serviceOrdinal".to_string(),
                value(self.service_ordinal.into()),
            ),
        ])
    }
}

/// Parse a stored `services`/`technicians` array, keeping well-formed items.
fn stored_items(fields: &Fields, key: &str) -> Vec<NumberedItem> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<NumberedItem>(item.clone()).ok())
                .filter(|item| !item.name.trim().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Historial entries for one already-normalized remisión, one per distinct
/// service ordinal.
///
/// Empty when the document has no usable `services`.
pub fn entries_for(document: &Document, settings: &HistorialSettings) -> Vec<HistorialEntry> {
    let services = stored_items(&document.fields, FIELD_SERVICES);
    let technicians = stored_items(&document.fields, FIELD_TECHNICIANS);
    let status = document
        .fields
        .get(FIELD_STATUS)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&settings.default_status)
        .to_string();

    // Entry ids derive from the ordinal; a repeated ordinal keeps its first item.
    let mut seen = BTreeSet::new();
    services
        .iter()
        .enumerate()
        .filter(|(_, service)| seen.insert(service.ordinal))
        .map(|(position, service)| HistorialEntry {
            technician_name: settings
                .technician_assignment
                .assign(position, &technicians)
                .map(|t| t.name.clone()),
            activity: format!("Registro inicial del servicio: {}", service.name),
            activity_description: format!(
                "Servicio migrado automáticamente desde estructura anterior (servicio{})",
                service.ordinal
            ),
            status: status.clone(),
            service_ordinal: service.ordinal,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub parents_seeded: usize,
    pub entries_written: usize,
    /// Documents without a usable `services` array.
    pub parents_skipped: usize,
}

pub struct HistorialSeeder<'a, S: ?Sized> {
    pub store: &'a S,
    pub collection: &'a str,
    pub settings: &'a HistorialSettings,
    pub retry: &'a RetryConfig,
    pub progress: &'a dyn ProgressSink,
}

impl<S: DocumentStore + ?Sized> HistorialSeeder<'_, S> {
    /// Seed historial entries for every normalized document.
    ///
    /// # Errors
    ///
    /// [`MigrationError::HistorialFailed`] naming the parent whose batch
    /// failed and how much was written before it.
    pub fn seed(&self, documents: &[Document]) -> Result<SeedOutcome, MigrationError> {
        self.progress.start_stage(stages::HISTORIAL);
        let result = self.seed_all(documents);
        self.progress.complete_stage(stages::HISTORIAL);

        let outcome = result?;
        log::info!(
            "Seeded {} historial entries for {} remisión(es); {} skipped",
            outcome.entries_written,
            outcome.parents_seeded,
            outcome.parents_skipped
        );
        Ok(outcome)
    }

    fn seed_all(&self, documents: &[Document]) -> Result<SeedOutcome, MigrationError> {
        let mut outcome = SeedOutcome::default();

        for (position, document) in documents.iter().enumerate() {
            let entries = entries_for(document, self.settings);
            if entries.is_empty() {
                outcome.parents_skipped += 1;
                continue;
            }

            let timestamp = self.store.server_timestamp();
            let writes: Vec<Write> = entries
                .iter()
                .map(|entry| {
                    Write::replace_payload(entry.id(), entry.to_payload(timestamp.clone()))
                })
                .collect();

            commit_with_retry(self.retry, "historial batch", || {
                self.store.subcollection_batch_write(
                    self.collection,
                    &document.id,
                    &self.settings.subcollection,
                    &writes,
                )
            })
            .map_err(|source| MigrationError::HistorialFailed {
                parent_id: document.id.clone(),
                parents_seeded: outcome.parents_seeded,
                entries_written: outcome.entries_written,
                source,
            })?;

            outcome.parents_seeded += 1;
            outcome.entries_written += writes.len();
            self.progress
                .report(stages::HISTORIAL, position + 1, documents.len());
        }

        Ok(outcome)
    }
}
