//! Legacy → normalized record transformation.
//!
//! The normalized record is built by construction: every stored field is
//! either *carried* unchanged or *superseded* by a normalized field. Nothing
//! is cloned and then mutated.

use super::extract::{extract_services, extract_technicians};
use super::{
    LegacyRecord, NumberedField, ServiceItem, TechnicianItem, FIELD_ESTADO, FIELD_MIGRATED_AT,
    FIELD_SCHEMA_VERSION, FIELD_SERVICES, FIELD_STATUS, FIELD_TECHNICIANS, NORMALIZED_FIELDS,
    SCHEMA_VERSION,
};
use crate::store::{FieldValue, Fields, WritePayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What happens to the legacy `estado` field once `status` is derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegacyStatusPolicy {
    /// Keep `estado` on the live document for readers of the old shape.
    #[default]
    Retain,
    /// Remove `estado` in the same merge-write that sets `status`.
    Delete,
}

/// A remisión in the normalized shape, ready to be merge-written.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub id: String,
    pub services: Vec<ServiceItem>,
    pub technicians: Vec<TechnicianItem>,
    /// Canonical status, present only when the legacy `estado` was a string.
    pub status: Option<String>,
    pub schema_version: &'static str,
    /// Stored fields copied unchanged.
    pub carried: Fields,
    /// Stored keys replaced by normalized fields, removed on write.
    pub superseded: Vec<String>,
}

impl NormalizedRecord {
    /// Merge-write payload for the live document, stamping `migratedAt` with
    /// the store's `timestamp` sentinel.
    ///
    /// Empty `services`/`technicians` and an absent `status` are left out
    /// entirely, so a merge never clobbers values set by an earlier run.
    pub fn to_payload(&self, timestamp: FieldValue) -> WritePayload {
        let mut payload: WritePayload = self
            .carried
            .iter()
            .map(|(key, value)| (key.clone(), FieldValue::Value(value.clone())))
            .collect();

        for key in &self.superseded {
            payload.insert(key.clone(), FieldValue::Delete);
        }
        if !self.services.is_empty() {
            payload.insert(FIELD_SERVICES.to_string(), items_value(&self.services));
        }
        if !self.technicians.is_empty() {
            payload.insert(FIELD_TECHNICIANS.to_string(), items_value(&self.technicians));
        }
        if let Some(status) = &self.status {
            payload.insert(
                FIELD_STATUS.to_string(),
                FieldValue::Value(Value::String(status.clone())),
            );
        }
        payload.insert(FIELD_MIGRATED_AT.to_string(), timestamp);
        payload.insert(
            FIELD_SCHEMA_VERSION.to_string(),
            FieldValue::Value(Value::String(self.schema_version.to_string())),
        );

        payload
    }
}

fn items_value(items: &[super::NumberedItem]) -> FieldValue {
    FieldValue::Value(Value::Array(
        items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "name": item.name,
                    "ordinal": item.ordinal,
                })
            })
            .collect(),
    ))
}

/// Lowercased, trimmed form of a free-text status.
pub fn canonical_status(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Build the normalized form of a legacy record.
///
/// Pure apart from the `migratedAt` sentinel, which the store resolves at
/// commit time. Accepts any field shape without failing.
pub fn transform(record: &LegacyRecord, policy: LegacyStatusPolicy) -> NormalizedRecord {
    let services = extract_services(record);
    let technicians = extract_technicians(record);

    let extracted_keys: Vec<String> = services
        .iter()
        .map(|item| NumberedField::Servicio.key(item.ordinal))
        .chain(
            technicians
                .iter()
                .map(|item| NumberedField::Tecnico.key(item.ordinal)),
        )
        .collect();

    let status = record
        .estado()
        .and_then(Value::as_str)
        .map(canonical_status);
    let estado_superseded = status.is_some() && policy == LegacyStatusPolicy::Delete;

    let carried: Fields = record
        .to_fields()
        .into_iter()
        .filter(|(key, _)| {
            !extracted_keys.contains(key)
                && !NORMALIZED_FIELDS.contains(&key.as_str())
                && !(estado_superseded && key == FIELD_ESTADO)
        })
        .collect();

    let mut superseded = extracted_keys;
    if estado_superseded {
        superseded.push(FIELD_ESTADO.to_string());
    }

    NormalizedRecord {
        id: record.id().to_string(),
        services,
        technicians,
        status,
        schema_version: SCHEMA_VERSION,
        carried,
        superseded,
    }
}
