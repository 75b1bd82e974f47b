//! Remisión record shapes.
//!
//! A legacy remisión stores its services and technicians in numbered fields
//! (`servicio1..servicio20`, `tecnico1..tecnico10`) next to a free-text
//! `estado`. [`LegacyRecord`] gives that shape structure: numbered slots, the
//! raw `estado`, and a passthrough bag for every other field, so nothing the
//! migration does not understand is ever lost.

pub mod extract;
pub mod transform;

pub use extract::{extract, extract_services, extract_technicians};
pub use transform::{canonical_status, transform, LegacyStatusPolicy, NormalizedRecord};

use crate::store::{Document, Fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Highest `servicioN` suffix probed.
pub const MAX_SERVICE_SLOTS: u32 = 20;
/// Highest `tecnicoN` suffix probed.
pub const MAX_TECHNICIAN_SLOTS: u32 = 10;
/// `schemaVersion` stamped on migrated records.
pub const SCHEMA_VERSION: &str = "2.0";

pub const FIELD_ESTADO: &str = "estado";
pub const FIELD_SERVICES: &str = "services";
pub const FIELD_TECHNICIANS: &str = "technicians";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_MIGRATED_AT: &str = "migratedAt";
pub const FIELD_SCHEMA_VERSION: &str = "schemaVersion";

/// Keys owned by the normalized shape. The transformer writes them itself and
/// never copies stored values for them.
pub const NORMALIZED_FIELDS: [&str; 5] = [
    FIELD_SERVICES,
    FIELD_TECHNICIANS,
    FIELD_STATUS,
    FIELD_MIGRATED_AT,
    FIELD_SCHEMA_VERSION,
];

/// A family of numbered legacy fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberedField {
    Servicio,
    Tecnico,
}

impl NumberedField {
    pub const ALL: [NumberedField; 2] = [NumberedField::Servicio, NumberedField::Tecnico];

    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Servicio => "servicio",
            Self::Tecnico => "tecnico",
        }
    }

    pub const fn max_index(self) -> u32 {
        match self {
            Self::Servicio => MAX_SERVICE_SLOTS,
            Self::Tecnico => MAX_TECHNICIAN_SLOTS,
        }
    }

    pub fn key(self, index: u32) -> String {
        format!("{}{}", self.prefix(), index)
    }

    /// Recognise a canonical numbered key within bounds.
    ///
    /// `servicio07` and `servicio21` are not slots; they stay in the
    /// passthrough bag like any unknown field.
    pub fn parse_key(key: &str) -> Option<(Self, u32)> {
        Self::ALL.into_iter().find_map(|field| {
            let digits = key.strip_prefix(field.prefix())?;
            if digits.is_empty()
                || digits.starts_with('0')
                || !digits.bytes().all(|b| b.is_ascii_digit())
            {
                return None;
            }
            let index: u32 = digits.parse().ok()?;
            (1..=field.max_index())
                .contains(&index)
                .then_some((field, index))
        })
    }
}

/// A service or technician taken from a numbered field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberedItem {
    /// Trimmed, never empty.
    pub name: String,
    /// Suffix of the field it came from.
    pub ordinal: u32,
}

pub type ServiceItem = NumberedItem;
pub type TechnicianItem = NumberedItem;

/// A remisión as stored, before migration.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRecord {
    id: String,
    servicios: BTreeMap<u32, Value>,
    tecnicos: BTreeMap<u32, Value>,
    estado: Option<Value>,
    extra: Fields,
}

impl LegacyRecord {
    pub fn from_document(document: &Document) -> Self {
        Self::from_fields(document.id.clone(), &document.fields)
    }

    pub fn from_fields(id: impl Into<String>, fields: &Fields) -> Self {
        let mut record = Self {
            id: id.into(),
            servicios: BTreeMap::new(),
            tecnicos: BTreeMap::new(),
            estado: None,
            extra: Fields::new(),
        };

        for (key, value) in fields {
            match NumberedField::parse_key(key) {
                Some((NumberedField::Servicio, index)) => {
                    record.servicios.insert(index, value.clone());
                }
                Some((NumberedField::Tecnico, index)) => {
                    record.tecnicos.insert(index, value.clone());
                }
                None if key == FIELD_ESTADO => record.estado = Some(value.clone()),
                None => {
                    record.extra.insert(key.clone(), value.clone());
                }
            }
        }

        record
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn slot(&self, field: NumberedField, index: u32) -> Option<&Value> {
        self.slots_of(field).get(&index)
    }

    /// Stored numbered slots of one family, in index order.
    pub fn slots(&self, field: NumberedField) -> impl Iterator<Item = (u32, &Value)> {
        self.slots_of(field).iter().map(|(index, value)| (*index, value))
    }

    fn slots_of(&self, field: NumberedField) -> &BTreeMap<u32, Value> {
        match field {
            NumberedField::Servicio => &self.servicios,
            NumberedField::Tecnico => &self.tecnicos,
        }
    }

    pub fn estado(&self) -> Option<&Value> {
        self.estado.as_ref()
    }

    /// Every field that is neither a numbered slot nor `estado`.
    pub fn extra(&self) -> &Fields {
        &self.extra
    }

    pub fn has_numbered_fields(&self) -> bool {
        !self.servicios.is_empty() || !self.tecnicos.is_empty()
    }

    /// The stored field set, reassembled exactly.
    pub fn to_fields(&self) -> Fields {
        let mut fields = self.extra.clone();
        for field in NumberedField::ALL {
            for (index, value) in self.slots(field) {
                fields.insert(field.key(index), value.clone());
            }
        }
        if let Some(estado) = &self.estado {
            fields.insert(FIELD_ESTADO.to_string(), estado.clone());
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_key_accepts_bounds() {
        assert_eq!(
            NumberedField::parse_key("servicio1"),
            Some((NumberedField::Servicio, 1))
        );
        assert_eq!(
            NumberedField::parse_key("servicio20"),
            Some((NumberedField::Servicio, 20))
        );
        assert_eq!(
            NumberedField::parse_key("tecnico10"),
            Some((NumberedField::Tecnico, 10))
        );
    }

    #[test]
    fn test_parse_key_rejects_non_canonical() {
        for key in [
            "servicio0",
            "servicio21",
            "tecnico11",
            "servicio01",
            "servicio",
            "servicio1a",
            "servicios",
            "Servicio1",
        ] {
            assert_eq!(NumberedField::parse_key(key), None, "{key}");
        }
    }

    #[test]
    fn test_partitions_fields() {
        let record = LegacyRecord::from_fields(
            "X1",
            &fields(json!({
                "servicio2": "Revisión",
                "tecnico1": "Ana",
                "estado": "Abierta",
                "movil": "M-12",
                "servicio21": "fuera de rango"
            })),
        );

        assert_eq!(
            record.slot(NumberedField::Servicio, 2),
            Some(&json!("Revisión"))
        );
        assert_eq!(record.slot(NumberedField::Tecnico, 1), Some(&json!("Ana")));
        assert_eq!(record.estado(), Some(&json!("Abierta")));
        assert_eq!(
            record.extra(),
            &fields(json!({"movil": "M-12", "servicio21": "fuera de rango"}))
        );
        assert!(record.has_numbered_fields());
    }

    #[test]
    fn test_to_fields_reassembles_exactly() {
        let original = fields(json!({
            "servicio1": "A",
            "servicio3": 42,
            "tecnico2": null,
            "estado": {"raw": true},
            "fecha": "2024-05-01",
            "services": [{"name": "old", "ordinal": 1}]
        }));
        let record = LegacyRecord::from_fields("X1", &original);
        assert_eq!(record.to_fields(), original);
    }

    #[test]
    fn test_normalized_document_has_no_numbered_fields() {
        let record = LegacyRecord::from_fields(
            "X1",
            &fields(json!({"services": [{"name": "A", "ordinal": 1}], "schemaVersion": "2.0"})),
        );
        assert!(!record.has_numbered_fields());
    }
}
