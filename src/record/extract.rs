//! Field extraction from numbered legacy slots.

use super::{LegacyRecord, NumberedField, NumberedItem, ServiceItem, TechnicianItem};
use serde_json::Value;

/// Collect the usable values of one numbered field family.
///
/// Probes indices `1..=max_index` in order and emits `{name, ordinal}` for
/// every slot holding a string that is non-empty after trimming. Absent,
/// blank and non-string slots are skipped silently.
pub fn extract(record: &LegacyRecord, field: NumberedField, max_index: u32) -> Vec<NumberedItem> {
    (1..=max_index)
        .filter_map(|index| {
            let name = usable_name(record.slot(field, index)?)?;
            Some(NumberedItem {
                name: name.to_string(),
                ordinal: index,
            })
        })
        .collect()
}

pub fn extract_services(record: &LegacyRecord) -> Vec<ServiceItem> {
    extract(record, NumberedField::Servicio, NumberedField::Servicio.max_index())
}

pub fn extract_technicians(record: &LegacyRecord) -> Vec<TechnicianItem> {
    extract(record, NumberedField::Tecnico, NumberedField::Tecnico.max_index())
}

/// Trimmed contents of a slot, if it is a non-blank string.
pub(crate) fn usable_name(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}
