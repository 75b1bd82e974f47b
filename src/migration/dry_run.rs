//! Dry-run preview.
//!
//! Transforms the first `sample_size` records in store order and reports a
//! before/after view of each. Totals cover the sample only; nothing is
//! extrapolated to the full record set. The store is never written.

use crate::record::{
    transform, LegacyRecord, LegacyStatusPolicy, NumberedField, ServiceItem, TechnicianItem,
};
use serde::Serialize;
use serde_json::Value;

/// Records previewed when no sample size is configured.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DryRunReport {
    /// Records in the live collection.
    pub total_records: usize,
    pub samples: Vec<SamplePreview>,
    pub summary: SampleSummary,
    /// Whether historial seeding would follow an apply.
    pub historial_requested: bool,
}

impl DryRunReport {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Totals across the previewed sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SampleSummary {
    pub records_sampled: usize,
    pub services_detected: usize,
    pub technicians_detected: usize,
    pub statuses_changed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplePreview {
    pub id: String,
    pub before: BeforeView,
    pub after: AfterView,
    pub services_detected: usize,
    pub technicians_detected: usize,
    /// The canonical status differs textually from the stored `estado`.
    pub status_changed: bool,
}

/// Legacy fields as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeforeView {
    /// `(key, raw value)` for every stored numbered slot, services first.
    pub numbered: Vec<(String, Value)>,
    pub estado: Option<Value>,
}

/// What the update batch would write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AfterView {
    pub services: Vec<ServiceItem>,
    pub technicians: Vec<TechnicianItem>,
    pub status: Option<String>,
    /// Keys removed from the live document.
    pub superseded: Vec<String>,
    pub schema_version: &'static str,
}

/// Build the preview for `records` without touching the store.
pub fn preview(
    records: &[LegacyRecord],
    sample_size: usize,
    policy: LegacyStatusPolicy,
) -> DryRunReport {
    let samples: Vec<SamplePreview> = records
        .iter()
        .take(sample_size)
        .map(|record| sample_preview(record, policy))
        .collect();

    let summary = samples
        .iter()
        .fold(SampleSummary::default(), |mut summary, sample| {
            summary.records_sampled += 1;
            summary.services_detected += sample.services_detected;
            summary.technicians_detected += sample.technicians_detected;
            summary.statuses_changed += usize::from(sample.status_changed);
            summary
        });

    log::debug!(
        "Previewed {} of {} record(s)",
        summary.records_sampled,
        records.len()
    );

    DryRunReport {
        total_records: records.len(),
        samples,
        summary,
        historial_requested: false,
    }
}

fn sample_preview(record: &LegacyRecord, policy: LegacyStatusPolicy) -> SamplePreview {
    let normalized = transform(record, policy);

    let numbered = NumberedField::ALL
        .into_iter()
        .flat_map(|field| {
            record
                .slots(field)
                .map(move |(index, value)| (field.key(index), value.clone()))
        })
        .collect();

    let status_changed = match (record.estado().and_then(Value::as_str), &normalized.status) {
        (Some(raw), Some(status)) => raw != status,
        _ => false,
    };

    SamplePreview {
        id: normalized.id.clone(),
        before: BeforeView {
            numbered,
            estado: record.estado().cloned(),
        },
        services_detected: normalized.services.len(),
        technicians_detected: normalized.technicians.len(),
        status_changed,
        after: AfterView {
            services: normalized.services,
            technicians: normalized.technicians,
            status: normalized.status,
            superseded: normalized.superseded,
            schema_version: normalized.schema_version,
        },
    }
}
