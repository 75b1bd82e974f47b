//! Batch applier: backup-then-update per chunk.
//!
//! For every chunk, strictly in order:
//!
//! 1. one atomic batch replace-writing the untouched legacy documents into
//!    the run's backup collection,
//! 2. one atomic batch merge-writing the normalized payloads onto the live
//!    collection,
//! 3. a progress report.
//!
//! No update for a chunk is attempted unless its backup committed. Chunk
//! N+1 starts only after chunk N fully committed, so on failure every chunk
//! before the failing one is both backed up and migrated.

use super::chunk::{Chunk, ChunkPlan};
use crate::config::RetryConfig;
use crate::errors::{MigrationError, StoreError};
use crate::progress::{stages, ProgressSink};
use crate::record::{transform, LegacyRecord, LegacyStatusPolicy};
use crate::store::{commit_with_retry, DocumentStore, Write};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Name of a run's backup collection: `<prefix>_<YYYYMMDD>T<HHMMSS>` in UTC.
///
/// The timestamp is taken once at run start and shared by every chunk.
pub fn backup_collection_name(prefix: &str, started_at: DateTime<Utc>) -> String {
    format!("{prefix}_{}", started_at.format("%Y%m%dT%H%M%S"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub collection: String,
    pub backup_collection: String,
    pub chunks_committed: usize,
    pub records_processed: usize,
    pub total_records: usize,
}

pub struct BatchApplier<'a, S: ?Sized> {
    pub store: &'a S,
    pub collection: &'a str,
    pub plan: ChunkPlan,
    pub policy: LegacyStatusPolicy,
    pub retry: &'a RetryConfig,
    pub progress: &'a dyn ProgressSink,
}

impl<S: DocumentStore + ?Sized> BatchApplier<'_, S> {
    /// Back up and migrate `records`, chunk by chunk.
    ///
    /// # Errors
    ///
    /// [`MigrationError::BackupExists`] before any write when the backup
    /// collection already holds documents. [`MigrationError::BackupFailed`] or
    /// [`MigrationError::UpdateFailed`], both naming the failing chunk and how
    /// many chunks fully committed.
    pub fn apply(
        &self,
        records: &[LegacyRecord],
        backup_collection: &str,
    ) -> Result<ApplyOutcome, MigrationError> {
        self.ensure_backup_is_new(backup_collection)?;

        let total_chunks = self.plan.chunk_count(records.len());
        log::info!(
            "Migrating {} record(s) of `{}` in {} chunk(s); backup collection `{}`",
            records.len(),
            self.collection,
            total_chunks,
            backup_collection
        );

        self.progress.start_stage(stages::MIGRATE);
        let result = self.apply_chunks(records, backup_collection, total_chunks);
        self.progress.complete_stage(stages::MIGRATE);

        let (chunks_committed, records_processed) = result?;
        Ok(ApplyOutcome {
            collection: self.collection.to_string(),
            backup_collection: backup_collection.to_string(),
            chunks_committed,
            records_processed,
            total_records: records.len(),
        })
    }

    fn apply_chunks(
        &self,
        records: &[LegacyRecord],
        backup_collection: &str,
        total_chunks: usize,
    ) -> Result<(usize, usize), MigrationError> {
        let mut committed_chunks = 0;
        let mut records_processed = 0;

        for chunk in self.plan.chunks(records) {
            let span = tracing::info_span!(
                "chunk",
                number = chunk.number(),
                of = total_chunks,
                records = chunk.len()
            );
            let _enter = span.enter();

            self.commit_backup(&chunk, backup_collection)
                .map_err(|source| MigrationError::BackupFailed {
                    chunk: chunk.number(),
                    committed_chunks,
                    records_processed,
                    backup_collection: backup_collection.to_string(),
                    source,
                })?;
            log::debug!("Backup batch {} committed", chunk.number());

            self.commit_update(&chunk)
                .map_err(|source| MigrationError::UpdateFailed {
                    chunk: chunk.number(),
                    committed_chunks,
                    records_processed,
                    backup_collection: backup_collection.to_string(),
                    source,
                })?;
            log::debug!("Update batch {} committed", chunk.number());

            committed_chunks += 1;
            records_processed = chunk.end();
            log::info!(
                "Chunk {}/{} committed: records {}..={} ({}/{} processed)",
                chunk.number(),
                total_chunks,
                chunk.offset + 1,
                chunk.end(),
                records_processed,
                records.len()
            );
            self.progress
                .report(stages::MIGRATE, committed_chunks, total_chunks);
        }

        Ok((committed_chunks, records_processed))
    }

    /// Backups are written once; an existing one is never replaced.
    fn ensure_backup_is_new(&self, backup_collection: &str) -> Result<(), MigrationError> {
        let existing = self
            .store
            .list_all(backup_collection)
            .map_err(|source| MigrationError::Read {
                collection: backup_collection.to_string(),
                source,
            })?;
        if existing.is_empty() {
            Ok(())
        } else {
            Err(MigrationError::BackupExists {
                backup_collection: backup_collection.to_string(),
                documents: existing.len(),
            })
        }
    }

    fn commit_backup(
        &self,
        chunk: &Chunk<'_, LegacyRecord>,
        backup_collection: &str,
    ) -> Result<(), StoreError> {
        let writes: Vec<Write> = chunk
            .records
            .iter()
            .map(|record| Write::replace(record.id(), &record.to_fields()))
            .collect();

        commit_with_retry(self.retry, "backup batch", || {
            self.store.batch_write(backup_collection, &writes)
        })
    }

    fn commit_update(
        &self,
        chunk: &Chunk<'_, LegacyRecord>,
    ) -> Result<(), StoreError> {
        let timestamp = self.store.server_timestamp();
        let writes: Vec<Write> = chunk
            .records
            .iter()
            .map(|record| {
                let normalized = transform(record, self.policy);
                Write::merge(record.id(), normalized.to_payload(timestamp.clone()))
            })
            .collect();

        commit_with_retry(self.retry, "update batch", || {
            self.store.batch_write(self.collection, &writes)
        })
    }
}
