//! Restoring a live collection from a run's backup.
//!
//! Backup documents are replace-written onto the live collection with the
//! same chunking, sequencing and retry policy as the applier. Documents
//! created in the live collection after the backup are left alone.

use super::chunk::ChunkPlan;
use crate::config::RetryConfig;
use crate::errors::MigrationError;
use crate::progress::{stages, ProgressSink};
use crate::store::{commit_with_retry, Document, DocumentStore, Write};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreOutcome {
    pub collection: String,
    pub backup_collection: String,
    pub chunks_committed: usize,
    pub records_restored: usize,
}

pub struct BackupRestorer<'a, S: ?Sized> {
    pub store: &'a S,
    pub collection: &'a str,
    pub plan: ChunkPlan,
    pub retry: &'a RetryConfig,
    pub progress: &'a dyn ProgressSink,
}

impl<S: DocumentStore + ?Sized> BackupRestorer<'_, S> {
    pub fn restore(
        &self,
        backup_collection: &str,
        backup: &[Document],
    ) -> Result<RestoreOutcome, MigrationError> {
        if backup.is_empty() {
            return Err(MigrationError::EmptyBackup(backup_collection.to_string()));
        }

        let total_chunks = self.plan.chunk_count(backup.len());
        log::info!(
            "Restoring {} record(s) from `{}` onto `{}` in {} chunk(s)",
            backup.len(),
            backup_collection,
            self.collection,
            total_chunks
        );

        self.progress.start_stage(stages::RESTORE);
        let mut committed_chunks = 0;
        let mut records_restored = 0;

        for chunk in self.plan.chunks(backup) {
            let span = tracing::info_span!("restore_chunk", number = chunk.number());
            let _enter = span.enter();

            let writes: Vec<Write> = chunk
                .records
                .iter()
                .map(|doc| Write::replace(doc.id.as_str(), &doc.fields))
                .collect();

            let committed = commit_with_retry(self.retry, "restore batch", || {
                self.store.batch_write(self.collection, &writes)
            });
            if let Err(source) = committed {
                self.progress.complete_stage(stages::RESTORE);
                return Err(MigrationError::RestoreFailed {
                    chunk: chunk.number(),
                    committed_chunks,
                    records_processed: records_restored,
                    backup_collection: backup_collection.to_string(),
                    source,
                });
            }

            committed_chunks += 1;
            records_restored = chunk.end();
            self.progress
                .report(stages::RESTORE, committed_chunks, total_chunks);
        }

        self.progress.complete_stage(stages::RESTORE);
        Ok(RestoreOutcome {
            collection: self.collection.to_string(),
            backup_collection: backup_collection.to_string(),
            chunks_committed: committed_chunks,
            records_restored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgressSink;
    use crate::store::{MemoryStore, WriteFault};
    use serde_json::json;
    use std::num::NonZeroUsize;

    fn doc(id: &str, value: serde_json::Value) -> Document {
        Document::new(id, value.as_object().cloned().unwrap())
    }

    fn restorer<'a>(store: &'a MemoryStore, retry: &'a RetryConfig) -> BackupRestorer<'a, MemoryStore> {
        BackupRestorer {
            store,
            collection: "remisiones",
            plan: ChunkPlan::new(NonZeroUsize::new(2).unwrap()),
            retry,
            progress: &SilentProgressSink,
        }
    }

    #[test]
    fn test_restore_replaces_live_documents() {
        let store = MemoryStore::with_collection(
            "remisiones",
            [doc("A", json!({"services": [], "schemaVersion": "2.0"}))],
        );
        let backup = vec![
            doc("A", json!({"servicio1": "Revisión"})),
            doc("B", json!({"estado": "Abierta"})),
            doc("C", json!({})),
        ];
        let retry = RetryConfig::disabled();

        let outcome = restorer(&store, &retry).restore("bk", &backup).unwrap();

        assert_eq!(outcome.chunks_committed, 2);
        assert_eq!(outcome.records_restored, 3);
        assert_eq!(
            store.get("remisiones", "A").unwrap(),
            json!({"servicio1": "Revisión"}).as_object().cloned().unwrap()
        );
    }

    #[test]
    fn test_empty_backup_is_an_error() {
        let store = MemoryStore::new();
        let retry = RetryConfig::disabled();
        let err = restorer(&store, &retry).restore("bk", &[]).unwrap_err();
        assert!(matches!(err, MigrationError::EmptyBackup(name) if name == "bk"));
    }

    #[test]
    fn test_restore_failure_reports_resume_point() {
        let store = MemoryStore::new();
        store.fail_writes("remisiones", WriteFault::reject_after(1));
        let backup: Vec<_> = (0..5).map(|i| doc(&format!("R{i}"), json!({}))).collect();
        let retry = RetryConfig::disabled();

        let err = restorer(&store, &retry).restore("bk", &backup).unwrap_err();
        let resume = err.resume_point().unwrap();
        assert_eq!(resume.committed_chunks, 1);
        assert_eq!(resume.records_processed, 2);
    }
}
