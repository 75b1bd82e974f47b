//! The remisión migration engine.
//!
//! [`Migrator`] owns an explicit [`MigrationConfig`] and a [`DocumentStore`]
//! and runs one of four modes:
//!
//! - **dry run**: preview a sample of transformed records, write nothing
//! - **apply**: back up and migrate every record chunk by chunk, optionally
//!   followed by historial seeding
//! - **status**: count legacy, normalized and mixed records
//! - **restore**: replay a run's backup onto the live collection
//!
//! Every run reads the full collection first. A partial read is fatal; no
//! chunk plan or sample is ever built from an incomplete record set.

pub mod apply;
pub mod chunk;
pub mod dry_run;
pub mod historial;
pub mod inspect;
pub mod restore;

pub use apply::{backup_collection_name, ApplyOutcome, BatchApplier};
pub use chunk::{Chunk, ChunkPlan, DEFAULT_CHUNK_SIZE};
pub use dry_run::{preview, DryRunReport, SamplePreview, SampleSummary, DEFAULT_SAMPLE_SIZE};
pub use historial::{HistorialEntry, HistorialSeeder, SeedOutcome, TechnicianAssignment};
pub use inspect::{inspect, MigrationStatus, RecordState};
pub use restore::{BackupRestorer, RestoreOutcome};

use crate::config::MigrationConfig;
use crate::errors::{ConfigError, MigrationError};
use crate::progress::{ProgressSink, SilentProgressSink};
use crate::record::LegacyRecord;
use crate::store::{Document, DocumentStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// What a run does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    DryRun { create_historial: bool },
    Apply { create_historial: bool },
    Status,
    Restore { backup_collection: String },
}

impl Default for Mode {
    fn default() -> Self {
        Self::DryRun {
            create_historial: false,
        }
    }
}

impl Mode {
    /// Whether the mode writes to the store.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Apply { .. } | Self::Restore { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplySummary {
    pub apply: ApplyOutcome,
    pub historial: Option<SeedOutcome>,
}

/// Result of one run, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum RunReport {
    DryRun(DryRunReport),
    Apply(ApplySummary),
    Status(MigrationStatus),
    Restore(RestoreOutcome),
}

pub struct Migrator<S> {
    config: MigrationConfig,
    store: S,
    progress: Arc<dyn ProgressSink>,
}

impl<S: DocumentStore> Migrator<S> {
    /// Build an engine, rejecting invalid configuration before the store is
    /// touched.
    pub fn new(config: MigrationConfig, store: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            progress: Arc::new(SilentProgressSink),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn collection(&self) -> &str {
        &self.config.migration.collection
    }

    fn chunk_plan(&self) -> ChunkPlan {
        NonZeroUsize::new(self.config.migration.chunk_size)
            .map(ChunkPlan::new)
            .unwrap_or_default()
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>, MigrationError> {
        let documents = self
            .store
            .list_all(collection)
            .map_err(|source| MigrationError::Read {
                collection: collection.to_string(),
                source,
            })?;
        log::info!("Read {} document(s) from `{collection}`", documents.len());
        Ok(documents)
    }

    /// Every record of the live collection, in store order.
    pub fn load_records(&self) -> Result<Vec<LegacyRecord>, MigrationError> {
        Ok(self
            .list(self.collection())?
            .iter()
            .map(LegacyRecord::from_document)
            .collect())
    }

    pub fn dry_run(&self, create_historial: bool) -> Result<DryRunReport, MigrationError> {
        let records = self.load_records()?;
        let mut report = preview(
            &records,
            self.config.migration.sample_size,
            self.config.migration.legacy_status,
        );
        report.historial_requested = create_historial;
        Ok(report)
    }

    /// Back up and migrate the whole collection.
    ///
    /// `started_at` fixes the backup collection name for the run.
    pub fn apply(&self, started_at: DateTime<Utc>) -> Result<ApplyOutcome, MigrationError> {
        let records = self.load_records()?;
        let backup_collection =
            backup_collection_name(&self.config.migration.backup_prefix(), started_at);

        BatchApplier {
            store: &self.store,
            collection: self.collection(),
            plan: self.chunk_plan(),
            policy: self.config.migration.legacy_status,
            retry: &self.config.retry,
            progress: self.progress.as_ref(),
        }
        .apply(&records, &backup_collection)
    }

    /// Seed historial entries from the collection as it is now stored.
    pub fn seed_historial(&self) -> Result<SeedOutcome, MigrationError> {
        let documents = self.list(self.collection())?;
        HistorialSeeder {
            store: &self.store,
            collection: self.collection(),
            settings: &self.config.historial,
            retry: &self.config.retry,
            progress: self.progress.as_ref(),
        }
        .seed(&documents)
    }

    pub fn inspect(&self) -> Result<MigrationStatus, MigrationError> {
        let records = self.load_records()?;
        Ok(inspect(self.collection(), &records))
    }

    /// Replay a backup of this collection onto the live documents.
    ///
    /// The source name is checked before the store is touched.
    pub fn restore(&self, backup_collection: &str) -> Result<RestoreOutcome, MigrationError> {
        self.config
            .migration
            .check_restore_source(backup_collection)?;
        let backup = self.list(backup_collection)?;
        BackupRestorer {
            store: &self.store,
            collection: self.collection(),
            plan: self.chunk_plan(),
            retry: &self.config.retry,
            progress: self.progress.as_ref(),
        }
        .restore(backup_collection, &backup)
    }

    /// Run one mode to completion.
    pub fn run(&self, mode: &Mode) -> Result<RunReport, MigrationError> {
        let span = tracing::info_span!("run", collection = self.collection());
        let _enter = span.enter();

        match mode {
            Mode::DryRun { create_historial } => {
                self.dry_run(*create_historial).map(RunReport::DryRun)
            }
            Mode::Apply { create_historial } => {
                let apply = self.apply(Utc::now())?;
                let historial = if *create_historial {
                    Some(self.seed_historial()?)
                } else {
                    None
                };
                Ok(RunReport::Apply(ApplySummary { apply, historial }))
            }
            Mode::Status => self.inspect().map(RunReport::Status),
            Mode::Restore { backup_collection } => {
                self.restore(backup_collection).map(RunReport::Restore)
            }
        }
    }
}
