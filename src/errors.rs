//! Error types for the remisión migration engine.
//!
//! Errors are split by layer:
//!
//! - [`StoreError`]: failures reported by a [`DocumentStore`](crate::store::DocumentStore)
//! - [`ConfigError`]: configuration problems, always raised before any store access
//! - [`MigrationError`]: engine failures, carrying the resume point of the run
//!
//! Extraction anomalies (non-string or blank numbered fields) are never errors;
//! the extractor skips them.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A collection could not be read in full.
    #[error("failed to read collection `{collection}`: {message}")]
    Read { collection: String, message: String },

    /// The store refused the batch; nothing in it was applied.
    #[error("batch write to `{collection}` rejected: {message}")]
    Rejected { collection: String, message: String },

    /// Transient unavailability (throttling, contention). Safe to retry.
    #[error("store unavailable while writing `{collection}`: {message}")]
    Unavailable { collection: String, message: String },

    /// A collection path or document id that cannot be addressed.
    #[error("invalid collection path `{0}`")]
    InvalidPath(String),

    /// File system errors from file-backed stores.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored collection data that is not valid JSON.
    #[error("malformed collection data in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying the same atomic batch may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

/// Configuration problems. Fatal, and always detected before the store is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// One or more invalid settings, all reported together.
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(vec![message.into()])
    }
}

/// Failure of a migration run.
///
/// Every variant raised mid-run states how far the run got, so the operator
/// knows which chunks are safely committed and where a re-run resumes.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The record set could not be read completely; nothing was migrated.
    #[error("failed to read collection `{collection}`; no records were migrated")]
    Read {
        collection: String,
        #[source]
        source: StoreError,
    },

    /// The run's backup collection already exists; nothing was written.
    #[error(
        "backup collection `{backup_collection}` already holds {documents} document(s); \
         refusing to overwrite it, wait a second and re-run"
    )]
    BackupExists {
        backup_collection: String,
        documents: usize,
    },

    #[error(
        "backup batch for chunk {chunk} failed; {committed_chunks} chunk(s) fully committed \
         ({records_processed} records), no update was attempted for chunk {chunk}"
    )]
    BackupFailed {
        chunk: usize,
        committed_chunks: usize,
        records_processed: usize,
        backup_collection: String,
        #[source]
        source: StoreError,
    },

    #[error(
        "update batch for chunk {chunk} failed after its backup committed to `{backup_collection}`; \
         {committed_chunks} chunk(s) fully committed ({records_processed} records)"
    )]
    UpdateFailed {
        chunk: usize,
        committed_chunks: usize,
        records_processed: usize,
        backup_collection: String,
        #[source]
        source: StoreError,
    },

    #[error(
        "historial batch for remisión `{parent_id}` failed; {parents_seeded} record(s) seeded \
         with {entries_written} entries before the failure"
    )]
    HistorialFailed {
        parent_id: String,
        parents_seeded: usize,
        entries_written: usize,
        #[source]
        source: StoreError,
    },

    #[error(
        "restore of chunk {chunk} from `{backup_collection}` failed; {committed_chunks} chunk(s) \
         restored ({records_processed} records)"
    )]
    RestoreFailed {
        chunk: usize,
        committed_chunks: usize,
        records_processed: usize,
        backup_collection: String,
        #[source]
        source: StoreError,
    },

    #[error("backup collection `{0}` is empty or does not exist")]
    EmptyBackup(String),
}

/// How far a chunked run got before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    /// Chunks whose writes all committed.
    pub committed_chunks: usize,
    /// Records covered by those chunks.
    pub records_processed: usize,
}

impl MigrationError {
    /// The safe resume point for chunked failures, if this error has one.
    pub fn resume_point(&self) -> Option<ResumePoint> {
        match self {
            Self::BackupFailed {
                committed_chunks,
                records_processed,
                ..
            }
            | Self::UpdateFailed {
                committed_chunks,
                records_processed,
                ..
            }
            | Self::RestoreFailed {
                committed_chunks,
                records_processed,
                ..
            } => Some(ResumePoint {
                committed_chunks: *committed_chunks,
                records_processed: *records_processed,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> StoreError {
        StoreError::Unavailable {
            collection: "remisiones".into(),
            message: "throttled".into(),
        }
    }

    #[test]
    fn test_unavailable_is_retryable() {
        assert!(unavailable().is_retryable());
    }

    #[test]
    fn test_rejected_is_not_retryable() {
        let err = StoreError::Rejected {
            collection: "remisiones".into(),
            message: "invalid write".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_io_retryable_only_for_transient_kinds() {
        let timed_out = StoreError::io(
            "/tmp/x.json",
            std::io::Error::new(std::io::ErrorKind::TimedOut, "slow disk"),
        );
        let denied = StoreError::io(
            "/tmp/x.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(timed_out.is_retryable());
        assert!(!denied.is_retryable());
    }

    #[test]
    fn test_invalid_config_lists_every_problem() {
        let err = ConfigError::Invalid(vec!["a is missing".into(), "b is zero".into()]);
        assert_eq!(
            err.to_string(),
            "invalid configuration: a is missing; b is zero"
        );
    }

    #[test]
    fn test_resume_point_from_backup_failure() {
        let err = MigrationError::BackupFailed {
            chunk: 3,
            committed_chunks: 2,
            records_processed: 600,
            backup_collection: "remisiones_backup_20260101T000000".into(),
            source: unavailable(),
        };
        assert_eq!(
            err.resume_point(),
            Some(ResumePoint {
                committed_chunks: 2,
                records_processed: 600
            })
        );
        assert!(err.to_string().contains("chunk 3"));
        assert!(err.to_string().contains("2 chunk(s) fully committed"));
    }

    #[test]
    fn test_read_failure_has_no_resume_point() {
        let err = MigrationError::Read {
            collection: "remisiones".into(),
            source: unavailable(),
        };
        assert!(err.resume_point().is_none());
    }
}
