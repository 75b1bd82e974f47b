// Export modules for library usage
pub mod cli;
pub mod config;
pub mod errors;
pub mod formatting;
pub mod migration;
pub mod output;
pub mod progress;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use crate::config::{MigrationConfig, RetryConfig};
pub use crate::errors::{ConfigError, MigrationError, ResumePoint, StoreError};
pub use crate::migration::{Migrator, Mode, RunReport};
pub use crate::output::{create_writer, OutputFormat, ReportWriter};
pub use crate::record::{transform, LegacyRecord, LegacyStatusPolicy, NormalizedRecord};
pub use crate::store::{
    Document, DocumentStore, FieldValue, FileStore, MemoryStore, Write, WriteMode,
};
