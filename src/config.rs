//! Migration configuration.
//!
//! All settings live in one [`MigrationConfig`], loaded from
//! `.remisiones-migrate.toml` (see [`loader`]) and passed explicitly into the
//! engine. There is no global configuration state.
//!
//! ```toml
//! [store]
//! project_id = "global-flow-db"
//! root = "./snapshots"
//!
//! [migration]
//! collection = "remisiones"
//! chunk_size = 300
//! sample_size = 10
//! legacy_status = "retain"
//!
//! [historial]
//! subcollection = "historial"
//! technician_assignment = "same-ordinal-or-first"
//! default_status = "pendiente"
//!
//! [retry]
//! max_retries = 3
//! ```

pub mod loader;
pub mod retry;

pub use loader::{
    apply_env_overrides, directory_ancestors, discover_config, load_config, parse_config,
    CONFIG_FILE_NAME, ENV_PROJECT_ID, ENV_STORE_ROOT,
};
pub use retry::{RetryConfig, RetryStrategy};

use crate::errors::ConfigError;
use crate::migration::historial::TechnicianAssignment;
use crate::record::LegacyStatusPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest batch the store accepts in one commit.
pub const MAX_BATCH_WRITES: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub migration: MigrationSettings,

    #[serde(default)]
    pub historial: HistorialSettings,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// Where the document snapshot lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project whose collections are migrated.
    pub project_id: Option<String>,

    /// Directory holding one sub-directory per project.
    pub root: Option<PathBuf>,
}

impl StoreConfig {
    /// Directory of the configured project's snapshot.
    ///
    /// # Errors
    ///
    /// Reports every missing or unusable setting at once.
    pub fn project_root(&self) -> Result<PathBuf, ConfigError> {
        let mut problems = Vec::new();

        let project_id = self
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if project_id.is_none() {
            problems.push(format!(
                "store.project_id is not set (set it in {CONFIG_FILE_NAME} or {ENV_PROJECT_ID})"
            ));
        }
        if self.root.is_none() {
            problems.push(format!(
                "store.root is not set (set it in {CONFIG_FILE_NAME} or {ENV_STORE_ROOT})"
            ));
        }

        let (Some(project_id), Some(root)) = (project_id, self.root.as_ref()) else {
            return Err(ConfigError::Invalid(problems));
        };
        if !is_plain_name(project_id) {
            return Err(ConfigError::invalid(format!(
                "store.project_id `{project_id}` must be a plain name"
            )));
        }

        let project_root = root.join(project_id);
        if !project_root.is_dir() {
            return Err(ConfigError::invalid(format!(
                "no snapshot found for project `{project_id}` at {}",
                project_root.display()
            )));
        }
        Ok(project_root)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationSettings {
    /// Live collection of remisiones (default: "remisiones")
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Prefix of per-run backup collections (default: "<collection>_backup")
    #[serde(default)]
    pub backup_prefix: Option<String>,

    /// Records per backup/update batch pair (default: 300)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Records previewed by a dry run (default: 10)
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    #[serde(default)]
    pub legacy_status: LegacyStatusPolicy,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            backup_prefix: None,
            chunk_size: default_chunk_size(),
            sample_size: default_sample_size(),
            legacy_status: LegacyStatusPolicy::default(),
        }
    }
}

impl MigrationSettings {
    pub fn backup_prefix(&self) -> String {
        self.backup_prefix
            .clone()
            .unwrap_or_else(|| format!("{}_backup", self.collection))
    }

    /// Check that `name` can be a backup of this run's collection: a plain
    /// collection name carrying the backup prefix, never the live collection.
    pub fn check_restore_source(&self, name: &str) -> Result<(), ConfigError> {
        let prefix = format!("{}_", self.backup_prefix());
        if !is_plain_name(name) {
            Err(ConfigError::invalid(format!(
                "restore source `{name}` must be a plain collection name"
            )))
        } else if name == self.collection {
            Err(ConfigError::invalid(format!(
                "restore source `{name}` is the live collection"
            )))
        } else if !name.starts_with(&prefix) || name.len() == prefix.len() {
            Err(ConfigError::invalid(format!(
                "restore source `{name}` is not a backup of `{}` (expected `{prefix}<timestamp>`)",
                self.collection
            )))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorialSettings {
    /// Sub-collection receiving the entries (default: "historial")
    #[serde(default = "default_subcollection")]
    pub subcollection: String,

    #[serde(default)]
    pub technician_assignment: TechnicianAssignment,

    /// Entry status when the parent has none (default: "pendiente")
    #[serde(default = "default_entry_status")]
    pub default_status: String,
}

impl Default for HistorialSettings {
    fn default() -> Self {
        Self {
            subcollection: default_subcollection(),
            technician_assignment: TechnicianAssignment::default(),
            default_status: default_entry_status(),
        }
    }
}

fn default_collection() -> String {
    "remisiones".to_string()
}

fn default_chunk_size() -> usize {
    300
}

fn default_sample_size() -> usize {
    10
}

fn default_subcollection() -> String {
    "historial".to_string()
}

fn default_entry_status() -> String {
    "pendiente".to_string()
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

impl MigrationConfig {
    /// Check the engine settings, collecting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.migration;
        let mut problems = Vec::new();

        if !is_plain_name(&settings.collection) {
            problems.push(format!(
                "migration.collection `{}` must be a plain collection name",
                settings.collection
            ));
        }
        let prefix = settings.backup_prefix();
        if !is_plain_name(&prefix) || prefix == settings.collection {
            problems.push(format!(
                "migration.backup_prefix `{prefix}` must be a plain name distinct from the collection"
            ));
        }
        if !(1..=MAX_BATCH_WRITES).contains(&settings.chunk_size) {
            problems.push(format!(
                "migration.chunk_size must be between 1 and {MAX_BATCH_WRITES}, got {}",
                settings.chunk_size
            ));
        }
        if settings.sample_size == 0 {
            problems.push("migration.sample_size must be at least 1".to_string());
        }
        if !is_plain_name(&self.historial.subcollection) {
            problems.push(format!(
                "historial.subcollection `{}` must be a plain collection name",
                self.historial.subcollection
            ));
        }
        if self.historial.default_status.trim().is_empty() {
            problems.push("historial.default_status must not be blank".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}
