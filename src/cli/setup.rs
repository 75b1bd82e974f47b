//! Runtime setup for the CLI: logging and the document store.

use crate::config::MigrationConfig;
use crate::store::FileStore;
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Default log filter for a `-v` count.
pub fn default_log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins over `-v`. Records from the `log` facade are bridged into
/// the subscriber. Installing twice is harmless.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbosity)));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("Note: logging already configured: {e}");
    }
}

/// Open the file store of the configured project.
///
/// Fails before any document is read when the project id or snapshot root is
/// missing.
pub fn open_store(config: &MigrationConfig) -> Result<FileStore> {
    let root = config.store.project_root()?;
    log::info!("Using snapshot at {}", root.display());
    FileStore::open(&root).with_context(|| format!("opening snapshot at {}", root.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_levels() {
        assert_eq!(default_log_level(0), "warn");
        assert_eq!(default_log_level(1), "info");
        assert_eq!(default_log_level(2), "debug");
        assert_eq!(default_log_level(9), "trace");
    }

    #[test]
    fn test_open_store_requires_project() {
        assert!(open_store(&MigrationConfig::default()).is_err());
    }

    #[test]
    fn test_open_store_uses_project_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("demo")).unwrap();
        let mut config = MigrationConfig::default();
        config.store.project_id = Some("demo".into());
        config.store.root = Some(dir.path().to_path_buf());

        let store = open_store(&config).unwrap();
        assert_eq!(store.root(), dir.path().join("demo"));
    }
}
