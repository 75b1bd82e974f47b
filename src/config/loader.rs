use std::fs;
use std::path::{Path, PathBuf};

use super::MigrationConfig;
use crate::errors::ConfigError;

pub const CONFIG_FILE_NAME: &str = ".remisiones-migrate.toml";
pub const ENV_PROJECT_ID: &str = "REMISIONES_PROJECT_ID";
pub const ENV_STORE_ROOT: &str = "REMISIONES_STORE_ROOT";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse configuration from TOML text.
pub fn parse_config(contents: &str, origin: &Path) -> Result<MigrationConfig, ConfigError> {
    toml::from_str::<MigrationConfig>(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })
}

fn read_config_file(path: &Path) -> Result<MigrationConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents, path)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Generate `start` and its parents, at most `max_depth` directories.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Nearest config file at or above `start`.
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Load configuration.
///
/// An explicit path must exist. Otherwise the nearest `.remisiones-migrate.toml`
/// above the working directory is used, falling back to defaults when none is
/// found. A config file that exists but does not parse is always an error.
/// Environment overrides are applied last.
pub fn load_config(explicit: Option<&Path>) -> Result<MigrationConfig, ConfigError> {
    let mut config = match explicit {
        Some(path) => read_config_file(path)?,
        None => load_discovered_config()?,
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn load_discovered_config() -> Result<MigrationConfig, ConfigError> {
    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!("Failed to get current directory: {e}. Using default config.");
            return Ok(MigrationConfig::default());
        }
    };

    match discover_config(&current) {
        Some(path) => read_config_file(&path),
        None => {
            log::debug!(
                "No {CONFIG_FILE_NAME} found after checking {MAX_TRAVERSAL_DEPTH} directories. Using default config."
            );
            Ok(MigrationConfig::default())
        }
    }
}

/// Overlay store settings from the environment.
///
/// `lookup` is `std::env::var` in production; blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut MigrationConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(project_id) = non_blank(ENV_PROJECT_ID) {
        log::debug!("{ENV_PROJECT_ID} overrides store.project_id");
        config.store.project_id = Some(project_id);
    }
    if let Some(root) = non_blank(ENV_STORE_ROOT) {
        log::debug!("{ENV_STORE_ROOT} overrides store.root");
        config.store.root = Some(PathBuf::from(root));
    }
}
