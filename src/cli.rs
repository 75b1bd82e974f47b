pub mod setup;

use crate::config::MigrationConfig;
use crate::migration::Mode;
use crate::output::OutputFormat;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "remisiones-migrate")]
#[command(
    about = "Migrate legacy remisión documents to the normalized schema",
    long_about = "Migrate legacy remisión documents (servicio1..20, tecnico1..10, estado) to \
                  the normalized schema (services, technicians, status, schemaVersion).\n\n\
                  Runs a dry run unless --apply is given. Every apply backs up each record \
                  into a per-run backup collection before modifying it."
)]
#[command(version)]
#[command(group(
    ArgGroup::new("mode")
        .args(["dry_run", "apply", "status", "restore"])
        .multiple(false)
))]
pub struct Cli {
    /// Preview the first records' transformation without writing (default)
    #[arg(long)]
    pub dry_run: bool,

    /// Back up and migrate every record
    #[arg(long)]
    pub apply: bool,

    /// After --apply, seed initial historial entries per service
    #[arg(long, conflicts_with_all = ["status", "restore"])]
    pub create_historial: bool,

    /// Report how many records are legacy, normalized or mixed
    #[arg(long)]
    pub status: bool,

    /// Replace live documents with those of a backup collection
    #[arg(long, value_name = "BACKUP_COLLECTION")]
    pub restore: Option<String>,

    /// Configuration file (defaults to the nearest .remisiones-migrate.toml)
    #[arg(long, value_name = "PATH", env = "REMISIONES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Records previewed by a dry run
    #[arg(long, value_name = "N")]
    pub sample_size: Option<usize>,

    /// Records per backup/update batch pair (1-500)
    #[arg(long, value_name = "N")]
    pub chunk_size: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// Plain output: no colors, no emoji
    #[arg(long)]
    pub plain: bool,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.apply {
            Mode::Apply {
                create_historial: self.create_historial,
            }
        } else if self.status {
            Mode::Status
        } else if let Some(backup_collection) = &self.restore {
            Mode::Restore {
                backup_collection: backup_collection.clone(),
            }
        } else {
            Mode::DryRun {
                create_historial: self.create_historial,
            }
        }
    }

    /// Apply command-line overrides on top of file and environment settings.
    pub fn apply_overrides(&self, config: &mut MigrationConfig) {
        if let Some(sample_size) = self.sample_size {
            config.migration.sample_size = sample_size;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.migration.chunk_size = chunk_size;
        }
    }
}
