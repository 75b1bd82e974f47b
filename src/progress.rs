//! Progress feedback for migration runs.
//!
//! Progress bars are built on `indicatif` and shown per stage (backup and
//! update chunks, historial seeding, restore).
//!
//! # Progress Behavior
//!
//! - **Quiet Mode**: No progress output (respects `REMISIONES_QUIET` and `--quiet`)
//! - **Non-TTY**: Bars are hidden in CI and piped output
//!
//! ```rust
//! use remisiones_migrate::progress::{BarProgressSink, ProgressConfig, ProgressSink};
//!
//! let sink = BarProgressSink::new(ProgressConfig::from_env(true, 0));
//! sink.start_stage("Migrating");
//! sink.report("Migrating", 1, 3);
//! sink.complete_stage("Migrating");
//! ```

pub mod implementations;
pub mod traits;

pub use implementations::{
    BarProgressSink, ProgressEvent, RecordingProgressSink, SilentProgressSink,
};
pub use traits::ProgressSink;

pub const ENV_QUIET: &str = "REMISIONES_QUIET";

pub const TEMPLATE_CHUNKS: &str = "📦 {msg} {pos}/{len} chunks ({percent}%) - {eta}";

/// Stage names reported by the engine.
pub mod stages {
    pub const MIGRATE: &str = "Migrating remisiones";
    pub const HISTORIAL: &str = "Seeding historial";
    pub const RESTORE: &str = "Restoring backup";
}

/// Configuration for progress display behavior
#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    pub quiet_mode: bool,
    /// 0 = bars only, 1+ = stage timing in the log
    pub verbosity: u8,
}

impl ProgressConfig {
    /// Create progress configuration from environment and CLI arguments
    pub fn from_env(quiet: bool, verbosity: u8) -> Self {
        let env_quiet = std::env::var_os(ENV_QUIET).is_some();
        Self {
            quiet_mode: quiet || env_quiet,
            verbosity,
        }
    }

    /// Determine if progress bars should be displayed
    pub fn should_show_progress(&self) -> bool {
        if self.quiet_mode {
            return false;
        }

        use std::io::IsTerminal;
        std::io::stderr().is_terminal()
    }
}
