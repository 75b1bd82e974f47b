use anyhow::{Context, Result};
use clap::Parser;
use remisiones_migrate::cli::{setup, Cli};
use remisiones_migrate::config::load_config;
use remisiones_migrate::formatting::{create_formatter, FormattingConfig};
use remisiones_migrate::output::output_report;
use remisiones_migrate::progress::{BarProgressSink, ProgressConfig};
use remisiones_migrate::Migrator;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    // Usage errors exit 1; --help and --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    setup::init_logging(cli.verbosity);
    let formatting = formatting_config(&cli);

    match run(&cli, formatting) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let fmt = create_formatter(formatting);
            eprintln!("{} {}", fmt.emoji("❌", "[ERROR]"), fmt.error(&format!("{e:#}")));
            if let Some(resume) = e
                .downcast_ref::<remisiones_migrate::MigrationError>()
                .and_then(|e| e.resume_point())
            {
                eprintln!(
                    "{} Resume point: {} chunk(s) committed, {} record(s) processed; re-run to continue.",
                    fmt.emoji("💡", "[HINT]"),
                    resume.committed_chunks,
                    resume.records_processed
                );
            }
            ExitCode::FAILURE
        }
    }
}

fn formatting_config(cli: &Cli) -> FormattingConfig {
    if cli.plain {
        FormattingConfig::plain()
    } else {
        FormattingConfig::from_env()
    }
}

fn run(cli: &Cli, formatting: FormattingConfig) -> Result<()> {
    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let store = setup::open_store(&config)?;
    let progress = BarProgressSink::new(ProgressConfig::from_env(cli.quiet, cli.verbosity));
    let migrator = Migrator::new(config, store)?.with_progress(Arc::new(progress));

    let report = migrator.run(&cli.mode())?;
    output_report(&report, cli.format, formatting)
}
