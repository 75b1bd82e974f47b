pub mod json;
pub mod terminal;

use crate::formatting::FormattingConfig;
use crate::migration::RunReport;
use std::io::Write;

pub use json::JsonWriter;
pub use terminal::TerminalWriter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

pub trait ReportWriter {
    fn write_report(&mut self, report: &RunReport) -> anyhow::Result<()>;
}

pub fn create_writer<'a, W: Write + 'a>(
    format: OutputFormat,
    writer: W,
    formatting: FormattingConfig,
) -> Box<dyn ReportWriter + 'a> {
    match format {
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer, formatting)),
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
    }
}

/// Render `report` to stdout.
pub fn output_report(
    report: &RunReport,
    format: OutputFormat,
    formatting: FormattingConfig,
) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut writer = create_writer(format, stdout.lock(), formatting);
    writer.write_report(report)
}
