use super::ReportWriter;
use crate::formatting::{create_formatter, FormattingConfig, OutputFormatter};
use crate::migration::{
    ApplySummary, DryRunReport, MigrationStatus, RestoreOutcome, RunReport, SamplePreview,
};
use crate::record::NumberedItem;
use serde_json::Value;
use std::io::Write;

pub struct TerminalWriter<W: Write> {
    writer: W,
    fmt: Box<dyn OutputFormatter>,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W, formatting: FormattingConfig) -> Self {
        Self {
            writer,
            fmt: create_formatter(formatting),
        }
    }

    fn write_dry_run(&mut self, report: &DryRunReport) -> anyhow::Result<()> {
        let title = format!(
            "{} DRY RUN - no changes will be written",
            self.fmt.emoji("🔍", "[DRY RUN]")
        );
        writeln!(self.writer, "{}", self.fmt.header(&title))?;
        writeln!(self.writer)?;

        if report.is_empty() {
            writeln!(
                self.writer,
                "{} No records found; nothing to migrate.",
                self.fmt.emoji("⚠️ ", "[WARN]")
            )?;
            return Ok(());
        }

        let summary = &report.summary;
        writeln!(
            self.writer,
            "{} {}",
            self.fmt.emoji("📊", "[STATS]"),
            self.fmt.bold(&format!(
                "Sample statistics ({} of {} records; totals cover the sample only)",
                summary.records_sampled, report.total_records
            ))
        )?;
        writeln!(self.writer, "   Services detected:    {}", summary.services_detected)?;
        writeln!(self.writer, "   Technicians detected: {}", summary.technicians_detected)?;
        writeln!(self.writer, "   Statuses changing:    {}", summary.statuses_changed)?;
        writeln!(self.writer)?;

        for (position, sample) in report.samples.iter().enumerate() {
            self.write_sample(position + 1, sample)?;
        }

        writeln!(
            self.writer,
            "{} To apply the migration, run with --apply{}",
            self.fmt.emoji("🚀", "[NEXT]"),
            if report.historial_requested {
                " --create-historial"
            } else {
                ""
            }
        )?;
        writeln!(
            self.writer,
            "{}",
            self.fmt
                .warning("Every record is backed up before it is modified.")
        )?;
        Ok(())
    }

    fn write_sample(&mut self, number: usize, sample: &SamplePreview) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "{}",
            self.fmt
                .info(&format!("--- Sample {number}: remisión {} ---", sample.id))
        )?;

        writeln!(self.writer, "{}", self.fmt.bold("BEFORE:"))?;
        for (key, value) in &sample.before.numbered {
            writeln!(self.writer, "  {key}: {}", render_value(value))?;
        }
        if let Some(estado) = &sample.before.estado {
            writeln!(self.writer, "  estado: {}", render_value(estado))?;
        }

        writeln!(self.writer, "{}", self.fmt.bold("AFTER:"))?;
        let after = &sample.after;
        if !after.services.is_empty() {
            writeln!(self.writer, "  services: {}", render_items(&after.services))?;
        }
        if !after.technicians.is_empty() {
            writeln!(self.writer, "  technicians: {}", render_items(&after.technicians))?;
        }
        if let Some(status) = &after.status {
            writeln!(self.writer, "  status: \"{status}\"")?;
        }
        writeln!(self.writer, "  migratedAt: {}", self.fmt.dim("[server timestamp]"))?;
        writeln!(self.writer, "  schemaVersion: \"{}\"", after.schema_version)?;
        if !after.superseded.is_empty() {
            writeln!(
                self.writer,
                "  {}",
                self.fmt
                    .dim(&format!("removed: {}", after.superseded.join(", ")))
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_apply(&mut self, summary: &ApplySummary) -> anyhow::Result<()> {
        let apply = &summary.apply;
        if apply.total_records == 0 {
            writeln!(
                self.writer,
                "{} No records found in `{}`; nothing to migrate.",
                self.fmt.emoji("⚠️ ", "[WARN]"),
                apply.collection
            )?;
        } else {
            writeln!(
                self.writer,
                "{} {}",
                self.fmt.emoji("✅", "[OK]"),
                self.fmt.success(&format!(
                    "Migrated {} record(s) of `{}` in {} chunk(s)",
                    apply.records_processed, apply.collection, apply.chunks_committed
                ))
            )?;
            writeln!(
                self.writer,
                "{} Backup saved in: {}",
                self.fmt.emoji("💾", "[BACKUP]"),
                self.fmt.bold(&apply.backup_collection)
            )?;
        }

        if let Some(historial) = &summary.historial {
            writeln!(
                self.writer,
                "{} Historial: {} entr{} written for {} remisión(es), {} skipped",
                self.fmt.emoji("📝", "[HISTORIAL]"),
                historial.entries_written,
                if historial.entries_written == 1 { "y" } else { "ies" },
                historial.parents_seeded,
                historial.parents_skipped
            )?;
        }
        Ok(())
    }

    fn write_status(&mut self, status: &MigrationStatus) -> anyhow::Result<()> {
        let title = format!(
            "{} Migration status of `{}`",
            self.fmt.emoji("📊", "[STATUS]"),
            status.collection
        );
        writeln!(self.writer, "{}", self.fmt.header(&title))?;
        writeln!(self.writer, "   Total:      {}", status.total)?;
        writeln!(self.writer, "   Legacy:     {}", status.legacy)?;
        writeln!(self.writer, "   Normalized: {}", status.normalized)?;
        writeln!(self.writer, "   Mixed:      {}", status.mixed)?;
        writeln!(self.writer, "   Other:      {}", status.other)?;

        if status.is_complete() {
            writeln!(self.writer, "{}", self.fmt.success("Nothing left to migrate."))?;
        } else {
            writeln!(
                self.writer,
                "{}",
                self.fmt.warning(&format!(
                    "{} record(s) still need migration.",
                    status.pending()
                ))
            )?;
        }
        if !status.mixed_ids.is_empty() {
            writeln!(
                self.writer,
                "   {}",
                self.fmt
                    .dim(&format!("mixed: {}", status.mixed_ids.join(", ")))
            )?;
        }
        Ok(())
    }

    fn write_restore(&mut self, outcome: &RestoreOutcome) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "{} {}",
            self.fmt.emoji("✅", "[OK]"),
            self.fmt.success(&format!(
                "Restored {} record(s) from `{}` onto `{}` in {} chunk(s)",
                outcome.records_restored,
                outcome.backup_collection,
                outcome.collection,
                outcome.chunks_committed
            ))
        )?;
        Ok(())
    }
}

impl<W: Write> ReportWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &RunReport) -> anyhow::Result<()> {
        match report {
            RunReport::DryRun(report) => self.write_dry_run(report),
            RunReport::Apply(summary) => self.write_apply(summary),
            RunReport::Status(status) => self.write_status(status),
            RunReport::Restore(outcome) => self.write_restore(outcome),
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

fn render_items(items: &[NumberedItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} (#{})", item.name, item.ordinal))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{preview, ApplyOutcome, SeedOutcome};
    use crate::record::{LegacyRecord, LegacyStatusPolicy};
    use serde_json::json;

    fn render(report: &RunReport) -> String {
        let mut buffer = Vec::new();
        TerminalWriter::new(&mut buffer, FormattingConfig::plain())
            .write_report(report)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_empty_dry_run_says_no_records() {
        let report = preview(&[], 10, LegacyStatusPolicy::Retain);
        let text = render(&RunReport::DryRun(report));
        assert!(text.contains("No records found"));
        assert!(!text.contains("Sample statistics"));
    }

    #[test]
    fn test_dry_run_marks_totals_as_sample_only() {
        let fields = json!({"servicio1": "Mantenimiento", "estado": "Pendiente"});
        let records = [LegacyRecord::from_fields("X1", fields.as_object().unwrap())];
        let mut report = preview(&records, 10, LegacyStatusPolicy::Retain);
        report.historial_requested = true;
        let text = render(&RunReport::DryRun(report));

        assert!(text.contains("1 of 1 records; totals cover the sample only"));
        assert!(text.contains("servicio1: \"Mantenimiento\""));
        assert!(text.contains("services: Mantenimiento (#1)"));
        assert!(text.contains("status: \"pendiente\""));
        assert!(text.contains("--apply --create-historial"));
        assert!(text.starts_with("[DRY RUN]"));
    }

    #[test]
    fn test_apply_summary_names_backup() {
        let text = render(&RunReport::Apply(ApplySummary {
            apply: ApplyOutcome {
                collection: "remisiones".into(),
                backup_collection: "remisiones_backup_20260101T000000".into(),
                chunks_committed: 3,
                records_processed: 650,
                total_records: 650,
            },
            historial: Some(SeedOutcome {
                parents_seeded: 2,
                entries_written: 3,
                parents_skipped: 0,
            }),
        }));
        assert!(text.contains("Migrated 650 record(s) of `remisiones` in 3 chunk(s)"));
        assert!(text.contains("remisiones_backup_20260101T000000"));
        assert!(text.contains("3 entries written for 2"));
    }
}
