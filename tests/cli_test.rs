mod common;

use assert_cmd::Command;
use common::*;
use indoc::formatdoc;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn cli(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_remisiones-migrate"));
    cmd.current_dir(cwd)
        .env_remove("REMISIONES_PROJECT_ID")
        .env_remove("REMISIONES_STORE_ROOT")
        .env_remove("REMISIONES_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--plain")
        .arg("--quiet");
    cmd
}

/// A temp workspace with a `demo` project holding `documents` and a config
/// file pointing at it.
fn workspace(documents: &[remisiones_migrate::Document]) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let snapshots = dir.path().join("snapshots");
    write_collection(&snapshots.join("demo"), COLLECTION, documents);

    let config_path = dir.path().join("migrate.toml");
    std::fs::write(
        &config_path,
        formatdoc! {r#"
            [store]
            project_id = "demo"
            root = "{root}"

            [retry]
            enabled = false
        "#, root = snapshots.display()},
    )
    .unwrap();
    (dir, config_path)
}

#[test]
fn test_help_exits_zero() {
    let dir = TempDir::new().unwrap();
    let output = cli(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--apply"));
    assert!(stdout.contains("--create-historial"));
}

#[test]
fn test_conflicting_modes_exit_one() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["--dry-run", "--apply"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_project_id_exits_one() {
    let dir = TempDir::new().unwrap();
    let output = cli(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[ERROR]"), "stderr: {stderr}");
    assert!(stderr.contains("project_id"), "stderr: {stderr}");
}

#[test]
fn test_dry_run_leaves_snapshot_untouched() {
    let (dir, config) = workspace(&[x1()]);
    let project = dir.path().join("snapshots/demo");
    let before = std::fs::read_to_string(project.join("remisiones.json")).unwrap();

    let output = cli(dir.path())
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[DRY RUN]"));
    assert!(stdout.contains("Mantenimiento (#1)"));
    assert!(stdout.contains("run with --apply"));

    let after = std::fs::read_to_string(project.join("remisiones.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_apply_migrates_file_store() {
    let (dir, config) = workspace(&[x1()]);
    let project = dir.path().join("snapshots/demo");

    let output = cli(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--apply", "--create-historial"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Migrated 1 record(s)"));
    assert!(stdout.contains("Backup saved in: remisiones_backup_"));
    assert!(stdout.contains("Historial: 1 entry written"));

    let live = read_collection(&project, COLLECTION);
    let x1 = live["X1"].as_object().unwrap();
    assert_eq!(x1["schemaVersion"], json!("2.0"));
    assert_eq!(x1["status"], json!("pendiente"));
    assert!(!x1.contains_key("servicio1"));

    let backups: Vec<_> = std::fs::read_dir(&project)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("remisiones_backup_"))
        .collect();
    assert_eq!(backups.len(), 1);

    let historial = read_collection(&project.join("remisiones/X1"), "historial");
    assert!(historial.contains_key("migracion-inicial-1"));
}

#[test]
fn test_status_as_json() {
    let (dir, config) = workspace(&[x1()]);

    let output = cli(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--status", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["mode"], json!("status"));
    assert_eq!(report["legacy"], json!(1));
    assert_eq!(report["normalized"], json!(0));
}

#[test]
fn test_invalid_chunk_size_is_rejected() {
    let (dir, config) = workspace(&[x1()]);
    let output = cli(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--apply", "--chunk-size", "501"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let live = read_collection(&dir.path().join("snapshots/demo"), COLLECTION);
    assert!(live["X1"].as_object().unwrap().contains_key("servicio1"));
}
