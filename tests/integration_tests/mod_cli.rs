use nexus_bulk::cli::{Command, OutputMode, parse_conditions, run_with_format};
use nexus_bulk::engine::BulkEngine;
use nexus_bulk::errors::BulkError;
use nexus_bulk::store::MemoryStore;
use std::io::Write;
use std::process::Command as Process;
use tempfile::tempdir;

use super::common::{EMPLOYEES, employees};

#[tokio::test]
async fn preview_json_lists_matches() {
    let engine = BulkEngine::new(employees(4, 2));
    let mut out = Vec::new();
    let cmd = Command::Preview {
        collection: EMPLOYEES.into(),
        conditions: parse_conditions(&["company == BBB".into()]).unwrap(),
        limit: Some(1),
    };
    run_with_format(&engine, cmd, OutputMode::Json, &mut out).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["matched"], 2);
    assert_eq!(v["records"].as_array().unwrap().len(), 1);
    assert_eq!(v["records"][0]["id"], "ext-0000");
}

#[tokio::test]
async fn validate_reports_first_problem() {
    let engine = BulkEngine::new(MemoryStore::new());
    let mut out = Vec::new();
    let cmd = Command::Validate { conditions: parse_conditions(&["age >".into()]).unwrap() };
    let err = run_with_format(&engine, cmd, OutputMode::Plain, &mut out).await.unwrap_err();
    assert!(matches!(err, BulkError::Validation(m) if m.contains("requires a value")));
}

#[test]
fn binary_estimate_plain() {
    let out = Process::new(env!("CARGO_BIN_EXE_nexus-bulk"))
        .args(["estimate", "1200", "--batch-size", "500", "--plain"])
        .output()
        .expect("failed to run nexus-bulk");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "60900");
}

#[test]
fn binary_delete_rewrites_data_file_and_undo_restores() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("employees.ndjson");
    let undo = dir.path().join("undo.json");
    {
        let mut f = std::fs::File::create(&data).unwrap();
        writeln!(f, r#"{{"_id":"e1","company":"AAA","age":31}}"#).unwrap();
        writeln!(f, r#"{{"_id":"e2","company":"BBB","age":42}}"#).unwrap();
        writeln!(f, r#"{{"_id":"e3","company":"AAA","age":29}}"#).unwrap();
    }
    let bin = env!("CARGO_BIN_EXE_nexus-bulk");
    let data_arg = data.to_str().unwrap();
    let undo_arg = undo.to_str().unwrap();

    let out = Process::new(bin)
        .current_dir(dir.path())
        .args(["--data", data_arg, "--plain", "delete", "-c", "employees", "-w", "company == AAA"])
        .args(["--undo-file", undo_arg, "--yes", "--batch-size", "1"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("found=2 deleted=2 failed=0 batches=2"), "{text}");
    let remaining = std::fs::read_to_string(&data).unwrap();
    assert_eq!(remaining.lines().count(), 1);
    assert!(remaining.contains("\"e2\""));
    assert!(undo.exists());

    let out = Process::new(bin)
        .current_dir(dir.path())
        .args(["--data", data_arg, "--plain", "undo", "--undo-file", undo_arg])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "true");
    assert_eq!(std::fs::read_to_string(&data).unwrap().lines().count(), 3);
    assert!(!undo.exists());
}

#[test]
fn binary_failed_delete_drops_stale_undo_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("employees.ndjson");
    let undo = dir.path().join("undo.json");
    {
        let mut f = std::fs::File::create(&data).unwrap();
        writeln!(f, r#"{{"_id":"a1","company":"AAA"}}"#).unwrap();
        writeln!(f, r#"{{"_id":"b1","company":"BBB"}}"#).unwrap();
        for i in 0..600 {
            writeln!(f, r#"{{"_id":"c{i:03}","company":"CCC"}}"#).unwrap();
        }
    }
    let bin = env!("CARGO_BIN_EXE_nexus-bulk");
    let data_arg = data.to_str().unwrap();
    let undo_arg = undo.to_str().unwrap();
    let delete = |company: &str, extra: &[&str]| {
        Process::new(bin)
            .current_dir(dir.path())
            .args(["--data", data_arg, "--plain", "delete", "-c", "employees"])
            .args(["-w", &format!("company == {company}"), "--undo-file", undo_arg, "--yes"])
            .args(extra)
            .output()
            .unwrap()
    };

    let out = delete("AAA", &[]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(undo.exists());

    // one batch over the store limit: everything matched, nothing deleted
    let out = delete("CCC", &["--batch-size", "600", "--max-retries", "1", "--retry-delay-ms", "1"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("found=600 deleted=0 failed=600"), "{text}");
    assert!(!undo.exists());

    let out = Process::new(bin)
        .current_dir(dir.path())
        .args(["--data", data_arg, "--plain", "undo", "--undo-file", undo_arg])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "false");
    let remaining = std::fs::read_to_string(&data).unwrap();
    assert_eq!(remaining.lines().count(), 601);
    assert!(!remaining.contains("\"a1\""));
}

#[test]
fn binary_log_config_file_replaces_builtin_logging() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("custom.log");
    let cfg = dir.path().join("log4rs.yaml");
    std::fs::write(
        &cfg,
        format!(
            "appenders:\n  file:\n    kind: file\n    path: \"{}\"\nroot:\n  level: info\n  appenders:\n    - file\n",
            log.display()
        ),
    )
    .unwrap();
    let out = Process::new(env!("CARGO_BIN_EXE_nexus-bulk"))
        .current_dir(dir.path())
        .args(["--log-config", cfg.to_str().unwrap(), "--plain", "estimate", "10"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(log.exists());
    assert!(!dir.path().join("app.log").exists());
}
