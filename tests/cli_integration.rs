//! CLI integration tests
//!
//! These run the built binary against temporary store and blob directories.
//! Only step 1 is run end to end since it needs no LLM.

mod support;

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use support::{analysis_json, get_estimator_binary, pdf_bytes};
use tempfile::TempDir;

/// A command isolated from the caller's `ESTIMATOR_*` settings.
fn estimator(data_dir: &Path) -> Command {
    let mut cmd = Command::new(get_estimator_binary());
    for var in [
        "ESTIMATOR_PROVIDER",
        "ESTIMATOR_MODEL",
        "ESTIMATOR_RENDER_URL",
        "ESTIMATOR_COLLECTION",
        "ESTIMATOR_LOG_LEVEL",
        "ESTIMATOR_EXCHANGE_LOG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("ESTIMATOR_STORE_DIR", data_dir.join("store"))
        .env("ESTIMATOR_BLOB_DIR", data_dir.join("blobs"));
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("Failed to execute blueprint-estimator")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn init_job(dir: &TempDir) {
    let analysis = dir.path().join("analysis.json");
    fs::write(&analysis, analysis_json().to_string()).unwrap();
    let pdf = dir.path().join("drawing.pdf");
    fs::write(&pdf, pdf_bytes()).unwrap();

    let output = run(estimator(dir.path()).args([
        "init",
        "--document",
        "job-1",
        "--pdf",
        "blueprints/job-1.pdf",
        "--organization",
        "org-42",
    ])
    .arg("--analysis")
    .arg(&analysis)
    .arg("--upload")
    .arg(&pdf));
    assert!(
        output.status.success(),
        "init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = run(estimator(dir.path()).arg("--help"));

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("blueprint-estimator"));
    for command in ["init", "run", "status", "output", "price", "config"] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    let output = run(estimator(dir.path()).arg("--version"));
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_price_json() {
    let dir = TempDir::new().unwrap();
    let output = run(estimator(dir.path()).args([
        "price",
        "--name",
        "フレーム",
        "--category",
        "金属部品",
        "--format",
        "json",
    ]));

    assert!(output.status.success());
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["estimate"]["price"], 1500);
    assert_eq!(value["estimate"]["part_type"], "フレーム");
}

#[test]
fn test_price_human() {
    let dir = TempDir::new().unwrap();
    let output = run(estimator(dir.path()).args([
        "price",
        "--name",
        "アクリル板",
        "--category",
        "ガラス・アクリル",
        "--material",
        "厚い",
    ]));

    assert!(output.status.success());
    assert!(stdout(&output).contains("\u{00A5}6000"));
}

#[test]
fn test_invalid_provider_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = run(estimator(dir.path()).args([
        "run", "--step", "2", "--document", "job-1", "--provider", "skynet",
    ]));
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid provider"));
}

#[test]
fn test_run_unknown_document() {
    let dir = TempDir::new().unwrap();
    let output = run(estimator(dir.path()).args([
        "run", "--step", "1", "--document", "ghost", "--format", "json",
    ]));

    assert_eq!(output.status.code(), Some(1));
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["status"], "error");
    assert_eq!(value["error_kind"], "document_not_found");
}

#[test]
fn test_init_run_status_output() {
    let dir = TempDir::new().unwrap();
    init_job(&dir);

    let output = run(estimator(dir.path()).args([
        "run", "--step", "1", "--document", "job-1", "--format", "json",
    ]));
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let result: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["status"], "success");
    assert_eq!(result["next_step"], 2);

    let output = run(estimator(dir.path()).args(["status", "--document", "job-1", "--format", "json"]));
    assert!(output.status.success());
    let status: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(status["current_step"], 1);
    assert_eq!(status["all_process_completed"], false);

    let output = run(estimator(dir.path()).args(["output", "--step", "1", "--document", "job-1"]));
    assert!(output.status.success());
    let step1: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(step1["pdf_download_test"]["validation_results"]["estimated_pages"], 2);

    // Step 2 has not run.
    let output = run(estimator(dir.path()).args(["output", "--step", "2", "--document", "job-1"]));
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("step2_output"));
}

#[test]
fn test_step4_on_fresh_job() {
    let dir = TempDir::new().unwrap();
    init_job(&dir);

    let output = run(estimator(dir.path()).args([
        "run", "--step", "4", "--document", "job-1", "--format", "json",
    ]));
    assert_eq!(output.status.code(), Some(1));
    let result: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["error_kind"], "missing_predecessor");
}

#[test]
fn test_config_json() {
    let dir = TempDir::new().unwrap();
    let output = run(estimator(dir.path()).args(["config", "--format", "json"]));
    assert!(output.status.success());
    let config: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(config["collection"], "agent_job");
    assert!(config["store_dir"].as_str().unwrap().ends_with("store"));
}
