//! CLI integration tests driving the compiled `pagedex` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn pagedex_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pagedex");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_content = format!(
        r#"[store]
path = "{}/data/pagedex.sqlite"
default_collection = "scraped_content"
"#,
        root.display()
    );

    let config_path = root.join("pagedex.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_pagedex(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = pagedex_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pagedex binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_list_on_fresh_store() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pagedex(&config_path, &["list"]);
    assert!(success, "list failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No collections found"));
}

#[test]
fn test_query_missing_collection_is_not_an_error() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_pagedex(&config_path, &["query", "anything"]);
    assert!(success, "query against a missing collection should exit 0");
    assert!(stdout.contains("Collection 'scraped_content' does not exist"));
}

#[test]
fn test_query_rejects_out_of_range_limit() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_pagedex(&config_path, &["query", "anything", "--limit", "21"]);
    assert!(!success);
    assert!(stderr.contains("limit must be between 1 and 20"));
}

#[test]
fn test_process_without_text_fields() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_pagedex(&config_path, &["process", r#"{"count": 3}"#]);
    assert!(success);
    assert!(stdout.contains("No text fields found for embedding"));
}

#[test]
fn test_process_with_text_fields_requires_provider() {
    let (_tmp, config_path) = setup_test_env();

    // The default provider is "disabled", so embedding a text field fails
    // with a clear message and a non-zero exit code.
    let (_, stderr, success) =
        run_pagedex(&config_path, &["process", r#"{"title": "A page"}"#]);
    assert!(!success);
    assert!(stderr.contains("disabled"));
}

#[test]
fn test_invalid_json_input_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_pagedex(&config_path, &["process", "not json at all"]);
    assert!(!success);
    assert!(stderr.contains("neither a readable file nor valid JSON"));
}
