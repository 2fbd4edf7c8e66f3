//! CLI regression tests for the `sioapi` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes and output formats, which the library tests can't see.
//!
//! Run with: `cargo test -p sioapi-test`
//! Requires the `sioapi` binary to be built first (`cargo build -p sioapi`).

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `sioapi` binary.
fn sioapi() -> Command {
    // cargo_bin is deprecated for custom build-dir setups; fine for standard workspace use.
    #[allow(deprecated)]
    Command::cargo_bin("sioapi").expect("sioapi binary not found, run `cargo build -p sioapi` first")
}

/// Absolute path to the shared test fixtures directory.
fn fixtures() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/sioapi-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .join("tests/fixtures")
}

fn json_stdout(cmd: &mut Command, success: bool) -> serde_json::Value {
    let assert = cmd.assert();
    let assert = if success {
        assert.success()
    } else {
        assert.failure().code(1)
    };
    let s = String::from_utf8(assert.get_output().stdout.clone())
        .expect("stdout should be valid UTF-8");
    serde_json::from_str(&s).expect("stdout should be valid JSON")
}

// ---------------------------------------------------------------------------
// sioapi check
// ---------------------------------------------------------------------------

#[test]
fn check_valid_document_exits_zero() {
    sioapi()
        .args(["check", "--spec"])
        .arg(fixtures().join("downloader.yaml"))
        .assert()
        .success()
        .stderr(contains("is valid (Downloader API: 2 publish, 1 subscribe, 4 schema(s))"))
        .stderr(contains("checked 1 document(s): 1 valid, 0 invalid"));
}

#[test]
fn check_missing_file_exits_one() {
    sioapi()
        .args(["check", "--spec", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2000"));
}

#[test]
fn check_parse_error_exits_one() {
    sioapi()
        .args(["check", "--spec"])
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2006"));
}

#[test]
fn check_unresolved_ref_exits_one() {
    sioapi()
        .args(["check", "--spec"])
        .arg(fixtures().join("invalid-unresolved-ref.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2003"))
        .stderr(contains("#/components/schemas/DownloaderQueue"));
}

#[test]
fn check_message_referenced_twice_exits_one() {
    sioapi()
        .args(["check", "--spec"])
        .arg(fixtures().join("invalid-duplicate-reference.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2005"))
        .stderr(contains("'Download_File' is referenced 2 time(s)"));
}

#[test]
fn check_unsupported_version_exits_one() {
    sioapi()
        .args(["check", "--spec"])
        .arg(fixtures().join("invalid-unsupported-version.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2007"));
}

#[test]
fn check_several_documents_reports_each() {
    sioapi()
        .args(["check", "--spec"])
        .arg(fixtures().join("downloader.yaml"))
        .arg("--spec")
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("checked 2 document(s): 1 valid, 1 invalid"));
}

#[test]
fn check_json_format_outputs_valid_json() {
    let v = json_stdout(
        sioapi()
            .args(["check", "--spec"])
            .arg(fixtures().join("downloader.yaml"))
            .args(["--format", "json"]),
        true,
    );

    assert_eq!(v["summary"]["total"], 1);
    assert_eq!(v["summary"]["valid"], 1);
    let result = &v["results"][0];
    assert_eq!(result["valid"], true);
    assert_eq!(result["summary"]["title"], "Downloader API");
    assert_eq!(result["summary"]["publish"], 2);
}

#[test]
fn check_json_format_invalid_document_exits_one_with_json() {
    let v = json_stdout(
        sioapi()
            .args(["check", "--spec"])
            .arg(fixtures().join("invalid-unresolved-ref.yaml"))
            .args(["--format", "json"]),
        false,
    );

    let results = v["results"].as_array().expect("results should be an array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["valid"], false);
    assert_eq!(results[0]["errors"][0]["code"], "E2003");
    assert!(results[0].get("summary").is_none());
}

#[test]
fn check_requires_spec_flag() {
    // clap returns exit code 2 for missing required args
    sioapi().arg("check").assert().failure().code(2);
}

// ---------------------------------------------------------------------------
// sioapi convert
// ---------------------------------------------------------------------------

#[test]
fn convert_yaml_to_json_on_stdout() {
    let v = json_stdout(
        sioapi()
            .args(["convert", "--spec"])
            .arg(fixtures().join("downloader.yaml"))
            .args(["--to", "json"]),
        true,
    );

    assert_eq!(v["asyncapi"], "2.5.0");
    assert_eq!(
        v["components"]["messages"]["Download_File"]["x-ack"]["data"]["$ref"],
        "#/components/schemas/DownloadAccepted"
    );
    assert_eq!(
        v["channels"]["/"]["subscribe"]["message"]["oneOf"][0]["$ref"],
        "#/components/messages/current_list"
    );
}

#[test]
fn convert_writes_output_file() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("downloader.json");

    sioapi()
        .args(["convert", "--spec"])
        .arg(fixtures().join("downloader.yaml"))
        .args(["--to", "json", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stderr(contains("wrote"));

    // the converted file passes the checker too
    sioapi()
        .args(["check", "--spec"])
        .arg(&out)
        .assert()
        .success();
}

#[test]
fn convert_guesses_format_from_output_name() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("downloader.json");

    sioapi()
        .args(["convert", "--spec"])
        .arg(fixtures().join("downloader.yaml"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let text = std::fs::read_to_string(&out).expect("read output");
    let v: serde_json::Value = serde_json::from_str(&text).expect("output should be JSON");
    assert_eq!(v["info"]["title"], "Downloader API");
}

#[test]
fn convert_defaults_to_yaml_on_stdout() {
    sioapi()
        .args(["convert", "--spec"])
        .arg(fixtures().join("downloader.yaml"))
        .assert()
        .success()
        .stdout(contains("asyncapi: 2.5.0"));
}

#[test]
fn convert_unknown_format_exits_one() {
    sioapi()
        .args(["convert", "--spec"])
        .arg(fixtures().join("downloader.yaml"))
        .args(["--to", "toml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2007"));
}

#[test]
fn convert_missing_file_exits_one() {
    sioapi()
        .args(["convert", "--spec", "nonexistent.yaml", "--to", "json"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("document not found"));
}

// ---------------------------------------------------------------------------
// sioapi init
// ---------------------------------------------------------------------------

#[test]
fn init_prints_default_document() {
    sioapi()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("asyncapi: 2.5.0"))
        .stdout(contains("title: Demo Chat API"))
        .stdout(contains("NoSpec"));
}

#[test]
fn init_json_with_custom_server() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("api.json");

    sioapi()
        .args([
            "init",
            "--title",
            "Downloader API",
            "--server-url",
            "http://downloader:5000",
            "--server-name",
            "DOWNLOADER_BACKEND",
            "--to",
            "json",
            "--output",
        ])
        .arg(&out)
        .assert()
        .success();

    let text = std::fs::read_to_string(&out).expect("read output");
    let v: serde_json::Value = serde_json::from_str(&text).expect("output should be JSON");
    assert_eq!(v["info"]["title"], "Downloader API");
    assert_eq!(
        v["servers"]["DOWNLOADER_BACKEND"]["url"],
        "http://downloader:5000"
    );
    assert_eq!(v["servers"]["DOWNLOADER_BACKEND"]["protocol"], "socketio");

    sioapi()
        .args(["check", "--spec"])
        .arg(&out)
        .assert()
        .success()
        .stderr(contains("0 publish, 0 subscribe, 1 schema(s)"));
}

#[test]
fn invalid_log_format_exits_two() {
    sioapi()
        .args(["--log-format", "xml", "init"])
        .assert()
        .failure()
        .code(2);
}
