//! Integration tests for command mode (-c) and batch mode (--fields/--records)

use std::path::PathBuf;
use std::process::Command;

use serde_json::json;

fn run_command(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_gridbase"))
        // Tests must be deterministic and not depend on a user's config.toml.
        .arg("--no-config")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn data_file(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "data", name]
        .iter()
        .collect();
    path.to_string_lossy().to_string()
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-c", "2 + 3 * 4"]);
    assert_eq!(stdout.trim(), "14");
    assert_eq!(code, 0);
}

#[test]
fn test_parentheses() {
    let (stdout, _, code) = run_command(&["-c", "(2+3)*4"]);
    assert_eq!(stdout.trim(), "20");
    assert_eq!(code, 0);
}

#[test]
fn test_string_functions() {
    let (stdout, _, code) = run_command(&["-c", "CONCAT(UPPER(\"abc\"), LEFT(\"hello\", 3))"]);
    assert_eq!(stdout.trim(), "ABChel");
    assert_eq!(code, 0);
}

#[test]
fn test_field_values() {
    let (stdout, _, code) = run_command(&[
        "-c",
        "IF({Number} > 5, {Name} & \"!\", \"small\")",
        "--field",
        "Number=10",
        "--field",
        "Name=Ada",
    ]);
    assert_eq!(stdout.trim(), "Ada!");
    assert_eq!(code, 0);
}

#[test]
fn test_boolean_output() {
    let (stdout, _, code) = run_command(&["-c", "AND(true, NOT(false))"]);
    assert_eq!(stdout.trim(), "TRUE");
    assert_eq!(code, 0);
}

#[test]
fn test_empty_result() {
    let (stdout, _, code) = run_command(&["-c", "\"\""]);
    assert_eq!(stdout.trim(), "");
    assert_eq!(code, 0);
}

#[test]
fn test_division_by_zero() {
    let (stdout, stderr, code) = run_command(&["-c", "10/0"]);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("Error:"));
    assert_eq!(code, 1);
}

#[test]
fn test_unknown_function() {
    let (_, stderr, code) = run_command(&["-c", "undefined_function()"]);
    assert!(stderr.contains("UNDEFINED_FUNCTION") || stderr.contains("undefined_function"));
    assert_eq!(code, 1);
}

#[test]
fn test_missing_field() {
    let (_, stderr, code) = run_command(&["-c", "{Nope} + 1"]);
    assert!(stderr.contains("Nope"));
    assert_eq!(code, 1);
}

#[test]
fn test_usage_errors() {
    let (_, stderr, code) = run_command(&["--bogus"]);
    assert!(stderr.contains("Unknown option"));
    assert_eq!(code, 1);

    let (_, _, code) = run_command(&[]);
    assert_eq!(code, 1);

    let (_, stderr, code) = run_command(&["--help"]);
    assert!(stderr.contains("Usage"));
    assert_eq!(code, 0);
}

#[test]
fn test_batch_mode() {
    let fields = data_file("fields.json");
    let records = data_file("records.json");
    let linked = data_file("linked.json");
    let (stdout, stderr, code) = run_command(&[
        "--fields", &fields, "--records", &records, "--linked", &linked,
    ]);
    assert_eq!(code, 0, "stderr: {stderr}");

    let out: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let first = &out[0]["data"];
    assert_eq!(first["0b5c8f8e-3c1a-4c55-9d0e-5a1f7a9e0003"], json!("x3"));
    assert_eq!(first["0b5c8f8e-3c1a-4c55-9d0e-5a1f7a9e0004"], json!(["Bolt", "Nut"]));
    assert_eq!(first["0b5c8f8e-3c1a-4c55-9d0e-5a1f7a9e0005"], json!(6.5));
    assert_eq!(first["0b5c8f8e-3c1a-4c55-9d0e-5a1f7a9e0006"], json!(null));

    let second = &out[1]["data"];
    assert_eq!(second["0b5c8f8e-3c1a-4c55-9d0e-5a1f7a9e0004"], json!("Nut"));
    assert_eq!(second["0b5c8f8e-3c1a-4c55-9d0e-5a1f7a9e0005"], json!(4));
    assert_eq!(second["0b5c8f8e-3c1a-4c55-9d0e-5a1f7a9e0001"], json!(1));
}

#[test]
fn test_batch_output_file() {
    use std::fs;

    let output_file = std::env::temp_dir().join("gridbase_test_batch.json");
    let output = output_file.to_string_lossy().to_string();
    let fields = data_file("fields.json");
    let records = data_file("records.json");

    let (_, stderr, code) =
        run_command(&["--fields", &fields, "--records", &records, "-o", &output]);
    assert_eq!(code, 0);
    assert!(stderr.contains("Records written to"));

    // Without --linked every lookup has nothing to fetch.
    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output_file).unwrap()).unwrap();
    assert_eq!(
        content[0]["data"]["0b5c8f8e-3c1a-4c55-9d0e-5a1f7a9e0004"],
        json!([])
    );
    assert_eq!(
        content[1]["data"]["0b5c8f8e-3c1a-4c55-9d0e-5a1f7a9e0004"],
        json!([])
    );

    fs::remove_file(output_file).ok();
}

#[test]
fn test_batch_missing_file() {
    let (_, stderr, code) = run_command(&["--fields", "/nonexistent.json", "--records", "/nonexistent.json"]);
    assert!(stderr.contains("Failed to read"));
    assert_eq!(code, 1);
}
