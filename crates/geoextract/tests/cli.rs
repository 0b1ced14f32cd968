use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn geoextract() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("geoextract").into();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/karlsruhe")
        .join(name)
}

/// Writes a small location list and returns its path. The tempdir guard must
/// be kept alive.
fn locations_file() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("locations.json");
    fs::write(
        &path,
        r#"[
            {"name": "Schlossplatz", "city": "Karlsruhe"},
            {"name": "Kaiserstraße", "type": "street"}
        ]"#,
    )
    .unwrap();
    (tmp, path)
}

fn parse(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

// --- Binary startup ---

#[test]
fn binary_runs() {
    geoextract()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("geoextract"));
}

// --- Extract ---

#[test]
fn extract_from_stdin() {
    let (_tmp, locations) = locations_file();
    let output = geoextract()
        .args(["extract", "--locations"])
        .arg(&locations)
        .write_stdin("Wir treffen uns am Schlossplatz.")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        parse(&output),
        serde_json::json!([{"name": "Schlossplatz", "city": "Karlsruhe"}])
    );
}

#[test]
fn extract_dash_reads_stdin() {
    let (_tmp, locations) = locations_file();
    geoextract()
        .args(["extract", "-", "-l"])
        .arg(&locations)
        .write_stdin("nothing to see here")
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn extract_demo_file() {
    let output = geoextract()
        .arg("extract")
        .arg(demo("sample_input.txt"))
        .arg("--locations")
        .arg(demo("locations.json"))
        .arg("--config")
        .arg(demo("config.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let records = parse(&output);
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.contains(&serde_json::json!({
        "street": "Kaiserstraße",
        "house_number": "3"
    })));
}

#[test]
fn extract_pretty() {
    let (_tmp, locations) = locations_file();
    geoextract()
        .args(["extract", "--pretty", "--locations"])
        .arg(&locations)
        .write_stdin("Schlossplatz")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[\n  {"));
}

#[test]
fn extract_missing_locations_fails() {
    geoextract()
        .args(["extract", "--locations", "/nonexistent/locations.json"])
        .write_stdin("text")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to load locations"));
}

#[test]
fn extract_invalid_config_fails() {
    let (tmp, locations) = locations_file();
    let config = tmp.path().join("config.json");
    fs::write(
        &config,
        r#"{"extractors": [{"kind": "pattern", "patterns": ["(?P<street>"]}]}"#,
    )
    .unwrap();
    geoextract()
        .args(["extract", "--locations"])
        .arg(&locations)
        .arg("--config")
        .arg(&config)
        .write_stdin("text")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid pipeline configuration"));
}

#[test]
fn extract_requires_locations() {
    geoextract()
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--locations"));
}

// --- Names ---

#[test]
fn names_lists_normalized_and_canonical() {
    let (_tmp, locations) = locations_file();
    geoextract()
        .args(["names", "--field", "street", "--locations"])
        .arg(&locations)
        .assert()
        .success()
        .stdout("kaiserstraße\tKaiserstraße\n");
}

#[test]
fn names_defaults_to_name_field() {
    let (_tmp, locations) = locations_file();
    geoextract()
        .args(["names", "--locations"])
        .arg(&locations)
        .assert()
        .success()
        .stdout("schlossplatz\tSchlossplatz\n");
}

#[test]
fn names_unknown_field_is_empty() {
    let (_tmp, locations) = locations_file();
    geoextract()
        .args(["names", "--field", "postcode", "--locations"])
        .arg(&locations)
        .assert()
        .success()
        .stdout("");
}
