use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn tincture() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tincture"));
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("TINCTURE_CONFIG");
    cmd
}

fn default_json() -> serde_json::Value {
    let output = tincture().arg("default").output().expect("run default");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("default theme json")
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

#[test]
fn default_theme_is_valid() {
    let tmp = TempDir::new().unwrap();
    let path = write(tmp.path(), "default.json", &default_json().to_string());

    tincture()
        .args(["validate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("valid (0 errors"));
}

#[test]
fn invalid_color_fails_validation() {
    let tmp = TempDir::new().unwrap();
    let mut theme = default_json();
    theme["colors"]["primary"]["50"] = "not-a-color".into();
    let path = write(tmp.path(), "broken.json", &theme.to_string());

    tincture()
        .arg("validate")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(contains("invalid"))
        .stdout(contains("colors.primary.50"));
}

#[test]
fn partial_document_reports_missing_sections() {
    let tmp = TempDir::new().unwrap();
    let path = write(tmp.path(), "partial.toml", "id = \"partial\"\nname = \"Partial\"\n");

    tincture()
        .args(["validate", "--json"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(contains("\"isValid\": false"))
        .stdout(contains("\"field\": \"gradients\""));
}

#[test]
fn strict_promotes_warnings() {
    let tmp = TempDir::new().unwrap();
    let mut theme = default_json();
    theme["metadata"]["version"] = "v1".into();
    let path = write(tmp.path(), "loose.json", &theme.to_string());

    tincture().arg("validate").arg(&path).assert().success();
    tincture()
        .args(["validate", "--strict"])
        .arg(&path)
        .assert()
        .code(1);
}

#[test]
fn vars_repairs_and_renders_root_block() {
    let tmp = TempDir::new().unwrap();
    let path = write(
        tmp.path(),
        "ocean.json",
        r##"{ "id": "ocean", "name": "Ocean", "colors": { "primary": { "50": "not-a-color" } } }"##,
    );

    tincture()
        .arg("vars")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(":root {"))
        .stdout(contains("--theme-colors-primary-50: #"))
        .stdout(contains("--theme-gradients-hero: linear-gradient("))
        .stdout(contains("not-a-color").not());
}

#[test]
fn config_prefix_is_used() {
    let tmp = TempDir::new().unwrap();
    let config = write(tmp.path(), "tincture.toml", "[variables]\nprefix = \"--app\"\n");
    let theme = write(tmp.path(), "t.json", r#"{ "id": "app", "name": "App" }"#);

    tincture()
        .arg("--config")
        .arg(&config)
        .arg("vars")
        .arg(&theme)
        .assert()
        .success()
        .stdout(contains("--app-colors-primary-500"));
}

#[test]
fn bad_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config = write(tmp.path(), "tincture.toml", "[cache]\nsweep_interval_ms = 0\n");

    tincture()
        .arg("--config")
        .arg(&config)
        .arg("default")
        .assert()
        .failure()
        .stderr(contains("failed to load config"));
}

#[test]
fn compress_then_decompress() {
    let tmp = TempDir::new().unwrap();
    let original = default_json();
    let path = write(tmp.path(), "default.json", &original.to_string());

    let packed = tincture().arg("compress").arg(&path).output().expect("compress");
    assert!(packed.status.success());
    let packed_json: serde_json::Value = serde_json::from_slice(&packed.stdout).unwrap();
    assert!(packed_json.get("c").is_some());
    assert!(packed_json.get("colors").is_none());

    let packed_path = write(tmp.path(), "packed.json", &String::from_utf8(packed.stdout).unwrap());
    let expanded = tincture().arg("decompress").arg(&packed_path).output().expect("decompress");
    assert!(expanded.status.success());
    let expanded_json: serde_json::Value = serde_json::from_slice(&expanded.stdout).unwrap();
    assert_eq!(expanded_json, original);
}

#[test]
fn score_prints_grade() {
    let tmp = TempDir::new().unwrap();
    let path = write(tmp.path(), "default.json", &default_json().to_string());

    tincture()
        .arg("score")
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("accessibility 100/100"))
        .stdout(contains("Excellent"));
}

#[test]
fn unsupported_extension_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = write(tmp.path(), "theme.txt", "{}");

    tincture()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("failed to read theme file"));
}

#[test]
fn list_reads_theme_directory() {
    let tmp = TempDir::new().unwrap();
    let mut theme = default_json();
    theme["id"] = "forest".into();
    theme["metadata"]["name"] = "Forest".into();
    write(tmp.path(), "forest.json", &theme.to_string());

    tincture()
        .arg("list")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(contains("Forest"));
}
