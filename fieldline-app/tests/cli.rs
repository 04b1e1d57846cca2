use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn fieldline() -> Command {
    let mut cmd = Command::cargo_bin("fieldline").expect("binary should be built");
    cmd.env_remove("FIELDLINE_CONFIG")
        .env_remove("FIELDLINE_TEMPLATE_PATH")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn json_output_contains_projected_elements() {
    fieldline()
        .args([
            "--sport",
            "soccer_11v11",
            "--width",
            "64",
            "--length",
            "100",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"element_id\": \"center_circle\""))
        .stdout(predicate::str::contains("\"kind\": \"arc\""));
}

#[test]
fn text_output_uses_template_defaults() {
    fieldline()
        .args(["--sport", "soccer_7v7", "--rotation", "-90"])
        .assert()
        .success()
        .stdout(predicate::str::contains("宽 36.00 m × 长 55.00 m"))
        .stdout(predicate::str::contains("旋转 270.00°"));
}

#[test]
fn out_of_range_length_fails() {
    fieldline()
        .args(["--sport", "soccer_11v11", "--length", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("length"));
}

#[test]
fn unknown_sport_fails() {
    fieldline()
        .args(["--sport", "curling"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("curling"));
}

#[test]
fn validate_builtin_template_succeeds() {
    fieldline()
        .args(["--sport", "soccer_11v11", "--validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("未发现问题"));
}

#[test]
fn validate_broken_template_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        r#"{
            "sport": "broken",
            "minLength": 10, "maxLength": 20,
            "minWidth": 5, "maxWidth": 10,
            "defaultLength": 25, "defaultWidth": 8,
            "elements": [
                { "id": "edge", "type": "line",
                  "start": { "x": 0, "y": 0 },
                  "end": { "x": "field_width *", "y": 0 } }
            ],
            "fixedElements": ["ghost"],
            "specifications": {}
        }"#,
    )
    .unwrap();

    fieldline()
        .arg("--template")
        .arg(&path)
        .arg("--validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("ghost"))
        .stdout(predicate::str::contains("edge"));
}

#[test]
fn config_file_supplies_render_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldline.toml");
    fs::write(
        &path,
        "[render]\nscale_pixels_per_meter = 2.0\nline_color = \"#00ff00\"\noutput_format = \"json\"\n\n[templates]\ndefault_sport = \"soccer_7v7\"\n",
    )
    .unwrap();

    fieldline()
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sport\": \"soccer_7v7\""))
        .stdout(predicate::str::contains("\"lineColor\": \"#00ff00\""))
        .stdout(predicate::str::contains("\"scalePixelsPerMeter\": 2.0"));
}

#[test]
fn unreadable_config_falls_back_with_a_visible_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[render]\nscale_pixels_per_meter = \"wide\"\n").unwrap();

    fieldline()
        .arg("--config")
        .arg(&path)
        .args(["--sport", "soccer_7v7", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"scalePixelsPerMeter\": 10.0"))
        .stderr(predicate::str::contains("加载指定配置失败，使用默认配置"))
        .stderr(predicate::str::contains("broken.toml"));
}
