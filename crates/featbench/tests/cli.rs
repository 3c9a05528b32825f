use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;
use serde_json::Value;

fn write_scene(path: &std::path::Path) {
    let img = GrayImage::from_fn(120, 100, |x, y| {
        let a = (20..50).contains(&x) && (20..48).contains(&y);
        let b = (64..100).contains(&x) && (40..80).contains(&y);
        Luma([if a {
            230
        } else if b {
            140
        } else {
            15
        }])
    });
    img.save(path).unwrap();
}

#[test]
fn runs_a_config_and_writes_the_report() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(&dir.path().join("scene.png"));
    let config = dir.path().join("bench.json");
    std::fs::write(
        &config,
        r#"{
            "image_path": "scene.png",
            "transforms": [
                { "kind": "rotation", "range": { "start": 0, "end": 10, "step": 10 } },
                { "kind": "gaussian_blur", "max_kernel_size": 3 }
            ]
        }"#,
    )
    .unwrap();
    let report = dir.path().join("report.json");

    Command::cargo_bin("featbench")
        .unwrap()
        .arg(&config)
        .arg("--output")
        .arg(&report)
        .args(["--log-level", "warn"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FAST+BRIEF"));

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["width"], 120);
    assert_eq!(json["summary"].as_array().unwrap().len(), 2);
    let rotation = &json["statistics"]["runs"]["FAST+BRIEF"]["Rotation"];
    assert_eq!(rotation.as_array().unwrap().len(), 2);
    assert_eq!(rotation[0]["argument"], 0.0);
    assert_eq!(rotation[0]["is_valid"], true);
}

#[test]
fn missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("featbench")
        .unwrap()
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn unknown_transform_kind_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(&dir.path().join("scene.png"));
    let config = dir.path().join("bench.json");
    std::fs::write(
        &config,
        r#"{ "image_path": "scene.png", "transforms": [ { "kind": "swirl" } ] }"#,
    )
    .unwrap();
    Command::cargo_bin("featbench")
        .unwrap()
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("swirl"));
}

#[test]
fn log_level_accepts_per_target_filters() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(&dir.path().join("scene.png"));
    let config = dir.path().join("bench.json");
    std::fs::write(
        &config,
        r#"{
            "image_path": "scene.png",
            "transforms": [
                { "kind": "rotation", "range": { "start": 0, "end": 0, "step": 1 } }
            ]
        }"#,
    )
    .unwrap();

    Command::cargo_bin("featbench")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg(&config)
        .arg("--output")
        .arg(dir.path().join("report.json"))
        .args(["--log-level", "off,featbench_eval=debug"])
        .assert()
        .success()
        .stderr(predicate::str::contains("featbench_eval::estimation"))
        .stderr(predicate::str::contains("Rotation(0)"))
        .stderr(predicate::str::contains("loading").not());
}
