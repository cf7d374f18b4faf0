#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn init_ci_github() {
    let temp_dir = tempdir().unwrap();

    Command::cargo_bin("vyoma-ci")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("init")
        .arg("--ci")
        .arg("github")
        .arg("--target-url")
        .arg("https://shop.example.com")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated GitHub Actions workflow"))
        .stdout(predicate::str::contains("https://shop.example.com"));

    let content =
        fs::read_to_string(temp_dir.path().join(".github/workflows/vyoma-scan.yml")).unwrap();
    assert!(content.contains("name: Vyoma Security Gate"));
    assert!(content.contains("vyoma-ci gate --target"));
    assert!(!temp_dir.path().join("Jenkinsfile").exists());
}

#[test]
fn init_ci_refuses_to_overwrite() {
    let temp_dir = tempdir().unwrap();
    fs::write(temp_dir.path().join(".gitlab-ci.yml"), "stages: []\n").unwrap();

    Command::cargo_bin("vyoma-ci")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("init")
        .arg("--ci")
        .arg("gitlab")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(
        fs::read_to_string(temp_dir.path().join(".gitlab-ci.yml")).unwrap(),
        "stages: []\n"
    );

    Command::cargo_bin("vyoma-ci")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("init")
        .arg("--ci")
        .arg("gitlab")
        .arg("--force")
        .assert()
        .success();
    assert!(fs::read_to_string(temp_dir.path().join(".gitlab-ci.yml"))
        .unwrap()
        .contains("vyoma-security-gate:"));
}

#[test]
fn init_writes_default_config() {
    let temp_dir = tempdir().unwrap();

    Command::cargo_bin("vyoma-ci")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("init")
        .arg("--target-url")
        .arg("https://shop.example.com")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated configuration at vyoma.json"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp_dir.path().join("vyoma.json")).unwrap())
            .unwrap();
    assert_eq!(value["target_url"], "https://shop.example.com");
    assert_eq!(value["threshold_critical"], 0);
    assert_eq!(value["threshold_high"], 5);
}

#[test]
fn unknown_ci_platform_is_rejected() {
    Command::cargo_bin("vyoma-ci")
        .unwrap()
        .arg("init")
        .arg("--ci")
        .arg("circleci")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
