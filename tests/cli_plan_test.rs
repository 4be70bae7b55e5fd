//! Integration tests for `fjrd plan`.

mod common;

use common::{DOCK_AND_RAW, TestEnv};
use predicates::prelude::*;

#[test]
fn test_plan_lists_operations_and_restarts() {
    let env = TestEnv::new();
    let path = env.write_document("fjrd.toml", DOCK_AND_RAW);

    env.fjrd()
        .args(["plan", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[dock]\n  defaults write com.apple.dock autohide -bool true\n  defaults write com.apple.dock orientation -string left\n  restart Dock\n",
        ))
        .stdout(predicate::str::contains(
            "[defaults-raw] (requires approval)\n  defaults write com.apple.finder ShowPathbar -bool true",
        ));
}

#[test]
fn test_plan_raw_reset() {
    let env = TestEnv::new();
    let path = env.write_document(
        "fjrd.toml",
        r#"version = 1

[macos.defaultsRaw."com.apple.dock.tilesize"]
value = "default"
type = "int"
"#,
    );

    env.fjrd()
        .args(["plan", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("defaults delete com.apple.dock tilesize"));
}

#[test]
fn test_plan_conditional_restart() {
    let env = TestEnv::new();
    let path = env.write_document(
        "fjrd.toml",
        "version = 1\n[macos.safari]\nshow-full-url = true\n",
    );

    env.fjrd()
        .args(["plan", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("restart Safari (if running)"));
}

#[test]
fn test_plan_empty_document() {
    let env = TestEnv::new();
    let path = env.write_document("fjrd.toml", "version = 1\n");

    env.fjrd()
        .args(["plan", &path])
        .assert()
        .success()
        .stdout("Nothing to apply.\n");
}

#[test]
fn test_plan_invalid_enum_fails() {
    let env = TestEnv::new();
    let path = env.write_document(
        "fjrd.toml",
        "version = 1\n[macos.dock]\norientation = \"top\"\n",
    );

    env.fjrd()
        .args(["plan", &path])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[dock] invalid:"))
        .stdout(predicate::str::contains("top"))
        .stderr(predicate::str::contains("1 domain failed validation"));
}

#[test]
fn test_plan_unsupported_version() {
    let env = TestEnv::new();
    let path = env.write_document("fjrd.toml", "version = 2\n");

    env.fjrd()
        .args(["plan", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid document: 2 is an invalid version, supported versions: 1",
        ));
}

#[test]
fn test_plan_malformed_toml() {
    let env = TestEnv::new();
    let path = env.write_document("fjrd.toml", "version = 1\n[macos.dock\n");

    env.fjrd()
        .args(["plan", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed TOML"));
}

#[test]
fn test_plan_unknown_option_rejected() {
    let env = TestEnv::new();
    let path = env.write_document(
        "fjrd.toml",
        "version = 1\n[macos.dock]\nautohyde = true\n",
    );

    env.fjrd()
        .args(["plan", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("autohyde"));
}

#[test]
fn test_plan_json_output() {
    let env = TestEnv::new();
    let path = env.write_document("fjrd.toml", DOCK_AND_RAW);

    let output = env
        .fjrd()
        .args(["--json", "plan", &path])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let domains = value["domains"].as_array().unwrap();
    assert_eq!(domains.len(), 11);
    assert_eq!(domains[0]["domain"], "dock");
    assert_eq!(domains[0]["operations"][0]["op"], "write");
    assert_eq!(domains[0]["operations"][0]["type"], "bool");
    assert_eq!(domains[10]["domain"], "defaults-raw");
    assert_eq!(domains[10]["requires_approval"], true);
}
