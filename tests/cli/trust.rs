//! Tests for `trust`.

use crate::support::*;

#[test]
fn test_status_after_init() {
    let t = Test::init();
    let output = t.run(&["trust", "status"]);
    assert_success(&output);
    assert_stdout_contains(&output, "trusted since");
}

#[test]
fn test_forget_blocks_decrypt() {
    let t = Test::with_values(&[("A", "1")]);
    assert_success(&t.run(&["trust", "forget"]));

    let output = t.run(&["trust", "status"]);
    assert_success(&output);
    assert_stderr_contains(&output, "not trusted");

    let output = t.decrypt();
    assert_failure(&output);
    assert_stderr_contains(&output, "trust not established");

    let output = t.run(&["trust", "accept"]);
    assert_success(&output);
    assert_stdout_contains(&output, "trusted");
    assert_success(&t.decrypt());
}

#[test]
fn test_trust_store_layout() {
    let t = Test::init();
    let text = std::fs::read_to_string(t.trust_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["schema_version"], 3);
    assert_eq!(json["entries"].as_array().unwrap().len(), 1);
    assert_eq!(json["entries"][0]["fingerprint"].as_str().unwrap().len(), 64);
}

#[test]
fn test_trust_keyed_by_repo_root() {
    crate::skip_without_git!();
    let t = Test::new();
    let status = std::process::Command::new("git")
        .args(["init", "-q"])
        .current_dir(t.dir.path())
        .status()
        .unwrap();
    assert!(status.success());
    assert_success(&t.init_cmd());

    let text = std::fs::read_to_string(t.trust_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let root = json["entries"][0]["repo_root"].as_str().unwrap();
    assert_ne!(root, ".");
    assert_eq!(
        std::path::Path::new(root).file_name(),
        t.dir.path().file_name()
    );
}
