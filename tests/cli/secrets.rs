//! Tests for `set`, `get`, `unset`, and `list`.

use crate::support::*;

#[test]
fn test_roundtrip_standard_values() {
    let t = Test::init();
    for (k, v) in STANDARD_VALUES {
        assert_roundtrip(&t, k, v);
    }
}

#[test]
fn test_set_encrypts_by_default() {
    let t = Test::with_values(&[("API_KEY", "sk-test-12345")]);

    let contents = t.env_contents();
    assert!(contents.contains("API_KEY=encrypted:si:v2:"), "got: {}", contents);
    assert!(!contents.contains("sk-test-12345"));

    let output = t.get_raw("API_KEY");
    assert_success(&output);
    assert!(stdout(&output).starts_with("encrypted:si:v2:"));
}

#[test]
fn test_set_plain() {
    let t = Test::init();
    assert_success(&t.set_plain("PORT", "8080"));
    assert!(t.env_contents().ends_with("PORT=8080\n"));

    let output = t.list();
    assert_success(&output);
    assert_stdout_contains(&output, "PORT");
    assert_stdout_contains(&output, "plaintext");
}

#[test]
fn test_set_without_header_is_plaintext() {
    let t = Test::new();
    assert_success(&t.set("A", "1"));
    assert_eq!(t.env_contents(), "A=1\n");
}

#[test]
fn test_set_into_section() {
    let t = Test::new();
    t.write_env("A=1\n");
    assert_success(&t.run(&["set", "STRIPE_KEY", "x", "--section", "stripe"]));
    assert_eq!(
        t.env_contents(),
        format!("A=1\n\n# {}\n# [stripe]\nSTRIPE_KEY=x\n", "-".repeat(78))
    );
}

#[test]
fn test_set_preserves_inline_comment() {
    let t = Test::new();
    t.write_env("A=1 # note\n");
    assert_success(&t.set("A", "2"));
    assert_eq!(t.env_contents(), "A=2 # note\n");
}

#[test]
fn test_set_from_stdin() {
    let t = Test::init();
    let output = t
        .cmd()
        .args(["set", "PIPED"])
        .write_stdin("from-stdin\n")
        .output()
        .unwrap();
    assert_success(&output);

    let output = t.get("PIPED");
    assert_success(&output);
    assert_eq!(stdout(&output), "from-stdin\n");
}

#[test]
fn test_unset() {
    let t = Test::with_values(&[("A", "1"), ("B", "2")]);
    assert_success(&t.unset("A"));
    assert!(!t.env_contents().contains("\nA="));

    let output = t.unset("A");
    assert_success(&output);
    assert_stdout_contains(&output, "not set");
}

#[test]
fn test_list_json() {
    let t = Test::with_values(&[("SECRET", "s")]);
    assert_success(&t.set_plain("PLAIN", "p"));
    assert_success(&t.set_plain("EMPTY", ""));

    let output = t.list_json();
    assert_success(&output);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["count"], 3);
    let classes: Vec<(&str, &str)> = json["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["key"].as_str().unwrap(), e["class"].as_str().unwrap()))
        .collect();
    assert_eq!(
        classes,
        vec![("SECRET", "encrypted"), ("PLAIN", "plaintext"), ("EMPTY", "empty")]
    );
}

#[test]
fn test_get_missing_key() {
    let t = Test::init();
    let output = t.get("NOPE");
    assert_failure(&output);
    assert_stderr_contains(&output, "key NOPE not found");
}

#[test]
fn test_audit_log_records_keys_not_values() {
    let t = Test::with_values(&[("TOKEN", "hunter2")]);
    let log = std::fs::read_to_string(t.audit_path()).unwrap();
    let last: serde_json::Value = serde_json::from_str(log.lines().last().unwrap()).unwrap();
    assert_eq!(last["type"], "set");
    assert_eq!(last["keys"][0], "TOKEN");
    assert!(last["ts"].is_string());
    assert!(!log.contains("hunter2"));
}

#[test]
fn test_set_refuses_swapped_recipient() {
    let t = Test::init();
    let own = t.recipient();
    let contents = t.env_contents().replace(&own, BOB_RECIPIENT);
    t.write_env(&contents);

    let output = t.set("TOKEN", "s3cret");
    assert_failure(&output);
    assert_stderr_contains(&output, "recipients changed");
    assert!(!t.env_contents().contains("TOKEN="));

    // Plaintext values carry no recipients and need no trust.
    assert_success(&t.set_plain("PORT", "8080"));
}

#[test]
fn test_set_after_trust_forget_fails() {
    let t = Test::init();
    assert_success(&t.run(&["trust", "forget"]));

    let output = t.set("TOKEN", "s3cret");
    assert_failure(&output);
    assert_stderr_contains(&output, "trust not established");
}
