//! Tests for `keygen`.

use age::secrecy::ExposeSecret;
use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_keygen_is_stable() {
    let t = Test::new();
    let first = t.recipient();
    assert!(first.starts_with("age1"));
    assert_eq!(t.recipient(), first);
}

#[test]
fn test_rotate_requires_confirmation() {
    let t = Test::init();
    let before = t.recipient();

    let output = t.run(&["keygen", "--rotate"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "pass --yes");
    assert_eq!(t.recipient(), before);

    let output = t.run(&["keygen", "--rotate", "--yes"]);
    assert_success(&output);
    assert_stdout_contains(&output, "rotated identity");
    assert_ne!(t.recipient(), before);
}

#[test]
fn test_env_identity_wins() {
    let t = Test::new();
    let identity = age::x25519::Identity::generate();
    t.cmd()
        .arg("keygen")
        .env("SI_VAULT_IDENTITY", identity.to_string().expose_secret())
        .assert()
        .success()
        .stdout(predicate::str::contains("env (SI_VAULT_IDENTITY)"))
        .stdout(predicate::str::contains(identity.to_public().to_string()));
    assert!(!t.key_path().exists());
}

#[test]
fn test_invalid_env_identity_fails() {
    let t = Test::new();
    t.cmd()
        .arg("keygen")
        .env("SI_VAULT_IDENTITY", "garbage")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SI_VAULT_IDENTITY identity invalid"));
    assert!(!t.key_path().exists());
}
