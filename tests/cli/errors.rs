//! Error output and security policy at the CLI boundary.

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_not_configured() {
    let t = Test::new();
    std::fs::remove_file(t.home.path().join(".si/settings.toml")).unwrap();

    let output = t.list();
    assert_failure(&output);
    assert_stderr_contains(&output, "✗ vault env file not configured");
    assert_stderr_contains(&output, "→ pass --file");
}

#[test]
fn test_explicit_file_flag() {
    let t = Test::new();
    let output = t.run(&["--file", "config/.env.dev", "set", "A", "1"]);
    assert_success(&output);
    let written = std::fs::read_to_string(t.dir.path().join("config/.env.dev")).unwrap();
    assert_eq!(written, "A=1\n");
}

#[test]
fn test_invalid_key() {
    let t = Test::init();
    let output = t.set("1BAD", "x");
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid env key \"1BAD\"");
}

#[test]
fn test_bad_settings() {
    let t = Test::new();
    std::fs::write(
        t.home.path().join(".si/settings.toml"),
        "[vault]\nfile = \".env\"\nkey_backend = \"vault9000\"\n",
    )
    .unwrap();
    let output = t.run(&["keygen"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "unsupported key backend \"vault9000\"");
}

#[test]
fn test_missing_file() {
    let t = Test::new();
    let output = t.list();
    assert_failure(&output);
    assert_stderr_contains(&output, ".env");
}

#[test]
fn test_completions() {
    let t = Test::new();
    t.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("si-vault"))
        .stdout(predicate::str::contains("recipients"));
}

#[cfg(unix)]
#[test]
fn test_insecure_key_file() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::with_values(&[("A", "1")]);
    std::fs::set_permissions(t.key_path(), std::fs::Permissions::from_mode(0o644)).unwrap();

    let output = t.get("A");
    assert_failure(&output);
    assert_stderr_contains(&output, "insecure key file permissions");
    assert_stderr_contains(&output, "0644");

    t.cmd()
        .args(["get", "A", "--reveal"])
        .env("SI_VAULT_ALLOW_INSECURE_KEY_FILE", "1")
        .assert()
        .success()
        .stdout("1\n");
}

#[cfg(unix)]
#[test]
fn test_symlinked_env_file() {
    let t = Test::new();
    std::fs::write(t.dir.path().join("real.env"), "A=1\n").unwrap();
    std::os::unix::fs::symlink("real.env", t.env_path()).unwrap();

    let output = t.set("A", "2");
    assert_failure(&output);
    assert_stderr_contains(&output, "symlink");

    t.cmd()
        .args(["set", "A", "2"])
        .env("SI_VAULT_ALLOW_SYMLINK_ENV_FILE", "1")
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(t.dir.path().join("real.env")).unwrap(), "A=2\n");
    assert!(std::fs::symlink_metadata(t.env_path()).unwrap().file_type().is_symlink());
}
