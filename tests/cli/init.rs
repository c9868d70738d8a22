//! Tests for `si-vault init`.

use crate::support::*;

#[test]
fn test_init_writes_header_and_key() {
    let t = Test::new();

    let output = t.init_cmd();
    assert_success(&output);
    assert_stdout_contains(&output, "initialized");

    let recipient = t.recipient();
    let contents = t.env_contents();
    assert!(contents.starts_with("# si-vault:v1\n"), "got: {}", contents);
    assert!(contents.contains(&format!("# si-vault:recipient {}\n", recipient)));
    assert!(t.key_path().exists(), "identity key should exist");
    assert!(t.trust_path().exists(), "trust store should exist");
}

#[cfg(unix)]
#[test]
fn test_init_key_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::init();
    let mode = std::fs::metadata(t.key_path()).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
    let dir_mode = std::fs::metadata(t.key_path().parent().unwrap())
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(dir_mode, 0o700);
}

#[test]
fn test_init_twice_is_noop() {
    let t = Test::init();
    let before = t.env_contents();

    let output = t.init_cmd();
    assert_success(&output);
    assert_stdout_contains(&output, "already initialized");
    assert_eq!(t.env_contents(), before);
}

#[test]
fn test_init_keeps_existing_values() {
    let t = Test::new();
    t.write_env("A=1\r\nB=2\r\n");

    assert_success(&t.init_cmd());
    let contents = t.env_contents();
    assert!(contents.starts_with("# si-vault:v1\r\n"), "got: {:?}", contents);
    assert!(contents.ends_with("\r\nA=1\r\nB=2\r\n"), "got: {:?}", contents);
}

#[test]
fn test_init_in_repo_names_file_relative_to_root() {
    crate::skip_without_git!();
    let t = Test::new();
    let status = std::process::Command::new("git")
        .args(["init", "-q"])
        .current_dir(t.dir.path())
        .status()
        .unwrap();
    assert!(status.success());
    std::fs::create_dir_all(t.dir.path().join("config")).unwrap();

    let output = t.run(&["--file", "config/.env.dev", "init"]);
    assert_success(&output);
    assert_stdout_contains(&output, "initialized config/.env.dev");
}
