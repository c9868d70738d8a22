//! Tests for `encrypt` and `decrypt`.

use std::fs::OpenOptions;
use std::io::Write;

use crate::support::*;

fn append(t: &Test, text: &str) {
    let mut f = OpenOptions::new().append(true).open(t.env_path()).unwrap();
    f.write_all(text.as_bytes()).unwrap();
}

#[test]
fn test_encrypt_then_decrypt() {
    let t = Test::init();
    append(&t, "A=hello\nexport B = \"two words\" # kept\n");

    let output = t.encrypt();
    assert_success(&output);
    assert_stdout_contains(&output, "encrypted 2 values");
    let contents = t.env_contents();
    assert!(!contents.contains("hello"));
    assert!(contents.contains("export B = encrypted:si:v2:"));
    assert!(contents.contains(" # kept\n"));

    let output = t.decrypt();
    assert_success(&output);
    assert_eq!(stdout(&output), "A=hello\nB=two words\n");
}

#[test]
fn test_encrypt_is_idempotent() {
    let t = Test::init();
    append(&t, "A=hello\n");
    assert_success(&t.encrypt());
    let once = t.env_contents();

    let output = t.encrypt();
    assert_success(&output);
    assert_stdout_contains(&output, "nothing to encrypt");
    assert_eq!(t.env_contents(), once);
}

#[test]
fn test_reencrypt_changes_ciphertext() {
    let t = Test::with_values(&[("A", "1")]);
    let before = t.env_contents();

    assert_success(&t.run(&["encrypt", "--reencrypt"]));
    assert_ne!(t.env_contents(), before);
    assert_eq!(stdout(&t.get("A")), "1\n");
}

#[test]
fn test_decrypt_selected_keys() {
    let t = Test::with_values(&[("A", "1"), ("B", "2")]);
    let output = t.run(&["decrypt", "B"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "B=2\n");

    let output = t.run(&["decrypt", "MISSING"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "MISSING");
}

#[test]
fn test_decrypt_in_place() {
    let t = Test::with_values(&[("A", "1"), ("B", "two words")]);
    assert_success(&t.run(&["decrypt", "--in-place", "A"]));
    let contents = t.env_contents();
    assert!(contents.contains("\nA=1\n"));
    assert!(contents.contains("B=encrypted:si:v2:"));

    assert_success(&t.run(&["decrypt", "--in-place"]));
    let contents = t.env_contents();
    assert!(contents.contains("\nB=two words\n"), "got: {}", contents);
    assert!(contents.starts_with("# si-vault:v1\n"));
}

#[test]
fn test_decrypt_refuses_changed_recipients() {
    let t = Test::with_values(&[("A", "1")]);
    let contents = t.env_contents().replacen(
        "# si-vault:v1\n",
        &format!("# si-vault:v1\n# si-vault:recipient {}\n", BOB_RECIPIENT),
        1,
    );
    t.write_env(&contents);

    let output = t.decrypt();
    assert_failure(&output);
    assert_stderr_contains(&output, "recipients changed");
    assert_stderr_contains(&output, "trust accept");

    assert_success(&t.run(&["trust", "accept"]));
    assert_success(&t.decrypt());
}

#[test]
fn test_decrypt_with_env_identity() {
    let t = Test::with_values(&[("A", "1")]);
    let secret = std::fs::read_to_string(t.key_path()).unwrap();
    std::fs::remove_file(t.key_path()).unwrap();

    let output = t.decrypt();
    assert_failure(&output);
    assert_stderr_contains(&output, "si-vault keygen");

    let output = t
        .cmd()
        .arg("decrypt")
        .env("SI_VAULT_IDENTITY", secret.trim())
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "A=1\n");
}
