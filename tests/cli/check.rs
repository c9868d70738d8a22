//! Tests for `check` and `fmt`.

use crate::support::*;

#[test]
fn test_check_passes_when_encrypted() {
    let t = Test::with_values(&[("A", "1")]);
    assert_success(&t.set_plain("EMPTY", ""));
    let output = t.check();
    assert_success(&output);
    assert_stdout_contains(&output, "1 encrypted, 1 empty");
}

#[test]
fn test_check_reports_plaintext() {
    let t = Test::with_values(&[("A", "1")]);
    assert_success(&t.set_plain("PLAIN_ONE", "x"));
    assert_success(&t.set_plain("PLAIN_TWO", "y"));

    let output = t.check();
    assert_failure(&output);
    assert_stderr_contains(&output, "PLAIN_ONE, PLAIN_TWO");
    assert_stderr_contains(&output, "si-vault encrypt");
}

#[test]
fn test_check_rejects_fake_ciphertext() {
    let t = Test::init();
    let mut contents = t.env_contents();
    // base64 of "hello"
    contents.push_str("BAD=encrypted:si:v2:aGVsbG8\n");
    t.write_env(&contents);

    let output = t.check();
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid ciphertext");
}

#[test]
fn test_fmt() {
    let t = Test::new();
    let recipient = t.recipient();
    t.write_env(&format!(
        "A=1\n# si-vault:recipient {}\n\n\n\nexport  B =  2   #note\n",
        recipient
    ));

    let output = t.run(&["fmt", "--check"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "not canonically formatted");

    assert_success(&t.run(&["fmt"]));
    assert_eq!(
        t.env_contents(),
        format!(
            "# si-vault:v1\n# si-vault:recipient {}\n\nA=1\n\nexport B=2 # note\n",
            recipient
        )
    );
    let output = t.run(&["fmt", "--check"]);
    assert_success(&output);
    assert_stdout_contains(&output, "already formatted");
}
