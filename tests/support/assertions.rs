//! Test assertion helpers.
//!
//! Failure messages carry both streams; a CLI failure is rarely explained
//! by the stream the assertion looked at.

use std::process::Output;

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn dump(output: &Output) -> String {
    format!(
        "status: {}\n--- stdout\n{}--- stderr\n{}",
        output.status,
        stdout(output),
        stderr(output)
    )
}

pub fn assert_success(output: &Output) {
    assert!(output.status.success(), "expected success\n{}", dump(output));
}

pub fn assert_failure(output: &Output) {
    assert!(!output.status.success(), "expected failure\n{}", dump(output));
}

pub fn assert_stdout_contains(output: &Output, expected: &str) {
    assert!(
        stdout(output).contains(expected),
        "stdout missing {:?}\n{}",
        expected,
        dump(output)
    );
}

pub fn assert_stderr_contains(output: &Output, expected: &str) {
    assert!(
        stderr(output).contains(expected),
        "stderr missing {:?}\n{}",
        expected,
        dump(output)
    );
}

pub fn assert_stdout_excludes(output: &Output, excluded: &str) {
    assert!(
        !stdout(output).contains(excluded),
        "stdout leaked {:?}\n{}",
        excluded,
        dump(output)
    );
}

/// Set a value, then read it back decrypted.
pub fn assert_roundtrip(t: &super::Test, key: &str, value: &str) {
    assert_success(&t.set(key, value));
    let output = t.get(key);
    assert_success(&output);
    assert_eq!(stdout(&output).trim_end_matches('\n'), value);
}
