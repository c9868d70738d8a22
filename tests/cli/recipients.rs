//! Tests for `recipients`.

use crate::support::*;

#[test]
fn test_add_list_remove() {
    let t = Test::with_values(&[("A", "1")]);

    let output = t.run(&["recipients", "add", BOB_RECIPIENT]);
    assert_success(&output);
    assert_stderr_contains(&output, "--reencrypt");
    assert!(t
        .env_contents()
        .contains(&format!("# si-vault:recipient {}\n", BOB_RECIPIENT)));

    let output = t.run(&["recipients", "list"]);
    assert_success(&output);
    assert_stdout_contains(&output, "2 recipients");
    assert_stdout_contains(&output, BOB_RECIPIENT);

    // The change came from us, so the new set is already trusted.
    assert_success(&t.decrypt());
    assert_success(&t.run(&["encrypt", "--reencrypt"]));

    assert_success(&t.run(&["recipients", "remove", BOB_RECIPIENT]));
    assert!(!t.env_contents().contains(BOB_RECIPIENT));
    assert_eq!(stdout(&t.get("A")), "1\n");
}

#[test]
fn test_add_twice() {
    let t = Test::init();
    assert_success(&t.run(&["recipients", "add", BOB_RECIPIENT]));
    let output = t.run(&["recipients", "add", BOB_RECIPIENT]);
    assert_success(&output);
    assert_stdout_contains(&output, "already present");
}

#[test]
fn test_add_invalid() {
    let t = Test::init();
    let before = t.env_contents();
    let output = t.run(&["recipients", "add", INVALID_RECIPIENT]);
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid recipient");
    assert_eq!(t.env_contents(), before);
}
