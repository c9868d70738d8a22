//! Test fixtures and constants.

/// Settings written into every test home.
pub const SETTINGS: &str = "[vault]\nfile = \".env\"\nkey_backend = \"file\"\n";

/// A valid age recipient nobody in the tests holds the identity for.
pub const BOB_RECIPIENT: &str = "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";

pub const INVALID_RECIPIENT: &str = "not-a-valid-age-key";

pub const STANDARD_VALUES: &[(&str, &str)] = &[
    ("DATABASE_URL", "postgres://localhost/mydb"),
    ("API_KEY", "sk-test-12345"),
    ("JWT_SECRET", "super-secret-jwt-token"),
    ("GREETING", "hello world # not a comment"),
];
