//! Constants used throughout si-vault.
//!
//! Centralizes magic strings and configuration values.

/// Header version directive body.
pub const HEADER_VERSION: &str = "si-vault:v1";

/// Full header version line as emitted.
pub const HEADER_VERSION_LINE: &str = "# si-vault:v1";

/// Recipient directive keyword.
pub const RECIPIENT_DIRECTIVE: &str = "si-vault:recipient";

/// Prefix of an emitted recipient line; the recipient follows.
pub const RECIPIENT_LINE_PREFIX: &str = "# si-vault:recipient ";

/// Current ciphertext tag. Payload has the age magic and stanza prefix stripped.
pub const PREFIX_V2: &str = "encrypted:si:v2:";

/// Legacy compact tag, same payload layout as [`PREFIX_V2`].
pub const PREFIX_V2_LEGACY: &str = "es2:";

/// Oldest tag. Payload is the full age stream.
pub const PREFIX_V1: &str = "encrypted:si:v1:";

/// Environment variables holding an inline identity, in precedence order.
pub const ENV_IDENTITY: &[&str] = &["SI_VAULT_IDENTITY", "SI_VAULT_PRIVATE_KEY"];

/// Environment variable naming an identity file.
pub const ENV_IDENTITY_FILE: &str = "SI_VAULT_IDENTITY_FILE";

/// Truthy value allows reading/writing envfiles through symlinks.
pub const ENV_ALLOW_SYMLINK: &str = "SI_VAULT_ALLOW_SYMLINK_ENV_FILE";

/// Truthy value disables identity file permission checks.
pub const ENV_ALLOW_INSECURE_KEY_FILE: &str = "SI_VAULT_ALLOW_INSECURE_KEY_FILE";

/// Settings file override.
pub const ENV_SETTINGS: &str = "SI_SETTINGS";

/// Log filter for the binary.
pub const ENV_LOG: &str = "SI_VAULT_LOG";

/// OS secret store service name.
pub const KEYRING_SERVICE: &str = "si-vault";

/// OS secret store account name.
pub const KEYRING_ACCOUNT: &str = "age-identity";

/// Label attached to stored secrets.
pub const KEYRING_LABEL: &str = "si-vault age identity";

/// Line prefix of a serialized identity.
pub const IDENTITY_PREFIX: &str = "AGE-SECRET-KEY-";

/// Settings directory relative to HOME.
pub const SETTINGS_DIR: &str = ".si";

/// Settings file name inside [`SETTINGS_DIR`].
pub const SETTINGS_FILE: &str = "settings.toml";

/// Current trust store schema.
pub const TRUST_SCHEMA_VERSION: u32 = 3;

/// Number of dashes in a canonical section divider.
pub const DIVIDER_WIDTH: usize = 78;
