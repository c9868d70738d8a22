//! Command-line interface.

pub mod check;
pub mod completions;
pub mod context;
pub mod init;
pub mod keygen;
pub mod lock;
pub mod output;
pub mod recipients;
pub mod secrets;
pub mod trust;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use self::context::Context;

/// si-vault - encrypted dotenv files with inline recipients.
#[derive(Parser)]
#[command(
    name = "si-vault",
    about = "Encrypted dotenv files with inline recipients",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Vault env file (defaults to vault.file from settings)
    #[arg(short, long, global = true, env = "SI_VAULT_FILE")]
    pub file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create the identity if needed and add yourself as a recipient
    Init,

    /// Set a value (encrypted when the file has recipients)
    Set {
        /// Key (e.g., DATABASE_URL)
        key: String,
        /// Value; read from stdin or prompted when omitted
        value: Option<String>,
        /// Place the key in this `# [section]`
        #[arg(short, long)]
        section: Option<String>,
        /// Store the value unencrypted
        #[arg(long)]
        plain: bool,
    },

    /// Remove a key
    Unset {
        key: String,
    },

    /// Print a value
    Get {
        key: String,
        /// Decrypt the value instead of printing the ciphertext
        #[arg(long)]
        reveal: bool,
    },

    /// List keys and whether each is encrypted
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encrypt every plaintext value
    Encrypt {
        /// Also re-encrypt existing ciphertext to the current recipients
        #[arg(long)]
        reencrypt: bool,
    },

    /// Decrypt values to stdout, or in place
    Decrypt {
        /// Only these keys
        keys: Vec<String>,
        /// Rewrite the file with plaintext values
        #[arg(long)]
        in_place: bool,
    },

    /// Rewrite the file in canonical layout
    Fmt {
        /// Fail instead of writing when the file is not canonical
        #[arg(long)]
        check: bool,
    },

    /// Fail on plaintext or malformed ciphertext
    Check,

    /// Manage the file's recipients
    Recipients {
        #[command(subcommand)]
        action: RecipientsAction,
    },

    /// Create or rotate your identity
    Keygen {
        /// Replace the existing identity
        #[arg(long)]
        rotate: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage recipient trust for the file
    Trust {
        #[command(subcommand)]
        action: TrustAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Recipient subcommands.
#[derive(Subcommand)]
pub enum RecipientsAction {
    /// List declared recipients
    List,
    /// Add a recipient (`age1...`)
    Add { recipient: String },
    /// Remove a recipient
    Remove { recipient: String },
}

/// Trust subcommands.
#[derive(Subcommand)]
pub enum TrustAction {
    /// Show whether the current recipients are trusted
    Status,
    /// Trust the current recipients
    Accept,
    /// Drop the trust entry
    Forget,
}

/// Execute a command.
pub fn execute(command: Command, file: Option<String>) -> crate::error::Result<()> {
    use Command::*;

    if let Completions { shell } = command {
        return completions::execute(shell);
    }

    let ctx = Context::load(file)?;
    match command {
        Init => init::execute(&ctx),
        Set {
            key,
            value,
            section,
            plain,
        } => secrets::set(&ctx, &key, value, section, plain),
        Unset { key } => secrets::unset(&ctx, &key),
        Get { key, reveal } => secrets::get(&ctx, &key, reveal),
        List { json } => secrets::list(&ctx, json),
        Encrypt { reencrypt } => lock::encrypt(&ctx, reencrypt),
        Decrypt { keys, in_place } => lock::decrypt(&ctx, &keys, in_place),
        Fmt { check } => check::fmt(&ctx, check),
        Check => check::execute(&ctx),
        Recipients { action } => match action {
            RecipientsAction::List => recipients::list(&ctx),
            RecipientsAction::Add { recipient } => recipients::add(&ctx, &recipient),
            RecipientsAction::Remove { recipient } => recipients::remove(&ctx, &recipient),
        },
        Keygen { rotate, yes } => keygen::execute(&ctx, rotate, yes),
        Trust { action } => match action {
            TrustAction::Status => trust::status(&ctx),
            TrustAction::Accept => trust::accept(&ctx),
            TrustAction::Forget => trust::forget(&ctx),
        },
        Completions { .. } => Ok(()),
    }
}
