//! si-vault - encrypted dotenv files with inline recipients.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use si_vault::cli::output;
use si_vault::cli::{execute, Cli};
use si_vault::core::constants::ENV_LOG;
use si_vault::error::{ConfigError, Error, StoreError, ValidationError};

fn hint_for(e: &Error) -> Option<&'static str> {
    match e {
        Error::Config(ConfigError::NotConfigured) => {
            Some("pass --file or set vault.file in ~/.si/settings.toml")
        }
        Error::Config(ConfigError::NoRecipients) => Some("run: si-vault init"),
        Error::Config(ConfigError::TrustNotEstablished { .. } | ConfigError::Untrusted { .. }) => {
            Some("review with: si-vault recipients list, then run: si-vault trust accept")
        }
        Error::Store(StoreError::NotFound(_)) => Some("run: si-vault keygen"),
        Error::Validation(ValidationError::PlaintextValues { .. }) => Some("run: si-vault encrypt"),
        Error::Validation(ValidationError::NotFormatted { .. }) => Some("run: si-vault fmt"),
        _ => None,
    }
}

fn main() {
    let cli = Cli::parse();
    output::init();

    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("si_vault=debug")
        } else {
            EnvFilter::new("si_vault=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli.command, cli.file) {
        output::error(&e.to_string());
        if let Some(hint) = hint_for(&e) {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
