//! Completions command.

use std::io::Write;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::error::Result;

const BIN_NAME: &str = "si-vault";

pub fn execute(shell: Shell) -> Result<()> {
    write_to(shell, &mut std::io::stdout())
}

/// Write the completion script for `shell`.
pub fn write_to(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
    out.flush()?;
    Ok(())
}
