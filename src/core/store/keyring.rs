//! OS secret store identity storage.
//!
//! The identity is kept under one service/account pair. Each platform is
//! reached through its command-line bridge, invoked with an argument vector
//! (never a shell):
//!
//! - Linux: `secret-tool` (libsecret / Secret Service)
//! - macOS: `security` (login Keychain)
//!
//! Other platforms fail every call with *not supported*.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::Store;
use crate::core::constants::{KEYRING_ACCOUNT, KEYRING_LABEL, KEYRING_SERVICE};
use crate::core::domain::{Identity, IdentitySource};
use crate::core::validation::validate_attribute;
use crate::error::{Result, StoreError};

/// Access to a platform secret store.
pub trait SecretService: Send + Sync {
    /// Read the secret for `service`/`account`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when no entry exists (or the bridge tool is
    /// not installed), `StoreError::Command` for any other failure.
    fn get(&self, service: &str, account: &str) -> Result<Zeroizing<String>>;

    /// Create or replace the secret for `service`/`account`.
    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()>;

    /// Bridge name for logs.
    fn name(&self) -> &'static str;
}

/// Bridge for the current build target.
pub fn platform_service() -> Box<dyn SecretService> {
    #[cfg(target_os = "linux")]
    {
        Box::new(SecretTool)
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(SecurityCli)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Box::new(Unsupported)
    }
}

/// Identity stored in the OS secret store.
pub struct Keyring {
    service: String,
    account: String,
    bridge: Box<dyn SecretService>,
}

impl Keyring {
    /// Keyring entry `si-vault`/`age-identity` through `bridge`.
    pub fn new(bridge: Box<dyn SecretService>) -> Self {
        Self::with_entry(bridge, KEYRING_SERVICE, KEYRING_ACCOUNT)
    }

    pub fn with_entry(
        bridge: Box<dyn SecretService>,
        service: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
            bridge,
        }
    }

    fn attributes(&self) -> Result<(String, String)> {
        Ok((
            validate_attribute("keyring service", &self.service)?,
            validate_attribute("keyring account", &self.account)?,
        ))
    }
}

impl Store for Keyring {
    fn name(&self) -> &'static str {
        "keyring"
    }

    fn load(&self) -> Result<Identity> {
        let (service, account) = self.attributes()?;
        debug!(bridge = self.bridge.name(), %service, %account, "loading identity from keyring");
        let secret = self.bridge.get(&service, &account)?;
        Identity::parse(&secret, IdentitySource::Keyring { service, account })
    }

    fn save(&self, identity: &Identity) -> Result<()> {
        let (service, account) = self.attributes()?;
        self.bridge.set(&service, &account, &identity.secret())?;
        debug!(bridge = self.bridge.name(), %service, %account, "identity saved to keyring");
        Ok(())
    }
}

fn tool_missing(program: &str) -> bool {
    which::which(program).is_err()
}

fn command_error(program: &str, message: impl Into<String>) -> crate::error::Error {
    StoreError::Command {
        program: program.to_string(),
        message: message.into(),
    }
    .into()
}

fn run(program: &str, cmd: &mut Command) -> Result<Output> {
    trace!(program, "running secret store bridge");
    cmd.stdin(Stdio::null())
        .output()
        .map_err(|e| command_error(program, format!("failed to spawn: {}", e)))
}

/// Linux bridge over `secret-tool`.
pub struct SecretTool;

impl SecretTool {
    const PROGRAM: &'static str = "secret-tool";
}

impl SecretService for SecretTool {
    fn name(&self) -> &'static str {
        Self::PROGRAM
    }

    fn get(&self, service: &str, account: &str) -> Result<Zeroizing<String>> {
        if tool_missing(Self::PROGRAM) {
            return Err(StoreError::NotFound(format!("{} not installed", Self::PROGRAM)).into());
        }
        let output = run(
            Self::PROGRAM,
            Command::new(Self::PROGRAM).args(["lookup", "service", service, "account", account]),
        )?;
        let stdout = Zeroizing::new(String::from_utf8_lossy(&output.stdout).into_owned());
        if !output.status.success() {
            if output.status.code() == Some(1) {
                return Err(StoreError::NotFound(format!("keyring {}/{}", service, account)).into());
            }
            return Err(command_error(Self::PROGRAM, status_message(&output)));
        }
        let secret = stdout.trim();
        if secret.is_empty() {
            return Err(StoreError::NotFound(format!("keyring {}/{}", service, account)).into());
        }
        Ok(Zeroizing::new(secret.to_string()))
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        if tool_missing(Self::PROGRAM) {
            return Err(command_error(Self::PROGRAM, "not found on PATH (install libsecret-tools)"));
        }
        let label = format!("--label={}", KEYRING_LABEL);
        let mut child = Command::new(Self::PROGRAM)
            .args([
                "store",
                label.as_str(),
                "service",
                service,
                "account",
                account,
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_error(Self::PROGRAM, format!("failed to spawn: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(secret.as_bytes())
                .map_err(|e| command_error(Self::PROGRAM, format!("failed to write secret: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| command_error(Self::PROGRAM, e.to_string()))?;
        if !output.status.success() {
            return Err(command_error(Self::PROGRAM, status_message(&output)));
        }
        Ok(())
    }
}

fn status_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    match output.status.code() {
        Some(code) if stderr.is_empty() => format!("exit status {}", code),
        Some(code) => format!("exit status {}: {}", code, stderr),
        None if stderr.is_empty() => "terminated by signal".to_string(),
        None => format!("terminated by signal: {}", stderr),
    }
}

/// macOS bridge over `/usr/bin/security`.
pub struct SecurityCli;

impl SecurityCli {
    const PROGRAM: &'static str = "security";
    const NOT_FOUND_EXIT: i32 = 44;
    const ACCESS_DENIED_EXIT: i32 = 169;
}

/// Whether a `security` failure means the item does not exist.
fn security_not_found(code: Option<i32>, stderr: &str) -> bool {
    if code == Some(SecurityCli::NOT_FOUND_EXIT) {
        return true;
    }
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("could not be found") || stderr.contains("not found")
}

/// Actionable description of a `security` failure.
fn security_error(code: Option<i32>, stderr: &str, service: &str, account: &str) -> String {
    let stderr = stderr.trim();
    match code {
        Some(SecurityCli::ACCESS_DENIED_EXIT) if stderr.is_empty() => format!(
            "Keychain item exists but can't be read in this context; check Keychain Access item Access Control for {:?}/{:?}, or delete it and re-run `si-vault keygen`",
            service, account
        ),
        Some(code) if stderr.is_empty() => format!("exit status {}", code),
        Some(code) => format!("exit status {}: {}", code, stderr),
        None => format!("terminated by signal: {}", stderr),
    }
}

impl SecretService for SecurityCli {
    fn name(&self) -> &'static str {
        Self::PROGRAM
    }

    fn get(&self, service: &str, account: &str) -> Result<Zeroizing<String>> {
        if tool_missing(Self::PROGRAM) {
            return Err(StoreError::NotFound(format!("{} not installed", Self::PROGRAM)).into());
        }
        let output = run(
            Self::PROGRAM,
            Command::new(Self::PROGRAM).args(["find-generic-password", "-s", service, "-a", account, "-w"]),
        )?;
        let stdout = Zeroizing::new(String::from_utf8_lossy(&output.stdout).into_owned());
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if security_not_found(output.status.code(), &stderr) {
                return Err(StoreError::NotFound(format!("keychain {}/{}", service, account)).into());
            }
            return Err(command_error(
                Self::PROGRAM,
                format!(
                    "macOS Keychain read failed for {}/{}: {}",
                    service,
                    account,
                    security_error(output.status.code(), &stderr, service, account)
                ),
            ));
        }
        let secret = stdout.trim();
        if secret.is_empty() {
            return Err(StoreError::NotFound(format!("keychain {}/{}", service, account)).into());
        }
        Ok(Zeroizing::new(secret.to_string()))
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        if tool_missing(Self::PROGRAM) {
            return Err(command_error(Self::PROGRAM, "not found on PATH"));
        }

        let deleted = run(
            Self::PROGRAM,
            Command::new(Self::PROGRAM).args(["delete-generic-password", "-s", service, "-a", account]),
        )?;
        if !deleted.status.success() {
            let stderr = String::from_utf8_lossy(&deleted.stderr);
            if !security_not_found(deleted.status.code(), &stderr) {
                return Err(command_error(
                    Self::PROGRAM,
                    format!(
                        "macOS Keychain delete failed for {}/{}: {}",
                        service,
                        account,
                        security_error(deleted.status.code(), &stderr, service, account)
                    ),
                ));
            }
        }

        // add-generic-password only takes the secret as an argument.
        let added = run(
            Self::PROGRAM,
            Command::new(Self::PROGRAM).args([
                "add-generic-password",
                "-s",
                service,
                "-a",
                account,
                "-l",
                KEYRING_LABEL,
                "-w",
                secret,
                "-T",
                "/usr/bin/security",
                "-U",
            ]),
        )?;
        if !added.status.success() {
            let stderr = String::from_utf8_lossy(&added.stderr);
            return Err(command_error(
                Self::PROGRAM,
                format!(
                    "macOS Keychain write failed for {}/{}: {}",
                    service,
                    account,
                    security_error(added.status.code(), &stderr, service, account)
                ),
            ));
        }
        Ok(())
    }
}

/// Bridge for platforms without a supported secret store.
pub struct Unsupported;

impl SecretService for Unsupported {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn get(&self, _service: &str, _account: &str) -> Result<Zeroizing<String>> {
        Err(StoreError::NotSupported(std::env::consts::OS).into())
    }

    fn set(&self, _service: &str, _account: &str, _secret: &str) -> Result<()> {
        Err(StoreError::NotSupported(std::env::consts::OS).into())
    }
}
