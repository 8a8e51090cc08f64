//! Remote command transport.
//!
//! The remote volume is reachable only by running shell commands inside the
//! deployed container. [`RemoteTransport`] is that capability; the protocol
//! in [`crate::protocol`] is written purely against it.

use std::io::ErrorKind;
use std::process::Command;

use vellum_core::Config;

use crate::error::TransportError;

/// Captured result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RemoteOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a shell command string in the remote deployment.
///
/// A non-zero exit is returned as a normal [`RemoteOutput`]; `Err` is for
/// a channel that could not run the command at all.
pub trait RemoteTransport {
    fn run(&self, command: &str) -> Result<RemoteOutput, TransportError>;

    /// Check the channel is usable before any work starts.
    fn preflight(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: RemoteTransport + ?Sized> RemoteTransport for &T {
    fn run(&self, command: &str) -> Result<RemoteOutput, TransportError> {
        (**self).run(command)
    }

    fn preflight(&self) -> Result<(), TransportError> {
        (**self).preflight()
    }
}

/// Default transport program.
pub const DEFAULT_PROGRAM: &str = "railway";

/// Local CLI that forwards `sh -c <command>` into the deployment:
/// `<program> <prefix...> sh -c <command>`.
///
/// The command string is passed as a single argv element, so no extra layer
/// of local shell quoting is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellTransport {
    program: String,
    prefix: Vec<String>,
}

impl ShellTransport {
    pub fn new(program: impl Into<String>, prefix: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix,
        }
    }

    /// `railway run --service <service>`.
    pub fn railway(service: &str) -> Self {
        Self::new(
            DEFAULT_PROGRAM,
            vec!["run".into(), "--service".into(), service.to_string()],
        )
    }

    pub fn from_config(config: &Config) -> Self {
        Self::railway(&config.remote_service)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn exec(&self, args: &[&str]) -> Result<RemoteOutput, TransportError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => TransportError::CommandNotFound {
                    program: self.program.clone(),
                },
                _ => TransportError::Spawn {
                    program: self.program.clone(),
                    source,
                },
            })?;
        Ok(RemoteOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

impl RemoteTransport for ShellTransport {
    fn run(&self, command: &str) -> Result<RemoteOutput, TransportError> {
        let mut args: Vec<&str> = self.prefix.iter().map(String::as_str).collect();
        args.extend(["sh", "-c", command]);
        tracing::debug!(program = %self.program, "remote: {}", abbreviate(command));
        self.exec(&args)
    }

    fn preflight(&self) -> Result<(), TransportError> {
        let version = self.exec(&["--version"])?;
        if !version.success() {
            return Err(TransportError::Unavailable {
                program: self.program.clone(),
                detail: version.stderr.trim().to_string(),
            });
        }
        tracing::debug!("{} {}", self.program, version.stdout.trim());

        let whoami = self.exec(&["whoami"])?;
        if !whoami.success() {
            return Err(TransportError::NotAuthenticated {
                program: self.program.clone(),
                detail: whoami.stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Commands can carry kilobytes of base64; keep debug logs readable.
fn abbreviate(command: &str) -> String {
    const MAX: usize = 120;
    if command.len() <= MAX {
        return command.to_string();
    }
    let cut = (0..=MAX).rev().find(|&i| command.is_char_boundary(i)).unwrap_or(0);
    format!("{}... ({} bytes)", &command[..cut], command.len())
}
