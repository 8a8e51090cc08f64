//! In-memory stand-in for the remote container.
//!
//! Interprets exactly the command shapes `vellum_sync::command` produces and
//! keeps a log of every command it was asked to run.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use base64::prelude::{Engine as _, BASE64_STANDARD};
use sha2::{Digest, Sha256};
use vellum_sync::command::remote_parent;
use vellum_sync::{RemoteOutput, RemoteTransport, TransportError};

#[derive(Default)]
pub struct FakeRemote {
    /// Directories that exist (or can be created) and accept writes.
    pub writable: BTreeSet<String>,
    /// Directories that exist but reject writes.
    pub readonly: BTreeSet<String>,
    /// File paths whose writes fail.
    pub fail_paths: BTreeSet<String>,
    pub no_sha256: bool,
    /// Store one extra byte on every write.
    pub corrupt_writes: bool,
    pub unauthenticated: bool,
    /// Chunk appends to staging files fail.
    pub fail_appends: bool,
    /// The session expires once directory discovery is done.
    pub session_expires_after_mkdir: bool,
    /// Number of upcoming `mkdir` calls on image directories that fail.
    pub flaky_image_mkdirs: Cell<usize>,
    pub files: RefCell<BTreeMap<String, Vec<u8>>>,
    pub staging: RefCell<BTreeMap<String, String>>,
    pub log: RefCell<Vec<String>>,
}

impl FakeRemote {
    pub fn with_writable(dirs: &[&str]) -> Self {
        Self {
            writable: dirs.iter().map(|d| d.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn write(&self, path: &str, bytes: Vec<u8>) -> RemoteOutput {
        if !self.writable.contains(remote_parent(path)) {
            return fail(2, "Read-only file system");
        }
        if self.fail_paths.contains(path) {
            return fail(1, "No space left on device");
        }
        let mut bytes = bytes;
        if self.corrupt_writes {
            bytes.push(b'x');
        }
        self.files.borrow_mut().insert(path.to_string(), bytes);
        ok("")
    }
}

fn ok(stdout: &str) -> RemoteOutput {
    RemoteOutput {
        stdout: stdout.to_string(),
        ..RemoteOutput::default()
    }
}

fn fail(code: i32, stderr: &str) -> RemoteOutput {
    RemoteOutput {
        stderr: stderr.to_string(),
        exit_code: code,
        ..RemoteOutput::default()
    }
}

/// Single-quoted arguments in order of appearance.
fn quoted(command: &str) -> Vec<String> {
    command
        .split('\'')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, s)| s.to_string())
        .collect()
}

impl RemoteTransport for FakeRemote {
    fn run(&self, command: &str) -> Result<RemoteOutput, TransportError> {
        self.log.borrow_mut().push(command.to_string());
        let q = quoted(command);

        if self.session_expires_after_mkdir && !command.starts_with("mkdir -p ") {
            return Err(TransportError::NotAuthenticated {
                program: "railway".into(),
                detail: "Unauthorized. Please login".into(),
            });
        }

        let out = if command.starts_with("mkdir -p ") {
            let dir = &q[0];
            if dir.ends_with("images") && self.flaky_image_mkdirs.get() > 0 {
                self.flaky_image_mkdirs.set(self.flaky_image_mkdirs.get() - 1);
                fail(1, "mkdir: cannot create directory")
            } else if self.writable.contains(dir) || self.readonly.contains(dir) {
                ok("")
            } else {
                fail(1, "mkdir: Permission denied")
            }
        } else if command.starts_with("if [ -w ") {
            let dir = &q[0];
            if self.writable.contains(dir) {
                ok("writable\n")
            } else if self.readonly.contains(dir) {
                ok("readonly\n")
            } else {
                ok("missing\n")
            }
        } else if command.starts_with(": > ") {
            self.staging.borrow_mut().insert(q[0].clone(), String::new());
            ok("")
        } else if command.starts_with("printf") && command.contains(">> ") {
            if self.fail_appends {
                return Ok(fail(1, "No space left on device"));
            }
            let mut staging = self.staging.borrow_mut();
            match staging.get_mut(&q[2]) {
                Some(buf) => {
                    buf.push_str(&q[1]);
                    ok("")
                }
                None => fail(1, "no staging file"),
            }
        } else if command.starts_with("printf") {
            // printf '%s' '<b64>' | base64 -d > 'tmp' && mv -f 'tmp' 'target' ...
            match BASE64_STANDARD.decode(&q[1]) {
                Ok(bytes) => self.write(&q[4], bytes),
                Err(_) => fail(1, "base64: invalid input"),
            }
        } else if command.starts_with("base64 -d ") {
            // base64 -d 'staging' > 'tmp' && mv -f 'tmp' 'target'; ...
            let staged = self.staging.borrow_mut().remove(&q[0]);
            match staged.map(|s| BASE64_STANDARD.decode(s)) {
                Some(Ok(bytes)) => self.write(&q[3], bytes),
                _ => fail(1, "base64: invalid input"),
            }
        } else if command.starts_with("rm -f ") {
            let mut staging = self.staging.borrow_mut();
            for path in &q {
                staging.remove(path);
            }
            ok("")
        } else if command.starts_with("command -v sha256sum") {
            if self.no_sha256 {
                fail(127, "")
            } else {
                match self.file(&q[0]) {
                    Some(bytes) => ok(&format!(
                        "{}  {}\n",
                        hex::encode(Sha256::digest(&bytes)),
                        q[0]
                    )),
                    None => fail(1, "sha256sum: No such file or directory"),
                }
            }
        } else if command.starts_with("cat ") {
            match self.file(&q[0]) {
                Some(bytes) => ok(&String::from_utf8_lossy(&bytes)),
                None => fail(1, "cat: No such file or directory"),
            }
        } else {
            fail(127, "sh: command not found")
        };
        Ok(out)
    }

    fn preflight(&self) -> Result<(), TransportError> {
        if self.unauthenticated {
            return Err(TransportError::NotAuthenticated {
                program: "railway".into(),
                detail: "Unauthorized. Please login".into(),
            });
        }
        Ok(())
    }
}
