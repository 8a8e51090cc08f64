//! Shell command construction for the remote side.
//!
//! Every command the protocol sends is built here. Paths are always
//! single-quoted through [`shell_quote`]; base64 payloads only contain
//! `[A-Za-z0-9+/=]` and are quoted the same way.

use base64::prelude::{Engine as _, BASE64_STANDARD};

/// Largest base64 payload sent inline in one command. Linux caps a single
/// argv element at 128 KiB, so stay well under it.
pub const MAX_INLINE_BASE64: usize = 64 * 1024;

/// Chunk size for payloads above [`MAX_INLINE_BASE64`].
pub const CHUNK_BASE64: usize = 64 * 1024;

/// Exit status the verify command uses when `sha256sum` is unavailable.
pub const EXIT_TOOL_MISSING: i32 = 127;

/// Quote `s` for POSIX `sh`.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

pub fn mkdir_command(dir: &str) -> String {
    format!("mkdir -p {}", shell_quote(dir))
}

/// Prints exactly one of `writable`, `readonly` or `missing`.
pub fn probe_dir_command(dir: &str) -> String {
    let q = shell_quote(dir);
    format!(
        "if [ -w {q} ]; then echo writable; elif [ -d {q} ]; then echo readonly; else echo missing; fi"
    )
}

/// Commands that recreate `bytes` at `path` on the remote side.
///
/// The payload is decoded into `<path>.tmp` and moved over `path`, so the
/// live file is only replaced by a complete copy. Small payloads take one
/// command. Larger ones are appended to `<path>.b64` chunk by chunk, then
/// decoded; the final command removes both staging files whatever happens.
/// Commands must run in order and stop at the first failure; run
/// [`cleanup_write_command`] after a failure.
pub fn write_base64_commands(path: &str, bytes: &[u8]) -> Vec<String> {
    let encoded = BASE64_STANDARD.encode(bytes);
    let target = shell_quote(path);
    let tmp = shell_quote(&format!("{path}.tmp"));
    if encoded.len() <= MAX_INLINE_BASE64 {
        return vec![format!(
            "printf '%s' '{encoded}' | base64 -d > {tmp} && mv -f {tmp} {target} || {{ rm -f {tmp}; exit 1; }}"
        )];
    }

    let staging = shell_quote(&format!("{path}.b64"));
    let mut commands = vec![format!(": > {staging}")];
    // base64 output is ASCII, so byte chunks are valid str slices.
    for chunk in encoded.as_bytes().chunks(CHUNK_BASE64) {
        let chunk = String::from_utf8_lossy(chunk);
        commands.push(format!("printf '%s' '{chunk}' >> {staging}"));
    }
    commands.push(format!(
        "base64 -d {staging} > {tmp} && mv -f {tmp} {target}; status=$?; rm -f {staging} {tmp}; exit $status"
    ));
    commands
}

/// Removes the staging files a failed [`write_base64_commands`] run can leave.
pub fn cleanup_write_command(path: &str) -> String {
    format!(
        "rm -f {} {}",
        shell_quote(&format!("{path}.b64")),
        shell_quote(&format!("{path}.tmp"))
    )
}

/// Prints `<hex digest>  <path>`, or exits [`EXIT_TOOL_MISSING`].
pub fn sha256_command(path: &str) -> String {
    format!(
        "command -v sha256sum >/dev/null 2>&1 || exit {EXIT_TOOL_MISSING}; sha256sum {}",
        shell_quote(path)
    )
}

pub fn cat_command(path: &str) -> String {
    format!("cat {}", shell_quote(path))
}

/// Parent directory of a remote file path (POSIX separators).
pub fn remote_parent(path: &str) -> &str {
    match path.trim_end_matches('/').rsplit_once('/') {
        Some(("", _)) => "/",
        Some((parent, _)) => parent,
        None => ".",
    }
}

/// `<dir>/<name>` without doubling the separator.
pub fn remote_join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_escapes_single_quotes() {
        assert_eq!(shell_quote("/data/images"), "'/data/images'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[test]
    fn mkdir_and_probe() {
        assert_eq!(mkdir_command("/app/data"), "mkdir -p '/app/data'");
        let probe = probe_dir_command("/data");
        assert!(probe.starts_with("if [ -w '/data' ]"));
        assert!(probe.contains("echo readonly"));
        assert!(probe.contains("echo missing"));
    }

    #[test]
    fn small_payload_is_one_command() {
        let cmds = write_base64_commands("/data/database.json", b"{\"pages\":[]}");
        assert_eq!(
            cmds,
            ["printf '%s' 'eyJwYWdlcyI6W119' | base64 -d > '/data/database.json.tmp' \
              && mv -f '/data/database.json.tmp' '/data/database.json' \
              || { rm -f '/data/database.json.tmp'; exit 1; }"]
        );
    }

    #[test]
    fn target_is_never_the_decode_destination() {
        let small = write_base64_commands("/data/database.json", b"{}");
        let big = write_base64_commands("/data/database.json", &vec![7u8; 100 * 1024]);
        for cmd in small.iter().chain(&big) {
            assert!(!cmd.contains("> '/data/database.json'"), "{cmd}");
        }
    }

    #[test]
    fn large_payload_is_chunked_through_staging_file() {
        let bytes = vec![0xABu8; 100 * 1024];
        let cmds = write_base64_commands("/data/images/big.png", &bytes);
        let encoded_len = BASE64_STANDARD.encode(&bytes).len();
        let chunks = encoded_len.div_ceil(CHUNK_BASE64);

        assert_eq!(cmds.len(), chunks + 2);
        assert_eq!(cmds[0], ": > '/data/images/big.png.b64'");
        assert!(cmds[1..=chunks]
            .iter()
            .all(|c| c.ends_with(">> '/data/images/big.png.b64'")));
        assert_eq!(
            cmds.last().unwrap(),
            "base64 -d '/data/images/big.png.b64' > '/data/images/big.png.tmp' \
             && mv -f '/data/images/big.png.tmp' '/data/images/big.png'; status=$?; \
             rm -f '/data/images/big.png.b64' '/data/images/big.png.tmp'; exit $status"
        );
        assert_eq!(
            cleanup_write_command("/data/images/big.png"),
            "rm -f '/data/images/big.png.b64' '/data/images/big.png.tmp'"
        );

        let rejoined: String = cmds[1..=chunks]
            .iter()
            .map(|c| {
                c.trim_start_matches("printf '%s' '")
                    .split('\'')
                    .next()
                    .unwrap()
            })
            .collect();
        assert_eq!(BASE64_STANDARD.decode(rejoined).unwrap(), bytes);
    }

    #[test]
    fn payload_at_limit_stays_inline() {
        // 3 bytes -> 4 base64 chars; this is exactly MAX_INLINE_BASE64 chars.
        let bytes = vec![1u8; MAX_INLINE_BASE64 / 4 * 3];
        assert_eq!(write_base64_commands("/x", &bytes).len(), 1);
    }

    #[test]
    fn verify_and_cat() {
        assert_eq!(
            sha256_command("/data/database.json"),
            "command -v sha256sum >/dev/null 2>&1 || exit 127; sha256sum '/data/database.json'"
        );
        assert_eq!(cat_command("/a b"), "cat '/a b'");
    }

    #[test]
    fn parents_and_joins() {
        assert_eq!(remote_parent("/data/database.json"), "/data");
        assert_eq!(remote_parent("/database.json"), "/");
        assert_eq!(remote_parent("database.json"), ".");
        assert_eq!(remote_join("/data/images/", "a.png"), "/data/images/a.png");
    }
}
