//! Local vs remote document comparison for `vellum diff`.

use serde_json::Value;
use similar::TextDiff;

/// Unified diff from `remote` to `local`; empty when they match.
///
/// Inputs that parse as JSON are re-serialized first so formatting-only
/// differences do not show up.
pub fn diff_documents(local: &str, remote: &str) -> String {
    let local = normalize(local);
    let remote = normalize(remote);
    if local == remote {
        return String::new();
    }
    TextDiff::from_lines(&remote, &local)
        .unified_diff()
        .header("remote", "local")
        .context_radius(3)
        .to_string()
}

fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let pretty = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok());
    match pretty {
        Some(mut pretty) => {
            pretty.push('\n');
            pretty
        }
        None => text,
    }
}
