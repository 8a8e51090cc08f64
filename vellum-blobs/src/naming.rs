//! Blob file naming and content types.

/// Extension given to names that arrive without one.
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Stem used when nothing usable survives sanitization.
pub const DEFAULT_STEM: &str = "image";

/// Normalize an arbitrary upload name into a safe blob file name.
///
/// Lowercases, replaces every run of characters outside `[a-z0-9_.-]` with a
/// single `-`, collapses repeated `-`, and strips `-` from both ends of the
/// stem. A name without an extension gets [`DEFAULT_EXTENSION`].
///
/// ```
/// use vellum_blobs::sanitize_filename;
/// assert_eq!(sanitize_filename("My Photo!!.PNG"), "my-photo.png");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        let keep = c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-');
        let c = if keep { c } else { '-' };
        if matches!(c, '-' | '.') && cleaned.ends_with(c) {
            continue;
        }
        cleaned.push(c);
    }
    let cleaned = cleaned.trim_end_matches('-');

    let (stem, ext) = split_extension(cleaned);
    let stem = stem.trim_matches(|c| c == '-' || c == '.');
    let stem = if stem.is_empty() { DEFAULT_STEM } else { stem };
    let ext = ext.unwrap_or(DEFAULT_EXTENSION);
    format!("{stem}{ext}")
}

/// Split `name` into stem and `.ext`. The extension must be non-empty and
/// alphanumeric, and a leading dot never starts one.
pub(crate) fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx)
            if idx > 0
                && idx + 1 < name.len()
                && name[idx + 1..].chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (&name[..idx], Some(&name[idx..]))
        }
        _ => (name, None),
    }
}

/// Whether `name` can be joined onto the store directory without escaping it.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

/// Content type for a blob file name, by extension.
pub fn resolve_content_type(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
