//! Image reference discovery.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::walk::{index, walk};

/// File extensions treated as bare image references.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".svg", ".gif", ".webp"];

/// Public URL base assumed by [`extract_blob_filenames`].
pub const DEFAULT_PUBLIC_BASE: &str = "/images";

/// Which field a reference was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKey {
    Image,
    Images,
}

impl ImageKey {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "image" => Some(ImageKey::Image),
            "images" => Some(ImageKey::Images),
            _ => None,
        }
    }
}

/// One image reference, located by its path in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    pub path: String,
    pub value: String,
    pub kind: ImageKey,
}

/// Every non-blank string under an `image` or `images` field, in document
/// order. Array elements get their index appended to the path.
pub fn find_image_references(tree: &Value) -> Vec<ImageReference> {
    let mut refs = Vec::new();
    walk(tree, "", &mut |path: &str, key: &str, value: &Value| {
        let Some(kind) = ImageKey::from_key(key) else {
            return;
        };
        match value {
            Value::String(s) if !s.trim().is_empty() => refs.push(ImageReference {
                path: path.to_string(),
                value: s.clone(),
                kind,
            }),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if let Value::String(s) = item {
                        if !s.trim().is_empty() {
                            refs.push(ImageReference {
                                path: index(path, i),
                                value: s.clone(),
                                kind,
                            });
                        }
                    }
                }
            }
            _ => {}
        }
    });
    refs
}

/// Blob file names referenced anywhere in `tree`, assuming blobs are served
/// under `/images`.
pub fn extract_blob_filenames(tree: &Value) -> BTreeSet<String> {
    extract_blob_filenames_under(tree, DEFAULT_PUBLIC_BASE)
}

/// A reference that resolves to a file in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobReference {
    pub path: String,
    pub value: String,
    /// File name inside the store.
    pub name: String,
}

/// Blob references under `image`, `images`, `url` or `file` fields, in
/// document order.
///
/// A value containing `<base>/` contributes whatever follows it, minus any
/// query string or fragment. Otherwise a value ending in one of
/// [`IMAGE_EXTENSIONS`] is taken as a bare file name.
pub fn find_blob_references_under(tree: &Value, base: &str) -> Vec<BlobReference> {
    let marker = format!("{}/", base.trim_end_matches('/'));
    let mut refs = Vec::new();
    walk(tree, "", &mut |path: &str, key: &str, value: &Value| {
        if !matches!(key, "image" | "images" | "url" | "file") {
            return;
        }
        let mut consider = |path: String, s: &str| {
            if let Some(name) = blob_name(s, &marker) {
                refs.push(BlobReference {
                    path,
                    value: s.to_string(),
                    name,
                });
            }
        };
        match value {
            Value::String(s) => consider(path.to_string(), s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if let Value::String(s) = item {
                        consider(index(path, i), s);
                    }
                }
            }
            _ => {}
        }
    });
    refs
}

/// Distinct file names from [`find_blob_references_under`].
pub fn extract_blob_filenames_under(tree: &Value, base: &str) -> BTreeSet<String> {
    find_blob_references_under(tree, base)
        .into_iter()
        .map(|r| r.name)
        .collect()
}

fn blob_name(value: &str, marker: &str) -> Option<String> {
    let value = value.trim();
    if let Some(idx) = value.find(marker) {
        let rest = &value[idx + marker.len()..];
        let end = rest.find(['?', '#']).unwrap_or(rest.len());
        let name = &rest[..end];
        return (!name.is_empty()).then(|| name.to_string());
    }
    let lower = value.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext))
        .then(|| value.to_string())
}

/// Referenced blob names split by local availability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageAudit {
    pub present: BTreeSet<String>,
    pub missing: BTreeSet<String>,
}

impl ImageAudit {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn audit_images(tree: &Value, local: &BTreeSet<String>) -> ImageAudit {
    audit_images_under(tree, DEFAULT_PUBLIC_BASE, local)
}

/// [`audit_images`] for a store served under `base`.
pub fn audit_images_under(tree: &Value, base: &str, local: &BTreeSet<String>) -> ImageAudit {
    let (present, missing) = extract_blob_filenames_under(tree, base)
        .into_iter()
        .partition(|name| local.contains(name));
    ImageAudit { present, missing }
}
