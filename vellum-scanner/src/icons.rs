//! Icon reference discovery and auditing.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use vellum_core::{Document, IconId};

use crate::walk::{field, index, walk, walk_map};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconReference {
    pub path: String,
    pub id: String,
}

/// Every non-empty string `iconId` field under `tree`.
pub fn find_icon_references(tree: &Value) -> Vec<IconReference> {
    let mut refs = Vec::new();
    walk(tree, "", &mut collect_into(&mut refs));
    refs
}

/// Icon references across the content regions of a document: pages
/// (sections and unknown fields), team, services, settings and unknown
/// top-level keys. The icon list itself is not scanned.
pub fn find_document_icon_references(doc: &Document) -> Vec<IconReference> {
    let mut refs = Vec::new();
    let mut collect = collect_into(&mut refs);
    for (i, page) in doc.pages.iter().enumerate() {
        let page_path = index("pages", i);
        if let Some(sections) = &page.sections {
            walk_map(sections, &field(&page_path, "sections"), &mut collect);
        }
        walk_map(&page.extra, &page_path, &mut collect);
    }
    for (region, items) in [("team", &doc.team), ("services", &doc.services)] {
        for (i, item) in items.iter().enumerate() {
            walk(item, &index(region, i), &mut collect);
        }
    }
    walk_map(&doc.settings, "settings", &mut collect);
    walk_map(&doc.extra, "", &mut collect);
    drop(collect);
    refs
}

fn collect_into(refs: &mut Vec<IconReference>) -> impl FnMut(&str, &str, &Value) + '_ {
    move |path, key, value| {
        if key != "iconId" {
            return;
        }
        if let Value::String(id) = value {
            if !id.is_empty() {
                refs.push(IconReference {
                    path: path.to_string(),
                    id: id.clone(),
                });
            }
        }
    }
}

/// Cross-check of icon references against the icon list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IconAudit {
    /// Distinct ids referenced anywhere.
    pub referenced: BTreeSet<String>,
    /// References whose id has no icon.
    pub missing: Vec<IconReference>,
    /// Icons nothing references, in list order.
    pub unused: Vec<IconId>,
}

impl IconAudit {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn audit_icons(doc: &Document) -> IconAudit {
    let refs = find_document_icon_references(doc);
    let known: BTreeSet<&str> = doc.icons.iter().map(|icon| icon.id.0.as_str()).collect();
    let referenced: BTreeSet<String> = refs.iter().map(|r| r.id.clone()).collect();
    let missing = refs
        .into_iter()
        .filter(|r| !known.contains(r.id.as_str()))
        .collect();
    let unused = doc
        .icons
        .iter()
        .filter(|icon| !referenced.contains(&icon.id.0))
        .map(|icon| icon.id.clone())
        .collect();
    IconAudit {
        referenced,
        missing,
        unused,
    }
}
