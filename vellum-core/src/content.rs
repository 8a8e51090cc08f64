//! Field-level mutations on an in-memory [`Document`].
//!
//! Nothing here touches the filesystem. Callers load the document, apply one
//! of these operations, and persist with a full write (usually through
//! [`DocumentStore::update`](crate::store::DocumentStore::update)).

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::types::{Document, Icon, IconId, Page, Timestamp, MAX_ICONS};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Look a page up by id, falling back to its URL path.
///
/// The path fallback maps `home` to `/` and any other key `k` to `/k`.
pub fn find_page<'a>(doc: &'a Document, key: &str) -> Option<&'a Page> {
    if let Some(page) = doc.pages.iter().find(|p| p.id.0 == key) {
        return Some(page);
    }
    let path = if key == "home" {
        "/".to_string()
    } else {
        format!("/{}", key.trim_start_matches('/'))
    };
    doc.pages.iter().find(|p| p.path == path)
}

/// Partial page update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageUpdate {
    pub content: Option<String>,
    pub sections: Option<Map<String, Value>>,
}

/// Apply `update` to the page with id `id` and stamp `updatedAt`.
pub fn update_page<'a>(
    doc: &'a mut Document,
    id: &str,
    update: PageUpdate,
) -> Result<&'a Page, StoreError> {
    let page = doc
        .pages
        .iter_mut()
        .find(|p| p.id.0 == id)
        .ok_or_else(|| StoreError::PageNotFound { id: id.to_string() })?;
    if let Some(content) = update.content {
        page.content = content;
    }
    if let Some(sections) = update.sections {
        page.sections = Some(sections);
    }
    page.updated_at = Some(Timestamp::now());
    Ok(page)
}

// ---------------------------------------------------------------------------
// Icons
// ---------------------------------------------------------------------------

/// Derive an icon id: lowercase, non-alphanumeric runs collapsed to one `-`,
/// leading and trailing `-` stripped.
pub fn icon_id_from_name(name: &str) -> IconId {
    let mut id = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !id.is_empty() {
                id.push('-');
            }
            pending_dash = false;
            id.push(c);
        } else {
            pending_dash = true;
        }
    }
    IconId(id)
}

/// Create an icon from `name` and raw `svg` markup.
///
/// Fails when either input is blank, when the document already holds
/// [`MAX_ICONS`] icons, or when the derived id is taken.
pub fn create_icon(doc: &mut Document, name: &str, svg: &str) -> Result<Icon, StoreError> {
    if name.trim().is_empty() || svg.trim().is_empty() {
        return Err(StoreError::Validation("name and svg are required".into()));
    }
    if doc.icons.len() >= MAX_ICONS {
        return Err(StoreError::IconLimit { max: MAX_ICONS });
    }
    let id = icon_id_from_name(name);
    if id.0.is_empty() {
        return Err(StoreError::Validation(format!(
            "icon name '{name}' contains no letters or digits"
        )));
    }
    if doc.icons.iter().any(|icon| icon.id == id) {
        return Err(StoreError::IconIdCollision { id: id.0 });
    }
    let icon = Icon {
        id,
        name: name.to_string(),
        svg: svg.to_string(),
        created_at: Some(Timestamp::now()),
        updated_at: None,
        extra: Map::new(),
    };
    doc.icons.push(icon.clone());
    Ok(icon)
}

/// Rename an icon and/or replace its markup. The id never changes.
pub fn update_icon<'a>(
    doc: &'a mut Document,
    id: &str,
    name: Option<&str>,
    svg: Option<&str>,
) -> Result<&'a Icon, StoreError> {
    let icon = doc
        .icons
        .iter_mut()
        .find(|icon| icon.id.0 == id)
        .ok_or_else(|| StoreError::IconNotFound { id: id.to_string() })?;
    if let Some(name) = name {
        icon.name = name.to_string();
    }
    if let Some(svg) = svg {
        icon.svg = svg.to_string();
    }
    icon.updated_at = Some(Timestamp::now());
    Ok(icon)
}

/// Remove an icon. References to it elsewhere in the document are left
/// dangling; see the scanner's icon audit.
pub fn delete_icon(doc: &mut Document, id: &str) -> Result<Icon, StoreError> {
    let index = doc
        .icons
        .iter()
        .position(|icon| icon.id.0 == id)
        .ok_or_else(|| StoreError::IconNotFound { id: id.to_string() })?;
    Ok(doc.icons.remove(index))
}

/// SVG markup for `id`, or an empty string when the icon does not exist.
pub fn icon_svg<'a>(doc: &'a Document, id: &str) -> &'a str {
    if id.is_empty() {
        return "";
    }
    doc.icons
        .iter()
        .find(|icon| icon.id.0 == id)
        .map(|icon| icon.svg.as_str())
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const SVG: &str = "<svg viewBox=\"0 0 24 24\"></svg>";

    #[rstest]
    #[case("Open Book", "open-book")]
    #[case("  Graduation  Cap!! ", "graduation-cap")]
    #[case("--Lab_Flask--", "lab-flask")]
    #[case("Über Icon 2", "ber-icon-2")]
    #[case("ALLCAPS", "allcaps")]
    fn icon_ids_from_names(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(icon_id_from_name(name).0, expected);
    }

    #[test]
    fn create_icon_assigns_derived_id() {
        let mut doc = Document::default();
        let icon = create_icon(&mut doc, "Open Book", SVG).expect("create");
        assert_eq!(icon.id.0, "open-book");
        assert_eq!(doc.icons.len(), 1);
    }

    #[test]
    fn colliding_icon_id_is_rejected() {
        let mut doc = Document::default();
        create_icon(&mut doc, "Open Book", SVG).unwrap();
        let err = create_icon(&mut doc, "open   book!", SVG).unwrap_err();
        assert!(matches!(err, StoreError::IconIdCollision { ref id } if id == "open-book"));
        assert_eq!(doc.icons.len(), 1);
    }

    #[test]
    fn twenty_first_icon_is_rejected() {
        let mut doc = Document::default();
        for i in 0..MAX_ICONS {
            create_icon(&mut doc, &format!("icon {i}"), SVG).unwrap();
        }
        let err = create_icon(&mut doc, "brand new name", SVG).unwrap_err();
        assert!(matches!(err, StoreError::IconLimit { max: 20 }));
        assert_eq!(doc.icons.len(), MAX_ICONS);
    }

    #[test]
    fn blank_inputs_are_rejected() {
        let mut doc = Document::default();
        assert!(matches!(
            create_icon(&mut doc, " ", SVG),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            create_icon(&mut doc, "x", ""),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            create_icon(&mut doc, "!!!", SVG),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn update_and_delete_icon() {
        let mut doc = Document::default();
        create_icon(&mut doc, "Open Book", SVG).unwrap();
        let updated = update_icon(&mut doc, "open-book", Some("Closed Book"), None).unwrap();
        assert_eq!(updated.name, "Closed Book");
        assert_eq!(updated.id.0, "open-book");
        assert!(updated.updated_at.is_some());

        assert_eq!(icon_svg(&doc, "open-book"), SVG);
        delete_icon(&mut doc, "open-book").unwrap();
        assert_eq!(icon_svg(&doc, "open-book"), "");
        assert!(matches!(
            delete_icon(&mut doc, "open-book"),
            Err(StoreError::IconNotFound { .. })
        ));
    }

    #[test]
    fn find_page_prefers_id_then_path() {
        let doc = Document::default();
        assert_eq!(find_page(&doc, "about").unwrap().id.0, "about");
        assert_eq!(find_page(&doc, "home").unwrap().path, "/");

        let mut doc = Document::default();
        doc.pages.push(Page::new("team-page", "/team", "Team"));
        assert_eq!(find_page(&doc, "team").unwrap().id.0, "team-page");
        assert!(find_page(&doc, "missing").is_none());
    }

    #[test]
    fn update_page_sets_fields_and_timestamp() {
        let mut doc = Document::default();
        let mut sections = Map::new();
        sections.insert("hero".into(), json!({ "image": "/images/hero.jpg" }));
        let page = update_page(
            &mut doc,
            "home",
            PageUpdate {
                content: Some("Welcome".into()),
                sections: Some(sections.clone()),
            },
        )
        .unwrap();
        assert_eq!(page.content, "Welcome");
        assert_eq!(page.sections.as_ref(), Some(&sections));
        assert!(page.updated_at.is_some());

        let err = update_page(&mut doc, "nope", PageUpdate::default()).unwrap_err();
        assert!(matches!(err, StoreError::PageNotFound { .. }));
    }
}
