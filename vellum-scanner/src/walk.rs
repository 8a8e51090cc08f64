//! Depth-first visitor over `serde_json::Value` trees.
//!
//! Paths use dotted keys and bracketed indices: `hero.image`,
//! `gallery.images[1]`, `[0].image` for a root array.

use serde_json::{Map, Value};

/// Call `f(path, key, value)` for every object entry under `value`, in
/// document order, parents before children.
pub(crate) fn walk<'a, F>(value: &'a Value, path: &str, f: &mut F)
where
    F: FnMut(&str, &str, &'a Value),
{
    match value {
        Value::Object(map) => walk_map(map, path, f),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(item, &index(path, i), f);
            }
        }
        _ => {}
    }
}

pub(crate) fn walk_map<'a, F>(map: &'a Map<String, Value>, path: &str, f: &mut F)
where
    F: FnMut(&str, &str, &'a Value),
{
    for (key, value) in map {
        let child = field(path, key);
        f(&child, key, value);
        walk(value, &child, f);
    }
}

pub(crate) fn field(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

pub(crate) fn index(path: &str, i: usize) -> String {
    format!("{path}[{i}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_follow_nesting() {
        let tree = json!([{ "a": { "b": [ { "c": 1 } ] } }]);
        let mut seen = Vec::new();
        walk(&tree, "", &mut |path: &str, _key: &str, _v: &Value| seen.push(path.to_string()));
        assert_eq!(seen, ["[0].a", "[0].a.b", "[0].a.b[0].c"]);
    }
}
