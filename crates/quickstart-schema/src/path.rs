//! Dotted-path access into nested JSON maps.

use serde_json::{Map, Value};

/// Write `value` at a `.`-separated `path`, creating intermediate objects.
///
/// Non-object intermediates are replaced.
pub fn set_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').filter(|s| !s.is_empty()).peekable();
    let mut current = target;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

/// Read the value at a `.`-separated `path`.
pub fn get_path<'a>(source: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.').filter(|s| !s.is_empty());
    let first = segments.next()?;
    let mut current = source.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get_nested() {
        let mut map = Map::new();
        set_path(&mut map, "seo.meta.title", json!("Hello"));
        set_path(&mut map, "seo.noindex", json!(true));
        set_path(&mut map, "title", json!("Top"));

        assert_eq!(
            Value::Object(map.clone()),
            json!({"title": "Top", "seo": {"noindex": true, "meta": {"title": "Hello"}}})
        );
        assert_eq!(get_path(&map, "seo.meta.title"), Some(&json!("Hello")));
        assert_eq!(get_path(&map, "seo.missing"), None);
        assert_eq!(get_path(&map, "title.nope"), None);
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut map = Map::new();
        set_path(&mut map, "seo", json!("flat"));
        set_path(&mut map, "seo.title", json!("x"));
        assert_eq!(Value::Object(map), json!({"seo": {"title": "x"}}));
    }
}
