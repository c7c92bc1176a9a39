//! Links from `*_id` fields to the records they point at.
//!
//! Declared relations win. Undeclared `<name>_id` fields are matched against
//! registered panels by naming convention: for `author_id` on `blog_posts`
//! the candidates are `blog_authors`, `blog_author`, `authors` and `author`.

use crate::query::append_query;
use quickstart_core::record::{self, Record};
use quickstart_core::{PanelSchema, RelationSpec};
use quickstart_panels::PanelRegistry;
use serde_json::{Map, Value};

/// A resolved link target for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationLink {
    pub field: String,
    /// Relation name (`author` for `author_id`).
    pub name: String,
    pub url: String,
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y')
        && !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
    {
        return format!("{}ies", stem);
    }
    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// Panel names tried for `relation` referenced from `panel`.
pub fn candidate_panels(panel: &str, relation: &str) -> Vec<String> {
    let plural = pluralize(relation);
    let mut candidates = Vec::new();
    if let Some((prefix, _)) = panel.rsplit_once('_') {
        candidates.push(format!("{}_{}", prefix, plural));
        candidates.push(format!("{}_{}", prefix, relation));
    }
    candidates.push(plural);
    candidates.push(relation.to_string());
    candidates.dedup();
    candidates
}

fn explicit_relation<'a>(schema: &'a PanelSchema, field: &str) -> Option<&'a RelationSpec> {
    schema.relations.iter().find(|r| r.field == field)
}

/// Resolve links for every relation-looking field of `item`.
pub fn resolve_links(
    registry: &PanelRegistry,
    panel: &str,
    schema: &PanelSchema,
    item: &Record,
    environment: Option<&str>,
    link_base: &str,
) -> Vec<RelationLink> {
    let presented = record::presented(item);
    let mut links = Vec::new();

    for (field, value) in &presented {
        if field == "id" {
            continue;
        }
        let Some(target_id) = record::value_to_string(value) else {
            continue;
        };

        let (name, target) = match explicit_relation(schema, field) {
            Some(spec) => (
                spec.name
                    .clone()
                    .unwrap_or_else(|| field.trim_end_matches("_id").to_string()),
                registry.get(&spec.panel, environment),
            ),
            None => {
                let Some(relation) = field.strip_suffix("_id").filter(|r| !r.is_empty()) else {
                    continue;
                };
                let target = candidate_panels(panel, relation)
                    .into_iter()
                    .find_map(|candidate| registry.get(&candidate, environment));
                (relation.to_string(), target)
            }
        };

        // Custom-owned panels are not reachable under /content.
        let Some(target) = target.filter(|t| !t.schema().is_custom_owned()) else {
            tracing::debug!(panel = %panel, field = %field, "No panel found for relation");
            continue;
        };
        let url = format!(
            "{}/content/{}/{}",
            link_base,
            target.name(),
            urlencoding::encode(&target_id)
        );
        let url = match environment {
            Some(env) => append_query(&url, &[("env", env)]),
            None => url,
        };
        links.push(RelationLink {
            field: field.clone(),
            name,
            url,
        });
    }
    links
}

/// Attach `<name>_url` keys and a `links` map to `item`.
pub fn attach_links(item: &mut Record, links: &[RelationLink]) {
    if links.is_empty() {
        return;
    }
    let mut map = Map::new();
    for link in links {
        item.insert(format!("{}_url", link.name), Value::String(link.url.clone()));
        map.insert(link.name.clone(), Value::String(link.url.clone()));
    }
    item.insert("links".to_string(), Value::Object(map));
}
