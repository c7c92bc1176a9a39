//! Query-string handling: parameter lookup, list options and URL building.

use crate::columns::FilterDescriptor;
use axum::http::Uri;
use quickstart_core::record::MAX_PER_PAGE;
use quickstart_core::{FilterPredicate, ListOptions};

/// Parameters that steer the console rather than filter records.
pub const RESERVED_PARAMS: &[&str] = &[
    "env",
    "environment",
    "locale",
    "requested_locale",
    "created",
    "page",
    "per_page",
    "sort",
    "q",
    "search",
    "preview_token",
];

/// Operators accepted in `<field>__<op>=value` parameters.
const KNOWN_OPERATORS: &[&str] = &["eq", "ne", "ilike", "like", "in", "gt", "lt"];

/// Decoded query string, in submission order.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
    raw: Option<String>,
}

impl QueryParams {
    pub fn from_uri(uri: &Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    pub fn parse(raw: &str) -> Self {
        let pairs = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self {
            pairs,
            raw: Some(raw.to_string()).filter(|r| !r.is_empty()),
        }
    }

    /// First non-blank value for `key`, trimmed.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The undecoded query string.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Environment passed explicitly: `env`, then `environment`.
    pub fn environment(&self) -> Option<&str> {
        self.get("env").or_else(|| self.get("environment"))
    }

    /// Locale selected for editing: `locale`, then `requested_locale`.
    pub fn requested_locale(&self) -> Option<&str> {
        self.get("locale").or_else(|| self.get("requested_locale"))
    }

    /// `created=1|true|yes|on`.
    pub fn created_marker(&self) -> bool {
        self.get("created").is_some_and(|v| {
            matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        })
    }

    /// Parameters to carry across redirects: environment and requested locale.
    pub fn carried_params(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(env) = self.environment() {
            out.push(("env", env.to_string()));
        }
        if let Some(locale) = self.requested_locale() {
            out.push(("locale", locale.to_string()));
        }
        out
    }

    /// Environment-only subset of [`carried_params`](Self::carried_params).
    pub fn environment_params(&self) -> Vec<(&'static str, String)> {
        self.environment()
            .map(|env| vec![("env", env.to_string())])
            .unwrap_or_default()
    }

    /// Build list options from paging, sorting, search and filter parameters.
    pub fn list_options(&self, filters: &[FilterDescriptor]) -> ListOptions {
        let mut opts = ListOptions::default();

        if let Some(page) = self.get("page").and_then(|p| p.parse::<u64>().ok()) {
            opts.page = page.max(1);
        }
        if let Some(per_page) = self.get("per_page").and_then(|p| p.parse::<u64>().ok()) {
            opts.per_page = per_page.clamp(1, MAX_PER_PAGE);
        }
        if let Some(sort) = self.get("sort") {
            match sort.strip_prefix('-') {
                Some(field) => {
                    opts.sort_by = Some(field.to_string());
                    opts.sort_desc = true;
                }
                None => opts.sort_by = Some(sort.to_string()),
            }
        }
        opts.search = self
            .get("q")
            .or_else(|| self.get("search"))
            .map(str::to_string);

        for (key, value) in &self.pairs {
            let value = value.trim();
            if value.is_empty() || RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }
            if let Some((field, op)) = key.rsplit_once("__")
                && KNOWN_OPERATORS.contains(&op)
                && !field.is_empty()
            {
                opts.predicates.push(FilterPredicate::new(field, op, value));
                continue;
            }
            if let Some(filter) = filters.iter().find(|f| f.name == *key) {
                opts.predicates
                    .push(FilterPredicate::new(key.as_str(), filter.default_operator.as_str(), value));
            }
        }
        opts
    }
}

/// Append `params` to `url`, skipping blank values.
pub fn append_query<K, V>(url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (k, v) in params {
        if v.as_ref().trim().is_empty() {
            continue;
        }
        serializer.append_pair(k.as_ref(), v.as_ref());
        any = true;
    }
    if !any {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, sep, serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(name: &str, default_operator: &str) -> FilterDescriptor {
        FilterDescriptor {
            name: name.to_string(),
            label: name.to_string(),
            filter_type: "text".to_string(),
            operators: vec![default_operator.to_string()],
            default_operator: default_operator.to_string(),
            options: Vec::new(),
        }
    }

    #[test]
    fn test_lookup_and_markers() {
        let q = QueryParams::parse("env=&environment=staging&locale=es&created=YES");
        assert_eq!(q.environment(), Some("staging"));
        assert_eq!(q.requested_locale(), Some("es"));
        assert!(q.created_marker());
        assert_eq!(
            q.carried_params(),
            vec![("env", "staging".to_string()), ("locale", "es".to_string())]
        );
        assert!(!QueryParams::parse("created=0").created_marker());
    }

    #[test]
    fn test_list_options() {
        let q = QueryParams::parse(
            "page=2&per_page=10000&sort=-title&q=hello&status=draft&views__gt=3&slug=x&env=prod&bogus__op=1",
        );
        let opts = q.list_options(&[filter("status", "eq")]);

        assert_eq!(opts.page, 2);
        assert_eq!(opts.per_page, MAX_PER_PAGE);
        assert_eq!(opts.sort_by.as_deref(), Some("title"));
        assert!(opts.sort_desc);
        assert_eq!(opts.search.as_deref(), Some("hello"));
        assert_eq!(
            opts.predicates,
            vec![
                FilterPredicate::new("status", "eq", "draft"),
                FilterPredicate::new("views", "gt", "3"),
            ]
        );
    }

    #[test]
    fn test_append_query() {
        assert_eq!(append_query("/a", &[("env", "prod"), ("locale", "")]), "/a?env=prod");
        assert_eq!(append_query("/a?x=1", &[("q", "a b")]), "/a?x=1&q=a+b");
        assert_eq!(append_query::<&str, &str>("/a", &[]), "/a");
    }
}
