//! Repository abstraction behind every panel, plus an in-memory implementation.

use async_trait::async_trait;
use chrono::Utc;
use quickstart_core::record::{self, DATA_KEY};
use quickstart_core::{AdminContext, AdminError, AdminResult, ErrorKind, ListOptions, Record};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock};

/// CRUD storage for one panel.
///
/// Implementations own their locking and transaction semantics. Every call
/// receives the request's [`AdminContext`] so storage can scope by tenant and
/// environment.
#[async_trait]
pub trait Repository: Send + Sync {
    /// One page of records plus the total match count.
    async fn list(&self, ctx: &AdminContext, opts: &ListOptions) -> AdminResult<(Vec<Record>, u64)>;

    async fn get(&self, ctx: &AdminContext, id: &str) -> AdminResult<Record>;

    async fn create(&self, ctx: &AdminContext, record: Record) -> AdminResult<Record>;

    async fn update(&self, ctx: &AdminContext, id: &str, record: Record) -> AdminResult<Record>;

    async fn delete(&self, ctx: &AdminContext, id: &str) -> AdminResult<()>;
}

/// Process-local repository used by configured panels and tests.
///
/// Records created under a context carrying an environment or tenant are
/// stamped with it; reads under such a context only see matching or unscoped
/// records.
pub struct InMemoryRepository {
    name: String,
    records: RwLock<Vec<Record>>,
}

impl InMemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Repository pre-loaded with `seed`. Records without an id get one.
    pub fn with_records(name: impl Into<String>, seed: Vec<Record>) -> Self {
        let records = seed
            .into_iter()
            .map(|mut r| {
                if record::record_id(&r).is_none() {
                    r.insert("id".to_string(), Value::String(new_id()));
                }
                r
            })
            .collect();
        Self {
            name: name.into(),
            records: RwLock::new(records),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn not_found(&self, id: &str) -> AdminError {
        AdminError::record_not_found(&self.name, id)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn scope_matches(record: &Record, key: &str, wanted: Option<&str>) -> bool {
    let Some(wanted) = wanted else {
        return true;
    };
    match record::string_field(record, key) {
        None => true,
        Some(value) => value.eq_ignore_ascii_case(wanted),
    }
}

fn visible(record: &Record, ctx: &AdminContext) -> bool {
    scope_matches(record, "environment", ctx.environment())
        && scope_matches(record, "tenant_id", ctx.tenant())
}

fn has_id(record: &Record, id: &str) -> bool {
    record::record_id(record).as_deref() == Some(id)
}

/// String forms of a field value; arrays contribute each scalar element.
fn field_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(record::value_to_string).collect(),
        Some(v) => record::value_to_string(v).into_iter().collect(),
        None => Vec::new(),
    }
}

fn compare_scalars(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

fn predicate_matches(record: &Record, field: &str, operator: &str, value: &str) -> bool {
    let values = field_strings(record::field(record, field));
    match operator {
        "eq" | "" => values.iter().any(|v| v == value),
        "ne" => values.iter().all(|v| v != value),
        "ilike" | "like" | "contains" => {
            let needle = value.trim_matches('%').to_lowercase();
            values.iter().any(|v| v.to_lowercase().contains(&needle))
        }
        "in" => {
            let wanted: Vec<&str> = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            values.iter().any(|v| wanted.contains(&v.as_str()))
        }
        "gt" => values
            .iter()
            .any(|v| compare_scalars(v, value) == Ordering::Greater),
        "lt" => values.iter().any(|v| compare_scalars(v, value) == Ordering::Less),
        other => {
            tracing::debug!(operator = %other, field = %field, "Unsupported filter operator ignored");
            true
        }
    }
}

fn search_matches(record: &Record, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    record::presented(record)
        .values()
        .filter_map(Value::as_str)
        .any(|s| s.to_lowercase().contains(&needle))
}

fn sort_key(record: &Record, field: &str) -> Option<String> {
    record::field(record, field).and_then(record::value_to_string)
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

/// Merge `patch` into `target`. Nested `data` maps are merged key by key.
fn merge_record(target: &mut Record, patch: Record) {
    for (key, value) in patch {
        if key == DATA_KEY
            && let (Some(Value::Object(existing)), Value::Object(incoming)) =
                (target.get_mut(DATA_KEY), &value)
        {
            for (k, v) in incoming {
                existing.insert(k.clone(), v.clone());
            }
            continue;
        }
        target.insert(key, value);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list(&self, ctx: &AdminContext, opts: &ListOptions) -> AdminResult<(Vec<Record>, u64)> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);

        let mut matched: Vec<&Record> = records
            .iter()
            .filter(|r| visible(r, ctx))
            .filter(|r| {
                opts.predicates
                    .iter()
                    .all(|p| predicate_matches(r, &p.field, &p.operator, &p.value))
            })
            .filter(|r| {
                opts.search
                    .as_deref()
                    .map(str::trim)
                    .filter(|q| !q.is_empty())
                    .is_none_or(|q| search_matches(r, q))
            })
            .collect();

        if let Some(sort_by) = opts.sort_by.as_deref().filter(|s| !s.is_empty()) {
            matched.sort_by(|a, b| {
                let ordering = match (sort_key(a, sort_by), sort_key(b, sort_by)) {
                    (Some(x), Some(y)) => compare_scalars(&x, &y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if opts.sort_desc {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(usize::try_from(opts.offset()).unwrap_or(usize::MAX))
            .take(opts.per_page.max(1) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn get(&self, ctx: &AdminContext, id: &str) -> AdminResult<Record> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .find(|r| has_id(r, id) && visible(r, ctx))
            .cloned()
            .ok_or_else(|| self.not_found(id))
    }

    async fn create(&self, ctx: &AdminContext, mut record: Record) -> AdminResult<Record> {
        let id = record::record_id(&record).unwrap_or_else(new_id);
        record.insert("id".to_string(), Value::String(id.clone()));

        if let Some(env) = ctx.environment() {
            record
                .entry("environment")
                .or_insert_with(|| Value::String(env.to_string()));
        }
        if let Some(tenant) = ctx.tenant() {
            record
                .entry("tenant_id")
                .or_insert_with(|| Value::String(tenant.to_string()));
        }
        let stamp = now();
        record.entry("created_at").or_insert_with(|| stamp.clone());
        record.insert("updated_at".to_string(), stamp);

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.iter().any(|r| has_id(r, &id)) {
            return Err(AdminError::new(
                ErrorKind::Conflict,
                format!("record '{}' already exists in '{}'", id, self.name),
            ));
        }
        records.push(record.clone());
        tracing::debug!(panel = %self.name, id = %id, "Record created");
        Ok(record)
    }

    async fn update(&self, ctx: &AdminContext, id: &str, patch: Record) -> AdminResult<Record> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let existing = records
            .iter_mut()
            .find(|r| has_id(r, id) && visible(r, ctx))
            .ok_or_else(|| self.not_found(id))?;

        merge_record(existing, patch);
        existing.insert("id".to_string(), Value::String(id.to_string()));
        existing.insert("updated_at".to_string(), now());
        tracing::debug!(panel = %self.name, id = %id, "Record updated");
        Ok(existing.clone())
    }

    async fn delete(&self, ctx: &AdminContext, id: &str) -> AdminResult<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let position = records
            .iter()
            .position(|r| has_id(r, id) && visible(r, ctx))
            .ok_or_else(|| self.not_found(id))?;
        records.remove(position);
        tracing::debug!(panel = %self.name, id = %id, "Record deleted");
        Ok(())
    }
}
