//! Create/update request bodies to records.
//!
//! Form bodies only carry strings; the flattened schema of the panel decides
//! how each value is coerced and where it lands in the nested record.

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart};
use axum::http::{Request, header};
use quickstart_core::{AdminError, AdminResult, Record};
use quickstart_schema::{
    FlattenedSchema, ValueKind, coerce_field, coerce_list, coerce_scalar_multi, flatten, set_path,
};
use serde_json::Value;

/// Body encodings the console accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Json,
    Multipart,
    Form,
}

impl PayloadKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let content_type = content_type.unwrap_or("").to_ascii_lowercase();
        if content_type.contains("application/json") {
            PayloadKind::Json
        } else if content_type.starts_with("multipart/form-data") {
            PayloadKind::Multipart
        } else {
            PayloadKind::Form
        }
    }
}

/// Decode `body` into a record, coercing values per `schema`.
pub async fn parse_payload(
    content_type: Option<&str>,
    body: Bytes,
    schema: Option<&Value>,
) -> AdminResult<Record> {
    let pairs = match PayloadKind::from_content_type(content_type) {
        PayloadKind::Json => return parse_json(&body),
        PayloadKind::Multipart => multipart_pairs(content_type.unwrap_or_default(), body).await?,
        PayloadKind::Form => url::form_urlencoded::parse(&body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
    };

    let flattened = schema.map(flatten).unwrap_or_default();
    build_record(pairs, &flattened)
}

fn parse_json(body: &[u8]) -> AdminResult<Record> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Record::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AdminError::invalid_json("request body must be a JSON object")),
        Err(err) => Err(AdminError::invalid_json(err.to_string())),
    }
}

/// Text parts of a multipart body, in order. File parts are skipped.
async fn multipart_pairs(content_type: &str, body: Bytes) -> AdminResult<Vec<(String, String)>> {
    let request = Request::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .map_err(|err| AdminError::invalid_form(err.to_string()))?;
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|err| AdminError::invalid_form(err.body_text()))?;

    let mut pairs = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AdminError::invalid_form(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() {
            tracing::debug!(field = %name, "Skipping file part");
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|err| AdminError::invalid_form(err.body_text()))?;
        pairs.push((name, value));
    }
    Ok(pairs)
}

/// Group `pairs` by field, coerce, and write into a nested record.
///
/// Known boolean paths missing from the submission are set to `false`.
pub fn build_record(pairs: Vec<(String, String)>, schema: &FlattenedSchema) -> AdminResult<Record> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in pairs {
        let key = key.strip_suffix("[]").unwrap_or(&key).to_string();
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => grouped.push((key, vec![value])),
        }
    }

    let mut record = Record::new();
    for (path, values) in grouped {
        let info = schema.get(&path);
        let value = match (values.as_slice(), info) {
            ([single], Some(info))
                if info.kind == ValueKind::Array && !single.trim_start().starts_with('[') =>
            {
                coerce_list(&path, std::slice::from_ref(single), info.items.as_ref())?
            }
            ([single], _) => coerce_field(&path, single, info)?,
            (many, Some(info)) if info.kind == ValueKind::Array => {
                coerce_list(&path, many, info.items.as_ref())?
            }
            (many, info) => {
                let kind = info.map(|i| i.kind).unwrap_or(ValueKind::Unknown);
                coerce_scalar_multi(&path, many, kind)?
            }
        };
        set_path(&mut record, &path, value);
    }

    for path in &schema.boolean_paths {
        if quickstart_schema::get_path(&record, path).is_none() {
            set_path(&mut record, path, Value::Bool(false));
        }
    }
    Ok(record)
}
