//! Flatten/unflatten boundary between [`EmbeddingMetadata`] and backend payloads.
//!
//! Backends accept only string keys with scalar or string-list values, so the
//! typed metadata is flattened once on the way in and read back through
//! [`unflatten`] / [`to_context_item`] on the way out.

use serde_json::{Map, Value};

use crate::record::{ChunkMetadata, ContextItem, EmbeddingMetadata};

pub const KEY_TEXT: &str = "text";
pub const KEY_USER_ID: &str = "userId";
pub const KEY_URL: &str = "url";
pub const KEY_CITATION: &str = "citation";
pub const KEY_FILENAME: &str = "filename";
pub const KEY_FILETYPE: &str = "filetype";
pub const KEY_LANGUAGES: &str = "languages";
pub const KEY_PAGE_NUMBER: &str = "page_number";
pub const KEY_ELEMENT_TYPE: &str = "element_type";

/// Prefix for parser-specific extension keys.
pub const EXT_PREFIX: &str = "ext_";

/// Flattens metadata into a backend payload.
///
/// Extension scalars are kept as-is, nested values are JSON-encoded strings,
/// nulls are dropped.
pub fn flatten(meta: &EmbeddingMetadata) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert(KEY_TEXT.into(), Value::String(meta.text.clone()));
    m.insert(KEY_USER_ID.into(), Value::String(meta.user_id.clone()));
    m.insert(KEY_URL.into(), Value::String(meta.url.clone()));
    m.insert(KEY_CITATION.into(), Value::String(meta.citation.clone()));
    m.insert(KEY_FILENAME.into(), Value::String(meta.filename.clone()));

    let chunk = &meta.chunk;
    if let Some(ft) = &chunk.filetype {
        m.insert(KEY_FILETYPE.into(), Value::String(ft.clone()));
    }
    m.insert(
        KEY_LANGUAGES.into(),
        Value::Array(
            chunk
                .languages
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        ),
    );
    if let Some(p) = chunk.page_number {
        m.insert(KEY_PAGE_NUMBER.into(), Value::String(p.to_string()));
    }
    if let Some(t) = &chunk.element_type {
        m.insert(KEY_ELEMENT_TYPE.into(), Value::String(t.clone()));
    }

    for (k, v) in &chunk.extra {
        let flat = match v {
            Value::Null => continue,
            Value::String(_) | Value::Number(_) | Value::Bool(_) => v.clone(),
            Value::Array(_) | Value::Object(_) => Value::String(v.to_string()),
        };
        m.insert(format!("{EXT_PREFIX}{k}"), flat);
    }
    m
}

/// Reads a flattened payload back into typed metadata.
///
/// Missing fields default to empty values. JSON-encoded extension values are
/// decoded again when they parse as an object or array.
pub fn unflatten(map: &Map<String, Value>) -> EmbeddingMetadata {
    let mut extra = std::collections::BTreeMap::new();
    for (k, v) in map {
        let Some(name) = k.strip_prefix(EXT_PREFIX) else {
            continue;
        };
        let restored = match v {
            Value::String(s) if s.starts_with('{') || s.starts_with('[') => {
                serde_json::from_str::<Value>(s).unwrap_or_else(|_| v.clone())
            }
            _ => v.clone(),
        };
        extra.insert(name.to_string(), restored);
    }

    EmbeddingMetadata {
        text: str_field(map, KEY_TEXT),
        user_id: str_field(map, KEY_USER_ID),
        url: str_field(map, KEY_URL),
        citation: str_field(map, KEY_CITATION),
        filename: str_field(map, KEY_FILENAME),
        chunk: ChunkMetadata {
            page_number: page_number(map).and_then(|p| p.parse().ok()),
            filetype: map.get(KEY_FILETYPE).and_then(Value::as_str).map(str::to_string),
            languages: languages(map),
            element_type: map
                .get(KEY_ELEMENT_TYPE)
                .and_then(Value::as_str)
                .map(str::to_string),
            extra,
        },
    }
}

/// Projects a flattened payload to the flat retrieval view.
pub fn to_context_item(map: &Map<String, Value>, score: f32) -> ContextItem {
    let meta = unflatten(map);
    ContextItem {
        text: meta.text,
        filename: meta.filename,
        filetype: meta.chunk.filetype.unwrap_or_default(),
        languages: meta.chunk.languages.join(", "),
        // Kept as stored; the typed field only holds numeric pages.
        page_number: page_number(map),
        user_id: meta.user_id,
        url: meta.url,
        citation: meta.citation,
        score,
    }
}

fn str_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Accepts the page number as a string or an integer.
fn page_number(map: &Map<String, Value>) -> Option<String> {
    match map.get(KEY_PAGE_NUMBER)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn languages(map: &Map<String, Value>) -> Vec<String> {
    match map.get(KEY_LANGUAGES) {
        Some(Value::Array(a)) => a
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => {
            s.split(',').map(|x| x.trim().to_string()).collect()
        }
        _ => Vec::new(),
    }
}
