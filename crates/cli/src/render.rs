//! Human-readable rendering of a normalized record.

use moviefetch_core::types::RESPONSE_FIELD;
use moviefetch_core::{FieldMap, FieldValue, RecordError};

/// Fields given a fixed position at the top of the full listing.
const LEADING_FIELDS: &[&str] = &[
    "title",
    "year",
    "genre",
    "imdbrating",
    "imdbvotes",
    "director",
    "writer",
    "actors",
];

/// Full listing: summary lines first, then every other field in response order.
pub fn all_entries(info: &FieldMap) -> Vec<(String, String)> {
    let mut entries = Vec::new();

    let title = info.get("title").map(ToString::to_string);
    let year = info.get("year").map(ToString::to_string);
    match (title, year) {
        (Some(t), Some(y)) => entries.push(("title".to_string(), format!("{t} ({y})"))),
        (Some(t), None) => entries.push(("title".to_string(), t)),
        (None, Some(y)) => entries.push(("year".to_string(), y)),
        (None, None) => {}
    }

    if let Some(genre) = info.get("genre") {
        entries.push(("genre".to_string(), genre.to_string()));
    }

    match (info.get("imdbrating"), info.get("imdbvotes")) {
        (Some(r), Some(v)) => entries.push(("rating".to_string(), format!("{r} ({v} votes)"))),
        (Some(r), None) => entries.push(("rating".to_string(), r.to_string())),
        (None, Some(v)) => entries.push(("rating".to_string(), format!("({v} votes)"))),
        (None, None) => {}
    }

    for name in ["director", "writer", "actors"] {
        if let Some(value) = info.get(name) {
            entries.push((name.to_string(), value.to_string()));
        }
    }

    for (name, value) in info.iter() {
        if LEADING_FIELDS.contains(&name) || name == RESPONSE_FIELD {
            continue;
        }
        entries.push((name.to_string(), value.to_string()));
    }

    entries
}

/// One entry per requested field, in the requested order.
pub fn selected_entries(
    info: &FieldMap,
    fields: &[String],
) -> Result<Vec<(String, String)>, RecordError> {
    fields
        .iter()
        .map(|name| {
            info.get(name)
                .map(|v: &FieldValue| (name.clone(), v.to_string()))
                .ok_or_else(|| RecordError::FieldNotFound(name.clone()))
        })
        .collect()
}

/// Lay entries out as `Label:   value`, values aligned on the longest label.
pub fn format_entries(entries: &[(String, String)]) -> String {
    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in entries {
        let label = format!("{}:", capitalize(name));
        out.push_str(&format!("{label:<w$} {value}\n", w = width + 1));
    }
    out
}

/// Header lines printed before each query unless `--quiet`.
pub fn header(query: &str, fields: Option<&[String]>) -> String {
    let mut out = format!("---- query:  {}\n", list_repr(&[query]));
    if let Some(fields) = fields {
        out.push_str(&format!("---- fields: {}\n", list_repr(fields)));
    }
    out
}

fn list_repr<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|s| format!("'{}'", s.as_ref()))
        .collect();
    format!("[{}]", quoted.join(", "))
}

fn capitalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
