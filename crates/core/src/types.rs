use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::RecordError;

/// Remote status flag; a false/empty value means the lookup failed.
pub const RESPONSE_FIELD: &str = "response";
/// Remote error message accompanying a failed status.
pub const ERROR_FIELD: &str = "error";
/// Fields holding comma-separated people or genre lists.
pub const LIST_FIELDS: &[&str] = &["genre", "actors", "director", "writer"];
pub const YEAR_FIELD: &str = "year";
pub const RATING_FIELD: &str = "imdbrating";

/// Field names the remote service is known to return. The actual set depends
/// on the service and may differ.
pub const KNOWN_FIELDS: &[&str] = &[
    "title",
    "year",
    "genre",
    "imdbrating",
    "imdbvotes",
    "director",
    "writer",
    "actors",
    "plot",
    "rated",
    "poster",
    "released",
    "imdbid",
    "runtime",
];

/// A single normalized value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Json(serde_json::Value),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Json(_) => "json",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(", ")),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{n:.1}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Normalized field mapping, kept in the order the service returned it.
///
/// Keys are lower-case; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into().to_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Which URL-valued fields should also be downloaded during a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DownloadSelector {
    #[default]
    None,
    All,
    One(String),
    Many(Vec<String>),
}

impl DownloadSelector {
    pub fn one(name: impl Into<String>) -> Result<Self, RecordError> {
        let selector = Self::One(normalize_name(&name.into()));
        selector.validate()?;
        Ok(selector)
    }

    pub fn many<I, S>(names: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| normalize_name(n.as_ref()))
            .collect();
        if names.is_empty() {
            return Ok(Self::None);
        }
        let selector = Self::Many(names);
        selector.validate()?;
        Ok(selector)
    }

    /// Parse the command-line form: empty, `all`, or a comma-separated list.
    pub fn parse(input: &str) -> Result<Self, RecordError> {
        if let Some(selector) = Self::empty_or_all(input) {
            return Ok(selector);
        }
        let names: Vec<&str> = input.trim().split(',').collect();
        match names.as_slice() {
            [single] => Self::one(*single),
            _ => Self::many(names),
        }
    }

    /// Accept a loosely-typed selector: null, `"all"`, a field name, or an
    /// array of field names. Anything else is rejected.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, RecordError> {
        use serde_json::Value;

        match value {
            Value::Null => Ok(Self::None),
            Value::String(s) => Self::parse_single(s),
            Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(s) => names.push(s),
                        None => {
                            return Err(RecordError::InvalidArgument(format!(
                                "download selector expects a string or a list of strings, got list item {item}"
                            )));
                        }
                    }
                }
                Self::many(names)
            }
            other => Err(RecordError::InvalidArgument(format!(
                "download selector expects a string or a list of strings, got {other}"
            ))),
        }
    }

    fn parse_single(input: &str) -> Result<Self, RecordError> {
        match Self::empty_or_all(input) {
            Some(selector) => Ok(selector),
            None => Self::one(input),
        }
    }

    fn empty_or_all(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            Some(Self::None)
        } else if input.eq_ignore_ascii_case("all") {
            Some(Self::All)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        let names: &[String] = match self {
            Self::None | Self::All => return Ok(()),
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        };
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(RecordError::InvalidArgument(
                "download selector contains an empty field name".into(),
            ));
        }
        Ok(())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether `field` (already lower-cased) should be downloaded.
    pub fn selects(&self, field: &str) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::One(name) => name.eq_ignore_ascii_case(field),
            Self::Many(names) => names.iter().any(|n| n.eq_ignore_ascii_case(field)),
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
