//! Parameter rows
//!
//! A row is one scenario: a map of parameter name to value, read from one CSV
//! line. Rows are cloned per test case, so every case owns its parameters.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of a key declaring a prerequisite check
pub const DEPENDENCY_PREFIX: &str = "req_";

/// Key holding the human-readable label of a row
pub const DESCRIPTION_KEY: &str = "description";

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Parse a raw cell; a value starting with `[` is a list literal
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            Some(inner) => ParamValue::List(parse_list_items(inner)),
            None => ParamValue::Text(raw.to_string()),
        }
    }

    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::List(_) => None,
        }
    }

    /// Items of the value; a text value is a single item
    pub fn items(&self) -> Vec<&str> {
        match self {
            ParamValue::Text(s) => vec![s.as_str()],
            ParamValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// Whether the value carries nothing usable
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Text(s) => s.trim().is_empty(),
            ParamValue::List(items) => items.is_empty(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => write!(f, "{}", s),
            ParamValue::List(items) => write!(f, "{}", items.join(",")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

/// Split the inside of a list literal on commas outside quotes
fn parse_list_items(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in inner.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => quote = Some(c),
            (None, ',') => {
                push_item(&mut items, &current);
                current.clear();
            }
            (None, c) => current.push(c),
        }
    }
    push_item(&mut items, &current);
    items
}

fn push_item(items: &mut Vec<String>, raw: &str) {
    let item = raw.trim();
    if !item.is_empty() {
        items.push(item.to_string());
    }
}

/// A `req_<Class>` entry found in a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyMarker {
    /// The full row key, e.g. `req_OTPVersion`
    pub key: String,
    /// Class name as written after the prefix
    pub class_name: String,
    /// Check to run; `None` runs every declared check
    pub check: Option<String>,
}

/// One scenario's parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterRow {
    params: BTreeMap<String, ParamValue>,
}

impl ParameterRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from raw `(name, cell)` pairs, applying list parsing
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let params = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), ParamValue::parse(v.as_ref())))
            .collect();
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Non-empty text value of `key`
    pub fn text(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(ParamValue::as_text)
            .filter(|s| !s.trim().is_empty())
    }

    /// Whether `key` is present with a non-empty value
    pub fn has_value(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.params.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Label used in report keys
    pub fn description(&self) -> Option<&str> {
        self.text(DESCRIPTION_KEY).map(str::trim)
    }

    /// Overlay `overrides` onto this row; override values win
    pub fn merge(&mut self, overrides: &ParameterRow) {
        for (k, v) in overrides.iter() {
            self.params.insert(k.clone(), v.clone());
        }
    }

    /// All `req_<Class>` markers, in key order
    pub fn dependency_markers(&self) -> Vec<DependencyMarker> {
        self.params
            .iter()
            .filter_map(|(key, value)| {
                let class_name = key.strip_prefix(DEPENDENCY_PREFIX)?.trim();
                if class_name.is_empty() {
                    return None;
                }
                let check = value
                    .as_text()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                Some(DependencyMarker {
                    key: key.clone(),
                    class_name: class_name.to_string(),
                    check,
                })
            })
            .collect()
    }
}
