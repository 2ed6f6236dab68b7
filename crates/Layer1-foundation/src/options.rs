//! Option values - typed values produced by option forms and read by features

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Expected type of an option field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Text,
    Integer,
    Float,
    Bool,
}

impl OptionKind {
    /// Parse raw user input into a value of this kind
    pub fn parse(&self, option: &str, raw: &str) -> Result<OptionValue> {
        let trimmed = raw.trim();
        match self {
            OptionKind::Text => Ok(OptionValue::Text(raw.to_string())),
            OptionKind::Integer => trimmed.parse::<i64>().map(OptionValue::Integer).map_err(|_| {
                Error::invalid_option(option, format!("expected an integer, got '{}'", trimmed))
            }),
            OptionKind::Float => trimmed.parse::<f64>().map(OptionValue::Float).map_err(|_| {
                Error::invalid_option(option, format!("expected a number, got '{}'", trimmed))
            }),
            OptionKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(OptionValue::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(OptionValue::Bool(false)),
                _ => Err(Error::invalid_option(
                    option,
                    format!("expected true/false, got '{}'", trimmed),
                )),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Text => "text",
            OptionKind::Integer => "integer",
            OptionKind::Float => "float",
            OptionKind::Bool => "bool",
        }
    }
}

/// A single option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Text(_) => OptionKind::Text,
            OptionValue::Integer(_) => OptionKind::Integer,
            OptionValue::Float(_) => OptionKind::Float,
            OptionValue::Bool(_) => OptionKind::Bool,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Text(s) => write!(f, "{}", s),
            OptionValue::Integer(i) => write!(f, "{}", i),
            OptionValue::Float(x) => write!(f, "{}", x),
            OptionValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Integer(i)
    }
}

impl From<f64> for OptionValue {
    fn from(x: f64) -> Self {
        OptionValue::Float(x)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

/// Option name → value mapping passed to a task body
///
/// Getters fall back to the caller's default when the key is absent and
/// fail with [`Error::InvalidOption`] when the value has the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionValues {
    values: BTreeMap<String, OptionValue>,
}

impl OptionValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.values.iter()
    }

    /// Text value; non-text values are rendered with `Display`
    pub fn text_or(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(OptionValue::Text(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => default.to_string(),
        }
    }

    pub fn int_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(OptionValue::Integer(i)) => Ok(*i),
            Some(OptionValue::Text(s)) => OptionKind::Integer.parse(key, s).map(|v| match v {
                OptionValue::Integer(i) => i,
                _ => default,
            }),
            Some(other) => Err(Error::invalid_option(
                key,
                format!("expected an integer, got {} '{}'", other.kind().as_str(), other),
            )),
        }
    }

    pub fn float_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(OptionValue::Float(x)) => Ok(*x),
            Some(OptionValue::Integer(i)) => Ok(*i as f64),
            Some(OptionValue::Text(s)) => OptionKind::Float.parse(key, s).map(|v| match v {
                OptionValue::Float(x) => x,
                _ => default,
            }),
            Some(other) => Err(Error::invalid_option(
                key,
                format!("expected a number, got {} '{}'", other.kind().as_str(), other),
            )),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.values.get(key) {
            None => Ok(default),
            Some(OptionValue::Bool(b)) => Ok(*b),
            Some(OptionValue::Text(s)) => OptionKind::Bool.parse(key, s).map(|v| match v {
                OptionValue::Bool(b) => b,
                _ => default,
            }),
            Some(other) => Err(Error::invalid_option(
                key,
                format!("expected true/false, got {} '{}'", other.kind().as_str(), other),
            )),
        }
    }
}

impl FromIterator<(String, OptionValue)> for OptionValues {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
