//! Field extraction schema
//!
//! A [`FieldDef`] describes how to pull one typed value out of a log line:
//! which positional token to look at, how to split it into key and value,
//! and what type to coerce the value to. Field definitions come from the
//! config file or from the command-line override grammar
//! `[!]position[:label[:type]]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use tracing::warn;

#[cfg(test)]
#[path = "fields_test.rs"]
mod fields_test;

/// Default separator between a token's key and value
pub const DEFAULT_DELIMITER: &str = "=";

/// Declared type of an extracted field value
///
/// Unknown tags are tolerated and treated as `String` with a warning, both
/// in config files and in command-line overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldType {
    /// Pass the raw value through unchanged (default)
    #[default]
    String,
    /// Base-10 signed integer
    Number,
    /// IEEE-754 decimal
    Float,
    /// true|false|1|0|t|f, case-insensitive
    Bool,
    /// Absolute URL, decomposed into host stem, scheme, and public suffix
    Url,
    /// Raw string consumed by the projector as an event timestamp
    Timestamp,
    /// Raw string consumed by the projector as an event value
    Value,
}

impl FieldType {
    /// Map a tag to its type, falling back to `String` for unknown tags
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "" | "string" => Self::String,
            "number" => Self::Number,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "url" => Self::Url,
            "timestamp" => Self::Timestamp,
            "value" => Self::Value,
            other => {
                warn!(field_type = %other, "unknown field type, treating it as a string");
                Self::String
            }
        }
    }

    /// The canonical tag for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Url => "url",
            Self::Timestamp => "timestamp",
            Self::Value => "value",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// How to extract one field from a line
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    /// Token index after splitting the line on spaces
    pub position: usize,

    /// Declared value type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// Overrides the parsed key as the dimension name
    #[serde(default)]
    pub label: Option<String>,

    /// Separator inside the token; empty or absent means "="
    #[serde(default)]
    pub delim: Option<String>,

    /// Abort the whole line when this field fails to extract
    #[serde(default)]
    pub required: bool,
}

impl FieldDef {
    /// Create a plain string field at the given position
    pub fn at(position: usize) -> Self {
        Self {
            position,
            field_type: FieldType::String,
            label: None,
            delim: None,
            required: false,
        }
    }

    /// The effective key/value separator for this field
    pub fn delimiter(&self) -> &str {
        match self.delim.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => DEFAULT_DELIMITER,
        }
    }

    /// Parse a command-line override in the form `[!]position[:label[:type]]`
    ///
    /// A leading `!` marks the field required. Returns `None` with a warning
    /// when the position is missing, non-numeric, or negative; an unknown
    /// type tag falls back to `String` with a warning.
    pub fn parse_override(raw: &str, default_delim: &str) -> Option<Self> {
        let (required, rest) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let mut parts = rest.splitn(3, ':');

        let position = parts.next().unwrap_or("");
        let position: i64 = match position.parse() {
            Ok(p) => p,
            Err(error) => {
                warn!(%raw, %error, "failed to parse the override position, the format is [!]position[:label[:type]]");
                return None;
            }
        };
        if position < 0 {
            warn!(%raw, "can't have a negative position");
            return None;
        }

        let label = parts.next().filter(|l| !l.is_empty()).map(str::to_owned);
        let field_type = parts.next().map(FieldType::from_tag).unwrap_or_default();

        Some(Self {
            position: position as usize,
            field_type,
            label,
            delim: Some(default_delim.to_owned()),
            required,
        })
    }
}
