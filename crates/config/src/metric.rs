//! Metric definitions
//!
//! A [`MetricDef`] is one configured rule that turns a parsed line into a
//! named counter emission: which fields to extract, which of them supplies
//! the value and the timestamp, and an optional munge that decorates the
//! metric name with a field value.

use serde::Deserialize;

use crate::fields::FieldDef;

fn default_joiner() -> String {
    "_".to_owned()
}

fn default_timestamp_format() -> String {
    "msec".to_owned()
}

/// Per-metric dynamic name decoration
///
/// The value at `field_number` is appended to the base metric name as
/// `base + joiner + value`.
#[derive(Debug, Clone, Deserialize)]
pub struct MungeDef {
    /// Parsed position that supplies the name suffix
    pub field_number: usize,

    /// Separator between the base name and the suffix
    #[serde(default = "default_joiner")]
    pub joiner: String,

    /// Keep the suffix field in the emitted dimensions
    #[serde(default)]
    pub keep_dimension: bool,
}

/// One metric to emit per line
#[derive(Debug, Clone, Deserialize)]
pub struct MetricDef {
    /// Base metric name
    #[serde(default)]
    pub name: String,

    /// Schema for parsing the line
    #[serde(default)]
    pub fields: Vec<FieldDef>,

    /// Position whose coerced integer becomes the event value; absent means 1
    #[serde(default)]
    pub value_field: Option<usize>,

    /// Position whose string value becomes the event timestamp
    #[serde(default)]
    pub timestamp_field: Option<usize>,

    /// One of `sec | msec | nano` or a strftime-like layout
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Optional name decoration
    #[serde(default)]
    pub munge: Option<MungeDef>,
}

impl MetricDef {
    /// Create a definition with just a name and fields
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
            value_field: None,
            timestamp_field: None,
            timestamp_format: default_timestamp_format(),
            munge: None,
        }
    }
}
