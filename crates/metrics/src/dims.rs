//! Dimension values
//!
//! Dimensions carry heterogeneous values (int, float, bool, string). They
//! are modeled as a tagged sum with a pass-through serializer rather than a
//! runtime-generic container, so the wire shape stays `{"key": value}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Dimensions attached to a metric event, keyed by label
///
/// A `BTreeMap` keeps the serialized ordering deterministic.
pub type DimMap = BTreeMap<String, DimValue>;

/// One dimension value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimValue {
    /// Boolean dimension
    Bool(bool),
    /// Integer dimension
    Int(i64),
    /// Floating-point dimension
    Float(f64),
    /// String dimension
    String(String),
}

impl DimValue {
    /// Lossy conversion from arbitrary JSON, for config-supplied dimensions
    ///
    /// Numbers become `Int` when integral, `Float` otherwise; anything
    /// without a primitive rendering is stringified.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => Self::String(s.clone()),
            other => Self::String(other.to_string()),
        }
    }

    /// Convert a JSON map into a dimension map
    pub fn map_from_json(values: &BTreeMap<String, serde_json::Value>) -> DimMap {
        values
            .iter()
            .map(|(k, v)| (k.clone(), Self::from_json(v)))
            .collect()
    }
}

impl fmt::Display for DimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for DimValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DimValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for DimValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for DimValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_untagged() {
        let mut dims = DimMap::new();
        dims.insert("ok".into(), DimValue::Bool(true));
        dims.insert("count".into(), DimValue::Int(42));
        dims.insert("rate".into(), DimValue::Float(0.5));
        dims.insert("host".into(), DimValue::String("gotham".into()));

        let json = serde_json::to_string(&dims).unwrap();
        assert_eq!(
            json,
            r#"{"count":42,"host":"gotham","ok":true,"rate":0.5}"#
        );
    }

    #[test]
    fn test_from_json() {
        use serde_json::json;

        assert_eq!(DimValue::from_json(&json!(true)), DimValue::Bool(true));
        assert_eq!(DimValue::from_json(&json!(7)), DimValue::Int(7));
        assert_eq!(DimValue::from_json(&json!(1.25)), DimValue::Float(1.25));
        assert_eq!(
            DimValue::from_json(&json!("edge")),
            DimValue::String("edge".into())
        );
        // non-primitives are stringified, not dropped
        assert_eq!(
            DimValue::from_json(&json!([1, 2])),
            DimValue::String("[1,2]".into())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(DimValue::Bool(true).to_string(), "true");
        assert_eq!(DimValue::Int(-3).to_string(), "-3");
        assert_eq!(DimValue::Float(1.5).to_string(), "1.5");
        assert_eq!(DimValue::String("gotham".into()).to_string(), "gotham");
    }
}
