//! Line tokenizer and value coercer
//!
//! Splits a raw line into positional `key<delim>value` tokens and coerces
//! each configured field to its declared type. The output is keyed by
//! position because the projector selects fields by position (`value_field`,
//! `timestamp_field`, `munge.field_number`) and removes consumed positions
//! without disturbing the rest.

use std::collections::BTreeMap;

use tracing::warn;
use url::Url;

use extractor_config::{FieldDef, FieldType};
use extractor_metrics::{DimMap, DimValue};

#[cfg(test)]
#[path = "line_test.rs"]
mod line_test;

/// One successfully coerced field
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedField {
    /// Coerced value
    pub value: DimValue,
    /// Effective dimension name: the configured label, or the parsed key
    pub label: String,
}

/// Parsed fields keyed by their declared position
pub type PositionalFields = BTreeMap<usize, ParsedField>;

/// Parse one line against a field schema
///
/// The line is split on single ASCII spaces; adjacent spaces yield empty
/// tokens, which never split on a delimiter and are therefore skipped (or
/// fail the line when the field is required). Positions at or past the
/// token count are out of range.
///
/// Returns the positional field map plus an extras map holding the `scheme`
/// and `tld` of any URL-typed field, or `None` when a required field could
/// not be extracted. Pure function of its inputs.
pub fn parse_line(raw: &str, fields: &[FieldDef]) -> Option<(PositionalFields, DimMap)> {
    let tokens: Vec<&str> = raw.split(' ').collect();
    let mut parsed = PositionalFields::new();
    let mut extras = DimMap::new();

    for def in fields {
        if def.position >= tokens.len() {
            if def.required {
                warn!(
                    position = def.position,
                    tokens = tokens.len(),
                    "missing required field, not enough entries on the line"
                );
                return None;
            }
            continue;
        }

        let token = tokens[def.position];
        let delim = def.delimiter();
        let Some((key, raw_val)) = token.split_once(delim) else {
            warn!(token, delim, "failed to split the field on its delimiter");
            if def.required {
                return None;
            }
            continue;
        };

        match coerce(raw_val, def.field_type, &mut extras) {
            Ok(value) => {
                let label = match def.label.as_deref() {
                    Some(label) if !label.is_empty() => label.to_owned(),
                    _ => key.to_owned(),
                };
                parsed.insert(def.position, ParsedField { value, label });
            }
            Err(error) => {
                warn!(
                    value = raw_val,
                    field_type = %def.field_type,
                    %error,
                    "failed to coerce field value"
                );
                if def.required {
                    return None;
                }
            }
        }
    }

    Some((parsed, extras))
}

/// Coerce a raw value to the declared type
///
/// URL fields push `scheme` and `tld` into the extras map and yield the
/// host with its public suffix stripped.
fn coerce(raw_val: &str, field_type: FieldType, extras: &mut DimMap) -> Result<DimValue, String> {
    match field_type {
        FieldType::Number => raw_val
            .parse::<i64>()
            .map(DimValue::Int)
            .map_err(|e| e.to_string()),
        FieldType::Float => raw_val
            .parse::<f64>()
            .map(DimValue::Float)
            .map_err(|e| e.to_string()),
        FieldType::Bool => parse_bool(raw_val)
            .map(DimValue::Bool)
            .ok_or_else(|| format!("'{}' is not a boolean", raw_val)),
        FieldType::String | FieldType::Timestamp | FieldType::Value => {
            Ok(DimValue::String(raw_val.to_owned()))
        }
        FieldType::Url => {
            let parts = split_url(raw_val)?;
            extras.insert("scheme".to_owned(), DimValue::String(parts.scheme));
            if let Some(tld) = parts.tld {
                extras.insert("tld".to_owned(), DimValue::String(tld));
            }
            Ok(DimValue::String(parts.stem))
        }
    }
}

/// true|false|1|0|t|f, case-insensitive
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "t" => Some(true),
        "false" | "0" | "f" => Some(false),
        _ => None,
    }
}

struct UrlParts {
    scheme: String,
    /// Host with the public suffix stripped
    stem: String,
    /// Public suffix, when the host has one beyond itself
    tld: Option<String>,
}

/// Decompose an absolute URL into scheme, host stem, and public suffix
///
/// The public suffix comes from the Mozilla public-suffix dataset, so
/// multi-label suffixes like `co.uk` are handled.
fn split_url(raw: &str) -> Result<UrlParts, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    let host = url.host_str().ok_or_else(|| "url has no host".to_owned())?;

    let (stem, tld) = match psl::suffix_str(host) {
        Some(suffix) if suffix.len() < host.len() => (
            host[..host.len() - suffix.len() - 1].to_owned(),
            Some(suffix.to_owned()),
        ),
        _ => (host.to_owned(), None),
    };

    Ok(UrlParts {
        scheme: url.scheme().to_owned(),
        stem,
        tld,
    })
}
