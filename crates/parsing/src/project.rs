//! Metric projector
//!
//! Routes the parsed fields of one line into a single metric emission:
//! name munging, value selection, timestamp selection, and dimension
//! assembly. A failure at any step aborts this metric only; other metric
//! definitions for the same line proceed independently.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use extractor_config::MetricDef;
use extractor_metrics::{DimMap, DimValue};

use crate::line::PositionalFields;

#[cfg(test)]
#[path = "project_test.rs"]
mod project_test;

/// One projected metric emission
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Metric name, munged when the definition asks for it
    pub name: String,
    /// Event value; 1 unless a value field is configured
    pub value: i64,
    /// Authoritative event time, when a timestamp field is configured
    pub timestamp: Option<DateTime<Utc>>,
    /// Remaining fields and URL extras, keyed by effective label
    pub dims: DimMap,
}

/// Why a projection was aborted
#[derive(Debug, Error, PartialEq)]
pub enum ProjectError {
    /// The munge source position was not among the parsed fields
    #[error("munge field {0} was not parsed from the line")]
    MissingMungeField(usize),

    /// The value source position was not among the parsed fields
    #[error("value field {0} was not parsed from the line")]
    MissingValueField(usize),

    /// The value field did not hold an integer
    #[error("value field {position} is not an integer: '{value}'")]
    ValueNotInteger {
        /// Configured value position
        position: usize,
        /// The offending value
        value: String,
    },

    /// The timestamp source position was not among the parsed fields
    #[error("timestamp field {0} was not parsed from the line")]
    MissingTimestampField(usize),

    /// The timestamp value did not parse under the configured format
    #[error("failed to parse timestamp '{value}' with format '{format}'")]
    BadTimestamp {
        /// The offending value
        value: String,
        /// Configured format
        format: String,
    },
}

/// Project one parsed line into a metric emission
///
/// Consumes the positional map: the positions feeding the name, value, and
/// timestamp are removed so they never appear as dimensions (the munge
/// field stays when `keep_dimension` is set). Extras are merged underneath
/// the positional fields, so a positional label wins on collision.
pub fn project(
    def: &MetricDef,
    mut fields: PositionalFields,
    extras: DimMap,
) -> Result<Projection, ProjectError> {
    let name = munge_name(def, &mut fields)?;
    let value = select_value(def, &mut fields)?;
    let timestamp = select_timestamp(def, &mut fields)?;

    let mut dims = extras;
    for (_, field) in fields {
        dims.insert(field.label, field.value);
    }

    Ok(Projection {
        name,
        value,
        timestamp,
        dims,
    })
}

/// Apply the munge, yielding the emitted metric name
fn munge_name(def: &MetricDef, fields: &mut PositionalFields) -> Result<String, ProjectError> {
    let Some(munge) = &def.munge else {
        return Ok(def.name.clone());
    };

    let suffix = {
        let field = fields
            .get(&munge.field_number)
            .ok_or(ProjectError::MissingMungeField(munge.field_number))?;
        field.value.to_string()
    };

    if !munge.keep_dimension {
        fields.remove(&munge.field_number);
    }

    Ok(format!("{}{}{}", def.name, munge.joiner, suffix))
}

/// Select and coerce the event value; 1 when no value field is configured
fn select_value(def: &MetricDef, fields: &mut PositionalFields) -> Result<i64, ProjectError> {
    let Some(position) = def.value_field else {
        return Ok(1);
    };

    let field = fields
        .get(&position)
        .ok_or(ProjectError::MissingValueField(position))?;

    let value = match &field.value {
        DimValue::Int(i) => *i,
        DimValue::String(s) => {
            s.parse::<i64>()
                .map_err(|_| ProjectError::ValueNotInteger {
                    position,
                    value: s.clone(),
                })?
        }
        other => {
            return Err(ProjectError::ValueNotInteger {
                position,
                value: other.to_string(),
            })
        }
    };

    fields.remove(&position);
    Ok(value)
}

/// Select and parse the event timestamp, when one is configured
fn select_timestamp(
    def: &MetricDef,
    fields: &mut PositionalFields,
) -> Result<Option<DateTime<Utc>>, ProjectError> {
    let Some(position) = def.timestamp_field else {
        return Ok(None);
    };

    let field = fields
        .remove(&position)
        .ok_or(ProjectError::MissingTimestampField(position))?;

    let raw = field.value.to_string();
    let parsed =
        parse_timestamp(&raw, &def.timestamp_format).ok_or_else(|| ProjectError::BadTimestamp {
            value: raw,
            format: def.timestamp_format.clone(),
        })?;

    Ok(Some(parsed))
}

/// Parse a timestamp as epoch seconds/millis/nanos or a calendar layout
fn parse_timestamp(raw: &str, format: &str) -> Option<DateTime<Utc>> {
    match format {
        "sec" => DateTime::from_timestamp(raw.parse().ok()?, 0),
        "msec" => DateTime::from_timestamp_millis(raw.parse().ok()?),
        "nano" => Some(DateTime::from_timestamp_nanos(raw.parse().ok()?)),
        layout => DateTime::parse_from_str(raw, layout)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, layout)
                    .map(|naive| naive.and_utc())
                    .ok()
            }),
    }
}
