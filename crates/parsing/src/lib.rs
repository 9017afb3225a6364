//! Extractor - Parsing
//!
//! The line-to-metric half of the pipeline: a schema-driven tokenizer with
//! typed value coercion, and the projector that turns one parsed line into
//! zero or more metric emissions.
//!
//! ```text
//! "key=value key2=value2 ..."
//!        │
//!        ▼ parse_line (per MetricDef field schema)
//! { position → ParsedField } + extras
//!        │
//!        ▼ project (munge, value, timestamp, dimensions)
//! Projection { name, value, timestamp, dims }
//! ```
//!
//! Parsing never panics on input data: a malformed non-required field is
//! dropped with a warning, a malformed required field fails the whole line,
//! and a projection failure aborts only that metric.

mod line;
mod project;

pub use line::{parse_line, ParsedField, PositionalFields};
pub use project::{project, ProjectError, Projection};
