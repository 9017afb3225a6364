//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse JSON
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// No metrics configured
    #[error("must provide at least one metric to extract")]
    NoMetrics,

    /// A metric is missing its name
    #[error("metric at index {index} is missing a name")]
    MissingName {
        /// Position of the metric in the config list
        index: usize,
    },

    /// A selector refers to a position no field declares
    #[error("metric '{metric}' has {selector} = {position} but no field at that position")]
    UnknownPosition {
        /// Name of the offending metric
        metric: String,
        /// Which selector referenced the position
        selector: &'static str,
        /// The undeclared position
        position: usize,
    },

    /// A timestamp field was selected without a usable format
    #[error("metric '{metric}' selects a timestamp field but has an empty timestamp_format")]
    EmptyTimestampFormat {
        /// Name of the offending metric
        metric: String,
    },

    /// Bus mode needs a subject to publish on
    #[error("a bus connection is configured but 'subject' is empty")]
    MissingSubject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_metrics_message() {
        let err = ConfigError::NoMetrics;
        assert!(err.to_string().contains("at least one metric"));
    }

    #[test]
    fn test_unknown_position_message() {
        let err = ConfigError::UnknownPosition {
            metric: "api.requests".into(),
            selector: "value_field",
            position: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("api.requests"));
        assert!(msg.contains("value_field"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn test_missing_name_message() {
        let err = ConfigError::MissingName { index: 2 };
        assert!(err.to_string().contains('2'));
    }
}
