//! Configuration validation
//!
//! Configuration problems are fatal at startup; malformed input lines are
//! not. Everything rejected here would otherwise fail on every single line
//! at runtime.

use std::collections::BTreeSet;

use crate::error::{ConfigError, Result};
use crate::{Config, MetricDef};

/// Validate a loaded configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.metrics.is_empty() {
        return Err(ConfigError::NoMetrics);
    }

    if config.bus.is_some() && config.subject.is_empty() {
        return Err(ConfigError::MissingSubject);
    }

    for (index, metric) in config.metrics.iter().enumerate() {
        if metric.name.is_empty() {
            return Err(ConfigError::MissingName { index });
        }
        validate_selectors(metric)?;
    }

    Ok(())
}

/// Check that every selector names a position some field declares
fn validate_selectors(metric: &MetricDef) -> Result<()> {
    let declared: BTreeSet<usize> = metric.fields.iter().map(|f| f.position).collect();

    let mut selectors = vec![
        ("value_field", metric.value_field),
        ("timestamp_field", metric.timestamp_field),
    ];
    selectors.push((
        "munge.field_number",
        metric.munge.as_ref().map(|m| m.field_number),
    ));

    for (selector, position) in selectors {
        if let Some(position) = position {
            if !declared.contains(&position) {
                return Err(ConfigError::UnknownPosition {
                    metric: metric.name.clone(),
                    selector,
                    position,
                });
            }
        }
    }

    if metric.timestamp_field.is_some() && metric.timestamp_format.is_empty() {
        return Err(ConfigError::EmptyTimestampFormat {
            metric: metric.name.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldDef;
    use std::str::FromStr;

    fn base_config() -> Config {
        Config {
            metrics: vec![MetricDef::new(
                "hits",
                vec![FieldDef::at(0), FieldDef::at(2)],
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_no_metrics() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::NoMetrics)));
    }

    #[test]
    fn test_missing_name() {
        let mut config = base_config();
        config.metrics[0].name.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingName { index: 0 })
        ));
    }

    #[test]
    fn test_value_field_must_be_declared() {
        let mut config = base_config();
        config.metrics[0].value_field = Some(5);
        match config.validate() {
            Err(ConfigError::UnknownPosition {
                selector, position, ..
            }) => {
                assert_eq!(selector, "value_field");
                assert_eq!(position, 5);
            }
            other => panic!("expected UnknownPosition, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_field_must_be_declared() {
        let mut config = base_config();
        config.metrics[0].timestamp_field = Some(9);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownPosition {
                selector: "timestamp_field",
                ..
            })
        ));
    }

    #[test]
    fn test_munge_field_must_be_declared() {
        let config = Config::from_str(
            r#"{"metrics": [{"name": "n", "fields": [{"position": 0}],
                "munge": {"field_number": 3}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownPosition {
                selector: "munge.field_number",
                ..
            })
        ));
    }

    #[test]
    fn test_declared_selectors_pass() {
        let mut config = base_config();
        config.metrics[0].value_field = Some(2);
        config.metrics[0].timestamp_field = Some(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_timestamp_format() {
        let mut config = base_config();
        config.metrics[0].timestamp_field = Some(0);
        config.metrics[0].timestamp_format.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyTimestampFormat { .. })
        ));
    }

    #[test]
    fn test_bus_requires_subject() {
        let mut config = base_config();
        config.bus = Some(crate::BusConfig {
            servers: vec!["nats://localhost:4222".into()],
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSubject)
        ));

        config.subject = "metrics.raw".into();
        assert!(config.validate().is_ok());
    }
}
