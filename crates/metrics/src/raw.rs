//! The emitted metric event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dims::DimMap;

/// Kind of metric event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Monotonic count of occurrences
    Counter,
    /// Point-in-time level
    Gauge,
}

/// The unit of output: one metric event
///
/// An absent timestamp means "use sink-assigned time"; a present timestamp
/// is authoritative for this event only. On the wire the timestamp is
/// RFC 3339 and omitted entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetric {
    /// Metric name, never empty
    pub name: String,

    /// Counter or gauge
    #[serde(rename = "type")]
    pub metric_type: MetricType,

    /// Event value
    pub value: i64,

    /// Authoritative event time, when the source line carried one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Dimensions for downstream aggregation
    pub dims: DimMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dims::DimValue;

    #[test]
    fn test_wire_shape() {
        let mut dims = DimMap::new();
        dims.insert("magic".into(), DimValue::String("unicorns".into()));

        let metric = RawMetric {
            name: "first.metric".into(),
            metric_type: MetricType::Counter,
            value: 45634,
            timestamp: DateTime::from_timestamp(1, 0),
            dims,
        };

        let json = serde_json::to_string(&metric).unwrap();
        assert_eq!(
            json,
            r#"{"name":"first.metric","type":"counter","value":45634,"timestamp":"1970-01-01T00:00:01Z","dims":{"magic":"unicorns"}}"#
        );
    }

    #[test]
    fn test_absent_timestamp_is_omitted() {
        let metric = RawMetric {
            name: "hits".into(),
            metric_type: MetricType::Gauge,
            value: 1,
            timestamp: None,
            dims: DimMap::new(),
        };

        let json = serde_json::to_string(&metric).unwrap();
        assert!(!json.contains("timestamp"));
        assert!(json.contains(r#""type":"gauge""#));
    }

    #[test]
    fn test_round_trip() {
        let metric = RawMetric {
            name: "hits".into(),
            metric_type: MetricType::Counter,
            value: 7,
            timestamp: DateTime::from_timestamp(1_700_000_000, 0),
            dims: DimMap::new(),
        };

        let json = serde_json::to_string(&metric).unwrap();
        let back: RawMetric = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metric);
    }
}
