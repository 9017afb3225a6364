//! Sink adapter
//!
//! The delivery seam between the pipeline and the outside world. Two
//! implementations:
//!
//! - [`BusSink`] serializes events to JSON and publishes them on the
//!   message bus; publish failures are logged and the event dropped so the
//!   pipeline never stalls on the bus.
//! - [`TraceSink`] invokes a registered callback, used by tests and no-bus
//!   deployments.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::raw::RawMetric;

/// Destination for emitted metric events
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Deliver one event on the given subject
    ///
    /// Delivery is best-effort; failures must be absorbed, not returned.
    async fn publish(&self, subject: &str, metric: &RawMetric);
}

/// Bus-backed sink publishing JSON-serialized events
pub struct BusSink {
    client: async_nats::Client,
}

impl BusSink {
    /// Connect to the bus
    ///
    /// Servers are tried in order; the connection reconnects on its own
    /// after transient failures.
    pub async fn connect(servers: &[String]) -> Result<Self, async_nats::ConnectError> {
        let client = async_nats::connect(servers.join(",")).await?;
        Ok(Self { client })
    }

    /// Wrap an existing bus client
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricSink for BusSink {
    async fn publish(&self, subject: &str, metric: &RawMetric) {
        let payload = match serde_json::to_vec(metric) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(metric = %metric.name, %error, "failed to serialize metric, dropping");
                return;
            }
        };

        if let Err(error) = self.client.publish(subject.to_owned(), payload.into()).await {
            warn!(
                metric = %metric.name,
                subject,
                %error,
                "failed to publish metric, dropping"
            );
        } else {
            debug!(metric = %metric.name, subject, "published metric");
        }
    }
}

/// Callback sink for tests and no-bus deployments
pub struct TraceSink {
    callback: Box<dyn Fn(&RawMetric) + Send + Sync>,
}

impl TraceSink {
    /// Create a sink invoking `callback` for every event
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&RawMetric) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

#[async_trait]
impl MetricSink for TraceSink {
    async fn publish(&self, _subject: &str, metric: &RawMetric) {
        (self.callback)(metric);
    }
}
