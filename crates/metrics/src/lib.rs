//! Extractor - Metrics
//!
//! Metric events and the sink adapter that delivers them.
//!
//! # Overview
//!
//! This crate provides:
//! - [`RawMetric`] - the unit of output: a counter or gauge event with a
//!   value, an optional authoritative timestamp, and dimensions
//! - [`DimValue`] / [`DimMap`] - the tagged sum dimensions are modeled as
//! - [`MetricSink`] - the delivery seam, with a bus implementation
//!   ([`BusSink`]) and a callback implementation ([`TraceSink`])
//! - [`Metrics`] - the environment handed to components at spawn time;
//!   mints cheap [`Counter`] and [`Gauge`] handles
//!
//! # Design Principles
//!
//! - **No process singletons**: components receive a cloned [`Metrics`]
//!   value at spawn time
//! - **Per-emission timestamps**: an emission either carries an
//!   authoritative timestamp or it does not; nothing persists across
//!   emissions, so concurrent emitters cannot contaminate each other
//! - **Never stall the pipeline**: publish failures are logged and the
//!   event dropped
//!
//! # Example
//!
//! ```ignore
//! use extractor_metrics::{DimMap, Metrics, TraceSink};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(TraceSink::new(|m| println!("{}", m.name)));
//! let metrics = Metrics::new(sink, "metrics.raw");
//!
//! let requests = metrics.counter("api.requests");
//! requests.record(1, None, DimMap::new()).await;
//! ```

mod dims;
mod raw;
mod sink;

pub use dims::{DimMap, DimValue};
pub use raw::{MetricType, RawMetric};
pub use sink::{BusSink, MetricSink, TraceSink};

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Environment for emitting metrics
///
/// Owns the sink, the default subject, and the base dimensions attached to
/// every event. Cloning is cheap; hand a clone to each component instead of
/// reaching for a global.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Inner>,
}

struct Inner {
    sink: Arc<dyn MetricSink>,
    subject: String,
    base_dims: DimMap,
}

impl Metrics {
    /// Create a new environment publishing on `subject`
    pub fn new(sink: Arc<dyn MetricSink>, subject: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink,
                subject: subject.into(),
                base_dims: DimMap::new(),
            }),
        }
    }

    /// Attach dimensions carried by every emitted event
    ///
    /// Event dimensions win on key collisions.
    pub fn with_base_dims(self, base_dims: DimMap) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink: Arc::clone(&self.inner.sink),
                subject: self.inner.subject.clone(),
                base_dims,
            }),
        }
    }

    /// The default subject events are published on
    pub fn subject(&self) -> &str {
        &self.inner.subject
    }

    /// Mint a counter handle
    ///
    /// Handles are stateless; minting the same name twice yields equivalent
    /// handles.
    pub fn counter(&self, name: impl Into<String>) -> Counter {
        Counter {
            name: name.into(),
            metrics: self.clone(),
        }
    }

    /// Mint a gauge handle
    pub fn gauge(&self, name: impl Into<String>) -> Gauge {
        Gauge {
            name: name.into(),
            subject: None,
            metrics: self.clone(),
        }
    }

    /// Mint a gauge handle publishing on an alternate subject
    pub fn gauge_on(&self, subject: impl Into<String>, name: impl Into<String>) -> Gauge {
        Gauge {
            name: name.into(),
            subject: Some(subject.into()),
            metrics: self.clone(),
        }
    }

    /// Build and publish one event, merging base dimensions underneath
    async fn emit(
        &self,
        subject: &str,
        metric_type: MetricType,
        name: &str,
        value: i64,
        timestamp: Option<DateTime<Utc>>,
        dims: DimMap,
    ) {
        let mut merged = self.inner.base_dims.clone();
        merged.extend(dims);

        let metric = RawMetric {
            name: name.to_owned(),
            metric_type,
            value,
            timestamp,
            dims: merged,
        };

        self.inner.sink.publish(subject, &metric).await;
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("subject", &self.inner.subject)
            .field("base_dims", &self.inner.base_dims)
            .finish()
    }
}

/// Handle for emitting counter events
#[derive(Clone)]
pub struct Counter {
    name: String,
    metrics: Metrics,
}

impl Counter {
    /// The counter's metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emit one counter event
    ///
    /// A `Some` timestamp is authoritative for this event only; `None`
    /// means the downstream sink assigns the time.
    pub async fn record(&self, value: i64, timestamp: Option<DateTime<Utc>>, dims: DimMap) {
        self.metrics
            .emit(
                self.metrics.subject(),
                MetricType::Counter,
                &self.name,
                value,
                timestamp,
                dims,
            )
            .await;
    }
}

/// Handle for emitting gauge events
#[derive(Clone)]
pub struct Gauge {
    name: String,
    subject: Option<String>,
    metrics: Metrics,
}

impl Gauge {
    /// The gauge's metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emit one gauge event with the current value
    pub async fn set(&self, value: i64, dims: DimMap) {
        let subject = self.subject.as_deref().unwrap_or(self.metrics.subject());
        self.metrics
            .emit(subject, MetricType::Gauge, &self.name, value, None, dims)
            .await;
    }
}
