//! Periodic stats reporter
//!
//! Snapshots the registry on an interval, logs the snapshot, and publishes
//! each entry as a gauge `{prefix}.{key}`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use extractor_config::StatsConfig;
use extractor_metrics::{DimMap, Metrics};

use crate::registry::StatsRegistry;

#[cfg(test)]
#[path = "reporter_test.rs"]
mod reporter_test;

/// Gauges the stats registry to the sink on a fixed interval
pub struct StatsReporter {
    registry: Arc<StatsRegistry>,
    metrics: Metrics,
    config: StatsConfig,
}

impl StatsReporter {
    /// Create a reporter over the given registry
    pub fn new(registry: Arc<StatsRegistry>, metrics: Metrics, config: StatsConfig) -> Self {
        Self {
            registry,
            metrics,
            config,
        }
    }

    /// Run the reporter until cancellation
    ///
    /// Returns immediately when the configured interval is zero.
    pub async fn run(self, cancel: CancellationToken) {
        if self.config.report_sec == 0 {
            info!("skipping stats reporting because it is configured off");
            return;
        }

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.report_sec));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick of a tokio interval fires immediately; skip it so
        // the first report happens one full interval in
        ticker.tick().await;

        info!(
            interval_secs = self.config.report_sec,
            subject = %self.subject(),
            metric_prefix = %self.config.prefix,
            "starting to report stats"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("stats reporter stopping");
                    break;
                }
                _ = ticker.tick() => {}
            }

            self.report().await;
        }
    }

    /// Publish one snapshot
    pub async fn report(&self) {
        let snapshot = self.registry.snapshot();

        if let Ok(rendered) = serde_json::to_string(&snapshot) {
            info!(stats = %rendered, "stats snapshot");
        }

        let subject = self.subject().to_owned();
        for (key, value) in snapshot {
            let name = if self.config.prefix.is_empty() {
                key
            } else {
                format!("{}.{}", self.config.prefix, key)
            };

            self.metrics
                .gauge_on(&subject, &name)
                .set(value, DimMap::new())
                .await;
        }
    }

    /// The subject gauges are published on
    fn subject(&self) -> &str {
        if self.config.subject.is_empty() {
            self.metrics.subject()
        } else {
            &self.config.subject
        }
    }
}
