//! The pipeline task

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use extractor_config::MetricDef;
use extractor_metrics::{Counter, Metrics};
use extractor_parsing::{parse_line, project};
use extractor_stats::StatsRegistry;

use crate::{BLANK_LINES_SEEN, FAILED_EXTRACTION, LINES_SEEN, METRICS_PUBLISHED};

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;

/// Processes tailed lines into metric emissions
///
/// One counter handle is held per metric definition for the life of the
/// pipeline; munged emissions mint a derived handle per name.
pub struct Pipeline {
    defs: Arc<Vec<MetricDef>>,
    counters: Vec<Counter>,
    metrics: Metrics,
    stats: Arc<StatsRegistry>,
}

impl Pipeline {
    /// Create a pipeline for the given metric definitions
    pub fn new(defs: Arc<Vec<MetricDef>>, metrics: Metrics, stats: Arc<StatsRegistry>) -> Self {
        let counters = defs.iter().map(|d| metrics.counter(&d.name)).collect();
        Self {
            defs,
            counters,
            metrics,
            stats,
        }
    }

    /// Run the pipeline until the line channel closes or shutdown is
    /// signaled
    pub async fn run(self, mut lines: mpsc::Receiver<String>, cancel: CancellationToken) {
        info!(metric_count = self.defs.len(), "pipeline starting");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("got shutdown message");
                    break;
                }
                line = lines.recv() => match line {
                    Some(line) => self.process(&line).await,
                    None => {
                        debug!("line channel closed");
                        break;
                    }
                },
            }
        }

        info!(
            lines_seen = self.stats.get(LINES_SEEN),
            blank_lines_seen = self.stats.get(BLANK_LINES_SEEN),
            metrics_published = self.stats.get(METRICS_PUBLISHED),
            failed_extraction = self.stats.get(FAILED_EXTRACTION),
            "pipeline stopped"
        );
    }

    /// Run every metric definition against one line
    ///
    /// Definitions are tried in declaration order and never short-circuit
    /// each other.
    async fn process(&self, line: &str) {
        self.stats.increment(LINES_SEEN);

        let text = line.trim();
        if text.is_empty() {
            self.stats.increment(BLANK_LINES_SEEN);
            return;
        }

        for (def, counter) in self.defs.iter().zip(&self.counters) {
            let Some((fields, extras)) = parse_line(text, &def.fields) else {
                self.stats.increment(FAILED_EXTRACTION);
                continue;
            };

            match project(def, fields, extras) {
                Ok(p) => {
                    if p.name == counter.name() {
                        counter.record(p.value, p.timestamp, p.dims).await;
                    } else {
                        // munged name; mint a handle for this emission
                        self.metrics
                            .counter(&p.name)
                            .record(p.value, p.timestamp, p.dims)
                            .await;
                    }
                    self.stats.increment(METRICS_PUBLISHED);
                }
                Err(error) => {
                    debug!(metric = %def.name, %error, "failed to project line");
                    self.stats.increment(FAILED_EXTRACTION);
                }
            }
        }
    }
}
