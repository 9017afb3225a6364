//! Command implementations and shared wiring

pub mod follow;
pub mod process;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use extractor_config::{Config, FieldDef, MetricDef};
use extractor_metrics::{BusSink, DimValue, MetricSink, Metrics, RawMetric, TraceSink};
use extractor_pipeline::Pipeline;
use extractor_stats::{StatsRegistry, StatsReporter};
use extractor_tail::{TailConfig, Tailer};

/// Capacity of the tailer-to-pipeline line channel
const LINE_CHANNEL_SIZE: usize = 1024;

/// How long to wait for tasks to drain during shutdown
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How many times `process` waits for a missing file before giving up;
/// `follow` waits forever
const PROCESS_RETRY_BUDGET: u32 = 10;

/// Whether to start at the end of the file and keep following it
pub(crate) struct ExtractionMode {
    pub from_end: bool,
    pub follow: bool,
}

/// Build an extra metric definition from command-line field overrides
///
/// Invalid overrides are warned about and skipped; when none survive, the
/// configuration is left untouched.
pub(crate) fn apply_field_overrides(
    config: &mut Config,
    overrides: &[String],
    delim: &str,
    name: &str,
) {
    let fields: Vec<FieldDef> = overrides
        .iter()
        .filter_map(|raw| FieldDef::parse_override(raw, delim))
        .collect();

    if fields.is_empty() {
        return;
    }

    info!(
        metric = name,
        field_count = fields.len(),
        "adding a metric definition from command-line fields"
    );
    config.metrics.push(MetricDef::new(name, fields));
}

/// Wire the tailer, pipeline, and stats reporter, then run to completion
pub(crate) async fn run_extraction(
    config: Config,
    path: PathBuf,
    mode: ExtractionMode,
) -> Result<()> {
    let budget = if mode.follow {
        None
    } else {
        Some(PROCESS_RETRY_BUDGET)
    };
    wait_for_file(&path, config.retry_sec, budget).await?;

    let metrics = build_metrics(&config).await?;
    let stats = Arc::new(StatsRegistry::new());
    let cancel = CancellationToken::new();

    let stats_task = config.stats.clone().map(|stats_conf| {
        let reporter = StatsReporter::new(Arc::clone(&stats), metrics.clone(), stats_conf);
        tokio::spawn(reporter.run(cancel.clone()))
    });

    let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_SIZE);
    let tail_config = TailConfig {
        from_end: mode.from_end,
        follow: mode.follow,
        ..TailConfig::new(path.clone())
    };
    let tail_task = tokio::spawn(Tailer::new(tail_config, line_tx, cancel.clone()).run());

    let defs = Arc::new(config.metrics);
    let pipeline = Pipeline::new(defs, metrics, Arc::clone(&stats));
    let mut pipeline_task = tokio::spawn(pipeline.run(line_rx, cancel.clone()));

    info!(
        path = %path.display(),
        subject = %config.subject,
        follow = mode.follow,
        "extractor running"
    );

    let mut pipeline_done = false;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, stopping");
        }
        result = &mut pipeline_task => {
            // single pass finished, or the line channel closed underneath us
            if let Err(error) = result {
                warn!(%error, "pipeline task failed");
            }
            pipeline_done = true;
        }
    }

    cancel.cancel();

    if !pipeline_done {
        wait_for_task(pipeline_task, "pipeline").await;
    }
    wait_for_task(tail_task, "tailer").await;
    if let Some(task) = stats_task {
        wait_for_task(task, "stats reporter").await;
    }

    info!("extractor shutdown complete");
    Ok(())
}

/// Build the metrics environment: bus mode when configured, trace mode
/// logging each event otherwise
async fn build_metrics(config: &Config) -> Result<Metrics> {
    let sink: Arc<dyn MetricSink> = match &config.bus {
        Some(bus) => {
            let sink = BusSink::connect(&bus.servers)
                .await
                .context("failed to connect to the bus")?;
            info!(servers = ?bus.servers, subject = %config.subject, "connected to the bus");
            Arc::new(sink)
        }
        None => {
            info!("no bus configured, emitting metrics through the logger");
            Arc::new(TraceSink::new(|metric: &RawMetric| {
                if let Ok(rendered) = serde_json::to_string(metric) {
                    info!(metric = %rendered, "metric");
                }
            }))
        }
    };

    Ok(Metrics::new(sink, config.subject.clone())
        .with_base_dims(DimValue::map_from_json(&config.dims)))
}

/// Wait for the consumed file to exist
///
/// With a budget, gives up after that many absent checks; without one,
/// retries forever.
async fn wait_for_file(path: &Path, retry_sec: u64, budget: Option<u32>) -> Result<()> {
    let retry = Duration::from_secs(retry_sec.max(1));
    let mut attempts = 0u32;

    loop {
        if tokio::fs::metadata(path).await.is_ok() {
            info!(path = %path.display(), "found file to process");
            return Ok(());
        }

        attempts += 1;
        if let Some(budget) = budget {
            if attempts > budget {
                anyhow::bail!(
                    "file {} did not appear within the retry budget",
                    path.display()
                );
            }
        }

        warn!(
            path = %path.display(),
            retry_sec,
            "file does not exist, will check again"
        );
        tokio::time::sleep(retry).await;
    }
}

/// Await a task, tolerating panics and slow exits
async fn wait_for_task(task: JoinHandle<()>, name: &str) {
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => warn!(task = name, %error, "task panicked during shutdown"),
        Err(_) => warn!(task = name, "task did not finish within timeout, continuing shutdown"),
    }
}
