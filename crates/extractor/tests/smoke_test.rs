//! Smoke tests for the extractor
//!
//! These verify end-to-end behavior by writing to a real file and running
//! the actual tailer and pipeline, with the sink in trace mode.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use extractor_config::{Config, FieldDef, FieldType, MetricDef};
use extractor_metrics::{DimValue, Metrics, RawMetric, TraceSink};
use extractor_pipeline::{
    Pipeline, BLANK_LINES_SEEN, FAILED_EXTRACTION, LINES_SEEN, METRICS_PUBLISHED,
};
use extractor_stats::StatsRegistry;
use extractor_tail::{TailConfig, Tailer};

const POLL: Duration = Duration::from_millis(25);
const WAIT: Duration = Duration::from_secs(5);

/// The `first.metric` definition used by the scenarios
fn first_metric() -> MetricDef {
    MetricDef {
        value_field: Some(1),
        timestamp_field: Some(0),
        timestamp_format: "sec".into(),
        ..MetricDef::new(
            "first.metric",
            vec![
                FieldDef {
                    field_type: FieldType::Timestamp,
                    ..FieldDef::at(0)
                },
                FieldDef {
                    field_type: FieldType::Value,
                    ..FieldDef::at(1)
                },
                FieldDef::at(2),
            ],
        )
    }
}

struct Extractor {
    path: std::path::PathBuf,
    _dir: tempfile::TempDir,
    sent_rx: mpsc::UnboundedReceiver<RawMetric>,
    sent: Arc<Mutex<Vec<RawMetric>>>,
    stats: Arc<StatsRegistry>,
    cancel: CancellationToken,
    tail_task: tokio::task::JoinHandle<()>,
    pipeline_task: tokio::task::JoinHandle<()>,
}

/// Stand up a tailer + pipeline over a fresh file with a capturing sink
fn start(defs: Vec<MetricDef>) -> Extractor {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.log");
    fs::File::create(&path).expect("create log");

    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&sent);
    let sink = Arc::new(TraceSink::new(move |m: &RawMetric| {
        captured.lock().push(m.clone());
        let _ = sent_tx.send(m.clone());
    }));

    let metrics = Metrics::new(sink, "nowhere");
    let stats = Arc::new(StatsRegistry::new());
    let cancel = CancellationToken::new();

    let (line_tx, line_rx) = mpsc::channel(1024);
    let tail_config = TailConfig {
        poll_interval: POLL,
        ..TailConfig::new(&path)
    };
    let tail_task = tokio::spawn(Tailer::new(tail_config, line_tx, cancel.clone()).run());

    let pipeline = Pipeline::new(Arc::new(defs), metrics, Arc::clone(&stats));
    let pipeline_task = tokio::spawn(pipeline.run(line_rx, cancel.clone()));

    Extractor {
        path,
        _dir: dir,
        sent_rx,
        sent,
        stats,
        cancel,
        tail_task,
        pipeline_task,
    }
}

impl Extractor {
    async fn next_metric(&mut self) -> RawMetric {
        timeout(WAIT, self.sent_rx.recv())
            .await
            .expect("timed out waiting for a metric")
            .expect("sink channel closed")
    }

    async fn stop(self) {
        self.cancel.cancel();
        timeout(WAIT, self.tail_task).await.unwrap().unwrap();
        timeout(WAIT, self.pipeline_task).await.unwrap().unwrap();
    }
}

fn append(path: &Path, lines: &[&str]) {
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(path)
        .expect("open log");
    for line in lines {
        writeln!(file, "{}", line).expect("write line");
    }
    file.flush().expect("flush");
}

/// Wait until the pipeline has counted `n` lines
async fn wait_for_lines(stats: &StatsRegistry, n: i64) {
    timeout(WAIT, async {
        while stats.get(LINES_SEEN) < n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for lines to be processed");
}

#[tokio::test]
async fn test_extracts_value_timestamp_and_dims() {
    let mut extractor = start(vec![first_metric()]);

    append(
        &extractor.path,
        &["@timestamp=1 size=45634 magic=unicorns domain=https://mysite.is/phenomenal"],
    );

    let rm = extractor.next_metric().await;
    assert_eq!(rm.name, "first.metric");
    assert_eq!(rm.value, 45634);
    assert_eq!(rm.timestamp, chrono::DateTime::from_timestamp(1, 0));
    assert_eq!(rm.dims.len(), 1);
    assert_eq!(
        rm.dims.get("magic"),
        Some(&DimValue::String("unicorns".into()))
    );

    extractor.stop().await;
}

#[tokio::test]
async fn test_bad_value_and_blank_lines_are_counted() {
    let extractor = start(vec![first_metric()]);

    append(
        &extractor.path,
        &[
            "@timestamp=3 size=not-a-number magic=unicorns domain=https://yoursite.is/tolerable",
            "     ",
            "@timestamp=5 size=12 magic=unicorns",
        ],
    );

    wait_for_lines(&extractor.stats, 3).await;

    assert_eq!(extractor.stats.get(LINES_SEEN), 3);
    assert_eq!(extractor.stats.get(BLANK_LINES_SEEN), 1);
    assert_eq!(extractor.stats.get(FAILED_EXTRACTION), 1);
    assert_eq!(extractor.stats.get(METRICS_PUBLISHED), 1);

    let sent = extractor.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].value, 12);
    drop(sent);

    extractor.stop().await;
}

#[tokio::test]
async fn test_truncation_preserves_order_without_loss_or_replay() {
    let def = MetricDef::new(
        "lines",
        vec![FieldDef {
            label: Some("n".into()),
            ..FieldDef::at(0)
        }],
    );
    let mut extractor = start(vec![def]);

    let first: Vec<String> = (1..=10).map(|i| format!("line=A{}", i)).collect();
    let first_refs: Vec<&str> = first.iter().map(String::as_str).collect();
    append(&extractor.path, &first_refs);

    let mut seen = Vec::new();
    for _ in 0..10 {
        seen.push(extractor.next_metric().await);
    }

    // truncate, give the tailer a tick to notice, then write the second run
    fs::File::create(&extractor.path).expect("truncate");
    tokio::time::sleep(POLL * 6).await;

    let second: Vec<String> = (1..=10).map(|i| format!("line=B{}", i)).collect();
    let second_refs: Vec<&str> = second.iter().map(String::as_str).collect();
    append(&extractor.path, &second_refs);

    for _ in 0..10 {
        seen.push(extractor.next_metric().await);
    }

    let observed: Vec<String> = seen
        .iter()
        .map(|m| match m.dims.get("n") {
            Some(DimValue::String(s)) => s.clone(),
            other => panic!("unexpected dim value {:?}", other),
        })
        .collect();
    let expected: Vec<String> = (1..=10)
        .map(|i| format!("A{}", i))
        .chain((1..=10).map(|i| format!("B{}", i)))
        .collect();
    assert_eq!(observed, expected);

    assert_eq!(extractor.stats.get(METRICS_PUBLISHED), 20);
    extractor.stop().await;
}

#[tokio::test]
async fn test_config_driven_end_to_end() {
    use std::str::FromStr;

    // the whole schema comes from a JSON config document
    let config = Config::from_str(
        r#"{
            "subject": "metrics.raw",
            "metrics": [
              {
                "name": "testing-1",
                "fields": [
                  { "position": 0, "type": "bool" },
                  { "position": 1 },
                  { "position": 2 },
                  { "position": 3, "type": "url" }
                ],
                "value_field": 2,
                "munge": { "field_number": 3, "joiner": "-" }
              }
            ]
        }"#,
    )
    .expect("config parses");
    config.validate().expect("config validates");

    let mut extractor = start(config.metrics);

    append(
        &extractor.path,
        &["some-bool=true some-string=batman-rules some-number=123 some-domain=https://gotham.com/villians"],
    );

    let rm = extractor.next_metric().await;
    assert_eq!(rm.name, "testing-1-gotham");
    assert_eq!(rm.value, 123);
    assert_eq!(rm.dims.len(), 4);
    assert_eq!(rm.dims.get("some-bool"), Some(&DimValue::Bool(true)));
    assert_eq!(rm.dims.get("tld"), Some(&DimValue::String("com".into())));

    extractor.stop().await;
}
