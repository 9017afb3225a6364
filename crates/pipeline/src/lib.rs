//! Extractor - Pipeline
//!
//! The orchestrator that connects the tailer's line channel to the metric
//! projector and the sink.
//!
//! ```text
//! [Tailer] --mpsc<String>--> [Pipeline] --parse+project--> [Sink]
//!                                 │
//!                                 └──> stats registry (lines_seen, ...)
//! ```
//!
//! # Key Design
//!
//! - **Single task**: lines are processed sequentially, so emissions follow
//!   line order, and within one line follow metric declaration order
//! - **Independent definitions**: one failing metric never prevents the
//!   others on the same line from emitting
//! - **At most one emission** per line per metric definition

mod pipeline;

pub use pipeline::Pipeline;

/// Stat key: every line received from the tailer
pub const LINES_SEEN: &str = "lines_seen";
/// Stat key: lines that were empty after trimming
pub const BLANK_LINES_SEEN: &str = "blank_lines_seen";
/// Stat key: successful metric emissions
pub const METRICS_PUBLISHED: &str = "metrics_published";
/// Stat key: lines a metric definition failed to parse or project
pub const FAILED_EXTRACTION: &str = "failed_extraction";
