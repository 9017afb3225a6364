//! Extractor - Stats
//!
//! Process-scoped named counters for pipeline observability, plus a
//! reporter task that periodically gauges them to the sink.
//!
//! The registry is the one piece of shared-mutable state in the process:
//! a single mutex covers both the map and any in-progress snapshot. It is
//! owned by whoever spawns the tasks and shared by `Arc`, never a global.

mod registry;
mod reporter;

pub use registry::StatsRegistry;
pub use reporter::StatsReporter;
