//! Follow command - tail a live log file forever
//!
//! Starts at the current end of the file so an already-large log does not
//! replay historical lines, then follows through rotations until a
//! shutdown signal arrives.

use std::path::PathBuf;

use anyhow::Result;

use extractor_config::Config;

use super::ExtractionMode;

/// Run the follow command
pub async fn run(config: Config, path: PathBuf) -> Result<()> {
    super::run_extraction(
        config,
        path,
        ExtractionMode {
            from_end: true,
            follow: true,
        },
    )
    .await
}
