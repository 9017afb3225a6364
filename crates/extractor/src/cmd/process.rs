//! Process command - extract metrics from an existing file once
//!
//! Reads the whole file from the start in a single pass and exits when it
//! has been drained.

use std::path::PathBuf;

use anyhow::Result;

use extractor_config::Config;

use super::ExtractionMode;

/// Run the process command
pub async fn run(config: Config, path: PathBuf) -> Result<()> {
    super::run_extraction(
        config,
        path,
        ExtractionMode {
            from_end: false,
            follow: false,
        },
    )
    .await
}
