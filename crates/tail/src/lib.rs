//! Extractor - Tail
//!
//! A rotation-aware file tailer. Follows a live log file that may be
//! truncated, rotated by rename+recreate, temporarily absent, or appended
//! to concurrently, without losing or duplicating lines, and without
//! holding the file handle open across rotations.
//!
//! # Design
//!
//! - **Open per tick**: the file is opened by path, read, and closed on
//!   every polling tick. Keeping a handle open across rotations is the
//!   canonical source of silent data loss - on Unix, reads would continue
//!   against the unlinked inode forever.
//! - **Two rotation signals**: a size smaller than the read offset detects
//!   in-place truncation; an inode change detects rename-and-recreate.
//!   Either resets the offset to zero.
//! - **Completed lines only**: a trailing fragment without a newline stays
//!   in the file for the next tick; the offset never advances past consumed
//!   lines, so a slow writer cannot cause a split or duplicated line.
//! - **Cooperative shutdown**: the cancellation token is checked at tick
//!   boundaries and between every emitted line; nothing is emitted after
//!   cancellation.

mod tailer;

pub use tailer::{TailConfig, Tailer, DEFAULT_POLL_INTERVAL};
