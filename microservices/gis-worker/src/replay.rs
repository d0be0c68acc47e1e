//! Replay message files from a directory
//!
//! Every `*.json` file is one queue message. Files run in name order; a bad
//! file or a failed message is logged and the run moves on.

use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::functions::{dispatch, WorkerFunction};
use crate::invocation::decode_queue_payload;
use crate::WorkerContext;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Unreadable or malformed files
    pub invalid: usize,
}

impl ReplaySummary {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed + self.invalid
    }
}

/// `*.json` files of `dir`, sorted by file name
pub async fn message_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

async fn load_message(path: &Path) -> Option<Value> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(t) => t,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Unreadable message file; skipped");
            return None;
        }
    };
    let raw: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Message file is not valid JSON; skipped");
            return None;
        }
    };
    match decode_queue_payload(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Message file holds no message object; skipped");
            None
        }
    }
}

pub async fn replay_directory(
    ctx: &WorkerContext,
    function: WorkerFunction,
    dir: &Path,
) -> Result<ReplaySummary> {
    let files = message_files(dir).await?;
    info!(function = %function, dir = %dir.display(), files = files.len(), "Replaying message files");

    let mut summary = ReplaySummary::default();
    for path in files {
        let message = match load_message(&path).await {
            Some(m) => m,
            None => {
                summary.invalid += 1;
                continue;
            }
        };

        match dispatch(ctx, function, message).await {
            Ok(outcome) if outcome.is_skipped() => {
                info!(file = %path.display(), outcome = %outcome.detail(), "Message skipped");
                summary.skipped += 1;
            }
            Ok(outcome) => {
                info!(file = %path.display(), outcome = %outcome.detail(), "Message processed");
                summary.processed += 1;
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "Message processing failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        function = %function,
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        invalid = summary.invalid,
        "Replay finished"
    );
    Ok(summary)
}
