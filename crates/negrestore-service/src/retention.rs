//! Age-based deletion of stored files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::store::ImageStore;

/// Outcome of one sweep pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Files that were deleted.
    pub removed: Vec<PathBuf>,
    /// Files (or directories) that could not be inspected or deleted.
    pub failed: usize,
}

/// Delete regular files older than `max_age` (relative to `now`) from each
/// directory. Subdirectories are left alone. Failures are logged and
/// counted, never propagated.
pub fn sweep(dirs: &[&Path], max_age: Duration, now: SystemTime) -> SweepReport {
    let mut report = SweepReport::default();

    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "cannot list directory: {e}");
                report.failed += 1;
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let modified = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta.modified(),
                Ok(_) => continue,
                Err(e) => Err(e),
            };
            let age = match modified {
                Ok(mtime) => now.duration_since(mtime).unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "cannot read file age: {e}");
                    report.failed += 1;
                    continue;
                }
            };
            if age <= max_age {
                continue;
            }

            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), age_secs = age.as_secs(), "deleted expired file");
                    report.removed.push(path);
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), "failed to delete expired file: {e}");
                    report.failed += 1;
                }
            }
        }
    }

    report
}

/// Run [`ImageStore::sweep_now`] every `interval` until the runtime shuts
/// down. The first pass happens immediately.
pub fn spawn_sweeper(store: Arc<ImageStore>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let store = Arc::clone(&store);
            match tokio::task::spawn_blocking(move || store.sweep_now()).await {
                Ok(report) if !report.removed.is_empty() || report.failed > 0 => {
                    tracing::info!(
                        removed = report.removed.len(),
                        failed = report.failed,
                        "periodic sweep done"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!("sweep task panicked: {e}"),
            }
        }
    })
}
