//! Runtime configuration for the service.

use std::path::PathBuf;
use std::time::Duration;

/// Default listen address for the WebSocket endpoint.
const DEFAULT_ADDR: &str = "127.0.0.1:8000";
/// Default root for the upload and processed stores.
const DEFAULT_DATA_DIR: &str = "data";
/// Default upload size ceiling in MiB.
const DEFAULT_MAX_UPLOAD_MB: u64 = 5;
/// Default age after which stored files are swept (2 hours).
const DEFAULT_RETENTION_SECS: u64 = 2 * 60 * 60;
/// Default period of the background sweep.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10 * 60;

/// Runtime configuration for the restoration service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the WebSocket server binds to.
    pub addr: String,
    /// Directory holding `uploads/` and `processed/`.
    pub data_dir: PathBuf,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: u64,
    /// Files older than this are deleted by the sweep.
    pub retention: Duration,
    /// How often the background sweep runs.
    pub sweep_interval: Duration,
    /// Optional JSON file with correction parameters.
    pub params_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: std::env::var("NEGRESTORE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            data_dir: std::env::var_os("NEGRESTORE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            max_upload_bytes: env_u64("NEGRESTORE_MAX_UPLOAD_MB").unwrap_or(DEFAULT_MAX_UPLOAD_MB)
                * 1024
                * 1024,
            retention: Duration::from_secs(
                env_u64("NEGRESTORE_RETENTION_SECS").unwrap_or(DEFAULT_RETENTION_SECS),
            ),
            sweep_interval: Duration::from_secs(
                env_u64("NEGRESTORE_SWEEP_INTERVAL_SECS")
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS)
                    .max(1),
            ),
            params_path: std::env::var_os("NEGRESTORE_PARAMS").map(PathBuf::from),
        }
    }
}

impl ServiceConfig {
    /// Configuration rooted at `data_dir` with every other value at its
    /// built-in default, ignoring the environment.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            data_dir: data_dir.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            retention: Duration::from_secs(DEFAULT_RETENTION_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            params_path: None,
        }
    }

    /// Store for accepted uploads.
    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Store for pipeline output.
    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
