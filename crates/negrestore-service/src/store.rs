//! On-disk storage for uploads and processed results.
//!
//! Uploads are named by the SHA-256 of their bytes plus an extension taken
//! from the sniffed format, so identical uploads share one file. Processed
//! results live next to them as `processed_<stem>.<jpg|png>`.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use image::ImageFormat;
use negrestore_core::{CorrectionParams, EngineError, OutputFormat};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::config::ServiceConfig;
use crate::ipc::ErrorKind;
use crate::retention::{self, SweepReport};

/// Declared content types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Prefix of every processed result's name.
pub const PROCESSED_PREFIX: &str = "processed_";

/// Errors from the image store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no stored image named {0:?}")]
    NotFound(String),

    #[error("invalid image name {0:?}")]
    InvalidName(String),

    #[error("unsupported content type {0:?}")]
    UnsupportedType(String),

    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("upload is not a valid image: {0}")]
    InvalidImage(String),

    #[error("{0:?} is already being processed")]
    Busy(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("worker task failed: {0}")]
    Worker(String),
}

impl StoreError {
    /// Protocol error category for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidName(_)
            | Self::UnsupportedType(_)
            | Self::TooLarge { .. }
            | Self::InvalidImage(_) => ErrorKind::InvalidInput,
            Self::Busy(_) => ErrorKind::Busy,
            Self::Engine(e) if e.is_client_error() => ErrorKind::InvalidInput,
            Self::Engine(_) | Self::Io { .. } | Self::Worker(_) => ErrorKind::Internal,
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Where a name currently sits in the upload → process → expire lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    /// The upload is stored but has no processed result yet.
    Uploaded,
    /// A processed result exists.
    Processed,
    /// Nothing is stored under the name (swept, or never uploaded).
    Expired,
}

/// Upload and processed-result storage rooted in two directories.
pub struct ImageStore {
    uploads: PathBuf,
    processed: PathBuf,
    max_upload_bytes: u64,
    retention: Duration,
    params: Arc<CorrectionParams>,
    in_flight: Mutex<HashSet<String>>,
    next_partial: AtomicU64,
}

impl ImageStore {
    /// Open (creating if needed) the store described by `config`.
    pub fn open(config: &ServiceConfig, params: CorrectionParams) -> Result<Self, StoreError> {
        let uploads = config.upload_dir();
        let processed = config.processed_dir();
        for dir in [&uploads, &processed] {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        tracing::info!(
            uploads = %uploads.display(),
            processed = %processed.display(),
            "image store ready"
        );
        Ok(Self {
            uploads,
            processed,
            max_upload_bytes: config.max_upload_bytes,
            retention: config.retention,
            params: Arc::new(params),
            in_flight: Mutex::new(HashSet::new()),
            next_partial: AtomicU64::new(0),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.uploads
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed
    }

    pub fn params(&self) -> &CorrectionParams {
        &self.params
    }

    /// Validate and store an upload, returning its content-derived name.
    ///
    /// Checks, in order: size limit, declared content type, sniffed format,
    /// and that the bytes actually decode.
    pub async fn save_upload(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        let size = bytes.len() as u64;
        if size > self.max_upload_bytes {
            return Err(StoreError::TooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }

        let declared = content_type.trim().to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&declared.as_str()) {
            return Err(StoreError::UnsupportedType(content_type.to_string()));
        }

        let extension = match image::guess_format(&bytes) {
            Ok(ImageFormat::Jpeg) => "jpg",
            Ok(ImageFormat::Png) => "png",
            Ok(ImageFormat::WebP) => "webp",
            Ok(other) => {
                return Err(StoreError::InvalidImage(format!(
                    "{other:?} content is not accepted"
                )));
            }
            Err(e) => return Err(StoreError::InvalidImage(e.to_string())),
        };

        let bytes = tokio::task::spawn_blocking(move || {
            negrestore_core::decode(&bytes)
                .map(|_| bytes)
                .map_err(|e| StoreError::InvalidImage(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Worker(format!("decode check panicked: {e}")))??;

        let name = format!("{:x}.{extension}", Sha256::digest(&bytes));
        let path = self.uploads.join(&name);
        let existed = tokio::fs::try_exists(&path).await.unwrap_or(false);
        // Rewriting refreshes the mtime so a repeat upload restarts retention.
        // Readers only ever see the old file or the complete new one.
        let partial = self
            .uploads
            .join(format!("{name}.{}.part", self.next_partial.fetch_add(1, Ordering::Relaxed)));
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|e| StoreError::io(&partial, e))?;
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        tracing::info!(%name, size, existed, "stored upload");
        Ok(name)
    }

    /// Run the pipeline over the upload `name` and return the processed name.
    ///
    /// An existing result is returned as-is. A concurrent request for the
    /// same name fails with [`StoreError::Busy`].
    pub async fn process(&self, name: &str) -> Result<String, StoreError> {
        validate_name(name)?;
        let input = self.uploads.join(name);
        let output_name = processed_name(name);
        let output = self.processed.join(&output_name);

        let _claim = self.claim(name)?;

        if tokio::fs::try_exists(&output).await.unwrap_or(false) {
            tracing::debug!(%name, "processed result already present");
            return Ok(output_name);
        }

        let bytes = match tokio::fs::read(&input).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(e) => return Err(StoreError::io(&input, e)),
        };

        let params = Arc::clone(&self.params);
        let format = OutputFormat::for_path(Path::new(&output_name));
        let encoded = tokio::task::spawn_blocking(move || {
            negrestore_core::process(&bytes, &params, format)
        })
        .await
        .map_err(|e| StoreError::Worker(format!("pipeline panicked: {e}")))??;

        let partial = output.with_extension("part");
        tokio::fs::write(&partial, &encoded)
            .await
            .map_err(|e| StoreError::io(&partial, e))?;
        tokio::fs::rename(&partial, &output)
            .await
            .map_err(|e| StoreError::io(&output, e))?;

        tracing::info!(%name, output = %output_name, bytes = encoded.len(), "processed upload");
        Ok(output_name)
    }

    /// Read a processed result.
    pub async fn fetch(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        validate_name(name)?;
        let path = self.processed.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Lifecycle state of the upload `name`.
    pub fn state(&self, name: &str) -> Result<ImageState, StoreError> {
        validate_name(name)?;
        if self.processed.join(processed_name(name)).is_file() {
            Ok(ImageState::Processed)
        } else if self.uploads.join(name).is_file() {
            Ok(ImageState::Uploaded)
        } else {
            Ok(ImageState::Expired)
        }
    }

    /// Delete everything older than the retention age. Blocking.
    pub fn sweep_now(&self) -> SweepReport {
        self.sweep_at(SystemTime::now())
    }

    /// Sweep as if the current time were `now`.
    pub fn sweep_at(&self, now: SystemTime) -> SweepReport {
        retention::sweep(&[&self.uploads, &self.processed], self.retention, now)
    }

    fn claim(&self, name: &str) -> Result<InFlight<'_>, StoreError> {
        if !self.in_flight.lock().insert(name.to_string()) {
            return Err(StoreError::Busy(name.to_string()));
        }
        Ok(InFlight {
            set: &self.in_flight,
            name: name.to_string(),
        })
    }
}

/// Marks a name as being processed until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    name: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.name);
    }
}

/// Name of the processed result for the upload `name`.
///
/// PNG uploads stay PNG; everything else becomes JPEG.
pub fn processed_name(name: &str) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let format = OutputFormat::for_path(path);
    format!("{PROCESSED_PREFIX}{stem}.{}", format.extension())
}

/// Reject names that could escape the store directories.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || Path::new(name).is_absolute();
    if bad {
        Err(StoreError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
