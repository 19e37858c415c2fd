//! Message contracts between clients and the restoration service.
//!
//! Messages travel as JSON text frames over WebSocket and use the
//! `#[serde(tag = "type", content = "data")]` layout. Binary image payloads
//! are base64 encoded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Messages from a client to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientRequest {
    /// Store an encoded image for later processing.
    Upload {
        /// Declared MIME type (`image/jpeg`, `image/png`, `image/webp`).
        content_type: String,
        /// Base64 encoded file contents.
        data: String,
    },

    /// Run the restoration pipeline over a previously uploaded image.
    Process {
        /// Name returned by `Upload`.
        name: String,
    },

    /// Download a processed image.
    Fetch {
        /// Name returned by `Process`.
        name: String,
    },

    /// Liveness probe.
    Ping,
}

/// Messages from the service to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerResponse {
    /// The upload was stored (or already present) under `name`.
    Uploaded {
        /// Content-derived storage name.
        name: String,
    },

    /// The processed result is available under `name`.
    Processed {
        /// Name to pass to `Fetch`.
        name: String,
    },

    /// A processed image.
    Image {
        /// Requested name.
        name: String,
        /// Base64 encoded file contents.
        data: String,
    },

    /// Reply to `Ping`.
    Pong,

    /// The request failed.
    Error {
        /// Failure category.
        kind: ErrorKind,
        /// Human-readable description.
        message: String,
    },
}

/// Broad failure categories reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request or its payload was unacceptable.
    InvalidInput,
    /// The referenced image does not exist (or has expired).
    NotFound,
    /// The same image is already being processed.
    Busy,
    /// Something failed on the service side.
    Internal,
}

impl ServerResponse {
    /// Build an `Image` response, encoding `bytes` as base64.
    pub fn image(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self::Image {
            name: name.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Build an `Error` response.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            message: message.into(),
        }
    }
}

impl ClientRequest {
    /// Build an `Upload` request, encoding `bytes` as base64.
    pub fn upload(content_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::Upload {
            content_type: content_type.into(),
            data: STANDARD.encode(bytes),
        }
    }
}

/// Decode a base64 payload.
pub fn decode_payload(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(data.trim())
}
