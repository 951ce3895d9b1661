//! Error types for pmsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single remote call against the document/database API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The API answered with a non-success status.
    #[error("{endpoint} returned HTTP {status} ({code}): {message}")]
    Status {
        endpoint: String,
        status: u16,
        code: String,
        message: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status, when the API produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required settings were absent or empty.
    #[error("missing required settings: {}", keys.join(", "))]
    Missing { keys: Vec<&'static str> },

    /// The field-mapping file exists but could not be read.
    #[error("failed to read field mapping at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The field-mapping file is not valid YAML for [`crate::FieldNames`].
    #[error("failed to parse field mapping at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A property exists on the record but cannot be read as the requested kind.
///
/// Absence is not an error; accessors report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("property '{name}' is malformed: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("property '{name}' is a {found} property, expected {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}
