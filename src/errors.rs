//! Typed error hierarchy for the opsboard service.
//!
//! Two top-level enums cover the two failing subsystems:
//! - `ConnectorError`: token exchange and external HTTP call failures
//! - `StoreError`: JSON-document read/decode/write failures
//!
//! Handler-level errors live in `crate::api` as `ApiError`, which maps
//! onto HTTP status codes.

use thiserror::Error;

/// Errors from the external-connector subsystem (token exchange, GitHub
/// contents API, Microsoft Graph).
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Connector hostname is not configured")]
    HostnameMissing,

    #[error("No identity token available for the connector exchange")]
    IdentityMissing,

    #[error("{connector} is not connected")]
    NotConnected { connector: &'static str },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse {
        endpoint: &'static str,
        message: String,
    },
}

/// Errors from the GitHub-backed JSON-document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Expected a file at {path}, got a directory")]
    NotAFile { path: String },

    #[error("File {path} has no content")]
    NoContent { path: String },

    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Write to {path} was rejected by the store")]
    WriteRejected { path: String },

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
