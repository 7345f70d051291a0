//! Error types for sf-files-dl
//!
//! This module provides the error taxonomy for the library:
//! - Run-fatal errors (scope query rejection, ledger creation, auth)
//! - Batch-fatal errors (per-batch metadata query or cursor-follow failures)
//! - File-local errors (individual download failures, consistency faults)
//!
//! Only run-fatal errors propagate out of [`FileExporter::run`](crate::FileExporter::run);
//! batch- and file-local errors are converted to counters plus log output so
//! a run always finishes with a final tally.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sf-files-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sf-files-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (invalid instance URL, bad path, etc.)
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
    },

    /// A SOQL query or pagination cursor was rejected by the API
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// A single file's content fetch or disk write failed
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// The CSV manifest could not be created or appended to
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A metadata row referenced a file id with no resolved link
    #[error("no resolved link for file {file_id}")]
    LinkConsistency {
        /// The ContentDocumentId that had no matching link row
        file_id: String,
    },

    /// Login handshake failed
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// SOQL query and pagination errors
///
/// Fatal at resolver scope (the run has no partial scope); fatal to the
/// affected batch during metadata lookups.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The remote API rejected the query
    #[error("query rejected with HTTP {status}: {message}")]
    Rejected {
        /// HTTP status code returned by the API
        status: u16,
        /// Response body, typically a JSON error description
        message: String,
    },

    /// A pagination continuation failed mid-sequence
    #[error("cursor follow failed for {cursor}: {reason}")]
    CursorFailed {
        /// The `nextRecordsUrl` cursor that could not be followed
        cursor: String,
        /// Why the follow-up request failed
        reason: String,
    },

    /// The query response could not be parsed
    #[error("malformed query response: {reason}")]
    MalformedResponse {
        /// Why the response body could not be parsed
        reason: String,
    },
}

/// Per-file download errors
///
/// Always file-local: logged and counted, never aborting the batch or run.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The content fetch returned a non-success HTTP status
    #[error("content fetch returned HTTP {status}")]
    HttpStatus {
        /// The non-success status code
        status: u16,
    },

    /// The content fetch failed at the transport level
    #[error("content fetch failed: {reason}")]
    Transport {
        /// The underlying transport failure
        reason: String,
    },

    /// The downloaded bytes could not be written to disk
    #[error("failed to write {path}: {reason}")]
    Write {
        /// The target path that could not be written
        path: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },
}

/// CSV manifest errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger file could not be created (run-fatal)
    #[error("failed to create ledger at {path}: {reason}")]
    Create {
        /// The ledger path that could not be created
        path: PathBuf,
        /// The underlying I/O failure
        reason: String,
    },

    /// A row append failed (counted as an audit discrepancy, not fatal)
    #[error("failed to append ledger row: {reason}")]
    Append {
        /// The underlying write failure
        reason: String,
    },
}

/// Login handshake errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint rejected the credentials
    #[error("login rejected with HTTP {status}: {message}")]
    Rejected {
        /// HTTP status code returned by the token endpoint
        status: u16,
        /// Response body, typically a JSON error description
        message: String,
    },

    /// The token response could not be parsed
    #[error("malformed token response: {reason}")]
    MalformedResponse {
        /// Why the response body could not be parsed
        reason: String,
    },
}
