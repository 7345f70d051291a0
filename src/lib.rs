//! # sf-files-dl
//!
//! Library for bulk-exporting Salesforce Files (ContentVersion records) to
//! local disk.
//!
//! ## Design Philosophy
//!
//! sf-files-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Auditable** - Every saved file is recorded in a CSV manifest
//! - **Fault-isolating** - One bad file or batch never aborts the run
//!
//! Given a ContentDocumentLink SOQL query scoping which parent records'
//! attachments to export, the library resolves link rows, deduplicates file
//! ids, batches metadata lookups under the SOQL IN-clause limit, follows
//! pagination cursors, downloads content in parallel, and appends one ledger
//! row per saved file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sf_files_dl::{ExportConfig, FileExporter, RestClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RestClient::new(
//!         "https://myorg.my.salesforce.com",
//!         "00Dxx0000000000!AQEA-session-token",
//!     )?;
//!
//!     let exporter = FileExporter::new(Arc::new(client), ExportConfig::default());
//!
//!     // Subscribe to progress events
//!     let mut events = exporter.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = exporter
//!         .run(
//!             "SELECT ContentDocumentId, LinkedEntityId, LinkedEntity.Name, \
//!              ContentDocument.Title, ContentDocument.FileExtension \
//!              FROM ContentDocumentLink \
//!              WHERE LinkedEntityId IN ('001xx000003DGb0AAG')",
//!         )
//!         .await?;
//!
//!     println!("saved {} of {} files", summary.saved, summary.attempted);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Salesforce login handshake (OAuth 2.0 username-password flow)
pub mod auth;
/// Fixed-size partitioning for IN-clause queries
pub mod batch;
/// Salesforce REST API access
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Export orchestration (decomposed into focused submodules)
pub mod exporter;
/// CSV manifest of exported files
pub mod ledger;
/// Link resolution and file-id deduplication
pub mod resolver;
/// Filesystem-safe output paths
pub mod sanitize;
/// SOQL query construction
pub mod soql;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use auth::{Credentials, Session};
pub use client::{API_VERSION, QueryClient, QueryPage, RestClient};
pub use config::{ExistingFileAction, ExportConfig};
pub use error::{AuthError, DownloadError, Error, LedgerError, QueryError, Result};
pub use exporter::FileExporter;
pub use ledger::Ledger;
pub use types::{Event, FileLink, FileRecord, LedgerRow, RunSummary};
