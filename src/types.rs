//! Core domain types and run events.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// One (parent record, file) association resolved from a ContentDocumentLink row.
///
/// A file shared by several parents produces one `FileLink` per parent; the
/// `file_id` is the dedup key for downloads, not the link itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileLink {
    /// Id of the parent record the file is attached to (LinkedEntityId)
    pub linked_entity_id: String,
    /// Display name of the parent record
    pub linked_entity_name: String,
    /// The stable file identifier (ContentDocumentId)
    pub file_id: String,
    /// File title as stored in Salesforce
    pub title: String,
    /// File extension, if any (`FileExtension` is null for extensionless files)
    pub file_extension: Option<String>,
}

impl FileLink {
    /// Parse a `FileLink` from a ContentDocumentLink query row.
    ///
    /// Expects the nested `LinkedEntity.Name` and `ContentDocument.Title` /
    /// `ContentDocument.FileExtension` relationship fields the link-resolution
    /// query selects. Returns `None` when a required field is absent.
    #[must_use]
    pub fn from_record(record: &Map<String, Value>) -> Option<Self> {
        Some(Self {
            linked_entity_id: string_field(record, "LinkedEntityId")?.to_string(),
            linked_entity_name: nested_string_field(record, "LinkedEntity", "Name")
                .unwrap_or_default()
                .to_string(),
            file_id: string_field(record, "ContentDocumentId")?.to_string(),
            title: nested_string_field(record, "ContentDocument", "Title")?.to_string(),
            file_extension: nested_string_field(record, "ContentDocument", "FileExtension")
                .map(str::to_string),
        })
    }
}

/// File metadata retrieved by a per-batch ContentVersion query.
///
/// "Latest version only" is enforced by the query predicate (`IsLatest = true`),
/// not by application logic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    /// The stable file identifier (ContentDocumentId)
    pub file_id: String,
    /// File title as stored in Salesforce
    pub title: String,
    /// File extension, if any
    pub file_extension: Option<String>,
    /// Relative REST path to the binary content (`VersionData`)
    pub version_data_path: String,
    /// When the version was created, if the timestamp parsed
    pub created_date: Option<DateTime<FixedOffset>>,
}

impl FileRecord {
    /// Parse a `FileRecord` from a ContentVersion query row.
    ///
    /// Returns `None` when a required field is absent. An unparseable
    /// `CreatedDate` is dropped rather than failing the row.
    #[must_use]
    pub fn from_record(record: &Map<String, Value>) -> Option<Self> {
        Some(Self {
            file_id: string_field(record, "ContentDocumentId")?.to_string(),
            title: string_field(record, "Title")?.to_string(),
            file_extension: string_field(record, "FileExtension").map(str::to_string),
            version_data_path: string_field(record, "VersionData")?.to_string(),
            created_date: string_field(record, "CreatedDate").and_then(parse_created_date),
        })
    }

    /// The filename the file had on the uploading client, reconstructed as
    /// `{title}.{extension}` (just the title for extensionless files).
    #[must_use]
    pub fn path_on_client(&self) -> String {
        match self.file_extension.as_deref() {
            Some(ext) if !ext.is_empty() => format!("{}.{}", self.title, ext),
            _ => self.title.clone(),
        }
    }
}

/// One row of the CSV manifest, appended per successfully saved file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerRow {
    /// Id of the parent record the file is attached to
    pub linked_entity_id: String,
    /// Display name of the parent record
    pub linked_entity_name: String,
    /// The stable file identifier
    pub file_id: String,
    /// File title
    pub title: String,
    /// Where the file was written locally
    pub local_path: PathBuf,
    /// The filename on the uploading client
    pub path_on_client: String,
}

/// Aggregate counts reported at the end of an export run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Files the run considered (saved + failed + skipped)
    pub attempted: u64,
    /// Files downloaded and written to disk
    pub saved: u64,
    /// Files that failed to download, write, or resolve a link
    pub failed: u64,
    /// Files left in place under the skip-if-present policy
    pub skipped: u64,
    /// Saved files whose ledger append failed (audit trail is incomplete)
    pub ledger_discrepancies: u64,
}

impl RunSummary {
    /// Whether any file failed or any ledger row went missing.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.ledger_discrepancies > 0
    }
}

/// Progress events emitted during an export run.
///
/// Consumers subscribe via [`FileExporter::subscribe`](crate::FileExporter::subscribe);
/// sends are best-effort and never block the export.
#[derive(Clone, Debug)]
pub enum Event {
    /// Link resolution finished and batch processing is about to start
    RunStarted {
        /// Number of deduplicated files to export
        total_files: usize,
        /// Number of batches the files were partitioned into
        batches: usize,
    },
    /// A batch finished (its metadata query, downloads, and ledger rows are done)
    BatchCompleted {
        /// Zero-based batch index
        index: usize,
        /// Files saved so far across the whole run
        saved: u64,
        /// Files failed so far across the whole run
        failed: u64,
    },
    /// A file was downloaded and written to disk
    FileSaved {
        /// The file's ContentDocumentId
        file_id: String,
        /// Where the file was written
        path: PathBuf,
    },
    /// A file could not be exported
    FileFailed {
        /// The file's ContentDocumentId
        file_id: String,
        /// Why the file failed
        reason: String,
    },
    /// The run finished and the summary is final
    RunCompleted {
        /// The aggregate counts for the run
        summary: RunSummary,
    },
}

/// Extract a string field from a query row, treating JSON null as absent.
fn string_field<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Extract a string field nested one relationship deep (e.g. `LinkedEntity.Name`).
fn nested_string_field<'a>(record: &'a Map<String, Value>, outer: &str, inner: &str) -> Option<&'a str> {
    record.get(outer)?.as_object()?.get(inner)?.as_str()
}

/// Parse a Salesforce timestamp.
///
/// The REST API emits `2024-03-01T10:30:00.000+0000`, which is not valid
/// RFC 3339 (no colon in the offset), so try the Salesforce format first.
fn parse_created_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn file_link_parses_nested_relationship_fields() {
        let record = as_map(json!({
            "attributes": {"type": "ContentDocumentLink"},
            "LinkedEntityId": "001xx000003DGb0AAG",
            "LinkedEntity": {"Name": "Acme Corp"},
            "ContentDocumentId": "069xx0000000001AAA",
            "ContentDocument": {"Title": "Quote", "FileExtension": "pdf"}
        }));

        let link = FileLink::from_record(&record).unwrap();

        assert_eq!(link.linked_entity_id, "001xx000003DGb0AAG");
        assert_eq!(link.linked_entity_name, "Acme Corp");
        assert_eq!(link.file_id, "069xx0000000001AAA");
        assert_eq!(link.title, "Quote");
        assert_eq!(link.file_extension.as_deref(), Some("pdf"));
    }

    #[test]
    fn file_link_missing_document_id_is_none() {
        let record = as_map(json!({
            "LinkedEntityId": "001xx000003DGb0AAG",
            "ContentDocument": {"Title": "Quote"}
        }));

        assert!(FileLink::from_record(&record).is_none());
    }

    #[test]
    fn file_link_null_extension_is_none() {
        let record = as_map(json!({
            "LinkedEntityId": "001xx000003DGb0AAG",
            "LinkedEntity": {"Name": "Acme Corp"},
            "ContentDocumentId": "069xx0000000001AAA",
            "ContentDocument": {"Title": "README", "FileExtension": null}
        }));

        let link = FileLink::from_record(&record).unwrap();
        assert_eq!(link.file_extension, None);
    }

    #[test]
    fn file_link_tolerates_missing_entity_name() {
        // LinkedEntity.Name can be withheld by sharing rules; the link is
        // still usable, just with an empty display name
        let record = as_map(json!({
            "LinkedEntityId": "001xx000003DGb0AAG",
            "ContentDocumentId": "069xx0000000001AAA",
            "ContentDocument": {"Title": "Quote", "FileExtension": "pdf"}
        }));

        let link = FileLink::from_record(&record).unwrap();
        assert_eq!(link.linked_entity_name, "");
    }

    #[test]
    fn file_record_parses_salesforce_timestamp() {
        let record = as_map(json!({
            "ContentDocumentId": "069xx0000000001AAA",
            "Title": "Quote",
            "FileExtension": "pdf",
            "VersionData": "/services/data/v59.0/sobjects/ContentVersion/068xx/VersionData",
            "CreatedDate": "2024-03-01T10:30:00.000+0000"
        }));

        let file = FileRecord::from_record(&record).unwrap();

        assert_eq!(file.file_id, "069xx0000000001AAA");
        assert!(file.created_date.is_some());
        assert_eq!(
            file.version_data_path,
            "/services/data/v59.0/sobjects/ContentVersion/068xx/VersionData"
        );
    }

    #[test]
    fn file_record_unparseable_date_is_dropped_not_fatal() {
        let record = as_map(json!({
            "ContentDocumentId": "069xx0000000001AAA",
            "Title": "Quote",
            "VersionData": "/path",
            "CreatedDate": "not a date"
        }));

        let file = FileRecord::from_record(&record).unwrap();
        assert_eq!(file.created_date, None);
    }

    #[test]
    fn file_record_missing_version_data_is_none() {
        let record = as_map(json!({
            "ContentDocumentId": "069xx0000000001AAA",
            "Title": "Quote"
        }));

        assert!(FileRecord::from_record(&record).is_none());
    }

    #[test]
    fn path_on_client_joins_title_and_extension() {
        let record = as_map(json!({
            "ContentDocumentId": "069xx0000000001AAA",
            "Title": "Quarterly Report",
            "FileExtension": "xlsx",
            "VersionData": "/path"
        }));

        let file = FileRecord::from_record(&record).unwrap();
        assert_eq!(file.path_on_client(), "Quarterly Report.xlsx");
    }

    #[test]
    fn path_on_client_without_extension_is_just_title() {
        let record = as_map(json!({
            "ContentDocumentId": "069xx0000000001AAA",
            "Title": "README",
            "VersionData": "/path"
        }));

        let file = FileRecord::from_record(&record).unwrap();
        assert_eq!(file.path_on_client(), "README");
    }

    #[test]
    fn parse_created_date_accepts_rfc3339_too() {
        assert!(parse_created_date("2024-03-01T10:30:00.000+00:00").is_some());
        assert!(parse_created_date("2024-03-01T10:30:00.000+0000").is_some());
        assert!(parse_created_date("yesterday").is_none());
    }
}
