//! CSV manifest of exported files.
//!
//! The ledger is the audit trail for what a run exported: one row per
//! successfully saved file, linking the parent record, the file id, and the
//! local path. It is the only resource mutated by concurrent download
//! workers, so appends serialize through a mutex around the writer and each
//! row is flushed before the lock is released — a batch's rows are durable
//! by the time the batch reports completion.

use crate::error::LedgerError;
use crate::types::LedgerRow;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Column order of the manifest; the external audit contract.
pub const LEDGER_HEADER: [&str; 6] = [
    "LinkedEntityId",
    "LinkedEntity Name",
    "ContentDocumentId",
    "Title",
    "Filepath",
    "PathOnClient",
];

/// Quote character for ledger fields (comma-delimited, `|`-quoted).
const QUOTE: u8 = b'|';

/// Append-only CSV manifest, safe under concurrent writers.
pub struct Ledger {
    writer: Mutex<csv::Writer<Box<dyn Write + Send>>>,
    path: PathBuf,
}

impl Ledger {
    /// Create (truncating any existing file) and write the header row.
    pub fn create(path: &Path) -> Result<Self, LedgerError> {
        let file = File::create(path).map_err(|e| LedgerError::Create {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_sink(Box::new(file), path.to_path_buf())
    }

    /// Build a ledger over an arbitrary byte sink and write the header row.
    pub(crate) fn from_sink(
        sink: Box<dyn Write + Send>,
        path: PathBuf,
    ) -> Result<Self, LedgerError> {
        let create_err = |reason: String| LedgerError::Create {
            path: path.clone(),
            reason,
        };

        let mut writer = csv::WriterBuilder::new().quote(QUOTE).from_writer(sink);
        writer
            .write_record(LEDGER_HEADER)
            .map_err(|e| create_err(e.to_string()))?;
        writer.flush().map_err(|e| create_err(e.to_string()))?;

        Ok(Self {
            writer: Mutex::new(writer),
            path,
        })
    }

    /// Append one row and flush it to disk.
    ///
    /// Serialized through the internal mutex; rows from parallel workers are
    /// never interleaved or truncated mid-write. A failed append leaves the
    /// ledger usable for subsequent rows.
    pub async fn append(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        let mut writer = self.writer.lock().await;
        writer
            .write_record([
                row.linked_entity_id.as_str(),
                row.linked_entity_name.as_str(),
                row.file_id.as_str(),
                row.title.as_str(),
                row.local_path.to_string_lossy().as_ref(),
                row.path_on_client.as_str(),
            ])
            .map_err(|e| LedgerError::Append { reason: e.to_string() })?;
        writer
            .flush()
            .map_err(|e| LedgerError::Append { reason: e.to_string() })
    }

    /// Where the manifest lives on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn row(file_id: &str, title: &str) -> LedgerRow {
        LedgerRow {
            linked_entity_id: "001A".to_string(),
            linked_entity_name: "Acme Corp".to_string(),
            file_id: file_id.to_string(),
            title: title.to_string(),
            local_path: PathBuf::from(format!("export/{file_id}_{title}.pdf")),
            path_on_client: format!("{title}.pdf"),
        }
    }

    #[test]
    fn create_writes_exact_header_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("files.csv");

        Ledger::create(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.lines().next().unwrap(),
            "LinkedEntityId,LinkedEntity Name,ContentDocumentId,Title,Filepath,PathOnClient"
        );
    }

    #[test]
    fn create_truncates_a_previous_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("files.csv");
        std::fs::write(&path, "stale,rows,from,a,previous,run\nmore,stale\n").unwrap();

        Ledger::create(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1, "only the fresh header remains");
    }

    #[tokio::test]
    async fn append_writes_one_row_per_call() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("files.csv");
        let ledger = Ledger::create(&path).unwrap();

        ledger.append(&row("069A", "Invoice")).await.unwrap();
        ledger.append(&row("069B", "Quote")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("069A"));
        assert!(lines[2].contains("069B"));
    }

    #[tokio::test]
    async fn fields_containing_commas_are_pipe_quoted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("files.csv");
        let ledger = Ledger::create(&path).unwrap();

        ledger.append(&row("069A", "Totals, Q1")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(
            contents.contains("|Totals, Q1|"),
            "comma-bearing field should be |-quoted: {contents}"
        );
    }

    #[tokio::test]
    async fn concurrent_appends_lose_and_duplicate_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("files.csv");
        let ledger = Arc::new(Ledger::create(&path).unwrap());

        let mut handles = Vec::new();
        for i in 0..64 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.append(&row(&format!("069{i:03}"), "Doc")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut ids: Vec<String> = contents
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(2).unwrap().to_string())
            .collect();
        assert_eq!(ids.len(), 64, "no lost rows");
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 64, "no duplicated rows");
    }
}
