//! Batch-by-batch export loop — metadata queries, cursor following, and
//! parallel fetch+write+ledger-append per file.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::stream::{self, StreamExt};

use crate::client;
use crate::config::ExistingFileAction;
use crate::error::{DownloadError, Result};
use crate::ledger::Ledger;
use crate::types::{Event, FileLink, FileRecord, LedgerRow, RunSummary};
use crate::{batch, resolver, sanitize, soql};

use super::FileExporter;

/// Atomic tallies shared by the parallel download workers of a run.
#[derive(Default)]
struct Counters {
    saved: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    ledger_discrepancies: AtomicU64,
}

impl Counters {
    fn summary(&self) -> RunSummary {
        let saved = self.saved.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let skipped = self.skipped.load(Ordering::Relaxed);
        RunSummary {
            attempted: saved + failed + skipped,
            saved,
            failed,
            skipped,
            ledger_discrepancies: self.ledger_discrepancies.load(Ordering::Relaxed),
        }
    }
}

/// Drive a whole export run and return the final tally.
///
/// Batches run sequentially to bound concurrent API load and result-set
/// memory; files within a batch download in parallel. A failed batch counts
/// its files as failed and the run moves on; only scope resolution and
/// ledger creation abort the run.
pub(super) async fn run_export(exporter: &FileExporter, scope_query: &str) -> Result<RunSummary> {
    let config = &exporter.config;
    tokio::fs::create_dir_all(&config.output_dir).await?;
    let ledger = Ledger::create(&config.ledger_file())?;
    run_with_ledger(exporter, scope_query, &ledger).await
}

/// The run proper, over an already-created ledger. Split from [`run_export`]
/// so the append-failure path can be driven in tests.
pub(super) async fn run_with_ledger(
    exporter: &FileExporter,
    scope_query: &str,
    ledger: &Ledger,
) -> Result<RunSummary> {
    let config = &exporter.config;
    let resolved = resolver::resolve_links(exporter.client.as_ref(), scope_query).await?;

    // First link per file id carries the parent provenance for the ledger row.
    // Files shared by several parents are downloaded once.
    let mut link_index: HashMap<&str, &FileLink> = HashMap::new();
    for link in &resolved.links {
        link_index.entry(link.file_id.as_str()).or_insert(link);
    }

    let batch_size = config.batch_size.clamp(1, soql::IN_CLAUSE_MAX);
    let batches: Vec<&[String]> = batch::partition(&resolved.file_ids, batch_size).collect();

    exporter
        .event_tx
        .send(Event::RunStarted {
            total_files: resolved.file_ids.len(),
            batches: batches.len(),
        })
        .ok();
    tracing::info!(
        files = resolved.file_ids.len(),
        batches = batches.len(),
        batch_size,
        "Starting export"
    );

    let counters = Counters::default();
    for (index, ids) in batches.iter().enumerate() {
        if let Err(e) = process_batch(exporter, ids, &link_index, ledger, &counters).await {
            tracing::error!(
                batch = index,
                files = ids.len(),
                error = %e,
                "Batch metadata query failed, moving to next batch"
            );
            counters.failed.fetch_add(ids.len() as u64, Ordering::Relaxed);
        }
        exporter
            .event_tx
            .send(Event::BatchCompleted {
                index,
                saved: counters.saved.load(Ordering::Relaxed),
                failed: counters.failed.load(Ordering::Relaxed),
            })
            .ok();
    }

    let summary = counters.summary();
    tracing::info!(
        attempted = summary.attempted,
        saved = summary.saved,
        failed = summary.failed,
        skipped = summary.skipped,
        "Export run finished"
    );
    if summary.ledger_discrepancies > 0 {
        tracing::error!(
            missing_rows = summary.ledger_discrepancies,
            ledger = %ledger.path().display(),
            "Ledger is missing rows for files that were saved; the audit trail is incomplete"
        );
    }
    exporter.event_tx.send(Event::RunCompleted { summary }).ok();
    Ok(summary)
}

/// Query one batch's metadata (draining continuation cursors), then download
/// every row's content in parallel.
///
/// Returns `Err` only for the metadata query itself; individual download
/// failures are counted and isolated to their file. All ledger rows for the
/// batch are flushed before this returns.
async fn process_batch(
    exporter: &FileExporter,
    ids: &[String],
    link_index: &HashMap<&str, &FileLink>,
    ledger: &Ledger,
    counters: &Counters,
) -> Result<()> {
    let soql = soql::content_version_query(ids);
    let records = client::query_all(exporter.client.as_ref(), &soql).await?;
    tracing::debug!(ids = ids.len(), rows = records.len(), "Batch metadata collected");

    let mut tasks: Vec<(FileRecord, FileLink)> = Vec::with_capacity(records.len());
    for record in &records {
        let Some(file) = FileRecord::from_record(record) else {
            tracing::warn!(
                keys = ?record.keys().collect::<Vec<_>>(),
                "Skipping malformed metadata row"
            );
            counters.failed.fetch_add(1, Ordering::Relaxed);
            continue;
        };
        match link_index.get(file.file_id.as_str()) {
            Some(link) => tasks.push((file, (*link).clone())),
            None => {
                // Consistency fault: a file is never downloaded without the
                // link that establishes its provenance
                let err = crate::error::Error::LinkConsistency {
                    file_id: file.file_id.clone(),
                };
                tracing::warn!(
                    file_id = %file.file_id,
                    title = %file.title,
                    error = %err,
                    "Metadata row has no resolved link, skipping"
                );
                counters.failed.fetch_add(1, Ordering::Relaxed);
                exporter
                    .event_tx
                    .send(Event::FileFailed {
                        file_id: file.file_id,
                        reason: err.to_string(),
                    })
                    .ok();
            }
        }
    }

    let concurrency = exporter.config.max_concurrent_downloads.max(1);
    stream::iter(tasks)
        .map(|(file, link)| download_one(exporter, file, link, ledger, counters))
        .buffer_unordered(concurrency)
        .collect::<Vec<()>>()
        .await;

    Ok(())
}

/// Fetch one file's content, write it to its sanitized path, and append the
/// ledger row. Every failure mode is file-local: it updates a counter and
/// emits an event, never propagating to the batch.
async fn download_one(
    exporter: &FileExporter,
    file: FileRecord,
    link: FileLink,
    ledger: &Ledger,
    counters: &Counters,
) {
    let config = &exporter.config;
    let path = sanitize::sanitized_path(
        &config.output_dir,
        &file.file_id,
        &file.title,
        file.file_extension.as_deref(),
    );

    if config.existing_file == ExistingFileAction::Skip
        && tokio::fs::try_exists(&path).await.unwrap_or(false)
    {
        tracing::debug!(file_id = %file.file_id, path = %path.display(), "File already present, skipping");
        counters.skipped.fetch_add(1, Ordering::Relaxed);
        return;
    }

    let bytes = match exporter.client.fetch_content(&file.version_data_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = crate::error::Error::Download(e);
            tracing::warn!(file_id = %file.file_id, title = %file.title, error = %err, "Download failed");
            counters.failed.fetch_add(1, Ordering::Relaxed);
            exporter
                .event_tx
                .send(Event::FileFailed {
                    file_id: file.file_id,
                    reason: err.to_string(),
                })
                .ok();
            return;
        }
    };

    if let Err(e) = tokio::fs::write(&path, &bytes).await {
        let err = crate::error::Error::Download(DownloadError::Write {
            path: path.clone(),
            reason: e.to_string(),
        });
        tracing::warn!(file_id = %file.file_id, error = %err, "Write failed");
        counters.failed.fetch_add(1, Ordering::Relaxed);
        exporter
            .event_tx
            .send(Event::FileFailed {
                file_id: file.file_id,
                reason: err.to_string(),
            })
            .ok();
        return;
    }

    tracing::info!(
        file_id = %file.file_id,
        bytes = bytes.len(),
        path = %path.display(),
        "Saved file"
    );
    counters.saved.fetch_add(1, Ordering::Relaxed);

    let row = LedgerRow {
        linked_entity_id: link.linked_entity_id,
        linked_entity_name: link.linked_entity_name,
        file_id: file.file_id.clone(),
        title: file.title.clone(),
        local_path: path.clone(),
        path_on_client: file.path_on_client(),
    };
    if let Err(e) = ledger.append(&row).await {
        // The file is on disk but the audit trail now disagrees; surfaced
        // again as a distinct end-of-run error line
        tracing::error!(file_id = %file.file_id, error = %e, "Saved file but could not append its ledger row");
        counters.ledger_discrepancies.fetch_add(1, Ordering::Relaxed);
    }

    exporter
        .event_tx
        .send(Event::FileSaved {
            file_id: file.file_id,
            path,
        })
        .ok();
}
