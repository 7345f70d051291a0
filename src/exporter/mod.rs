//! Export orchestration — the batch loop, parallel downloads, and run summary.

mod orchestration;

use crate::client::QueryClient;
use crate::config::ExportConfig;
use crate::error::Result;
use crate::types::{Event, RunSummary};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the progress event channel; slow consumers lag, never block.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Coordinates an export run: link resolution, batched metadata queries,
/// parallel downloads, ledger writes, and the final tally.
pub struct FileExporter {
    pub(super) client: Arc<dyn QueryClient>,
    pub(super) config: ExportConfig,
    pub(super) event_tx: broadcast::Sender<Event>,
}

impl FileExporter {
    /// Create an exporter over a remote API client and configuration.
    #[must_use]
    pub fn new(client: Arc<dyn QueryClient>, config: ExportConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            config,
            event_tx,
        }
    }

    /// Subscribe to progress events for runs on this exporter.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run one export over the given ContentDocumentLink scope query.
    ///
    /// Resolves links, partitions the deduplicated file ids into batches,
    /// and downloads each batch's files in parallel. Only scope-resolution
    /// and ledger-creation failures abort the run; batch and file failures
    /// are counted and the run proceeds to a final [`RunSummary`].
    pub async fn run(&self, scope_query: &str) -> Result<RunSummary> {
        orchestration::run_export(self, scope_query).await
    }
}
