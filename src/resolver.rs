//! Link resolution — enumerate (parent, file) pairs and deduplicate file ids.

use crate::client::{self, QueryClient};
use crate::error::Result;
use crate::types::FileLink;
use std::collections::HashSet;

/// Output of [`resolve_links`]: every link row plus the deduplicated id set.
#[derive(Clone, Debug, Default)]
pub struct ResolvedLinks {
    /// Deduplicated file ids in first-seen order
    pub file_ids: Vec<String>,
    /// One entry per (parent, file) link row, duplicates included
    pub links: Vec<FileLink>,
}

/// Execute the caller-supplied ContentDocumentLink query and collect links.
///
/// The scope query is run once (continuation cursors are followed, but the
/// query itself is never re-batched) and is fatal to the run if rejected —
/// there is no partial scope. Every link row is kept, since one file may be
/// attached to many parents; the returned id list carries each file id once.
/// Rows missing required fields are logged and skipped, not fatal.
pub async fn resolve_links(
    client: &dyn QueryClient,
    scope_query: &str,
) -> Result<ResolvedLinks> {
    let records = client::query_all(client, scope_query).await?;

    let mut seen = HashSet::new();
    let mut resolved = ResolvedLinks::default();
    for record in &records {
        match FileLink::from_record(record) {
            Some(link) => {
                if seen.insert(link.file_id.clone()) {
                    resolved.file_ids.push(link.file_id.clone());
                }
                resolved.links.push(link);
            }
            None => {
                tracing::warn!(
                    keys = ?record.keys().collect::<Vec<_>>(),
                    "Skipping link row with missing required fields"
                );
            }
        }
    }

    tracing::info!(
        links = resolved.links.len(),
        unique_files = resolved.file_ids.len(),
        "Resolved file links"
    );
    Ok(resolved)
}
