//! Configuration for export runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default output directory for exported files.
fn default_output_dir() -> PathBuf {
    PathBuf::from("./export")
}

/// Default number of file ids per metadata query.
fn default_batch_size() -> usize {
    100
}

/// Default bound on parallel downloads within a batch.
fn default_max_concurrent() -> usize {
    8
}

/// Filename of the CSV manifest when no explicit ledger path is configured.
const DEFAULT_LEDGER_FILENAME: &str = "files.csv";

/// Settings consumed, not sourced, by the library.
///
/// How the values are obtained (CLI flags, files, environment) is the
/// embedding application's business; the same goes for log verbosity, which
/// is whatever `tracing` subscriber the application installs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory files are written to; created if absent (default: "./export")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where the CSV manifest is written (default: `{output_dir}/files.csv`)
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,

    /// File ids per metadata query (default: 100)
    ///
    /// Clamped at run time to `1..=`[`soql::IN_CLAUSE_MAX`](crate::soql::IN_CLAUSE_MAX).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Parallel downloads within a batch (default: 8)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// What to do when the target file already exists on disk
    #[serde(default)]
    pub existing_file: ExistingFileAction,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            ledger_path: None,
            batch_size: default_batch_size(),
            max_concurrent_downloads: default_max_concurrent(),
            existing_file: ExistingFileAction::default(),
        }
    }
}

impl ExportConfig {
    /// The effective manifest path: the configured one, or the default
    /// filename inside the output directory.
    #[must_use]
    pub fn ledger_file(&self) -> PathBuf {
        self.ledger_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_LEDGER_FILENAME))
    }
}

/// Policy for files already present at their target path.
///
/// Earlier versions of the tooling this library replaces skipped files that
/// were already on disk; later versions always re-downloaded. Both behaviors
/// are legitimate, so the choice is explicit configuration rather than a
/// silent default changing between releases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingFileAction {
    /// Re-download and overwrite the existing file (default)
    #[default]
    Overwrite,
    /// Leave the existing file untouched and write no ledger row for it
    Skip,
}
