//! SOQL query construction for ContentVersion metadata lookups.

/// File extension excluded from every metadata query.
///
/// `snote` versions are the HTML bodies of Salesforce enhanced Notes; they are
/// not user files and exporting them pollutes the output directory.
pub const EXCLUDED_EXTENSION: &str = "snote";

/// Hard upper bound on IN-clause element count.
///
/// SOQL caps a query at 100,000 characters rather than a literal element
/// count; 500 eighteen-character ids stays comfortably under that while
/// keeping result pages a sane size.
pub const IN_CLAUSE_MAX: usize = 500;

/// Build the metadata query for one batch of deduplicated file ids.
///
/// Selects the latest version of each file, excluding the denylisted
/// extension. The caller is responsible for keeping `file_ids` within
/// [`IN_CLAUSE_MAX`].
#[must_use]
pub fn content_version_query(file_ids: &[String]) -> String {
    let ids = file_ids
        .iter()
        .map(|id| format!("'{}'", escape_literal(id)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT ContentDocumentId, Title, FileExtension, VersionData, CreatedDate \
         FROM ContentVersion \
         WHERE IsLatest = true AND FileExtension != '{EXCLUDED_EXTENSION}' \
         AND ContentDocumentId IN ({ids})"
    )
}

/// Escape a string for embedding in a single-quoted SOQL literal.
pub(crate) fn escape_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}
