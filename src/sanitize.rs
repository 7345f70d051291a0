//! Filesystem-safe output paths for exported files.
//!
//! Salesforce titles are free-form text and routinely contain characters that
//! are illegal or hazardous in filenames. This module maps a title, extension,
//! and file id to a path that is safe on every supported filesystem and unique
//! per file id. Pure path arithmetic; nothing here touches the filesystem.

use std::path::{Path, PathBuf};

/// Filename used when a title sanitizes down to nothing.
const FALLBACK_STEM: &str = "file";

/// Device names reserved by Windows, which cannot be used as filename stems.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Build the output path for a file.
///
/// The file id is embedded as a filename prefix so two files sharing a title
/// and extension never collide. Always returns a usable candidate path.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sf_files_dl::sanitize::sanitized_path;
///
/// let path = sanitized_path(Path::new("export"), "069xx01", "Q1: results!", Some("pdf"));
/// assert_eq!(path, Path::new("export/069xx01_Q1_ results_.pdf"));
/// ```
#[must_use]
pub fn sanitized_path(
    output_dir: &Path,
    file_id: &str,
    title: &str,
    extension: Option<&str>,
) -> PathBuf {
    let id = sanitize_component(file_id);
    let stem = sanitize_component(title);
    let stem = if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    };

    let mut name = if id.is_empty() {
        stem
    } else {
        format!("{id}_{stem}")
    };
    if is_reserved(&name) {
        name.insert(0, '_');
    }

    match extension.map(sanitize_component).filter(|e| !e.is_empty()) {
        Some(ext) => output_dir.join(format!("{name}.{ext}")),
        None => output_dir.join(name),
    }
}

/// Replace every disallowed character in a filename component with `_`.
fn sanitize_component(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if is_disallowed(c) { '_' } else { c })
        .collect()
}

/// Characters that are path separators, shell-hazardous, or illegal on
/// Windows (NTFS rejects `< > : " | ? *`; `;` and `!` are kept out for
/// shell safety, matching the export tooling this library replaces).
fn is_disallowed(c: char) -> bool {
    matches!(
        c,
        ';' | ':' | '!' | '*' | '/' | '\\' | '<' | '>' | '"' | '|' | '?'
    ) || c.is_control()
}

/// Whether the filename stem (the part before the first dot) collides with a
/// Windows reserved device name. `CON.txt` is just as unusable as `CON`.
fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_NAMES.iter().any(|r| stem.eq_ignore_ascii_case(r))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn name_of(path: &Path) -> String {
        path.file_name().unwrap().to_str().unwrap().to_string()
    }

    #[test]
    fn strips_all_disallowed_characters() {
        let out = Path::new("out");
        let path = sanitized_path(out, "069A", "a;b:c!d*e/f\\g<h>i\"j|k?l", Some("txt"));
        let name = name_of(&path);

        for c in [';', ':', '!', '*', '/', '\\', '<', '>', '"', '|', '?'] {
            assert!(!name.contains(c), "sanitized name still contains {c:?}: {name}");
        }
        assert_eq!(name, "069A_a_b_c_d_e_f_g_h_i_j_k_l.txt");
    }

    #[test]
    fn control_characters_are_replaced() {
        let path = sanitized_path(Path::new("out"), "069A", "tab\there\nnewline", None);
        let name = name_of(&path);
        assert!(!name.chars().any(char::is_control));
    }

    #[test]
    fn output_is_never_empty() {
        // A title of nothing but disallowed characters still yields a name
        let path = sanitized_path(Path::new("out"), "069A", ";;;", Some("pdf"));
        assert_eq!(name_of(&path), "069A____.pdf");

        let path = sanitized_path(Path::new("out"), "069A", "", None);
        assert_eq!(name_of(&path), "069A_file");
    }

    #[test]
    fn distinct_file_ids_never_collide() {
        let out = Path::new("out");
        let a = sanitized_path(out, "069xx0000000001AAA", "Invoice", Some("pdf"));
        let b = sanitized_path(out, "069xx0000000002AAA", "Invoice", Some("pdf"));
        assert_ne!(a, b);
    }

    #[test]
    fn reserved_device_names_are_escaped() {
        // Without an id prefix the stem would collide with a device name
        let path = sanitized_path(Path::new("out"), "", "CON", Some("txt"));
        assert_eq!(name_of(&path), "_CON.txt");

        let path = sanitized_path(Path::new("out"), "", "lpt1", None);
        assert_eq!(name_of(&path), "_lpt1");

        // The id prefix already avoids the collision, so no escape needed
        let path = sanitized_path(Path::new("out"), "069A", "CON", Some("txt"));
        assert_eq!(name_of(&path), "069A_CON.txt");
    }

    #[test]
    fn extension_is_sanitized_and_optional() {
        let path = sanitized_path(Path::new("out"), "069A", "notes", Some("t;xt"));
        assert_eq!(name_of(&path), "069A_notes.t_xt");

        let path = sanitized_path(Path::new("out"), "069A", "notes", None);
        assert_eq!(name_of(&path), "069A_notes");

        // An extension that sanitizes to nothing is treated as absent
        let path = sanitized_path(Path::new("out"), "069A", "notes", Some("  "));
        assert_eq!(name_of(&path), "069A_notes");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let path = sanitized_path(Path::new("out"), "069A", "  padded  ", Some("pdf"));
        assert_eq!(name_of(&path), "069A_padded.pdf");
    }

    #[test]
    fn path_is_rooted_in_output_dir() {
        let path = sanitized_path(Path::new("/data/export"), "069A", "report", Some("pdf"));
        assert_eq!(path, Path::new("/data/export/069A_report.pdf"));
    }
}
