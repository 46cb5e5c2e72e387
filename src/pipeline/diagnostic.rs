//! Pipeline diagnostic dump: writes intermediate artifacts to disk.
//!
//! Disabled unless a dump directory is configured (`LEASE_INGEST_DUMP_DIR`).
//! Every writer logs and swallows its own failures; a dump never fails the pipeline.
//!
//! **Output structure**:
//! ```text
//! {dump_dir}/{document_id}/
//!   00-source-info.json
//!   01-page-1.png
//!   02-recognition.json
//!   03-quality.json
//!   04-record.json
//! ```

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Returns the dump directory for a document, or `None` if dumps are disabled.
///
/// Creates the directory tree. Returns `None` (with a warning) if that fails.
pub fn dump_dir_for(base: Option<&Path>, document_id: &Uuid) -> Option<PathBuf> {
    let dir = base?.join(document_id.to_string());

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            path = %dir.display(),
            error = %e,
            "Diagnostic dump: failed to create directory"
        );
        return None;
    }

    Some(dir)
}

/// Write a binary artifact (page image).
pub fn dump_binary(dir: &Path, filename: &str, data: &[u8]) {
    let path = dir.join(filename);
    match std::fs::write(&path, data) {
        Ok(()) => tracing::debug!(
            path = %path.display(),
            size = data.len(),
            "Diagnostic dump: binary written"
        ),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to write binary"
        ),
    }
}

/// Write a pretty-printed JSON artifact.
pub fn dump_json<T: serde::Serialize>(dir: &Path, filename: &str, value: &T) {
    let path = dir.join(filename);
    let json = match serde_json::to_string_pretty(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Diagnostic dump: failed to serialize JSON"
            );
            return;
        }
    };
    dump_binary(dir, filename, json.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_base() {
        assert!(dump_dir_for(None, &Uuid::new_v4()).is_none());
    }

    #[test]
    fn creates_per_document_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let dir = dump_dir_for(Some(tmp.path()), &id).unwrap();
        assert!(dir.exists());
        assert!(dir.ends_with(id.to_string()));
    }

    #[test]
    fn unwritable_base_disables_dump() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        assert!(dump_dir_for(Some(&file), &Uuid::new_v4()).is_none());
    }

    #[test]
    fn json_is_pretty_printed() {
        let tmp = tempfile::tempdir().unwrap();
        dump_json(tmp.path(), "info.json", &serde_json::json!({"pages": 2}));
        let written = std::fs::read_to_string(tmp.path().join("info.json")).unwrap();
        assert!(written.contains("\n"));
        assert!(written.contains("\"pages\": 2"));
    }

    #[test]
    fn write_failure_does_not_panic() {
        dump_binary(Path::new("/nonexistent/lease-ingest"), "x.png", b"data");
    }
}
