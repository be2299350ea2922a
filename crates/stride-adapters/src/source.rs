//! Reading and writing source files for one-shot predictions.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use stride_core::Buffer;
use tracing::debug;

/// Read `path` into a buffer, inferring the language from its extension.
pub fn load_source(path: &Path, max_bytes: u64) -> Result<Buffer> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    if size > max_bytes {
        bail!(
            "{} is {} bytes, above the {} byte limit (max_file_bytes)",
            path.display(),
            size,
            max_bytes
        );
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} as UTF-8", path.display()))?;
    let buffer = Buffer::from_path(path, text);
    debug!(
        path = %path.display(),
        language = buffer.language().name(),
        bytes = size,
        "loaded source"
    );
    Ok(buffer)
}

/// Replace the contents of `path` via a sibling temp file and rename.
pub fn write_source(path: &Path, text: &str) -> Result<()> {
    let tmp_path = path.with_extension("stride-tmp");
    fs::write(&tmp_path, text)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::Language;

    #[test]
    fn test_load_detects_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        fs::write(&path, "x = 1\n").unwrap();

        let buffer = load_source(&path, 1024).unwrap();
        assert_eq!(buffer.language(), Language::Python);
        assert_eq!(buffer.text(), "x = 1\n");
        assert_eq!(buffer.path(), Some(path.as_path()));
    }

    #[test]
    fn test_load_refuses_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.ts");
        fs::write(&path, "a".repeat(64)).unwrap();

        let err = load_source(&path, 16).unwrap_err();
        assert!(err.to_string().contains("byte limit"));
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_source(&dir.path().join("nope.rs"), 1024).unwrap_err();
        assert!(err.to_string().contains("nope.rs"));
    }

    #[test]
    fn test_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        fs::write(&path, "old").unwrap();

        write_source(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!path.with_extension("stride-tmp").exists());
    }
}
