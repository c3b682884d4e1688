//! JSON output helpers
//!
//! `config.json` is written with a six-space indent and replaced atomically:
//! the bytes go to a temporary file in the destination directory, which is
//! then renamed over the target. A failed run leaves any previous file
//! untouched and no temporary file behind.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::error::{PipelineError, Result};

pub const INDENT: &[u8] = b"      ";

/// Serialize with the six-space indent used for `config.json`
pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Replace `path` with `bytes` via temp file + rename
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| PipelineError::io(dir, e))?;
    file.write_all(bytes)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| PipelineError::io(file.path(), e))?;

    file.persist(path)
        .map_err(|e| PipelineError::io(path, e.error))?;

    Ok(())
}

/// Serialize and write atomically
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = to_pretty_json(value).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;

    #[test]
    fn test_six_space_indent() {
        let mut map = BTreeMap::new();
        map.insert("depreciation", 3.5);
        let bytes = to_pretty_json(&map).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "{\n      \"depreciation\": 3.5\n}");
    }

    #[test]
    fn test_write_atomic_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        // Only the target remains
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomic_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("config.json");
        assert!(matches!(write_atomic(&path, b"{}"), Err(PipelineError::Io { .. })));
        assert!(!path.exists());
    }
}
