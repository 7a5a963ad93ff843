//! Small JSON file persistence helpers shared by the preference and template
//! stores.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Read and decode a JSON file. A missing file yields `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Pretty-print `value` and move it into place atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    // Write to a sibling first so a crash never leaves a truncated file.
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestTempDir;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TestTempDir::new("persist-missing");
        let value: Option<BTreeMap<String, u32>> = read_json(&dir.child("nope.json")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn write_creates_parents_and_leaves_no_temp_file() {
        let dir = TestTempDir::new("persist-write");
        let path = dir.child("nested/state.json");
        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1u32);
        write_json_atomic(&path, &value).unwrap();

        let back: Option<BTreeMap<String, u32>> = read_json(&path).unwrap();
        assert_eq!(back, Some(value));
        assert!(!dir.child("nested/state.json.tmp").exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TestTempDir::new("persist-bad");
        let path = dir.write_text("bad.json", "{ not json");
        let err = read_json::<BTreeMap<String, u32>>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }
}
