//! JSON file link store
//!
//! File Format:
//! ```json
//! { "links": [ { "channels": ["!a:example.org", "!b:example.org"] } ] }
//! ```

use super::LinkStore;
use crate::registry::error::RegistryError;
use crate::registry::link::LinkDocument;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Link store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write file atomically (write to temp, then rename)
    fn write_atomic(&self, data: &[u8]) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, data)?;
        fs::rename(temp_path, &self.path)?;
        Ok(())
    }
}

impl LinkStore for JsonFileStore {
    fn load(&self) -> Result<Option<LinkDocument>, RegistryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No link store on disk");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let document = serde_json::from_str(&contents)
            .map_err(|e| RegistryError::Malformed(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(document))
    }

    fn save(&self, document: &LinkDocument) -> Result<(), RegistryError> {
        let data = serde_json::to_vec(document)
            .map_err(|e| RegistryError::Serialize(e.to_string()))?;
        self.write_atomic(&data)?;
        debug!(path = %self.path.display(), groups = document.links.len(), "Link store saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::link::LinkGroup;
    use crate::types::RoomId;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let store = JsonFileStore::new(&path);

        let doc = LinkDocument {
            links: vec![LinkGroup::new(RoomId::from("A"), RoomId::from("B"))],
        };
        store.save(&doc).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(store.load().unwrap(), Some(doc));
    }

    #[test]
    fn test_reads_plain_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"links": [{"channels": ["A", "B", "C"]}]}"#).unwrap();

        let doc = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(doc.links.len(), 1);
        assert_eq!(doc.links[0].len(), 3);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"links": [{"rooms": 3}]}"#).unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, RegistryError::Malformed(_)));
    }
}
