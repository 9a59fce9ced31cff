//! Durable artifact store.
//!
//! One JSON document holds every medicine. Writes replace the whole file via
//! a temporary sibling and a rename, so a reader sees either the old document
//! or the new one, never a partial write.

mod document;

pub use document::*;

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact document {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// File-backed owner of the artifact document.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; a missing or blank file is an empty document.
    pub fn load(&self) -> StoreResult<Document> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No artifact document yet, starting empty");
                return Ok(Document::empty());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(Document::empty());
        }

        let document = Document::from_json(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        debug!(
            path = %self.path.display(),
            medicines = document.medicines.len(),
            units = document.unit_count(),
            "Loaded artifact document"
        );
        Ok(document)
    }

    /// Replace the stored document with `document`.
    pub fn save(&self, document: &Document) -> StoreResult<()> {
        let mut json = document.to_json_pretty()?;
        json.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path).map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(
            path = %self.path.display(),
            medicines = document.medicines.len(),
            "Saved artifact document"
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LedgerId, MedicineBatch};
    use std::collections::BTreeMap;

    fn make_batch(id: &str) -> MedicineBatch {
        let mut unit_assets = BTreeMap::new();
        unit_assets.insert("U001".to_string(), LedgerId::Numeric(1001));
        MedicineBatch {
            medicine_id: id.to_string(),
            medicine_name: "Amoxy 500".into(),
            batch_number: "B2025-09-16".into(),
            batch_asset_id: LedgerId::Numeric(1000),
            total_units: 1000,
            expiry_date: "2027-08".into(),
            created_at: "2025-09-16T10:00:00+00:00".into(),
            unit_assets,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts.json"));
        let doc = store.load().unwrap();
        assert!(doc.medicines.is_empty());
    }

    #[test]
    fn test_blank_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts.json");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(ArtifactStore::new(&path).load().unwrap(), Document::empty());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts.json");
        fs::write(&path, "{\"medicines\": {\"x\": ").unwrap();
        let err = ArtifactStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested/state/artifacts.json"));

        let mut doc = Document::empty();
        assert!(doc.insert_new(make_batch("Amoxy 500_B2025-09-16_20250916")));
        store.save(&doc).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, doc);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_save_of_load_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts.json"));

        let mut doc = Document::empty();
        doc.insert_new(make_batch("A_B1_20250916"));
        doc.insert_new(make_batch("C_B2_20250916"));
        store.save(&doc).unwrap();
        let first = fs::read(store.path()).unwrap();

        store.save(&store.load().unwrap()).unwrap();
        let second = fs::read(store.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_replaces_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts.json"));

        let mut doc = Document::empty();
        doc.insert_new(make_batch("A_B1_20250916"));
        store.save(&doc).unwrap();

        store.save(&Document::empty()).unwrap();
        assert!(store.load().unwrap().medicines.is_empty());
    }
}
