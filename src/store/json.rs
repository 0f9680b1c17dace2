//! JSON record store
//!
//! Collections live as pretty-printed JSON documents under one results
//! directory, one file per [`DatasetKey`].

use crate::dataset::{DatasetKey, RecordDocument};
use crate::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed store of record documents
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the document for `key`
    pub fn path_for(&self, key: &DatasetKey) -> PathBuf {
        self.root.join(format!("{}.json", key.file_stem()))
    }

    /// Whether a stage already wrote its output, used to skip reruns
    pub fn exists(&self, key: &DatasetKey) -> bool {
        self.path_for(key).is_file()
    }

    pub fn load(&self, key: &DatasetKey) -> StoreResult<RecordDocument> {
        read_json(&self.path_for(key))
    }

    pub fn save(&self, key: &DatasetKey, document: &RecordDocument) -> StoreResult<()> {
        let path = self.path_for(key);
        write_json(&path, document)?;
        tracing::debug!(path = %path.display(), items = document.len(), "Saved collection");
        Ok(())
    }
}

/// Reads and deserializes a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Serializes `value` as pretty JSON and replaces `path` with it
///
/// The document is written next to the target first and then renamed, so
/// an interrupted write never leaves a truncated file behind.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let io_err = |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.display().to_string(),
        source,
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, content).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
