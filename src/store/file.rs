//! JSON snapshot store on the local file system.
//!
//! Each collection lives in one JSON file mapping document ids to field maps:
//!
//! ```text
//! <root>/remisiones.json                      live collection
//! <root>/remisiones_backup_20261019T101500.json
//! <root>/remisiones/X1/historial.json         sub-collection of document X1
//! ```
//!
//! A batch rewrites the whole collection file: the new image is written to a
//! temporary file next to the target and renamed over it, so a batch is either
//! fully visible or not at all.

use super::{
    apply_batch, commit_timestamp, subcollection_path, CollectionImage, Document, DocumentStore,
    Write,
};
use crate::errors::StoreError;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a snapshot rooted at an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::io(
                &root,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "store root is not a directory",
                ),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding a collection, after checking every path segment.
    fn collection_file(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let segments: Vec<&str> = collection.split('/').collect();
        if segments.iter().any(|s| !is_valid_segment(s)) {
            return Err(StoreError::InvalidPath(collection.to_string()));
        }

        let (file, parents) = segments
            .split_last()
            .ok_or_else(|| StoreError::InvalidPath(collection.to_string()))?;
        let mut path = self.root.clone();
        for segment in parents {
            path.push(segment);
        }
        path.push(format!("{file}.json"));
        Ok(path)
    }

    fn load(&self, path: &Path) -> Result<CollectionImage, StoreError> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CollectionImage::new()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn save(&self, path: &Path, image: &CollectionImage) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let data = serde_json::to_string_pretty(image).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, data).map_err(|e| StoreError::io(&temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StoreError::io(path, e)
        })
    }

    fn commit(&self, collection: &str, writes: &[Write]) -> Result<(), StoreError> {
        let path = self.collection_file(collection)?;
        let mut image = self.load(&path)?;

        apply_batch(&mut image, writes, &commit_timestamp()).map_err(|message| {
            StoreError::Rejected {
                collection: collection.to_string(),
                message,
            }
        })?;

        self.save(&path, &image)?;
        log::debug!(
            "Committed {} write(s) to {}",
            writes.len(),
            path.display()
        );
        Ok(())
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['\\', '\0'])
}

impl DocumentStore for FileStore {
    fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let path = self.collection_file(collection)?;
        let image = self.load(&path).map_err(|e| StoreError::Read {
            collection: collection.to_string(),
            message: e.to_string(),
        })?;

        Ok(image
            .into_iter()
            .map(|(id, fields)| Document::new(id, fields))
            .collect())
    }

    fn batch_write(&self, collection: &str, writes: &[Write]) -> Result<(), StoreError> {
        self.commit(collection, writes)
    }

    fn subcollection_batch_write(
        &self,
        parent_collection: &str,
        parent_id: &str,
        subcollection: &str,
        writes: &[Write],
    ) -> Result<(), StoreError> {
        self.commit(
            &subcollection_path(parent_collection, parent_id, subcollection),
            writes,
        )
    }
}
