use std::{
    collections::VecDeque,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("asset copy failed at {}: {source}", path.display())]
pub struct AssetCopyError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Read-only bundle store. Bundle ids are relative paths under the catalog
/// root (`config`, `engine`, `resources`).
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    root: PathBuf,
}

impl AssetCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn bundle_path(&self, bundle_id: &str) -> PathBuf {
        self.root.join(bundle_id)
    }

    /// Copies every file and subdirectory of the bundle into
    /// `dest_root/<bundle_id>`, creating directories and overwriting existing
    /// files. Partial copies are not rolled back; a retry overwrites cleanly.
    /// Traversal uses an explicit work queue, not recursion.
    pub fn copy_bundle(&self, bundle_id: &str, dest_root: &Path) -> Result<(), AssetCopyError> {
        let source_root = self.bundle_path(bundle_id);
        let dest = dest_root.join(bundle_id);

        let mut queue: VecDeque<(PathBuf, PathBuf)> = VecDeque::new();
        queue.push_back((source_root, dest));

        while let Some((source_dir, dest_dir)) = queue.pop_front() {
            fs::create_dir_all(&dest_dir).map_err(|err| AssetCopyError {
                path: dest_dir.clone(),
                source: err,
            })?;

            let entries = fs::read_dir(&source_dir).map_err(|err| AssetCopyError {
                path: source_dir.clone(),
                source: err,
            })?;

            for entry in entries {
                let entry = entry.map_err(|err| AssetCopyError {
                    path: source_dir.clone(),
                    source: err,
                })?;
                let source_path = entry.path();
                let dest_path = dest_dir.join(entry.file_name());
                let file_type = entry.file_type().map_err(|err| AssetCopyError {
                    path: source_path.clone(),
                    source: err,
                })?;

                if file_type.is_dir() {
                    queue.push_back((source_path, dest_path));
                } else {
                    fs::copy(&source_path, &dest_path).map_err(|err| AssetCopyError {
                        path: source_path.clone(),
                        source: err,
                    })?;
                }
            }
        }

        Ok(())
    }
}
