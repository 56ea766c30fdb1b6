use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use log::{debug, info};

use crate::catalog::error::{CatalogError, ValidationError};

/// Directory owned by the deck holding the local files of the catalog.
///
/// Picked files are copied in on add; only files inside the directory are
/// ever served back.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copies a picked file into the library and returns the path of the copy.
    pub fn import(&self, source: &Path) -> Result<PathBuf, CatalogError> {
        let unreadable = || ValidationError::UnreadableFile(source.to_path_buf());
        if !source.is_file() {
            return Err(unreadable().into());
        }
        let name = source.file_name().ok_or_else(unreadable)?.to_string_lossy();

        fs::create_dir_all(&self.root).map_err(|e| CatalogError::Import {
            path: source.to_path_buf(),
            source: e,
        })?;

        let stamp = Utc::now().timestamp_millis();
        let mut target = self.root.join(format!("{stamp}-{name}"));
        let mut attempt = 1;
        while target.exists() {
            target = self.root.join(format!("{stamp}-{attempt}-{name}"));
            attempt += 1;
        }

        fs::copy(source, &target).map_err(|e| CatalogError::Import {
            path: source.to_path_buf(),
            source: e,
        })?;
        info!("imported {} as {}", source.display(), target.display());
        Ok(target)
    }

    /// Canonical form of `path` when it names a file inside the library.
    pub fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let root = fs::canonicalize(&self.root).ok()?;
        let canonical = fs::canonicalize(path).ok()?;
        if canonical.starts_with(&root) && canonical.is_file() {
            Some(canonical)
        } else {
            debug!("{} is outside the media library", path.display());
            None
        }
    }
}
