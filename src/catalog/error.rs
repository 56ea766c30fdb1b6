use std::path::PathBuf;

use thiserror::Error;

use crate::storage::error::StorageError;

/// Rejected "add song" input. The catalog is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("song title is required")]
    MissingTitle,

    #[error("an audio file is required")]
    MissingAudio,

    #[error("cannot read file {}", .0.to_string_lossy())]
    UnreadableFile(PathBuf),

    #[error("invalid resource url {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to persist catalog: {0}")]
    Storage(#[from] StorageError),

    #[error("no track id is left to assign")]
    IdsExhausted,

    #[error("failed to import {} into the media library: {source}", .path.to_string_lossy())]
    Import {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
