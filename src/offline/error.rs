use thiserror::Error;

use crate::storage::error::StorageError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("network error: {0}")]
    Network(String),

    #[error("{url} answered with status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
