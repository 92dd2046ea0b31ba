use thiserror::Error;

/// All the ways the page widgets can fail
///
/// Lower-layer errors keep their own message so whatever reaches the error
/// region reads exactly like the underlying failure.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] folio_api::ApiError),

    #[error("Cache operation failed: {0}")]
    CacheError(#[from] folio_cache::CacheError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required element: {0}")]
    MissingElement(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
