use objfs_store::StoreError;
use objfs_stream::StreamError;
use thiserror::Error;

/// Errors from filesystem facade operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// Failure reported by the store, passed through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Failure reported by a stream.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// The URL could not be parsed or lacks a required part.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No filesystem is registered for the URL's scheme.
    #[error("no filesystem registered for scheme {0:?}")]
    UnknownScheme(String),

    /// The filesystem does not support the operation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Facade configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A fatal step of client initialization failed.
    #[error("{context}: {source}")]
    Init {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl FsError {
    /// Returns `true` if the error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(e) | Self::Stream(StreamError::Store(e)) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Result alias for facade operations.
pub type FsResult<T> = Result<T, FsError>;
