use std::io;

use objfs_store::StoreError;

/// Errors from stream operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Failure reported by the store, passed through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A read returned no bytes and no error.
    ///
    /// This is a heuristic: an empty response from the store is taken to
    /// mean the cursor is at the end of the object.
    #[error("end of stream")]
    EndOfStream,

    /// A read returned no bytes although the object extends past the cursor.
    ///
    /// Only reported by streams that confirm end-of-stream with a size query.
    #[error("empty read at offset {pos} of {oid:?} (size {size})")]
    ShortRead { oid: String, pos: i64, size: u64 },

    /// A seek target fell outside `[0, size]`.
    #[error("seek target {target} outside of object {oid:?} (size {size})")]
    InvalidArgument { oid: String, target: i128, size: u64 },

    /// The stream does not support the requested operation.
    #[error("unsupported operation: {operation}")]
    Unsupported { operation: &'static str },
}

impl StreamError {
    /// Returns `true` for the end-of-stream signal.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::EndOfStream => io::ErrorKind::UnexpectedEof,
            StreamError::ShortRead { .. } => io::ErrorKind::Other,
            StreamError::InvalidArgument { .. } => io::ErrorKind::InvalidInput,
            StreamError::Unsupported { .. } => io::ErrorKind::Unsupported,
            StreamError::Store(StoreError::Io(e)) => e.kind(),
            StreamError::Store(StoreError::NotFound { .. }) => io::ErrorKind::NotFound,
            StreamError::Store(StoreError::PermissionDenied(_)) => io::ErrorKind::PermissionDenied,
            StreamError::Store(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// Result alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
