/// Errors reported by an object store client.
///
/// Stream adapters and the filesystem facade never interpret these; they are
/// handed back to the caller exactly as the backend produced them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object does not exist in the pool.
    #[error("object not found: {pool}/{oid}")]
    NotFound { pool: String, oid: String },

    /// The pool does not exist in the connected cluster.
    #[error("pool not found: {0}")]
    PoolNotFound(String),

    /// The connected identity is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A cluster, user, pool or object name was rejected by the backend.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// An operation that needs a live connection was issued before `connect`.
    #[error("client is not connected")]
    NotConnected,

    /// Client configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` if the error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
