use std::path::Path;
use std::sync::Arc;

use crate::error::StoreResult;

/// Size information returned by [`PoolContext::stat`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectStat {
    /// Current length of the object in bytes.
    pub size: u64,
}

/// Iterator over every object name in a pool.
///
/// Items are fallible: a backend may fail part way through a scan.
pub type ObjectNames<'a> = Box<dyn Iterator<Item = StoreResult<String>> + Send + 'a>;

/// Shared handle to an open pool context.
///
/// Contexts are cheap to clone and outlive any stream built on top of them.
pub type ContextHandle = Arc<dyn PoolContext>;

/// Operations against the objects of a single pool.
///
/// Object ids are opaque strings in a flat namespace. A `/` inside an id is
/// just another byte; any hierarchy is imposed by callers.
///
/// Implementations must be `Send + Sync`: one context is shared by every
/// stream that touches the pool.
pub trait PoolContext: Send + Sync {
    /// Name of the pool this context is bound to.
    fn pool_name(&self) -> &str;

    /// Read up to `buf.len()` bytes of `oid` starting at `offset`.
    ///
    /// Returns the number of bytes copied. Reading at or past the end of the
    /// object returns `Ok(0)`.
    fn read(&self, oid: &str, buf: &mut [u8], offset: u64) -> StoreResult<usize>;

    /// Write all of `data` into `oid` at `offset`, creating the object if
    /// needed. Bytes beyond the current end are zero-filled.
    fn write(&self, oid: &str, data: &[u8], offset: u64) -> StoreResult<()>;

    /// Append all of `data` to the end of `oid` as a single unit.
    ///
    /// Concurrent appends from different callers never interleave within a
    /// call, but their relative order is unspecified.
    fn append(&self, oid: &str, data: &[u8]) -> StoreResult<()>;

    /// Set the length of `oid` to `size`, creating it if absent.
    fn truncate(&self, oid: &str, size: u64) -> StoreResult<()>;

    /// Query the current size of `oid`.
    fn stat(&self, oid: &str) -> StoreResult<ObjectStat>;

    /// Delete `oid`.
    fn delete(&self, oid: &str) -> StoreResult<()>;

    /// Iterate the names of all objects in the pool, in no particular order.
    fn object_names(&self) -> StoreResult<ObjectNames<'_>>;
}

/// A client bound to one storage cluster.
///
/// The lifecycle mirrors a typical cluster client: construct (see
/// [`ClientFactory`]), load configuration, `connect`, then open pool
/// contexts for I/O.
pub trait ObjectClient: Send + Sync {
    /// Load client settings from an explicit configuration file.
    fn read_config_file(&mut self, path: &Path) -> StoreResult<()>;

    /// Load client settings from the platform default location.
    fn read_default_config_file(&mut self) -> StoreResult<()>;

    /// Apply overrides from the process environment.
    fn parse_config_env(&mut self) -> StoreResult<()>;

    /// Apply overrides given as command-line style arguments.
    fn parse_config_args(&mut self, args: &[String]) -> StoreResult<()>;

    /// Establish the connection to the cluster.
    fn connect(&mut self) -> StoreResult<()>;

    /// Open an I/O context scoped to `pool`.
    fn open_context(&self, pool: &str) -> StoreResult<ContextHandle>;
}

/// Constructs clients for a `(cluster, user)` combination.
///
/// `None` selects the backend's default cluster or identity.
pub trait ClientFactory {
    type Client: ObjectClient + 'static;

    fn create(&self, cluster: Option<&str>, user: Option<&str>) -> StoreResult<Self::Client>;
}

/// Validate a cluster, user or pool name: a single non-empty path segment.
pub fn validate_segment_name(name: &str) -> StoreResult<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if name.contains('/') || name.contains('\\') {
        Some("name contains a path separator")
    } else if name.chars().any(char::is_control) {
        Some("name contains control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(crate::StoreError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
