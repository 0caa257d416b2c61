//! The pluggable filesystem interface that URL schemes are bound to.

use objfs_stream::{ReadStream, WriteStream};

use crate::address::ObjectUrl;
use crate::error::{FsError, FsResult};

/// Callback invoked with the URL of a changed file.
pub type WatchCallback = Box<dyn Fn(&ObjectUrl) + Send + Sync>;

/// Handle to an active watch. Dropping it leaves the watch running;
/// call [`WatchHandle::cancel`] to stop it.
pub struct WatchHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the watch.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// A filesystem implementation for one URL scheme.
///
/// Implementations must be thread-safe; a single instance serves every
/// caller that resolves its scheme.
pub trait FileSystem: Send + Sync {
    /// Open `url` for reading from offset 0.
    fn open_reader(&self, url: &ObjectUrl) -> FsResult<Box<dyn ReadStream>>;

    /// Truncate `url` to zero length and open it for writing from offset 0.
    fn open_writer(&self, url: &ObjectUrl) -> FsResult<Box<dyn WriteStream>>;

    /// Open `url` for appending, creating it on first write if needed.
    fn open_appender(&self, url: &ObjectUrl) -> FsResult<Box<dyn WriteStream>>;

    /// Names of the immediate children of `url`.
    fn list_entries(&self, url: &ObjectUrl) -> FsResult<Vec<String>>;

    /// Delete `url`.
    fn remove(&self, url: &ObjectUrl) -> FsResult<()>;

    /// Call `callback` whenever `url` changes.
    fn watch_file(&self, url: &ObjectUrl, callback: WatchCallback) -> FsResult<WatchHandle>;

    /// Size of `url` in bytes.
    fn size(&self, url: &ObjectUrl) -> FsResult<u64> {
        let _ = url;
        Err(FsError::Unsupported("size"))
    }
}
