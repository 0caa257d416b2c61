//! Scheme to filesystem dispatch table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use objfs_stream::{ReadStream, WriteStream};
use tracing::info;

use crate::address::ObjectUrl;
use crate::error::{FsError, FsResult};
use crate::filesystem::{FileSystem, WatchCallback, WatchHandle};

/// Maps URL schemes to the [`FileSystem`] serving them.
///
/// Applications normally create one registry at startup and share it.
/// Handlers are never removed; registering a scheme again replaces the
/// previous handler.
#[derive(Default)]
pub struct FsRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn FileSystem>>>,
}

impl FsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `scheme` to `fs`, returning the handler it replaced.
    pub fn register(
        &self,
        scheme: &str,
        fs: Arc<dyn FileSystem>,
    ) -> Option<Arc<dyn FileSystem>> {
        let mut handlers = match self.handlers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = handlers.insert(scheme.to_string(), fs);
        info!(scheme, replaced = previous.is_some(), "registered filesystem");
        previous
    }

    /// Handler for `scheme`, if any.
    pub fn get(&self, scheme: &str) -> Option<Arc<dyn FileSystem>> {
        let handlers = match self.handlers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        handlers.get(scheme).cloned()
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<String> {
        let handlers = match self.handlers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut schemes: Vec<String> = handlers.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Parse `url` and find the handler for its scheme.
    pub fn resolve(&self, url: &str) -> FsResult<(Arc<dyn FileSystem>, ObjectUrl)> {
        let url = ObjectUrl::parse(url)?;
        let fs = self
            .get(url.scheme())
            .ok_or_else(|| FsError::UnknownScheme(url.scheme().to_string()))?;
        Ok((fs, url))
    }

    pub fn open_reader(&self, url: &str) -> FsResult<Box<dyn ReadStream>> {
        let (fs, url) = self.resolve(url)?;
        fs.open_reader(&url)
    }

    pub fn open_writer(&self, url: &str) -> FsResult<Box<dyn WriteStream>> {
        let (fs, url) = self.resolve(url)?;
        fs.open_writer(&url)
    }

    pub fn open_appender(&self, url: &str) -> FsResult<Box<dyn WriteStream>> {
        let (fs, url) = self.resolve(url)?;
        fs.open_appender(&url)
    }

    pub fn list_entries(&self, url: &str) -> FsResult<Vec<String>> {
        let (fs, url) = self.resolve(url)?;
        fs.list_entries(&url)
    }

    pub fn remove(&self, url: &str) -> FsResult<()> {
        let (fs, url) = self.resolve(url)?;
        fs.remove(&url)
    }

    pub fn watch_file(&self, url: &str, callback: WatchCallback) -> FsResult<WatchHandle> {
        let (fs, url) = self.resolve(url)?;
        fs.watch_file(&url, callback)
    }

    pub fn size(&self, url: &str) -> FsResult<u64> {
        let (fs, url) = self.resolve(url)?;
        fs.size(&url)
    }
}

impl std::fmt::Debug for FsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}
