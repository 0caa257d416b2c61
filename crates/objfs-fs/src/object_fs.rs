//! [`FileSystem`] implementation backed by an object store client.

use objfs_store::{ContextHandle, ObjectClient};
use objfs_stream::{observer, Appender, ReadStream, ReadWriter, SharedObserver, WriteStream};
use tracing::debug;

use crate::address::ObjectUrl;
use crate::cache::PoolContextCache;
use crate::error::{FsError, FsResult};
use crate::filesystem::{FileSystem, WatchCallback, WatchHandle};
use crate::listing::list_children;

/// Serves `scheme://pool/object-id` URLs from a connected client.
///
/// The URL host selects the pool, whose context is opened once and reused.
/// Streams handed out talk to the store directly; this type is not involved
/// in their I/O.
pub struct ObjectFileSystem {
    contexts: PoolContextCache,
    observer: SharedObserver,
}

impl ObjectFileSystem {
    /// Serve URLs through an already connected `client`.
    pub fn new(client: Box<dyn ObjectClient>) -> Self {
        Self {
            contexts: PoolContextCache::new(client),
            observer: observer::no_op(),
        }
    }

    /// Attach `observer` to every stream opened from now on.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Pools with an open context.
    pub fn open_pools(&self) -> Vec<String> {
        self.contexts.pools()
    }

    fn context(&self, url: &ObjectUrl) -> FsResult<ContextHandle> {
        Ok(self.contexts.get(url.pool())?)
    }

    /// A cursor stream over `url`, positioned at 0.
    pub fn read_writer(&self, url: &ObjectUrl) -> FsResult<ReadWriter> {
        let oid = url.require_object_id()?;
        let ctx = self.context(url)?;
        Ok(ReadWriter::new(ctx, oid).with_observer(self.observer.clone()))
    }
}

impl std::fmt::Debug for ObjectFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectFileSystem")
            .field("contexts", &self.contexts)
            .finish_non_exhaustive()
    }
}

impl FileSystem for ObjectFileSystem {
    fn open_reader(&self, url: &ObjectUrl) -> FsResult<Box<dyn ReadStream>> {
        Ok(Box::new(self.read_writer(url)?))
    }

    fn open_writer(&self, url: &ObjectUrl) -> FsResult<Box<dyn WriteStream>> {
        let oid = url.require_object_id()?;
        let ctx = self.context(url)?;
        ctx.truncate(oid, 0)?;
        debug!(pool = url.pool(), oid, "truncated for writing");
        Ok(Box::new(
            ReadWriter::new(ctx, oid).with_observer(self.observer.clone()),
        ))
    }

    fn open_appender(&self, url: &ObjectUrl) -> FsResult<Box<dyn WriteStream>> {
        let oid = url.require_object_id()?;
        let ctx = self.context(url)?;
        Ok(Box::new(
            Appender::new(ctx, oid).with_observer(self.observer.clone()),
        ))
    }

    fn list_entries(&self, url: &ObjectUrl) -> FsResult<Vec<String>> {
        let ctx = self.context(url)?;
        Ok(list_children(ctx.as_ref(), url.object_id())?)
    }

    fn remove(&self, url: &ObjectUrl) -> FsResult<()> {
        let oid = url.require_object_id()?;
        let ctx = self.context(url)?;
        ctx.delete(oid)?;
        debug!(pool = url.pool(), oid, "removed");
        Ok(())
    }

    /// Object stores offer no change notification, so watching always fails.
    fn watch_file(&self, _url: &ObjectUrl, _callback: WatchCallback) -> FsResult<WatchHandle> {
        Err(FsError::Unsupported("watch"))
    }

    fn size(&self, url: &ObjectUrl) -> FsResult<u64> {
        let oid = url.require_object_id()?;
        let ctx = self.context(url)?;
        Ok(ctx.stat(oid)?.size)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use objfs_store::{InMemoryCluster, InMemoryPool};
    use objfs_stream::{IoOp, PoolCounters, Stream, StreamError};

    use super::*;

    fn setup() -> (InMemoryCluster, Arc<InMemoryPool>, ObjectFileSystem) {
        let cluster = InMemoryCluster::new();
        let pool = cluster.create_pool("data").unwrap();
        let fs = ObjectFileSystem::new(Box::new(cluster.connected_client().unwrap()));
        (cluster, pool, fs)
    }

    fn url(path: &str) -> ObjectUrl {
        ObjectUrl::new("store-object", "data", path)
    }

    #[test]
    fn writer_truncates_existing_object() {
        let (_cluster, pool, fs) = setup();
        pool.put("obj", b"old contents").unwrap();
        let mut w = fs.open_writer(&url("obj")).unwrap();
        assert_eq!(pool.get("obj").unwrap().unwrap(), b"");
        w.write(b"new").unwrap();
        assert_eq!(pool.get("obj").unwrap().unwrap(), b"new");
        assert_eq!(w.tell(), 3);
    }

    #[test]
    fn failed_truncate_aborts_open() {
        let (_cluster, pool, fs) = setup();
        pool.set_fail_writes(true);
        assert!(matches!(
            fs.open_writer(&url("obj")),
            Err(FsError::Store(_))
        ));
    }

    #[test]
    fn reader_starts_at_zero() {
        let (_cluster, pool, fs) = setup();
        pool.put("obj", b"abc").unwrap();
        let mut r = fs.open_reader(&url("obj")).unwrap();
        assert_eq!(r.tell(), 0);
        let mut buf = [0u8; 3];
        assert_eq!(r.read(&mut buf).unwrap(), 3);
        assert!(matches!(r.read(&mut buf), Err(StreamError::EndOfStream)));
    }

    #[test]
    fn appender_continues_existing_object() {
        let (_cluster, pool, fs) = setup();
        pool.put("log", b"12").unwrap();
        let mut a = fs.open_appender(&url("log")).unwrap();
        assert_eq!(a.tell(), 2);
        a.write(b"34").unwrap();
        assert_eq!(pool.get("log").unwrap().unwrap(), b"1234");
        assert!(a.seek(0, objfs_stream::Whence::Start).is_err());
    }

    #[test]
    fn list_remove_and_size() {
        let (_cluster, pool, fs) = setup();
        for id in ["dir/a", "dir/b/c", "other"] {
            pool.put(id, b"xy").unwrap();
        }
        assert_eq!(fs.list_entries(&url("dir")).unwrap(), vec!["a", "b"]);
        assert_eq!(fs.list_entries(&url("")).unwrap(), vec!["dir", "other"]);
        assert_eq!(fs.size(&url("other")).unwrap(), 2);

        fs.remove(&url("dir/a")).unwrap();
        assert_eq!(fs.list_entries(&url("dir")).unwrap(), vec!["b"]);
        assert!(fs.remove(&url("dir/a")).unwrap_err().is_not_found());
    }

    #[test]
    fn watch_is_unsupported() {
        let (_cluster, _pool, fs) = setup();
        let result = fs.watch_file(&url("obj"), Box::new(|_: &ObjectUrl| {}));
        assert!(matches!(result, Err(FsError::Unsupported("watch"))));
    }

    #[test]
    fn missing_object_path_is_rejected() {
        let (_cluster, _pool, fs) = setup();
        assert!(matches!(
            fs.open_reader(&url("")),
            Err(FsError::InvalidUrl { .. })
        ));
        assert!(matches!(fs.remove(&url("")), Err(FsError::InvalidUrl { .. })));
    }

    #[test]
    fn contexts_are_reused_across_opens() {
        let (cluster, pool, fs) = setup();
        pool.put("a", b"1").unwrap();
        fs.open_reader(&url("a")).unwrap();
        fs.open_appender(&url("b")).unwrap();
        fs.list_entries(&url("")).unwrap();
        assert_eq!(cluster.contexts_opened(), 1);
        assert_eq!(fs.open_pools(), vec!["data"]);
    }

    #[test]
    fn unknown_pool_error_surfaces() {
        let (_cluster, _pool, fs) = setup();
        let missing = ObjectUrl::new("store-object", "nope", "obj");
        assert!(matches!(
            fs.open_reader(&missing),
            Err(FsError::Store(objfs_store::StoreError::PoolNotFound(_)))
        ));
    }

    #[test]
    fn observer_reaches_streams() {
        let cluster = InMemoryCluster::new();
        cluster.create_pool("data").unwrap();
        let counters = Arc::new(PoolCounters::new());
        let fs = ObjectFileSystem::new(Box::new(cluster.connected_client().unwrap()))
            .with_observer(counters.clone());
        fs.open_writer(&url("obj")).unwrap().write(b"abc").unwrap();
        fs.open_appender(&url("obj")).unwrap().write(b"d").unwrap();
        assert_eq!(counters.get("data", IoOp::Write).bytes, 3);
        assert_eq!(counters.get("data", IoOp::Append).bytes, 1);
    }
}
