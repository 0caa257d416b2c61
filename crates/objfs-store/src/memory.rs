//! In-memory cluster for tests and embedding.
//!
//! [`InMemoryCluster`] holds named pools of byte objects behind `RwLock`s.
//! Clients created from it share the same data, so several "processes" can
//! be simulated in one test. Every pool and the cluster itself carry fault
//! switches so error paths can be exercised deterministically.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::settings::{ClientSettings, DEFAULT_CLUSTER, DEFAULT_USER};
use crate::traits::{
    validate_segment_name, ClientFactory, ContextHandle, ObjectClient, ObjectNames, ObjectStat,
    PoolContext,
};

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(format!("lock poisoned: {e}"))
}

fn injected(what: &str) -> StoreError {
    StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("injected {what} failure"),
    ))
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// A pool of objects held in memory.
#[derive(Debug)]
pub struct InMemoryPool {
    name: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_stat: AtomicBool,
    fail_listing_after: Mutex<Option<usize>>,
}

impl InMemoryPool {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            objects: RwLock::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_stat: AtomicBool::new(false),
            fail_listing_after: Mutex::new(None),
        }
    }

    /// Pool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `data` under `oid`, replacing any previous content.
    pub fn put(&self, oid: &str, data: &[u8]) -> StoreResult<()> {
        let mut map = self.objects.write().map_err(poisoned)?;
        map.insert(oid.to_string(), data.to_vec());
        Ok(())
    }

    /// Copy of the content stored under `oid`.
    pub fn get(&self, oid: &str) -> StoreResult<Option<Vec<u8>>> {
        let map = self.objects.read().map_err(poisoned)?;
        Ok(map.get(oid).cloned())
    }

    /// Number of objects in the pool.
    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the pool holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every read fail until cleared.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write, append and truncate fail until cleared.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every stat fail until cleared.
    pub fn set_fail_stat(&self, fail: bool) {
        self.fail_stat.store(fail, Ordering::SeqCst);
    }

    /// Make name iteration fail after yielding `count` names.
    pub fn set_fail_listing_after(&self, count: Option<usize>) {
        if let Ok(mut slot) = self.fail_listing_after.lock() {
            *slot = count;
        }
    }

    fn not_found(&self, oid: &str) -> StoreError {
        StoreError::NotFound {
            pool: self.name.clone(),
            oid: oid.to_string(),
        }
    }

    fn check_writes(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected("write"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// A context handle onto an [`InMemoryPool`].
///
/// Each `open_context` call yields a distinct handle over the same pool data.
#[derive(Debug)]
pub struct InMemoryContext {
    pool: Arc<InMemoryPool>,
}

impl PoolContext for InMemoryContext {
    fn pool_name(&self) -> &str {
        &self.pool.name
    }

    fn read(&self, oid: &str, buf: &mut [u8], offset: u64) -> StoreResult<usize> {
        if self.pool.fail_reads.load(Ordering::SeqCst) {
            return Err(injected("read"));
        }
        let map = self.pool.objects.read().map_err(poisoned)?;
        let data = map.get(oid).ok_or_else(|| self.pool.not_found(oid))?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        if start >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write(&self, oid: &str, data: &[u8], offset: u64) -> StoreResult<()> {
        self.pool.check_writes()?;
        let start = usize::try_from(offset)
            .map_err(|_| StoreError::Backend(format!("offset {offset} out of range")))?;
        let mut map = self.pool.objects.write().map_err(poisoned)?;
        let object = map.entry(oid.to_string()).or_default();
        let end = start + data.len();
        if object.len() < end {
            object.resize(end, 0);
        }
        object[start..end].copy_from_slice(data);
        Ok(())
    }

    fn append(&self, oid: &str, data: &[u8]) -> StoreResult<()> {
        self.pool.check_writes()?;
        let mut map = self.pool.objects.write().map_err(poisoned)?;
        map.entry(oid.to_string()).or_default().extend_from_slice(data);
        Ok(())
    }

    fn truncate(&self, oid: &str, size: u64) -> StoreResult<()> {
        self.pool.check_writes()?;
        let size = usize::try_from(size)
            .map_err(|_| StoreError::Backend(format!("size {size} out of range")))?;
        let mut map = self.pool.objects.write().map_err(poisoned)?;
        map.entry(oid.to_string()).or_default().resize(size, 0);
        Ok(())
    }

    fn stat(&self, oid: &str) -> StoreResult<ObjectStat> {
        if self.pool.fail_stat.load(Ordering::SeqCst) {
            return Err(injected("stat"));
        }
        let map = self.pool.objects.read().map_err(poisoned)?;
        map.get(oid)
            .map(|data| ObjectStat {
                size: data.len() as u64,
            })
            .ok_or_else(|| self.pool.not_found(oid))
    }

    fn delete(&self, oid: &str) -> StoreResult<()> {
        self.pool.check_writes()?;
        let mut map = self.pool.objects.write().map_err(poisoned)?;
        map.remove(oid)
            .map(|_| ())
            .ok_or_else(|| self.pool.not_found(oid))
    }

    fn object_names(&self) -> StoreResult<ObjectNames<'_>> {
        // Snapshot the names so the lock is not held across iteration.
        let names: Vec<String> = self
            .pool
            .objects
            .read()
            .map_err(poisoned)?
            .keys()
            .cloned()
            .collect();
        let fail_after = *self.pool.fail_listing_after.lock().map_err(poisoned)?;
        let iter = names.into_iter().enumerate().map(move |(i, name)| match fail_after {
            Some(limit) if i >= limit => Err(injected("listing")),
            _ => Ok(name),
        });
        Ok(Box::new(iter))
    }
}

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ClusterState {
    name: String,
    users: Vec<String>,
    pools: RwLock<HashMap<String, Arc<InMemoryPool>>>,
    contexts_opened: AtomicUsize,
    fail_next_opens: AtomicUsize,
    fail_connect: AtomicBool,
}

/// A named in-memory cluster. Cloning yields another handle to the same data.
#[derive(Clone, Debug)]
pub struct InMemoryCluster {
    inner: Arc<ClusterState>,
}

impl InMemoryCluster {
    /// Create an empty cluster with the default name and no user restrictions.
    pub fn new() -> Self {
        Self::with_name(DEFAULT_CLUSTER)
    }

    /// Create an empty cluster with the given name.
    pub fn with_name(name: &str) -> Self {
        Self::build(name, Vec::new())
    }

    /// Create an empty cluster that only admits the listed identities.
    pub fn with_users(name: &str, users: &[&str]) -> Self {
        Self::build(name, users.iter().map(|u| u.to_string()).collect())
    }

    fn build(name: &str, users: Vec<String>) -> Self {
        Self {
            inner: Arc::new(ClusterState {
                name: name.to_string(),
                users,
                pools: RwLock::new(HashMap::new()),
                contexts_opened: AtomicUsize::new(0),
                fail_next_opens: AtomicUsize::new(0),
                fail_connect: AtomicBool::new(false),
            }),
        }
    }

    /// Cluster name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Create a pool (or return the existing one with that name).
    pub fn create_pool(&self, name: &str) -> StoreResult<Arc<InMemoryPool>> {
        validate_segment_name(name)?;
        let mut pools = self.inner.pools.write().map_err(poisoned)?;
        Ok(Arc::clone(
            pools
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(InMemoryPool::new(name))),
        ))
    }

    /// Look up an existing pool.
    pub fn pool(&self, name: &str) -> Option<Arc<InMemoryPool>> {
        self.inner.pools.read().ok()?.get(name).cloned()
    }

    /// Total number of contexts handed out by `open_context` so far.
    pub fn contexts_opened(&self) -> usize {
        self.inner.contexts_opened.load(Ordering::SeqCst)
    }

    /// Make the next `count` context opens fail.
    pub fn fail_next_opens(&self, count: usize) {
        self.inner.fail_next_opens.store(count, Ordering::SeqCst);
    }

    /// Make `connect` fail until cleared.
    pub fn set_fail_connect(&self, fail: bool) {
        self.inner.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// A client for this cluster that is already connected as the default user.
    pub fn connected_client(&self) -> StoreResult<InMemoryClient> {
        let mut client = self.create(None, None)?;
        client.connect()?;
        Ok(client)
    }
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory for InMemoryCluster {
    type Client = InMemoryClient;

    fn create(&self, cluster: Option<&str>, user: Option<&str>) -> StoreResult<InMemoryClient> {
        if let Some(requested) = cluster {
            validate_segment_name(requested)?;
            if requested != self.inner.name {
                return Err(StoreError::Config(format!("unknown cluster {requested:?}")));
            }
        }
        let user = user.unwrap_or(DEFAULT_USER);
        validate_segment_name(user)?;
        Ok(InMemoryClient {
            cluster: self.clone(),
            user: user.to_string(),
            connected: false,
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client handle onto an [`InMemoryCluster`].
#[derive(Debug)]
pub struct InMemoryClient {
    cluster: InMemoryCluster,
    user: String,
    connected: bool,
}

impl InMemoryClient {
    /// Identity this client authenticates as.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns `true` once `connect` has succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl ObjectClient for InMemoryClient {
    fn read_config_file(&mut self, path: &Path) -> StoreResult<()> {
        // Only validates the file; the in-memory backend has nothing to apply.
        ClientSettings::load(path).map(|_| ())
    }

    fn read_default_config_file(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn parse_config_env(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn parse_config_args(&mut self, args: &[String]) -> StoreResult<()> {
        match args.first() {
            None => Ok(()),
            Some(arg) => Err(StoreError::Config(format!(
                "unrecognized argument {arg:?}: the in-memory backend takes no arguments"
            ))),
        }
    }

    fn connect(&mut self) -> StoreResult<()> {
        let state = &self.cluster.inner;
        if state.fail_connect.load(Ordering::SeqCst) {
            return Err(injected("connect"));
        }
        if !state.users.is_empty() && !state.users.iter().any(|u| *u == self.user) {
            return Err(StoreError::PermissionDenied(format!(
                "user {:?} may not connect to cluster {:?}",
                self.user, state.name
            )));
        }
        self.connected = true;
        Ok(())
    }

    fn open_context(&self, pool: &str) -> StoreResult<ContextHandle> {
        if !self.connected {
            return Err(StoreError::NotConnected);
        }
        let state = &self.cluster.inner;
        let pending = state.fail_next_opens.load(Ordering::SeqCst);
        if pending > 0 {
            state.fail_next_opens.store(pending - 1, Ordering::SeqCst);
            return Err(injected("context open"));
        }
        let pool = self
            .cluster
            .pool(pool)
            .ok_or_else(|| StoreError::PoolNotFound(pool.to_string()))?;
        state.contexts_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryContext { pool }))
    }
}
