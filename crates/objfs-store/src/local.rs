//! Directory-backed cluster client.
//!
//! Layout on disk:
//!
//! ```text
//! <data_root>/<cluster>/<pool>/<hex(object id)>
//! ```
//!
//! Object ids are hex-encoded into file names so that ids containing `/`
//! stay flat: the pool directory never has sub-directories.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::settings::{ClientSettings, DATA_ROOT_ENV, DEFAULT_CLUSTER, DEFAULT_USER};
use crate::traits::{
    validate_segment_name, ClientFactory, ContextHandle, ObjectClient, ObjectNames, ObjectStat,
    PoolContext,
};

/// Factory for [`LocalClient`]s.
#[derive(Clone, Debug, Default)]
pub struct LocalClientFactory;

impl ClientFactory for LocalClientFactory {
    type Client = LocalClient;

    fn create(&self, cluster: Option<&str>, user: Option<&str>) -> StoreResult<LocalClient> {
        LocalClient::new(cluster, user)
    }
}

/// A client whose cluster is a directory tree on the local filesystem.
#[derive(Debug)]
pub struct LocalClient {
    cluster: String,
    user: String,
    settings: ClientSettings,
    cluster_dir: Option<PathBuf>,
}

impl LocalClient {
    /// Construct an unconnected client for `(cluster, user)`.
    pub fn new(cluster: Option<&str>, user: Option<&str>) -> StoreResult<Self> {
        let cluster = cluster.unwrap_or(DEFAULT_CLUSTER);
        let user = user.unwrap_or(DEFAULT_USER);
        validate_segment_name(cluster)?;
        validate_segment_name(user)?;
        Ok(Self {
            cluster: cluster.to_string(),
            user: user.to_string(),
            settings: ClientSettings::default(),
            cluster_dir: None,
        })
    }

    /// Construct an unconnected client with explicit settings.
    pub fn with_settings(
        cluster: Option<&str>,
        user: Option<&str>,
        settings: ClientSettings,
    ) -> StoreResult<Self> {
        let mut client = Self::new(cluster, user)?;
        client.settings = settings;
        Ok(client)
    }

    /// Settings currently in effect.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Directory that holds this client's cluster.
    pub fn cluster_dir(&self) -> PathBuf {
        self.settings.data_root.join(&self.cluster)
    }
}

impl ObjectClient for LocalClient {
    fn read_config_file(&mut self, path: &Path) -> StoreResult<()> {
        self.settings = ClientSettings::load(path)?;
        debug!(path = %path.display(), "loaded client settings");
        Ok(())
    }

    fn read_default_config_file(&mut self) -> StoreResult<()> {
        self.read_config_file(Path::new(crate::settings::DEFAULT_CONFIG_PATH))
    }

    fn parse_config_env(&mut self) -> StoreResult<()> {
        match std::env::var(DATA_ROOT_ENV) {
            Ok(root) if root.is_empty() => Err(StoreError::Config(format!(
                "{DATA_ROOT_ENV} is set but empty"
            ))),
            Ok(root) => {
                self.settings.data_root = PathBuf::from(root);
                Ok(())
            }
            Err(std::env::VarError::NotPresent) => Ok(()),
            Err(e) => Err(StoreError::Config(format!("{DATA_ROOT_ENV}: {e}"))),
        }
    }

    /// Accepts `--data-root PATH` and `--allow-user NAME`, either spaced or
    /// joined with `=`. Nothing is applied unless every argument parses.
    fn parse_config_args(&mut self, args: &[String]) -> StoreResult<()> {
        let mut settings = self.settings.clone();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let (name, inline) = match arg.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (arg.as_str(), None),
            };
            let value = match inline {
                Some(value) => value,
                None => iter
                    .next()
                    .cloned()
                    .ok_or_else(|| StoreError::Config(format!("{name} requires a value")))?,
            };
            if value.is_empty() {
                return Err(StoreError::Config(format!("{name} requires a value")));
            }
            match name {
                "--data-root" => settings.data_root = PathBuf::from(value),
                "--allow-user" => settings.users.push(value),
                _ => {
                    return Err(StoreError::Config(format!(
                        "unrecognized argument {arg:?}"
                    )))
                }
            }
        }
        debug!(data_root = %settings.data_root.display(), "applied client arguments");
        self.settings = settings;
        Ok(())
    }

    fn connect(&mut self) -> StoreResult<()> {
        if !self.settings.allows_user(&self.user) {
            return Err(StoreError::PermissionDenied(format!(
                "user {:?} may not connect to cluster {:?}",
                self.user, self.cluster
            )));
        }
        let dir = self.cluster_dir();
        if !fs::metadata(&dir)?.is_dir() {
            return Err(StoreError::Config(format!(
                "cluster path {} is not a directory",
                dir.display()
            )));
        }
        debug!(cluster = %self.cluster, dir = %dir.display(), "connected");
        self.cluster_dir = Some(dir);
        Ok(())
    }

    fn open_context(&self, pool: &str) -> StoreResult<ContextHandle> {
        let cluster_dir = self.cluster_dir.as_ref().ok_or(StoreError::NotConnected)?;
        validate_segment_name(pool)?;
        let dir = cluster_dir.join(pool);
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => Ok(Arc::new(LocalPool {
                name: pool.to_string(),
                dir,
            })),
            Ok(_) => Err(StoreError::PoolNotFound(pool.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::PoolNotFound(pool.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// A pool stored as one directory of object files.
#[derive(Debug)]
pub struct LocalPool {
    name: String,
    dir: PathBuf,
}

impl LocalPool {
    fn object_path(&self, oid: &str) -> PathBuf {
        self.dir.join(hex::encode(oid.as_bytes()))
    }

    fn map_err(&self, oid: &str, e: io::Error) -> StoreError {
        match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound {
                pool: self.name.clone(),
                oid: oid.to_string(),
            },
            io::ErrorKind::PermissionDenied => {
                StoreError::PermissionDenied(format!("{}/{oid}", self.name))
            }
            _ => StoreError::Io(e),
        }
    }

    fn open_for_write(&self, oid: &str, append: bool) -> StoreResult<File> {
        OpenOptions::new()
            .create(true)
            .write(!append)
            .append(append)
            .open(self.object_path(oid))
            .map_err(|e| self.map_err(oid, e))
    }
}

impl PoolContext for LocalPool {
    fn pool_name(&self) -> &str {
        &self.name
    }

    fn read(&self, oid: &str, buf: &mut [u8], offset: u64) -> StoreResult<usize> {
        let mut file = File::open(self.object_path(oid)).map_err(|e| self.map_err(oid, e))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| self.map_err(oid, e))?;
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.map_err(oid, e)),
            }
        }
        Ok(filled)
    }

    fn write(&self, oid: &str, data: &[u8], offset: u64) -> StoreResult<()> {
        let mut file = self.open_for_write(oid, false)?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| self.map_err(oid, e))?;
        file.write_all(data).map_err(|e| self.map_err(oid, e))
    }

    fn append(&self, oid: &str, data: &[u8]) -> StoreResult<()> {
        // One write_all on an O_APPEND handle keeps each call contiguous.
        let mut file = self.open_for_write(oid, true)?;
        file.write_all(data).map_err(|e| self.map_err(oid, e))
    }

    fn truncate(&self, oid: &str, size: u64) -> StoreResult<()> {
        let file = self.open_for_write(oid, false)?;
        file.set_len(size).map_err(|e| self.map_err(oid, e))
    }

    fn stat(&self, oid: &str) -> StoreResult<ObjectStat> {
        let meta = fs::metadata(self.object_path(oid)).map_err(|e| self.map_err(oid, e))?;
        Ok(ObjectStat { size: meta.len() })
    }

    fn delete(&self, oid: &str) -> StoreResult<()> {
        fs::remove_file(self.object_path(oid)).map_err(|e| self.map_err(oid, e))
    }

    fn object_names(&self) -> StoreResult<ObjectNames<'_>> {
        let entries = fs::read_dir(&self.dir)?;
        let pool = self.name.clone();
        let iter = entries.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(StoreError::Io(e))),
            };
            let file_name = entry.file_name();
            let decoded = file_name
                .to_str()
                .and_then(|name| hex::decode(name).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok());
            if decoded.is_none() {
                debug!(pool = %pool, file = ?file_name, "skipping foreign file in pool directory");
            }
            decoded.map(Ok)
        });
        Ok(Box::new(iter))
    }
}
