//! URL-addressed filesystem facade over pool-scoped object stores.
//!
//! Objects are addressed as `store-object://<pool>/<object-id>`. The URL host
//! picks the pool and the rest of the path, `/` characters included, is the
//! object id in the pool's flat namespace.
//!
//! # Modules
//!
//! - [`address`] -- [`ObjectUrl`] parsing
//! - [`cache`] -- [`PoolContextCache`], one lazily opened context per pool
//! - [`listing`] -- one-level directory listings synthesized from object ids
//! - [`filesystem`] -- the [`FileSystem`] trait URL schemes are bound to
//! - [`registry`] -- [`FsRegistry`], the scheme dispatch table
//! - [`object_fs`] -- [`ObjectFileSystem`], the object store implementation
//! - [`config`] / [`init`] -- connecting a client and registering it
//!
//! # Example
//!
//! ```
//! use objfs_fs::{init_object_fs, FsConfig, FsRegistry};
//! use objfs_store::InMemoryCluster;
//! use objfs_stream::WriteStream;
//!
//! let cluster = InMemoryCluster::new();
//! cluster.create_pool("data").unwrap();
//!
//! let registry = FsRegistry::new();
//! init_object_fs(&cluster, &FsConfig::default(), &registry).unwrap();
//!
//! let mut w = registry.open_writer("store-object://data/notes/today").unwrap();
//! w.write(b"hello").unwrap();
//! assert_eq!(
//!     registry.list_entries("store-object://data/notes").unwrap(),
//!     vec!["today"]
//! );
//! ```

pub mod address;
pub mod cache;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod init;
pub mod listing;
pub mod object_fs;
pub mod registry;

pub use address::ObjectUrl;
pub use cache::PoolContextCache;
pub use config::FsConfig;
pub use error::{FsError, FsResult};
pub use filesystem::{FileSystem, WatchCallback, WatchHandle};
pub use init::{init_object_fs, init_object_fs_with_observer, SCHEME};
pub use listing::{collect_children, list_children};
pub use object_fs::ObjectFileSystem;
pub use registry::FsRegistry;
