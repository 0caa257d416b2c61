//! Pool-scoped object store capability interface.
//!
//! A cluster holds named pools; a pool is a flat namespace of byte objects
//! addressed by opaque string ids. Everything above this crate talks to a
//! cluster only through two narrow traits:
//!
//! - [`ObjectClient`] -- configure, connect, and open pool contexts
//! - [`PoolContext`] -- range read, range write, append, truncate, stat,
//!   delete, and iterate object names within one pool
//!
//! # Backends
//!
//! - [`InMemoryCluster`] / [`InMemoryClient`] -- shared in-memory data with
//!   fault injection, for tests and embedding
//! - [`LocalClient`] -- one directory per pool under a data root
//!
//! # Design Rules
//!
//! 1. Contexts are shared and outlive the streams built on them.
//! 2. Errors are reported verbatim; no retries happen at this layer.
//! 3. Object ids are never interpreted: `/` has no meaning to the store.

pub mod error;
pub mod local;
pub mod memory;
pub mod settings;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use local::{LocalClient, LocalClientFactory, LocalPool};
pub use memory::{InMemoryClient, InMemoryCluster, InMemoryContext, InMemoryPool};
pub use settings::ClientSettings;
pub use traits::{
    validate_segment_name, ClientFactory, ContextHandle, ObjectClient, ObjectNames, ObjectStat,
    PoolContext,
};
