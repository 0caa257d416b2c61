//! Client construction and scheme registration.

use std::sync::Arc;

use objfs_store::{ClientFactory, ObjectClient};
use objfs_stream::{observer, SharedObserver};
use tracing::{info, warn};

use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::object_fs::ObjectFileSystem;
use crate::registry::FsRegistry;

/// URL scheme served by [`ObjectFileSystem`].
pub const SCHEME: &str = "store-object";

/// Connect a client as described by `config` and register it for
/// [`SCHEME`] URLs in `registry`.
///
/// Building the client and connecting are fatal. Problems reading the
/// configuration file, the environment or `config.args` are logged and
/// skipped, leaving the client's defaults in place.
pub fn init_object_fs<F: ClientFactory>(
    factory: &F,
    config: &FsConfig,
    registry: &FsRegistry,
) -> FsResult<Arc<ObjectFileSystem>> {
    init_object_fs_with_observer(factory, config, registry, observer::no_op())
}

/// Like [`init_object_fs`], attaching `observer` to every stream opened
/// through the registered filesystem.
pub fn init_object_fs_with_observer<F: ClientFactory>(
    factory: &F,
    config: &FsConfig,
    registry: &FsRegistry,
    observer: SharedObserver,
) -> FsResult<Arc<ObjectFileSystem>> {
    let cluster = config.cluster();
    let user = config.user();
    let mut client = factory.create(cluster, user).map_err(|source| FsError::Init {
        context: format!(
            "creating client (cluster {}, user {})",
            cluster.unwrap_or("<default>"),
            user.unwrap_or("<default>")
        ),
        source,
    })?;

    match config.config_path() {
        Some(path) => {
            if let Err(e) = client.read_config_file(path) {
                warn!(path = %path.display(), error = %e, "failed to read client configuration file");
            }
        }
        None => {
            if let Err(e) = client.read_default_config_file() {
                warn!(error = %e, "failed to read default client configuration file");
            }
        }
    }
    if let Err(e) = client.parse_config_env() {
        warn!(error = %e, "failed to parse client configuration from environment");
    }
    if let Err(e) = client.parse_config_args(&config.args) {
        warn!(args = ?config.args, error = %e, "failed to parse client configuration arguments");
    }

    client.connect().map_err(|source| FsError::Init {
        context: "connecting to cluster".to_string(),
        source,
    })?;
    info!(cluster = cluster.unwrap_or("<default>"), "connected to object store");

    let fs = Arc::new(ObjectFileSystem::new(Box::new(client)).with_observer(observer));
    registry.register(SCHEME, fs.clone());
    Ok(fs)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use objfs_store::{InMemoryCluster, StoreError};

    use super::*;

    #[test]
    fn registers_scheme_on_success() {
        let cluster = InMemoryCluster::new();
        cluster.create_pool("data").unwrap().put("a/b", b"x").unwrap();
        let registry = FsRegistry::new();

        init_object_fs(&cluster, &FsConfig::default(), &registry).unwrap();
        assert_eq!(registry.schemes(), vec![SCHEME]);
        assert_eq!(
            registry.list_entries("store-object://data/a").unwrap(),
            vec!["b"]
        );
    }

    #[test]
    fn client_construction_failure_is_fatal() {
        let cluster = InMemoryCluster::with_name("prod");
        let registry = FsRegistry::new();
        let config = FsConfig {
            cluster: Some("staging".into()),
            ..Default::default()
        };
        let err = init_object_fs(&cluster, &config, &registry).unwrap_err();
        assert!(matches!(err, FsError::Init { .. }));
        assert!(err.to_string().contains("staging"));
        assert!(registry.schemes().is_empty());
    }

    #[test]
    fn connect_failure_is_fatal() {
        let cluster = InMemoryCluster::new();
        cluster.set_fail_connect(true);
        let registry = FsRegistry::new();
        let err = init_object_fs(&cluster, &FsConfig::default(), &registry).unwrap_err();
        assert!(matches!(err, FsError::Init { source: StoreError::Io(_), .. }));
        assert!(registry.get(SCHEME).is_none());
    }

    #[test]
    fn denied_user_is_fatal() {
        let cluster = InMemoryCluster::with_users("objfs", &["backup"]);
        let registry = FsRegistry::new();
        let config = FsConfig {
            user: Some("intruder".into()),
            ..Default::default()
        };
        let err = init_object_fs(&cluster, &config, &registry).unwrap_err();
        assert!(matches!(
            err,
            FsError::Init {
                source: StoreError::PermissionDenied(_),
                ..
            }
        ));
    }

    #[test]
    fn unreadable_config_file_is_not_fatal() {
        let cluster = InMemoryCluster::new();
        let registry = FsRegistry::new();
        let config = FsConfig {
            config_path: Some(PathBuf::from("/nonexistent/objfs.toml")),
            ..Default::default()
        };
        assert!(init_object_fs(&cluster, &config, &registry).is_ok());
        assert!(registry.get(SCHEME).is_some());
    }

    #[test]
    fn rejected_client_arguments_are_not_fatal() {
        let cluster = InMemoryCluster::new();
        let registry = FsRegistry::new();
        let config = FsConfig {
            args: vec!["--no-such-option".into()],
            ..Default::default()
        };
        assert!(init_object_fs(&cluster, &config, &registry).is_ok());
        assert!(registry.get(SCHEME).is_some());
    }

    #[test]
    fn re_initialization_replaces_handler() {
        let first = InMemoryCluster::new();
        first.create_pool("data").unwrap().put("one", b"").unwrap();
        let second = InMemoryCluster::new();
        second.create_pool("data").unwrap().put("two", b"").unwrap();
        let registry = FsRegistry::new();

        init_object_fs(&first, &FsConfig::default(), &registry).unwrap();
        init_object_fs(&second, &FsConfig::default(), &registry).unwrap();
        assert_eq!(
            registry.list_entries("store-object://data/").unwrap(),
            vec!["two"]
        );
    }
}
