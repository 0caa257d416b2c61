use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Default location of the client settings file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/objfs/objfs.toml";

/// Environment variable overriding [`ClientSettings::data_root`].
pub const DATA_ROOT_ENV: &str = "OBJFS_DATA_ROOT";

/// Default cluster name used when none is requested.
pub const DEFAULT_CLUSTER: &str = "objfs";

/// Default identity used when none is requested.
pub const DEFAULT_USER: &str = "admin";

/// Settings read from a client configuration file.
///
/// ```toml
/// data_root = "/var/lib/objfs"
/// users = ["admin", "backup"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Directory holding one sub-directory per cluster.
    pub data_root: PathBuf,
    /// Identities allowed to connect. Empty means any identity.
    pub users: Vec<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("/var/lib/objfs"),
            users: Vec::new(),
        }
    }
}

impl ClientSettings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Read and parse a settings file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Whether `user` may connect under these settings.
    pub fn allows_user(&self, user: &str) -> bool {
        self.users.is_empty() || self.users.iter().any(|u| u == user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = ClientSettings::default();
        assert_eq!(s.data_root, PathBuf::from("/var/lib/objfs"));
        assert!(s.users.is_empty());
        assert!(s.allows_user("anyone"));
    }

    #[test]
    fn parse_partial_toml() {
        let s = ClientSettings::from_toml(r#"data_root = "/srv/objfs""#).unwrap();
        assert_eq!(s.data_root, PathBuf::from("/srv/objfs"));
        assert!(s.users.is_empty());
    }

    #[test]
    fn user_allow_list() {
        let s = ClientSettings::from_toml("users = [\"backup\"]").unwrap();
        assert!(s.allows_user("backup"));
        assert!(!s.allows_user("admin"));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = ClientSettings::from_toml("data_root = [").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = ClientSettings::load(Path::new("/nonexistent/objfs.toml")).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
