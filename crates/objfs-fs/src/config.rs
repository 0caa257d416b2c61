use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

/// Settings for connecting the object filesystem.
///
/// Every field is optional; an absent or empty value falls back to the
/// client's default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Client configuration file. Empty means the platform default path.
    pub config_path: Option<PathBuf>,
    /// Cluster to connect to.
    pub cluster: Option<String>,
    /// Identity to authenticate as.
    pub user: Option<String>,
    /// Backend-specific command-line style arguments, applied after the
    /// configuration file and the environment.
    pub args: Vec<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl FsConfig {
    /// Parse from TOML text.
    pub fn from_toml(text: &str) -> FsResult<Self> {
        toml::from_str(text).map_err(|e| FsError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> FsResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| FsError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Explicit client configuration file, if one was given.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Requested cluster, if any.
    pub fn cluster(&self) -> Option<&str> {
        non_empty(&self.cluster)
    }

    /// Requested identity, if any.
    pub fn user(&self) -> Option<&str> {
        non_empty(&self.user)
    }
}
