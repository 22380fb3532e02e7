//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/sftp-fastget/fastget.toml`
//! - Windows: `%APPDATA%/sftp-fastget/fastget.toml`
//!
//! `FASTGET_CONFIG` overrides the location.

use std::path::{Path, PathBuf};

use fastget_protocol::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY};
use fastget_transfer::TransferOptions;
use serde::{Deserialize, Serialize};

const CONFIG_ENV: &str = "FASTGET_CONFIG";

/// Transfer defaults and the served tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Reads kept in flight per transfer.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Bytes requested per read.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Text encoding of written files; unset writes bytes verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    /// Permission bits for newly created files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,

    /// Local directory served as the remote `/`.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Remote home directory, used for relative remote paths.
    #[serde(default = "default_home")]
    pub home: String,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_chunk_size() -> u32 {
    DEFAULT_CHUNK_SIZE
}

fn default_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_home() -> String {
    std::env::var("HOME").unwrap_or_else(|_| "/".into())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            chunk_size: default_chunk_size(),
            encoding: None,
            mode: None,
            root: default_root(),
            home: default_home(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the current configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Transfer options carrying this configuration's defaults.
    pub fn transfer_options(&self) -> TransferOptions {
        let mut options = TransferOptions::default()
            .with_concurrency(self.concurrency)
            .with_chunk_size(self.chunk_size);
        if let Some(encoding) = &self.encoding {
            options = options.with_encoding(encoding.clone());
        }
        if let Some(mode) = self.mode {
            options = options.with_mode(mode);
        }
        options
    }
}

/// Returns the configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata)
            .join("sftp-fastget")
            .join("fastget.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("sftp-fastget")
            .join("fastget.toml"))
    }
}
