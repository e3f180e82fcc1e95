//! Network file discovery.
//!
//! Resolution order: CLI argument (or `DX_NETWORK`) → config dir (`--config-dir`
//! or `DX_CONFIG_DIR`) → XDG config → `/etc/dx` → built-in preset.
//!
//! Environment variables are folded into the CLI layer by clap, so this
//! module never reads the process environment itself.

use std::path::{Path, PathBuf};

/// Where the network specification came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via `--network`.
    CliArgument,

    /// Set via `DX_NETWORK`.
    Environment,

    /// Found in the directory given by `--config-dir` / `DX_CONFIG_DIR`.
    ConfigDir,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Found in /etc/dx/.
    SystemConfig,

    /// Using the built-in preset.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigDir => write!(f, "config dir"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Standard network file names, checked in this order.
pub const NETWORK_FILENAMES: &[&str] = &["network.json", "network.toml"];

/// Application name for XDG directories.
const APP_NAME: &str = "dx";

/// A resolved network location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPath {
    /// File to load, or `None` for the built-in preset.
    pub path: Option<PathBuf>,

    /// Where the path was found.
    pub source: ConfigSource,
}

impl ResolvedPath {
    /// Whether the built-in preset should be used.
    pub fn is_builtin(&self) -> bool {
        self.path.is_none()
    }
}

/// Resolve the network specification path.
///
/// An explicit path is returned as-is even when it does not exist, so that
/// loading it reports the missing file instead of silently falling back.
/// `explicit_from_env` marks that the explicit path came from `DX_NETWORK`.
pub fn resolve_network_path(
    explicit: Option<&Path>,
    explicit_from_env: bool,
    config_dir: Option<&Path>,
) -> ResolvedPath {
    if let Some(path) = explicit {
        return ResolvedPath {
            path: Some(path.to_path_buf()),
            source: if explicit_from_env {
                ConfigSource::Environment
            } else {
                ConfigSource::CliArgument
            },
        };
    }

    if let Some(dir) = config_dir {
        if let Some(path) = find_in_dir(dir) {
            return ResolvedPath {
                path: Some(path),
                source: ConfigSource::ConfigDir,
            };
        }
    }

    if let Some(dir) = xdg_config_dir() {
        if let Some(path) = find_in_dir(&dir) {
            return ResolvedPath {
                path: Some(path),
                source: ConfigSource::XdgConfig,
            };
        }
    }

    if let Some(path) = find_in_dir(&system_config_dir()) {
        return ResolvedPath {
            path: Some(path),
            source: ConfigSource::SystemConfig,
        };
    }

    ResolvedPath::default()
}

/// First standard network file present in `dir`.
pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    NETWORK_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Get the XDG config directory for dx.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
