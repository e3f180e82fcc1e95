//! Network loading for dx-core.
//!
//! This module handles:
//! - Resolving which network to use (explicit file, preset, config dirs)
//! - Parsing and semantic validation via `dx-config`
//! - Building the [`NetworkModel`] and optional [`Diagnoser`]
//! - Snapshotting the loaded spec for output provenance

pub use dx_config::preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use dx_config::validate::ValidationError;
pub use dx_config::{NetworkSnapshot, NetworkSpec};

use dx_config::resolve::{resolve_network_path, ConfigSource, ResolvedPath};
use dx_config::validate::validate_network_spec;
use std::path::PathBuf;
use thiserror::Error;

use crate::diagnosis::{DiagnosisError, Diagnoser};
use crate::logging::event_names;
use crate::network::{NetworkError, NetworkModel, VariableDef};

/// Errors that can occur while loading a network.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Network file not found: {path}")]
    NotFound { path: PathBuf },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Invalid diagnosis section: {0}")]
    Diagnosis(#[from] DiagnosisError),

    #[error("Failed to snapshot network: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Network resolution options.
#[derive(Debug, Clone, Default)]
pub struct NetworkOptions {
    /// Explicit network file (`--network` / `DX_NETWORK`).
    pub network_path: Option<PathBuf>,
    /// Whether `network_path` came from `DX_NETWORK`.
    pub network_from_env: bool,
    /// Explicit preset; used when no explicit file is given.
    pub preset: Option<PresetName>,
    /// Directory searched for `network.json` / `network.toml`.
    pub config_dir: Option<PathBuf>,
}

/// A loaded network with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedNetwork {
    pub spec: NetworkSpec,
    pub model: NetworkModel,
    /// Present when the network file has a diagnosis section.
    pub diagnoser: Option<Diagnoser>,
    pub resolved: ResolvedPath,
    /// Preset name when no file was loaded.
    pub preset: Option<PresetName>,
    pub snapshot: NetworkSnapshot,
}

/// Convert file nodes into network construction records.
pub fn variable_defs(spec: &NetworkSpec) -> Vec<VariableDef> {
    spec.nodes
        .iter()
        .map(|node| VariableDef {
            name: node.name.clone(),
            parents: node.parents.clone(),
            rows: node.cpt.rows(),
        })
        .collect()
}

/// Build a model from a validated spec.
pub fn build_model(spec: &NetworkSpec) -> Result<NetworkModel, NetworkError> {
    NetworkModel::new(variable_defs(spec))
}

/// Load a network with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit network file (`--network`, `DX_NETWORK`)
/// 2. Explicit preset (`--preset`)
/// 3. `network.json` / `network.toml` in the config dir
/// 4. XDG config dir, then `/etc/dx`
/// 5. Built-in Asia preset
pub fn load_network(options: &NetworkOptions) -> Result<ResolvedNetwork, ConfigError> {
    let resolved = match (&options.network_path, options.preset) {
        (None, Some(_)) => ResolvedPath::default(),
        (explicit, _) => resolve_network_path(
            explicit.as_deref(),
            options.network_from_env,
            options.config_dir.as_deref(),
        ),
    };

    let (spec, preset) = match &resolved.path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound { path: path.clone() });
            }
            (NetworkSpec::from_file(path)?, None)
        }
        None => {
            let name = options.preset.unwrap_or_default();
            tracing::debug!(
                target: event_names::CONFIG_DEFAULT_USED,
                preset = %name,
                "no network file found; using preset"
            );
            (get_preset(name), Some(name))
        }
    };

    load_spec(spec, resolved, preset)
}

/// Validate and build an already-parsed spec.
pub fn load_spec(
    spec: NetworkSpec,
    resolved: ResolvedPath,
    preset: Option<PresetName>,
) -> Result<ResolvedNetwork, ConfigError> {
    validate_network_spec(&spec)?;
    let model = build_model(&spec)?;
    let diagnoser = spec
        .diagnosis
        .as_ref()
        .map(|d| Diagnoser::from_spec(&model, d))
        .transpose()?;
    let snapshot = NetworkSnapshot::new(&spec, &resolved, preset.map(|p| p.as_str()))?;

    tracing::info!(
        target: event_names::CONFIG_LOADED,
        source = %resolved.source,
        path = ?resolved.path,
        variables = model.len(),
        hash = %snapshot.short_id(),
        "network loaded"
    );

    Ok(ResolvedNetwork {
        spec,
        model,
        diagnoser,
        resolved,
        preset,
        snapshot,
    })
}

impl ResolvedNetwork {
    /// Human description of where the network came from.
    pub fn origin(&self) -> String {
        match (&self.resolved.path, self.preset) {
            (Some(path), _) => format!("{} ({})", path.display(), self.resolved.source),
            (None, Some(preset)) => format!("preset:{}", preset),
            (None, None) => ConfigSource::BuiltinDefault.to_string(),
        }
    }
}

impl From<ConfigError> for dx_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => dx_common::Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("network file not found: {}", path.display()),
            )),
            ConfigError::Validation(v) => match v {
                ValidationError::IoError(msg) => dx_common::Error::Io(std::io::Error::other(msg)),
                ValidationError::ParseError(msg) | ValidationError::SchemaError(msg) => {
                    dx_common::Error::SchemaValidation(msg)
                }
                other => dx_common::Error::InvalidNetworkSpec(other.to_string()),
            },
            ConfigError::Network(e) => e.into(),
            ConfigError::Diagnosis(e) => dx_common::Error::Config(e.to_string()),
            ConfigError::Snapshot(e) => dx_common::Error::Json(e),
        }
    }
}
