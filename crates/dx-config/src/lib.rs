//! dx network configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for network specification files (JSON or TOML)
//! - Path resolution (CLI → env → XDG → system → built-in preset)
//! - Semantic validation of probabilities, labels, and references
//! - Built-in presets, including the Asia lung-disease network
//! - Snapshots recording which network a result was computed against

pub mod network;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use network::{
    CandidateSpec, CptRowSpec, CptSpec, DiagnosisSpec, FactorSpec, NetworkSpec, NodeSpec,
};
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{resolve_network_path, ConfigSource, ResolvedPath};
pub use snapshot::{hash_content, NetworkSnapshot};
pub use validate::{validate_network_spec, ValidationError, ValidationResult};

/// Schema version for network specification files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
