//! Network snapshots for reproducibility.
//!
//! A snapshot records which network a run used and a hash of its canonical
//! JSON form, so two runs can be checked for having queried the same model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::network::NetworkSpec;
use crate::resolve::ResolvedPath;

/// A frozen snapshot of the loaded network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the network file.
    pub schema_version: String,

    /// Where the network came from.
    pub source: String,

    /// Path the network was loaded from, if any.
    #[serde(default)]
    pub path: Option<String>,

    /// Name of the built-in preset, if one was used.
    #[serde(default)]
    pub preset: Option<String>,

    /// SHA-256 of the canonical JSON serialization.
    pub content_hash: String,

    pub node_count: usize,

    pub candidate_count: usize,

    #[serde(default)]
    pub description: Option<String>,
}

impl NetworkSnapshot {
    /// Create a snapshot of a loaded specification.
    ///
    /// The hash covers the re-serialized spec rather than the raw file, so
    /// JSON and TOML encodings of the same network hash identically.
    pub fn new(
        spec: &NetworkSpec,
        resolved: &ResolvedPath,
        preset: Option<&str>,
    ) -> Result<Self, serde_json::Error> {
        let canonical = serde_json::to_string(spec)?;
        Ok(NetworkSnapshot {
            timestamp: Utc::now(),
            schema_version: spec.schema_version.clone(),
            source: resolved.source.to_string(),
            path: resolved.path.as_ref().map(|p| p.display().to_string()),
            preset: preset.map(str::to_string),
            content_hash: hash_content(&canonical),
            node_count: spec.nodes.len(),
            candidate_count: spec
                .diagnosis
                .as_ref()
                .map(|d| d.candidates.len())
                .unwrap_or(0),
            description: spec.description.clone(),
        })
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot describes the same network as another.
    pub fn matches(&self, other: &NetworkSnapshot) -> bool {
        self.content_hash == other.content_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.content_hash[..12.min(self.content_hash.len())]
    }
}

/// Hash content with SHA-256 and return hex string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{get_preset, PresetName};

    fn builtin(name: PresetName) -> NetworkSnapshot {
        NetworkSnapshot::new(
            &get_preset(name),
            &ResolvedPath::default(),
            Some(name.as_str()),
        )
        .unwrap()
    }

    #[test]
    fn test_builtin_snapshot() {
        let snapshot = builtin(PresetName::Asia);
        assert_eq!(snapshot.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert_eq!(snapshot.source, "builtin default");
        assert!(snapshot.path.is_none());
        assert_eq!(snapshot.preset.as_deref(), Some("asia"));
        assert_eq!(snapshot.node_count, 8);
        assert_eq!(snapshot.candidate_count, 3);
    }

    #[test]
    fn test_snapshot_short_id() {
        assert_eq!(builtin(PresetName::Asia).short_id().len(), 12);
    }

    #[test]
    fn test_snapshot_matches() {
        assert!(builtin(PresetName::Asia).matches(&builtin(PresetName::Asia)));
        assert!(!builtin(PresetName::Asia).matches(&builtin(PresetName::Chain)));
    }

    #[test]
    fn test_edit_changes_hash() {
        let mut spec = get_preset(PresetName::Chain);
        let before = NetworkSnapshot::new(&spec, &ResolvedPath::default(), None).unwrap();
        spec.nodes[0].cpt = crate::network::CptSpec::Prior(0.02);
        let after = NetworkSnapshot::new(&spec, &ResolvedPath::default(), None).unwrap();
        assert!(!before.matches(&after));
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = builtin(PresetName::Chain);
        let json = snapshot.to_json().unwrap();
        let restored = NetworkSnapshot::from_json(&json).unwrap();
        assert!(snapshot.matches(&restored));
        assert_eq!(restored.node_count, 2);
    }
}
