//! Built-in network presets.
//!
//! - Asia: the classic lung-disease network (chest clinic) with a diagnosis
//!   section ranking tuberculosis, lung cancer and bronchitis
//! - Chain: a two-variable chain, handy for checking hand-computed posteriors

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::network::{
    CandidateSpec, CptRowSpec, CptSpec, DiagnosisSpec, FactorSpec, NetworkSpec, NodeSpec,
};

/// Available network presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Eight-variable chest clinic network.
    #[default]
    Asia,
    /// A -> B chain.
    Chain,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[PresetName::Asia, PresetName::Chain];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Asia => "asia",
            PresetName::Chain => "chain",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "asia" | "chest-clinic" | "lung" => Some(PresetName::Asia),
            "chain" | "two-node" => Some(PresetName::Chain),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Asia => {
                "Chest clinic network: visit to Asia, smoking, TB, lung cancer, bronchitis, x-ray, dyspnea"
            }
            PresetName::Chain => "Two-variable chain A -> B",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone, Error)]
pub enum PresetError {
    #[error("Unknown preset '{0}'. Available: {available}", available = available_names())]
    UnknownPreset(String),
}

fn available_names() -> String {
    PresetName::ALL
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Get the network specification for a preset.
pub fn get_preset(name: PresetName) -> NetworkSpec {
    match name {
        PresetName::Asia => asia_preset(),
        PresetName::Chain => chain_preset(),
    }
}

fn root(name: &str, p: f64) -> NodeSpec {
    NodeSpec {
        name: name.to_string(),
        parents: Vec::new(),
        cpt: CptSpec::Prior(p),
        description: None,
    }
}

fn child(name: &str, parents: &[&str], rows: &[(&[bool], f64)]) -> NodeSpec {
    NodeSpec {
        name: name.to_string(),
        parents: parents.iter().map(|p| p.to_string()).collect(),
        cpt: CptSpec::Rows(
            rows.iter()
                .map(|(given, p)| CptRowSpec {
                    given: given.to_vec(),
                    p: *p,
                })
                .collect(),
        ),
        description: None,
    }
}

fn factor(variable: &str, positive: &str, negative: &str) -> FactorSpec {
    FactorSpec {
        variable: variable.to_string(),
        positive: positive.to_string(),
        negative: negative.to_string(),
    }
}

fn candidate(variable: &str, label: &str) -> CandidateSpec {
    CandidateSpec {
        variable: variable.to_string(),
        label: Some(label.to_string()),
    }
}

/// Asia preset.
///
/// TBorCancer is a deterministic OR of Tuberculosis and LungCancer. The
/// LungCancer table uses 0.1 / 0.01.
fn asia_preset() -> NetworkSpec {
    NetworkSpec {
        schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
        description: Some(PresetName::Asia.description().to_string()),
        nodes: vec![
            root("Asia", 0.01),
            root("Smoking", 0.5),
            child(
                "Tuberculosis",
                &["Asia"],
                &[(&[true], 0.05), (&[false], 0.01)],
            ),
            child(
                "LungCancer",
                &["Smoking"],
                &[(&[true], 0.1), (&[false], 0.01)],
            ),
            child(
                "Bronchitis",
                &["Smoking"],
                &[(&[true], 0.6), (&[false], 0.3)],
            ),
            child(
                "TBorCancer",
                &["Tuberculosis", "LungCancer"],
                &[
                    (&[true, true], 1.0),
                    (&[true, false], 1.0),
                    (&[false, true], 1.0),
                    (&[false, false], 0.0),
                ],
            ),
            child(
                "Xray",
                &["TBorCancer"],
                &[(&[true], 0.99), (&[false], 0.05)],
            ),
            child(
                "Dyspnea",
                &["TBorCancer", "Bronchitis"],
                &[
                    (&[true, true], 0.9),
                    (&[true, false], 0.7),
                    (&[false, true], 0.8),
                    (&[false, false], 0.1),
                ],
            ),
        ],
        diagnosis: Some(DiagnosisSpec {
            factors: vec![
                factor("Asia", "Yes", "No"),
                factor("Smoking", "Yes", "No"),
                factor("Xray", "Abnormal", "Normal"),
                factor("Dyspnea", "Present", "Absent"),
            ],
            candidates: vec![
                candidate("Tuberculosis", "TB"),
                candidate("LungCancer", "Cancer"),
                candidate("Bronchitis", "Bronchitis"),
            ],
        }),
    }
}

/// Chain preset: P(A) = 0.01, P(B | A) = 0.05, P(B | not A) = 0.01.
fn chain_preset() -> NetworkSpec {
    NetworkSpec {
        schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
        description: Some(PresetName::Chain.description().to_string()),
        nodes: vec![
            root("A", 0.01),
            child("B", &["A"], &[(&[true], 0.05), (&[false], 0.01)]),
        ],
        diagnosis: Some(DiagnosisSpec {
            factors: vec![factor("B", "Yes", "No")],
            candidates: vec![CandidateSpec {
                variable: "A".to_string(),
                label: None,
            }],
        }),
    }
}

/// Preset information for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub node_count: usize,
    pub candidates: Vec<String>,
}

impl PresetInfo {
    /// Create info from a preset.
    pub fn from_preset(name: PresetName) -> Self {
        let spec = get_preset(name);
        Self {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
            node_count: spec.nodes.len(),
            candidates: spec
                .diagnosis
                .map(|d| {
                    d.candidates
                        .iter()
                        .map(|c| c.display_label().to_string())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// List all available presets with their descriptions.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_network_spec;

    #[test]
    fn test_preset_name_parsing() {
        assert_eq!(PresetName::parse("asia"), Some(PresetName::Asia));
        assert_eq!(PresetName::parse("ASIA"), Some(PresetName::Asia));
        assert_eq!(PresetName::parse("chest-clinic"), Some(PresetName::Asia));
        assert_eq!(PresetName::parse("chain"), Some(PresetName::Chain));
        assert_eq!(PresetName::parse("unknown"), None);
    }

    #[test]
    fn test_from_str_error_lists_available() {
        let err = "nope".parse::<PresetName>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown preset 'nope'. Available: asia, chain");
    }

    #[test]
    fn test_all_presets_validate() {
        for &name in PresetName::ALL {
            validate_network_spec(&get_preset(name))
                .unwrap_or_else(|e| panic!("preset {} invalid: {}", name, e));
        }
    }

    #[test]
    fn test_asia_structure() {
        let spec = get_preset(PresetName::Asia);
        assert_eq!(
            spec.node_names(),
            vec![
                "Asia",
                "Smoking",
                "Tuberculosis",
                "LungCancer",
                "Bronchitis",
                "TBorCancer",
                "Xray",
                "Dyspnea"
            ]
        );
        assert_eq!(
            spec.node("LungCancer").unwrap().cpt.probabilities(),
            vec![0.1, 0.01]
        );
        let diagnosis = spec.diagnosis.unwrap();
        let labels: Vec<_> = diagnosis
            .candidates
            .iter()
            .map(|c| c.display_label())
            .collect();
        assert_eq!(labels, vec!["TB", "Cancer", "Bronchitis"]);
    }

    #[test]
    fn test_list_presets() {
        let presets = list_presets();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].name, "asia");
        assert_eq!(presets[0].node_count, 8);
        assert_eq!(presets[1].candidates, vec!["A"]);
    }
}
