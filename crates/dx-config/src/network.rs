//! Network specification file types.
//!
//! A specification is an ordered list of nodes (declaration order is the
//! topological order) plus an optional diagnosis section naming the
//! observable factors and the candidate causes to rank.
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "nodes": [
//!     {"name": "Asia", "cpt": 0.01},
//!     {"name": "Tuberculosis", "parents": ["Asia"],
//!      "cpt": [{"given": [true], "p": 0.05}, {"given": [false], "p": 0.01}]}
//!   ]
//! }
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::ValidationError;

/// Complete network specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NetworkSpec {
    pub schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Nodes in topological order.
    pub nodes: Vec<NodeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<DiagnosisSpec>,
}

/// One Boolean variable and its conditional probability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeSpec {
    pub name: String,

    /// Parent names; order defines the shape of each CPT row.
    #[serde(default)]
    pub parents: Vec<String>,

    pub cpt: CptSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// CPT as written in a file: a bare prior for root nodes, or explicit rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CptSpec {
    /// P(node = true) for a node without parents.
    Prior(f64),
    /// One row per combination of parent values.
    Rows(Vec<CptRowSpec>),
}

/// A single CPT row: P(node = true | parents = given).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CptRowSpec {
    /// Parent values in declared parent order.
    #[serde(default)]
    pub given: Vec<bool>,
    pub p: f64,
}

impl CptSpec {
    /// Flatten to `(parent values, p)` rows. A prior becomes the single unit row.
    pub fn rows(&self) -> Vec<(Vec<bool>, f64)> {
        match self {
            CptSpec::Prior(p) => vec![(Vec::new(), *p)],
            CptSpec::Rows(rows) => rows.iter().map(|r| (r.given.clone(), r.p)).collect(),
        }
    }

    /// Every probability that appears in the table.
    pub fn probabilities(&self) -> Vec<f64> {
        match self {
            CptSpec::Prior(p) => vec![*p],
            CptSpec::Rows(rows) => rows.iter().map(|r| r.p).collect(),
        }
    }
}

/// Diagnosis configuration: which variables are observed and which are ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosisSpec {
    #[serde(default)]
    pub factors: Vec<FactorSpec>,

    /// Candidate causes, ranked in this order; earlier entries win ties.
    pub candidates: Vec<CandidateSpec>,
}

/// An observable variable and the labels a caller uses to report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FactorSpec {
    pub variable: String,

    #[serde(default = "default_positive_label")]
    pub positive: String,

    #[serde(default = "default_negative_label")]
    pub negative: String,
}

/// A hidden variable scored during diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CandidateSpec {
    pub variable: String,

    /// Name reported to the caller; defaults to the variable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CandidateSpec {
    /// Reported name of this candidate.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.variable)
    }
}

fn default_positive_label() -> String {
    "Yes".to_string()
}

fn default_negative_label() -> String {
    "No".to_string()
}

impl NetworkSpec {
    /// Load a specification from a file; `.toml` files are parsed as TOML,
    /// everything else as JSON.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        if is_toml_path(path) {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Parse a specification from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse a specification from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ValidationError> {
        toml::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Node names in declaration order.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }
}

/// Whether a path should be parsed as TOML.
pub fn is_toml_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_json() {
        let json = r#"{
            "schema_version": "1.0.0",
            "nodes": [
                {"name": "A", "cpt": 0.01},
                {"name": "B", "parents": ["A"], "cpt": [
                    {"given": [true], "p": 0.05},
                    {"given": [false], "p": 0.01}
                ]}
            ]
        }"#;

        let spec = NetworkSpec::from_json_str(json).unwrap();
        assert_eq!(spec.node_names(), vec!["A", "B"]);
        assert_eq!(spec.nodes[0].cpt, CptSpec::Prior(0.01));
        assert!(spec.nodes[0].parents.is_empty());
        assert_eq!(
            spec.nodes[1].cpt.rows(),
            vec![(vec![true], 0.05), (vec![false], 0.01)]
        );
        assert!(spec.diagnosis.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
            schema_version = "1.0.0"

            [[nodes]]
            name = "A"
            cpt = 0.25

            [[nodes]]
            name = "B"
            parents = ["A"]
            cpt = [
                { given = [true], p = 0.9 },
                { given = [false], p = 0.2 },
            ]

            [diagnosis]
            factors = [{ variable = "B", positive = "Present", negative = "Absent" }]
            candidates = [{ variable = "A", label = "Alpha" }]
        "#;

        let spec = NetworkSpec::from_toml_str(content).unwrap();
        assert_eq!(spec.nodes.len(), 2);
        assert_eq!(spec.nodes[0].cpt, CptSpec::Prior(0.25));
        let diagnosis = spec.diagnosis.unwrap();
        assert_eq!(diagnosis.factors[0].positive, "Present");
        assert_eq!(diagnosis.candidates[0].display_label(), "Alpha");
    }

    #[test]
    fn test_factor_label_defaults() {
        let factor: FactorSpec = serde_json::from_str(r#"{"variable": "Smoking"}"#).unwrap();
        assert_eq!(factor.positive, "Yes");
        assert_eq!(factor.negative, "No");
    }

    #[test]
    fn test_candidate_label_falls_back_to_variable() {
        let candidate: CandidateSpec =
            serde_json::from_str(r#"{"variable": "Bronchitis"}"#).unwrap();
        assert_eq!(candidate.display_label(), "Bronchitis");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = NetworkSpec::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn test_prior_rows_are_unit_row() {
        assert_eq!(CptSpec::Prior(0.5).rows(), vec![(Vec::new(), 0.5)]);
    }

    #[test]
    fn test_is_toml_path() {
        assert!(is_toml_path(Path::new("network.toml")));
        assert!(is_toml_path(Path::new("/etc/dx/NETWORK.TOML")));
        assert!(!is_toml_path(Path::new("network.json")));
        assert!(!is_toml_path(Path::new("network")));
    }
}
