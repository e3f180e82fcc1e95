//! Configuration validation errors and semantic validation.
//!
//! Shape checks that depend on graph structure (parent ordering, CPT
//! completeness) belong to network construction in `dx-core`; this module
//! rejects what is wrong with a file regardless of how it would be built.

use std::collections::HashSet;

use thiserror::Error;

use crate::network::{DiagnosisSpec, NetworkSpec, NodeSpec};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SchemaError(_) => 62,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Labels reserved for "not observed".
pub const UNOBSERVED_LABELS: &[&str] = &["na", "n/a", "unobserved", "unknown", ""];

/// Validate a network specification semantically.
pub fn validate_network_spec(spec: &NetworkSpec) -> ValidationResult<()> {
    if spec.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: spec.schema_version.clone(),
        });
    }

    if spec.nodes.is_empty() {
        return Err(ValidationError::MissingField("nodes".to_string()));
    }

    let mut seen = HashSet::new();
    for node in &spec.nodes {
        validate_node(node)?;
        if !seen.insert(node.name.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "node {} is declared more than once",
                node.name
            )));
        }
    }

    if let Some(diagnosis) = &spec.diagnosis {
        validate_diagnosis(diagnosis, &seen)?;
    }

    Ok(())
}

/// Validate a single node's name and CPT values.
fn validate_node(node: &NodeSpec) -> ValidationResult<()> {
    if node.name.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "nodes[].name".to_string(),
            message: "Must not be empty".to_string(),
        });
    }

    for (i, (given, p)) in node.cpt.rows().iter().enumerate() {
        if !p.is_finite() || *p < 0.0 || *p > 1.0 {
            return Err(ValidationError::InvalidValue {
                field: format!("nodes.{}.cpt[{}].p", node.name, i),
                message: format!("Must be in [0, 1], got {}", p),
            });
        }
        if given.len() != node.parents.len() {
            return Err(ValidationError::InvalidValue {
                field: format!("nodes.{}.cpt[{}].given", node.name, i),
                message: format!(
                    "Expected {} parent values ({}), got {}",
                    node.parents.len(),
                    node.parents.join(", "),
                    given.len()
                ),
            });
        }
    }

    Ok(())
}

/// Validate that diagnosis factors and candidates name declared nodes.
fn validate_diagnosis(diagnosis: &DiagnosisSpec, nodes: &HashSet<&str>) -> ValidationResult<()> {
    if diagnosis.candidates.is_empty() {
        return Err(ValidationError::MissingField(
            "diagnosis.candidates".to_string(),
        ));
    }

    let mut factors = HashSet::new();
    for factor in &diagnosis.factors {
        if !nodes.contains(factor.variable.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "diagnosis.factors[].variable".to_string(),
                message: format!("Unknown node {}", factor.variable),
            });
        }
        if !factors.insert(factor.variable.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "factor {} is listed more than once",
                factor.variable
            )));
        }

        let positive = factor.positive.trim().to_lowercase();
        let negative = factor.negative.trim().to_lowercase();
        for (which, label) in [("positive", &positive), ("negative", &negative)] {
            if UNOBSERVED_LABELS.contains(&label.as_str()) {
                return Err(ValidationError::InvalidValue {
                    field: format!("diagnosis.factors.{}.{}", factor.variable, which),
                    message: format!("Label {:?} is reserved for unobserved", label),
                });
            }
        }
        if positive == negative {
            return Err(ValidationError::InvalidValue {
                field: format!("diagnosis.factors.{}", factor.variable),
                message: "Positive and negative labels must differ".to_string(),
            });
        }
    }

    let mut candidates = HashSet::new();
    for candidate in &diagnosis.candidates {
        if !nodes.contains(candidate.variable.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "diagnosis.candidates[].variable".to_string(),
                message: format!("Unknown node {}", candidate.variable),
            });
        }
        if !candidates.insert(candidate.variable.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "candidate {} is listed more than once",
                candidate.variable
            )));
        }
        if factors.contains(candidate.variable.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "{} cannot be both an observed factor and a candidate",
                candidate.variable
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{CandidateSpec, CptRowSpec, CptSpec, FactorSpec};

    fn chain() -> NetworkSpec {
        NetworkSpec {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            nodes: vec![
                NodeSpec {
                    name: "A".to_string(),
                    parents: vec![],
                    cpt: CptSpec::Prior(0.01),
                    description: None,
                },
                NodeSpec {
                    name: "B".to_string(),
                    parents: vec!["A".to_string()],
                    cpt: CptSpec::Rows(vec![
                        CptRowSpec {
                            given: vec![true],
                            p: 0.05,
                        },
                        CptRowSpec {
                            given: vec![false],
                            p: 0.01,
                        },
                    ]),
                    description: None,
                },
            ],
            diagnosis: Some(DiagnosisSpec {
                factors: vec![FactorSpec {
                    variable: "B".to_string(),
                    positive: "Present".to_string(),
                    negative: "Absent".to_string(),
                }],
                candidates: vec![CandidateSpec {
                    variable: "A".to_string(),
                    label: None,
                }],
            }),
        }
    }

    #[test]
    fn test_valid_chain_passes() {
        validate_network_spec(&chain()).unwrap();
    }

    #[test]
    fn test_version_mismatch() {
        let mut spec = chain();
        spec.schema_version = "0.9.0".to_string();
        let err = validate_network_spec(&spec).unwrap_err();
        assert!(matches!(err, ValidationError::VersionMismatch { .. }));
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn test_empty_nodes_rejected() {
        let mut spec = chain();
        spec.nodes.clear();
        spec.diagnosis = None;
        assert!(matches!(
            validate_network_spec(&spec),
            Err(ValidationError::MissingField(_))
        ));
    }

    #[test]
    fn test_probability_out_of_range() {
        let mut spec = chain();
        spec.nodes[0].cpt = CptSpec::Prior(1.5);
        let err = validate_network_spec(&spec).unwrap_err();
        assert!(err.to_string().contains("nodes.A.cpt[0].p"));
    }

    #[test]
    fn test_nan_probability_rejected() {
        let mut spec = chain();
        spec.nodes[0].cpt = CptSpec::Prior(f64::NAN);
        assert!(validate_network_spec(&spec).is_err());
    }

    #[test]
    fn test_row_arity_mismatch() {
        let mut spec = chain();
        spec.nodes[1].cpt = CptSpec::Rows(vec![CptRowSpec {
            given: vec![true, false],
            p: 0.5,
        }]);
        let err = validate_network_spec(&spec).unwrap_err();
        assert!(err.to_string().contains("Expected 1 parent values"));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut spec = chain();
        let dup = spec.nodes[0].clone();
        spec.nodes.push(dup);
        assert!(matches!(
            validate_network_spec(&spec),
            Err(ValidationError::SemanticError(_))
        ));
    }

    #[test]
    fn test_unknown_candidate_rejected() {
        let mut spec = chain();
        spec.diagnosis.as_mut().unwrap().candidates[0].variable = "Z".to_string();
        let err = validate_network_spec(&spec).unwrap_err();
        assert!(err.to_string().contains("Unknown node Z"));
    }

    #[test]
    fn test_reserved_label_rejected() {
        let mut spec = chain();
        spec.diagnosis.as_mut().unwrap().factors[0].negative = "NA".to_string();
        assert!(validate_network_spec(&spec).is_err());
    }

    #[test]
    fn test_identical_labels_rejected() {
        let mut spec = chain();
        spec.diagnosis.as_mut().unwrap().factors[0].negative = "present".to_string();
        assert!(validate_network_spec(&spec).is_err());
    }

    #[test]
    fn test_factor_cannot_be_candidate() {
        let mut spec = chain();
        spec.diagnosis.as_mut().unwrap().candidates.push(CandidateSpec {
            variable: "B".to_string(),
            label: None,
        });
        assert!(matches!(
            validate_network_spec(&spec),
            Err(ValidationError::SemanticError(_))
        ));
    }
}
