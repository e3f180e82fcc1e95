//! Error types for dx.
//!
//! Every failure a dx command can report is an [`Error`]. Each variant has
//! a stable numeric code, a category, and a remediation hint, and renders
//! either for a terminal or as a [`StructuredError`] JSON object.
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Degenerate Evidence (code 33)
//!   evidence has zero probability under the network: ...
//!   Fix: The observed combination is impossible under the model. Drop or correct a finding.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 31,
//!   "category": "inference",
//!   "message": "unknown evidence variable: Fever",
//!   "recoverable": true,
//!   "suggested_action": "fix_query",
//!   "context": { "variable": "Fever" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which layer raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Network specification files (parse, schema, resolution).
    Config,
    /// Network construction (ordering, CPT shape).
    Network,
    /// Queries against a constructed network.
    Inference,
    /// Diagnosis wrapper (labels, candidates).
    Diagnosis,
    /// Reading files or writing JSON.
    Io,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Config => "config",
            ErrorCategory::Network => "network",
            ErrorCategory::Inference => "inference",
            ErrorCategory::Diagnosis => "diagnosis",
            ErrorCategory::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an automated caller should do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Run `dx config validate` against the network file.
    RunCheck,
    /// Fall back to the built-in network.
    ResetConfig,
    /// Change the query variable or evidence names.
    FixQuery,
    /// Drop or correct an observation.
    ReviseEvidence,
    /// Observe more variables or raise the hidden-variable budget.
    ReduceHidden,
    /// Try again; the failure may be transient.
    Retry,
    /// A person has to edit the network.
    ManualIntervention,
}

impl SuggestedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedAction::RunCheck => "run_check",
            SuggestedAction::ResetConfig => "reset_config",
            SuggestedAction::FixQuery => "fix_query",
            SuggestedAction::ReviseEvidence => "revise_evidence",
            SuggestedAction::ReduceHidden => "reduce_hidden",
            SuggestedAction::Retry => "retry",
            SuggestedAction::ManualIntervention => "manual_intervention",
        }
    }
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for dx.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid network specification: {0}")]
    InvalidNetworkSpec(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Network construction errors (20-29)
    #[error("invalid network: {0}")]
    Network(String),

    #[error("variable {variable} references parent {parent} which is not declared before it")]
    CycleOrOrdering { variable: String, parent: String },

    #[error("incomplete CPT for {variable}: {missing} of {expected} parent combinations missing")]
    IncompleteCpt {
        variable: String,
        missing: usize,
        expected: usize,
    },

    #[error("malformed CPT for {variable}: {detail}")]
    MalformedCpt { variable: String, detail: String },

    // Inference errors (30-39)
    #[error("unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("unknown evidence variable: {name}")]
    UnknownEvidenceVariable { name: String },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("evidence has zero probability under the network: {0}")]
    DegenerateEvidence(String),

    #[error("query too expensive: {hidden} hidden variables exceeds limit of {limit}")]
    QueryTooExpensive { hidden: usize, limit: usize },

    // Diagnosis errors (40-49)
    #[error("diagnosis failed: {0}")]
    Diagnosis(String),

    #[error("unrecognized label {label:?} for {variable}")]
    UnknownLabel { variable: String, label: String },

    // I/O errors (60-69)
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable numeric code. The tens digit follows the category: 1x config,
    /// 2x network, 3x inference, 4x diagnosis, 6x I/O.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidNetworkSpec(_) => 11,
            Error::SchemaValidation(_) => 12,
            Error::Network(_) => 20,
            Error::CycleOrOrdering { .. } => 21,
            Error::IncompleteCpt { .. } => 22,
            Error::MalformedCpt { .. } => 23,
            Error::UnknownVariable { .. } => 30,
            Error::UnknownEvidenceVariable { .. } => 31,
            Error::InvalidQuery(_) => 32,
            Error::DegenerateEvidence(_) => 33,
            Error::QueryTooExpensive { .. } => 34,
            Error::Diagnosis(_) => 40,
            Error::UnknownLabel { .. } => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidNetworkSpec(_) | Error::SchemaValidation(_) => {
                ErrorCategory::Config
            }

            Error::Network(_)
            | Error::CycleOrOrdering { .. }
            | Error::IncompleteCpt { .. }
            | Error::MalformedCpt { .. } => ErrorCategory::Network,

            Error::UnknownVariable { .. }
            | Error::UnknownEvidenceVariable { .. }
            | Error::InvalidQuery(_)
            | Error::DegenerateEvidence(_)
            | Error::QueryTooExpensive { .. } => ErrorCategory::Inference,

            Error::Diagnosis(_) | Error::UnknownLabel { .. } => ErrorCategory::Diagnosis,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the caller can resolve this error by changing its input.
    ///
    /// Inference is deterministic, so nothing here is fixed by retrying the
    /// same call; only I/O failures may be transient.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A broken network file can be fixed or replaced.
            Error::Config(_) | Error::InvalidNetworkSpec(_) | Error::SchemaValidation(_) => true,

            // The network as declared is unusable.
            Error::Network(_)
            | Error::CycleOrOrdering { .. }
            | Error::IncompleteCpt { .. }
            | Error::MalformedCpt { .. } => false,

            Error::UnknownVariable { .. }
            | Error::UnknownEvidenceVariable { .. }
            | Error::InvalidQuery(_)
            | Error::DegenerateEvidence(_)
            | Error::QueryTooExpensive { .. } => true,

            Error::Diagnosis(_) => false,
            Error::UnknownLabel { .. } => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidNetworkSpec(_) => SuggestedAction::ResetConfig,
            Error::SchemaValidation(_) => SuggestedAction::RunCheck,

            Error::Network(_)
            | Error::CycleOrOrdering { .. }
            | Error::IncompleteCpt { .. }
            | Error::MalformedCpt { .. } => SuggestedAction::ManualIntervention,

            Error::UnknownVariable { .. }
            | Error::UnknownEvidenceVariable { .. }
            | Error::InvalidQuery(_) => SuggestedAction::FixQuery,
            Error::DegenerateEvidence(_) => SuggestedAction::ReviseEvidence,
            Error::QueryTooExpensive { .. } => SuggestedAction::ReduceHidden,

            Error::Diagnosis(_) => SuggestedAction::ManualIntervention,
            Error::UnknownLabel { .. } => SuggestedAction::ReviseEvidence,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// One-sentence fix for a person reading stderr.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Run 'dx config validate' to check the network file.",
            Error::InvalidNetworkSpec(_) => {
                "Fix the network file, or unset DX_NETWORK to use the built-in network."
            }
            Error::SchemaValidation(_) => {
                "Ensure the network file matches the schema printed by 'dx config schema'."
            }

            Error::Network(_) => "Fix the variable declarations in the network file.",
            Error::CycleOrOrdering { .. } => {
                "Declare every variable after all of its parents. Cycles cannot be expressed."
            }
            Error::IncompleteCpt { .. } => {
                "Add a CPT row for every combination of parent values (2^k rows for k parents)."
            }
            Error::MalformedCpt { .. } => {
                "Each CPT row must list exactly one value per parent, in declared parent order."
            }

            Error::UnknownVariable { .. } => "List the available variables with 'dx network'.",
            Error::UnknownEvidenceVariable { .. } => {
                "Evidence may only name variables of the network. List them with 'dx network'."
            }
            Error::InvalidQuery(_) => "Do not supply evidence for the variable being queried.",
            Error::DegenerateEvidence(_) => {
                "The observed combination is impossible under the model. Drop or correct a finding."
            }
            Error::QueryTooExpensive { .. } => {
                "Observe more variables, or raise the limit with '--max-hidden'."
            }

            Error::Diagnosis(_) => "Check the diagnosis section of the network file.",
            Error::UnknownLabel { .. } => {
                "Use the factor's positive/negative label, true/false, or NA for unobserved."
            }

            Error::Io(_) => "Check that the file exists and is readable, then retry.",
            Error::Json(_) => "This is a bug in dx. Please report it with the command line used.",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidNetworkSpec(_) => "Invalid Network Specification",
            Error::SchemaValidation(_) => "Schema Validation Failed",

            Error::Network(_) => "Invalid Network",
            Error::CycleOrOrdering { .. } => "Variable Ordering Error",
            Error::IncompleteCpt { .. } => "Incomplete CPT",
            Error::MalformedCpt { .. } => "Malformed CPT",

            Error::UnknownVariable { .. } => "Unknown Variable",
            Error::UnknownEvidenceVariable { .. } => "Unknown Evidence Variable",
            Error::InvalidQuery(_) => "Invalid Query",
            Error::DegenerateEvidence(_) => "Degenerate Evidence",
            Error::QueryTooExpensive { .. } => "Query Too Expensive",

            Error::Diagnosis(_) => "Diagnosis Error",
            Error::UnknownLabel { .. } => "Unrecognized Label",

            Error::Io(_) => "File Error",
            Error::Json(_) => "Output Encoding Error",
        }
    }
}

/// JSON form of an [`Error`] for `--format json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    pub suggested_action: SuggestedAction,

    /// Variant fields such as the offending variable name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = BTreeMap::new();

        match err {
            Error::CycleOrOrdering { variable, parent } => {
                context.insert("variable".to_string(), serde_json::json!(variable));
                context.insert("parent".to_string(), serde_json::json!(parent));
            }
            Error::IncompleteCpt {
                variable,
                missing,
                expected,
            } => {
                context.insert("variable".to_string(), serde_json::json!(variable));
                context.insert("missing".to_string(), serde_json::json!(missing));
                context.insert("expected".to_string(), serde_json::json!(expected));
            }
            Error::MalformedCpt { variable, .. } => {
                context.insert("variable".to_string(), serde_json::json!(variable));
            }
            Error::UnknownVariable { name } | Error::UnknownEvidenceVariable { name } => {
                context.insert("variable".to_string(), serde_json::json!(name));
            }
            Error::QueryTooExpensive { hidden, limit } => {
                context.insert("hidden".to_string(), serde_json::json!(hidden));
                context.insert("limit".to_string(), serde_json::json!(limit));
            }
            Error::UnknownLabel { variable, label } => {
                context.insert("variable".to_string(), serde_json::json!(variable));
                context.insert("label".to_string(), serde_json::json!(label));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Attach an extra context field. Values that fail to serialize are dropped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.context.insert(key.into(), value);
        }
        self
    }

    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(_) => serde_json::json!({ "code": self.code, "message": self.message }).to_string(),
        }
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Render an error for a terminal:
///
/// ```text
/// ✗ Unknown Variable (code 30)
///   unknown variable: Fever
///   Fix: List the available variables with 'dx network'.
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let paint = |code: &str, text: &str| {
        if use_color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    };

    format!(
        "{} {} (code {})\n  {}\n  {} {}",
        paint("31", "✗"),
        paint("1", err.headline()),
        err.code(),
        err,
        paint("36", "Fix:"),
        err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(
            Error::UnknownVariable {
                name: "Asia".into()
            }
            .code(),
            30
        );
        assert_eq!(Error::DegenerateEvidence("w=0".into()).code(), 33);
        assert_eq!(
            Error::QueryTooExpensive {
                hidden: 30,
                limit: 24
            }
            .code(),
            34
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(Error::Config("test".into()).category(), ErrorCategory::Config);
        assert_eq!(
            Error::CycleOrOrdering {
                variable: "B".into(),
                parent: "A".into()
            }
            .category(),
            ErrorCategory::Network
        );
        assert_eq!(
            Error::InvalidQuery("x".into()).category(),
            ErrorCategory::Inference
        );
        assert_eq!(
            Error::UnknownLabel {
                variable: "Xray".into(),
                label: "Maybe".into()
            }
            .category(),
            ErrorCategory::Diagnosis
        );
    }

    #[test]
    fn test_error_recoverable() {
        assert!(Error::Config("test".into()).is_recoverable());
        assert!(!Error::IncompleteCpt {
            variable: "B".into(),
            missing: 1,
            expected: 2
        }
        .is_recoverable());
        assert!(Error::DegenerateEvidence("w=0".into()).is_recoverable());
    }

    #[test]
    fn test_suggested_action() {
        assert_eq!(
            Error::UnknownEvidenceVariable {
                name: "Fever".into()
            }
            .suggested_action(),
            SuggestedAction::FixQuery
        );
        assert_eq!(
            Error::DegenerateEvidence("w=0".into()).suggested_action(),
            SuggestedAction::ReviseEvidence
        );
        assert_eq!(
            Error::InvalidNetworkSpec("bad".into()).suggested_action(),
            SuggestedAction::ResetConfig
        );
    }

    #[test]
    fn test_structured_error_from_error() {
        let err = Error::UnknownEvidenceVariable {
            name: "Fever".into(),
        };
        let structured = StructuredError::from(&err);

        assert_eq!(structured.code, 31);
        assert_eq!(structured.category, ErrorCategory::Inference);
        assert!(structured.recoverable);
        assert_eq!(structured.suggested_action, SuggestedAction::FixQuery);
        assert_eq!(
            structured.context.get("variable"),
            Some(&serde_json::json!("Fever"))
        );
    }

    #[test]
    fn test_structured_error_json() {
        let err = Error::QueryTooExpensive {
            hidden: 30,
            limit: 24,
        };
        let json = StructuredError::from(&err).to_json();

        assert!(json.contains(r#""code":34"#));
        assert!(json.contains(r#""category":"inference""#));
        assert!(json.contains(r#""suggested_action":"reduce_hidden""#));
        assert!(json.contains(r#""limit":24"#));
    }

    #[test]
    fn test_context_keys_are_sorted() {
        let err = Error::IncompleteCpt {
            variable: "Dyspnea".into(),
            missing: 2,
            expected: 4,
        };
        let json = StructuredError::from(&err)
            .with_context("attempt", 1)
            .to_json();

        let attempt = json.find(r#""attempt""#).unwrap();
        let expected = json.find(r#""expected""#).unwrap();
        let missing = json.find(r#""missing""#).unwrap();
        let variable = json.find(r#""variable""#).unwrap();
        assert!(attempt < expected && expected < missing && missing < variable);
        assert_eq!(json, StructuredError::from(&err).with_context("attempt", 1).to_json());
    }

    #[test]
    fn test_format_error_human() {
        let err = Error::CycleOrOrdering {
            variable: "Xray".into(),
            parent: "TBorCancer".into(),
        };
        let formatted = format_error_human(&err, false);

        assert!(formatted.contains("Variable Ordering Error"));
        assert!(formatted.contains("Xray references parent TBorCancer"));
        assert!(formatted.contains("Declare every variable after"));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Network.to_string(), "network");
        assert_eq!(ErrorCategory::Diagnosis.to_string(), "diagnosis");
    }

    #[test]
    fn test_suggested_action_display() {
        assert_eq!(SuggestedAction::FixQuery.to_string(), "fix_query");
        assert_eq!(SuggestedAction::ReduceHidden.to_string(), "reduce_hidden");
    }
}
