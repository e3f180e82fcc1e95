//! Candidate-cause ranking on top of exact inference.
//!
//! A [`Diagnoser`] knows which network variables are observable factors
//! (and the labels callers use for them) and which are candidate causes.
//! Findings become evidence, each candidate is queried once, and the
//! candidate with the highest P(true) wins. Ties go to the candidate
//! declared first.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::inference::{Enumerator, Evidence, InferenceError};
use crate::logging::event_names;
use crate::network::NetworkModel;
use dx_config::DiagnosisSpec;

/// Labels that always mean "not observed", compared case-insensitively.
pub use dx_config::validate::UNOBSERVED_LABELS;

/// Errors raised by the diagnosis wrapper.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosisError {
    #[error("no candidate causes are configured")]
    NoCandidates,

    #[error("{variable} is not a variable of the network")]
    UnknownVariable { variable: String },

    #[error("{variable} is not an observable factor")]
    NotAFactor { variable: String },

    #[error("{variable} is observed more than once")]
    DuplicateFinding { variable: String },

    #[error("{variable} is configured more than once")]
    DuplicateEntry { variable: String },

    #[error("expected {expected} findings, got {actual}")]
    WrongFindingCount { expected: usize, actual: usize },

    #[error("unrecognized label {label:?} for {variable}")]
    UnknownLabel { variable: String, label: String },

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl From<DiagnosisError> for dx_common::Error {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::Inference(e) => e.into(),
            DiagnosisError::UnknownLabel { variable, label } => {
                dx_common::Error::UnknownLabel { variable, label }
            }
            other => dx_common::Error::Diagnosis(other.to_string()),
        }
    }
}

/// Three-state observation of a Boolean variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Observation {
    True,
    False,
    #[default]
    Unobserved,
}

impl Observation {
    /// The observed value, if any.
    pub fn value(self) -> Option<bool> {
        match self {
            Observation::True => Some(true),
            Observation::False => Some(false),
            Observation::Unobserved => None,
        }
    }
}

impl From<bool> for Observation {
    fn from(v: bool) -> Self {
        if v {
            Observation::True
        } else {
            Observation::False
        }
    }
}

impl From<Option<bool>> for Observation {
    fn from(v: Option<bool>) -> Self {
        v.map(Observation::from).unwrap_or(Observation::Unobserved)
    }
}

/// An observable variable and its human labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub variable: String,
    pub positive: String,
    pub negative: String,
}

impl Factor {
    pub fn new(
        variable: impl Into<String>,
        positive: impl Into<String>,
        negative: impl Into<String>,
    ) -> Self {
        Factor {
            variable: variable.into(),
            positive: positive.into(),
            negative: negative.into(),
        }
    }

    /// Map a label to an observation.
    ///
    /// Accepts the factor's own labels, `true/false/yes/no`, and the
    /// unobserved markers, all case-insensitively.
    pub fn parse_label(&self, label: &str) -> Result<Observation, DiagnosisError> {
        let l = label.trim();
        if l.eq_ignore_ascii_case(&self.positive) {
            return Ok(Observation::True);
        }
        if l.eq_ignore_ascii_case(&self.negative) {
            return Ok(Observation::False);
        }
        match l.to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(Observation::True),
            "false" | "no" => Ok(Observation::False),
            other if UNOBSERVED_LABELS.contains(&other) => Ok(Observation::Unobserved),
            _ => Err(DiagnosisError::UnknownLabel {
                variable: self.variable.clone(),
                label: label.to_string(),
            }),
        }
    }

    /// Label for an observation.
    pub fn label(&self, obs: Observation) -> &str {
        match obs {
            Observation::True => &self.positive,
            Observation::False => &self.negative,
            Observation::Unobserved => "NA",
        }
    }
}

/// A candidate cause and the name reported for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub variable: String,
    pub label: String,
}

impl Candidate {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Candidate {
            variable: variable.into(),
            label: label.into(),
        }
    }
}

/// One observation of one factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub variable: String,
    pub observation: Observation,
}

impl Finding {
    pub fn new(variable: impl Into<String>, observation: impl Into<Observation>) -> Self {
        Finding {
            variable: variable.into(),
            observation: observation.into(),
        }
    }
}

/// Posterior of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub variable: String,
    pub label: String,
    pub probability: f64,
}

/// Result of a diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Highest-scoring candidate.
    pub best: CandidateScore,
    /// Every candidate, in declared order.
    pub ranking: Vec<CandidateScore>,
    /// Evidence the candidates were scored against.
    pub evidence: Evidence,
}

impl Diagnosis {
    pub fn label(&self) -> &str {
        &self.best.label
    }

    pub fn probability(&self) -> f64 {
        self.best.probability
    }
}

/// Ranks candidate causes against a network.
#[derive(Debug, Clone)]
pub struct Diagnoser {
    factors: Vec<Factor>,
    candidates: Vec<Candidate>,
    enumerator: Enumerator,
}

impl Diagnoser {
    /// Check factors and candidates against `network`.
    pub fn new(
        network: &NetworkModel,
        factors: Vec<Factor>,
        candidates: Vec<Candidate>,
    ) -> Result<Self, DiagnosisError> {
        if candidates.is_empty() {
            return Err(DiagnosisError::NoCandidates);
        }

        let mut seen = HashSet::new();
        let names = factors
            .iter()
            .map(|f| &f.variable)
            .chain(candidates.iter().map(|c| &c.variable));
        for variable in names {
            if !network.contains(variable) {
                return Err(DiagnosisError::UnknownVariable {
                    variable: variable.clone(),
                });
            }
            if !seen.insert(variable) {
                return Err(DiagnosisError::DuplicateEntry {
                    variable: variable.clone(),
                });
            }
        }

        Ok(Diagnoser {
            factors,
            candidates,
            enumerator: Enumerator::default(),
        })
    }

    /// Build from the diagnosis section of a network file.
    pub fn from_spec(network: &NetworkModel, spec: &DiagnosisSpec) -> Result<Self, DiagnosisError> {
        let factors = spec
            .factors
            .iter()
            .map(|f| Factor::new(&f.variable, &f.positive, &f.negative))
            .collect();
        let candidates = spec
            .candidates
            .iter()
            .map(|c| Candidate::new(&c.variable, c.display_label()))
            .collect();
        Self::new(network, factors, candidates)
    }

    /// Use a specific enumerator (e.g. with a different hidden-variable limit).
    pub fn with_enumerator(mut self, enumerator: Enumerator) -> Self {
        self.enumerator = enumerator;
        self
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn factor(&self, variable: &str) -> Option<&Factor> {
        self.factors.iter().find(|f| f.variable == variable)
    }

    /// Parse `(variable, label)` pairs into findings.
    pub fn parse_findings<S, L>(&self, pairs: &[(S, L)]) -> Result<Vec<Finding>, DiagnosisError>
    where
        S: AsRef<str>,
        L: AsRef<str>,
    {
        pairs
            .iter()
            .map(|(variable, label)| {
                let variable = variable.as_ref();
                let factor = self
                    .factor(variable)
                    .ok_or_else(|| DiagnosisError::NotAFactor {
                        variable: variable.to_string(),
                    })?;
                Ok(Finding::new(variable, factor.parse_label(label.as_ref())?))
            })
            .collect()
    }

    /// Parse one label per factor, in declared factor order.
    pub fn parse_positional<L: AsRef<str>>(
        &self,
        labels: &[L],
    ) -> Result<Vec<Finding>, DiagnosisError> {
        if labels.len() != self.factors.len() {
            return Err(DiagnosisError::WrongFindingCount {
                expected: self.factors.len(),
                actual: labels.len(),
            });
        }
        self.factors
            .iter()
            .zip(labels)
            .map(|(factor, label)| {
                Ok(Finding::new(
                    &factor.variable,
                    factor.parse_label(label.as_ref())?,
                ))
            })
            .collect()
    }

    /// Evidence for a set of findings. Unobserved factors are left out.
    pub fn evidence(&self, findings: &[Finding]) -> Result<Evidence, DiagnosisError> {
        let mut seen = HashSet::new();
        let mut evidence = Evidence::new();
        for finding in findings {
            if self.factor(&finding.variable).is_none() {
                return Err(DiagnosisError::NotAFactor {
                    variable: finding.variable.clone(),
                });
            }
            if !seen.insert(finding.variable.as_str()) {
                return Err(DiagnosisError::DuplicateFinding {
                    variable: finding.variable.clone(),
                });
            }
            if let Some(value) = finding.observation.value() {
                evidence.insert(finding.variable.clone(), value);
            }
        }
        Ok(evidence)
    }

    /// Score every candidate and pick the most probable.
    pub fn diagnose(
        &self,
        network: &NetworkModel,
        findings: &[Finding],
    ) -> Result<Diagnosis, DiagnosisError> {
        let evidence = self.evidence(findings)?;

        let mut ranking: Vec<CandidateScore> = Vec::with_capacity(self.candidates.len());
        let mut best: Option<usize> = None;
        for (i, candidate) in self.candidates.iter().enumerate() {
            let dist = self.enumerator.ask(&candidate.variable, &evidence, network)?;
            // Strictly greater, so the earliest candidate keeps a tie.
            let better = match best {
                Some(b) => dist.p_true > ranking[b].probability,
                None => true,
            };
            if better {
                best = Some(i);
            }
            ranking.push(CandidateScore {
                variable: candidate.variable.clone(),
                label: candidate.label.clone(),
                probability: dist.p_true,
            });
        }

        let best = best
            .and_then(|i| ranking.get(i).cloned())
            .ok_or(DiagnosisError::NoCandidates)?;

        tracing::info!(
            target: event_names::DIAGNOSE_FINISHED,
            label = %best.label,
            probability = best.probability,
            evidence = %evidence,
            "diagnosis complete"
        );

        Ok(Diagnosis {
            best,
            ranking,
            evidence,
        })
    }
}
