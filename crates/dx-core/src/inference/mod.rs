//! Exact inference over a [`NetworkModel`](crate::network::NetworkModel).
//!
//! Queries are stateless: every call takes the network, the query variable,
//! and the evidence explicitly, and returns a normalized [`Distribution`].

pub mod enumeration;

pub use enumeration::{enumeration_ask, EnumerationConfig, Enumerator};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("unknown evidence variable: {name}")]
    UnknownEvidenceVariable { name: String },

    #[error("evidence assigns the query variable {variable}")]
    InvalidQuery { variable: String },

    #[error("evidence {evidence} has zero probability when querying {query}")]
    DegenerateEvidence { query: String, evidence: String },

    #[error("query too expensive: {hidden} hidden variables exceeds limit of {limit}")]
    QueryTooExpensive { hidden: usize, limit: usize },
}

impl From<InferenceError> for dx_common::Error {
    fn from(err: InferenceError) -> Self {
        use dx_common::Error as E;
        match err {
            InferenceError::UnknownVariable { name } => E::UnknownVariable { name },
            InferenceError::UnknownEvidenceVariable { name } => E::UnknownEvidenceVariable { name },
            InferenceError::InvalidQuery { .. } => E::InvalidQuery(err.to_string()),
            InferenceError::DegenerateEvidence { .. } => E::DegenerateEvidence(err.to_string()),
            InferenceError::QueryTooExpensive { hidden, limit } => {
                E::QueryTooExpensive { hidden, limit }
            }
        }
    }
}

/// Observed variable values for one query.
///
/// Backed by an ordered map so iteration and display are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Evidence(BTreeMap<String, bool>);

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, variable: impl Into<String>, value: bool) -> Self {
        self.0.insert(variable.into(), value);
        self
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, variable: impl Into<String>, value: bool) -> Option<bool> {
        self.0.insert(variable.into(), value)
    }

    pub fn remove(&mut self, variable: &str) -> Option<bool> {
        self.0.remove(variable)
    }

    pub fn get(&self, variable: &str) -> Option<bool> {
        self.0.get(variable).copied()
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.0.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl std::fmt::Display for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for Evidence {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        Evidence(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<BTreeMap<String, bool>> for Evidence {
    fn from(map: BTreeMap<String, bool>) -> Self {
        Evidence(map)
    }
}

/// Posterior over a Boolean variable. `p_true + p_false == 1` up to rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub p_true: f64,
    pub p_false: f64,
}

impl Distribution {
    /// Normalize unnormalized weights; `None` if both are zero.
    pub fn from_weights(w_true: f64, w_false: f64) -> Option<Self> {
        let total = w_true + w_false;
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        Some(Distribution {
            p_true: w_true / total,
            p_false: w_false / total,
        })
    }

    /// Probability of `value`.
    pub fn probability(&self, value: bool) -> f64 {
        if value {
            self.p_true
        } else {
            self.p_false
        }
    }
}

impl std::ops::Index<bool> for Distribution {
    type Output = f64;

    fn index(&self, value: bool) -> &f64 {
        if value {
            &self.p_true
        } else {
            &self.p_false
        }
    }
}
