//! Inference by full enumeration.
//!
//! For each value of the query variable, sums the joint probability over
//! every assignment of the remaining unobserved variables, walking the
//! network in topological order:
//!
//! ```text
//! enumerate(Y :: rest, e) =
//!     P(y_e | parents) · enumerate(rest, e)                  if Y ∈ e
//!     Σ_y P(y | parents) · enumerate(rest, e ∪ {Y = y})      otherwise
//! ```
//!
//! Cost is `O(n · 2^h)` for `h` hidden variables. There is no memoization,
//! so [`EnumerationConfig::max_hidden_variables`] bounds `h` up front.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{Distribution, Evidence, InferenceError};
use crate::logging::event_names;
use crate::network::NetworkModel;

/// Default bound on hidden variables per query.
pub const DEFAULT_MAX_HIDDEN_VARIABLES: usize = 24;

/// Enumeration limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationConfig {
    /// Queries with more unobserved non-query variables fail with
    /// `QueryTooExpensive` before any work is done.
    pub max_hidden_variables: usize,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        EnumerationConfig {
            max_hidden_variables: DEFAULT_MAX_HIDDEN_VARIABLES,
        }
    }
}

/// Exact inference engine. Holds only configuration, never per-query state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Enumerator {
    config: EnumerationConfig,
}

impl Enumerator {
    pub fn new(config: EnumerationConfig) -> Self {
        Enumerator { config }
    }

    pub fn config(&self) -> &EnumerationConfig {
        &self.config
    }

    /// Posterior of `query` given `evidence`.
    pub fn ask(
        &self,
        query: &str,
        evidence: &Evidence,
        network: &NetworkModel,
    ) -> Result<Distribution, InferenceError> {
        let started = Instant::now();
        let query_idx = network
            .index_of(query)
            .ok_or_else(|| InferenceError::UnknownVariable {
                name: query.to_string(),
            })?;

        let mut assignment: Vec<Option<bool>> = vec![None; network.len()];
        for (name, value) in evidence.iter() {
            let idx =
                network
                    .index_of(name)
                    .ok_or_else(|| InferenceError::UnknownEvidenceVariable {
                        name: name.to_string(),
                    })?;
            if idx == query_idx {
                return Err(InferenceError::InvalidQuery {
                    variable: query.to_string(),
                });
            }
            assignment[idx] = Some(value);
        }

        let hidden = network.len() - evidence.len() - 1;
        if hidden > self.config.max_hidden_variables {
            return Err(InferenceError::QueryTooExpensive {
                hidden,
                limit: self.config.max_hidden_variables,
            });
        }

        tracing::debug!(
            target: event_names::QUERY_STARTED,
            query,
            evidence = %evidence,
            hidden,
            "enumerating"
        );

        assignment[query_idx] = Some(true);
        let w_true = enumerate_all(network, 0, &mut assignment);
        assignment[query_idx] = Some(false);
        let w_false = enumerate_all(network, 0, &mut assignment);

        let dist = Distribution::from_weights(w_true, w_false).ok_or_else(|| {
            InferenceError::DegenerateEvidence {
                query: query.to_string(),
                evidence: evidence.to_string(),
            }
        })?;

        tracing::debug!(
            target: event_names::QUERY_FINISHED,
            query,
            p_true = dist.p_true,
            elapsed_us = started.elapsed().as_micros() as u64,
            "query complete"
        );

        Ok(dist)
    }

    /// Posteriors for several variables under the same evidence, in order.
    pub fn ask_many<S: AsRef<str>>(
        &self,
        queries: &[S],
        evidence: &Evidence,
        network: &NetworkModel,
    ) -> Result<Vec<Distribution>, InferenceError> {
        queries
            .iter()
            .map(|q| self.ask(q.as_ref(), evidence, network))
            .collect()
    }
}

/// Posterior of `query` given `evidence` with default limits.
pub fn enumeration_ask(
    query: &str,
    evidence: &Evidence,
    network: &NetworkModel,
) -> Result<Distribution, InferenceError> {
    Enumerator::default().ask(query, evidence, network)
}

/// Sum of the joint over all completions of `assignment` from `pos` onward.
fn enumerate_all(network: &NetworkModel, pos: usize, assignment: &mut [Option<bool>]) -> f64 {
    if pos == network.len() {
        return 1.0;
    }

    let var = network.at(pos);
    let row = var
        .parent_indices()
        .iter()
        .enumerate()
        .fold(0usize, |acc, (bit, &parent)| match assignment[parent] {
            Some(v) => acc | (usize::from(v) << bit),
            None => unreachable!("parents precede children in topological order"),
        });
    let p = var.cpt().at(row);

    match assignment[pos] {
        Some(true) => p * enumerate_all(network, pos + 1, assignment),
        Some(false) => (1.0 - p) * enumerate_all(network, pos + 1, assignment),
        None => {
            assignment[pos] = Some(true);
            let t = p * enumerate_all(network, pos + 1, assignment);
            assignment[pos] = Some(false);
            let f = (1.0 - p) * enumerate_all(network, pos + 1, assignment);
            assignment[pos] = None;
            t + f
        }
    }
}
