//! Bayesian network of Boolean variables.
//!
//! Variables live in an arena (`Vec`) in declaration order, which must be a
//! topological order: every parent is declared before its children. Parents
//! are stored as arena indices and each variable's conditional probability
//! table is a dense vector indexed by the parent combination, where parent
//! `i` contributes bit `i`:
//!
//! ```text
//! index(v_0, .., v_{k-1}) = Σ v_i · 2^i
//! ```
//!
//! The model is immutable once built and is `Send + Sync`, so one instance
//! can serve concurrent queries.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Largest supported number of parents for one variable.
pub const MAX_PARENTS: usize = 24;

/// Errors raised while building or reading a network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("variable name must not be empty")]
    EmptyName,

    #[error("variable {name} is declared more than once")]
    DuplicateVariable { name: String },

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

    #[error("invalid probability {value} for {variable}: must be in [0, 1]")]
    InvalidProbability { variable: String, value: f64 },

    #[error("unknown variable: {name}")]
    UnknownVariable { name: String },
}

impl From<NetworkError> for dx_common::Error {
    fn from(err: NetworkError) -> Self {
        use dx_common::Error as E;
        match err {
            NetworkError::CycleOrOrdering { variable, parent } => {
                E::CycleOrOrdering { variable, parent }
            }
            NetworkError::IncompleteCpt {
                variable,
                missing,
                expected,
            } => E::IncompleteCpt {
                variable,
                missing,
                expected,
            },
            NetworkError::MalformedCpt { variable, detail } => E::MalformedCpt { variable, detail },
            NetworkError::InvalidProbability { variable, value } => E::MalformedCpt {
                variable,
                detail: format!("probability {} is outside [0, 1]", value),
            },
            NetworkError::UnknownVariable { name } => E::UnknownVariable { name },
            other @ (NetworkError::EmptyName | NetworkError::DuplicateVariable { .. }) => {
                E::Network(other.to_string())
            }
        }
    }
}

/// Index of a parent combination in a dense CPT.
pub fn combination_index(values: &[bool]) -> usize {
    values
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &v)| acc | (usize::from(v) << i))
}

/// Parent values for a combination index, in parent order.
pub fn combination_values(index: usize, arity: usize) -> Vec<bool> {
    (0..arity).map(|i| index & (1 << i) != 0).collect()
}

/// Conditional probability table: P(var = true | parent combination).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cpt {
    arity: usize,
    table: Vec<f64>,
}

impl Cpt {
    /// Table for a root variable.
    pub fn prior(variable: &str, p: f64) -> Result<Self, NetworkError> {
        Self::from_rows(variable, 0, [(Vec::new(), p)])
    }

    /// Build a table from `(parent values, p)` rows.
    ///
    /// Every one of the `2^arity` combinations must appear exactly once.
    pub fn from_rows<I>(variable: &str, arity: usize, rows: I) -> Result<Self, NetworkError>
    where
        I: IntoIterator<Item = (Vec<bool>, f64)>,
    {
        if arity > MAX_PARENTS {
            return Err(NetworkError::MalformedCpt {
                variable: variable.to_string(),
                detail: format!("{} parents exceeds the limit of {}", arity, MAX_PARENTS),
            });
        }

        let rows: Vec<(Vec<bool>, f64)> = rows.into_iter().collect();
        for (given, p) in &rows {
            if given.len() != arity {
                return Err(NetworkError::MalformedCpt {
                    variable: variable.to_string(),
                    detail: format!(
                        "row {:?} has {} values, expected {}",
                        given,
                        given.len(),
                        arity
                    ),
                });
            }
            if !p.is_finite() || !(0.0..=1.0).contains(p) {
                return Err(NetworkError::InvalidProbability {
                    variable: variable.to_string(),
                    value: *p,
                });
            }
        }

        // Row count is checked before the table is allocated.
        let expected = 1usize << arity;
        if rows.len() < expected {
            return Err(NetworkError::IncompleteCpt {
                variable: variable.to_string(),
                missing: expected - rows.len(),
                expected,
            });
        }
        if rows.len() > expected {
            return Err(NetworkError::MalformedCpt {
                variable: variable.to_string(),
                detail: format!("{} rows given, expected {}", rows.len(), expected),
            });
        }

        let mut slots: Vec<Option<f64>> = vec![None; expected];
        for (given, p) in rows {
            let slot = &mut slots[combination_index(&given)];
            if slot.is_some() {
                return Err(NetworkError::MalformedCpt {
                    variable: variable.to_string(),
                    detail: format!("row {:?} is given more than once", given),
                });
            }
            *slot = Some(p);
        }

        Ok(Cpt {
            arity,
            table: slots.into_iter().flatten().collect(),
        })
    }

    /// Number of parents.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// P(true | parents), or `None` if the tuple has the wrong arity.
    pub fn probability_true(&self, parents: &[bool]) -> Option<f64> {
        if parents.len() != self.arity {
            return None;
        }
        self.table.get(combination_index(parents)).copied()
    }

    /// P(true) at a precomputed combination index.
    #[inline]
    pub(crate) fn at(&self, index: usize) -> f64 {
        self.table[index]
    }

    /// Rows in combination-index order.
    pub fn rows(&self) -> impl Iterator<Item = (Vec<bool>, f64)> + '_ {
        self.table
            .iter()
            .enumerate()
            .map(|(i, &p)| (combination_values(i, self.arity), p))
    }
}

/// Input record for one variable: name, ordered parents, and CPT rows.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
    pub parents: Vec<String>,
    pub rows: Vec<(Vec<bool>, f64)>,
}

impl VariableDef {
    /// Root variable with prior `p`.
    pub fn root(name: impl Into<String>, p: f64) -> Self {
        VariableDef {
            name: name.into(),
            parents: Vec::new(),
            rows: vec![(Vec::new(), p)],
        }
    }

    /// Variable with parents and explicit rows.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        parents: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = (Vec<bool>, f64)>,
    ) -> Self {
        VariableDef {
            name: name.into(),
            parents: parents.into_iter().map(Into::into).collect(),
            rows: rows.into_iter().collect(),
        }
    }
}

/// A variable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    name: String,
    parents: Vec<String>,
    #[serde(skip)]
    parent_indices: Vec<usize>,
    cpt: Cpt,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub(crate) fn parent_indices(&self) -> &[usize] {
        &self.parent_indices
    }

    pub fn cpt(&self) -> &Cpt {
        &self.cpt
    }
}

/// Immutable Bayesian network.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl NetworkModel {
    /// Build a network from variables in topological order.
    pub fn new<I>(defs: I) -> Result<Self, NetworkError>
    where
        I: IntoIterator<Item = VariableDef>,
    {
        let mut variables: Vec<Variable> = Vec::new();
        let mut index = HashMap::new();

        for def in defs {
            if def.name.trim().is_empty() {
                return Err(NetworkError::EmptyName);
            }
            if index.contains_key(&def.name) {
                return Err(NetworkError::DuplicateVariable { name: def.name });
            }

            let mut seen = HashSet::new();
            let mut parent_indices = Vec::with_capacity(def.parents.len());
            for parent in &def.parents {
                // A self-reference is not yet in the index, so it lands here too.
                let idx = index.get(parent).copied().filter(|_| seen.insert(parent));
                match idx {
                    Some(i) => parent_indices.push(i),
                    None => {
                        return Err(NetworkError::CycleOrOrdering {
                            variable: def.name.clone(),
                            parent: parent.clone(),
                        })
                    }
                }
            }

            let cpt = Cpt::from_rows(&def.name, def.parents.len(), def.rows)?;
            index.insert(def.name.clone(), variables.len());
            variables.push(Variable {
                name: def.name,
                parents: def.parents,
                parent_indices,
                cpt,
            });
        }

        Ok(NetworkModel { variables, index })
    }

    /// Variable names in topological order.
    pub fn variables(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// P(name = true | parent_assignment), parents in declared order.
    pub fn probability_true(
        &self,
        name: &str,
        parent_assignment: &[bool],
    ) -> Result<f64, NetworkError> {
        let var = self
            .variable(name)
            .ok_or_else(|| NetworkError::UnknownVariable {
                name: name.to_string(),
            })?;
        var.cpt
            .probability_true(parent_assignment)
            .ok_or_else(|| NetworkError::MalformedCpt {
                variable: name.to_string(),
                detail: format!(
                    "parent assignment has {} values, expected {}",
                    parent_assignment.len(),
                    var.cpt.arity()
                ),
            })
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Arena index of a variable.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.index_of(name).map(|i| &self.variables[i])
    }

    /// Declared parents of a variable.
    pub fn parents(&self, name: &str) -> Result<&[String], NetworkError> {
        self.variable(name)
            .map(Variable::parents)
            .ok_or_else(|| NetworkError::UnknownVariable {
                name: name.to_string(),
            })
    }

    /// Variables in topological order.
    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    pub(crate) fn at(&self, index: usize) -> &Variable {
        &self.variables[index]
    }
}

impl<'a> IntoIterator for &'a NetworkModel {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}
