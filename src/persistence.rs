//! JSON snapshot format: saving and restoring a `Problem` across process
//! restarts.
//!
//! Grounded on the engine's external interfaces design (§6): a problem
//! snapshot is a JSON object keyed by `resolutionProblemID` and `variables`,
//! where each variable already serializes itself (`variable.rs`) and each
//! constraint's activation map already serializes as `{key: {value,
//! activated}}` (`activation.rs`). This module only has to own the envelope
//! around those two pieces, plus the wire shape for a `NotSatisfiable` result
//! and for `ResolverOptions`.

use crate::{
  constraint::AppliedConstraint,
  error::{ResolutionError, Result},
  ident::Identifier,
  problem::Problem,
  resolver::ResolverOptions,
  variable::Variable,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSnapshot {
  #[serde(rename = "resolutionProblemID")]
  pub resolution_problem_id: Identifier,
  pub variables: Vec<Variable>,
}

impl ProblemSnapshot {
  pub fn from_problem(id: impl Into<Identifier>, problem: &Problem) -> Self {
    ProblemSnapshot {
      resolution_problem_id: id.into(),
      variables: problem.variables().cloned().collect(),
    }
  }

  pub fn into_problem(self) -> Problem {
    let mut problem = Problem::new();
    for variable in self.variables {
      problem.add_variable(variable);
    }
    problem
  }

  pub fn to_json(&self) -> Result<String> {
    serde_json::to_string(self).map_err(|e| ResolutionError::fatal(format!("failed to serialize snapshot: {}", e)))
  }

  pub fn to_json_pretty(&self) -> Result<String> {
    serde_json::to_string_pretty(self)
      .map_err(|e| ResolutionError::fatal(format!("failed to serialize snapshot: {}", e)))
  }

  pub fn from_json(data: &str) -> Result<Self> {
    serde_json::from_str(data).map_err(|e| ResolutionError::precondition(format!("invalid snapshot: {}", e)))
  }
}

/// Wire shape for `ResolverOptions`, deserializable from the same
/// configuration surface the resolver's own options take (§4.9): the two
/// flags named in `resolver.rs`, plus a diagnostic tracing-level override
/// that only affects the search driver's own spans and never the resolver's
/// decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
  #[serde(default)]
  pub add_all_variables_to_solution: bool,
  #[serde(default)]
  pub disable_order_preference: bool,
  #[serde(default)]
  pub tracing_level: Option<String>,
}

impl Default for ResolverConfig {
  fn default() -> Self {
    ResolverConfig {
      add_all_variables_to_solution: false,
      disable_order_preference: false,
      tracing_level: None,
    }
  }
}

impl From<&ResolverConfig> for ResolverOptions {
  fn from(config: &ResolverConfig) -> Self {
    ResolverOptions {
      all_variables: config.add_all_variables_to_solution,
      disable_order_preference: config.disable_order_preference,
    }
  }
}

/// Wire shape for a `NotSatisfiable` result: the list of applied constraints
/// that make up the minimal unsat core, each carrying the variable it applies
/// to and a human-readable description built from `Constraint::describe`, the
/// way downstream tools format the solver's "no solution" report per §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotSatisfiableReport {
  pub entries: Vec<NotSatisfiableEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotSatisfiableEntry {
  pub variable: Identifier,
  pub constraint: crate::constraint::Constraint,
  pub description: String,
}

impl NotSatisfiableReport {
  pub fn from_core(core: &[AppliedConstraint]) -> Self {
    NotSatisfiableReport {
      entries: core
        .iter()
        .map(|applied| NotSatisfiableEntry {
          variable: applied.variable.clone(),
          constraint: applied.constraint.clone(),
          description: applied.constraint.describe(&applied.variable),
        })
        .collect(),
    }
  }

  pub fn to_json(&self) -> Result<String> {
    serde_json::to_string(self).map_err(|e| ResolutionError::fatal(format!("failed to serialize report: {}", e)))
  }
}
