//! Wires a `Problem` to the SAT engine: builds the decision-order bias,
//! runs the search, and on failure shrinks the failing clause set down to a
//! minimal unsatisfiable core.
//!
//! Grounded on `deppy/solver/lit_mapping.go`'s `AnchorIdentifiers`/`Lits` (the
//! decision-order bias is built the same way: anchors in input order, walking
//! each anchor's constraints for an `Order()` hint) and `deppy/solver/solve_test.go`'s
//! sort rule for a `NotSatisfiable` result's tie-break.

use crate::{
  constraint::AppliedConstraint,
  error::{ResolutionError, Result},
  ident::Identifier,
  litmap::LitMap,
  problem::Problem,
  sat,
};

pub struct SolveOptions {
  pub disable_order_preference: bool,
}

impl Default for SolveOptions {
  fn default() -> Self {
    SolveOptions {
      disable_order_preference: false,
    }
  }
}

/// The outcome of a successful search: every variable the engine considered,
/// alongside whether it ended up selected.
pub struct Outcome {
  pub selected: Vec<Identifier>,
}

/// Builds the decision-order bias: each anchored variable, in input order,
/// followed by the `order()` hints of its own active constraints, walked in
/// the constraints' first-activation order. A hinted identifier earns a
/// "prefer selected" bias the first time it's seen; later repeats are no-ops.
fn decision_order(problem: &Problem, map: &LitMap) -> Vec<usize> {
  let mut order = Vec::new();
  let mut seen = std::collections::HashSet::new();
  for id in map.anchor_identifiers() {
    let variable = match problem.variable(id) {
      Some(v) => v,
      None => continue,
    };
    for constraint in variable.constraints() {
      for hint in constraint.order() {
        if seen.insert(hint.clone()) {
          if let Some(lit) = map.lit_of(&hint) {
            order.push(lit.var());
          }
        }
      }
    }
  }
  order
}

/// Solves `problem`, returning the identifiers whose literal evaluates true,
/// or a `ResolutionError::NotSatisfiable` carrying a subset-minimal unsat
/// core if no assignment exists.
pub fn solve(problem: &Problem, options: &SolveOptions) -> Result<Outcome> {
  let map = LitMap::new(problem)?;
  let order = if options.disable_order_preference {
    Vec::new()
  } else {
    decision_order(problem, &map)
  };

  match sat::solver::solve(map.num_vars(), map.clauses().to_vec(), order) {
    Some(assignment) => {
      let selected = map
        .identifiers()
        .iter()
        .enumerate()
        .filter(|(idx, _)| assignment[*idx])
        .map(|(_, id)| id.clone())
        .collect();
      Ok(Outcome { selected })
    }
    None => Err(ResolutionError::NotSatisfiable(shrink_to_core(&map))),
  }
}

/// Deletion-based shrink: drop one applied constraint's clauses at a time and
/// re-solve; if the reduced set is still unsatisfiable the dropped constraint
/// wasn't needed and stays out, otherwise it's put back. What survives a full
/// pass over every candidate is a subset-minimal unsatisfiable core (not
/// necessarily the smallest one, since order of removal isn't optimized, but
/// every member is individually necessary).
fn shrink_to_core(map: &LitMap) -> Vec<AppliedConstraint> {
  let mut remaining: Vec<(Identifier, Identifier)> = map.exclusion_keys();
  let mut idx = 0;
  while idx < remaining.len() {
    let candidate = remaining[idx].clone();
    let mut trial = remaining.clone();
    trial.remove(idx);
    let clauses = clauses_for(map, &trial);
    if sat::solver::solve(map.num_vars(), clauses, Vec::new()).is_none() {
      remaining = trial;
      // don't advance idx: the next element has shifted into this slot
    } else {
      idx += 1;
    }
    let _ = candidate;
  }
  remaining
    .iter()
    .filter_map(|key| map.applied_constraint_for(key).cloned())
    .collect()
}

fn clauses_for(map: &LitMap, keys: &[(Identifier, Identifier)]) -> Vec<sat::clause::Clause> {
  let keyset: std::collections::HashSet<_> = keys.iter().cloned().collect();
  map
    .clauses()
    .iter()
    .zip(map.exclusion_keys_per_clause())
    .filter(|(_, key)| keyset.contains(key))
    .map(|(c, _)| c.clone())
    .collect()
}
