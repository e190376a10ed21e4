//! Translates a `Problem` into a flat CNF instance the SAT engine understands,
//! and keeps the reverse mapping needed to read a solution (or an unsat core)
//! back out in terms of variable identifiers.
//!
//! Grounded on `deppy/solver/variables.go`/`deppy/solver/solve.go`: the
//! original walks the live `ResolutionProblem` twice, once to allocate a
//! literal per variable and once to emit each variable's constraint clauses.
//! Two passes are required here too, for the same reason: a constraint's
//! `apply` (e.g. a dependency clause) needs the literal of *every* variable it
//! mentions, including ones that haven't been visited yet in id order.

use crate::{
  constraint::AppliedConstraint,
  error::{ResolutionError, Result},
  ident::Identifier,
  problem::Problem,
  sat::{clause::Clause, literal::Literal},
};
use hashbrown::HashMap;

/// The bridge between a `Problem`'s variable identifiers and the SAT engine's
/// dense 0-indexed literals.
pub struct LitMap {
  index_of: HashMap<Identifier, usize>,
  id_of: Vec<Identifier>,
  clauses: Vec<Clause>,
  /// parallel to `clauses`: which applied constraint produced each clause,
  /// `None` for clauses with no single owning constraint (there are none at
  /// present, but the slot keeps the zip total if that ever changes).
  clause_owners: Vec<Option<AppliedConstraint>>,
  /// parallel to `clauses`: `(variable, constraint id)`, used only to tell
  /// apart two constraints of the same kind on the same variable when
  /// shrinking for an unsat core. `AppliedConstraint` itself carries no
  /// separate id (see the note atop `constraint.rs`), so this table is kept
  /// alongside it rather than folded in.
  clause_exclusion_keys: Vec<(Identifier, Identifier)>,
  /// identifiers of every variable owning at least one anchor constraint, in
  /// input order; computed once here so callers (the search driver) don't
  /// each re-walk every variable's constraints to find them.
  anchor_identifiers: Vec<Identifier>,
}

impl LitMap {
  /// Builds the literal map and the full clause set for `problem`. Errors if
  /// the same variable identifier is registered twice (the map is built from
  /// a plain iteration so it only sees whatever `Problem` already
  /// deduplicated; a duplicate here signals a bug upstream).
  pub fn new(problem: &Problem) -> Result<Self> {
    let mut index_of = HashMap::new();
    let mut id_of = Vec::new();
    for id in problem.variable_ids() {
      if index_of.insert(id.clone(), id_of.len()).is_some() {
        return Err(ResolutionError::DuplicateIdentifier(id.clone()));
      }
      id_of.push(id.clone());
    }

    let mut clauses = Vec::new();
    let mut clause_owners = Vec::new();
    let mut clause_exclusion_keys = Vec::new();
    let mut anchor_identifiers = Vec::new();
    // `id_of`/`index_of` may grow mid-loop as constraints mention variables
    // never registered directly (a dependency target outside the problem);
    // iterate by index over a snapshot of the ids known at loop start so new
    // ones discovered this pass still get their own clause-emission pass.
    let mut cursor = 0;
    while cursor < id_of.len() {
      let id = id_of[cursor].clone();
      cursor += 1;
      let variable = match problem.variable(&id) {
        Some(v) => v,
        None => continue, // a referenced-but-never-declared variable has no constraints of its own
      };
      if variable.constraints().iter().any(|c| c.anchor()) {
        anchor_identifiers.push(id.clone());
      }
      for (constraint_id, constraint) in variable.applied_constraints() {
        let mut lit_of = |target: &Identifier| -> Literal {
          let idx = *index_of
            .entry(target.clone())
            .or_insert_with(|| {
              id_of.push(target.clone());
              id_of.len() - 1
            });
          Literal::new(idx as u32, false)
        };
        let emitted = constraint.apply(&id, &mut lit_of);
        for clause in emitted {
          clauses.push(clause);
          clause_owners.push(Some(AppliedConstraint {
            variable: id.clone(),
            constraint: constraint.clone(),
          }));
          clause_exclusion_keys.push((id.clone(), constraint_id.clone()));
        }
      }
    }

    Ok(LitMap {
      index_of,
      id_of,
      clauses,
      clause_owners,
      clause_exclusion_keys,
      anchor_identifiers,
    })
  }

  pub fn num_vars(&self) -> usize { self.id_of.len() }

  pub fn lit_of(&self, id: &Identifier) -> Option<Literal> {
    self.index_of.get(id).map(|&idx| Literal::new(idx as u32, false))
  }

  pub fn variable_of(&self, idx: usize) -> Option<&Identifier> { self.id_of.get(idx) }

  /// Every applied constraint owned by `lit`'s variable. The gini original
  /// (`lit_mapping.go`'s `ConstraintOf`) keys this by a dedicated gate literal
  /// its logic circuit allocates per constraint, so one literal maps to
  /// exactly one constraint; this engine emits a constraint's clause(s)
  /// straight against its subject's own literal instead of through a gate,
  /// so a single literal can own more than one constraint and this returns
  /// all of them, in first-encountered order.
  pub fn constraint_of(&self, lit: Literal) -> Vec<&AppliedConstraint> {
    let var_id = match self.id_of.get(lit.var()) {
      Some(id) => id,
      None => return Vec::new(),
    };
    let mut seen = std::collections::HashSet::new();
    self
      .clause_owners
      .iter()
      .zip(self.clause_exclusion_keys.iter())
      .filter(|(_, (subject, _))| subject == var_id)
      .filter_map(|(owner, (_, constraint_id))| {
        if seen.insert(constraint_id.clone()) {
          owner.as_ref()
        } else {
          None
        }
      })
      .collect()
  }

  /// Identifiers of every variable owning at least one anchor constraint, in
  /// the order they appear in the input.
  pub fn anchor_identifiers(&self) -> &[Identifier] { &self.anchor_identifiers }

  /// Every variable literal this map allocated, in input order.
  pub fn lits(&self) -> Vec<Literal> {
    (0..self.id_of.len()).map(|idx| Literal::new(idx as u32, false)).collect()
  }

  pub fn clauses(&self) -> &[Clause] { &self.clauses }

  pub fn clause_owner(&self, clause_idx: usize) -> Option<&AppliedConstraint> {
    self.clause_owners.get(clause_idx).and_then(|o| o.as_ref())
  }

  /// Every identifier this map knows a literal for, including variables
  /// mentioned only as a dependency/conflict/at-most target and never
  /// registered directly in the problem.
  pub fn identifiers(&self) -> &[Identifier] { &self.id_of }

  /// Parallel to `clauses()`: the `(variable, constraint id)` that owns each
  /// clause, for callers that want to filter the clause list by an arbitrary
  /// subset of keys (the unsat-core shrink does this once per trial).
  pub fn exclusion_keys_per_clause(&self) -> &[(Identifier, Identifier)] { &self.clause_exclusion_keys }

  /// Every distinct `(variable, constraint id)` that owns at least one
  /// clause, in the order first encountered. The deletion-based unsat-core
  /// shrink in `driver.rs` walks this list one entry at a time.
  pub fn exclusion_keys(&self) -> Vec<(Identifier, Identifier)> {
    let mut seen = Vec::new();
    for key in &self.clause_exclusion_keys {
      if !seen.contains(key) {
        seen.push(key.clone());
      }
    }
    seen
  }

  /// Clauses excluding every one owned by `key`, used by the deletion-based
  /// unsat-core shrink: re-solving without a candidate constraint's clauses
  /// tells the shrink pass whether that constraint was load-bearing.
  pub fn clauses_excluding(&self, key: &(Identifier, Identifier)) -> Vec<Clause> {
    self
      .clauses
      .iter()
      .zip(self.clause_exclusion_keys.iter())
      .filter(|(_, owner_key)| *owner_key != key)
      .map(|(c, _)| c.clone())
      .collect()
  }

  /// The `AppliedConstraint` for a given exclusion key, used to build the
  /// `NotSatisfiable` result.
  pub fn applied_constraint_for(&self, key: &(Identifier, Identifier)) -> Option<&AppliedConstraint> {
    self
      .clause_exclusion_keys
      .iter()
      .position(|k| k == key)
      .and_then(|idx| self.clause_owners[idx].as_ref())
  }
}
