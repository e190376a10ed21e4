//! The resolution problem: an activation-keyed collection of variables.
//!
//! Grounded on `deppy/resolution/mutable.go` (`MutableResolutionProblem`),
//! collapsed into one struct for the same reason `Variable` is (see
//! `variable.rs`): Rust's `&`/`&mut` split already gives read/write
//! separation without a second trait. The backing store is itself an
//! `ActivationMap<Identifier, Variable>`, matching `mutable.go`'s
//! `utils.ActivationMap[Identifier, MutableVariable]` field, so that
//! deactivating a variable (rather than just its constraints) is something
//! the problem can represent directly.

use crate::{
  activation::ActivationMap,
  error::{ResolutionError, Result},
  ident::Identifier,
  variable::Variable,
};

#[derive(Debug, Clone, Default)]
pub struct Problem {
  variables: ActivationMap<Identifier, Variable>,
}

impl Problem {
  pub fn new() -> Self { Self::default() }

  /// Registers `variable`, replacing any existing entry for the same id and
  /// activating it. Callers that want write-once merge semantics across
  /// multiple sources should go through `merge_variable` or
  /// `activate_variable` instead (see `builder.rs`).
  pub fn add_variable(&mut self, variable: Variable) {
    self.variables.put(variable.identifier().clone(), variable);
  }

  /// Merges `variable` into the existing entry for its id, or inserts it
  /// fresh if this is the first time the id has been seen. A fresh insert or
  /// a successful merge both count as a change for the builder's fixed-point
  /// queue; the only way this returns an error is a merge conflict, which the
  /// builder treats separately from "no change".
  pub fn merge_variable(&mut self, variable: Variable) -> Result<()> {
    let id = variable.identifier().clone();
    match self.variables.get_mut(&id) {
      Some(existing) => existing.merge(&variable),
      None => {
        self.variables.put(id, variable);
        Ok(())
      }
    }
  }

  /// Returns the variable registered for `id` if it exists and is of kind
  /// `kind`; otherwise creates, registers, and returns a fresh variable of
  /// that kind. *Conflict* error on a kind mismatch against an existing entry.
  pub fn get_variable(&mut self, id: &Identifier, kind: &str) -> Result<&Variable> {
    match self.variables.get(id) {
      Some(existing) if existing.kind() != kind => {
        return Err(ResolutionError::conflict(format!(
          "variable {} is not of kind {}",
          id, kind
        )));
      }
      Some(_) => {}
      None => self.variables.put(id.clone(), Variable::new(id.clone(), kind)),
    }
    Ok(self.variables.get(id).unwrap())
  }

  /// Merges `v` into the existing entry for its id (asserting a matching
  /// kind) or inserts it fresh if the id is new, then activates it either
  /// way.
  pub fn activate_variable(&mut self, v: Variable) -> Result<()> {
    let id = v.identifier().clone();
    match self.variables.get_mut(&id) {
      Some(existing) => existing.merge(&v)?,
      None => self.variables.put(id.clone(), v),
    }
    self.variables.activate(&id);
    Ok(())
  }

  /// Deactivates the variable registered for `id`. If it was never
  /// registered, a deactivated placeholder of `kind` is created first, so
  /// that a later `activate_variable`/`get_variable` for the same id stays
  /// commutative. *Conflict* error on a kind mismatch against an existing
  /// entry.
  pub fn deactivate_variable(&mut self, id: &Identifier, kind: &str) -> Result<()> {
    match self.variables.get(id) {
      Some(existing) if existing.kind() != kind => {
        return Err(ResolutionError::conflict(format!(
          "variable {} is not of kind {}",
          id, kind
        )));
      }
      Some(_) => {}
      None => self.variables.put(id.clone(), Variable::new(id.clone(), kind)),
    }
    self.variables.deactivate(id);
    Ok(())
  }

  /// A read-only lookup by id, with no kind check and no side effects: used
  /// by callers (the lit-mapper, the search driver, the resolver facade)
  /// that already know an id came from `variable_ids()`/`variables()` and
  /// just want the record back.
  pub fn variable(&self, id: &Identifier) -> Option<&Variable> { self.variables.get(id) }

  pub fn has_variable(&self, id: &Identifier) -> bool { self.variables.has(id) }

  /// Active variable identifiers, in first-activation order.
  pub fn variable_ids(&self) -> impl Iterator<Item = &Identifier> {
    self.variables.active_entries().map(|(id, _)| id)
  }

  /// Active variables, in first-activation order.
  pub fn variables(&self) -> impl Iterator<Item = &Variable> { self.variables.elements() }

  pub fn len(&self) -> usize { self.variables.len() }

  pub fn is_empty(&self) -> bool { self.variables.is_empty() }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn unregistered_variable_is_absent() {
    let problem = Problem::new();
    assert!(problem.variable(&Identifier::from("ghost")).is_none());
  }

  #[test]
  fn add_variable_preserves_first_registration_order() {
    let mut problem = Problem::new();
    problem.add_variable(Variable::new("b", "package"));
    problem.add_variable(Variable::new("a", "package"));
    let ids: Vec<_> = problem.variable_ids().cloned().collect();
    assert_eq!(ids, vec![Identifier::from("b"), Identifier::from("a")]);
  }

  #[test]
  fn merge_variable_combines_constraints_on_repeat_id() {
    let mut problem = Problem::new();
    let mut first = Variable::new("a", "package");
    first.add_mandatory("anchor").unwrap();
    problem.add_variable(first);

    let mut second = Variable::new("a", "package");
    second.add_prohibited("ban").unwrap();
    problem.merge_variable(second).unwrap();

    let v = problem.variable(&Identifier::from("a")).unwrap();
    assert_eq!(v.constraints().len(), 2);
  }

  #[test]
  fn merge_variable_rejects_kind_mismatch() {
    let mut problem = Problem::new();
    problem.add_variable(Variable::new("a", "package"));
    assert!(problem.merge_variable(Variable::new("a", "feature")).is_err());
  }

  #[test]
  fn get_variable_creates_and_registers_a_placeholder_on_miss() {
    let mut problem = Problem::new();
    let v = problem.get_variable(&Identifier::from("a"), "package").unwrap();
    assert_eq!(v.kind(), "package");
    assert!(problem.has_variable(&Identifier::from("a")));
  }

  #[test]
  fn get_variable_rejects_kind_mismatch_against_existing_entry() {
    let mut problem = Problem::new();
    problem.add_variable(Variable::new("a", "package"));
    assert!(problem.get_variable(&Identifier::from("a"), "feature").is_err());
  }

  #[test]
  fn activate_variable_inserts_a_fresh_id() {
    let mut problem = Problem::new();
    let mut a = Variable::new("a", "package");
    a.add_mandatory("anchor").unwrap();
    problem.activate_variable(a).unwrap();
    assert!(problem.variable_ids().any(|id| id == &Identifier::from("a")));
  }

  #[test]
  fn activate_variable_merges_into_an_existing_id() {
    let mut problem = Problem::new();
    let mut first = Variable::new("a", "package");
    first.add_mandatory("anchor").unwrap();
    problem.add_variable(first);

    let mut second = Variable::new("a", "package");
    second.add_prohibited("ban").unwrap();
    problem.activate_variable(second).unwrap();

    assert_eq!(problem.variable(&Identifier::from("a")).unwrap().constraints().len(), 2);
  }

  #[test]
  fn deactivate_variable_removes_it_from_the_active_list() {
    let mut problem = Problem::new();
    problem.add_variable(Variable::new("a", "package"));
    problem.deactivate_variable(&Identifier::from("a"), "package").unwrap();
    assert!(!problem.variable_ids().any(|id| id == &Identifier::from("a")));
  }

  #[test]
  fn deactivate_variable_on_an_unregistered_id_creates_an_inactive_placeholder() {
    let mut problem = Problem::new();
    problem.deactivate_variable(&Identifier::from("ghost"), "package").unwrap();
    assert!(problem.variable(&Identifier::from("ghost")).is_some());
    assert!(!problem.variable_ids().any(|id| id == &Identifier::from("ghost")));
  }

  #[test]
  fn reactivating_a_deactivated_variable_restores_it() {
    let mut problem = Problem::new();
    problem.add_variable(Variable::new("a", "package"));
    problem.deactivate_variable(&Identifier::from("a"), "package").unwrap();
    problem.activate_variable(Variable::new("a", "package")).unwrap();
    assert!(problem.variable_ids().any(|id| id == &Identifier::from("a")));
  }
}
