//! A variable: identity, free-form kind, a property bag, and an
//! activation-keyed map of constraints.
//!
//! Grounded on `deppy/variables/mutable_variable.go`. The original splits
//! `Variable` (read) from `MutableVariable` (read + write) into two
//! interfaces purely because Go has no borrow checker; in Rust, `&Variable`
//! versus `&mut Variable` already gives the same separation for free, so both
//! collapse into this one struct (see DESIGN.md's Open Questions).

use crate::{
  activation::ActivationMap,
  constraint::Constraint,
  error::{ResolutionError, Result},
  ident::Identifier,
  value::{Properties, Value},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
  #[serde(rename = "variableID")]
  id: Identifier,
  kind: String,
  properties: Properties,
  constraints: ActivationMap<Identifier, Constraint>,
}

// `ActivationMap::activate`/`deactivate` require `V: Default` so they can
// materialize a placeholder entry the first time an id is touched (see
// `activation.rs`). `Problem` always `put`s a real variable before ever
// activating or deactivating one by id, so this placeholder never actually
// surfaces; it only needs to exist to satisfy the bound.
impl Default for Variable {
  fn default() -> Self { Variable::new(Identifier::from(""), "") }
}

impl Variable {
  pub fn new(id: impl Into<Identifier>, kind: impl Into<String>) -> Self {
    Variable {
      id: id.into(),
      kind: kind.into(),
      properties: Properties::new(),
      constraints: ActivationMap::new(),
    }
  }

  pub fn identifier(&self) -> &Identifier { &self.id }

  pub fn kind(&self) -> &str { &self.kind }

  pub fn properties(&self) -> &Properties { &self.properties }

  pub fn get_property(&self, key: &str) -> Option<&Value> { self.properties.get(key) }

  pub fn set_property(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
    let key = key.into();
    match self.properties.get(&key) {
      Some(existing) if *existing == value => Ok(()),
      Some(existing) => Err(ResolutionError::conflict(format!(
        "merge conflict: property {} already set to {}",
        key, existing
      ))),
      None => {
        self.properties.insert(key, value);
        Ok(())
      }
    }
  }

  pub fn get_constraint(&self, constraint_id: &Identifier) -> Option<&Constraint> {
    self.constraints.get(constraint_id)
  }

  pub fn has_constraint(&self, constraint_id: &Identifier) -> bool { self.constraints.has(constraint_id) }

  pub fn constraint_ids(&self) -> impl Iterator<Item = &Identifier> { self.constraints.keys() }

  pub fn is_activated(&self, constraint_id: &Identifier) -> Result<bool> {
    self.constraints.is_activated(constraint_id)
  }

  /// Active constraints, in first-activation order.
  pub fn constraints(&self) -> Vec<&Constraint> { self.constraints.elements().collect() }

  /// Active (id, constraint) pairs, in first-activation order.
  pub fn applied_constraints(&self) -> Vec<(&Identifier, &Constraint)> {
    self.constraints.active_entries().collect()
  }

  fn expect_kind(&self, kind: &str, new_kind: &str) -> Result<()> {
    if kind != new_kind {
      return Err(ResolutionError::fatal(format!(
        "constraint with a different kind already registered ({} != {})",
        kind, new_kind
      )));
    }
    Ok(())
  }

  fn ensure_constraint(&mut self, constraint_id: &Identifier, default: Constraint) -> Result<()> {
    if let Some(existing) = self.constraints.get(constraint_id) {
      self.expect_kind(existing.kind(), default.kind())?;
    } else {
      self.constraints.put(constraint_id.clone(), default);
    }
    Ok(())
  }

  pub fn add_mandatory(&mut self, constraint_id: impl Into<Identifier>) -> Result<()> {
    let cid = constraint_id.into();
    self.ensure_constraint(&cid, Constraint::mandatory())?;
    self.constraints.activate(&cid);
    Ok(())
  }

  pub fn remove_mandatory(&mut self, constraint_id: impl Into<Identifier>) -> Result<()> {
    let cid = constraint_id.into();
    self.ensure_constraint(&cid, Constraint::mandatory())?;
    self.constraints.deactivate(&cid);
    Ok(())
  }

  pub fn add_prohibited(&mut self, constraint_id: impl Into<Identifier>) -> Result<()> {
    let cid = constraint_id.into();
    self.ensure_constraint(&cid, Constraint::prohibited())?;
    self.constraints.activate(&cid);
    Ok(())
  }

  pub fn remove_prohibited(&mut self, constraint_id: impl Into<Identifier>) -> Result<()> {
    let cid = constraint_id.into();
    self.ensure_constraint(&cid, Constraint::prohibited())?;
    self.constraints.deactivate(&cid);
    Ok(())
  }

  pub fn add_conflict(
    &mut self,
    constraint_id: impl Into<Identifier>,
    other: impl Into<Identifier>,
  ) -> Result<()> {
    let cid = constraint_id.into();
    self.ensure_constraint(&cid, Constraint::conflict_unset())?;
    self
      .constraints
      .get_mut(&cid)
      .unwrap()
      .set_conflicting_variable_id(other.into())?;
    self.constraints.activate(&cid);
    Ok(())
  }

  pub fn remove_conflict(&mut self, constraint_id: impl Into<Identifier>) -> Result<()> {
    let cid = constraint_id.into();
    self.ensure_constraint(&cid, Constraint::conflict_unset())?;
    self.constraints.deactivate(&cid);
    Ok(())
  }

  pub fn add_dependency(
    &mut self,
    constraint_id: impl Into<Identifier>,
    members: impl IntoIterator<Item = Identifier>,
  ) -> Result<()> {
    let cid = constraint_id.into();
    let members: Vec<Identifier> = members.into_iter().collect();
    self.ensure_constraint(&cid, Constraint::dependency(vec![]))?;
    if let Constraint::Dependency(_, payload) = self.constraints.get_mut(&cid).unwrap() {
      for m in &members {
        payload.members.add(m.clone());
        payload.members.activate(m);
      }
    }
    self.constraints.activate(&cid);
    Ok(())
  }

  pub fn remove_dependency(
    &mut self,
    constraint_id: impl Into<Identifier>,
    members: impl IntoIterator<Item = Identifier>,
  ) -> Result<()> {
    let cid = constraint_id.into();
    let members: Vec<Identifier> = members.into_iter().collect();
    self.ensure_constraint(&cid, Constraint::dependency(vec![]))?;
    if members.is_empty() {
      self.constraints.deactivate(&cid);
    } else if let Constraint::Dependency(_, payload) = self.constraints.get_mut(&cid).unwrap() {
      for m in &members {
        payload.members.deactivate(m);
      }
    }
    Ok(())
  }

  pub fn add_at_most(
    &mut self,
    constraint_id: impl Into<Identifier>,
    n: u32,
    members: impl IntoIterator<Item = Identifier>,
  ) -> Result<()> {
    let cid = constraint_id.into();
    let members: Vec<Identifier> = members.into_iter().collect();
    self.ensure_constraint(&cid, Constraint::at_most(None, vec![]))?;
    {
      let c = self.constraints.get_mut(&cid).unwrap();
      c.set_n(n)?;
      if let Constraint::AtMost(_, payload) = c {
        for m in &members {
          payload.members.add(m.clone());
          payload.members.activate(m);
        }
      }
    }
    self.constraints.activate(&cid);
    Ok(())
  }

  pub fn remove_at_most(
    &mut self,
    constraint_id: impl Into<Identifier>,
    members: impl IntoIterator<Item = Identifier>,
  ) -> Result<()> {
    let cid = constraint_id.into();
    let members: Vec<Identifier> = members.into_iter().collect();
    self.ensure_constraint(&cid, Constraint::at_most(None, vec![]))?;
    if members.is_empty() {
      self.constraints.deactivate(&cid);
    } else if let Constraint::AtMost(_, payload) = self.constraints.get_mut(&cid).unwrap() {
      for m in &members {
        payload.members.deactivate(m);
      }
    }
    Ok(())
  }

  pub fn set_at_most_n(&mut self, constraint_id: impl Into<Identifier>, n: u32) -> Result<()> {
    let cid = constraint_id.into();
    self.ensure_constraint(&cid, Constraint::at_most(None, vec![]))?;
    self.constraints.get_mut(&cid).unwrap().set_n(n)
  }

  /// Merges `other` into `self`: kinds must match, properties merge
  /// write-once, and each of `other`'s constraints is inserted (preserving
  /// its activation state) or merged into the matching existing one.
  pub fn merge(&mut self, other: &Variable) -> Result<()> {
    if self.kind != other.kind {
      return Err(ResolutionError::conflict(format!(
        "variable {} is not of kind {}",
        other.id, self.kind
      )));
    }
    for (key, value) in &other.properties {
      self.set_property(key.clone(), value.clone())?;
    }
    for cid in other.constraints.keys() {
      let oc = other.constraints.get(cid).unwrap();
      if !self.constraints.has(cid) {
        self.constraints.put(cid.clone(), oc.clone());
        if !other.constraints.is_activated(cid).unwrap_or(false) {
          self.constraints.deactivate(cid);
        }
      } else {
        self.constraints.get_mut(cid).unwrap().merge(oc)?;
        if other.constraints.is_activated(cid).unwrap_or(false) {
          self.constraints.activate(cid);
        }
      }
    }
    Ok(())
  }
}
