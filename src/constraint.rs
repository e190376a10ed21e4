//! The constraint taxonomy: five concrete kinds, each a pure clause emitter.
//!
//! Grounded on `deppy/constraints/constraints.go` and `mutable_constraint.go`.
//! One deliberate divergence, flagged as a design note in the engine's own
//! ambiguous/buggy-behavior review: the Go original gives every constraint its
//! own `ConstraintID()`, but identity is only ever consumed through the
//! variable's activation map of constraints keyed by that same id — so this
//! port drops the redundant field and lets the map key be the sole source of
//! identity.

use crate::{
  activation::ActivationSet,
  error::{ResolutionError, Result},
  ident::Identifier,
  sat::{clause::Clause, literal::Literal},
  value::{Properties, Value},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConflictPayload {
  pub other: Option<Identifier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyPayload {
  pub members: ActivationSet<Identifier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtMostPayload {
  pub n: Option<u32>,
  pub members: ActivationSet<Identifier>,
}

/// Shared behavior across all constraint kinds: what it does to the subject
/// variable's literal, plus a free-form property bag.
#[derive(Debug, Clone)]
pub enum Constraint {
  Mandatory(Properties),
  Prohibited(Properties),
  Conflict(Properties, ConflictPayload),
  Dependency(Properties, DependencyPayload),
  AtMost(Properties, AtMostPayload),
}

// The wire shape (`{kind, properties, ...kind-specific fields}`) doesn't
// match the enum's natural serde representation, so this is hand-written
// via an intermediate struct rather than derived, the same call made for the
// activation containers in `activation.rs`.
#[derive(Serialize, Deserialize)]
struct WireConstraint {
  kind: String,
  properties: Properties,
  #[serde(rename = "conflictVariableID", default, skip_serializing_if = "Option::is_none")]
  conflict_variable_id: Option<Identifier>,
  #[serde(rename = "dependencyIDs", default, skip_serializing_if = "Option::is_none")]
  dependency_ids: Option<ActivationSet<Identifier>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  variables: Option<ActivationSet<Identifier>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  n: Option<u32>,
}

impl Serialize for Constraint {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let wire = match self {
      Constraint::Mandatory(p) => WireConstraint {
        kind: "mandatory".to_string(),
        properties: p.clone(),
        conflict_variable_id: None,
        dependency_ids: None,
        variables: None,
        n: None,
      },
      Constraint::Prohibited(p) => WireConstraint {
        kind: "prohibited".to_string(),
        properties: p.clone(),
        conflict_variable_id: None,
        dependency_ids: None,
        variables: None,
        n: None,
      },
      Constraint::Conflict(p, c) => WireConstraint {
        kind: "conflict".to_string(),
        properties: p.clone(),
        conflict_variable_id: c.other.clone(),
        dependency_ids: None,
        variables: None,
        n: None,
      },
      Constraint::Dependency(p, d) => WireConstraint {
        kind: "dependency".to_string(),
        properties: p.clone(),
        conflict_variable_id: None,
        dependency_ids: Some(d.members.clone()),
        variables: None,
        n: None,
      },
      Constraint::AtMost(p, a) => WireConstraint {
        kind: "at-most".to_string(),
        properties: p.clone(),
        conflict_variable_id: None,
        dependency_ids: None,
        variables: Some(a.members.clone()),
        n: a.n,
      },
    };
    wire.serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for Constraint {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let wire = WireConstraint::deserialize(deserializer)?;
    Ok(match wire.kind.as_str() {
      "mandatory" => Constraint::Mandatory(wire.properties),
      "prohibited" => Constraint::Prohibited(wire.properties),
      "conflict" => Constraint::Conflict(wire.properties, ConflictPayload {
        other: wire.conflict_variable_id,
      }),
      "dependency" => Constraint::Dependency(wire.properties, DependencyPayload {
        members: wire.dependency_ids.unwrap_or_default(),
      }),
      "at-most" => Constraint::AtMost(wire.properties, AtMostPayload {
        n: wire.n,
        members: wire.variables.unwrap_or_default(),
      }),
      other => {
        return Err(serde::de::Error::custom(format!("unknown constraint kind {}", other)));
      }
    })
  }
}

// `ActivationMap::activate`/`deactivate` require `V: Default` so they can
// materialize a placeholder entry the first time an id is touched (see
// `activation.rs`). Every call site in this crate `put`s a real value before
// ever activating, so the placeholder never actually surfaces; it only needs
// to exist to satisfy the bound.
impl Default for Constraint {
  fn default() -> Self { Constraint::Prohibited(Properties::new()) }
}

impl Constraint {
  pub fn mandatory() -> Self { Constraint::Mandatory(Properties::new()) }

  pub fn prohibited() -> Self { Constraint::Prohibited(Properties::new()) }

  pub fn conflict(other: impl Into<Identifier>) -> Self {
    Constraint::Conflict(Properties::new(), ConflictPayload {
      other: Some(other.into()),
    })
  }

  pub fn conflict_unset() -> Self {
    Constraint::Conflict(Properties::new(), ConflictPayload::default())
  }

  pub fn dependency(members: impl IntoIterator<Item = Identifier>) -> Self {
    let mut set = ActivationSet::new();
    for m in members {
      set.add(m);
    }
    Constraint::Dependency(Properties::new(), DependencyPayload { members: set })
  }

  pub fn at_most(n: Option<u32>, members: impl IntoIterator<Item = Identifier>) -> Self {
    let mut set = ActivationSet::new();
    for m in members {
      set.add(m);
    }
    Constraint::AtMost(Properties::new(), AtMostPayload { n, members: set })
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Constraint::Mandatory(_) => "mandatory",
      Constraint::Prohibited(_) => "prohibited",
      Constraint::Conflict(..) => "conflict",
      Constraint::Dependency(..) => "dependency",
      Constraint::AtMost(..) => "at-most",
    }
  }

  pub fn properties(&self) -> &Properties {
    match self {
      Constraint::Mandatory(p)
      | Constraint::Prohibited(p)
      | Constraint::Conflict(p, _)
      | Constraint::Dependency(p, _)
      | Constraint::AtMost(p, _) => p,
    }
  }

  fn properties_mut(&mut self) -> &mut Properties {
    match self {
      Constraint::Mandatory(p)
      | Constraint::Prohibited(p)
      | Constraint::Conflict(p, _)
      | Constraint::Dependency(p, _)
      | Constraint::AtMost(p, _) => p,
    }
  }

  /// Only the mandatory constraint anchors its variable: it is what forces
  /// the search driver to give the variable a literal worth deciding on at
  /// all (§4.2/§4.7).
  pub fn anchor(&self) -> bool { matches!(self, Constraint::Mandatory(_)) }

  /// Activated dependency members, in first-activation order; empty for every
  /// other kind. Used by the search driver to build its decision-order bias.
  pub fn order(&self) -> Vec<Identifier> {
    match self {
      Constraint::Dependency(_, d) => d.members.elements().cloned().collect(),
      _ => Vec::new(),
    }
  }

  pub fn set_property(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
    let key = key.into();
    let props = self.properties_mut();
    match props.get(&key) {
      Some(existing) if *existing == value => Ok(()),
      Some(existing) => Err(ResolutionError::conflict(format!(
        "merge conflict: property {} already set to {}",
        key, existing
      ))),
      None => {
        props.insert(key, value);
        Ok(())
      }
    }
  }

  /// Sets the conflicting variable id, write-once: a second call is a no-op
  /// if it names the same variable, a conflict error otherwise.
  pub fn set_conflicting_variable_id(&mut self, other: Identifier) -> Result<()> {
    match self {
      Constraint::Conflict(_, payload) => match &payload.other {
        Some(existing) if *existing == other => Ok(()),
        Some(existing) => Err(ResolutionError::conflict(format!(
          "conflict constraint already targets {}, cannot retarget to {}",
          existing, other
        ))),
        None => {
          payload.other = Some(other);
          Ok(())
        }
      },
      _ => Err(ResolutionError::fatal("not a conflict constraint")),
    }
  }

  /// Sets N, write-once once set to a non-negative value.
  pub fn set_n(&mut self, n: u32) -> Result<()> {
    match self {
      Constraint::AtMost(_, payload) => match payload.n {
        Some(existing) if existing == n => Ok(()),
        Some(existing) => Err(ResolutionError::conflict(format!(
          "at-most constraint already set to N={}, cannot change to N={}",
          existing, n
        ))),
        None => {
          payload.n = Some(n);
          Ok(())
        }
      },
      _ => Err(ResolutionError::fatal("not an at-most constraint")),
    }
  }

  /// Human-readable description of this constraint applied to `subject`,
  /// mirroring `Constraint.String(subject)` in the original.
  pub fn describe(&self, subject: &Identifier) -> String {
    match self {
      Constraint::Mandatory(_) => format!("{} is mandatory", subject),
      Constraint::Prohibited(_) => format!("{} is prohibited", subject),
      Constraint::Conflict(_, c) => match &c.other {
        Some(other) => format!("{} conflicts with {}", subject, other),
        None => format!("{} conflicts with <unset>", subject),
      },
      Constraint::Dependency(_, d) => {
        let members: Vec<_> = d.members.elements().map(|i| i.to_string()).collect();
        if members.is_empty() {
          format!("{} has a dependency without candidates", subject)
        } else {
          format!("{} requires at least one of {}", subject, members.join(", "))
        }
      }
      Constraint::AtMost(_, a) => {
        let members: Vec<_> = a.members.elements().map(|i| i.to_string()).collect();
        format!(
          "{} allows at most {} of {}",
          subject,
          a.n.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string()),
          members.join(", ")
        )
      }
    }
  }

  /// Emits this constraint's hard clause(s) for `subject`, given a literal
  /// lookup. Dependency with an empty activated set degenerates to the
  /// prohibited clause (§4.2). An at-most constraint with unset N, or a
  /// conflict constraint with no target set yet, emits nothing: there isn't
  /// enough information to encode it, which mirrors the original returning
  /// `z.LitNull` for those cases.
  pub fn apply(&self, subject: &Identifier, lit_of: &mut dyn FnMut(&Identifier) -> Literal) -> Vec<Clause> {
    match self {
      Constraint::Mandatory(_) => vec![Clause::from(vec![lit_of(subject)])],
      Constraint::Prohibited(_) => vec![Clause::from(vec![!lit_of(subject)])],
      Constraint::Conflict(_, c) => match &c.other {
        None => vec![],
        Some(other) => vec![Clause::from(vec![!lit_of(subject), !lit_of(other)])],
      },
      Constraint::Dependency(_, d) => {
        let members: Vec<Identifier> = d.members.elements().cloned().collect();
        let mut lits = vec![!lit_of(subject)];
        lits.extend(members.iter().map(|m| lit_of(m)));
        vec![Clause::from(lits)]
      }
      Constraint::AtMost(_, a) => {
        let n = match a.n {
          None => return vec![],
          Some(n) => n as usize,
        };
        let members: Vec<Identifier> = a.members.elements().cloned().collect();
        if n >= members.len() {
          return vec![];
        }
        let member_lits: Vec<Literal> = members.iter().map(|m| lit_of(m)).collect();
        combinations(&member_lits, n + 1)
          .into_iter()
          .map(|combo| Clause::from(combo.into_iter().map(|l| !l).collect()))
          .collect()
      }
    }
  }

  /// Merges `other` into `self`: properties merge key-by-key (write-once),
  /// kind-specific payloads merge according to §4.2. Merging across kinds is
  /// always a conflict.
  pub fn merge(&mut self, other: &Constraint) -> Result<()> {
    if self.kind() != other.kind() {
      return Err(ResolutionError::conflict(format!(
        "cannot merge {} constraint with {} constraint",
        self.kind(),
        other.kind()
      )));
    }
    for (key, value) in other.properties() {
      self.set_property(key.clone(), value.clone())?;
    }
    match (self, other) {
      (Constraint::Conflict(_, lhs), Constraint::Conflict(_, rhs)) => {
        if let Some(other_id) = &rhs.other {
          match &lhs.other {
            Some(existing) if existing == other_id => {}
            Some(existing) => {
              return Err(ResolutionError::conflict(format!(
                "conflict constraint already targets {}, cannot merge with one targeting {}",
                existing, other_id
              )));
            }
            None => lhs.other = Some(other_id.clone()),
          }
        }
      }
      (Constraint::Dependency(_, lhs), Constraint::Dependency(_, rhs)) => {
        lhs.members.merge(&rhs.members);
      }
      (Constraint::AtMost(_, lhs), Constraint::AtMost(_, rhs)) => {
        if let Some(rhs_n) = rhs.n {
          match lhs.n {
            Some(existing) if existing == rhs_n => {}
            Some(existing) => {
              return Err(ResolutionError::conflict(format!(
                "at-most constraint already set to N={}, cannot merge with N={}",
                existing, rhs_n
              )));
            }
            None => lhs.n = Some(rhs_n),
          }
        }
        lhs.members.merge(&rhs.members);
      }
      _ => {}
    }
    Ok(())
  }
}

/// All `(k+1)`-element subsets of `items`, used to build the naive at-most
/// cardinality encoding. `k` here is the caller's `n + 1`.
fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
  if k == 0 || k > items.len() {
    return vec![];
  }
  let mut result = Vec::new();
  let mut chosen = Vec::with_capacity(k);
  combinations_helper(items, k, 0, &mut chosen, &mut result);
  result
}

fn combinations_helper<T: Clone>(
  items: &[T],
  k: usize,
  start: usize,
  chosen: &mut Vec<T>,
  result: &mut Vec<Vec<T>>,
) {
  if chosen.len() == k {
    result.push(chosen.clone());
    return;
  }
  for i in start..items.len() {
    chosen.push(items[i].clone());
    combinations_helper(items, k, i + 1, chosen, result);
    chosen.pop();
  }
}

/// A constraint paired with the variable it applies to, the unit a
/// `NotSatisfiable` result and the persistence format's constraint entries are
/// both built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedConstraint {
  pub variable: Identifier,
  pub constraint: Constraint,
}

impl std::fmt::Display for AppliedConstraint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.constraint.describe(&self.variable))
  }
}
