use crate::sat::literal::Literal;
use std::fmt;

/// A CNF clause: a sorted, deduplicated disjunction of literals.
///
/// Grounded on the teacher's `clause.rs`, with the `learnt` flag dropped: this
/// engine never learns clauses, so every clause it holds is one the caller
/// added.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Clause {
  literals: Vec<Literal>,
}

impl Clause {
  pub fn literals(&self) -> &[Literal] { &self.literals }

  /// Used only by the solver's watch-swap bookkeeping: the first two entries
  /// double as the two currently-watched literals, reordered in place as
  /// propagation proceeds. Sortedness is a construction-time invariant only.
  pub(crate) fn literals_mut(&mut self) -> &mut Vec<Literal> { &mut self.literals }

  pub fn is_empty(&self) -> bool { self.literals.is_empty() }

  pub fn is_tautology(&self) -> bool {
    let mut seen: Vec<&Literal> = Vec::with_capacity(self.literals.len());
    self.literals.iter().any(|lit| {
      if seen.iter().any(|prev| !**prev == *lit) {
        return true;
      }
      seen.push(lit);
      false
    })
  }
}

impl From<Vec<Literal>> for Clause {
  fn from(mut lits: Vec<Literal>) -> Self {
    lits.sort_unstable();
    lits.dedup();
    Clause { literals: lits }
  }
}

impl fmt::Display for Clause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(")?;
    let mut first = true;
    for lit in &self.literals {
      if !first {
        write!(f, " | ")?;
      }
      write!(f, "{}", lit)?;
      first = false;
    }
    write!(f, ")")
  }
}
