//! Chronological-backtracking DPLL with two-watched-literal propagation.
//!
//! Grounded on the teacher's `solver.rs`/`watch_list.rs`: the watch-swap
//! propagation loop below is the same move-to-front technique (the two
//! watched literals of a clause always live at positions 0 and 1), but the
//! surrounding search has no `analyze`/learnt-clause/restart machinery. A
//! conflict simply flips the most recent undecided branch; if both branches
//! of a decision fail, that level pops and its parent flips. This is enough
//! for the engine's instance sizes (one resolution problem, re-solved from
//! scratch per step of the deletion-based unsat-core shrink in `driver.rs`)
//! and keeps the whole thing auditable without a compiler in the loop.

use crate::sat::{clause::Clause, literal::Literal};

struct DecisionFrame {
  var: usize,
  trail_start: usize,
  tried_both: bool,
}

pub struct Solver {
  clauses: Vec<Clause>,
  /// indexed by `Literal::raw()`: clause indices currently watching that
  /// literal (i.e. the literal occupies position 0 or 1 of the clause).
  watches: Vec<Vec<usize>>,
  assignments: Vec<Option<bool>>,
  trail: Vec<Literal>,
  qhead: usize,
  levels: Vec<Option<usize>>,
  reasons: Vec<Option<usize>>,
  decisions: Vec<DecisionFrame>,
  /// decision polarity to try first for each variable; `true` biases toward
  /// selecting the variable, `false` (the default for every variable not
  /// named in the caller's decision order) biases toward leaving it
  /// unselected.
  preferred_polarity: Vec<bool>,
  decision_order: Vec<usize>,
  num_vars: usize,
  root_conflict: bool,
}

impl Solver {
  /// Builds a solver over `num_vars` boolean variables (0-indexed) and the
  /// given hard clauses. `decision_order` is consulted first, in order, when
  /// the search needs a new decision variable, and those variables default to
  /// a positive decision; every other variable defaults to negative.
  pub fn new(num_vars: usize, clauses: Vec<Clause>, decision_order: Vec<usize>) -> Self {
    let mut preferred_polarity = vec![false; num_vars];
    for &v in &decision_order {
      if v < num_vars {
        preferred_polarity[v] = true;
      }
    }
    let mut solver = Solver {
      clauses,
      watches: vec![Vec::new(); 2 * num_vars],
      assignments: vec![None; num_vars],
      trail: Vec::new(),
      qhead: 0,
      levels: vec![None; num_vars],
      reasons: vec![None; num_vars],
      decisions: Vec::new(),
      preferred_polarity,
      decision_order,
      num_vars,
      root_conflict: false,
    };
    for idx in 0..solver.clauses.len() {
      let len = solver.clauses[idx].literals().len();
      if len == 0 {
        solver.root_conflict = true;
        continue;
      }
      if len == 1 {
        let lit = solver.clauses[idx].literals()[0];
        match lit.assn(&solver.assignments) {
          Some(true) => {}
          Some(false) => solver.root_conflict = true,
          None => solver.assign(lit, Some(idx)),
        }
        continue;
      }
      let l0 = solver.clauses[idx].literals()[0];
      let l1 = solver.clauses[idx].literals()[1];
      solver.watches[l0.raw() as usize].push(idx);
      solver.watches[l1.raw() as usize].push(idx);
    }
    solver
  }

  fn assign(&mut self, lit: Literal, reason: Option<usize>) {
    self.trail.push(lit);
    self.assignments[lit.var()] = Some(lit.val());
    self.levels[lit.var()] = Some(self.decisions.len());
    self.reasons[lit.var()] = reason;
  }

  /// Propagates everything derivable from the current trail via unit clauses.
  /// Returns the index of a violated clause on conflict.
  fn propagate(&mut self) -> Option<usize> {
    while self.qhead < self.trail.len() {
      let lit = self.trail[self.qhead];
      self.qhead += 1;
      let false_lit = !lit;
      let watchers = std::mem::take(&mut self.watches[false_lit.raw() as usize]);
      let mut still_watching = Vec::with_capacity(watchers.len());
      let mut conflict = None;
      for ci in watchers {
        if conflict.is_some() {
          still_watching.push(ci);
          continue;
        }
        let clause_lits = self.clauses[ci].literals_mut();
        if clause_lits[0] != false_lit {
          clause_lits.swap(0, 1);
        }
        let other = clause_lits[1];
        if other.assn(&self.assignments) == Some(true) {
          still_watching.push(ci);
          continue;
        }
        let mut replacement = None;
        for idx in 2..clause_lits.len() {
          if clause_lits[idx].assn(&self.assignments) != Some(false) {
            replacement = Some(idx);
            break;
          }
        }
        match replacement {
          Some(idx) => {
            clause_lits.swap(0, idx);
            let new_watch = clause_lits[0];
            self.watches[new_watch.raw() as usize].push(ci);
          }
          None => {
            still_watching.push(ci);
            match other.assn(&self.assignments) {
              Some(false) => conflict = Some(ci),
              _ => self.assign(other, Some(ci)),
            }
          }
        }
      }
      self.watches[false_lit.raw() as usize].extend(still_watching);
      if let Some(c) = conflict {
        return Some(c);
      }
    }
    None
  }

  fn choose(&self) -> Option<usize> {
    for &v in &self.decision_order {
      if self.assignments[v].is_none() {
        return Some(v);
      }
    }
    (0..self.num_vars).find(|&v| self.assignments[v].is_none())
  }

  fn undo_from(&mut self, trail_start: usize) {
    for lit in self.trail.drain(trail_start..) {
      self.assignments[lit.var()] = None;
      self.levels[lit.var()] = None;
      self.reasons[lit.var()] = None;
    }
    self.qhead = self.trail.len();
  }

  /// Searches for a satisfying assignment. `None` means the clause set
  /// (together with any unit facts baked in at construction) is unsatisfiable.
  pub fn solve(&mut self) -> Option<Vec<bool>> {
    if self.root_conflict {
      return None;
    }
    if self.propagate().is_some() {
      return None;
    }
    loop {
      match self.propagate() {
        Some(_conflict_clause) => loop {
          let len = self.decisions.len();
          if len == 0 {
            return None;
          }
          let tried_both = self.decisions[len - 1].tried_both;
          if !tried_both {
            let var = self.decisions[len - 1].var;
            let trail_start = self.decisions[len - 1].trail_start;
            self.decisions[len - 1].tried_both = true;
            self.undo_from(trail_start);
            let flipped = Literal::new(var as u32, self.preferred_polarity[var]);
            self.assign(flipped, None);
            break;
          } else {
            let frame_trail_start = self.decisions[len - 1].trail_start;
            self.decisions.pop();
            self.undo_from(frame_trail_start);
          }
        },
        None => match self.choose() {
          None => return Some(self.assignments.iter().map(|a| a.unwrap()).collect()),
          Some(var) => {
            let trail_start = self.trail.len();
            self.decisions.push(DecisionFrame {
              var,
              trail_start,
              tried_both: false,
            });
            let lit = Literal::new(var as u32, !self.preferred_polarity[var]);
            self.assign(lit, None);
          }
        },
      }
    }
  }
}

/// Convenience entry point: build a fresh solver and solve it in one call.
/// Every caller in this crate re-solves from scratch (there is no incremental
/// assumption API, see `driver.rs`), so this is the only constructor most
/// call sites need.
pub fn solve(num_vars: usize, clauses: Vec<Clause>, decision_order: Vec<usize>) -> Option<Vec<bool>> {
  Solver::new(num_vars, clauses, decision_order).solve()
}
