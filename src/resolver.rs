//! The top-level facade: takes a `Problem`, runs the search driver, and
//! packages the result as a `Solution`.
//!
//! Grounded on `deppy/resolver/resolver.go`'s `DeppyResolver`/`Solution`/
//! `Option`. `AddAllVariablesToSolution` becomes `ResolverOptions::all_variables`
//! and `DisableOrderPreference` becomes `ResolverOptions::disable_order_preference`.

use crate::{
  constraint::AppliedConstraint,
  driver::{self, SolveOptions},
  error::Result,
  ident::Identifier,
  problem::Problem,
  variable::Variable,
};
use hashbrown::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
  /// When set, `Solution::considered` includes every variable the search
  /// touched, not just the ones selected.
  pub all_variables: bool,
  pub disable_order_preference: bool,
}

/// The result of a resolution attempt: which variables were selected (if
/// any), and, on failure, the minimal set of applied constraints that made
/// the problem unsatisfiable. Carries the resolved `Problem` itself so
/// `selected_variables` can hand back full records, not just identifiers.
pub struct Solution {
  problem: Problem,
  selected: Vec<Identifier>,
  considered: Vec<Identifier>,
  not_satisfiable: Option<Vec<AppliedConstraint>>,
}

impl Solution {
  pub fn is_satisfiable(&self) -> bool { self.not_satisfiable.is_none() }

  pub fn not_satisfiable(&self) -> Option<&[AppliedConstraint]> { self.not_satisfiable.as_deref() }

  pub fn is_selected(&self, id: &Identifier) -> bool { self.selected.contains(id) }

  /// The problem this solution was resolved against.
  pub fn problem(&self) -> &Problem { &self.problem }

  /// Every selected variable's full record, keyed by identifier.
  pub fn selected_variables(&self) -> HashMap<Identifier, &Variable> {
    self
      .selected
      .iter()
      .filter_map(|id| self.problem.variable(id).map(|v| (id.clone(), v)))
      .collect()
  }

  /// Every variable considered by the search, populated only when the
  /// resolver was run with `ResolverOptions::all_variables`.
  pub fn considered_variables(&self) -> &[Identifier] { &self.considered }
}

pub struct Resolver;

impl Resolver {
  pub fn new() -> Self { Resolver }

  pub fn solve(&self, problem: &Problem, options: &ResolverOptions) -> Result<Solution> {
    let solve_opts = SolveOptions {
      disable_order_preference: options.disable_order_preference,
    };
    match driver::solve(problem, &solve_opts) {
      Ok(outcome) => Ok(Solution {
        considered: if options.all_variables {
          problem.variable_ids().cloned().collect()
        } else {
          Vec::new()
        },
        selected: outcome.selected,
        not_satisfiable: None,
        problem: problem.clone(),
      }),
      Err(err) => match err.not_satisfiable() {
        Some(core) => Ok(Solution {
          selected: Vec::new(),
          considered: Vec::new(),
          not_satisfiable: Some(core.to_vec()),
          problem: problem.clone(),
        }),
        None => Err(err),
      },
    }
  }
}

impl Default for Resolver {
  fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn satisfiable_problem_reports_selection() {
    let mut problem = Problem::new();
    let mut a = Variable::new("a", "v");
    a.add_mandatory("anchor").unwrap();
    problem.add_variable(a);

    let solution = Resolver::new().solve(&problem, &ResolverOptions::default()).unwrap();
    assert!(solution.is_satisfiable());
    assert!(solution.is_selected(&Identifier::from("a")));
  }

  #[test]
  fn unsatisfiable_problem_reports_core_without_error() {
    let mut problem = Problem::new();
    let mut a = Variable::new("a", "v");
    a.add_mandatory("anchor").unwrap();
    a.add_prohibited("ban").unwrap();
    problem.add_variable(a);

    let solution = Resolver::new().solve(&problem, &ResolverOptions::default()).unwrap();
    assert!(!solution.is_satisfiable());
    assert_eq!(solution.not_satisfiable().unwrap().len(), 2);
  }

  #[test]
  fn all_variables_option_populates_considered_list() {
    let mut problem = Problem::new();
    problem.add_variable(Variable::new("a", "v"));
    let opts = ResolverOptions {
      all_variables: true,
      ..Default::default()
    };
    let solution = Resolver::new().solve(&problem, &opts).unwrap();
    assert_eq!(solution.considered_variables().len(), 1);
  }

  #[test]
  fn selected_variables_exposes_the_full_record_keyed_by_id() {
    let mut problem = Problem::new();
    let mut a = Variable::new("a", "v");
    a.add_mandatory("anchor").unwrap();
    problem.add_variable(a);
    let solution = Resolver::new().solve(&problem, &ResolverOptions::default()).unwrap();
    let selected = solution.selected_variables();
    let found = selected.get(&Identifier::from("a"));
    assert!(found.is_some());
    assert_eq!(found.unwrap().kind(), "v");
  }

  #[test]
  fn problem_accessor_returns_the_resolved_problem() {
    let mut problem = Problem::new();
    let mut a = Variable::new("a", "v");
    a.add_mandatory("anchor").unwrap();
    problem.add_variable(a);
    let solution = Resolver::new().solve(&problem, &ResolverOptions::default()).unwrap();
    assert!(solution.problem().has_variable(&Identifier::from("a")));
  }
}
