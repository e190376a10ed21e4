//! End-to-end resolution scenarios, ported from the original project's
//! table-driven solver tests. A few scenarios there fed the solver raw
//! constraint lists with repeated constraint ids on a single variable (the
//! bare test fixture bypassed the usual per-id merge rules); this crate's
//! `Variable` always merges same-id constraints together, so those cases are
//! reproduced here with distinct ids per independent constraint instead,
//! which is how a real caller assembling a `Variable` through its public API
//! would have to write them anyway.

use resolvex::{
  ident::Identifier,
  problem::Problem,
  resolver::{Resolver, ResolverOptions},
  variable::Variable,
};

fn solve(problem: &Problem) -> resolvex::Solution {
  Resolver::new().solve(problem, &ResolverOptions::default()).unwrap()
}

fn selected(solution: &resolvex::Solution) -> Vec<String> {
  let mut ids: Vec<String> = solution.selected_variables().iter().map(|i| i.to_string()).collect();
  ids.sort();
  ids
}

fn var(id: &str, kind: &str) -> Variable { Variable::new(id, kind) }

#[test]
fn solution_with_first_dependency_is_selected() {
  let mut problem = Problem::new();
  problem.add_variable(var("a", "v"));
  let mut b = var("b", "v");
  b.add_conflict("cid", "a").unwrap();
  problem.add_variable(b);
  let mut c = var("c", "v");
  c.add_mandatory("anchor").unwrap();
  c.add_dependency("dcid", vec![Identifier::from("a"), Identifier::from("b")]).unwrap();
  problem.add_variable(c);

  let solution = solve(&problem);
  assert!(solution.is_satisfiable());
  assert_eq!(selected(&solution), vec!["a".to_string(), "c".to_string()]);
}

#[test]
fn solution_with_only_first_dependency_is_selected() {
  let mut problem = Problem::new();
  problem.add_variable(var("a", "v"));
  problem.add_variable(var("b", "v"));
  let mut c = var("c", "v");
  c.add_mandatory("anchor").unwrap();
  c.add_dependency("dcid", vec![Identifier::from("a"), Identifier::from("b")]).unwrap();
  problem.add_variable(c);

  let solution = solve(&problem);
  assert_eq!(selected(&solution), vec!["a".to_string(), "c".to_string()]);
}

#[test]
fn solution_with_first_dependency_is_selected_reverse() {
  let mut problem = Problem::new();
  problem.add_variable(var("a", "v"));
  let mut b = var("b", "v");
  b.add_conflict("cid", "a").unwrap();
  problem.add_variable(b);
  let mut c = var("c", "v");
  c.add_mandatory("anchor").unwrap();
  c.add_dependency("dcid", vec![Identifier::from("b"), Identifier::from("a")]).unwrap();
  problem.add_variable(c);

  let solution = solve(&problem);
  assert_eq!(selected(&solution), vec!["b".to_string(), "c".to_string()]);
}

#[test]
fn both_dependencies_are_installed() {
  let mut problem = Problem::new();
  problem.add_variable(var("a", "v"));
  problem.add_variable(var("b", "v"));
  let mut c = var("c", "v");
  c.add_mandatory("anchor").unwrap();
  c.add_dependency("dcid-a", vec![Identifier::from("a")]).unwrap();
  c.add_dependency("dcid-b", vec![Identifier::from("b")]).unwrap();
  problem.add_variable(c);

  let solution = solve(&problem);
  assert_eq!(
    selected(&solution),
    vec!["a".to_string(), "b".to_string(), "c".to_string()]
  );
}

#[test]
fn irrelevant_dependencies_dont_influence_search_order() {
  let mut problem = Problem::new();
  let mut a = var("a", "v");
  a.add_dependency("dcid", vec![Identifier::from("x"), Identifier::from("y")]).unwrap();
  problem.add_variable(a);
  let mut b = var("b", "v");
  b.add_mandatory("anchor").unwrap();
  b.add_dependency("dcid", vec![Identifier::from("y"), Identifier::from("x")]).unwrap();
  problem.add_variable(b);
  problem.add_variable(var("x", "v"));
  problem.add_variable(var("y", "v"));

  let solution = solve(&problem);
  assert_eq!(selected(&solution), vec!["b".to_string(), "y".to_string()]);
}

#[test]
fn two_dependencies_satisfied_by_one_variable() {
  let mut problem = Problem::new();
  let mut a = var("a", "v");
  a.add_mandatory("anchor").unwrap();
  a.add_dependency(
    "dcid",
    vec![Identifier::from("y"), Identifier::from("z"), Identifier::from("m")],
  )
  .unwrap();
  problem.add_variable(a);
  let mut b = var("b", "v");
  b.add_mandatory("anchor").unwrap();
  b.add_dependency("dcid", vec![Identifier::from("x"), Identifier::from("y")]).unwrap();
  problem.add_variable(b);
  for id in ["x", "y", "z", "m"] {
    problem.add_variable(var(id, "v"));
  }

  let solution = solve(&problem);
  assert_eq!(
    selected(&solution),
    vec!["a".to_string(), "b".to_string(), "y".to_string()]
  );
}

#[test]
fn result_size_larger_than_minimum_due_to_preference() {
  let mut problem = Problem::new();
  let mut a = var("a", "v");
  a.add_mandatory("anchor").unwrap();
  a.add_dependency("dcid", vec![Identifier::from("x"), Identifier::from("y")]).unwrap();
  problem.add_variable(a);
  let mut b = var("b", "v");
  b.add_mandatory("anchor").unwrap();
  b.add_dependency("dcid", vec![Identifier::from("y")]).unwrap();
  problem.add_variable(b);
  problem.add_variable(var("x", "v"));
  problem.add_variable(var("y", "v"));

  let solution = solve(&problem);
  assert_eq!(
    selected(&solution),
    vec!["a".to_string(), "b".to_string(), "x".to_string(), "y".to_string()]
  );
}

#[test]
fn preferences_respected_with_multiple_dependencies_per_variable() {
  let mut problem = Problem::new();
  let mut a = var("a", "v");
  a.add_mandatory("anchor").unwrap();
  a.add_dependency("dcid-x", vec![Identifier::from("x1"), Identifier::from("x2")]).unwrap();
  a.add_dependency("dcid-y", vec![Identifier::from("y1"), Identifier::from("y2")]).unwrap();
  problem.add_variable(a);
  for id in ["x1", "x2", "y1", "y2"] {
    problem.add_variable(var(id, "v"));
  }

  let solution = solve(&problem);
  assert_eq!(
    selected(&solution),
    vec!["a".to_string(), "x1".to_string(), "y1".to_string()]
  );
}

#[test]
fn only_the_least_preferable_choice_is_acceptable() {
  let mut problem = Problem::new();

  let mut a = var("a", "v");
  a.add_mandatory("anchor").unwrap();
  a.add_dependency("dcid", vec![Identifier::from("a1"), Identifier::from("a2")]).unwrap();
  problem.add_variable(a);
  let mut a1 = var("a1", "v");
  a1.add_conflict("cid1", "c1").unwrap();
  a1.add_conflict("cid2", "c2").unwrap();
  problem.add_variable(a1);
  let mut a2 = var("a2", "v");
  a2.add_conflict("cid", "c1").unwrap();
  problem.add_variable(a2);

  let mut b = var("b", "v");
  b.add_mandatory("anchor").unwrap();
  b.add_dependency("dcid", vec![Identifier::from("b1"), Identifier::from("b2")]).unwrap();
  problem.add_variable(b);
  let mut b1 = var("b1", "v");
  b1.add_conflict("cid1", "c1").unwrap();
  b1.add_conflict("cid2", "c2").unwrap();
  problem.add_variable(b1);
  let mut b2 = var("b2", "v");
  b2.add_conflict("cid", "c1").unwrap();
  problem.add_variable(b2);

  let mut c = var("c", "v");
  c.add_mandatory("anchor").unwrap();
  c.add_dependency("dcid", vec![Identifier::from("c1"), Identifier::from("c2")]).unwrap();
  problem.add_variable(c);
  problem.add_variable(var("c1", "v"));
  problem.add_variable(var("c2", "v"));

  let solution = solve(&problem);
  assert!(solution.is_satisfiable());
  assert_eq!(
    selected(&solution),
    vec![
      "a".to_string(),
      "a2".to_string(),
      "b".to_string(),
      "b2".to_string(),
      "c".to_string(),
      "c2".to_string(),
    ]
  );
}

#[test]
fn not_satisfiable_display_lists_every_failing_constraint() {
  let mut problem = Problem::new();
  let mut a = var("a", "v");
  a.add_mandatory("anchor").unwrap();
  a.add_prohibited("ban").unwrap();
  problem.add_variable(a);

  let solution = solve(&problem);
  assert!(!solution.is_satisfiable());
  let core = solution.not_satisfiable().unwrap();
  assert_eq!(core.len(), 2);
  let messages: Vec<String> = core.iter().map(|c| c.to_string()).collect();
  assert!(messages.iter().any(|m| m.contains("mandatory")));
  assert!(messages.iter().any(|m| m.contains("prohibited")));
}
