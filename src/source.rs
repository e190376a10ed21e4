//! Variable sources: the pluggable producers the builder drains into a
//! `Problem`.
//!
//! Grounded on `deppy/variable_sources/builder.go` and `filterable.go`. The
//! Go original expresses "run only once per variable" and "only see
//! variables matching a filter" as two separate decorator structs wrapping a
//! `VariableSource` interface, each forwarding to the next; Rust's trait
//! objects support the same wrapping, but a boxed closure plus two
//! constructor-level wrappers reads more directly than a three-deep decorator
//! chain for the handful of sources this crate expects.

use crate::{error::Result, problem::Problem, variable::Variable};
use hashbrown::HashSet;
use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

/// What a variable source is told about the variable that just got added to
/// the problem (if any) on this round of the fixed-point loop. `None` marks
/// the very first round, when a source that only creates variables (rather
/// than reacting to ones already found) gets to run.
pub type Update<'a> = Option<&'a Variable>;

/// A cooperative cancellation flag threaded through a build, the way the Go
/// original threads a `context.Context` into every `Update`/`Finalize` call.
/// Cheap to clone (an `Arc` around a single flag); the builder polls it
/// between source calls rather than interrupting one mid-flight.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  pub fn new() -> Self { CancellationToken(Arc::new(AtomicBool::new(false))) }

  /// Requests cancellation. Takes effect the next time a builder checks
  /// `is_cancelled` between source calls.
  pub fn cancel(&self) { self.0.store(true, Ordering::SeqCst); }

  pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

/// A producer of variables for a `Problem`. `update` is called once per
/// variable discovered by the builder's fixed-point loop (plus once with
/// `None` at the very start); `finalize` runs once the queue drains, letting
/// a source that only acts on the complete picture do its work last. Both
/// carry the build's `CancellationToken` so a source that does its own
/// expensive work (a network call, a slow scan) can check it too.
pub trait VariableSource {
  fn update(&mut self, problem: &mut Problem, variable: Update<'_>, cancellation: &CancellationToken) -> Result<Vec<Variable>>;

  fn finalize(&mut self, _problem: &mut Problem, _cancellation: &CancellationToken) -> Result<Vec<Variable>> {
    Ok(Vec::new())
  }
}

type FinalizeFn = Box<dyn FnMut(&mut Problem, &CancellationToken) -> Result<Vec<Variable>>>;

/// Wraps a closure-based source the way `NewVariableSourceBuilder` does in the
/// original, for ad-hoc sources that don't need their own named type.
pub struct FnSource<U> {
  update_fn: U,
  finalize_fn: Option<FinalizeFn>,
}

impl<U> FnSource<U>
where
  U: FnMut(&mut Problem, Update<'_>, &CancellationToken) -> Result<Vec<Variable>>,
{
  pub fn new(update_fn: U) -> Self {
    FnSource {
      update_fn,
      finalize_fn: None,
    }
  }

  pub fn with_finalize(mut self, finalize_fn: impl FnMut(&mut Problem, &CancellationToken) -> Result<Vec<Variable>> + 'static) -> Self {
    self.finalize_fn = Some(Box::new(finalize_fn));
    self
  }
}

impl<U> VariableSource for FnSource<U>
where
  U: FnMut(&mut Problem, Update<'_>, &CancellationToken) -> Result<Vec<Variable>>,
{
  fn update(&mut self, problem: &mut Problem, variable: Update<'_>, cancellation: &CancellationToken) -> Result<Vec<Variable>> {
    (self.update_fn)(problem, variable, cancellation)
  }

  fn finalize(&mut self, problem: &mut Problem, cancellation: &CancellationToken) -> Result<Vec<Variable>> {
    match &mut self.finalize_fn {
      Some(f) => f(problem, cancellation),
      None => Ok(Vec::new()),
    }
  }
}

/// Only forwards a round to the wrapped source if `filter` accepts it (or the
/// round is the initial `None` one and the source takes that unconditionally,
/// matching the original's "nil filter + nil variable" passthrough).
pub struct Filterable<S> {
  inner: S,
  filter: Option<Box<dyn Fn(&Variable) -> bool>>,
}

impl<S: VariableSource> Filterable<S> {
  pub fn new(inner: S) -> Self { Filterable { inner, filter: None } }

  pub fn with_filter(mut self, filter: impl Fn(&Variable) -> bool + 'static) -> Self {
    self.filter = Some(Box::new(filter));
    self
  }
}

impl<S: VariableSource> VariableSource for Filterable<S> {
  fn update(&mut self, problem: &mut Problem, variable: Update<'_>, cancellation: &CancellationToken) -> Result<Vec<Variable>> {
    let passes = match (&self.filter, variable) {
      (None, None) => true,
      (None, Some(_)) => false,
      (Some(f), Some(v)) => f(v),
      (Some(_), None) => false,
    };
    if passes {
      self.inner.update(problem, variable, cancellation)
    } else {
      Ok(Vec::new())
    }
  }

  fn finalize(&mut self, problem: &mut Problem, cancellation: &CancellationToken) -> Result<Vec<Variable>> {
    self.inner.finalize(problem, cancellation)
  }
}

/// Runs the wrapped source's `update` at most once per variable identifier
/// (and at most once for the initial `None` round), so a source whose
/// `update` isn't idempotent doesn't get invoked twice for the same variable
/// across queue churn.
pub struct AtMostOnce<S> {
  inner: S,
  seen: HashSet<String>,
  seen_initial: bool,
}

impl<S: VariableSource> AtMostOnce<S> {
  pub fn new(inner: S) -> Self {
    AtMostOnce {
      inner,
      seen: HashSet::new(),
      seen_initial: false,
    }
  }
}

impl<S: VariableSource> VariableSource for AtMostOnce<S> {
  fn update(&mut self, problem: &mut Problem, variable: Update<'_>, cancellation: &CancellationToken) -> Result<Vec<Variable>> {
    match variable {
      None => {
        if self.seen_initial {
          return Ok(Vec::new());
        }
        let out = self.inner.update(problem, None, cancellation)?;
        self.seen_initial = true;
        Ok(out)
      }
      Some(v) => {
        let id = v.identifier().to_string();
        if self.seen.contains(&id) {
          return Ok(Vec::new());
        }
        let out = self.inner.update(problem, Some(v), cancellation)?;
        self.seen.insert(id);
        Ok(out)
      }
    }
  }

  fn finalize(&mut self, problem: &mut Problem, cancellation: &CancellationToken) -> Result<Vec<Variable>> {
    self.seen.clear();
    self.seen_initial = false;
    self.inner.finalize(problem, cancellation)
  }
}
