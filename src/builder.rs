//! Drives a fixed-point expansion of a `Problem` from a set of variable
//! sources: every newly merged variable gets fed back to every source until
//! none of them produce anything new.
//!
//! Grounded on `deppy/resolution/builder.go`'s `Build`: the original seeds its
//! queue with a single `nil` entry (telling "create-only" sources to run
//! once up front), drains it FIFO, and merges each dequeued variable into the
//! problem before handing it to every source in turn; a source's non-fatal
//! error is logged and otherwise ignored, a fatal one aborts the whole build.
//! `tracing` takes the place of the original's bare `fmt.Printf` debug line.
//! Right after a source's `Update`, if the queue has drained to empty the
//! original calls that same source's `Finalize` before moving to the next
//! source, rather than waiting for every source to finish the whole queue;
//! this crate follows the same placement so a source like `AtMostOnce` that
//! resets state in `finalize` actually gets a chance to run it mid-build.

use crate::{
  error::{ResolutionError, Result},
  problem::Problem,
  source::{CancellationToken, VariableSource},
  variable::Variable,
};
use std::collections::VecDeque;

pub struct Builder {
  sources: Vec<Box<dyn VariableSource>>,
}

impl Builder {
  pub fn new() -> Self { Builder { sources: Vec::new() } }

  pub fn with_source(mut self, source: impl VariableSource + 'static) -> Self {
    self.sources.push(Box::new(source));
    self
  }

  /// Runs every source to a fixed point and returns the assembled problem.
  /// Equivalent to `build_with_cancellation` with a token that's never
  /// cancelled.
  pub fn build(self) -> Result<Problem> { self.build_with_cancellation(&CancellationToken::new()) }

  /// Same as `build`, but polled against `cancellation` between every source
  /// call; once it's set the build stops and returns a retryable error
  /// instead of the assembled problem, the way the original threads a
  /// cancellable `context.Context` into every `Update`/`Finalize` call.
  ///
  /// A fatal error from any source aborts the build immediately; any other
  /// error is logged via `tracing::debug!` and otherwise swallowed, matching
  /// the original's best-effort stance toward individual source hiccups.
  pub fn build_with_cancellation(mut self, cancellation: &CancellationToken) -> Result<Problem> {
    let mut problem = Problem::new();
    let mut queue: VecDeque<Option<Variable>> = VecDeque::new();
    queue.push_back(None);

    while let Some(current) = queue.pop_front() {
      for source in &mut self.sources {
        if cancellation.is_cancelled() {
          return Err(ResolutionError::retryable("build cancelled"));
        }

        let produced = match source.update(&mut problem, current.as_ref(), cancellation) {
          Ok(vars) => vars,
          Err(err) if err.is_fatal() => return Err(err),
          Err(err) => {
            tracing::debug!(error = %err, "variable source update failed");
            Vec::new()
          }
        };
        for variable in produced {
          problem.merge_variable(variable.clone())?;
          queue.push_back(Some(variable));
        }

        if queue.is_empty() {
          let finalized = match source.finalize(&mut problem, cancellation) {
            Ok(vars) => vars,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
              tracing::debug!(error = %err, "variable source finalize failed");
              Vec::new()
            }
          };
          for variable in finalized {
            problem.merge_variable(variable.clone())?;
            queue.push_back(Some(variable));
          }
        }
      }
    }

    Ok(problem)
  }
}

impl Default for Builder {
  fn default() -> Self { Self::new() }
}

/// Non-fatal errors short of a merge conflict are swallowed by `build`, so
/// sources that hit a transient lookup failure don't have to special-case it
/// themselves; this mirrors `IgnoreNotFound` being the normal way callers
/// shrug off an absent id elsewhere in the engine.
pub fn ignore_retryable(err: ResolutionError) -> Result<()> {
  if err.is_retryable() {
    Ok(())
  } else {
    Err(err)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    ident::Identifier,
    source::{CancellationToken, FnSource},
  };

  #[test]
  fn single_create_only_source_populates_problem() {
    let source = FnSource::new(|_problem: &mut Problem, variable: crate::source::Update<'_>, _cancellation: &CancellationToken| {
      if variable.is_none() {
        let mut v = Variable::new("a", "package");
        v.add_mandatory("anchor").unwrap();
        Ok(vec![v])
      } else {
        Ok(Vec::new())
      }
    });
    let problem = Builder::new().with_source(source).build().unwrap();
    assert!(problem.has_variable(&Identifier::from("a")));
  }

  #[test]
  fn one_sources_output_feeds_another_sources_input() {
    let creator = FnSource::new(|_problem: &mut Problem, variable: crate::source::Update<'_>, _cancellation: &CancellationToken| {
      if variable.is_none() {
        Ok(vec![Variable::new("a", "package")])
      } else {
        Ok(Vec::new())
      }
    });
    let dependent = FnSource::new(|_problem: &mut Problem, variable: crate::source::Update<'_>, _cancellation: &CancellationToken| {
      match variable {
        Some(v) if v.identifier() == &Identifier::from("a") => {
          let mut dep = Variable::new("b", "package");
          dep.add_mandatory("anchor").unwrap();
          Ok(vec![dep])
        }
        _ => Ok(Vec::new()),
      }
    });
    let problem = Builder::new()
      .with_source(creator)
      .with_source(dependent)
      .build()
      .unwrap();
    assert!(problem.has_variable(&Identifier::from("a")));
    assert!(problem.has_variable(&Identifier::from("b")));
  }

  #[test]
  fn fatal_source_error_aborts_the_build() {
    let source = FnSource::new(|_problem: &mut Problem, _variable: crate::source::Update<'_>, _cancellation: &CancellationToken| {
      Err(ResolutionError::fatal("boom"))
    });
    assert!(Builder::new().with_source(source).build().is_err());
  }

  #[test]
  fn retryable_source_error_is_swallowed() {
    let source = FnSource::new(|_problem: &mut Problem, variable: crate::source::Update<'_>, _cancellation: &CancellationToken| {
      if variable.is_none() {
        Err(ResolutionError::retryable("try later"))
      } else {
        Ok(Vec::new())
      }
    });
    let problem = Builder::new().with_source(source).build().unwrap();
    assert!(problem.is_empty());
  }

  #[test]
  fn cancelled_token_aborts_the_build_with_a_retryable_error() {
    let token = CancellationToken::new();
    token.cancel();
    let source = FnSource::new(|_problem: &mut Problem, _variable: crate::source::Update<'_>, _cancellation: &CancellationToken| {
      Ok(vec![Variable::new("a", "package")])
    });
    let err = Builder::new().with_source(source).build_with_cancellation(&token).unwrap_err();
    assert!(err.is_retryable());
  }

  #[test]
  fn finalize_resets_at_most_once_state_during_a_real_build() {
    use crate::source::{AtMostOnce, VariableSource};
    use std::cell::Cell;
    use std::rc::Rc;

    // Re-emits "a" exactly once from `finalize`, after it's already been
    // through `update` once. Without the per-source, queue-empty-gated
    // finalize call firing mid-build, `AtMostOnce`'s seen-set is never reset
    // and this second "a" would be swallowed rather than reaching `update`
    // again.
    struct ReemitOnce {
      some_a_updates: Rc<Cell<usize>>,
      finalizes: Rc<Cell<usize>>,
      reemitted: Rc<Cell<bool>>,
    }

    impl VariableSource for ReemitOnce {
      fn update(&mut self, _problem: &mut Problem, variable: crate::source::Update<'_>, _cancellation: &CancellationToken) -> Result<Vec<Variable>> {
        match variable {
          None => Ok(vec![Variable::new("a", "package")]),
          Some(v) if v.identifier() == &Identifier::from("a") => {
            self.some_a_updates.set(self.some_a_updates.get() + 1);
            Ok(Vec::new())
          }
          _ => Ok(Vec::new()),
        }
      }

      fn finalize(&mut self, _problem: &mut Problem, _cancellation: &CancellationToken) -> Result<Vec<Variable>> {
        self.finalizes.set(self.finalizes.get() + 1);
        if self.reemitted.get() {
          Ok(Vec::new())
        } else {
          self.reemitted.set(true);
          Ok(vec![Variable::new("a", "package")])
        }
      }
    }

    let some_a_updates = Rc::new(Cell::new(0));
    let finalizes = Rc::new(Cell::new(0));
    let source = AtMostOnce::new(ReemitOnce {
      some_a_updates: some_a_updates.clone(),
      finalizes: finalizes.clone(),
      reemitted: Rc::new(Cell::new(false)),
    });
    let problem = Builder::new().with_source(source).build().unwrap();
    assert!(problem.has_variable(&Identifier::from("a")));
    assert_eq!(finalizes.get(), 2);
    assert_eq!(some_a_updates.get(), 2);
  }
}
