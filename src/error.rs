use crate::{constraint::AppliedConstraint, ident::Identifier};
use thiserror::Error;

/// The error taxonomy used throughout the resolution engine.
///
/// Each variant corresponds to one of the kinds named in the engine's error
/// handling design: transient failures a caller may retry, lookups against
/// entities that were never registered, caller-visible precondition violations,
/// merge-rule conflicts, programmer errors the builder treats as fatal, and the
/// structured "no solution exists" result.
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
  #[error("{0}")]
  Retryable(String),

  #[error("{id} not found")]
  NotFound { id: Identifier },

  #[error("precondition failed: {0}")]
  Precondition(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  Fatal(String),

  #[error("duplicate identifier {0} in input")]
  DuplicateIdentifier(Identifier),

  #[error("{}", not_satisfiable_message(.0))]
  NotSatisfiable(Vec<AppliedConstraint>),
}

fn not_satisfiable_message(applied: &[AppliedConstraint]) -> String {
  const MSG: &str = "constraints not satisfiable";
  if applied.is_empty() {
    return MSG.to_string();
  }
  let joined = applied
    .iter()
    .map(|a| a.to_string())
    .collect::<Vec<_>>()
    .join(", ");
  format!("{}: {}", MSG, joined)
}

impl ResolutionError {
  pub fn not_found(id: impl Into<Identifier>) -> Self {
    ResolutionError::NotFound { id: id.into() }
  }

  pub fn conflict(msg: impl Into<String>) -> Self { ResolutionError::Conflict(msg.into()) }

  pub fn fatal(msg: impl Into<String>) -> Self { ResolutionError::Fatal(msg.into()) }

  pub fn precondition(msg: impl Into<String>) -> Self { ResolutionError::Precondition(msg.into()) }

  pub fn retryable(msg: impl Into<String>) -> Self { ResolutionError::Retryable(msg.into()) }

  pub fn is_conflict(&self) -> bool { matches!(self, ResolutionError::Conflict(_)) }

  pub fn is_not_found(&self) -> bool { matches!(self, ResolutionError::NotFound { .. }) }

  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      ResolutionError::Fatal(_) | ResolutionError::Conflict(_) | ResolutionError::DuplicateIdentifier(_)
    )
  }

  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      ResolutionError::Retryable(_) | ResolutionError::NotFound { .. } | ResolutionError::Precondition(_)
    )
  }

  pub fn not_satisfiable(&self) -> Option<&[AppliedConstraint]> {
    match self {
      ResolutionError::NotSatisfiable(v) => Some(v),
      _ => None,
    }
  }
}

/// Drops `NotFound` errors, mirroring the original's `IgnoreNotFound` helper used
/// by callers that treat "absent" the same as "already gone".
pub fn ignore_not_found(err: ResolutionError) -> Result<(), ResolutionError> {
  if err.is_not_found() {
    Ok(())
  } else {
    Err(err)
  }
}

pub type Result<T> = std::result::Result<T, ResolutionError>;
