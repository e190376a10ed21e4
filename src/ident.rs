use serde::{Deserialize, Serialize};
use std::{
  cmp::Ordering,
  fmt::{self, Display},
  hash::{Hash, Hasher},
  sync::Arc,
};

/// Uniquely names a variable or constraint within a single resolution problem.
///
/// Cheap to clone (an `Arc<str>` under the hood) since the same identifier is
/// routinely copied into activation sets, dependency lists, and applied-constraint
/// results.
#[derive(Debug, Clone, Eq)]
pub struct Identifier(Arc<str>);

impl Identifier {
  pub fn new(s: impl Into<Arc<str>>) -> Self { Identifier(s.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for Identifier {
  fn from(s: &str) -> Self { Identifier(Arc::from(s)) }
}

impl From<String> for Identifier {
  fn from(s: String) -> Self { Identifier(Arc::from(s.as_str())) }
}

impl PartialEq for Identifier {
  fn eq(&self, other: &Self) -> bool { self.0.as_ref() == other.0.as_ref() }
}

impl Hash for Identifier {
  fn hash<H: Hasher>(&self, state: &mut H) { self.0.as_ref().hash(state) }
}

impl PartialOrd for Identifier {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Identifier {
  fn cmp(&self, other: &Self) -> Ordering { self.0.as_ref().cmp(other.0.as_ref()) }
}

impl Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl Serialize for Identifier {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for Identifier {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Ok(Identifier::from(s))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn equal_by_value_not_pointer() {
    let a = Identifier::from("pkg-a");
    let b = Identifier::from("pkg-a");
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), Ordering::Equal);
  }

  #[test]
  fn orders_lexicographically() {
    let a = Identifier::from("a");
    let b = Identifier::from("b");
    assert!(a < b);
  }
}
