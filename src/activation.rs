//! Activation containers: ordered bags where membership is governed by a
//! commutative integer counter rather than a boolean, so independent producers
//! (variable sources, constraint mutators) can add and remove the same entry
//! without coordinating. Positive counter means active; the actual count past
//! zero carries no meaning beyond sign, it simply has to stay commutative.
//!
//! Grounded on `deppy/utils/activation.go`, with one deliberate divergence: the
//! original stores entries in a Go map and therefore has no stable iteration
//! order (`Elements()`/`Keys()` shuffle between runs); this port tracks first
//! insertion order explicitly, following the pattern the teacher's own
//! `WatchList` uses (a dense `Vec` alongside a `HashMap` for O(1) lookup), since
//! the surrounding spec relies on "first activation order" for variable and
//! dependency iteration.

use crate::error::{ResolutionError, Result};
use hashbrown::HashMap;
use serde::{
  de::{Deserialize, Deserializer, MapAccess, Visitor},
  ser::{Serialize, SerializeMap, Serializer},
};
use std::{
  fmt,
  hash::Hash,
  marker::PhantomData,
};

#[derive(Debug, Clone)]
struct Entry<V> {
  value: V,
  count: i64,
}

/// An ordered map where values come and go via a commutative activation
/// counter, keyed by K.
#[derive(Debug, Clone)]
pub struct ActivationMap<K, V> {
  order: Vec<K>,
  entries: HashMap<K, Entry<V>>,
}

impl<K, V> Default for ActivationMap<K, V> {
  fn default() -> Self {
    ActivationMap {
      order: Vec::new(),
      entries: HashMap::new(),
    }
  }
}

impl<K: Eq + Hash + Clone, V> ActivationMap<K, V> {
  pub fn new() -> Self { Self::default() }

  /// Overwrites the entry for `k` and sets its counter to 1 (freshly active).
  pub fn put(&mut self, k: K, v: V) {
    if !self.entries.contains_key(&k) {
      self.order.push(k.clone());
    }
    self.entries.insert(k, Entry { value: v, count: 1 });
  }

  pub fn get(&self, k: &K) -> Option<&V> { self.entries.get(k).map(|e| &e.value) }

  pub fn get_mut(&mut self, k: &K) -> Option<&mut V> { self.entries.get_mut(k).map(|e| &mut e.value) }

  pub fn has(&self, k: &K) -> bool { self.entries.contains_key(k) }

  pub fn activate(&mut self, k: &K)
  where
    V: Default,
  {
    self.ensure(k);
    self.entries.get_mut(k).unwrap().count += 1;
  }

  pub fn deactivate(&mut self, k: &K)
  where
    V: Default,
  {
    self.ensure(k);
    self.entries.get_mut(k).unwrap().count -= 1;
  }

  fn ensure(&mut self, k: &K)
  where
    V: Default,
  {
    if !self.entries.contains_key(k) {
      self.order.push(k.clone());
      self.entries.insert(k.clone(), Entry {
        value: V::default(),
        count: 0,
      });
    }
  }

  pub fn is_activated(&self, k: &K) -> Result<bool>
  where
    K: ToString,
  {
    self
      .entries
      .get(k)
      .map(|e| e.count > 0)
      .ok_or_else(|| ResolutionError::not_found(k.to_string().as_str()))
  }

  /// Keys in first-insertion order, regardless of current activation.
  pub fn keys(&self) -> impl Iterator<Item = &K> { self.order.iter() }

  /// Active values, in first-insertion order.
  pub fn elements(&self) -> impl Iterator<Item = &V> {
    self
      .order
      .iter()
      .filter_map(move |k| self.entries.get(k))
      .filter(|e| e.count > 0)
      .map(|e| &e.value)
  }

  /// Active (key, value) pairs, in first-insertion order.
  pub fn active_entries(&self) -> impl Iterator<Item = (&K, &V)> {
    self
      .order
      .iter()
      .filter_map(move |k| self.entries.get(k).map(|e| (k, e)))
      .filter(|(_, e)| e.count > 0)
      .map(|(k, e)| (k, &e.value))
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Merges `other` into `self`: new keys are inserted with `other`'s value and
  /// counter; shared keys sum their counters (commutative: two activated
  /// inputs stay activated, a net deactivation nets out to inactive). Returns
  /// whether anything actually changed, so callers (the builder) know whether
  /// to re-enqueue a variable.
  pub fn merge(&mut self, other: &Self) -> bool
  where
    V: Clone,
  {
    let mut changed = false;
    for k in &other.order {
      let other_entry = match other.entries.get(k) {
        Some(e) => e,
        None => continue,
      };
      match self.entries.get_mut(k) {
        None => {
          self.order.push(k.clone());
          self.entries.insert(k.clone(), Entry {
            value: other_entry.value.clone(),
            count: other_entry.count,
          });
          changed = true;
        }
        Some(existing) => {
          let new_count = existing.count + other_entry.count;
          if new_count != existing.count {
            changed = true;
          }
          existing.count = new_count;
        }
      }
    }
    changed
  }
}

/// An ordered set where membership is governed by the same activation counter
/// as `ActivationMap`, specialized to the case where the stored value is the
/// key itself.
#[derive(Debug, Clone)]
pub struct ActivationSet<T> {
  inner: ActivationMap<T, T>,
}

impl<T> Default for ActivationSet<T> {
  fn default() -> Self {
    ActivationSet {
      inner: ActivationMap::default(),
    }
  }
}

impl<T: Eq + Hash + Clone> ActivationSet<T> {
  pub fn new() -> Self { Self::default() }

  /// Adds `k` with counter 1 if it has never been seen; a no-op otherwise, so
  /// repeated `add` calls from independent sources stay idempotent.
  pub fn add(&mut self, k: T) {
    if !self.inner.has(&k) {
      self.inner.put(k.clone(), k);
    }
  }

  pub fn activate(&mut self, k: &T) { self.inner.activate(k); }

  pub fn deactivate(&mut self, k: &T) { self.inner.deactivate(k); }

  pub fn has(&self, k: &T) -> bool { self.inner.has(k) }

  pub fn is_activated(&self, k: &T) -> Result<bool>
  where
    T: ToString,
  {
    self.inner.is_activated(k)
  }

  /// Members in first-insertion order, regardless of current activation.
  pub fn keys(&self) -> impl Iterator<Item = &T> { self.inner.keys() }

  /// Active members, in first-insertion order.
  pub fn elements(&self) -> impl Iterator<Item = &T> { self.inner.elements() }

  pub fn len(&self) -> usize { self.inner.len() }

  pub fn is_empty(&self) -> bool { self.inner.is_empty() }

  pub fn merge(&mut self, other: &Self) -> bool { self.inner.merge(&other.inner) }
}

impl<T: Eq + Hash + Clone + ToString> FromIterator<T> for ActivationSet<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let mut set = ActivationSet::new();
    for item in iter {
      set.add(item);
    }
    set
  }
}

// Wire format (§6): an activation set serializes as `{member: activated_bool}`
// and an activation map as `{key: {value, activated}}`. Neither shape matches
// the in-memory `Vec` + counter representation closely enough for derive, so
// both containers get hand-written impls, in insertion order.

impl<K, V> Serialize for ActivationMap<K, V>
where
  K: Eq + Hash + Clone + ToString,
  V: Serialize,
{
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for k in &self.order {
      if let Some(entry) = self.entries.get(k) {
        map.serialize_entry(&k.to_string(), &WireEntry {
          value: &entry.value,
          activated: entry.count > 0,
        })?;
      }
    }
    map.end()
  }
}

#[derive(Serialize)]
struct WireEntry<'a, V> {
  value: &'a V,
  activated: bool,
}

#[derive(Deserialize)]
struct OwnedWireEntry<V> {
  value: V,
  activated: bool,
}

impl<'de, K, V> Deserialize<'de> for ActivationMap<K, V>
where
  K: Eq + Hash + Clone + From<String>,
  V: Deserialize<'de>,
{
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    struct MapVisitor<K, V>(PhantomData<(K, V)>);

    impl<'de, K, V> Visitor<'de> for MapVisitor<K, V>
    where
      K: Eq + Hash + Clone + From<String>,
      V: Deserialize<'de>,
    {
      type Value = ActivationMap<K, V>;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map of key to {{value, activated}}")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut out = ActivationMap::new();
        while let Some((key, entry)) = access.next_entry::<String, OwnedWireEntry<V>>()? {
          let key = K::from(key);
          out.order.push(key.clone());
          out.entries.insert(key, Entry {
            value: entry.value,
            count: if entry.activated { 1 } else { 0 },
          });
        }
        Ok(out)
      }
    }

    deserializer.deserialize_map(MapVisitor(PhantomData))
  }
}

impl<T> Serialize for ActivationSet<T>
where
  T: Eq + Hash + Clone + ToString,
{
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.inner.entries.len()))?;
    for k in &self.inner.order {
      if let Some(entry) = self.inner.entries.get(k) {
        map.serialize_entry(&k.to_string(), &(entry.count > 0))?;
      }
    }
    map.end()
  }
}

impl<'de, T> Deserialize<'de> for ActivationSet<T>
where
  T: Eq + Hash + Clone + From<String>,
{
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    struct SetVisitor<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for SetVisitor<T>
    where
      T: Eq + Hash + Clone + From<String>,
    {
      type Value = ActivationSet<T>;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map of member to activated bool")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut out = ActivationSet::new();
        while let Some((key, activated)) = access.next_entry::<String, bool>()? {
          let key = T::from(key);
          out.inner.order.push(key.clone());
          out.inner.entries.insert(key.clone(), Entry {
            value: key,
            count: if activated { 1 } else { 0 },
          });
        }
        Ok(out)
      }
    }

    deserializer.deserialize_map(SetVisitor(PhantomData))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn activation_is_commutative() {
    let mut a = ActivationSet::new();
    a.add("x".to_string());
    a.activate(&"x".to_string());
    a.deactivate(&"x".to_string());
    // net +1 (add) +1 (activate) -1 (deactivate) = 1, still active
    assert!(a.is_activated(&"x".to_string()).unwrap());

    let mut b = ActivationSet::new();
    b.add("x".to_string());
    b.deactivate(&"x".to_string());
    b.activate(&"x".to_string());
    assert!(b.is_activated(&"x".to_string()).unwrap());
  }

  #[test]
  fn deactivate_past_zero_is_inactive() {
    let mut s = ActivationSet::new();
    s.add("x".to_string());
    s.deactivate(&"x".to_string());
    assert!(!s.is_activated(&"x".to_string()).unwrap());
    assert_eq!(s.elements().count(), 0);
  }

  #[test]
  fn unknown_key_is_not_found() {
    let s: ActivationSet<String> = ActivationSet::new();
    assert!(s.is_activated(&"ghost".to_string()).is_err());
  }

  #[test]
  fn preserves_first_insertion_order() {
    let mut s = ActivationSet::new();
    s.add("b".to_string());
    s.add("a".to_string());
    s.add("c".to_string());
    let order: Vec<_> = s.elements().cloned().collect();
    assert_eq!(order, vec!["b".to_string(), "a".to_string(), "c".to_string()]);
  }

  #[test]
  fn merge_sums_counters_and_reports_change() {
    let mut a = ActivationSet::new();
    a.add("x".to_string());
    let mut b = ActivationSet::new();
    b.add("x".to_string());
    b.add("y".to_string());

    assert!(a.merge(&b));
    assert!(a.is_activated(&"x".to_string()).unwrap());
    assert!(a.is_activated(&"y".to_string()).unwrap());

    // merging again with the same already-active state is still a net change
    // in counter value (2 -> 3) even though activation state is unchanged;
    // what matters to callers is whether re-processing could be necessary.
    assert!(a.merge(&b));
  }

  #[test]
  fn merge_no_op_when_other_is_empty() {
    let mut a = ActivationSet::new();
    a.add("x".to_string());
    let b: ActivationSet<String> = ActivationSet::new();
    assert!(!a.merge(&b));
  }

  #[test]
  fn activation_map_put_overwrites_value_and_resets_counter() {
    let mut m: ActivationMap<String, i32> = ActivationMap::new();
    m.put("k".to_string(), 1);
    m.deactivate(&"k".to_string());
    assert!(!m.is_activated(&"k".to_string()).unwrap());
    m.put("k".to_string(), 2);
    assert!(m.is_activated(&"k".to_string()).unwrap());
    assert_eq!(*m.get(&"k".to_string()).unwrap(), 2);
  }

  #[test]
  fn activation_set_json_round_trips_active_membership() {
    let mut s: ActivationSet<String> = ActivationSet::new();
    s.add("a".to_string());
    s.add("b".to_string());
    s.deactivate(&"b".to_string());

    let json = serde_json::to_string(&s).unwrap();
    let back: ActivationSet<String> = serde_json::from_str(&json).unwrap();
    assert!(back.is_activated(&"a".to_string()).unwrap());
    assert!(!back.is_activated(&"b".to_string()).unwrap());
  }
}
