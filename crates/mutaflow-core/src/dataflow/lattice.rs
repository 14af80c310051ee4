//! Powerset lattice of data-flow facts
//!
//! - Bottom (⊥) = the empty set
//! - Join = set union
//! - Order = subset inclusion
//!
//! Sets are ordered so that tables, reports and tests are deterministic.

use crate::syntax::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

/// A definition of `name` at `site` (assignment, local declaration or
/// `for` initializer).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Definition {
    pub site: NodeId,
    pub name: String,
}

impl Definition {
    pub fn new(site: NodeId, name: impl Into<String>) -> Self {
        Self {
            site,
            name: name.into(),
        }
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.site)
    }
}

/// A read of `name` by the identifier node `site`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Use {
    pub site: NodeId,
    pub name: String,
}

impl Use {
    pub fn new(site: NodeId, name: impl Into<String>) -> Self {
        Self {
            site,
            name: name.into(),
        }
    }
}

impl fmt::Display for Use {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.site)
    }
}

/// Facts that are about a named variable.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Definition {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Use {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Duplicate-free ordered set of facts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactSet<T: Ord> {
    facts: BTreeSet<T>,
}

impl<T: Ord> Default for FactSet<T> {
    fn default() -> Self {
        Self { facts: BTreeSet::new() }
    }
}

impl<T: Ord + Clone> FactSet<T> {
    /// The bottom element.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fact: T) -> bool {
        self.facts.insert(fact)
    }

    pub fn contains(&self, fact: &T) -> bool {
        self.facts.contains(fact)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, T> {
        self.facts.iter()
    }

    /// Least upper bound.
    pub fn join(&self, other: &Self) -> Self {
        Self {
            facts: self.facts.union(&other.facts).cloned().collect(),
        }
    }

    pub fn union_with(&mut self, other: &Self) {
        self.facts.extend(other.facts.iter().cloned());
    }

    pub fn difference(&self, other: &Self) -> Self {
        Self {
            facts: self.facts.difference(&other.facts).cloned().collect(),
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.facts.is_subset(&other.facts)
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.facts.retain(keep);
    }
}

impl<T: Ord + Clone + Named> FactSet<T> {
    /// Facts about `name`.
    pub fn named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a T> + use<'a, 'n, T> {
        self.facts.iter().filter(move |f| f.name() == name)
    }

    /// Distinct variable names, in order.
    pub fn names(&self) -> BTreeSet<&str> {
        self.facts.iter().map(Named::name).collect()
    }

    /// Removes every fact about a variable in `names`.
    pub fn kill<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        let names: BTreeSet<&str> = names.into_iter().collect();
        if !names.is_empty() {
            self.facts.retain(|f| !names.contains(f.name()));
        }
    }
}

impl<T: Ord> FromIterator<T> for FactSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

impl<T: Ord> Extend<T> for FactSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.facts.extend(iter);
    }
}

impl<'a, T: Ord> IntoIterator for &'a FactSet<T> {
    type Item = &'a T;
    type IntoIter = btree_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.facts.iter()
    }
}

impl<T: Ord> IntoIterator for FactSet<T> {
    type Item = T;
    type IntoIter = btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.facts.into_iter()
    }
}

impl<T: Ord + fmt::Display> fmt::Display for FactSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, fact) in self.facts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{fact}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn defs(pairs: &[(u32, &str)]) -> FactSet<Definition> {
        pairs.iter().map(|&(site, name)| Definition::new(NodeId(site), name)).collect()
    }

    fn from_raw(raw: Vec<(u8, u8)>) -> FactSet<Definition> {
        raw.into_iter()
            .map(|(site, name)| Definition::new(NodeId(site as u32), format!("v{}", name % 4)))
            .collect()
    }

    #[test]
    fn test_kill_removes_all_sites_of_name() {
        let mut set = defs(&[(1, "x"), (4, "x"), (5, "y")]);
        set.kill(["x"]);
        assert_eq!(set, defs(&[(5, "y")]));
    }

    #[test]
    fn test_names_are_distinct() {
        let set = defs(&[(1, "x"), (4, "x"), (5, "y")]);
        assert_eq!(set.names().into_iter().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(set.named("x").count(), 2);
    }

    #[test]
    fn test_display() {
        let set = defs(&[(5, "y"), (1, "x")]);
        assert_eq!(set.to_string(), "{x@#1, y@#5}");
    }

    #[quickcheck]
    fn prop_join_is_commutative(a: Vec<(u8, u8)>, b: Vec<(u8, u8)>) -> bool {
        let (a, b) = (from_raw(a), from_raw(b));
        a.join(&b) == b.join(&a)
    }

    #[quickcheck]
    fn prop_join_is_idempotent(a: Vec<(u8, u8)>) -> bool {
        let a = from_raw(a);
        a.join(&a) == a
    }

    #[quickcheck]
    fn prop_bottom_is_identity(a: Vec<(u8, u8)>) -> bool {
        let a = from_raw(a);
        a.join(&FactSet::new()) == a
    }

    #[quickcheck]
    fn prop_join_is_upper_bound(a: Vec<(u8, u8)>, b: Vec<(u8, u8)>) -> bool {
        let (a, b) = (from_raw(a), from_raw(b));
        let joined = a.join(&b);
        a.is_subset(&joined) && b.is_subset(&joined)
    }

    #[quickcheck]
    fn prop_difference_then_join_restores(a: Vec<(u8, u8)>, b: Vec<(u8, u8)>) -> bool {
        let (a, b) = (from_raw(a), from_raw(b));
        let restored = a.difference(&b).join(&b);
        a.is_subset(&restored)
    }
}
