//! Result materialization.
//!
//! Each execution produces a [`GroundingSet`]; materialization wraps it into
//! a single unordered aggregate fragment and persists it through the store's
//! deduplicating insertion. Callers needing a purely in-memory result
//! without store mutation are a deferred future option; today insertion is
//! unconditional.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::fragment::{Fragment, FragmentId, LinkKind};
use crate::storage::{FragmentStore, StorageError};

/// Deduplicated set of grounded rewrite instances.
///
/// Semantically a set, not a sequence: membership is by fragment identity
/// and iteration order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSet {
    members: BTreeSet<FragmentId>,
}

impl GroundingSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding one instance.
    #[must_use]
    pub fn singleton(id: FragmentId) -> Self {
        let mut set = Self::new();
        set.insert(id);
        set
    }

    /// Inserts an instance; returns false if it was already present.
    pub fn insert(&mut self, id: FragmentId) -> bool {
        self.members.insert(id)
    }

    /// Returns true if the instance is a member.
    #[must_use]
    pub fn contains(&self, id: FragmentId) -> bool {
        self.members.contains(&id)
    }

    /// Number of distinct instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates the member ids.
    pub fn iter(&self) -> impl Iterator<Item = FragmentId> + '_ {
        self.members.iter().copied()
    }
}

impl FromIterator<FragmentId> for GroundingSet {
    fn from_iter<I: IntoIterator<Item = FragmentId>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

/// Wraps a grounding set into one unordered aggregate and interns it.
///
/// Returns the canonical id of the aggregate, which may pre-exist:
/// insertion is idempotent, and because [`LinkKind::Set`] identity ignores
/// child order, any permutation of the same members materializes to the
/// same id.
pub fn materialize(
    results: &GroundingSet,
    store: &dyn FragmentStore,
) -> Result<FragmentId, StorageError> {
    store.insert(Fragment::link(LinkKind::Set, results.iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryFragmentStore;

    #[test]
    fn test_grounding_set_deduplicates() {
        let a = Fragment::symbol("a").id();
        let mut set = GroundingSet::new();
        assert!(set.insert(a));
        assert!(!set.insert(a));
        assert_eq!(set.len(), 1);
        assert!(set.contains(a));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let store = InMemoryFragmentStore::new();
        let a = store.symbol("a").unwrap();
        let b = store.symbol("b").unwrap();
        let set: GroundingSet = [a, b].into_iter().collect();

        let before = store.len().unwrap();
        let first = materialize(&set, &store).unwrap();
        let second = materialize(&set, &store).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len().unwrap(), before + 1);
    }

    #[test]
    fn test_materialize_is_order_independent() {
        let store = InMemoryFragmentStore::new();
        let a = store.symbol("a").unwrap();
        let b = store.symbol("b").unwrap();
        let c = store.symbol("c").unwrap();

        let forward: GroundingSet = [a, b, c].into_iter().collect();
        let backward: GroundingSet = [c, b, a].into_iter().collect();
        assert_eq!(
            materialize(&forward, &store).unwrap(),
            materialize(&backward, &store).unwrap()
        );
    }

    #[test]
    fn test_materialize_empty_set() {
        let store = InMemoryFragmentStore::new();
        let id = materialize(&GroundingSet::new(), &store).unwrap();
        let aggregate = store.get(id).unwrap().unwrap();
        assert_eq!(aggregate.kind(), Some(LinkKind::Set));
        assert!(aggregate.outgoing().is_empty());
    }

    #[test]
    fn test_grounding_set_serialization() {
        let a = Fragment::symbol("a").id();
        let set = GroundingSet::singleton(a);
        let json = serde_json::to_string(&set).unwrap();
        let back: GroundingSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, back);
    }
}
