//! In-memory storage backend.
//!
//! Thread-safe reference implementation of [`FragmentStore`], intended for
//! embedded usage and tests.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::fragment::{Fragment, FragmentId, LinkKind};
use crate::storage::traits::{FragmentStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct StoreState {
    by_id: HashMap<FragmentId, Fragment>,
    by_kind: HashMap<LinkKind, HashSet<FragmentId>>,
}

/// Thread-safe in-memory fragment store.
#[derive(Debug, Default)]
pub struct InMemoryFragmentStore {
    state: RwLock<StoreState>,
}

impl InMemoryFragmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FragmentStore for InMemoryFragmentStore {
    fn insert(&self, fragment: Fragment) -> Result<FragmentId, StorageError> {
        let id = fragment.id();
        let mut state = self.state.write().map_err(|_| lock_err("insert"))?;

        if state.by_id.contains_key(&id) {
            return Ok(id);
        }

        for child in fragment.outgoing() {
            if !state.by_id.contains_key(child) {
                return Err(StorageError::UnknownChild(*child));
            }
        }

        if let Some(kind) = fragment.kind() {
            state.by_kind.entry(kind).or_default().insert(id);
        }
        state.by_id.insert(id, fragment);
        Ok(id)
    }

    fn get(&self, id: FragmentId) -> Result<Option<Fragment>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("get"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn contains(&self, id: FragmentId) -> Result<bool, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("contains"))?;
        Ok(state.by_id.contains_key(&id))
    }

    fn links_with_kind(&self, kind: LinkKind) -> Result<Vec<FragmentId>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("links_with_kind"))?;
        let mut ids: Vec<FragmentId> = state
            .by_kind
            .get(&kind)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        Ok(ids)
    }

    fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("len"))?;
        Ok(state.by_id.len())
    }
}
