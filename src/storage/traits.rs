//! Abstract storage trait for graph fragments.
//!
//! The store is content-addressed and deduplicating: inserting a
//! structurally identical fragment twice returns the same identifier and
//! does not duplicate storage. Implementations must provide a consistent
//! read view during a single call and serialize concurrent mutating
//! insertions; callers at this layer never lock.

use thiserror::Error;

use crate::fragment::{Fragment, FragmentId, LinkKind};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A link references a child that is not interned.
    #[error("Link references unknown fragment: {0}")]
    UnknownChild(FragmentId),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Deduplicating, content-addressed fragment store.
pub trait FragmentStore: Send + Sync {
    /// Interns a fragment and returns its canonical id.
    ///
    /// Idempotent: re-inserting an already-present fragment returns the
    /// existing identifier. Children of a link must already be interned.
    fn insert(&self, fragment: Fragment) -> Result<FragmentId, StorageError>;

    /// Gets a fragment by id.
    fn get(&self, id: FragmentId) -> Result<Option<Fragment>, StorageError>;

    /// Returns true if the id is interned.
    fn contains(&self, id: FragmentId) -> Result<bool, StorageError>;

    /// All interned links of the given kind, in stable (id) order.
    fn links_with_kind(&self, kind: LinkKind) -> Result<Vec<FragmentId>, StorageError>;

    /// Number of interned fragments.
    fn len(&self) -> Result<usize, StorageError>;

    /// Returns true if the store holds no fragments.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Interns a symbol leaf.
    fn symbol(&self, name: &str) -> Result<FragmentId, StorageError> {
        self.insert(Fragment::symbol(name))
    }

    /// Interns a variable leaf.
    fn variable(&self, name: &str) -> Result<FragmentId, StorageError> {
        self.insert(Fragment::variable(name))
    }

    /// Interns a link over already-interned children.
    fn link(&self, kind: LinkKind, outgoing: Vec<FragmentId>) -> Result<FragmentId, StorageError> {
        self.insert(Fragment::link(kind, outgoing))
    }
}
