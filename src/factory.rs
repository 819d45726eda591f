//! Construct factory: kind-tag dispatch.
//!
//! Generic store/query infrastructure holds raw fragments, not typed
//! constructs. The factory maps recognized link kinds to builder functions
//! so such infrastructure can instantiate a construct from a root fragment
//! without knowing its concrete type up front.

use std::collections::HashMap;

use crate::construct::BindConstruct;
use crate::error::{BindResult, ConstructionError};
use crate::fragment::{FragmentId, LinkKind};
use crate::scope::fetch;
use crate::storage::FragmentStore;

/// Builder signature for registered construct kinds.
pub type ConstructBuilder = fn(&dyn FragmentStore, FragmentId) -> BindResult<BindConstruct>;

/// Registry mapping link kinds to construct builders.
#[derive(Debug, Clone)]
pub struct ConstructFactory {
    builders: HashMap<LinkKind, ConstructBuilder>,
}

impl ConstructFactory {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Creates a registry with the bind kind pre-registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut factory = Self::empty();
        factory.register(LinkKind::Bind, BindConstruct::from_fragment);
        factory
    }

    /// Registers a builder for a kind, replacing any existing registration.
    pub fn register(&mut self, kind: LinkKind, builder: ConstructBuilder) {
        self.builders.insert(kind, builder);
    }

    /// Returns true if the kind has a registered builder.
    #[must_use]
    pub fn recognizes(&self, kind: LinkKind) -> bool {
        self.builders.contains_key(&kind)
    }

    /// Instantiates a construct from a raw root fragment by kind dispatch.
    ///
    /// Fails with [`ConstructionError::TypeMismatch`] when the root is a
    /// leaf or its kind has no registered builder.
    pub fn build(&self, store: &dyn FragmentStore, root: FragmentId) -> BindResult<BindConstruct> {
        let fragment = fetch(store, root)?;
        let builder = fragment
            .kind()
            .and_then(|kind| self.builders.get(&kind))
            .ok_or_else(|| ConstructionError::TypeMismatch {
                kind: fragment.type_name().to_string(),
            })?;
        builder(store, root)
    }
}

impl Default for ConstructFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}
