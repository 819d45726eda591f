//! The bind construct: structural validation and decomposition.
//!
//! A bind construct declares bound variables, a pattern body, and a rewrite
//! template ("implicand"). Validation happens once at construction time and
//! is always fatal on failure; the resulting construct is immutable, holds
//! no store reference, and is reusable across executions.

use crate::error::{BindResult, ConstructionError};
use crate::fragment::{Fragment, FragmentId, LinkKind};
use crate::scope::{fetch, VariableScope};
use crate::storage::FragmentStore;

/// A validated, immutable bind query/rewrite construct.
///
/// Two forms are accepted, selected by the outgoing arity:
///
/// - **2 members** (implicit): `[body, implicand]` — the variable scope is
///   discovered as the free variables of the body.
/// - **3 members** (explicit): `[vardecl, body, implicand]` — the scope is
///   parsed from the declaration fragment.
///
/// Any other arity fails with [`ConstructionError::Structural`] naming the
/// actual size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindConstruct {
    vardecl: Option<FragmentId>,
    body: FragmentId,
    implicand: FragmentId,
    scope: VariableScope,
}

impl BindConstruct {
    /// Validates and decomposes a raw outgoing sequence.
    pub fn new(store: &dyn FragmentStore, outgoing: &[FragmentId]) -> BindResult<Self> {
        match outgoing {
            &[body, implicand] => {
                ensure_present(store, implicand)?;
                let scope = VariableScope::find_free(store, body)?;
                Ok(Self {
                    vardecl: None,
                    body,
                    implicand,
                    scope,
                })
            }
            &[vardecl, body, implicand] => {
                ensure_present(store, body)?;
                ensure_present(store, implicand)?;
                let scope = VariableScope::parse_declaration(store, vardecl)?;
                Ok(Self {
                    vardecl: Some(vardecl),
                    body,
                    implicand,
                    scope,
                })
            }
            _ => Err(ConstructionError::Structural {
                actual: outgoing.len(),
            }
            .into()),
        }
    }

    /// Builds a construct from a raw root fragment.
    ///
    /// The root's kind must be [`LinkKind::Bind`]; any other fragment fails
    /// with [`ConstructionError::TypeMismatch`] naming the offending kind.
    pub fn from_fragment(store: &dyn FragmentStore, root: FragmentId) -> BindResult<Self> {
        match fetch(store, root)? {
            Fragment::Link {
                kind: LinkKind::Bind,
                outgoing,
            } => Self::new(store, &outgoing),
            other => Err(ConstructionError::TypeMismatch {
                kind: other.type_name().to_string(),
            }
            .into()),
        }
    }

    /// Convenience constructor for the implicit two-part form.
    pub fn implicit(
        store: &dyn FragmentStore,
        body: FragmentId,
        implicand: FragmentId,
    ) -> BindResult<Self> {
        Self::new(store, &[body, implicand])
    }

    /// Convenience constructor for the explicit three-part form.
    pub fn with_declaration(
        store: &dyn FragmentStore,
        vardecl: FragmentId,
        body: FragmentId,
        implicand: FragmentId,
    ) -> BindResult<Self> {
        Self::new(store, &[vardecl, body, implicand])
    }

    /// The explicit variable declaration, if the construct has one.
    #[must_use]
    pub const fn vardecl(&self) -> Option<FragmentId> {
        self.vardecl
    }

    /// The pattern body.
    #[must_use]
    pub const fn body(&self) -> FragmentId {
        self.body
    }

    /// The rewrite template.
    #[must_use]
    pub const fn implicand(&self) -> FragmentId {
        self.implicand
    }

    /// The variable scope.
    #[must_use]
    pub const fn scope(&self) -> &VariableScope {
        &self.scope
    }
}

fn ensure_present(store: &dyn FragmentStore, id: FragmentId) -> BindResult<()> {
    if store.contains(id)? {
        Ok(())
    } else {
        Err(ConstructionError::DanglingReference { id }.into())
    }
}
