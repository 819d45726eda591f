//! Variable scope extraction.
//!
//! A bind construct either declares its variables explicitly or has them
//! discovered as the free variables of its pattern body. Both forms produce
//! the same ordered, duplicate-free scope structure. This is pure syntax
//! analysis; no matching is attempted here.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BindResult, ConstructionError};
use crate::fragment::{Fragment, FragmentId, LinkKind};
use crate::storage::FragmentStore;

/// Fetches a fragment, failing on dangling references.
pub(crate) fn fetch(store: &dyn FragmentStore, id: FragmentId) -> BindResult<Fragment> {
    store
        .get(id)?
        .ok_or_else(|| ConstructionError::DanglingReference { id }.into())
}

/// Restriction on the fragments a variable may ground to.
///
/// Names the fragment kind a grounding must have (`"Symbol"`, `"Variable"`,
/// or a link kind name such as `"Edge"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRestriction {
    kind: String,
}

impl TypeRestriction {
    /// Creates a restriction on the named fragment kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    /// The required kind name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns true if the fragment satisfies the restriction.
    #[must_use]
    pub fn admits(&self, fragment: &Fragment) -> bool {
        fragment.type_name() == self.kind
    }
}

impl fmt::Display for TypeRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// A declared variable with an optional type restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedVariable {
    name: String,
    restriction: Option<TypeRestriction>,
}

impl ScopedVariable {
    /// Creates an unrestricted scoped variable.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            restriction: None,
        }
    }

    /// Creates a scoped variable with a type restriction.
    #[must_use]
    pub fn restricted(name: impl Into<String>, restriction: TypeRestriction) -> Self {
        Self {
            name: name.into(),
            restriction: Some(restriction),
        }
    }

    /// The variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type restriction, if any.
    #[must_use]
    pub const fn restriction(&self) -> Option<&TypeRestriction> {
        self.restriction.as_ref()
    }
}

/// Ordered, duplicate-free set of scoped variables.
///
/// Insertion order follows first occurrence; later duplicates collapse into
/// the first entry, keeping its restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableScope {
    variables: Vec<ScopedVariable>,
}

impl VariableScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovers the free variables of `body` (implicit mode).
    ///
    /// Traverses the body and collects every variable leaf not bound by a
    /// nested scoping construct. A nested [`LinkKind::Bind`] binds its own
    /// variables; those are excluded within that subtree.
    pub fn find_free(store: &dyn FragmentStore, body: FragmentId) -> BindResult<Self> {
        let mut scope = Self::new();
        let bound = HashSet::new();
        collect_free(store, body, &bound, &mut scope)?;
        Ok(scope)
    }

    /// Parses an explicit declaration fragment (explicit mode).
    ///
    /// Accepted forms: a single variable, a typed variable pair, or a
    /// variable list of those. Fails with
    /// [`ConstructionError::MalformedDeclaration`] on an empty list, a
    /// non-variable member, or a misshapen typed pair.
    pub fn parse_declaration(store: &dyn FragmentStore, decl: FragmentId) -> BindResult<Self> {
        let mut scope = Self::new();
        match fetch(store, decl)? {
            Fragment::Variable { name } => {
                scope.push(ScopedVariable::new(name));
            }
            Fragment::Link {
                kind: LinkKind::TypedVariable,
                outgoing,
            } => {
                scope.push(parse_typed(store, &outgoing)?);
            }
            Fragment::Link {
                kind: LinkKind::VariableList,
                outgoing,
            } => {
                if outgoing.is_empty() {
                    return Err(malformed("empty variable list"));
                }
                for member in outgoing {
                    match fetch(store, member)? {
                        Fragment::Variable { name } => scope.push(ScopedVariable::new(name)),
                        Fragment::Link {
                            kind: LinkKind::TypedVariable,
                            outgoing: pair,
                        } => scope.push(parse_typed(store, &pair)?),
                        other => {
                            return Err(malformed(format!(
                                "expected a variable, got {}",
                                other.type_name()
                            )));
                        }
                    }
                }
            }
            other => {
                return Err(malformed(format!(
                    "expected a variable declaration, got {}",
                    other.type_name()
                )));
            }
        }
        Ok(scope)
    }

    /// Number of variables in scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns true if no variables are in scope.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Returns true if the variable is in scope.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v.name() == name)
    }

    /// The restriction attached to a variable, if any.
    #[must_use]
    pub fn restriction_of(&self, name: &str) -> Option<&TypeRestriction> {
        self.variables
            .iter()
            .find(|v| v.name() == name)
            .and_then(ScopedVariable::restriction)
    }

    /// Iterates the scoped variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ScopedVariable> {
        self.variables.iter()
    }

    /// Variable names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(ScopedVariable::name).collect()
    }

    fn push(&mut self, variable: ScopedVariable) {
        if !self.contains(variable.name()) {
            self.variables.push(variable);
        }
    }
}

fn malformed(reason: impl Into<String>) -> crate::error::BindError {
    ConstructionError::MalformedDeclaration {
        reason: reason.into(),
    }
    .into()
}

fn parse_typed(store: &dyn FragmentStore, pair: &[FragmentId]) -> BindResult<ScopedVariable> {
    let &[variable, restriction] = pair else {
        return Err(malformed(format!(
            "typed variable must pair a variable with a type, got {} members",
            pair.len()
        )));
    };
    let Fragment::Variable { name } = fetch(store, variable)? else {
        return Err(malformed("typed variable's first member must be a variable"));
    };
    let Fragment::Symbol { name: kind } = fetch(store, restriction)? else {
        return Err(malformed(
            "typed variable's second member must be a type symbol",
        ));
    };
    Ok(ScopedVariable::restricted(name, TypeRestriction::new(kind)))
}

fn collect_free(
    store: &dyn FragmentStore,
    id: FragmentId,
    bound: &HashSet<String>,
    scope: &mut VariableScope,
) -> BindResult<()> {
    match fetch(store, id)? {
        Fragment::Symbol { .. } => Ok(()),
        Fragment::Variable { name } => {
            if !bound.contains(&name) {
                scope.push(ScopedVariable::new(name));
            }
            Ok(())
        }
        Fragment::Link { kind, outgoing } => {
            if kind == LinkKind::Bind {
                // A nested bind scopes its own variables: the first member of
                // its outgoing set (explicit declaration or implicit body)
                // determines what is shadowed beneath it.
                let mut shadowed = bound.clone();
                if let Some(&head) = outgoing.first() {
                    variable_leaves(store, head, &mut shadowed)?;
                }
                for child in outgoing {
                    collect_free(store, child, &shadowed, scope)?;
                }
            } else {
                for child in outgoing {
                    collect_free(store, child, bound, scope)?;
                }
            }
            Ok(())
        }
    }
}

fn variable_leaves(
    store: &dyn FragmentStore,
    id: FragmentId,
    names: &mut HashSet<String>,
) -> BindResult<()> {
    match fetch(store, id)? {
        Fragment::Symbol { .. } => Ok(()),
        Fragment::Variable { name } => {
            names.insert(name);
            Ok(())
        }
        Fragment::Link { outgoing, .. } => {
            for child in outgoing {
                variable_leaves(store, child, names)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryFragmentStore;

    #[test]
    fn test_find_free_orders_by_first_occurrence() {
        let store = InMemoryFragmentStore::new();
        let likes = store.symbol("likes").unwrap();
        let x = store.variable("$x").unwrap();
        let y = store.variable("$y").unwrap();
        // edge(likes, $x, $y) and edge(likes, $y, $x): duplicates collapse.
        let e1 = store.link(LinkKind::Edge, vec![likes, x, y]).unwrap();
        let e2 = store.link(LinkKind::Edge, vec![likes, y, x]).unwrap();
        let body = store.link(LinkKind::And, vec![e1, e2]).unwrap();

        let scope = VariableScope::find_free(&store, body).unwrap();
        assert_eq!(scope.names(), vec!["$x", "$y"]);
    }

    #[test]
    fn test_find_free_ignores_symbols() {
        let store = InMemoryFragmentStore::new();
        let likes = store.symbol("likes").unwrap();
        let alice = store.symbol("alice").unwrap();
        let body = store.link(LinkKind::Edge, vec![likes, alice]).unwrap();

        let scope = VariableScope::find_free(&store, body).unwrap();
        assert!(scope.is_empty());
    }

    #[test]
    fn test_find_free_excludes_nested_bind_scope() {
        let store = InMemoryFragmentStore::new();
        let x = store.variable("$x").unwrap();
        let y = store.variable("$y").unwrap();
        let rel = store.symbol("rel").unwrap();
        let inner_body = store.link(LinkKind::Edge, vec![rel, y]).unwrap();
        let nested = store.link(LinkKind::Bind, vec![inner_body, y]).unwrap();
        let body = store.link(LinkKind::List, vec![x, nested]).unwrap();

        let scope = VariableScope::find_free(&store, body).unwrap();
        assert_eq!(scope.names(), vec!["$x"]);
    }

    #[test]
    fn test_parse_single_variable() {
        let store = InMemoryFragmentStore::new();
        let x = store.variable("$x").unwrap();
        let scope = VariableScope::parse_declaration(&store, x).unwrap();
        assert_eq!(scope.names(), vec!["$x"]);
        assert!(scope.restriction_of("$x").is_none());
    }

    #[test]
    fn test_parse_typed_variable() {
        let store = InMemoryFragmentStore::new();
        let x = store.variable("$x").unwrap();
        let kind = store.symbol("Symbol").unwrap();
        let typed = store.link(LinkKind::TypedVariable, vec![x, kind]).unwrap();

        let scope = VariableScope::parse_declaration(&store, typed).unwrap();
        assert_eq!(scope.names(), vec!["$x"]);
        assert_eq!(scope.restriction_of("$x").unwrap().kind(), "Symbol");
    }

    #[test]
    fn test_parse_variable_list_preserves_order_and_collapses_duplicates() {
        let store = InMemoryFragmentStore::new();
        let x = store.variable("$x").unwrap();
        let y = store.variable("$y").unwrap();
        let list = store
            .link(LinkKind::VariableList, vec![y, x, y])
            .unwrap();

        let scope = VariableScope::parse_declaration(&store, list).unwrap();
        assert_eq!(scope.names(), vec!["$y", "$x"]);
    }

    #[test]
    fn test_parse_empty_list_is_malformed() {
        let store = InMemoryFragmentStore::new();
        let list = store.link(LinkKind::VariableList, vec![]).unwrap();
        let err = VariableScope::parse_declaration(&store, list).unwrap_err();
        assert!(matches!(
            err,
            crate::error::BindError::Construction(ConstructionError::MalformedDeclaration { .. })
        ));
    }

    #[test]
    fn test_parse_non_variable_member_is_malformed() {
        let store = InMemoryFragmentStore::new();
        let x = store.variable("$x").unwrap();
        let alice = store.symbol("alice").unwrap();
        let list = store.link(LinkKind::VariableList, vec![x, alice]).unwrap();

        let err = VariableScope::parse_declaration(&store, list).unwrap_err();
        assert!(matches!(
            err,
            crate::error::BindError::Construction(ConstructionError::MalformedDeclaration { .. })
        ));
    }

    #[test]
    fn test_parse_misshapen_typed_variable_is_malformed() {
        let store = InMemoryFragmentStore::new();
        let x = store.variable("$x").unwrap();
        let typed = store.link(LinkKind::TypedVariable, vec![x]).unwrap();
        assert!(VariableScope::parse_declaration(&store, typed).is_err());
    }

    #[test]
    fn test_parse_symbol_declaration_is_malformed() {
        let store = InMemoryFragmentStore::new();
        let alice = store.symbol("alice").unwrap();
        assert!(VariableScope::parse_declaration(&store, alice).is_err());
    }
}
