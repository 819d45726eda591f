//! Pattern compilation: clause partition and connectivity analysis.
//!
//! The body of a bind construct is decomposed into clauses: a conjunction
//! link contributes one clause per member, anything else is a single clause.
//! Clauses wrapped in an absence marker form the `optional` partition; the
//! rest are `mandatory`. Clauses sharing a scope variable belong to the same
//! connected component.

use std::collections::HashSet;

use crate::construct::BindConstruct;
use crate::error::MatchError;
use crate::fragment::{Fragment, FragmentId, LinkKind};
use crate::scope::VariableScope;
use crate::storage::FragmentStore;

pub(crate) fn fetch(store: &dyn FragmentStore, id: FragmentId) -> Result<Fragment, MatchError> {
    store
        .get(id)
        .map_err(|e| MatchError::Internal {
            message: e.to_string(),
        })?
        .ok_or_else(|| MatchError::MalformedBody {
            reason: format!("unknown fragment {id}"),
        })
}

/// A pattern body decomposed into mandatory and optional clauses.
#[derive(Debug, Clone)]
pub struct Pattern {
    scope: VariableScope,
    mandatory: Vec<FragmentId>,
    optional: Vec<FragmentId>,
    components: Vec<Vec<FragmentId>>,
}

impl Pattern {
    /// Compiles the body of a bind construct.
    ///
    /// Fails with [`MatchError::MalformedBody`] when a clause is a bare
    /// leaf, or when an absence marker does not wrap exactly one clause.
    pub fn compile(
        store: &dyn FragmentStore,
        construct: &BindConstruct,
    ) -> Result<Self, MatchError> {
        let clauses = unbundle(store, construct.body())?;

        let mut mandatory = Vec::new();
        let mut optional = Vec::new();
        for clause in clauses {
            match fetch(store, clause)? {
                Fragment::Link {
                    kind: LinkKind::Absent,
                    outgoing,
                } => {
                    let &[inner] = outgoing.as_slice() else {
                        return Err(MatchError::MalformedBody {
                            reason: format!(
                                "absent clause must wrap exactly one clause, got {}",
                                outgoing.len()
                            ),
                        });
                    };
                    ensure_link(store, inner)?;
                    optional.push(inner);
                }
                Fragment::Link { .. } => mandatory.push(clause),
                other => {
                    return Err(MatchError::MalformedBody {
                        reason: format!("pattern clause must be a link, got {}", other.type_name()),
                    });
                }
            }
        }

        let scope = construct.scope().clone();
        let components = connected_components(store, &scope, &mandatory, &optional)?;

        Ok(Self {
            scope,
            mandatory,
            optional,
            components,
        })
    }

    /// The variable scope the pattern is matched under.
    #[must_use]
    pub const fn scope(&self) -> &VariableScope {
        &self.scope
    }

    /// Mandatory clauses.
    #[must_use]
    pub fn mandatory(&self) -> &[FragmentId] {
        &self.mandatory
    }

    /// Optional (absence) clauses, unwrapped.
    #[must_use]
    pub fn optional(&self) -> &[FragmentId] {
        &self.optional
    }

    /// Number of mandatory clauses.
    #[must_use]
    pub fn mandatory_count(&self) -> usize {
        self.mandatory.len()
    }

    /// Number of optional clauses.
    #[must_use]
    pub fn optional_count(&self) -> usize {
        self.optional.len()
    }

    /// Connected components, each a group of clause ids sharing variables.
    #[must_use]
    pub fn components(&self) -> &[Vec<FragmentId>] {
        &self.components
    }

    /// Number of connected components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

fn ensure_link(store: &dyn FragmentStore, id: FragmentId) -> Result<(), MatchError> {
    let fragment = fetch(store, id)?;
    if fragment.is_link() {
        Ok(())
    } else {
        Err(MatchError::MalformedBody {
            reason: format!("pattern clause must be a link, got {}", fragment.type_name()),
        })
    }
}

fn unbundle(store: &dyn FragmentStore, body: FragmentId) -> Result<Vec<FragmentId>, MatchError> {
    match fetch(store, body)? {
        Fragment::Link {
            kind: LinkKind::And,
            outgoing,
        } => Ok(outgoing),
        _ => Ok(vec![body]),
    }
}

/// Variables of `scope` occurring anywhere beneath `id`.
fn clause_variables(
    store: &dyn FragmentStore,
    scope: &VariableScope,
    id: FragmentId,
    found: &mut HashSet<String>,
) -> Result<(), MatchError> {
    match fetch(store, id)? {
        Fragment::Symbol { .. } => Ok(()),
        Fragment::Variable { name } => {
            if scope.contains(&name) {
                found.insert(name);
            }
            Ok(())
        }
        Fragment::Link { outgoing, .. } => {
            for child in outgoing {
                clause_variables(store, scope, child, found)?;
            }
            Ok(())
        }
    }
}

fn connected_components(
    store: &dyn FragmentStore,
    scope: &VariableScope,
    mandatory: &[FragmentId],
    optional: &[FragmentId],
) -> Result<Vec<Vec<FragmentId>>, MatchError> {
    let clauses: Vec<FragmentId> = mandatory.iter().chain(optional.iter()).copied().collect();
    let mut variables = Vec::with_capacity(clauses.len());
    for &clause in &clauses {
        let mut found = HashSet::new();
        clause_variables(store, scope, clause, &mut found)?;
        variables.push(found);
    }

    // Union-find over clause indices; clauses sharing a variable merge.
    let mut parent: Vec<usize> = (0..clauses.len()).collect();
    for i in 0..clauses.len() {
        for j in (i + 1)..clauses.len() {
            if !variables[i].is_disjoint(&variables[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut components: Vec<Vec<FragmentId>> = Vec::new();
    let mut roots: Vec<usize> = Vec::new();
    for (index, &clause) in clauses.iter().enumerate() {
        let root = find(&mut parent, index);
        match roots.iter().position(|&r| r == root) {
            Some(slot) => components[slot].push(clause),
            None => {
                roots.push(root);
                components.push(vec![clause]);
            }
        }
    }
    Ok(components)
}

fn find(parent: &mut [usize], mut index: usize) -> usize {
    while parent[index] != index {
        parent[index] = parent[parent[index]];
        index = parent[index];
    }
    index
}
