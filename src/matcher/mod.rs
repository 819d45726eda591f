//! Matcher contract and supporting types.
//!
//! The graph-matching algorithm is a collaborator behind the [`Matcher`]
//! trait. This module owns the contract types: the compiled [`Pattern`],
//! variable [`Grounding`]s, and the [`PatternMetadata`] capability type that
//! every matcher implementation returns uniformly, so callers never need to
//! inspect a concrete matcher's internals.
//!
//! Matching considers structural unifiability only; any confidence or truth
//! weighting attached to stored fragments plays no role in whether a
//! candidate counts.

mod pattern;
mod unify;

pub use pattern::Pattern;
pub use unify::DefaultMatcher;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::fragment::FragmentId;
use crate::materialize::GroundingSet;
use crate::storage::FragmentStore;

/// One consistent assignment of fragments to scope variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grounding {
    bindings: BTreeMap<String, FragmentId>,
}

impl Grounding {
    /// Creates an empty grounding that binds nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The fragment bound to a variable, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<FragmentId> {
        self.bindings.get(name).copied()
    }

    /// Returns true if the variable is bound.
    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Binds a variable to a fragment.
    pub fn bind(&mut self, name: impl Into<String>, target: FragmentId) {
        self.bindings.insert(name.into(), target);
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates the bindings in variable-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FragmentId)> {
        self.bindings.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// Clause and connectivity metadata the driver reads off a match.
///
/// Exposed uniformly by every [`Matcher`] implementation; the driver's
/// absence-query rule consumes exactly these four facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMetadata {
    mandatory_count: usize,
    optional_count: usize,
    component_count: usize,
    optionals_present: bool,
}

impl PatternMetadata {
    /// Builds metadata for a compiled pattern plus the search-time
    /// optional-presence flag.
    #[must_use]
    pub fn new(pattern: &Pattern, optionals_present: bool) -> Self {
        Self {
            mandatory_count: pattern.mandatory_count(),
            optional_count: pattern.optional_count(),
            component_count: pattern.component_count(),
            optionals_present,
        }
    }

    /// Number of mandatory clauses.
    #[must_use]
    pub const fn mandatory_count(&self) -> usize {
        self.mandatory_count
    }

    /// Number of optional (absence) clauses.
    #[must_use]
    pub const fn optional_count(&self) -> usize {
        self.optional_count
    }

    /// Number of connected components in the pattern.
    #[must_use]
    pub const fn component_count(&self) -> usize {
        self.component_count
    }

    /// Returns true if any optional clause was found present during the
    /// search. The flag is aggregate and all-or-nothing: one present
    /// optional clause taints the whole search.
    #[must_use]
    pub const fn optionals_present(&self) -> bool {
        self.optionals_present
    }
}

/// Outcome of one matcher invocation.
#[derive(Debug, Clone)]
pub struct MatchReport {
    /// Deduplicated instantiations of the rewrite template, one per
    /// satisfying grounding.
    pub results: GroundingSet,
    /// Clause/connectivity metadata plus the optional-presence flag.
    pub metadata: PatternMetadata,
}

/// Black-box graph matcher contract.
pub trait Matcher: Send + Sync {
    /// Searches the store for groundings of `pattern`, instantiating
    /// `implicand` once per grounding.
    fn match_pattern(
        &self,
        pattern: &Pattern,
        implicand: FragmentId,
        store: &dyn FragmentStore,
    ) -> Result<MatchReport, MatchError>;

    /// Instantiates the rewrite template under a grounding, interning the
    /// produced fragments into the store.
    ///
    /// Unbound variables are left in place; the empty grounding therefore
    /// reproduces the template itself.
    fn instantiate(
        &self,
        implicand: FragmentId,
        grounding: &Grounding,
        store: &dyn FragmentStore,
    ) -> Result<FragmentId, MatchError>;
}
