//! Query execution driver.
//!
//! [`BindEngine`] drives a validated [`BindConstruct`] against a fragment
//! store: it resolves the target store, compiles the pattern, invokes the
//! matcher, interprets zero-match outcomes (including the absence-query
//! rule), and materializes the result aggregate.

use std::sync::Arc;

use crate::construct::BindConstruct;
use crate::error::{BindResult, ExecutionError, MatchError};
use crate::fragment::FragmentId;
use crate::materialize::{materialize, GroundingSet};
use crate::matcher::{DefaultMatcher, Grounding, Matcher, Pattern};
use crate::storage::FragmentStore;

/// Execution policy for [`BindEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// When enabled, patterns made of multiple disconnected components are
    /// rejected with [`ExecutionError::DisconnectedPattern`].
    ///
    /// Default: `false`. Disconnected multi-component patterns are accepted
    /// because legitimate disconnected queries exist; the permissive default
    /// is a deliberate policy decision, preserved here as an inspectable
    /// configuration field rather than a hardcoded flag.
    pub connectivity_check: bool,
}

/// Drives bind-construct execution against a fragment store.
///
/// The engine is stateless between calls: each [`BindEngine::evaluate`] is
/// independently re-entrant given a consistent store snapshot, and any
/// number of constructs can be executed through one engine.
pub struct BindEngine {
    config: EngineConfig,
    matcher: Arc<dyn Matcher>,
    default_store: Option<Arc<dyn FragmentStore>>,
}

impl BindEngine {
    /// Creates an engine with the reference matcher, default configuration,
    /// and no default store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            matcher: Arc::new(DefaultMatcher::new()),
            default_store: None,
        }
    }

    /// Creates an engine from explicit parts.
    #[must_use]
    pub fn with_parts(
        config: EngineConfig,
        matcher: Arc<dyn Matcher>,
        default_store: Option<Arc<dyn FragmentStore>>,
    ) -> Self {
        Self {
            config,
            matcher,
            default_store,
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the default store used when `evaluate` receives none.
    #[must_use]
    pub fn with_default_store(mut self, store: Arc<dyn FragmentStore>) -> Self {
        self.default_store = Some(store);
        self
    }

    /// The engine's configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Executes the match/rewrite cycle and returns the grounding set.
    ///
    /// An explicitly supplied store takes precedence over the engine's
    /// default; with neither, the call fails with
    /// [`ExecutionError::StoreUnavailable`].
    ///
    /// Zero matcher groundings yield one of two outcomes. When the pattern
    /// consists solely of optional clauses and none of them were found
    /// present after an exhaustive search, the query succeeded at proving
    /// absence: the implicand is instantiated exactly once and returned as a
    /// singleton set. The store is treated as a complete snapshot of current
    /// knowledge, so "provably absent" is an answer, not a failed search.
    /// Every other zero-match case returns an empty set; zero matches is
    /// never an error.
    ///
    /// With `silent` set, matcher-internal errors are suppressed and the
    /// call returns an empty set instead of propagating
    /// [`ExecutionError::Match`]. Store-resolution and storage failures are
    /// never suppressed.
    pub fn evaluate(
        &self,
        construct: &BindConstruct,
        store: Option<&Arc<dyn FragmentStore>>,
        silent: bool,
    ) -> BindResult<GroundingSet> {
        let store = self.resolve_store(store)?;
        let store_ref: &dyn FragmentStore = store.as_ref();

        let pattern = match Pattern::compile(store_ref, construct) {
            Ok(pattern) => pattern,
            Err(error) => return suppress(error, silent),
        };

        if self.config.connectivity_check && pattern.component_count() > 1 {
            return Err(ExecutionError::DisconnectedPattern {
                components: pattern.component_count(),
            }
            .into());
        }

        let report = match self
            .matcher
            .match_pattern(&pattern, construct.implicand(), store_ref)
        {
            Ok(report) => report,
            Err(error) => return suppress(error, silent),
        };

        if !report.results.is_empty() {
            return Ok(report.results);
        }

        let metadata = report.metadata;
        if metadata.mandatory_count() == 0
            && metadata.optional_count() > 0
            && !metadata.optionals_present()
        {
            let instance = match self
                .matcher
                .instantiate(construct.implicand(), &Grounding::new(), store_ref)
            {
                Ok(id) => id,
                Err(error) => return suppress(error, silent),
            };
            return Ok(GroundingSet::singleton(instance));
        }

        Ok(GroundingSet::new())
    }

    /// Evaluates the construct, then materializes the grounding set into the
    /// store as a single unordered aggregate, returning its canonical id.
    pub fn execute(
        &self,
        construct: &BindConstruct,
        store: Option<&Arc<dyn FragmentStore>>,
        silent: bool,
    ) -> BindResult<FragmentId> {
        let results = self.evaluate(construct, store, silent)?;
        let store = self.resolve_store(store)?;
        Ok(materialize(&results, store.as_ref())?)
    }

    fn resolve_store<'a>(
        &'a self,
        explicit: Option<&'a Arc<dyn FragmentStore>>,
    ) -> BindResult<&'a Arc<dyn FragmentStore>> {
        explicit
            .or(self.default_store.as_ref())
            .ok_or_else(|| ExecutionError::StoreUnavailable.into())
    }
}

impl Default for BindEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn suppress(error: MatchError, silent: bool) -> BindResult<GroundingSet> {
    if silent {
        Ok(GroundingSet::new())
    } else {
        Err(ExecutionError::Match(error).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindError;
    use crate::fragment::LinkKind;
    use crate::storage::InMemoryFragmentStore;

    fn shared_store() -> Arc<dyn FragmentStore> {
        Arc::new(InMemoryFragmentStore::new())
    }

    #[test]
    fn test_no_store_fails() {
        let store = shared_store();
        let likes = store.symbol("likes").unwrap();
        let x = store.variable("$x").unwrap();
        let body = store.link(LinkKind::Edge, vec![likes, x]).unwrap();
        let construct = BindConstruct::implicit(store.as_ref(), body, x).unwrap();

        let engine = BindEngine::new();
        let err = engine.evaluate(&construct, None, false).unwrap_err();
        assert!(matches!(
            err,
            BindError::Execution(ExecutionError::StoreUnavailable)
        ));
    }

    #[test]
    fn test_explicit_store_wins_over_default() {
        let populated = shared_store();
        let likes = populated.symbol("likes").unwrap();
        let alice = populated.symbol("alice").unwrap();
        let pizza = populated.symbol("pizza").unwrap();
        populated
            .link(LinkKind::Edge, vec![likes, alice, pizza])
            .unwrap();
        let x = populated.variable("$x").unwrap();
        let body = populated.link(LinkKind::Edge, vec![likes, x, pizza]).unwrap();
        let construct = BindConstruct::implicit(populated.as_ref(), body, x).unwrap();

        // Default store lacks the pattern's fragments entirely; the explicit
        // store must be the one consulted.
        let engine = BindEngine::new().with_default_store(shared_store());
        let results = engine.evaluate(&construct, Some(&populated), false).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.contains(alice));
    }

    #[test]
    fn test_default_store_used_when_no_explicit() {
        let store = shared_store();
        let likes = store.symbol("likes").unwrap();
        let alice = store.symbol("alice").unwrap();
        let pizza = store.symbol("pizza").unwrap();
        store.link(LinkKind::Edge, vec![likes, alice, pizza]).unwrap();
        let x = store.variable("$x").unwrap();
        let body = store.link(LinkKind::Edge, vec![likes, x, pizza]).unwrap();
        let construct = BindConstruct::implicit(store.as_ref(), body, x).unwrap();

        let engine = BindEngine::new().with_default_store(Arc::clone(&store));
        let results = engine.evaluate(&construct, None, false).unwrap();
        assert!(results.contains(alice));
    }

    #[test]
    fn test_mixed_pattern_zero_matches_is_empty() {
        let store = shared_store();
        let likes = store.symbol("likes").unwrap();
        let broccoli = store.symbol("broccoli").unwrap();
        let x = store.variable("$x").unwrap();
        let body = store.link(LinkKind::Edge, vec![likes, x, broccoli]).unwrap();
        let construct = BindConstruct::implicit(store.as_ref(), body, x).unwrap();

        let engine = BindEngine::new();
        let results = engine.evaluate(&construct, Some(&store), false).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_absence_query_returns_singleton() {
        let store = shared_store();
        let knows = store.symbol("knows").unwrap();
        let x = store.variable("$x").unwrap();
        let y = store.variable("$y").unwrap();
        let inner = store.link(LinkKind::Edge, vec![knows, x, y]).unwrap();
        let absent = store.link(LinkKind::Absent, vec![inner]).unwrap();
        let nobody = store.symbol("nobody-knows-anyone").unwrap();
        let construct = BindConstruct::implicit(store.as_ref(), absent, nobody).unwrap();

        let engine = BindEngine::new();
        let results = engine.evaluate(&construct, Some(&store), false).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.contains(nobody));
    }

    #[test]
    fn test_absence_query_with_present_optional_is_empty() {
        let store = shared_store();
        let knows = store.symbol("knows").unwrap();
        let alice = store.symbol("alice").unwrap();
        let bob = store.symbol("bob").unwrap();
        store.link(LinkKind::Edge, vec![knows, alice, bob]).unwrap();

        let x = store.variable("$x").unwrap();
        let y = store.variable("$y").unwrap();
        let inner = store.link(LinkKind::Edge, vec![knows, x, y]).unwrap();
        let absent = store.link(LinkKind::Absent, vec![inner]).unwrap();
        let marker = store.symbol("nobody-knows-anyone").unwrap();
        let construct = BindConstruct::implicit(store.as_ref(), absent, marker).unwrap();

        let engine = BindEngine::new();
        let results = engine.evaluate(&construct, Some(&store), false).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_disconnected_pattern_allowed_by_default() {
        let store = shared_store();
        let rel = store.symbol("rel").unwrap();
        let alice = store.symbol("alice").unwrap();
        let bob = store.symbol("bob").unwrap();
        store.link(LinkKind::Edge, vec![rel, alice]).unwrap();
        store.link(LinkKind::Edge, vec![rel, bob]).unwrap();

        let x = store.variable("$x").unwrap();
        let y = store.variable("$y").unwrap();
        let c1 = store.link(LinkKind::Edge, vec![rel, x]).unwrap();
        let c2 = store.link(LinkKind::Edge, vec![rel, y]).unwrap();
        let body = store.link(LinkKind::And, vec![c1, c2]).unwrap();
        let out = store.link(LinkKind::List, vec![x, y]).unwrap();
        let construct = BindConstruct::implicit(store.as_ref(), body, out).unwrap();

        let engine = BindEngine::new();
        assert!(!engine.config().connectivity_check);
        let results = engine.evaluate(&construct, Some(&store), false).unwrap();
        // Cross product of the two independent clauses.
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn test_connectivity_check_rejects_disconnected_pattern() {
        let store = shared_store();
        let rel = store.symbol("rel").unwrap();
        let x = store.variable("$x").unwrap();
        let y = store.variable("$y").unwrap();
        let c1 = store.link(LinkKind::Edge, vec![rel, x]).unwrap();
        let c2 = store.link(LinkKind::Edge, vec![rel, y]).unwrap();
        let body = store.link(LinkKind::And, vec![c1, c2]).unwrap();
        let construct = BindConstruct::implicit(store.as_ref(), body, x).unwrap();

        let engine = BindEngine::new().with_config(EngineConfig {
            connectivity_check: true,
        });
        let err = engine.evaluate(&construct, Some(&store), false).unwrap_err();
        let BindError::Execution(ExecutionError::DisconnectedPattern { components }) = err else {
            panic!("expected disconnected pattern error");
        };
        assert_eq!(components, 2);
    }

    #[test]
    fn test_silent_suppresses_matcher_errors() {
        let store = shared_store();
        let alice = store.symbol("alice").unwrap();
        let x = store.variable("$x").unwrap();
        // A bare leaf clause is a malformed body.
        let body = store.link(LinkKind::And, vec![alice]).unwrap();
        let construct = BindConstruct::implicit(store.as_ref(), body, x).unwrap();

        let engine = BindEngine::new();
        let err = engine.evaluate(&construct, Some(&store), false).unwrap_err();
        assert!(err.is_match());

        let results = engine.evaluate(&construct, Some(&store), true).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_execute_materializes_result_set() {
        let store = shared_store();
        let likes = store.symbol("likes").unwrap();
        let alice = store.symbol("alice").unwrap();
        let pizza = store.symbol("pizza").unwrap();
        store.link(LinkKind::Edge, vec![likes, alice, pizza]).unwrap();
        let x = store.variable("$x").unwrap();
        let body = store.link(LinkKind::Edge, vec![likes, x, pizza]).unwrap();
        let construct = BindConstruct::implicit(store.as_ref(), body, x).unwrap();

        let engine = BindEngine::new();
        let aggregate = engine.execute(&construct, Some(&store), false).unwrap();
        let fragment = store.get(aggregate).unwrap().unwrap();
        assert_eq!(fragment.kind(), Some(LinkKind::Set));
        assert_eq!(fragment.outgoing(), &[alice]);

        // Re-executing the same construct lands on the same aggregate.
        let again = engine.execute(&construct, Some(&store), false).unwrap();
        assert_eq!(aggregate, again);
    }
}
