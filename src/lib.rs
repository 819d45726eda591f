//! # Graphbind - Bind queries for hypergraph knowledge stores
//!
//! Graphbind implements the construction and execution path of the bind
//! construct: a declarative query/rewrite over a hypergraph-backed knowledge
//! store. A bind construct declares bound variables, a pattern body, and a
//! rewrite template; executing it grounds the pattern against store content,
//! instantiates the template once per grounding, and materializes the
//! deduplicated result set back into the store.
//!
//! ## Core Concepts
//!
//! - **Fragment**: a content-addressed node or hyperedge owned by a store
//! - **Bind construct**: bound variables + pattern body + rewrite template
//! - **Grounding**: one satisfying assignment of fragments to variables
//! - **Absence query**: an optional-only pattern that succeeds exactly when
//!   nothing of its shape exists in the store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use graphbind::{BindConstruct, BindEngine, FragmentStore, InMemoryFragmentStore, LinkKind};
//!
//! let store: Arc<dyn FragmentStore> = Arc::new(InMemoryFragmentStore::new());
//!
//! // Facts: likes(alice, pizza), likes(bob, pasta).
//! let likes = store.symbol("likes")?;
//! let alice = store.symbol("alice")?;
//! let pizza = store.symbol("pizza")?;
//! let bob = store.symbol("bob")?;
//! let pasta = store.symbol("pasta")?;
//! store.link(LinkKind::Edge, vec![likes, alice, pizza])?;
//! store.link(LinkKind::Edge, vec![likes, bob, pasta])?;
//!
//! // Query: who likes pizza?
//! let x = store.variable("$x")?;
//! let body = store.link(LinkKind::Edge, vec![likes, x, pizza])?;
//! let query = BindConstruct::implicit(store.as_ref(), body, x)?;
//!
//! let engine = BindEngine::new();
//! let who = engine.evaluate(&query, Some(&store), false)?;
//! assert!(who.contains(alice));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod construct;
pub mod engine;
pub mod error;
pub mod factory;
pub mod fragment;
pub mod materialize;
pub mod matcher;
pub mod scope;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use construct::BindConstruct;
pub use engine::{BindEngine, EngineConfig};
pub use error::{BindError, BindResult, ConstructionError, ExecutionError, MatchError};
pub use factory::{ConstructBuilder, ConstructFactory};
pub use fragment::{is_known_type_name, Fragment, FragmentId, LinkKind};
pub use materialize::{materialize, GroundingSet};
pub use matcher::{DefaultMatcher, Grounding, MatchReport, Matcher, Pattern, PatternMetadata};
pub use scope::{ScopedVariable, TypeRestriction, VariableScope};
pub use storage::{FragmentStore, InMemoryFragmentStore, StorageError};
