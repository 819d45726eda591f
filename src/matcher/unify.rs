//! Reference matcher: naive unification with backtracking.
//!
//! Candidates for a clause are the store's links of the clause's root kind,
//! restricted to grounded facts (fragments containing no variable leaves).
//! That restriction keeps a query's own interned pattern fragments from
//! matching themselves. Optional clauses are absence constraints: a
//! candidate grounding survives only if no optional clause can be found
//! present under it, and any presence taints the search's aggregate
//! `optionals_present` flag.

use crate::error::MatchError;
use crate::fragment::{is_known_type_name, Fragment, FragmentId};
use crate::materialize::GroundingSet;
use crate::matcher::pattern::{fetch, Pattern};
use crate::matcher::{Grounding, MatchReport, Matcher, PatternMetadata};
use crate::scope::VariableScope;
use crate::storage::FragmentStore;

/// Naive backtracking matcher over kind-indexed store candidates.
///
/// Suitable as a reference implementation and for stores of modest size;
/// candidate enumeration is linear in the number of links sharing a
/// clause's root kind. Confidence weighting plays no role: a candidate
/// counts purely on structural unifiability.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMatcher;

impl DefaultMatcher {
    /// Creates a matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Matcher for DefaultMatcher {
    fn match_pattern(
        &self,
        pattern: &Pattern,
        implicand: FragmentId,
        store: &dyn FragmentStore,
    ) -> Result<MatchReport, MatchError> {
        let mut search = Search {
            store,
            scope: pattern.scope(),
            optional: pattern.optional(),
            optionals_present: false,
            accepted: Vec::new(),
        };

        if pattern.mandatory_count() == 0 {
            // Absence-only patterns cannot seed a search. Scan the optionals
            // for presence so the driver can apply its absence rule.
            let _ = search.optionals_absent(&Grounding::new())?;
        } else {
            search.solve(pattern.mandatory(), &Grounding::new())?;
        }

        let mut results = GroundingSet::new();
        for grounding in &search.accepted {
            results.insert(self.instantiate(implicand, grounding, store)?);
        }

        Ok(MatchReport {
            results,
            metadata: PatternMetadata::new(pattern, search.optionals_present),
        })
    }

    fn instantiate(
        &self,
        implicand: FragmentId,
        grounding: &Grounding,
        store: &dyn FragmentStore,
    ) -> Result<FragmentId, MatchError> {
        match fetch(store, implicand)? {
            Fragment::Variable { name } => Ok(grounding.get(&name).unwrap_or(implicand)),
            Fragment::Symbol { .. } => Ok(implicand),
            Fragment::Link { kind, outgoing } => {
                let mut children = Vec::with_capacity(outgoing.len());
                for child in outgoing {
                    children.push(self.instantiate(child, grounding, store)?);
                }
                store
                    .link(kind, children)
                    .map_err(|e| MatchError::Internal {
                        message: e.to_string(),
                    })
            }
        }
    }
}

struct Search<'a> {
    store: &'a dyn FragmentStore,
    scope: &'a VariableScope,
    optional: &'a [FragmentId],
    optionals_present: bool,
    accepted: Vec<Grounding>,
}

impl Search<'_> {
    fn solve(&mut self, clauses: &[FragmentId], grounding: &Grounding) -> Result<(), MatchError> {
        let Some((&clause, rest)) = clauses.split_first() else {
            if self.optionals_absent(grounding)? {
                self.accepted.push(grounding.clone());
            }
            return Ok(());
        };

        for candidate in self.candidates(clause)? {
            let mut extended = grounding.clone();
            if self.unify(clause, candidate, &mut extended)? {
                self.solve(rest, &extended)?;
            }
        }
        Ok(())
    }

    /// Checks the absence constraints under a grounding. Returns true when
    /// none of the optional clauses can be found present; any presence sets
    /// the aggregate flag.
    fn optionals_absent(&mut self, grounding: &Grounding) -> Result<bool, MatchError> {
        let optional = self.optional;
        let mut all_absent = true;
        for &clause in optional {
            for candidate in self.candidates(clause)? {
                let mut probe = grounding.clone();
                if self.unify(clause, candidate, &mut probe)? {
                    self.optionals_present = true;
                    all_absent = false;
                    break;
                }
            }
        }
        Ok(all_absent)
    }

    /// Grounded facts that could match a clause: links of the clause's root
    /// kind containing no variable leaves.
    fn candidates(&self, clause: FragmentId) -> Result<Vec<FragmentId>, MatchError> {
        let fragment = fetch(self.store, clause)?;
        let Some(kind) = fragment.kind() else {
            return Err(MatchError::MalformedBody {
                reason: format!("pattern clause must be a link, got {}", fragment.type_name()),
            });
        };
        let mut grounded = Vec::new();
        for id in self
            .store
            .links_with_kind(kind)
            .map_err(|e| MatchError::Internal {
                message: e.to_string(),
            })?
        {
            if !self.contains_variable(id)? {
                grounded.push(id);
            }
        }
        Ok(grounded)
    }

    fn contains_variable(&self, id: FragmentId) -> Result<bool, MatchError> {
        match fetch(self.store, id)? {
            Fragment::Symbol { .. } => Ok(false),
            Fragment::Variable { .. } => Ok(true),
            Fragment::Link { outgoing, .. } => {
                for child in outgoing {
                    if self.contains_variable(child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn unify(
        &self,
        pattern_id: FragmentId,
        target_id: FragmentId,
        grounding: &mut Grounding,
    ) -> Result<bool, MatchError> {
        match fetch(self.store, pattern_id)? {
            Fragment::Variable { name } => {
                if !self.scope.contains(&name) {
                    // Not bound by this query; must occur literally.
                    return Ok(pattern_id == target_id);
                }
                if let Some(existing) = grounding.get(&name) {
                    return Ok(existing == target_id);
                }
                if let Some(restriction) = self.scope.restriction_of(&name) {
                    if !is_known_type_name(restriction.kind()) {
                        return Err(MatchError::UnresolvableRestriction {
                            variable: name,
                            restriction: restriction.kind().to_string(),
                        });
                    }
                    let target = fetch(self.store, target_id)?;
                    if !restriction.admits(&target) {
                        return Ok(false);
                    }
                }
                grounding.bind(name, target_id);
                Ok(true)
            }
            Fragment::Symbol { .. } => Ok(pattern_id == target_id),
            Fragment::Link { kind, outgoing } => {
                let Fragment::Link {
                    kind: target_kind,
                    outgoing: target_outgoing,
                } = fetch(self.store, target_id)?
                else {
                    return Ok(false);
                };
                if kind != target_kind || outgoing.len() != target_outgoing.len() {
                    return Ok(false);
                }
                for (&p, &t) in outgoing.iter().zip(target_outgoing.iter()) {
                    if !self.unify(p, t, grounding)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}
