/// Exhaustive matching for small graphs.
///
/// Enumerates every injective partial mapping over combinable state pairs
/// and keeps the one preserving the most common combinable transitions.
/// The search is exponential in the number of LHS states; use it for small
/// graphs or as an oracle in tests.
use std::collections::BTreeMap;

use crate::combine::Combiner;
use crate::glts::{Glts, StateId};

use super::{MatchError, Matcher, Matching};

// ---------------------------------------------------------------------------
// BruteForceMatcher
// ---------------------------------------------------------------------------

/// The exhaustive matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BruteForceMatcher;

impl BruteForceMatcher {
    /// Creates a brute-force matcher.
    pub fn new() -> Self {
        Self
    }
}

struct Search<'a, S, T> {
    lhs: &'a Glts<S, T>,
    rhs: &'a Glts<S, T>,
    state_combiner: &'a dyn Combiner<S>,
    transition_combiner: &'a dyn Combiner<T>,
    left_states: Vec<StateId>,
    right_states: Vec<StateId>,
    current: BTreeMap<StateId, StateId>,
    best: Option<(usize, BTreeMap<StateId, StateId>)>,
}

impl<S, T> Search<'_, S, T> {
    /// Counts the combinable transition pairs preserved by the current
    /// mapping: LHS/RHS transition pairs whose endpoints are matched to
    /// each other and whose properties are combinable.
    fn preserved_transitions(&self) -> usize {
        let mut preserved = 0;
        for (&left, &right) in &self.current {
            for lt in self.lhs.outgoing(left) {
                let Some(&mapped_target) = self.current.get(&lt.target) else {
                    continue;
                };
                for rt in self.rhs.outgoing(right) {
                    if rt.target == mapped_target
                        && self.transition_combiner.are_combinable(lt.property, rt.property)
                    {
                        preserved += 1;
                    }
                }
            }
        }
        preserved
    }

    /// Explores all assignments of `left_states[position..]`.
    ///
    /// Candidates are tried in ascending RHS-state order before the
    /// leave-unmatched branch, and only a strictly better objective
    /// replaces the incumbent, so the first optimum in this deterministic
    /// order wins.
    fn explore(&mut self, position: usize) {
        if position == self.left_states.len() {
            let objective = self.preserved_transitions();
            let improved = match &self.best {
                None => true,
                Some((best_objective, _)) => objective > *best_objective,
            };
            if improved {
                self.best = Some((objective, self.current.clone()));
            }
            return;
        }

        let left = self.left_states[position];
        let left_property = self.lhs.state_property(left);
        for index in 0..self.right_states.len() {
            let right = self.right_states[index];
            if self.current.values().any(|&matched| matched == right) {
                continue;
            }
            let combinable = match (left_property, self.rhs.state_property(right)) {
                (Some(lp), Some(rp)) => self.state_combiner.are_combinable(lp, rp),
                (None, _) | (_, None) => false,
            };
            if !combinable {
                continue;
            }
            self.current.insert(left, right);
            self.explore(position + 1);
            self.current.remove(&left);
        }

        // Leave `left` unmatched.
        self.explore(position + 1);
    }
}

impl<S, T> Matcher<S, T> for BruteForceMatcher {
    fn compute_matching(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
    ) -> Result<Matching, MatchError> {
        let mut search = Search {
            lhs,
            rhs,
            state_combiner,
            transition_combiner,
            left_states: lhs.states().collect(),
            right_states: rhs.states().collect(),
            current: BTreeMap::new(),
            best: None,
        };
        search.explore(0);

        let mut matching = Matching::new();
        if let Some((_, pairs)) = search.best {
            for (left, right) in pairs {
                matching.insert(left, right)?;
            }
        }
        Ok(matching)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
