/// State matching between two GLTSs.
///
/// A matching is an injective partial mapping from LHS states to RHS states
/// in which every matched pair has combinable state properties. Matchers
/// compute matchings from similarity scores and/or graph structure; the
/// merger consumes them.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::combine::Combiner;
use crate::glts::{Glts, StateId};
use crate::scoring::ScoringError;

pub mod brute_force;
pub mod dynamic;
pub mod kuhn_munkres;
pub mod walkinshaw;

pub use brute_force::BruteForceMatcher;
pub use dynamic::DynamicMatcher;
pub use kuhn_munkres::KuhnMunkresMatcher;
pub use walkinshaw::WalkinshawMatcher;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced while building or validating a matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    /// The LHS state is already matched; duplicates are always rejected.
    DuplicateLeft(StateId),
    /// The RHS state is already matched; duplicates are always rejected.
    DuplicateRight(StateId),
    /// A matched LHS state does not exist in the LHS graph.
    UnknownLeftState(StateId),
    /// A matched RHS state does not exist in the RHS graph.
    UnknownRightState(StateId),
    /// A matched pair's state properties are not combinable.
    NotCombinable {
        /// The LHS state of the offending pair.
        left: StateId,
        /// The RHS state of the offending pair.
        right: StateId,
    },
    /// Computing similarity scores failed.
    Scoring(ScoringError),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateLeft(state) => {
                write!(f, "left state {} is already matched", state.index())
            }
            Self::DuplicateRight(state) => {
                write!(f, "right state {} is already matched", state.index())
            }
            Self::UnknownLeftState(state) => {
                write!(f, "left state {} is not in the LHS graph", state.index())
            }
            Self::UnknownRightState(state) => {
                write!(f, "right state {} is not in the RHS graph", state.index())
            }
            Self::NotCombinable { left, right } => write!(
                f,
                "states {} and {} have non-combinable properties",
                left.index(),
                right.index()
            ),
            Self::Scoring(err) => write!(f, "scoring failed: {err}"),
        }
    }
}

impl std::error::Error for MatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scoring(err) => Some(err),
            Self::DuplicateLeft(_)
            | Self::DuplicateRight(_)
            | Self::UnknownLeftState(_)
            | Self::UnknownRightState(_)
            | Self::NotCombinable { .. } => None,
        }
    }
}

impl From<ScoringError> for MatchError {
    fn from(err: ScoringError) -> Self {
        Self::Scoring(err)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// An injective partial mapping from LHS states to RHS states.
///
/// Pairs iterate in ascending LHS-state order. Inserting a left or right
/// state twice fails, including identical re-inserts: there is one
/// duplicate contract and it is the strict one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matching {
    pairs: BTreeMap<StateId, StateId>,
    matched_right: BTreeSet<StateId>,
}

impl Matching {
    /// Creates an empty matching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of matched pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no pair is matched.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Adds the pair `(left, right)`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::DuplicateLeft`] or
    /// [`MatchError::DuplicateRight`] when either state is already matched.
    pub fn insert(&mut self, left: StateId, right: StateId) -> Result<(), MatchError> {
        if self.pairs.contains_key(&left) {
            return Err(MatchError::DuplicateLeft(left));
        }
        if !self.matched_right.insert(right) {
            return Err(MatchError::DuplicateRight(right));
        }
        self.pairs.insert(left, right);
        Ok(())
    }

    /// Returns the RHS state matched to `left`, if any.
    pub fn get(&self, left: StateId) -> Option<StateId> {
        self.pairs.get(&left).copied()
    }

    /// Returns `true` if `left` is matched.
    pub fn contains_left(&self, left: StateId) -> bool {
        self.pairs.contains_key(&left)
    }

    /// Returns `true` if `right` is matched.
    pub fn contains_right(&self, right: StateId) -> bool {
        self.matched_right.contains(&right)
    }

    /// Iterates over the matched pairs in ascending LHS-state order.
    pub fn iter(&self) -> impl Iterator<Item = (StateId, StateId)> + '_ {
        self.pairs.iter().map(|(&left, &right)| (left, right))
    }

    /// Checks the matching against its graphs: every left state must be in
    /// `lhs`, every right state in `rhs`, and every pair combinable.
    /// Injectivity holds by construction.
    ///
    /// # Errors
    ///
    /// Returns the first violated condition in ascending LHS-state order.
    pub fn validate<S, T>(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
    ) -> Result<(), MatchError> {
        for (left, right) in self.iter() {
            let Some(left_property) = lhs.state_property(left) else {
                return Err(MatchError::UnknownLeftState(left));
            };
            let Some(right_property) = rhs.state_property(right) else {
                return Err(MatchError::UnknownRightState(right));
            };
            if !state_combiner.are_combinable(left_property, right_property) {
                return Err(MatchError::NotCombinable { left, right });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Matcher trait
// ---------------------------------------------------------------------------

/// Computes a state matching between two GLTSs.
pub trait Matcher<S, T> {
    /// Computes a well-formed matching for `(lhs, rhs)`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Scoring`] when an underlying scorer fails; the
    /// other variants indicate matcher bugs and are not expected to occur.
    fn compute_matching(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
    ) -> Result<Matching, MatchError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
