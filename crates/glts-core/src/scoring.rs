/// Similarity scoring between the states of two GLTSs.
///
/// A scorer produces a dense |L|×|R| matrix of real-valued similarity
/// scores. Only state pairs with combinable properties receive non-zero
/// scores. Every scorer decomposes similarity into a forward component
/// (shared outgoing structure) and a backward component (shared incoming
/// structure) and reports their average.
///
/// # Memory
///
/// Score matrices are contiguous row-major `f64` storage and are expected
/// to reach ~10^8 cells; see the module docs of [`global`] for the
/// additional working memory of the linear-system scorer.
use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use ndarray::Array2;

use crate::combine::Combiner;
use crate::glts::{Glts, StateId};

pub mod dynamic;
pub mod global;
pub mod local;
pub(crate) mod solve;

pub use dynamic::DynamicScorer;
pub use global::WalkinshawGlobalScorer;
pub use local::WalkinshawLocalScorer;

// ---------------------------------------------------------------------------
// ScoreMatrix
// ---------------------------------------------------------------------------

/// A dense |L|×|R| matrix of state-pair similarity scores.
///
/// Rows are LHS states, columns RHS states, both addressed by state id.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    scores: Array2<f64>,
}

impl ScoreMatrix {
    /// Creates an all-zero score matrix.
    pub fn zeros(left_states: usize, right_states: usize) -> Self {
        Self {
            scores: Array2::zeros((left_states, right_states)),
        }
    }

    pub(crate) fn from_array(scores: Array2<f64>) -> Self {
        Self { scores }
    }

    /// Returns the number of LHS states (rows).
    pub fn left_count(&self) -> usize {
        self.scores.nrows()
    }

    /// Returns the number of RHS states (columns).
    pub fn right_count(&self) -> usize {
        self.scores.ncols()
    }

    /// Returns the score of the state pair `(left, right)`.
    pub fn get(&self, left: StateId, right: StateId) -> f64 {
        self.scores[[left.index(), right.index()]]
    }

    /// Sets the score of the state pair `(left, right)`.
    pub fn set(&mut self, left: StateId, right: StateId, score: f64) {
        self.scores[[left.index(), right.index()]] = score;
    }

    /// Returns the underlying row-major array.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.scores
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by similarity scoring.
///
/// Both variants are recoverable by falling back to the local scorer; the
/// dynamic scorer does so automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringError {
    /// The global scorer's linear system has no unique solution.
    SingularSystem,
    /// A solved score came out non-finite (overflow or an ill-conditioned
    /// system).
    NonFiniteScore {
        /// Row (LHS state index) of the offending score.
        left: usize,
        /// Column (RHS state index) of the offending score.
        right: usize,
    },
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingularSystem => f.write_str("similarity system is singular"),
            Self::NonFiniteScore { left, right } => write!(
                f,
                "similarity score for state pair ({left}, {right}) is not finite"
            ),
        }
    }
}

impl std::error::Error for ScoringError {}

// ---------------------------------------------------------------------------
// SimilarityScorer trait
// ---------------------------------------------------------------------------

/// Computes state-pair similarity scores for two GLTSs.
pub trait SimilarityScorer<S, T> {
    /// Scores every LHS/RHS state pair.
    ///
    /// Pairs whose state properties are not combinable score zero.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError`] when scoring fails numerically; iterative
    /// scorers never fail.
    fn score(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
    ) -> Result<ScoreMatrix, ScoringError>;
}

// ---------------------------------------------------------------------------
// Shared pair enumeration
// ---------------------------------------------------------------------------

/// Direction of the structural evidence a score component considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScoreDirection {
    /// Common outgoing transitions; evidence flows from successors.
    Forward,
    /// Common incoming transitions; evidence flows from predecessors.
    Backward,
}

/// Enumerates the common transitions of a state pair in one direction.
///
/// Returns the number of combinable transition pairs and the deduplicated
/// set of their endpoint pairs (successors for forward, predecessors for
/// backward).
pub(crate) fn neighbour_pairs<S, T>(
    lhs: &Glts<S, T>,
    rhs: &Glts<S, T>,
    left: StateId,
    right: StateId,
    direction: ScoreDirection,
    transition_combiner: &dyn Combiner<T>,
) -> (usize, BTreeSet<(StateId, StateId)>) {
    let (left_transitions, right_transitions): (Vec<_>, Vec<_>) = match direction {
        ScoreDirection::Forward => (lhs.outgoing(left).collect(), rhs.outgoing(right).collect()),
        ScoreDirection::Backward => (lhs.incoming(left).collect(), rhs.incoming(right).collect()),
    };

    let mut count = 0usize;
    let mut endpoints = BTreeSet::new();
    for (lt, rt) in left_transitions
        .iter()
        .cartesian_product(right_transitions.iter())
    {
        if transition_combiner.are_combinable(lt.property, rt.property) {
            count += 1;
            endpoints.insert(match direction {
                ScoreDirection::Forward => (lt.target, rt.target),
                ScoreDirection::Backward => (lt.source, rt.source),
            });
        }
    }
    (count, endpoints)
}

// ---------------------------------------------------------------------------
// Shared equation construction
// ---------------------------------------------------------------------------

/// One state pair's similarity equation
/// `denominator · score = numerator + attenuation · Σ successor scores`.
///
/// The local scorer iterates this equation; the global scorer solves the
/// whole system exactly.
#[derive(Debug, Clone)]
pub(crate) struct PairEquation {
    /// Whether the pair's state properties are combinable; uncombinable
    /// pairs are pinned to zero.
    pub combinable: bool,
    /// Local evidence: twice the number of common transitions, plus the
    /// initial-state bonus for the backward direction.
    pub numerator: f64,
    /// Degree mass plus the attenuated neighbourhood size; a zero
    /// denominator pins the score to zero.
    pub denominator: f64,
    /// `(left, right)` state index pairs the attenuated sum ranges over.
    pub successors: Vec<(usize, usize)>,
}

/// Builds the per-pair similarity equations for one direction.
pub(crate) fn build_equations<S, T>(
    lhs: &Glts<S, T>,
    rhs: &Glts<S, T>,
    state_combiner: &dyn Combiner<S>,
    transition_combiner: &dyn Combiner<T>,
    direction: ScoreDirection,
    attenuation: f64,
    initial_predicate: Option<fn(&S) -> bool>,
) -> Vec<PairEquation> {
    let right_count = rhs.state_count();
    let mut equations = Vec::with_capacity(lhs.state_count() * right_count);

    for left in lhs.states() {
        let Some(left_property) = lhs.state_property(left) else {
            continue;
        };
        let left_out = lhs.outgoing(left).count();
        let left_in = lhs.incoming(left).count();

        for right in rhs.states() {
            let Some(right_property) = rhs.state_property(right) else {
                continue;
            };
            if !state_combiner.are_combinable(left_property, right_property) {
                equations.push(PairEquation {
                    combinable: false,
                    numerator: 0.0,
                    denominator: 0.0,
                    successors: Vec::new(),
                });
                continue;
            }

            let right_out = rhs.outgoing(right).count();
            let right_in = rhs.incoming(right).count();
            let (count, endpoints) =
                neighbour_pairs(lhs, rhs, left, right, direction, transition_combiner);

            let mut numerator = 2.0 * count as f64;
            let mut local_mass = match direction {
                ScoreDirection::Forward => (left_out + right_out) as f64,
                ScoreDirection::Backward => (left_in + right_in) as f64,
            };
            if direction == ScoreDirection::Backward {
                if let Some(is_initial) = initial_predicate {
                    let left_initial = is_initial(left_property);
                    let right_initial = is_initial(right_property);
                    if left_initial && right_initial {
                        numerator += 1.0;
                    }
                    if left_initial || right_initial {
                        local_mass += 1.0;
                    }
                }
            }

            let neighbourhood = (left_out + right_out).max(left_in + right_in) as f64;
            equations.push(PairEquation {
                combinable: true,
                numerator,
                denominator: local_mass + attenuation * neighbourhood,
                successors: endpoints
                    .into_iter()
                    .map(|(l, r)| (l.index(), r.index()))
                    .collect(),
            });
        }
    }
    debug_assert_eq!(equations.len(), lhs.state_count() * right_count);
    equations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::combine::EqualityCombiner;

    fn chain(labels: &[char]) -> Glts<(), char> {
        let mut glts = Glts::new();
        let mut previous = glts.add_state(());
        for &label in labels {
            let next = glts.add_state(());
            glts.add_transition(previous, label, next).expect("endpoints exist");
            previous = next;
        }
        glts
    }

    #[test]
    fn neighbour_pairs_counts_combinable_transitions() {
        let lhs = chain(&['a', 'b']);
        let rhs = chain(&['a', 'c']);
        let l0 = StateId::new(0);
        let r0 = StateId::new(0);
        let (count, endpoints) = neighbour_pairs(
            &lhs,
            &rhs,
            l0,
            r0,
            ScoreDirection::Forward,
            &EqualityCombiner,
        );
        assert_eq!(count, 1);
        assert_eq!(
            endpoints,
            [(StateId::new(1), StateId::new(1))].into_iter().collect()
        );
    }

    #[test]
    fn neighbour_pairs_deduplicates_endpoint_pairs() {
        // Two parallel `a`/`x` transitions to the same target on the left,
        // matched against one `a` and one `x` on the right: four combinable
        // pairings would repeat the same endpoint pair if `x` matched `a`.
        let mut lhs: Glts<(), char> = Glts::new();
        let l0 = lhs.add_state(());
        let l1 = lhs.add_state(());
        lhs.add_transition(l0, 'a', l1).expect("endpoints exist");
        lhs.add_transition(l0, 'x', l1).expect("endpoints exist");

        let mut rhs: Glts<(), char> = Glts::new();
        let r0 = rhs.add_state(());
        let r1 = rhs.add_state(());
        rhs.add_transition(r0, 'a', r1).expect("endpoints exist");
        rhs.add_transition(r0, 'x', r1).expect("endpoints exist");

        let (count, endpoints) =
            neighbour_pairs(&lhs, &rhs, l0, r0, ScoreDirection::Forward, &EqualityCombiner);
        assert_eq!(count, 2, "two label-equal pairings");
        assert_eq!(endpoints.len(), 1, "one distinct endpoint pair");
    }

    #[test]
    fn equations_pin_uncombinable_pairs() {
        #[derive(Debug)]
        struct Never;
        impl Combiner<()> for Never {
            fn are_combinable(&self, _: &(), _: &()) -> bool {
                false
            }
            fn combine(&self, _: &(), _: &()) {}
        }

        let lhs = chain(&['a']);
        let rhs = chain(&['a']);
        let equations = build_equations(
            &lhs,
            &rhs,
            &Never,
            &EqualityCombiner,
            ScoreDirection::Forward,
            0.6,
            None,
        );
        assert_eq!(equations.len(), 4);
        assert!(equations.iter().all(|eq| !eq.combinable));
    }

    #[test]
    fn score_matrix_addresses_by_state_id() {
        let mut matrix = ScoreMatrix::zeros(2, 3);
        matrix.set(StateId::new(1), StateId::new(2), 0.5);
        assert_eq!(matrix.get(StateId::new(1), StateId::new(2)), 0.5);
        assert_eq!(matrix.get(StateId::new(0), StateId::new(0)), 0.0);
        assert_eq!(matrix.left_count(), 2);
        assert_eq!(matrix.right_count(), 3);
    }
}
