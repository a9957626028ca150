/// Iterative local similarity scoring.
///
/// Runs a fixed number of refinement rounds over the similarity equations:
/// each round recomputes every pair's score from the previous round's
/// scores of its neighbour pairs. With an attenuation factor below one the
/// refinement is contractive, so it cannot diverge and never fails.
use ndarray::Array2;

use crate::combine::Combiner;
use crate::glts::Glts;

use super::{ScoreDirection, ScoreMatrix, ScoringError, SimilarityScorer, build_equations};

/// Default attenuation factor.
pub const DEFAULT_ATTENUATION: f64 = 0.6;

/// Default number of refinement rounds.
pub const DEFAULT_REFINEMENTS: usize = 5;

// ---------------------------------------------------------------------------
// WalkinshawLocalScorer
// ---------------------------------------------------------------------------

/// The iterative local scorer.
///
/// `S` is the state property type; it only appears through the optional
/// initial-state predicate, which makes the backward component reward
/// initial-state agreement the way an LTS-aware scorer should.
#[derive(Debug)]
pub struct WalkinshawLocalScorer<S> {
    attenuation: f64,
    refinements: usize,
    initial_predicate: Option<fn(&S) -> bool>,
}

impl<S> Default for WalkinshawLocalScorer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> WalkinshawLocalScorer<S> {
    /// Creates a local scorer with the default attenuation factor (0.6) and
    /// refinement count (5).
    pub fn new() -> Self {
        Self {
            attenuation: DEFAULT_ATTENUATION,
            refinements: DEFAULT_REFINEMENTS,
            initial_predicate: None,
        }
    }

    /// Sets the attenuation factor, in `[0, 1]`.
    pub fn with_attenuation(mut self, attenuation: f64) -> Self {
        self.attenuation = attenuation;
        self
    }

    /// Sets the number of refinement rounds.
    pub fn with_refinements(mut self, refinements: usize) -> Self {
        self.refinements = refinements;
        self
    }

    /// Enables initial-state evidence in the backward component.
    pub fn with_initial_state_evidence(mut self, is_initial: fn(&S) -> bool) -> Self {
        self.initial_predicate = Some(is_initial);
        self
    }

    fn refine<T>(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
        direction: ScoreDirection,
    ) -> Array2<f64> {
        let left_count = lhs.state_count();
        let right_count = rhs.state_count();
        let equations = build_equations(
            lhs,
            rhs,
            state_combiner,
            transition_combiner,
            direction,
            self.attenuation,
            self.initial_predicate,
        );

        let mut previous = Array2::<f64>::zeros((left_count, right_count));
        for _round in 0..self.refinements {
            let mut next = Array2::<f64>::zeros((left_count, right_count));
            for (index, equation) in equations.iter().enumerate() {
                if !equation.combinable || equation.denominator == 0.0 {
                    continue;
                }
                let spill: f64 = equation
                    .successors
                    .iter()
                    .map(|&(l, r)| previous[[l, r]])
                    .sum();
                next[[index / right_count, index % right_count]] =
                    (equation.numerator + self.attenuation * spill) / equation.denominator;
            }
            previous = next;
        }
        previous
    }
}

impl<S, T> SimilarityScorer<S, T> for WalkinshawLocalScorer<S> {
    fn score(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
    ) -> Result<ScoreMatrix, ScoringError> {
        let forward = self.refine(
            lhs,
            rhs,
            state_combiner,
            transition_combiner,
            ScoreDirection::Forward,
        );
        let backward = self.refine(
            lhs,
            rhs,
            state_combiner,
            transition_combiner,
            ScoreDirection::Backward,
        );
        Ok(ScoreMatrix::from_array((forward + backward) / 2.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::combine::EqualityCombiner;
    use crate::glts::StateId;
    use crate::lts::{InitialStateProperty, Lts, LtsStateProperty};

    fn cycle(labels: &[char]) -> Glts<(), char> {
        let mut glts = Glts::new();
        let states: Vec<StateId> = labels.iter().map(|_| glts.add_state(())).collect();
        for (position, &label) in labels.iter().enumerate() {
            let source = states[position];
            let target = states[(position + 1) % states.len()];
            glts.add_transition(source, label, target).expect("endpoints exist");
        }
        glts
    }

    #[test]
    fn identical_cycles_score_highest_on_the_diagonal() {
        let lhs = cycle(&['a', 'b']);
        let rhs = cycle(&['a', 'b']);
        let scorer = WalkinshawLocalScorer::new();
        let scores = scorer
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("local scoring cannot fail");

        let diagonal = scores.get(StateId::new(0), StateId::new(0));
        let off = scores.get(StateId::new(0), StateId::new(1));
        assert!(diagonal > off, "diagonal {diagonal} should beat off-diagonal {off}");
        assert!(diagonal > 0.0);
    }

    #[test]
    fn isolated_states_score_zero() {
        let mut lhs: Glts<(), char> = Glts::new();
        lhs.add_state(());
        let mut rhs: Glts<(), char> = Glts::new();
        rhs.add_state(());
        let scorer = WalkinshawLocalScorer::new();
        let scores = scorer
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("local scoring cannot fail");
        assert_eq!(scores.get(StateId::new(0), StateId::new(0)), 0.0);
    }

    #[test]
    fn zero_refinements_yield_all_zeros() {
        let lhs = cycle(&['a', 'b']);
        let rhs = cycle(&['a', 'b']);
        let scorer = WalkinshawLocalScorer::new().with_refinements(0);
        let scores = scorer
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("local scoring cannot fail");
        assert!(scores.as_array().iter().all(|&score| score == 0.0));
    }

    #[test]
    fn initial_state_evidence_prefers_initial_pairs() {
        // Two identical two-state cycles with a uniform label, compared
        // under a combiner that ignores the initial flags: only the
        // initial-state bonus can separate (initial, initial) from
        // (initial, plain).
        #[derive(Debug)]
        struct IgnoreFlags;
        impl crate::combine::Combiner<LtsStateProperty> for IgnoreFlags {
            fn are_combinable(&self, _: &LtsStateProperty, _: &LtsStateProperty) -> bool {
                true
            }
            fn combine(&self, left: &LtsStateProperty, _: &LtsStateProperty) -> LtsStateProperty {
                *left
            }
        }

        fn lts_cycle() -> Lts<char> {
            let mut lts = Lts::new();
            let s0 = lts.add_state(LtsStateProperty::new(true));
            let s1 = lts.add_state(LtsStateProperty::new(false));
            lts.add_transition(s0, 'a', s1).expect("endpoints exist");
            lts.add_transition(s1, 'a', s0).expect("endpoints exist");
            lts
        }

        let lhs = lts_cycle();
        let rhs = lts_cycle();
        let scorer = WalkinshawLocalScorer::new()
            .with_initial_state_evidence(LtsStateProperty::is_initial);
        let scores = scorer
            .score(&lhs, &rhs, &IgnoreFlags, &EqualityCombiner)
            .expect("local scoring cannot fail");

        let initial_pair = scores.get(StateId::new(0), StateId::new(0));
        let mixed_pair = scores.get(StateId::new(0), StateId::new(1));
        assert!(initial_pair > mixed_pair);
    }
}
