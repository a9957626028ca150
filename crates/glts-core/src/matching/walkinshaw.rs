/// Heuristic landmark-and-expansion matching.
///
/// Works in phases over a score matrix: optionally seed pairs of initial
/// states, pick landmark pairs that dominate their row and column, then
/// grow the matching outward along common combinable transitions from the
/// already-matched frontier. Matched pairs are never retracted; every phase
/// breaks ties by state id.
use std::collections::{BTreeMap, BTreeSet};

use crate::combine::Combiner;
use crate::glts::{Glts, StateId};
use crate::scoring::{ScoreDirection, ScoreMatrix, SimilarityScorer, neighbour_pairs};

use super::{MatchError, Matcher, Matching};

/// Default landmark acceptance threshold.
pub const DEFAULT_LANDMARK_THRESHOLD: f64 = 0.5;

/// Default landmark dominance ratio.
pub const DEFAULT_LANDMARK_RATIO: f64 = 0.5;

// ---------------------------------------------------------------------------
// WalkinshawMatcher
// ---------------------------------------------------------------------------

/// The landmark-and-expansion matcher.
#[derive(Debug)]
pub struct WalkinshawMatcher<Sc, S> {
    scorer: Sc,
    landmark_threshold: f64,
    landmark_ratio: f64,
    initial_predicate: Option<fn(&S) -> bool>,
}

impl<Sc, S> WalkinshawMatcher<Sc, S> {
    /// Creates a matcher on top of `scorer` with the default landmark
    /// threshold (0.5) and ratio (0.5).
    pub fn new(scorer: Sc) -> Self {
        Self {
            scorer,
            landmark_threshold: DEFAULT_LANDMARK_THRESHOLD,
            landmark_ratio: DEFAULT_LANDMARK_RATIO,
            initial_predicate: None,
        }
    }

    /// Sets the minimum score a landmark must reach.
    pub fn with_landmark_threshold(mut self, landmark_threshold: f64) -> Self {
        self.landmark_threshold = landmark_threshold;
        self
    }

    /// Sets the dominance ratio: every other unmatched score in a
    /// landmark's row and column must stay below `score · ratio`.
    pub fn with_landmark_ratio(mut self, landmark_ratio: f64) -> Self {
        self.landmark_ratio = landmark_ratio;
        self
    }

    /// Seeds initial-state pairs before landmark selection.
    pub fn with_initial_state_seeding(mut self, is_initial: fn(&S) -> bool) -> Self {
        self.initial_predicate = Some(is_initial);
        self
    }
}

// ---------------------------------------------------------------------------
// Match construction state
// ---------------------------------------------------------------------------

/// Phase of a matching under construction. Progression is monotonic; a
/// frozen matching is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Scored,
    Seeded,
    Expanded,
    Frozen,
}

/// The growing matching plus its phase marker.
struct Construction {
    phase: Phase,
    pairs: BTreeMap<StateId, StateId>,
    matched_right: BTreeSet<StateId>,
}

impl Construction {
    fn new() -> Self {
        Self {
            phase: Phase::Initial,
            pairs: BTreeMap::new(),
            matched_right: BTreeSet::new(),
        }
    }

    fn advance(&mut self, phase: Phase) {
        self.phase = phase;
    }

    fn is_matched(&self, left: StateId, right: StateId) -> bool {
        self.pairs.contains_key(&left) || self.matched_right.contains(&right)
    }

    fn add(&mut self, left: StateId, right: StateId) {
        self.pairs.insert(left, right);
        self.matched_right.insert(right);
    }

    fn freeze(mut self) -> Result<Matching, MatchError> {
        self.advance(Phase::Frozen);
        let mut matching = Matching::new();
        for (&left, &right) in &self.pairs {
            matching.insert(left, right)?;
        }
        Ok(matching)
    }
}

/// The best candidate seen so far: higher score wins, then smaller ids.
#[derive(Debug, Clone, Copy)]
struct BestPair {
    score: f64,
    left: StateId,
    right: StateId,
}

impl BestPair {
    fn improves(&self, score: f64, left: StateId, right: StateId) -> bool {
        score > self.score || (score == self.score && (left, right) < (self.left, self.right))
    }
}

fn offer(best: &mut Option<BestPair>, score: f64, left: StateId, right: StateId) {
    let improved = match best {
        None => true,
        Some(incumbent) => incumbent.improves(score, left, right),
    };
    if improved {
        *best = Some(BestPair { score, left, right });
    }
}

// ---------------------------------------------------------------------------
// Matcher impl
// ---------------------------------------------------------------------------

impl<Sc, S> WalkinshawMatcher<Sc, S> {
    /// Seeds combinable initial-state pairs with positive scores, greedily
    /// by descending score.
    fn seed_initial_states<T>(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        scores: &ScoreMatrix,
        construction: &mut Construction,
    ) {
        let Some(is_initial) = self.initial_predicate else {
            return;
        };

        let mut candidates: Vec<(f64, StateId, StateId)> = Vec::new();
        for left in lhs.states() {
            let Some(left_property) = lhs.state_property(left) else {
                continue;
            };
            if !is_initial(left_property) {
                continue;
            }
            for right in rhs.states() {
                let Some(right_property) = rhs.state_property(right) else {
                    continue;
                };
                if !is_initial(right_property) {
                    continue;
                }
                if !state_combiner.are_combinable(left_property, right_property) {
                    continue;
                }
                let score = scores.get(left, right);
                if score > 0.0 {
                    candidates.push((score, left, right));
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        for (_, left, right) in candidates {
            if !construction.pairs.contains_key(&left) && !construction.matched_right.contains(&right)
            {
                construction.add(left, right);
            }
        }
    }

    /// Selects landmarks: repeatedly take the highest-scoring unmatched
    /// combinable pair and accept it iff it reaches the threshold and
    /// dominates its row and column. A rejected maximum ends the phase.
    fn select_landmarks<T>(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        scores: &ScoreMatrix,
        construction: &mut Construction,
    ) {
        loop {
            let mut best: Option<BestPair> = None;
            for left in lhs.states() {
                if construction.pairs.contains_key(&left) {
                    continue;
                }
                let Some(left_property) = lhs.state_property(left) else {
                    continue;
                };
                for right in rhs.states() {
                    if construction.matched_right.contains(&right) {
                        continue;
                    }
                    let Some(right_property) = rhs.state_property(right) else {
                        continue;
                    };
                    if !state_combiner.are_combinable(left_property, right_property) {
                        continue;
                    }
                    offer(&mut best, scores.get(left, right), left, right);
                }
            }

            let Some(candidate) = best else {
                break;
            };
            if candidate.score < self.landmark_threshold {
                break;
            }

            let bound = candidate.score * self.landmark_ratio;
            let row_dominant = rhs
                .states()
                .filter(|&right| {
                    right != candidate.right && !construction.matched_right.contains(&right)
                })
                .all(|right| scores.get(candidate.left, right) < bound);
            let column_dominant = lhs
                .states()
                .filter(|&left| {
                    left != candidate.left && !construction.pairs.contains_key(&left)
                })
                .all(|left| scores.get(left, candidate.right) < bound);
            if !row_dominant || !column_dominant {
                break;
            }

            construction.add(candidate.left, candidate.right);
        }
    }

    /// Expands the matching from the frontier: repeatedly pick the
    /// highest-scoring unmatched combinable pair reachable from a matched
    /// pair through a common combinable transition.
    fn expand<T>(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
        scores: &ScoreMatrix,
        construction: &mut Construction,
    ) {
        loop {
            let mut best: Option<BestPair> = None;
            for (&matched_left, &matched_right) in &construction.pairs {
                for direction in [ScoreDirection::Forward, ScoreDirection::Backward] {
                    let (_, endpoints) = neighbour_pairs(
                        lhs,
                        rhs,
                        matched_left,
                        matched_right,
                        direction,
                        transition_combiner,
                    );
                    for (left, right) in endpoints {
                        if construction.is_matched(left, right) {
                            continue;
                        }
                        let combinable =
                            match (lhs.state_property(left), rhs.state_property(right)) {
                                (Some(lp), Some(rp)) => state_combiner.are_combinable(lp, rp),
                                (None, _) | (_, None) => false,
                            };
                        if !combinable {
                            continue;
                        }
                        let score = scores.get(left, right);
                        if score > 0.0 {
                            offer(&mut best, score, left, right);
                        }
                    }
                }
            }

            match best {
                Some(candidate) => construction.add(candidate.left, candidate.right),
                None => break,
            }
        }
    }
}

impl<S, T, Sc> Matcher<S, T> for WalkinshawMatcher<Sc, S>
where
    Sc: SimilarityScorer<S, T>,
{
    fn compute_matching(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
    ) -> Result<Matching, MatchError> {
        let mut construction = Construction::new();

        let scores = self
            .scorer
            .score(lhs, rhs, state_combiner, transition_combiner)?;
        construction.advance(Phase::Scored);

        self.seed_initial_states(lhs, rhs, state_combiner, &scores, &mut construction);
        construction.advance(Phase::Seeded);
        log::debug!("seeded {} initial-state pairs", construction.pairs.len());

        self.select_landmarks(lhs, rhs, state_combiner, &scores, &mut construction);
        let landmark_count = construction.pairs.len();
        log::debug!("matched {landmark_count} pairs after landmark selection");

        self.expand(
            lhs,
            rhs,
            state_combiner,
            transition_combiner,
            &scores,
            &mut construction,
        );
        construction.advance(Phase::Expanded);
        log::debug!(
            "expanded to {} pairs from the matched frontier",
            construction.pairs.len()
        );

        construction.freeze()
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
    use crate::lts::{InitialStateProperty, Lts, LtsStateProperty};
    use crate::scoring::WalkinshawLocalScorer;

    fn sid(index: usize) -> StateId {
        StateId::new(index)
    }

    fn lts(initial: &[bool], transitions: &[(usize, char, usize)]) -> Lts<char> {
        let mut lts = Lts::new();
        let states: Vec<StateId> = initial
            .iter()
            .map(|&flag| lts.add_state(LtsStateProperty::new(flag)))
            .collect();
        for &(source, label, target) in transitions {
            lts.add_transition(states[source], label, states[target])
                .expect("endpoints exist");
        }
        lts
    }

    fn matcher() -> WalkinshawMatcher<WalkinshawLocalScorer<LtsStateProperty>, LtsStateProperty> {
        WalkinshawMatcher::new(
            WalkinshawLocalScorer::new()
                .with_initial_state_evidence(LtsStateProperty::is_initial),
        )
        .with_initial_state_seeding(LtsStateProperty::is_initial)
    }

    #[test]
    fn matches_a_machine_against_its_extension() {
        // The RHS is the LHS cycle without the trailing `c`/`d` tail; the
        // tail state must stay unmatched.
        let lhs = lts(
            &[true, false, false],
            &[(0, 'a', 1), (1, 'b', 0), (1, 'c', 2), (2, 'd', 2)],
        );
        let rhs = lts(&[true, false], &[(0, 'a', 1), (1, 'b', 0)]);

        let matching = matcher()
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");

        assert_eq!(matching.len(), 2);
        assert_eq!(matching.get(sid(0)), Some(sid(0)));
        assert_eq!(matching.get(sid(1)), Some(sid(1)));
        assert!(!matching.contains_left(sid(2)));
    }

    #[test]
    fn expansion_reaches_states_below_the_landmark_threshold() {
        // Long chains: interior pairs score below 0.5 but are reached from
        // the seeded initial pair through common transitions.
        let lhs = lts(
            &[true, false, false, false],
            &[(0, 'a', 1), (1, 'b', 2), (2, 'c', 3)],
        );
        let rhs = lts(
            &[true, false, false, false],
            &[(0, 'a', 1), (1, 'b', 2), (2, 'c', 3)],
        );

        let matching = matcher()
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");

        assert_eq!(matching.len(), 4);
        for index in 0..4 {
            assert_eq!(matching.get(sid(index)), Some(sid(index)));
        }
    }

    #[test]
    fn no_positive_scores_yield_an_empty_matching() {
        let lhs = lts(&[false], &[]);
        let rhs = lts(&[false], &[]);
        let matching = matcher()
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        assert!(matching.is_empty());
    }

    #[test]
    fn below_threshold_maximum_ends_landmark_selection() {
        // A short chain pair scores well below the 0.5 threshold, and with
        // no seeds the expansion phase has no frontier either.
        let lhs = lts(&[false, false], &[(0, 'a', 1)]);
        let rhs = lts(&[false, false], &[(0, 'a', 1)]);

        let matching = matcher()
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        assert!(matching.is_empty(), "got {:?}", matching.iter().collect::<Vec<_>>());
    }

    #[test]
    fn tied_maximum_fails_dominance_and_ends_landmark_selection() {
        // The RHS contains two identical copies of the LHS cycle. The best
        // pair scores far above the threshold but ties with its copy in the
        // same row, so it does not dominate and no landmark is accepted.
        let lhs = lts(&[false, false], &[(0, 'a', 1), (1, 'b', 0)]);
        let rhs = lts(
            &[false, false, false, false],
            &[(0, 'a', 1), (1, 'b', 0), (2, 'a', 3), (3, 'b', 2)],
        );

        let matching = matcher()
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        assert!(matching.is_empty(), "got {:?}", matching.iter().collect::<Vec<_>>());
    }
}
