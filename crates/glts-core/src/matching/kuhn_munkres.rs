/// Bipartite assignment matching.
///
/// Pads the score matrix to a square weight matrix, solves the assignment
/// problem with the Kuhn–Munkres algorithm (shortest augmenting paths with
/// potentials, O(n³)), and discards assigned pairs that score zero or have
/// non-combinable state properties.
use ndarray::Array2;

use crate::combine::Combiner;
use crate::glts::{Glts, StateId};
use crate::scoring::SimilarityScorer;

use super::{MatchError, Matcher, Matching};

// ---------------------------------------------------------------------------
// KuhnMunkresMatcher
// ---------------------------------------------------------------------------

/// The assignment matcher.
#[derive(Debug)]
pub struct KuhnMunkresMatcher<Sc> {
    scorer: Sc,
}

impl<Sc> KuhnMunkresMatcher<Sc> {
    /// Creates an assignment matcher on top of `scorer`.
    pub fn new(scorer: Sc) -> Self {
        Self { scorer }
    }
}

impl<S, T, Sc> Matcher<S, T> for KuhnMunkresMatcher<Sc>
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
        let scores = self
            .scorer
            .score(lhs, rhs, state_combiner, transition_combiner)?;
        let left_count = scores.left_count();
        let right_count = scores.right_count();
        let size = left_count.max(right_count);

        // Square weight matrix, zero-padded; negative zeros are normalized
        // so padding and true zero scores compare identically.
        let mut weights = Array2::<f64>::zeros((size, size));
        for left in 0..left_count {
            for right in 0..right_count {
                let score = scores.as_array()[[left, right]];
                weights[[left, right]] = if score == 0.0 { 0.0 } else { score };
            }
        }

        let assignment = assign_max_weight(&weights);

        let mut matching = Matching::new();
        for (left_index, &right_index) in assignment.iter().enumerate().take(left_count) {
            if right_index >= right_count {
                continue;
            }
            if weights[[left_index, right_index]] <= 0.0 {
                continue;
            }
            let left = StateId::new(left_index);
            let right = StateId::new(right_index);
            let combinable = match (lhs.state_property(left), rhs.state_property(right)) {
                (Some(lp), Some(rp)) => state_combiner.are_combinable(lp, rp),
                (None, _) | (_, None) => false,
            };
            if combinable {
                matching.insert(left, right)?;
            }
        }
        Ok(matching)
    }
}

// ---------------------------------------------------------------------------
// Assignment kernel
// ---------------------------------------------------------------------------

/// Solves the maximum-weight perfect assignment on a square matrix.
///
/// Returns, for each row, the column assigned to it. Implements the
/// potential-based shortest-augmenting-path formulation; all scans run in
/// ascending index order, so ties resolve deterministically to the smallest
/// column.
fn assign_max_weight(weights: &Array2<f64>) -> Vec<usize> {
    let n = weights.nrows();
    if n == 0 {
        return Vec::new();
    }

    // 1-indexed arrays; index 0 is the virtual start column.
    let mut row_potential = vec![0.0f64; n + 1];
    let mut column_potential = vec![0.0f64; n + 1];
    let mut column_assignment = vec![0usize; n + 1];
    let mut previous_column = vec![0usize; n + 1];

    for row in 1..=n {
        column_assignment[0] = row;
        let mut current_column = 0usize;
        let mut minimum_slack = vec![f64::INFINITY; n + 1];
        let mut visited = vec![false; n + 1];

        loop {
            visited[current_column] = true;
            let current_row = column_assignment[current_column];
            let mut delta = f64::INFINITY;
            let mut next_column = 0usize;

            for column in 1..=n {
                if visited[column] {
                    continue;
                }
                // Minimization over negated weights.
                let cost = -weights[[current_row - 1, column - 1]];
                let slack = cost - row_potential[current_row] - column_potential[column];
                if slack < minimum_slack[column] {
                    minimum_slack[column] = slack;
                    previous_column[column] = current_column;
                }
                if minimum_slack[column] < delta {
                    delta = minimum_slack[column];
                    next_column = column;
                }
            }

            for column in 0..=n {
                if visited[column] {
                    row_potential[column_assignment[column]] += delta;
                    column_potential[column] -= delta;
                } else {
                    minimum_slack[column] -= delta;
                }
            }

            current_column = next_column;
            if column_assignment[current_column] == 0 {
                break;
            }
        }

        // Augment along the found path.
        loop {
            let ancestor = previous_column[current_column];
            column_assignment[current_column] = column_assignment[ancestor];
            current_column = ancestor;
            if current_column == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for column in 1..=n {
        if column_assignment[column] > 0 {
            assignment[column_assignment[column] - 1] = column - 1;
        }
    }
    assignment
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::combine::EqualityCombiner;
    use crate::scoring::{ScoreMatrix, ScoringError};
    use ndarray::array;

    fn sid(index: usize) -> StateId {
        StateId::new(index)
    }

    /// Scorer that replays a fixed matrix.
    #[derive(Debug)]
    struct FixedScorer(Array2<f64>);

    impl<S, T> SimilarityScorer<S, T> for FixedScorer {
        fn score(
            &self,
            _lhs: &Glts<S, T>,
            _rhs: &Glts<S, T>,
            _state_combiner: &dyn Combiner<S>,
            _transition_combiner: &dyn Combiner<T>,
        ) -> Result<ScoreMatrix, ScoringError> {
            Ok(ScoreMatrix::from_array(self.0.clone()))
        }
    }

    fn unit_states(count: usize) -> Glts<(), char> {
        let mut glts = Glts::new();
        for _ in 0..count {
            glts.add_state(());
        }
        glts
    }

    #[test]
    fn assignment_kernel_picks_the_heavy_diagonal() {
        let weights = array![[5.0, 1.0], [1.0, 5.0]];
        assert_eq!(assign_max_weight(&weights), vec![0, 1]);
    }

    #[test]
    fn assignment_kernel_picks_the_heavy_antidiagonal() {
        let weights = array![[1.0, 5.0], [5.0, 1.0]];
        assert_eq!(assign_max_weight(&weights), vec![1, 0]);
    }

    #[test]
    fn swapped_cycle_scores_yield_one_of_the_two_optima() {
        // Three-state cycles with two swapped events; the fixed score
        // matrix admits exactly two optimal assignments.
        let lhs = unit_states(3);
        let rhs = unit_states(3);
        let scores = array![[0.25, 0.0, 0.25], [0.0, 0.25, 0.25], [0.25, 0.25, 0.0]];
        let matching = KuhnMunkresMatcher::new(FixedScorer(scores))
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");

        let pairs: Vec<(StateId, StateId)> = matching.iter().collect();
        let optimum_a = vec![(sid(0), sid(0)), (sid(1), sid(2)), (sid(2), sid(1))];
        let optimum_b = vec![(sid(0), sid(2)), (sid(1), sid(1)), (sid(2), sid(0))];
        assert!(
            pairs == optimum_a || pairs == optimum_b,
            "unexpected assignment {pairs:?}"
        );
    }

    #[test]
    fn zero_score_pairs_are_discarded() {
        let lhs = unit_states(2);
        let rhs = unit_states(2);
        let scores = array![[0.8, 0.0], [0.0, 0.0]];
        let matching = KuhnMunkresMatcher::new(FixedScorer(scores))
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        assert_eq!(matching.len(), 1);
        assert_eq!(matching.get(sid(0)), Some(sid(0)));
    }

    #[test]
    fn negative_zero_scores_count_as_zero() {
        let lhs = unit_states(1);
        let rhs = unit_states(1);
        let scores = array![[-0.0]];
        let matching = KuhnMunkresMatcher::new(FixedScorer(scores))
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        assert!(matching.is_empty());
    }

    #[test]
    fn rectangular_inputs_are_padded() {
        // Two LHS states against three RHS states: the padding column must
        // never surface as a match.
        let lhs = unit_states(2);
        let rhs = unit_states(3);
        let scores = array![[0.9, 0.1, 0.1], [0.1, 0.1, 0.8]];
        let matching = KuhnMunkresMatcher::new(FixedScorer(scores))
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        assert_eq!(matching.len(), 2);
        assert_eq!(matching.get(sid(0)), Some(sid(0)));
        assert_eq!(matching.get(sid(1)), Some(sid(2)));
    }

    #[test]
    fn wide_inputs_leave_extra_left_states_unmatched() {
        let lhs = unit_states(3);
        let rhs = unit_states(1);
        let scores = array![[0.1], [0.9], [0.2]];
        let matching = KuhnMunkresMatcher::new(FixedScorer(scores))
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        assert_eq!(matching.len(), 1);
        assert_eq!(matching.get(sid(1)), Some(sid(0)));
    }
}
