/// Exact global similarity scoring.
///
/// Where the local scorer iterates the similarity equations a fixed number
/// of times, the global scorer solves them exactly: per direction it
/// assembles one linear equation per state pair and solves the resulting
/// dense system with [`super::solve`].
///
/// # Memory
///
/// With n = |L|·|R| score cells, each direction's solve allocates an n×n
/// working matrix. This is the dominant cost and the reason the dynamic
/// scorer routes large inputs to the local scorer instead.
use ndarray::{Array1, Array2};

use crate::combine::Combiner;
use crate::glts::Glts;

use super::local::DEFAULT_ATTENUATION;
use super::{ScoreDirection, ScoreMatrix, ScoringError, SimilarityScorer, build_equations, solve};

// ---------------------------------------------------------------------------
// WalkinshawGlobalScorer
// ---------------------------------------------------------------------------

/// The linear-system global scorer.
#[derive(Debug)]
pub struct WalkinshawGlobalScorer<S> {
    attenuation: f64,
    initial_predicate: Option<fn(&S) -> bool>,
}

impl<S> Default for WalkinshawGlobalScorer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> WalkinshawGlobalScorer<S> {
    /// Creates a global scorer with the default attenuation factor (0.6).
    pub fn new() -> Self {
        Self {
            attenuation: DEFAULT_ATTENUATION,
            initial_predicate: None,
        }
    }

    /// Sets the attenuation factor, in `[0, 1]`.
    pub fn with_attenuation(mut self, attenuation: f64) -> Self {
        self.attenuation = attenuation;
        self
    }

    /// Enables initial-state evidence in the backward component.
    pub fn with_initial_state_evidence(mut self, is_initial: fn(&S) -> bool) -> Self {
        self.initial_predicate = Some(is_initial);
        self
    }

    fn solve_direction<T>(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
        direction: ScoreDirection,
    ) -> Result<Array2<f64>, ScoringError> {
        let left_count = lhs.state_count();
        let right_count = rhs.state_count();
        let unknowns = left_count * right_count;
        if unknowns == 0 {
            return Ok(Array2::zeros((left_count, right_count)));
        }

        let equations = build_equations(
            lhs,
            rhs,
            state_combiner,
            transition_combiner,
            direction,
            self.attenuation,
            self.initial_predicate,
        );

        let mut system = Array2::<f64>::zeros((unknowns, unknowns));
        let mut constants = Array1::<f64>::zeros(unknowns);
        for (row, equation) in equations.iter().enumerate() {
            if !equation.combinable || equation.denominator == 0.0 {
                // Pinned to zero: score · 1 = 0.
                system[[row, row]] = 1.0;
                continue;
            }
            system[[row, row]] = equation.denominator;
            for &(left, right) in &equation.successors {
                system[[row, left * right_count + right]] -= self.attenuation;
            }
            constants[row] = equation.numerator;
        }

        let solution =
            solve::solve_dense(system, constants).map_err(|_| ScoringError::SingularSystem)?;

        let mut scores = Array2::<f64>::zeros((left_count, right_count));
        for left in 0..left_count {
            for right in 0..right_count {
                let value = solution[left * right_count + right];
                if !value.is_finite() {
                    return Err(ScoringError::NonFiniteScore { left, right });
                }
                scores[[left, right]] = value;
            }
        }
        Ok(scores)
    }
}

impl<S, T> SimilarityScorer<S, T> for WalkinshawGlobalScorer<S> {
    fn score(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
    ) -> Result<ScoreMatrix, ScoringError> {
        let forward = self.solve_direction(
            lhs,
            rhs,
            state_combiner,
            transition_combiner,
            ScoreDirection::Forward,
        )?;
        let backward = self.solve_direction(
            lhs,
            rhs,
            state_combiner,
            transition_combiner,
            ScoreDirection::Backward,
        )?;
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
    use crate::scoring::WalkinshawLocalScorer;

    fn self_loop() -> Glts<(), char> {
        let mut glts = Glts::new();
        let s0 = glts.add_state(());
        glts.add_transition(s0, 'a', s0).expect("endpoint exists");
        glts
    }

    #[test]
    fn single_self_loop_pair_matches_the_closed_form() {
        // One unknown x with out-degree 1 on both sides:
        //   (2 + 0.6·2) · x = 2 + 0.6·x  ⇒  x = 2 / 2.6
        let lhs = self_loop();
        let rhs = self_loop();
        let scorer = WalkinshawGlobalScorer::new();
        let scores = scorer
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("regular system");
        let expected = 2.0 / 2.6;
        let actual = scores.get(StateId::new(0), StateId::new(0));
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn global_scores_are_the_local_fixpoint() {
        // With many refinement rounds the contractive local iteration
        // converges to the global solution.
        let mut lhs: Glts<(), char> = Glts::new();
        let l0 = lhs.add_state(());
        let l1 = lhs.add_state(());
        lhs.add_transition(l0, 'a', l1).expect("endpoints exist");
        lhs.add_transition(l1, 'b', l0).expect("endpoints exist");

        let mut rhs: Glts<(), char> = Glts::new();
        let r0 = rhs.add_state(());
        let r1 = rhs.add_state(());
        let r2 = rhs.add_state(());
        rhs.add_transition(r0, 'a', r1).expect("endpoints exist");
        rhs.add_transition(r1, 'b', r2).expect("endpoints exist");
        rhs.add_transition(r2, 'c', r0).expect("endpoints exist");

        let global = WalkinshawGlobalScorer::new()
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("regular system");
        let local = WalkinshawLocalScorer::new()
            .with_refinements(60)
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("local scoring cannot fail");

        for left in 0..2 {
            for right in 0..3 {
                let g = global.get(StateId::new(left), StateId::new(right));
                let l = local.get(StateId::new(left), StateId::new(right));
                assert!(
                    (g - l).abs() < 1e-6,
                    "pair ({left}, {right}): global {g} vs converged local {l}"
                );
            }
        }
    }

    #[test]
    fn empty_graphs_score_to_an_empty_matrix() {
        let lhs: Glts<(), char> = Glts::new();
        let rhs: Glts<(), char> = Glts::new();
        let scores = WalkinshawGlobalScorer::new()
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("nothing to solve");
        assert_eq!(scores.left_count(), 0);
        assert_eq!(scores.right_count(), 0);
    }
}
