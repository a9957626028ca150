/// Size- and stability-aware scorer selection.
///
/// Global scoring is exact but needs an (|L|·|R|)² working matrix; local
/// scoring is approximate but linear in the number of score cells. The
/// dynamic scorer picks global below a cell threshold and local above it,
/// and falls back to local whenever the global solve fails numerically.
use crate::combine::Combiner;
use crate::glts::Glts;

use super::global::WalkinshawGlobalScorer;
use super::local::WalkinshawLocalScorer;
use super::{ScoreMatrix, ScoringError, SimilarityScorer};

/// Default score-cell threshold above which local scoring is used.
pub const DEFAULT_CELL_THRESHOLD: usize = 45_000;

// ---------------------------------------------------------------------------
// DynamicScorer
// ---------------------------------------------------------------------------

/// Chooses between [`WalkinshawGlobalScorer`] and [`WalkinshawLocalScorer`]
/// by input size, with automatic fallback.
#[derive(Debug)]
pub struct DynamicScorer<S> {
    cell_threshold: usize,
    local: WalkinshawLocalScorer<S>,
    global: WalkinshawGlobalScorer<S>,
}

impl<S> Default for DynamicScorer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> DynamicScorer<S> {
    /// Creates a dynamic scorer with the default cell threshold (45 000)
    /// and default attenuation and refinement settings.
    pub fn new() -> Self {
        Self {
            cell_threshold: DEFAULT_CELL_THRESHOLD,
            local: WalkinshawLocalScorer::new(),
            global: WalkinshawGlobalScorer::new(),
        }
    }

    /// Sets the score-cell threshold above which local scoring is used.
    pub fn with_cell_threshold(mut self, cell_threshold: usize) -> Self {
        self.cell_threshold = cell_threshold;
        self
    }

    /// Sets the attenuation factor of both underlying scorers.
    pub fn with_attenuation(mut self, attenuation: f64) -> Self {
        self.local = self.local.with_attenuation(attenuation);
        self.global = self.global.with_attenuation(attenuation);
        self
    }

    /// Sets the refinement count of the local scorer.
    pub fn with_refinements(mut self, refinements: usize) -> Self {
        self.local = self.local.with_refinements(refinements);
        self
    }

    /// Enables initial-state evidence in both underlying scorers.
    pub fn with_initial_state_evidence(mut self, is_initial: fn(&S) -> bool) -> Self {
        self.local = self.local.with_initial_state_evidence(is_initial);
        self.global = self.global.with_initial_state_evidence(is_initial);
        self
    }
}

impl<S, T> SimilarityScorer<S, T> for DynamicScorer<S> {
    fn score(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
    ) -> Result<ScoreMatrix, ScoringError> {
        let cells = lhs.state_count() * rhs.state_count();
        if cells > self.cell_threshold {
            return self
                .local
                .score(lhs, rhs, state_combiner, transition_combiner);
        }
        match self
            .global
            .score(lhs, rhs, state_combiner, transition_combiner)
        {
            Ok(scores) => Ok(scores),
            Err(err) => {
                log::warn!("global similarity scoring failed ({err}); falling back to local");
                self.local
                    .score(lhs, rhs, state_combiner, transition_combiner)
            }
        }
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

    fn pair_of_loops() -> (Glts<(), char>, Glts<(), char>) {
        let mut lhs = Glts::new();
        let l0 = lhs.add_state(());
        lhs.add_transition(l0, 'a', l0).expect("endpoint exists");
        let mut rhs = Glts::new();
        let r0 = rhs.add_state(());
        rhs.add_transition(r0, 'a', r0).expect("endpoint exists");
        (lhs, rhs)
    }

    #[test]
    fn small_inputs_are_scored_globally() {
        let (lhs, rhs) = pair_of_loops();
        let scores = DynamicScorer::new()
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("scoring succeeds");
        let expected = 2.0 / 2.6;
        assert!((scores.get(StateId::new(0), StateId::new(0)) - expected).abs() < 1e-9);
    }

    #[test]
    fn large_inputs_are_scored_locally() {
        // Force the local path by shrinking the threshold: the local result
        // with the default five rounds differs from the exact fixpoint.
        let (lhs, rhs) = pair_of_loops();
        let dynamic = DynamicScorer::new().with_cell_threshold(0);
        let local = WalkinshawLocalScorer::new();
        let via_dynamic = dynamic
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("scoring succeeds");
        let via_local = local
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("scoring succeeds");
        assert_eq!(via_dynamic, via_local);
    }
}
