/// Size-aware matcher selection.
///
/// Kuhn–Munkres assignment is cubic in the padded matrix dimension, which
/// is fine for small inputs and prohibitive for large ones; the Walkinshaw
/// heuristic scales much further. The dynamic matcher routes by score-cell
/// count and wires a [`DynamicScorer`] into whichever matcher it picks.
use crate::combine::Combiner;
use crate::glts::Glts;
use crate::scoring::DynamicScorer;

use super::kuhn_munkres::KuhnMunkresMatcher;
use super::walkinshaw::{DEFAULT_LANDMARK_RATIO, DEFAULT_LANDMARK_THRESHOLD, WalkinshawMatcher};
use super::{MatchError, Matcher, Matching};

/// Default score-cell cutoff above which the Walkinshaw matcher is used.
pub const DEFAULT_CELL_CUTOFF: usize = 10_000;

// ---------------------------------------------------------------------------
// DynamicMatcher
// ---------------------------------------------------------------------------

/// Chooses between [`KuhnMunkresMatcher`] and [`WalkinshawMatcher`] by
/// input size.
#[derive(Debug)]
pub struct DynamicMatcher<S> {
    cell_cutoff: usize,
    landmark_threshold: f64,
    landmark_ratio: f64,
    scorer_cell_threshold: Option<usize>,
    attenuation: Option<f64>,
    refinements: Option<usize>,
    initial_predicate: Option<fn(&S) -> bool>,
}

impl<S> Default for DynamicMatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> DynamicMatcher<S> {
    /// Creates a dynamic matcher with the default cell cutoff (10 000) and
    /// default scorer settings.
    pub fn new() -> Self {
        Self {
            cell_cutoff: DEFAULT_CELL_CUTOFF,
            landmark_threshold: DEFAULT_LANDMARK_THRESHOLD,
            landmark_ratio: DEFAULT_LANDMARK_RATIO,
            scorer_cell_threshold: None,
            attenuation: None,
            refinements: None,
            initial_predicate: None,
        }
    }

    /// Sets the score-cell cutoff above which the Walkinshaw matcher runs.
    pub fn with_cell_cutoff(mut self, cell_cutoff: usize) -> Self {
        self.cell_cutoff = cell_cutoff;
        self
    }

    /// Sets the landmark threshold of the Walkinshaw matcher.
    pub fn with_landmark_threshold(mut self, landmark_threshold: f64) -> Self {
        self.landmark_threshold = landmark_threshold;
        self
    }

    /// Sets the landmark dominance ratio of the Walkinshaw matcher.
    pub fn with_landmark_ratio(mut self, landmark_ratio: f64) -> Self {
        self.landmark_ratio = landmark_ratio;
        self
    }

    /// Sets the cell threshold of the underlying dynamic scorer.
    pub fn with_scorer_cell_threshold(mut self, cell_threshold: usize) -> Self {
        self.scorer_cell_threshold = Some(cell_threshold);
        self
    }

    /// Sets the attenuation factor of the underlying scorers.
    pub fn with_attenuation(mut self, attenuation: f64) -> Self {
        self.attenuation = Some(attenuation);
        self
    }

    /// Sets the refinement count of the underlying local scorer.
    pub fn with_refinements(mut self, refinements: usize) -> Self {
        self.refinements = Some(refinements);
        self
    }

    /// Enables initial-state evidence in the scorers and initial-state
    /// seeding in the Walkinshaw matcher.
    pub fn with_initial_state_evidence(mut self, is_initial: fn(&S) -> bool) -> Self {
        self.initial_predicate = Some(is_initial);
        self
    }

    fn build_scorer(&self) -> DynamicScorer<S> {
        let mut scorer = DynamicScorer::new();
        if let Some(cell_threshold) = self.scorer_cell_threshold {
            scorer = scorer.with_cell_threshold(cell_threshold);
        }
        if let Some(attenuation) = self.attenuation {
            scorer = scorer.with_attenuation(attenuation);
        }
        if let Some(refinements) = self.refinements {
            scorer = scorer.with_refinements(refinements);
        }
        if let Some(is_initial) = self.initial_predicate {
            scorer = scorer.with_initial_state_evidence(is_initial);
        }
        scorer
    }
}

impl<S, T> Matcher<S, T> for DynamicMatcher<S> {
    fn compute_matching(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
    ) -> Result<Matching, MatchError> {
        let cells = lhs.state_count() * rhs.state_count();
        if cells > self.cell_cutoff {
            log::debug!("{cells} score cells: matching with the Walkinshaw heuristic");
            let mut matcher = WalkinshawMatcher::new(self.build_scorer())
                .with_landmark_threshold(self.landmark_threshold)
                .with_landmark_ratio(self.landmark_ratio);
            if let Some(is_initial) = self.initial_predicate {
                matcher = matcher.with_initial_state_seeding(is_initial);
            }
            matcher.compute_matching(lhs, rhs, state_combiner, transition_combiner)
        } else {
            log::debug!("{cells} score cells: matching with Kuhn-Munkres assignment");
            KuhnMunkresMatcher::new(self.build_scorer()).compute_matching(
                lhs,
                rhs,
                state_combiner,
                transition_combiner,
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
