/// End-to-end structural comparison.
///
/// A [`StructureComparator`] owns the property combiners and a
/// [`CompareConfig`] choosing the scorer and matcher, and runs the
/// score → match → merge pipeline for a pair of graphs. An optional
/// rewriter post-processes the merged result in place. N-ary comparison is
/// an explicit left fold over at least two inputs.
use std::fmt;

use crate::combine::Combiner;
use crate::glts::Glts;
use crate::matching::walkinshaw::{DEFAULT_LANDMARK_RATIO, DEFAULT_LANDMARK_THRESHOLD};
use crate::matching::{
    BruteForceMatcher, DynamicMatcher, KuhnMunkresMatcher, MatchError, Matcher, Matching,
    WalkinshawMatcher,
};
use crate::merge::{MergeError, merge};
use crate::scoring::local::{DEFAULT_ATTENUATION, DEFAULT_REFINEMENTS};
use crate::scoring::{
    DynamicScorer, ScoreMatrix, ScoringError, SimilarityScorer, WalkinshawGlobalScorer,
    WalkinshawLocalScorer,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which similarity scorer the comparator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScorerChoice {
    /// The linear-system global scorer.
    WalkinshawGlobal,
    /// The iterative local scorer.
    WalkinshawLocal,
    /// Size-based choice with fallback.
    #[default]
    Dynamic,
}

/// Which matcher the comparator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatcherChoice {
    /// Exhaustive search; only viable for small graphs.
    BruteForce,
    /// Bipartite assignment over the score matrix.
    KuhnMunkres,
    /// Landmark seeding plus neighbourhood expansion.
    Walkinshaw,
    /// Size-based choice.
    #[default]
    Dynamic,
}

/// Tuning knobs for the comparison pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareConfig {
    /// Scorer variant. Default: [`ScorerChoice::Dynamic`].
    pub scorer: ScorerChoice,
    /// Matcher variant. Default: [`MatcherChoice::Dynamic`].
    pub matcher: MatcherChoice,
    /// Attenuation factor in `[0, 1]`. Default: 0.6.
    pub attenuation_factor: f64,
    /// Refinement rounds of the local scorer. Default: 5.
    pub refinements: usize,
    /// Minimum landmark score of the Walkinshaw matcher. Default: 0.5.
    pub landmark_threshold: f64,
    /// Landmark dominance ratio of the Walkinshaw matcher. Default: 0.5.
    pub landmark_ratio: f64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            scorer: ScorerChoice::default(),
            matcher: MatcherChoice::default(),
            attenuation_factor: DEFAULT_ATTENUATION,
            refinements: DEFAULT_REFINEMENTS,
            landmark_threshold: DEFAULT_LANDMARK_THRESHOLD,
            landmark_ratio: DEFAULT_LANDMARK_RATIO,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by the comparison pipeline.
#[derive(Debug)]
pub enum CompareError {
    /// N-ary comparison needs at least two inputs.
    TooFewInputs(usize),
    /// The matcher failed.
    Match(MatchError),
    /// The merger rejected the matching.
    Merge(MergeError),
}

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewInputs(count) => {
                write!(f, "comparison requires at least two inputs, got {count}")
            }
            Self::Match(err) => write!(f, "matching failed: {err}"),
            Self::Merge(err) => write!(f, "merging failed: {err}"),
        }
    }
}

impl std::error::Error for CompareError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Match(err) => Some(err),
            Self::Merge(err) => Some(err),
            Self::TooFewInputs(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configured scorer dispatch
// ---------------------------------------------------------------------------

/// The scorer a [`CompareConfig`] resolves to.
#[derive(Debug)]
enum ConfiguredScorer<S> {
    Local(WalkinshawLocalScorer<S>),
    Global(WalkinshawGlobalScorer<S>),
    Dynamic(DynamicScorer<S>),
}

impl<S, T> SimilarityScorer<S, T> for ConfiguredScorer<S> {
    fn score(
        &self,
        lhs: &Glts<S, T>,
        rhs: &Glts<S, T>,
        state_combiner: &dyn Combiner<S>,
        transition_combiner: &dyn Combiner<T>,
    ) -> Result<ScoreMatrix, ScoringError> {
        match self {
            Self::Local(scorer) => scorer.score(lhs, rhs, state_combiner, transition_combiner),
            Self::Global(scorer) => scorer.score(lhs, rhs, state_combiner, transition_combiner),
            Self::Dynamic(scorer) => scorer.score(lhs, rhs, state_combiner, transition_combiner),
        }
    }
}

// ---------------------------------------------------------------------------
// StructureComparator
// ---------------------------------------------------------------------------

/// Compares and merges GLTSs under the owned combiners and configuration.
pub struct StructureComparator<S, T, CS, CT> {
    config: CompareConfig,
    state_combiner: CS,
    transition_combiner: CT,
    initial_predicate: Option<fn(&S) -> bool>,
    rewriter: Option<Box<dyn Fn(&mut Glts<S, T>)>>,
}

impl<S, T, CS, CT> fmt::Debug for StructureComparator<S, T, CS, CT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureComparator")
            .field("config", &self.config)
            .field("has_rewriter", &self.rewriter.is_some())
            .finish_non_exhaustive()
    }
}

impl<S, T, CS, CT> StructureComparator<S, T, CS, CT>
where
    S: Clone,
    T: Clone + PartialEq,
    CS: Combiner<S>,
    CT: Combiner<T>,
{
    /// Creates a comparator with the default configuration.
    pub fn new(state_combiner: CS, transition_combiner: CT) -> Self {
        Self {
            config: CompareConfig::default(),
            state_combiner,
            transition_combiner,
            initial_predicate: None,
            rewriter: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: CompareConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the scorer variant.
    pub fn with_scorer(mut self, scorer: ScorerChoice) -> Self {
        self.config.scorer = scorer;
        self
    }

    /// Sets the matcher variant.
    pub fn with_matcher(mut self, matcher: MatcherChoice) -> Self {
        self.config.matcher = matcher;
        self
    }

    /// Sets the attenuation factor, in `[0, 1]`.
    pub fn with_attenuation_factor(mut self, attenuation_factor: f64) -> Self {
        self.config.attenuation_factor = attenuation_factor;
        self
    }

    /// Sets the local scorer's refinement rounds.
    pub fn with_refinements(mut self, refinements: usize) -> Self {
        self.config.refinements = refinements;
        self
    }

    /// Sets the Walkinshaw matcher's landmark threshold.
    pub fn with_landmark_threshold(mut self, landmark_threshold: f64) -> Self {
        self.config.landmark_threshold = landmark_threshold;
        self
    }

    /// Sets the Walkinshaw matcher's landmark dominance ratio.
    pub fn with_landmark_ratio(mut self, landmark_ratio: f64) -> Self {
        self.config.landmark_ratio = landmark_ratio;
        self
    }

    /// Enables initial-state evidence in scoring and seeding in matching.
    pub fn with_initial_state_evidence(mut self, is_initial: fn(&S) -> bool) -> Self {
        self.initial_predicate = Some(is_initial);
        self
    }

    /// Installs an in-place post-processor for merged results.
    pub fn with_rewriter(mut self, rewriter: impl Fn(&mut Glts<S, T>) + 'static) -> Self {
        self.rewriter = Some(Box::new(rewriter));
        self
    }

    /// Compares two graphs and returns the merged result.
    ///
    /// # Errors
    ///
    /// Propagates matcher and merger failures as [`CompareError`].
    pub fn compare(&self, lhs: &Glts<S, T>, rhs: &Glts<S, T>) -> Result<Glts<S, T>, CompareError> {
        let matching = self.compute_matching(lhs, rhs).map_err(CompareError::Match)?;
        matching
            .validate(lhs, rhs, &self.state_combiner)
            .map_err(CompareError::Match)?;
        log::debug!(
            "matched {} of {} LHS states against {} RHS states",
            matching.len(),
            lhs.state_count(),
            rhs.state_count()
        );
        let mut merged = merge(
            lhs,
            rhs,
            &matching,
            &self.state_combiner,
            &self.transition_combiner,
        )
        .map_err(CompareError::Merge)?;
        if let Some(rewriter) = &self.rewriter {
            rewriter(&mut merged);
        }
        Ok(merged)
    }

    /// Compares two or more graphs by folding [`Self::compare`] left to
    /// right.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::TooFewInputs`] for fewer than two inputs.
    pub fn compare_all<I>(&self, inputs: I) -> Result<Glts<S, T>, CompareError>
    where
        I: IntoIterator<Item = Glts<S, T>>,
    {
        let mut iterator = inputs.into_iter();
        let Some(first) = iterator.next() else {
            return Err(CompareError::TooFewInputs(0));
        };
        let Some(second) = iterator.next() else {
            return Err(CompareError::TooFewInputs(1));
        };
        let mut accumulated = self.compare(&first, &second)?;
        for next in iterator {
            accumulated = self.compare(&accumulated, &next)?;
        }
        Ok(accumulated)
    }

    fn build_scorer(&self) -> ConfiguredScorer<S> {
        match self.config.scorer {
            ScorerChoice::WalkinshawLocal => {
                let mut scorer = WalkinshawLocalScorer::new()
                    .with_attenuation(self.config.attenuation_factor)
                    .with_refinements(self.config.refinements);
                if let Some(is_initial) = self.initial_predicate {
                    scorer = scorer.with_initial_state_evidence(is_initial);
                }
                ConfiguredScorer::Local(scorer)
            }
            ScorerChoice::WalkinshawGlobal => {
                let mut scorer =
                    WalkinshawGlobalScorer::new().with_attenuation(self.config.attenuation_factor);
                if let Some(is_initial) = self.initial_predicate {
                    scorer = scorer.with_initial_state_evidence(is_initial);
                }
                ConfiguredScorer::Global(scorer)
            }
            ScorerChoice::Dynamic => {
                let mut scorer = DynamicScorer::new()
                    .with_attenuation(self.config.attenuation_factor)
                    .with_refinements(self.config.refinements);
                if let Some(is_initial) = self.initial_predicate {
                    scorer = scorer.with_initial_state_evidence(is_initial);
                }
                ConfiguredScorer::Dynamic(scorer)
            }
        }
    }

    fn compute_matching(&self, lhs: &Glts<S, T>, rhs: &Glts<S, T>) -> Result<Matching, MatchError> {
        match self.config.matcher {
            MatcherChoice::BruteForce => BruteForceMatcher::new().compute_matching(
                lhs,
                rhs,
                &self.state_combiner,
                &self.transition_combiner,
            ),
            MatcherChoice::KuhnMunkres => KuhnMunkresMatcher::new(self.build_scorer())
                .compute_matching(lhs, rhs, &self.state_combiner, &self.transition_combiner),
            MatcherChoice::Walkinshaw => {
                let mut matcher = WalkinshawMatcher::new(self.build_scorer())
                    .with_landmark_threshold(self.config.landmark_threshold)
                    .with_landmark_ratio(self.config.landmark_ratio);
                if let Some(is_initial) = self.initial_predicate {
                    matcher = matcher.with_initial_state_seeding(is_initial);
                }
                matcher.compute_matching(lhs, rhs, &self.state_combiner, &self.transition_combiner)
            }
            MatcherChoice::Dynamic => {
                let mut matcher = DynamicMatcher::new()
                    .with_landmark_threshold(self.config.landmark_threshold)
                    .with_landmark_ratio(self.config.landmark_ratio)
                    .with_attenuation(self.config.attenuation_factor)
                    .with_refinements(self.config.refinements);
                if let Some(is_initial) = self.initial_predicate {
                    matcher = matcher.with_initial_state_evidence(is_initial);
                }
                matcher.compute_matching(lhs, rhs, &self.state_combiner, &self.transition_combiner)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
