#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod annotation;
pub mod combine;
pub mod compare;
pub mod diff;
pub mod glts;
pub mod hide;
pub mod inclusion;
pub mod lts;
pub mod matching;
pub mod merge;
pub mod project;
pub mod scoring;

pub use annotation::{AnnotatedProperty, AnnotatedPropertyCombiner, AnnotatedPropertyHider};
pub use combine::{
    Combiner, EqualityCombiner, FixedValueCombiner, ListCombiner, MappedCombiner, PairCombiner,
    SetCombiner,
};
pub use compare::{
    CompareConfig, CompareError, MatcherChoice, ScorerChoice, StructureComparator,
};
pub use diff::{
    DiffAutomaton, DiffAutomatonError, DiffAutomatonStateProperty,
    DiffAutomatonStatePropertyCombiner, DiffAutomatonStatePropertyProjector, DiffKind,
    DiffKindCombiner, DiffKindProjector, DiffProperty, DiffPropertyCombiner, DiffPropertyHider,
    DiffPropertyProjector,
};
pub use diff::nesting::NestingError;
pub use glts::{Glts, GltsError, StateId, TransitionId, TransitionRef};
pub use hide::{Hider, SubstitutionHider};
pub use inclusion::Inclusion;
pub use lts::{
    AcceptingStateProperty, Automaton, AutomatonStateProperty, AutomatonStatePropertyCombiner,
    InitialStateProperty, Lts, LtsStateProperty, LtsStatePropertyCombiner, initial_states,
};
pub use matching::{
    BruteForceMatcher, DynamicMatcher, KuhnMunkresMatcher, MatchError, Matcher, Matching,
    WalkinshawMatcher,
};
pub use merge::{MergeError, merge};
pub use project::{
    IdentityProjector, MappedProjector, OptionProjector, Projector, SetProjector,
};
pub use scoring::{
    DynamicScorer, ScoreMatrix, ScoringError, SimilarityScorer, WalkinshawGlobalScorer,
    WalkinshawLocalScorer,
};

/// Returns the current version of the glts-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }
}
