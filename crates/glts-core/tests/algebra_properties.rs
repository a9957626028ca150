//! Property-based tests for the operator algebra and the pipeline
//! invariants: hider idempotence, combiner idempotence, inclusion
//! consistency, scorer symmetry, matching well-formedness, and merge
//! identity, over `proptest`-generated small graphs.
#![allow(clippy::expect_used)]

use std::collections::BTreeSet;

use glts_core::{
    AnnotatedProperty, AnnotatedPropertyHider, BruteForceMatcher, Combiner, DiffKind,
    DiffKindCombiner, DiffProperty, DiffPropertyHider, DynamicMatcher, EqualityCombiner, Glts,
    Hider, Inclusion, KuhnMunkresMatcher, Matcher, PairCombiner, SetCombiner, SimilarityScorer,
    StateId, SubstitutionHider, WalkinshawLocalScorer, merge,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A small graph described as a state count plus labeled transitions.
#[derive(Debug, Clone)]
struct SmallGraph {
    states: usize,
    transitions: Vec<(usize, char, usize)>,
}

impl SmallGraph {
    fn build(&self) -> Glts<(), char> {
        let mut glts = Glts::new();
        let ids: Vec<StateId> = (0..self.states).map(|_| glts.add_state(())).collect();
        for &(source, label, target) in &self.transitions {
            glts.add_transition(ids[source], label, ids[target])
                .expect("endpoints exist");
        }
        glts
    }
}

fn small_graph(max_states: usize, max_transitions: usize) -> impl Strategy<Value = SmallGraph> {
    (1..=max_states).prop_flat_map(move |states| {
        prop::collection::vec(
            (0..states, prop::sample::select(vec!['a', 'b', 'c']), 0..states),
            0..=max_transitions,
        )
        .prop_map(move |transitions| SmallGraph {
            states,
            transitions,
        })
    })
}

fn diff_kind() -> impl Strategy<Value = DiffKind> {
    prop::sample::select(vec![DiffKind::Added, DiffKind::Removed, DiffKind::Unchanged])
}

// ---------------------------------------------------------------------------
// Hider idempotence
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn substitution_hider_is_idempotent(value in ".*", substitute in ".*") {
        let hider = SubstitutionHider::new(substitute);
        let once = hider.hide(&value);
        prop_assert_eq!(hider.hide(&once), once);
    }

    #[test]
    fn diff_property_hider_is_idempotent(value in ".*", kind in diff_kind()) {
        let hider = DiffPropertyHider::new(SubstitutionHider::new("tau".to_owned()));
        let once = hider.hide(&DiffProperty::new(value, kind));
        let twice = hider.hide(&once);
        prop_assert_eq!(&twice, &once);
        prop_assert_eq!(once.kind, kind);
    }

    #[test]
    fn annotated_property_hider_is_idempotent(
        value in ".*",
        annotations in prop::collection::vec(".*", 0..4),
    ) {
        let hider = AnnotatedPropertyHider::new(SubstitutionHider::new("tau".to_owned()));
        let property = AnnotatedProperty {
            inner: value,
            annotations,
        };
        let once = hider.hide(&property);
        prop_assert_eq!(hider.hide(&once), once);
    }
}

// ---------------------------------------------------------------------------
// Combiner idempotence on equal inputs
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn equality_combiner_is_idempotent(value in any::<u32>()) {
        let combiner = EqualityCombiner;
        prop_assert!(combiner.are_combinable(&value, &value));
        prop_assert_eq!(combiner.combine(&value, &value), value);
    }

    #[test]
    fn set_combiner_is_idempotent(values in prop::collection::btree_set(any::<u8>(), 0..8)) {
        let combiner = SetCombiner;
        prop_assert_eq!(combiner.combine(&values, &values), values);
    }

    #[test]
    fn diff_kind_combiner_is_idempotent_and_commutative(
        left in diff_kind(),
        right in diff_kind(),
    ) {
        let combiner = DiffKindCombiner;
        prop_assert_eq!(combiner.combine(&left, &left), left);
        prop_assert_eq!(
            combiner.combine(&left, &right),
            combiner.combine(&right, &left)
        );
    }

    #[test]
    fn pair_combiner_is_idempotent(first in any::<u8>(), second in any::<u16>()) {
        let combiner = PairCombiner::new(EqualityCombiner, EqualityCombiner);
        let value = (first, second);
        prop_assert!(combiner.are_combinable(&value, &value));
        prop_assert_eq!(combiner.combine(&value, &value), value);
    }
}

// ---------------------------------------------------------------------------
// Inclusion / combination consistency
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn inclusion_under_union_is_subset(
        left in prop::collection::btree_set(any::<u8>(), 0..8),
        right in prop::collection::btree_set(any::<u8>(), 0..8),
    ) {
        let inclusion = Inclusion::new(SetCombiner);
        prop_assert_eq!(inclusion.is_included_in(&left, &right), left.is_subset(&right));
    }

    #[test]
    fn inclusion_matches_the_combination_equation(
        left in prop::collection::btree_set(any::<u8>(), 0..8),
        right in prop::collection::btree_set(any::<u8>(), 0..8),
    ) {
        let combiner = SetCombiner;
        let inclusion = Inclusion::new(SetCombiner);
        let expected: BTreeSet<u8> = combiner.combine(&left, &right);
        prop_assert_eq!(inclusion.is_included_in(&left, &right), expected == right);
    }
}

// ---------------------------------------------------------------------------
// Scorer symmetry
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transposing_the_inputs_transposes_the_scores(
        lhs in small_graph(4, 8),
        rhs in small_graph(4, 8),
    ) {
        let lhs = lhs.build();
        let rhs = rhs.build();
        let scorer = WalkinshawLocalScorer::new();
        let forward = scorer
            .score(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("local scoring cannot fail");
        let transposed = scorer
            .score(&rhs, &lhs, &EqualityCombiner, &EqualityCombiner)
            .expect("local scoring cannot fail");

        for left in lhs.states() {
            for right in rhs.states() {
                let a = forward.get(left, right);
                let b = transposed.get(right, left);
                prop_assert!(
                    (a - b).abs() < 1e-9,
                    "score ({left:?}, {right:?}) is {a}, transposed is {b}"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Matching well-formedness
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn matcher_outputs_validate(lhs in small_graph(4, 6), rhs in small_graph(4, 6)) {
        let lhs = lhs.build();
        let rhs = rhs.build();

        let assignment = KuhnMunkresMatcher::new(WalkinshawLocalScorer::new())
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        prop_assert_eq!(assignment.validate(&lhs, &rhs, &EqualityCombiner), Ok(()));

        let dynamic = DynamicMatcher::new()
            .compute_matching(&lhs, &rhs, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        prop_assert_eq!(dynamic.validate(&lhs, &rhs, &EqualityCombiner), Ok(()));
    }
}

// ---------------------------------------------------------------------------
// Merge identity
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn comparing_a_graph_with_itself_is_the_identity(graph in small_graph(4, 6)) {
        let graph = graph.build();
        let matching = BruteForceMatcher::new()
            .compute_matching(&graph, &graph, &EqualityCombiner, &EqualityCombiner)
            .expect("matching succeeds");
        prop_assert_eq!(matching.len(), graph.state_count(), "self-matching is total");

        let merged = merge(
            &graph,
            &graph,
            &matching,
            &EqualityCombiner,
            &EqualityCombiner,
        )
        .expect("merge succeeds");
        prop_assert_eq!(merged.state_count(), graph.state_count());
        prop_assert_eq!(merged.transition_count(), graph.transition_count());
    }
}
