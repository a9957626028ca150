/// Merging two GLTSs under a validated matching.
///
/// Matched state pairs fuse into single states carrying combined
/// properties; unmatched states are copied. Transitions follow their
/// endpoints, and an LHS/RHS transition pair landing on the same merged
/// endpoints with combinable properties fuses into one transition.
///
/// # Output order
///
/// Merged states are emitted first (in LHS-state order of the matched
/// keys), then unmatched LHS states (in id order), then unmatched RHS
/// states (in id order). Transitions are emitted grouped by source state,
/// then target state, with LHS transitions before RHS ones, so merge output
/// is fully deterministic.
use std::collections::BTreeMap;
use std::fmt;

use crate::combine::Combiner;
use crate::glts::{Glts, StateId};
use crate::matching::{MatchError, Matching};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced when a matching fails the merge preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    /// The matching references unknown states or non-combinable pairs.
    InvalidMatching(MatchError),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMatching(err) => {
                write!(f, "matching fails the merge preconditions: {err}")
            }
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidMatching(err) => Some(err),
        }
    }
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

/// Merges `lhs` and `rhs` under `matching`.
///
/// # Errors
///
/// Fails fast with [`MergeError::InvalidMatching`] when the matching
/// references states outside its graphs or pairs states with
/// non-combinable properties. Injectivity holds by [`Matching`]
/// construction.
pub fn merge<S, T>(
    lhs: &Glts<S, T>,
    rhs: &Glts<S, T>,
    matching: &Matching,
    state_combiner: &dyn Combiner<S>,
    transition_combiner: &dyn Combiner<T>,
) -> Result<Glts<S, T>, MergeError>
where
    S: Clone,
    T: Clone + PartialEq,
{
    matching
        .validate(lhs, rhs, state_combiner)
        .map_err(MergeError::InvalidMatching)?;

    let mut result = Glts::with_capacity(
        lhs.state_count() + rhs.state_count() - matching.len(),
        lhs.transition_count() + rhs.transition_count(),
    );
    let mut left_image: BTreeMap<StateId, StateId> = BTreeMap::new();
    let mut right_image: BTreeMap<StateId, StateId> = BTreeMap::new();

    // Merged states, in LHS-key order.
    for (left, right) in matching.iter() {
        let (Some(left_property), Some(right_property)) =
            (lhs.state_property(left), rhs.state_property(right))
        else {
            // validate() above has already rejected unknown states.
            continue;
        };
        let merged = result.add_state(state_combiner.combine(left_property, right_property));
        left_image.insert(left, merged);
        right_image.insert(right, merged);
    }

    // Unmatched LHS states, in id order.
    for left in lhs.states() {
        if matching.contains_left(left) {
            continue;
        }
        let Some(property) = lhs.state_property(left) else {
            continue;
        };
        left_image.insert(left, result.add_state(property.clone()));
    }

    // Unmatched RHS states, in id order.
    for right in rhs.states() {
        if matching.contains_right(right) {
            continue;
        }
        let Some(property) = rhs.state_property(right) else {
            continue;
        };
        right_image.insert(right, result.add_state(property.clone()));
    }

    // Group transitions by merged endpoint pair; BTreeMap iteration gives
    // the source-then-target emission order.
    type Grouped<'a, T> = BTreeMap<(StateId, StateId), (Vec<&'a T>, Vec<&'a T>)>;
    let mut groups: Grouped<'_, T> = BTreeMap::new();
    for transition in lhs.transitions() {
        let key = (
            left_image[&transition.source],
            left_image[&transition.target],
        );
        groups.entry(key).or_default().0.push(transition.property);
    }
    for transition in rhs.transitions() {
        let key = (
            right_image[&transition.source],
            right_image[&transition.target],
        );
        groups.entry(key).or_default().1.push(transition.property);
    }

    for ((source, target), (left_properties, right_properties)) in groups {
        // Pair each LHS transition with the first unconsumed combinable RHS
        // transition; the pair fuses into one combined transition.
        let mut right_consumed = vec![false; right_properties.len()];
        for left_property in left_properties {
            let mut fused: Option<T> = None;
            for (index, right_property) in right_properties.iter().enumerate() {
                if !right_consumed[index]
                    && transition_combiner.are_combinable(left_property, right_property)
                {
                    right_consumed[index] = true;
                    fused = Some(transition_combiner.combine(left_property, right_property));
                    break;
                }
            }
            let property = fused.unwrap_or_else(|| left_property.clone());
            // Endpoints were created above.
            result.add_transition(source, property, target).ok();
        }
        for (index, right_property) in right_properties.iter().enumerate() {
            if !right_consumed[index] {
                result
                    .add_transition(source, (*right_property).clone(), target)
                    .ok();
            }
        }
    }

    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
