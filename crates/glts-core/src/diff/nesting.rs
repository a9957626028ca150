/// The diff-kind nesting validator.
///
/// A transition's diff kind must nest inside the diff kinds of both its
/// endpoints: added states only carry added transitions, removed states
/// only removed ones, and unchanged states carry transitions of any kind.
///
/// [`DiffAutomaton`](super::DiffAutomaton) applies [`check`] on every
/// mutation; [`validate`] checks a whole raw graph, for instance after a
/// merge assembled one outside the checked wrapper.
use std::fmt;

use crate::glts::{Glts, StateId};

use super::{DiffAutomatonStateProperty, DiffKind, DiffProperty};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// A violation of the diff-kind nesting invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingError {
    /// A state's diff kind does not admit an incident transition's kind.
    TransitionKindNotNested {
        /// The offending endpoint state.
        state: StateId,
        /// The endpoint's diff kind.
        state_kind: DiffKind,
        /// The incident transition's diff kind.
        transition_kind: DiffKind,
    },
}

impl fmt::Display for NestingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransitionKindNotNested {
                state,
                state_kind,
                transition_kind,
            } => write!(
                f,
                "state {} is {state_kind} and cannot carry a {transition_kind} transition",
                state.index()
            ),
        }
    }
}

impl std::error::Error for NestingError {}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Returns `true` if a state of kind `state_kind` may carry a transition of
/// kind `transition_kind`.
pub fn transition_allowed(state_kind: DiffKind, transition_kind: DiffKind) -> bool {
    state_kind == DiffKind::Unchanged || state_kind == transition_kind
}

/// Checks one endpoint/transition kind pairing.
///
/// # Errors
///
/// Returns [`NestingError::TransitionKindNotNested`] when the pairing is not
/// allowed.
pub fn check(
    state: StateId,
    state_kind: DiffKind,
    transition_kind: DiffKind,
) -> Result<(), NestingError> {
    if transition_allowed(state_kind, transition_kind) {
        Ok(())
    } else {
        Err(NestingError::TransitionKindNotNested {
            state,
            state_kind,
            transition_kind,
        })
    }
}

/// Validates the nesting invariant over a whole raw graph.
///
/// Transitions are visited in ascending id order, each checking its source
/// before its target, so the reported violation is deterministic.
///
/// # Errors
///
/// Returns the first [`NestingError`] found.
pub fn validate<T>(
    glts: &Glts<DiffAutomatonStateProperty, DiffProperty<T>>,
) -> Result<(), NestingError> {
    for transition in glts.transitions() {
        for state in [transition.source, transition.target] {
            let Some(property) = glts.state_property(state) else {
                continue;
            };
            check(state, property.state_kind, transition.property.kind)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn allowance_table() {
        use DiffKind::{Added, Removed, Unchanged};
        assert!(transition_allowed(Unchanged, Added));
        assert!(transition_allowed(Unchanged, Removed));
        assert!(transition_allowed(Unchanged, Unchanged));
        assert!(transition_allowed(Added, Added));
        assert!(transition_allowed(Removed, Removed));
        assert!(!transition_allowed(Added, Removed));
        assert!(!transition_allowed(Added, Unchanged));
        assert!(!transition_allowed(Removed, Added));
        assert!(!transition_allowed(Removed, Unchanged));
    }

    #[test]
    fn validate_accepts_a_well_nested_graph() {
        let mut glts: Glts<DiffAutomatonStateProperty, DiffProperty<char>> = Glts::new();
        let s0 = glts.add_state(DiffAutomatonStateProperty::new(false, DiffKind::Unchanged, None));
        let s1 = glts.add_state(DiffAutomatonStateProperty::new(false, DiffKind::Added, None));
        glts.add_transition(s0, DiffProperty::new('a', DiffKind::Added), s1)
            .expect("endpoints exist");
        assert_eq!(validate(&glts), Ok(()));
    }

    #[test]
    fn validate_reports_the_first_violation() {
        let mut glts: Glts<DiffAutomatonStateProperty, DiffProperty<char>> = Glts::new();
        let s0 = glts.add_state(DiffAutomatonStateProperty::new(false, DiffKind::Removed, None));
        let s1 = glts.add_state(DiffAutomatonStateProperty::new(false, DiffKind::Added, None));
        glts.add_transition(s0, DiffProperty::new('a', DiffKind::Added), s1)
            .expect("endpoints exist");
        assert_eq!(
            validate(&glts),
            Err(NestingError::TransitionKindNotNested {
                state: s0,
                state_kind: DiffKind::Removed,
                transition_kind: DiffKind::Added,
            })
        );
    }
}
