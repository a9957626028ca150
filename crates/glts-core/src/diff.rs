/// Difference-annotated automata.
///
/// A diff automaton records how two automata differ: every state and
/// transition carries a [`DiffKind`] tagging it as present on one side only
/// (added/removed) or on both (unchanged). States additionally carry an
/// optional diff kind for their initial aspect, present exactly when the
/// state is initial, so the "initial iff tagged" invariant holds by
/// construction.
///
/// The kind of a transition must nest inside the kinds of its endpoints: an
/// added state can only touch added transitions, a removed state only
/// removed ones, while unchanged states may touch transitions of any kind.
/// [`DiffAutomaton`] enforces this on every mutation; the standalone
/// validator in [`nesting`] checks whole graphs.
use std::fmt;

use crate::combine::Combiner;
use crate::glts::{Glts, StateId, TransitionId, TransitionRef};
use crate::hide::Hider;
use crate::lts::{AcceptingStateProperty, Automaton, AutomatonStateProperty, InitialStateProperty};
use crate::project::Projector;

pub mod nesting;

use nesting::NestingError;

// ---------------------------------------------------------------------------
// DiffKind
// ---------------------------------------------------------------------------

/// Tags an element of a diff automaton as present in the left input only,
/// the right input only, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiffKind {
    /// Present in the right input only.
    Added,
    /// Present in the left input only.
    Removed,
    /// Present in both inputs.
    Unchanged,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
            Self::Unchanged => f.write_str("unchanged"),
        }
    }
}

// ---------------------------------------------------------------------------
// Property types
// ---------------------------------------------------------------------------

/// Transition property of a diff automaton: an inner property paired with
/// the transition's diff kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiffProperty<T> {
    /// The property the transition carried before diffing.
    pub inner: T,
    /// How the transition differs between the inputs.
    pub kind: DiffKind,
}

impl<T> DiffProperty<T> {
    /// Creates a diff transition property.
    pub fn new(inner: T, kind: DiffKind) -> Self {
        Self { inner, kind }
    }
}

/// State property of a diff automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiffAutomatonStateProperty {
    /// Whether the state is an accepting state.
    pub is_accepting: bool,
    /// How the state differs between the inputs.
    pub state_kind: DiffKind,
    /// How the state's initial aspect differs between the inputs; present
    /// iff the state is initial.
    pub initial_kind: Option<DiffKind>,
}

impl DiffAutomatonStateProperty {
    /// Creates a diff automaton state property.
    pub fn new(is_accepting: bool, state_kind: DiffKind, initial_kind: Option<DiffKind>) -> Self {
        Self {
            is_accepting,
            state_kind,
            initial_kind,
        }
    }
}

impl InitialStateProperty for DiffAutomatonStateProperty {
    fn is_initial(&self) -> bool {
        self.initial_kind.is_some()
    }
}

impl AcceptingStateProperty for DiffAutomatonStateProperty {
    fn is_accepting(&self) -> bool {
        self.is_accepting
    }
}

// ---------------------------------------------------------------------------
// Combiners
// ---------------------------------------------------------------------------

/// Combines diff kinds: any two kinds are combinable; equal kinds keep the
/// kind, unequal kinds yield [`DiffKind::Unchanged`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffKindCombiner;

impl Combiner<DiffKind> for DiffKindCombiner {
    fn are_combinable(&self, _left: &DiffKind, _right: &DiffKind) -> bool {
        true
    }

    fn combine(&self, left: &DiffKind, right: &DiffKind) -> DiffKind {
        if left == right { *left } else { DiffKind::Unchanged }
    }
}

/// Combines diff transition properties through an inner combiner; the diff
/// kinds combine via [`DiffKindCombiner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffPropertyCombiner<C> {
    inner: C,
}

impl<C> DiffPropertyCombiner<C> {
    /// Creates a diff property combiner from an inner combiner.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<T, C: Combiner<T>> Combiner<DiffProperty<T>> for DiffPropertyCombiner<C> {
    fn are_combinable(&self, left: &DiffProperty<T>, right: &DiffProperty<T>) -> bool {
        self.inner.are_combinable(&left.inner, &right.inner)
    }

    fn combine(&self, left: &DiffProperty<T>, right: &DiffProperty<T>) -> DiffProperty<T> {
        DiffProperty {
            inner: self.inner.combine(&left.inner, &right.inner),
            kind: DiffKindCombiner.combine(&left.kind, &right.kind),
        }
    }
}

/// Combines diff automaton state properties.
///
/// Combinable iff the accepting flags match and either both or neither side
/// is initial; the state and initial kinds combine via [`DiffKindCombiner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffAutomatonStatePropertyCombiner;

impl Combiner<DiffAutomatonStateProperty> for DiffAutomatonStatePropertyCombiner {
    fn are_combinable(
        &self,
        left: &DiffAutomatonStateProperty,
        right: &DiffAutomatonStateProperty,
    ) -> bool {
        left.is_accepting == right.is_accepting && left.is_initial() == right.is_initial()
    }

    fn combine(
        &self,
        left: &DiffAutomatonStateProperty,
        right: &DiffAutomatonStateProperty,
    ) -> DiffAutomatonStateProperty {
        let initial_kind = match (left.initial_kind, right.initial_kind) {
            (Some(l), Some(r)) => Some(DiffKindCombiner.combine(&l, &r)),
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (None, None) => None,
        };
        DiffAutomatonStateProperty {
            is_accepting: left.is_accepting,
            state_kind: DiffKindCombiner.combine(&left.state_kind, &right.state_kind),
            initial_kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Projectors
// ---------------------------------------------------------------------------

/// Projects a diff kind along another diff kind.
///
/// Unchanged projects to the projection kind, a matching kind projects to
/// itself, and disjoint kinds are eliminated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffKindProjector;

impl Projector<DiffKind, DiffKind> for DiffKindProjector {
    fn project(&self, property: &DiffKind, along: &DiffKind) -> Option<DiffKind> {
        if *property == DiffKind::Unchanged {
            Some(*along)
        } else if property == along {
            Some(*property)
        } else {
            None
        }
    }
}

/// Projects a diff transition property along a diff kind; the inner
/// property is preserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffPropertyProjector;

impl<T: Clone> Projector<DiffProperty<T>, DiffKind> for DiffPropertyProjector {
    fn project(&self, property: &DiffProperty<T>, along: &DiffKind) -> Option<DiffProperty<T>> {
        DiffKindProjector
            .project(&property.kind, along)
            .map(|kind| DiffProperty {
                inner: property.inner.clone(),
                kind,
            })
    }
}

/// Projects a diff automaton state property along a diff kind.
///
/// Elimination of the state kind eliminates the state; elimination of the
/// initial kind only demotes the state to non-initial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffAutomatonStatePropertyProjector;

impl Projector<DiffAutomatonStateProperty, DiffKind> for DiffAutomatonStatePropertyProjector {
    fn project(
        &self,
        property: &DiffAutomatonStateProperty,
        along: &DiffKind,
    ) -> Option<DiffAutomatonStateProperty> {
        let state_kind = DiffKindProjector.project(&property.state_kind, along)?;
        let initial_kind = property
            .initial_kind
            .and_then(|kind| DiffKindProjector.project(&kind, along));
        Some(DiffAutomatonStateProperty {
            is_accepting: property.is_accepting,
            state_kind,
            initial_kind,
        })
    }
}

// ---------------------------------------------------------------------------
// Hider
// ---------------------------------------------------------------------------

/// Hides the inner property of a diff transition property, preserving the
/// diff kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffPropertyHider<H> {
    inner: H,
}

impl<H> DiffPropertyHider<H> {
    /// Creates a diff property hider from an inner hider.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<T, H: Hider<T>> Hider<DiffProperty<T>> for DiffPropertyHider<H> {
    fn hide(&self, property: &DiffProperty<T>) -> DiffProperty<T> {
        DiffProperty {
            inner: self.inner.hide(&property.inner),
            kind: property.kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by diff automaton mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffAutomatonError {
    /// The given state id does not name a state of this automaton.
    UnknownState(StateId),
    /// The given transition id does not name a transition of this automaton.
    UnknownTransition(TransitionId),
    /// The mutation would violate the diff-kind nesting invariant.
    Nesting(NestingError),
}

impl fmt::Display for DiffAutomatonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownState(state) => {
                write!(f, "unknown state id {}", state.index())
            }
            Self::UnknownTransition(transition) => {
                write!(f, "unknown transition id {}", transition.index())
            }
            Self::Nesting(err) => write!(f, "nesting violation: {err}"),
        }
    }
}

impl std::error::Error for DiffAutomatonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Nesting(err) => Some(err),
            Self::UnknownState(_) | Self::UnknownTransition(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DiffAutomaton
// ---------------------------------------------------------------------------

/// An automaton whose states and transitions carry diff kinds, with the
/// nesting invariant enforced on every mutation.
#[derive(Debug, Clone)]
pub struct DiffAutomaton<T> {
    glts: Glts<DiffAutomatonStateProperty, DiffProperty<T>>,
}

impl<T> Default for DiffAutomaton<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DiffAutomaton<T> {
    /// Creates an empty diff automaton.
    pub fn new() -> Self {
        Self { glts: Glts::new() }
    }

    /// Wraps a raw graph after validating the nesting invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`NestingError`] found, in transition-id order.
    pub fn from_glts(
        glts: Glts<DiffAutomatonStateProperty, DiffProperty<T>>,
    ) -> Result<Self, NestingError> {
        nesting::validate(&glts)?;
        Ok(Self { glts })
    }

    /// Returns the underlying graph for read access.
    pub fn as_glts(&self) -> &Glts<DiffAutomatonStateProperty, DiffProperty<T>> {
        &self.glts
    }

    /// Unwraps the underlying graph.
    pub fn into_glts(self) -> Glts<DiffAutomatonStateProperty, DiffProperty<T>> {
        self.glts
    }

    /// Returns the number of states.
    pub fn state_count(&self) -> usize {
        self.glts.state_count()
    }

    /// Returns the number of transitions.
    pub fn transition_count(&self) -> usize {
        self.glts.transition_count()
    }

    /// Iterates over all state ids in ascending id order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.glts.states()
    }

    /// Returns the property of `state`, or `None` for an unknown id.
    pub fn state_property(&self, state: StateId) -> Option<&DiffAutomatonStateProperty> {
        self.glts.state_property(state)
    }

    /// Iterates over all transitions in ascending id order.
    pub fn transitions(&self) -> impl Iterator<Item = TransitionRef<'_, DiffProperty<T>>> + '_ {
        self.glts.transitions()
    }

    /// Adds a state carrying `property` and returns its id.
    ///
    /// A state on its own cannot violate nesting.
    pub fn add_state(&mut self, property: DiffAutomatonStateProperty) -> StateId {
        self.glts.add_state(property)
    }

    /// Replaces the property of `state`.
    ///
    /// # Errors
    ///
    /// Fails if `state` is unknown or if any incident transition's kind does
    /// not nest inside the new state kind.
    pub fn set_state_property(
        &mut self,
        state: StateId,
        property: DiffAutomatonStateProperty,
    ) -> Result<(), DiffAutomatonError> {
        if !self.glts.contains_state(state) {
            return Err(DiffAutomatonError::UnknownState(state));
        }
        for transition in self.glts.outgoing(state).chain(self.glts.incoming(state)) {
            nesting::check(state, property.state_kind, transition.property.kind)
                .map_err(DiffAutomatonError::Nesting)?;
        }
        self.glts
            .set_state_property(state, property)
            .map_err(|_| DiffAutomatonError::UnknownState(state))
    }
}

impl<T: PartialEq> DiffAutomaton<T> {
    /// Adds the transition `(source, property, target)` and returns its id.
    ///
    /// # Errors
    ///
    /// Fails if either endpoint is unknown or if the transition's kind does
    /// not nest inside both endpoint kinds.
    pub fn add_transition(
        &mut self,
        source: StateId,
        property: DiffProperty<T>,
        target: StateId,
    ) -> Result<TransitionId, DiffAutomatonError> {
        for state in [source, target] {
            let Some(state_property) = self.glts.state_property(state) else {
                return Err(DiffAutomatonError::UnknownState(state));
            };
            nesting::check(state, state_property.state_kind, property.kind)
                .map_err(DiffAutomatonError::Nesting)?;
        }
        self.glts
            .add_transition(source, property, target)
            .map_err(|_| DiffAutomatonError::UnknownState(source))
    }

    /// Removes a transition and returns its property.
    ///
    /// # Errors
    ///
    /// Returns [`DiffAutomatonError::UnknownTransition`] for an unknown id.
    pub fn remove_transition(
        &mut self,
        transition: TransitionId,
    ) -> Result<DiffProperty<T>, DiffAutomatonError> {
        self.glts
            .remove_transition(transition)
            .map_err(|_| DiffAutomatonError::UnknownTransition(transition))
    }
}

impl<T: Clone + PartialEq> DiffAutomaton<T> {
    /// Converts an automaton into a diff automaton with every state,
    /// initial aspect, and transition tagged `kind`.
    pub fn from_automaton(automaton: &Automaton<T>, kind: DiffKind) -> Self {
        let glts = automaton.map(
            |_, property| DiffAutomatonStateProperty {
                is_accepting: property.is_accepting,
                state_kind: kind,
                initial_kind: property.is_initial.then_some(kind),
            },
            |_, property| DiffProperty {
                inner: property.clone(),
                kind,
            },
        );
        // Uniform kinds cannot violate nesting.
        Self { glts }
    }

    /// Projects the diff automaton along `along`.
    ///
    /// Projection cannot violate nesting: every surviving kind equals
    /// `along`.
    pub fn project(&self, along: DiffKind) -> Self {
        Self {
            glts: self.glts.project(
                &DiffAutomatonStatePropertyProjector,
                &DiffPropertyProjector,
                &along,
            ),
        }
    }

    /// Projects onto the left input: keeps removed and unchanged elements.
    pub fn project_left(&self) -> Self {
        self.project(DiffKind::Removed)
    }

    /// Projects onto the right input: keeps added and unchanged elements.
    pub fn project_right(&self) -> Self {
        self.project(DiffKind::Added)
    }

    /// Drops all diff kinds, recovering a plain automaton.
    pub fn to_automaton(&self) -> Automaton<T> {
        self.glts.map(
            |_, property| AutomatonStateProperty {
                is_initial: property.is_initial(),
                is_accepting: property.is_accepting,
            },
            |_, property| property.inner.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
