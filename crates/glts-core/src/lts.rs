/// State property types for initialized and accepting transition systems.
///
/// An LTS is a GLTS whose state property carries an initial flag; an
/// automaton additionally carries an accepting flag. Both remain ordinary
/// property types: the graph type does not change, only the operators and
/// flag-access traits supplied for the properties.
use crate::combine::Combiner;
use crate::glts::{Glts, StateId};

// ---------------------------------------------------------------------------
// Property types
// ---------------------------------------------------------------------------

/// State property of a labeled transition system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LtsStateProperty {
    /// Whether the state is an initial state.
    pub is_initial: bool,
}

impl LtsStateProperty {
    /// Creates an LTS state property.
    pub fn new(is_initial: bool) -> Self {
        Self { is_initial }
    }
}

/// State property of an automaton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AutomatonStateProperty {
    /// Whether the state is an initial state.
    pub is_initial: bool,
    /// Whether the state is an accepting state.
    pub is_accepting: bool,
}

impl AutomatonStateProperty {
    /// Creates an automaton state property.
    pub fn new(is_initial: bool, is_accepting: bool) -> Self {
        Self {
            is_initial,
            is_accepting,
        }
    }
}

/// A GLTS whose states carry [`LtsStateProperty`] values.
pub type Lts<T> = Glts<LtsStateProperty, T>;

/// A GLTS whose states carry [`AutomatonStateProperty`] values.
pub type Automaton<T> = Glts<AutomatonStateProperty, T>;

// ---------------------------------------------------------------------------
// Flag access
// ---------------------------------------------------------------------------

/// State properties that know whether their state is initial.
pub trait InitialStateProperty {
    /// Returns `true` if the state carrying this property is initial.
    fn is_initial(&self) -> bool;
}

/// State properties that know whether their state is accepting.
pub trait AcceptingStateProperty {
    /// Returns `true` if the state carrying this property is accepting.
    fn is_accepting(&self) -> bool;
}

impl InitialStateProperty for LtsStateProperty {
    fn is_initial(&self) -> bool {
        self.is_initial
    }
}

impl InitialStateProperty for AutomatonStateProperty {
    fn is_initial(&self) -> bool {
        self.is_initial
    }
}

impl AcceptingStateProperty for AutomatonStateProperty {
    fn is_accepting(&self) -> bool {
        self.is_accepting
    }
}

/// Iterates over the initial states of a graph in ascending id order.
pub fn initial_states<S: InitialStateProperty, T>(
    glts: &Glts<S, T>,
) -> impl Iterator<Item = StateId> + '_ {
    glts.states().filter(|&state| {
        glts.state_property(state)
            .is_some_and(InitialStateProperty::is_initial)
    })
}

// ---------------------------------------------------------------------------
// Combiners
// ---------------------------------------------------------------------------

/// Combines LTS state properties whose initial flags match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LtsStatePropertyCombiner;

impl Combiner<LtsStateProperty> for LtsStatePropertyCombiner {
    fn are_combinable(&self, left: &LtsStateProperty, right: &LtsStateProperty) -> bool {
        left.is_initial == right.is_initial
    }

    fn combine(&self, left: &LtsStateProperty, _right: &LtsStateProperty) -> LtsStateProperty {
        *left
    }
}

/// Combines automaton state properties whose flags both match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutomatonStatePropertyCombiner;

impl Combiner<AutomatonStateProperty> for AutomatonStatePropertyCombiner {
    fn are_combinable(
        &self,
        left: &AutomatonStateProperty,
        right: &AutomatonStateProperty,
    ) -> bool {
        left.is_initial == right.is_initial && left.is_accepting == right.is_accepting
    }

    fn combine(
        &self,
        left: &AutomatonStateProperty,
        _right: &AutomatonStateProperty,
    ) -> AutomatonStateProperty {
        *left
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
