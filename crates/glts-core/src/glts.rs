/// In-memory generalized labeled transition system.
///
/// A [`Glts`] is a directed multigraph whose states and transitions carry
/// arbitrary property values. It wraps a `petgraph`
/// [`StableDiGraph`] with the graph-specific operations the comparison
/// pipeline needs: property access and rewrite, triple-deduplicated
/// transition storage, incoming/outgoing queries, projection, and
/// functorial mapping.
///
/// # Identity and ordering
///
/// States are identified by dense [`StateId`]s assigned in creation order;
/// states are never removed, so ids stay stable and state iteration is id
/// order. Transitions may be removed; every transition iterator (global,
/// incoming, outgoing) yields ascending [`TransitionId`] order so that all
/// downstream output is deterministic.
use std::collections::HashMap;
use std::fmt;

use petgraph::Direction;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;

use crate::project::Projector;

/// Identifier of a state within its owning graph.
pub type StateId = petgraph::stable_graph::NodeIndex;

/// Identifier of a transition within its owning graph.
pub type TransitionId = petgraph::stable_graph::EdgeIndex;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by graph mutation and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GltsError {
    /// The given state id does not name a state of this graph.
    UnknownState(StateId),
    /// The given transition id does not name a transition of this graph.
    UnknownTransition(TransitionId),
}

impl fmt::Display for GltsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownState(state) => {
                write!(f, "unknown state id {}", state.index())
            }
            Self::UnknownTransition(transition) => {
                write!(f, "unknown transition id {}", transition.index())
            }
        }
    }
}

impl std::error::Error for GltsError {}

// ---------------------------------------------------------------------------
// TransitionRef
// ---------------------------------------------------------------------------

/// A borrowed view of one transition: its id, endpoints, and property.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRef<'a, T> {
    /// Identifier of the transition.
    pub id: TransitionId,
    /// State the transition leaves.
    pub source: StateId,
    /// State the transition enters.
    pub target: StateId,
    /// The transition property.
    pub property: &'a T,
}

// ---------------------------------------------------------------------------
// Glts
// ---------------------------------------------------------------------------

/// A generalized labeled transition system with state properties `S` and
/// transition properties `T`.
#[derive(Debug, Clone)]
pub struct Glts<S, T> {
    graph: StableDiGraph<S, T>,
}

impl<S, T> Default for Glts<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> Glts<S, T> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::with_capacity(0, 0),
        }
    }

    /// Creates an empty graph with pre-allocated capacity.
    pub fn with_capacity(states: usize, transitions: usize) -> Self {
        Self {
            graph: StableDiGraph::with_capacity(states, transitions),
        }
    }

    /// Returns the number of states.
    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of transitions.
    pub fn transition_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Adds a state carrying `property` and returns its id.
    pub fn add_state(&mut self, property: S) -> StateId {
        self.graph.add_node(property)
    }

    /// Returns `true` if `state` names a state of this graph.
    pub fn contains_state(&self, state: StateId) -> bool {
        self.graph.node_weight(state).is_some()
    }

    /// Returns the property of `state`, or `None` for an unknown id.
    pub fn state_property(&self, state: StateId) -> Option<&S> {
        self.graph.node_weight(state)
    }

    /// Replaces the property of `state`.
    ///
    /// # Errors
    ///
    /// Returns [`GltsError::UnknownState`] if `state` is not in this graph.
    pub fn set_state_property(&mut self, state: StateId, property: S) -> Result<(), GltsError> {
        match self.graph.node_weight_mut(state) {
            Some(slot) => {
                *slot = property;
                Ok(())
            }
            None => Err(GltsError::UnknownState(state)),
        }
    }

    /// Iterates over all state ids in ascending id order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.graph.node_indices()
    }

    /// Returns the transition with the given id, or `None` for an unknown id.
    pub fn transition(&self, transition: TransitionId) -> Option<TransitionRef<'_, T>> {
        let (source, target) = self.graph.edge_endpoints(transition)?;
        let property = self.graph.edge_weight(transition)?;
        Some(TransitionRef {
            id: transition,
            source,
            target,
            property,
        })
    }

    /// Iterates over all transitions in ascending id order.
    pub fn transitions(&self) -> impl Iterator<Item = TransitionRef<'_, T>> + '_ {
        self.graph
            .edge_indices()
            .filter_map(|id| self.transition(id))
    }

    /// Returns the outgoing transitions of `state` in ascending id order.
    pub fn outgoing(&self, state: StateId) -> impl Iterator<Item = TransitionRef<'_, T>> + '_ {
        self.directed(state, Direction::Outgoing)
    }

    /// Returns the incoming transitions of `state` in ascending id order.
    pub fn incoming(&self, state: StateId) -> impl Iterator<Item = TransitionRef<'_, T>> + '_ {
        self.directed(state, Direction::Incoming)
    }

    fn directed(
        &self,
        state: StateId,
        direction: Direction,
    ) -> std::vec::IntoIter<TransitionRef<'_, T>> {
        let mut transitions: Vec<TransitionRef<'_, T>> = self
            .graph
            .edges_directed(state, direction)
            .map(|edge| TransitionRef {
                id: edge.id(),
                source: edge.source(),
                target: edge.target(),
                property: edge.weight(),
            })
            .collect();
        transitions.sort_by_key(|transition| transition.id);
        transitions.into_iter()
    }

    /// Maps state and transition properties into a new graph.
    ///
    /// State and transition ids are preserved.
    pub fn map<S2, T2>(
        &self,
        mut state_fn: impl FnMut(StateId, &S) -> S2,
        mut transition_fn: impl FnMut(TransitionId, &T) -> T2,
    ) -> Glts<S2, T2> {
        Glts {
            graph: self.graph.map(
                |id, property| state_fn(id, property),
                |id, property| transition_fn(id, property),
            ),
        }
    }
}

impl<S, T: PartialEq> Glts<S, T> {
    /// Adds the transition `(source, property, target)` and returns its id.
    ///
    /// The graph never stores two transitions with equal triples: re-adding
    /// an existing triple is a no-op that returns the existing id.
    ///
    /// # Errors
    ///
    /// Returns [`GltsError::UnknownState`] if either endpoint is not in this
    /// graph.
    pub fn add_transition(
        &mut self,
        source: StateId,
        property: T,
        target: StateId,
    ) -> Result<TransitionId, GltsError> {
        if !self.contains_state(source) {
            return Err(GltsError::UnknownState(source));
        }
        if !self.contains_state(target) {
            return Err(GltsError::UnknownState(target));
        }
        if let Some(existing) = self.find_transition(source, &property, target) {
            return Ok(existing);
        }
        Ok(self.graph.add_edge(source, target, property))
    }

    /// Returns the id of the transition with the given triple, if present.
    pub fn find_transition(
        &self,
        source: StateId,
        property: &T,
        target: StateId,
    ) -> Option<TransitionId> {
        self.graph
            .edges_directed(source, Direction::Outgoing)
            .filter(|edge| edge.target() == target && *edge.weight() == *property)
            .map(|edge| edge.id())
            .min()
    }

    /// Returns `true` if the graph contains the given triple.
    pub fn has_transition(&self, source: StateId, property: &T, target: StateId) -> bool {
        self.find_transition(source, property, target).is_some()
    }

    /// Removes a transition and returns its property.
    ///
    /// # Errors
    ///
    /// Returns [`GltsError::UnknownTransition`] if `transition` is not in
    /// this graph.
    pub fn remove_transition(&mut self, transition: TransitionId) -> Result<T, GltsError> {
        self.graph
            .remove_edge(transition)
            .ok_or(GltsError::UnknownTransition(transition))
    }

    /// Projects the graph along `along`.
    ///
    /// A state survives iff its property projects to present; a transition
    /// survives iff its property projects to present and both endpoints
    /// survived. Surviving states are renumbered densely in their original
    /// id order.
    pub fn project<U>(
        &self,
        state_projector: &dyn Projector<S, U>,
        transition_projector: &dyn Projector<T, U>,
        along: &U,
    ) -> Glts<S, T> {
        let mut result = Glts::with_capacity(self.state_count(), self.transition_count());
        let mut image: HashMap<StateId, StateId> = HashMap::with_capacity(self.state_count());

        for state in self.states() {
            let Some(property) = self.state_property(state) else {
                continue;
            };
            if let Some(projected) = state_projector.project(property, along) {
                image.insert(state, result.add_state(projected));
            }
        }

        for transition in self.transitions() {
            let Some(&source) = image.get(&transition.source) else {
                continue;
            };
            let Some(&target) = image.get(&transition.target) else {
                continue;
            };
            if let Some(projected) = transition_projector.project(transition.property, along) {
                // Endpoints exist by construction.
                result.add_transition(source, projected, target).ok();
            }
        }

        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
