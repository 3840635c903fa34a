#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

use log::debug;

use supc_utilities::TypedIndex;

use crate::Event;
use crate::EventSet;
use crate::bit_matrix::BitMatrix;
use crate::reachability::sparse_bfs;

/// A unique type for the states of a concrete automaton.
pub struct StateTag;

/// The index of a state in a concrete automaton.
pub type StateIndex = TypedIndex<usize, StateTag>;

/// A deterministic automaton over a fixed event alphabet, stored as a sparse
/// adjacency whose cell `(from, to)` holds the set of events leading from
/// `from` to `to`.
///
/// # Details
///
/// Besides the adjacency the automaton maintains, per state, the set of
/// enabled events and the set of incoming events. Both are updated on every
/// [`Automaton::add_transition`], so compositions and the supervisor
/// synthesis can query them without any preprocessing. The declared alphabet
/// is always a superset of the labels in use; [`Automaton::insert_events`]
/// widens it, which lets a specification disable an event globally by
/// declaring it without enabling it anywhere.
///
/// The transition relation is deterministic: each `(state, event)` pair has
/// at most one successor.
#[derive(Clone, PartialEq, Eq)]
pub struct Automaton<const W: usize> {
    initial_state: StateIndex,
    marked: BTreeSet<StateIndex>,
    events: EventSet<W>,

    /// Outgoing transitions per state, sorted by target state.
    rows: Vec<Vec<(StateIndex, EventSet<W>)>>,
    state_events: Vec<EventSet<W>>,
    inv_state_events: Vec<EventSet<W>>,
}

impl<const W: usize> Automaton<W> {
    /// Creates an automaton with the given number of states and no
    /// transitions.
    pub fn new(
        num_of_states: usize,
        initial_state: StateIndex,
        marked: impl IntoIterator<Item = StateIndex>,
    ) -> Self {
        assert!(
            initial_state.value() < num_of_states,
            "Initial state {initial_state} out of bounds {num_of_states}"
        );

        let marked: BTreeSet<StateIndex> = marked.into_iter().collect();
        for state in &marked {
            assert!(
                state.value() < num_of_states,
                "Marked state {state} out of bounds {num_of_states}"
            );
        }

        Self {
            initial_state,
            marked,
            events: EventSet::new(),
            rows: vec![Vec::new(); num_of_states],
            state_events: vec![EventSet::new(); num_of_states],
            inv_state_events: vec![EventSet::new(); num_of_states],
        }
    }

    /// The automaton with no states at all, the canonical representation of
    /// an empty supervisor.
    pub fn empty() -> Self {
        Self {
            initial_state: StateIndex::new(0),
            marked: BTreeSet::new(),
            events: EventSet::new(),
            rows: Vec::new(),
            state_events: Vec::new(),
            inv_state_events: Vec::new(),
        }
    }

    /// Adds `event` to the transition from `from` to `to`.
    pub fn add_transition(&mut self, from: StateIndex, to: StateIndex, event: Event) {
        assert!(
            from.value() < self.num_of_states(),
            "State {from} out of bounds {}",
            self.num_of_states()
        );
        assert!(
            to.value() < self.num_of_states(),
            "State {to} out of bounds {}",
            self.num_of_states()
        );
        debug_assert!(
            !self.state_events[from.value()].contains(event) || self.transition(from, event) == Some(to),
            "Event {event} is already enabled from state {from} with another successor"
        );

        let row = &mut self.rows[from.value()];
        match row.binary_search_by_key(&to, |(target, _)| *target) {
            Ok(cell) => row[cell].1.insert(event),
            Err(cell) => {
                let mut events = EventSet::new();
                events.insert(event);
                row.insert(cell, (to, events));
            }
        }

        self.state_events[from.value()].insert(event);
        self.inv_state_events[to.value()].insert(event);
        self.events.insert(event);
    }

    /// Widens the declared alphabet with the given events.
    pub fn insert_events(&mut self, events: EventSet<W>) {
        self.events |= events;
    }

    /// Returns the number of states.
    pub fn num_of_states(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of transitions, counting one per event label.
    pub fn num_of_transitions(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter().map(|(_, events)| events.count()))
            .sum()
    }

    /// Returns the index of the initial state.
    pub fn initial_state(&self) -> StateIndex {
        self.initial_state
    }

    /// Returns true iff the given state is marked.
    pub fn is_marked(&self, state: StateIndex) -> bool {
        self.marked.contains(&state)
    }

    /// Iterates over the marked states in ascending order.
    pub fn marked_states(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.marked.iter().copied()
    }

    /// Returns the declared event alphabet, a superset of the labels in use.
    pub fn events(&self) -> EventSet<W> {
        self.events
    }

    /// Returns the set of events enabled in the given state.
    pub fn state_events(&self, state: StateIndex) -> EventSet<W> {
        self.state_events[state.value()]
    }

    /// Returns the set of events with a transition into the given state.
    pub fn inv_state_events(&self, state: StateIndex) -> EventSet<W> {
        self.inv_state_events[state.value()]
    }

    /// Returns true iff `event` is enabled in `state`.
    pub fn contains_transition(&self, state: StateIndex, event: Event) -> bool {
        self.state_events[state.value()].contains(event)
    }

    /// Returns true iff some transition labelled `event` enters `state`.
    pub fn contains_inv_transition(&self, state: StateIndex, event: Event) -> bool {
        self.inv_state_events[state.value()].contains(event)
    }

    /// Returns the unique successor of `state` under `event`, or `None` when
    /// the event is not enabled.
    pub fn transition(&self, state: StateIndex, event: Event) -> Option<StateIndex> {
        if !self.contains_transition(state, event) {
            return None;
        }

        self.rows[state.value()]
            .iter()
            .find(|(_, events)| events.contains(event))
            .map(|(to, _)| *to)
    }

    /// Iterates over the outgoing transitions of the given state as
    /// `(to, events)` pairs, in ascending target order.
    pub fn outgoing_transitions(&self, state: StateIndex) -> impl Iterator<Item = (StateIndex, EventSet<W>)> + '_ {
        self.rows[state.value()].iter().copied()
    }

    /// The set of states reachable from the initial state.
    pub fn accessible_part(&self) -> BTreeSet<StateIndex> {
        let mut result = BTreeSet::new();
        if self.num_of_states() == 0 {
            return result;
        }

        let matrix = self.bit_graph().transpose();
        sparse_bfs(&matrix, &[self.initial_state], |_, reached| {
            result.insert(reached);
        });

        result
    }

    /// The set of states from which a marked state is reachable.
    pub fn coaccessible_part(&self) -> BTreeSet<StateIndex> {
        let mut result = BTreeSet::new();
        let sources: Vec<StateIndex> = self.marked.iter().copied().collect();
        if sources.is_empty() {
            return result;
        }

        // Searching backwards from the marked states, which is a forward
        // search in the non-transposed adjacency.
        let matrix = self.bit_graph();
        sparse_bfs(&matrix, &sources, |_, reached| {
            result.insert(reached);
        });

        result
    }

    /// The intersection of the accessible and coaccessible parts.
    pub fn trim_states(&self) -> BTreeSet<StateIndex> {
        self.accessible_part()
            .intersection(&self.coaccessible_part())
            .copied()
            .collect()
    }

    /// Restricts the automaton to its trim part, renumbering the surviving
    /// states in ascending order. Returns the empty automaton when the
    /// initial state is cut.
    pub fn trim(self) -> Automaton<W> {
        let keep = self.trim_states();
        if !keep.contains(&self.initial_state) {
            debug!("Trim removed the initial state; the result is empty");
            return Automaton::empty();
        }
        if keep.len() == self.num_of_states() {
            return self;
        }

        let mut renumber: Vec<Option<StateIndex>> = vec![None; self.num_of_states()];
        for (index, state) in keep.iter().enumerate() {
            renumber[state.value()] = Some(StateIndex::new(index));
        }

        let initial_state = renumber[self.initial_state.value()].expect("The initial state is in the trim set");
        let marked = self
            .marked
            .iter()
            .filter_map(|state| renumber[state.value()]);

        let mut result = Automaton::new(keep.len(), initial_state, marked);
        result.insert_events(self.events);
        for from in &keep {
            let new_from = renumber[from.value()].expect("Kept states are renumbered");
            for (to, events) in self.outgoing_transitions(*from) {
                if let Some(new_to) = renumber[to.value()] {
                    for event in events.iter() {
                        result.add_transition(new_from, new_to, event);
                    }
                }
            }
        }

        result
    }

    /// The boolean adjacency with the identity diagonal; row = from state.
    fn bit_graph(&self) -> BitMatrix {
        BitMatrix::with_identity(
            self.num_of_states(),
            self.rows
                .iter()
                .enumerate()
                .flat_map(|(from, row)| row.iter().map(move |(to, _)| (from, to.value()))),
        )
    }
}

impl<const W: usize> fmt::Debug for Automaton<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Automaton with {} states, initial state {}, marked {:?}, alphabet {}",
            self.num_of_states(),
            self.initial_state,
            self.marked,
            self.events
        )?;
        for from in 0..self.num_of_states() {
            for (to, events) in &self.rows[from] {
                writeln!(f, "    {from} --{events}-> {to}")?;
            }
        }
        Ok(())
    }
}
