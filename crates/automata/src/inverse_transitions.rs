#![forbid(unsafe_code)]

use crate::Automaton;
use crate::Event;
use crate::EventSet;
use crate::StateIndex;

/// The transposed transition relation of an automaton: for every state the
/// incoming transitions as `(from, events)` pairs.
///
/// Built on demand for the backward pruning of the supervisor synthesis and
/// released afterwards, since predecessor lists are only needed there. The
/// cheap per-state summary [`Automaton::inv_state_events`] is always
/// available without this structure.
pub struct InverseTransitions<const W: usize> {
    rows: Vec<Vec<(StateIndex, EventSet<W>)>>,
}

impl<const W: usize> InverseTransitions<W> {
    /// Transposes the adjacency of the given automaton.
    pub fn new(automaton: &Automaton<W>) -> Self {
        let mut rows = vec![Vec::new(); automaton.num_of_states()];
        for from in 0..automaton.num_of_states() {
            let from = StateIndex::new(from);
            for (to, events) in automaton.outgoing_transitions(from) {
                rows[to.value()].push((from, events));
            }
        }

        Self { rows }
    }

    /// All states with a transition into `state` labelled `event`.
    pub fn predecessors(&self, state: StateIndex, event: Event) -> impl Iterator<Item = StateIndex> + '_ {
        self.rows[state.value()]
            .iter()
            .filter(move |(_, events)| events.contains(event))
            .map(|(from, _)| *from)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use supc_utilities::random_test;

    use super::*;
    use crate::random_automaton;

    #[test]
    fn test_random_inverse_transitions() {
        random_test(100, |rng| {
            let automaton: Automaton<1> = random_automaton(rng, 10, 4, 3);
            let inverse = InverseTransitions::new(&automaton);

            // Every outgoing transition appears as an incoming transition.
            for state in 0..automaton.num_of_states() {
                let state = StateIndex::new(state);
                for (to, events) in automaton.outgoing_transitions(state) {
                    for event in events.iter() {
                        assert!(
                            inverse.predecessors(to, event).any(|from| from == state),
                            "Transition {state} --{event}-> {to} is missing from the inverse"
                        );
                    }
                }
            }

            // Every incoming transition belongs to some outgoing transition.
            for state in 0..automaton.num_of_states() {
                let state = StateIndex::new(state);
                for event in automaton.inv_state_events(state).iter() {
                    for from in inverse.predecessors(state, event) {
                        assert_eq!(
                            automaton.transition(from, event),
                            Some(state),
                            "Inverse transition {from} --{event}-> {state} has no forward counterpart"
                        );
                    }
                }
            }
        });
    }
}
