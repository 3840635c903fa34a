#![forbid(unsafe_code)]

use rand::Rng;

use crate::Automaton;
use crate::Event;
use crate::EventSet;
use crate::StateIndex;

/// Generates a random deterministic automaton with the desired number of
/// states, alphabet size and out degree.
///
/// Roughly half of the states are marked, always including the initial state
/// so that the result is never trivially blocking. Events that would make the
/// transition relation nondeterministic are skipped, so the actual out degree
/// may be lower than requested.
pub fn random_automaton<const W: usize>(
    rng: &mut impl Rng,
    num_of_states: usize,
    num_of_events: u8,
    outdegree: usize,
) -> Automaton<W> {
    assert!(num_of_states > 0, "A random automaton needs at least one state");
    assert!(
        (num_of_events as usize) <= EventSet::<W>::CAPACITY,
        "Requested {num_of_events} events but the alphabet capacity is {}",
        EventSet::<W>::CAPACITY
    );

    let mut marked = vec![StateIndex::new(0)];
    for state in 1..num_of_states {
        if rng.random_bool(0.5) {
            marked.push(StateIndex::new(state));
        }
    }

    let mut automaton = Automaton::new(num_of_states, StateIndex::new(0), marked);
    for from in 0..num_of_states {
        let from = StateIndex::new(from);
        for _ in 0..rng.random_range(0..=outdegree) {
            let event: Event = rng.random_range(0..num_of_events);
            let to = StateIndex::new(rng.random_range(0..num_of_states));

            // Keep the transition relation deterministic.
            if !automaton.contains_transition(from, event) {
                automaton.add_transition(from, to, event);
            }
        }
    }

    automaton
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use supc_utilities::random_test;

    use super::*;

    #[test]
    fn test_random_automaton_is_deterministic() {
        random_test(100, |rng| {
            let automaton: Automaton<1> = random_automaton(rng, 10, 4, 5);

            for state in 0..automaton.num_of_states() {
                let state = StateIndex::new(state);
                let mut seen = EventSet::<1>::new();
                for (_, events) in automaton.outgoing_transitions(state) {
                    assert!(
                        (seen & events).is_empty(),
                        "State {state} enables an event towards two successors"
                    );
                    seen |= events;
                }
            }
        });
    }
}
