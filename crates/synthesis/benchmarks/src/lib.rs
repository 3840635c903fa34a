#![forbid(unsafe_code)]

//! Shared input construction for the synthesis benchmarks.

use supc_automata::Automaton;
use supc_automata::EventSet;
use supc_automata::StateIndex;

/// A two-state machine that starts with `start` and finishes with `finish`.
pub fn machine(start: u8, finish: u8) -> Automaton<1> {
    let mut automaton = Automaton::new(2, StateIndex::new(0), [StateIndex::new(0)]);
    automaton.add_transition(StateIndex::new(0), StateIndex::new(1), start);
    automaton.add_transition(StateIndex::new(1), StateIndex::new(0), finish);
    automaton
}

/// Builds an automaton over the given transitions with state 0 initial and
/// marked.
pub fn marked_loop(num_of_states: usize, transitions: &[(usize, usize, u8)]) -> Automaton<1> {
    let mut automaton = Automaton::new(num_of_states, StateIndex::new(0), [StateIndex::new(0)]);
    for (from, to, event) in transitions {
        automaton.add_transition(StateIndex::new(*from), StateIndex::new(*to), *event);
    }
    automaton
}

/// The flexible manufacturing cell: eight plants coupled by eight buffer
/// specifications over a 32-event alphabet, with the completion events
/// uncontrollable.
pub fn fms_cluster() -> (Vec<Automaton<1>>, Vec<Automaton<1>>, EventSet<1>) {
    let plants = vec![
        machine(0, 1),
        machine(3, 4),
        machine(5, 6),
        marked_loop(3, &[(0, 1, 9), (1, 0, 10), (0, 2, 11), (2, 0, 12)]),
        marked_loop(4, &[(0, 1, 27), (1, 2, 28), (1, 3, 29), (2, 0, 30), (3, 0, 31)]),
        marked_loop(
            6,
            &[
                (0, 1, 17),
                (1, 0, 18),
                (0, 2, 19),
                (2, 0, 20),
                (0, 3, 21),
                (3, 0, 22),
                (0, 4, 23),
                (4, 0, 24),
                (0, 5, 25),
                (5, 0, 26),
            ],
        ),
        marked_loop(3, &[(0, 1, 13), (1, 0, 14), (0, 2, 15), (2, 0, 16)]),
        machine(7, 8),
    ];

    let specs = vec![
        machine(1, 17),
        machine(4, 19),
        marked_loop(3, &[(0, 1, 18), (1, 0, 5), (0, 2, 6), (2, 0, 21)]),
        marked_loop(
            4,
            &[
                (0, 1, 20),
                (1, 0, 9),
                (1, 0, 11),
                (0, 2, 10),
                (2, 0, 23),
                (0, 3, 12),
                (3, 0, 25),
            ],
        ),
        machine(22, 27),
        machine(24, 28),
        marked_loop(3, &[(0, 1, 26), (1, 0, 13), (0, 2, 16), (2, 0, 29)]),
        marked_loop(3, &[(0, 1, 14), (1, 0, 7), (0, 2, 8), (2, 0, 15)]),
    ];

    let uncontrollable = [1, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24, 26, 30, 31]
        .into_iter()
        .collect();

    (plants, specs, uncontrollable)
}
