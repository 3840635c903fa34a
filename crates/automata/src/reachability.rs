#![forbid(unsafe_code)]

use bitvec::bitvec;
use bitvec::vec::BitVec;

use crate::StateIndex;
use crate::bit_matrix::BitMatrix;

/// Runs the saturating breadth-first search `X ← M · X` from the given source
/// states until the reached sets are stable, then reports every
/// `(source, reached)` pair to the visitor.
///
/// # Details
///
/// Every source occupies its own frontier column, so a single call can answer
/// independent reachability questions for all sources at once. Since the
/// matrix carries an identity diagonal the total population count over all
/// columns grows monotonically, and the iteration stops as soon as it is
/// unchanged between two rounds; the iteration count is bounded by the size
/// of the matrix either way.
pub(crate) fn sparse_bfs<F>(matrix: &BitMatrix, sources: &[StateIndex], mut visit: F)
where
    F: FnMut(StateIndex, StateIndex),
{
    let size = matrix.size();

    let mut columns: Vec<BitVec> = sources
        .iter()
        .map(|source| {
            let mut column = bitvec![0; size];
            column.set(source.value(), true);
            column
        })
        .collect();

    let mut reached = sources.len();
    let mut next = BitVec::new();
    for _ in 0..size {
        let mut count = 0;
        for column in &mut columns {
            matrix.multiply(column, &mut next);
            std::mem::swap(column, &mut next);
            count += column.count_ones();
        }

        if count == reached {
            // Fixed point: no column gained a state in this round.
            break;
        }
        reached = count;
    }

    for (source, column) in sources.iter().zip(&columns) {
        for state in column.iter_ones() {
            visit(*source, StateIndex::new(state));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use test_log::test;

    use supc_utilities::random_test;

    use crate::Automaton;
    use crate::StateIndex;
    use crate::random_automaton;

    /// Reachability along outgoing transitions by a plain depth-first search,
    /// the reference for the kernel.
    fn naive_reachable(automaton: &Automaton<1>, source: StateIndex) -> BTreeSet<StateIndex> {
        let mut reached = BTreeSet::from([source]);
        let mut stack = vec![source];

        while let Some(state) = stack.pop() {
            for (to, _) in automaton.outgoing_transitions(state) {
                if reached.insert(to) {
                    stack.push(to);
                }
            }
        }

        reached
    }

    #[test]
    fn test_random_accessible_part_matches_naive_search() {
        random_test(100, |rng| {
            let automaton: Automaton<1> = random_automaton(rng, 10, 4, 3);

            assert_eq!(
                automaton.accessible_part(),
                naive_reachable(&automaton, automaton.initial_state()),
                "The BFS kernel must agree with a naive search"
            );
        });
    }

    #[test]
    fn test_random_coaccessible_part_matches_naive_search() {
        random_test(100, |rng| {
            let automaton: Automaton<1> = random_automaton(rng, 10, 4, 3);

            // A state is coaccessible iff some marked state occurs in its
            // forward reachable set.
            let mut expected = BTreeSet::new();
            for state in 0..automaton.num_of_states() {
                let state = StateIndex::new(state);
                if naive_reachable(&automaton, state)
                    .iter()
                    .any(|reached| automaton.is_marked(*reached))
                {
                    expected.insert(state);
                }
            }

            assert_eq!(automaton.coaccessible_part(), expected);
        });
    }
}
