#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::collections::HashSet;

use itertools::Itertools;
use log::debug;
use log::trace;

use supc_automata::Automaton;
use supc_automata::Event;
use supc_automata::EventSet;
use supc_automata::StateIndex;

use crate::Composition;
use crate::NodeId;
use crate::VirtualState;

/// Computes the monolithic supervisor of the given plant with respect to the
/// given specification: the automaton realising the maximal sublanguage of
/// the specification that is controllable with respect to the plant and
/// nonblocking.
///
/// # Details
///
/// The synthesis explores the lazy synchronous product of plant and
/// specification depth first. A product state is *bad* when the plant enables
/// an uncontrollable event that the product does not; bad states are removed
/// together with their backward closure over uncontrollable events, since a
/// supervisor cannot prevent the plant from reaching them. The surviving
/// states are compacted into a concrete automaton and trimmed.
///
/// Uncontrollable events outside the plant alphabet are ignored. An empty
/// result means no supervisor exists.
pub fn supervisor_synthesis<const W: usize>(
    plant: &Automaton<W>,
    spec: &Automaton<W>,
    uncontrollable: &EventSet<W>,
) -> Automaton<W> {
    let (mut composition, plant_root) = Composition::plant_spec(&[plant], &[spec]);
    synthesize(&mut composition, plant_root, uncontrollable)
}

/// As [`supervisor_synthesis`], but first folds each input vector into a
/// balanced lazy product; the plants and the specifications are composed
/// independently.
pub fn supervisor_synthesis_many<const W: usize>(
    plants: &[Automaton<W>],
    specs: &[Automaton<W>],
    uncontrollable: &EventSet<W>,
) -> Automaton<W> {
    let plant_refs: Vec<&Automaton<W>> = plants.iter().collect();
    let spec_refs: Vec<&Automaton<W>> = specs.iter().collect();
    let (mut composition, plant_root) = Composition::plant_spec(&plant_refs, &spec_refs);
    synthesize(&mut composition, plant_root, uncontrollable)
}

fn synthesize<const W: usize>(
    composition: &mut Composition<W>,
    plant_root: NodeId,
    uncontrollable: &EventSet<W>,
) -> Automaton<W> {
    let root = composition.root();
    if composition.num_of_states(root) == 0 {
        // Some operand has no states at all.
        return Automaton::empty();
    }

    // The uncontrollable events the plant can execute at all, and the subset
    // the product can execute.
    let plant_uncontrollable = *uncontrollable & composition.events(plant_root);
    let product_uncontrollable = plant_uncontrollable & composition.events(root);
    let plant_states = composition.num_of_states(plant_root);

    // Kept states with their outgoing transitions. Entries whose key ends up
    // in `removed` are logically absent and compacted away at
    // materialisation.
    let mut kept: HashMap<u64, Vec<(u64, Event)>> = HashMap::new();
    let mut removed: HashSet<u64> = HashSet::new();

    let mut stack = vec![composition.initial_state(root).value()];

    composition.allocate_inverse_transitions();

    while let Some(state) = stack.pop() {
        if removed.contains(&state) || kept.contains_key(&state) {
            continue;
        }

        let enabled = composition.state_events(root, VirtualState::new(state));

        // The uncontrollable events the plant enables in the plant component
        // of this state.
        let plant_state = VirtualState::new(state % plant_states);
        let plant_enabled = plant_uncontrollable & composition.state_events(plant_root, plant_state);

        if plant_enabled & enabled != plant_enabled {
            // The product disables an uncontrollable event the plant enables.
            trace!("State {state} is bad: the product disables {}", plant_enabled - enabled);
            remove_bad_states(composition, root, state, &product_uncontrollable, &mut removed);
        } else {
            let mut transitions = Vec::with_capacity(enabled.count());
            for event in enabled.iter() {
                let next = composition
                    .transition(root, VirtualState::new(state), event)
                    .expect("An enabled event has a successor")
                    .value();

                if !removed.contains(&next) && !kept.contains_key(&next) {
                    stack.push(next);
                }
                transitions.push((next, event));
            }
            kept.insert(state, transitions);
        }
    }

    composition.clear_inverse_transitions();

    debug!(
        "Synthesis explored {} virtual states and removed {}",
        kept.len() + removed.len(),
        removed.len()
    );

    materialize(composition, root, &kept, &removed).trim()
}

/// Removes the given bad state together with every state that reaches it
/// through uncontrollable events only: the supervisor cannot disable any
/// event along such a path, so all of these states are bad as well.
///
/// States are only recorded in `removed`; the caller's kept table is
/// compacted against it later.
fn remove_bad_states<const W: usize>(
    composition: &Composition<W>,
    root: NodeId,
    bad: u64,
    uncontrollable: &EventSet<W>,
    removed: &mut HashSet<u64>,
) {
    let mut stack = vec![bad];
    removed.insert(bad);

    while let Some(state) = stack.pop() {
        let events = composition.inv_state_events(root, VirtualState::new(state)) & *uncontrollable;
        for event in events.iter() {
            for predecessor in composition.inv_transitions(root, VirtualState::new(state), event) {
                if removed.insert(predecessor.value()) {
                    trace!("Removing {predecessor}, an uncontrollable predecessor of bad state {state}");
                    stack.push(predecessor.value());
                }
            }
        }
    }
}

/// Compacts the kept virtual states into a concrete automaton, assigning
/// compact indices in ascending virtual-state order so that identical inputs
/// always produce identical output automata.
fn materialize<const W: usize>(
    composition: &Composition<W>,
    root: NodeId,
    kept: &HashMap<u64, Vec<(u64, Event)>>,
    removed: &HashSet<u64>,
) -> Automaton<W> {
    let survivors: Vec<u64> = kept
        .keys()
        .filter(|state| !removed.contains(state))
        .copied()
        .sorted_unstable()
        .collect();

    let index_of: HashMap<u64, StateIndex> = survivors
        .iter()
        .enumerate()
        .map(|(index, state)| (*state, StateIndex::new(index)))
        .collect();

    let initial_state = composition.initial_state(root).value();
    let Some(&initial_index) = index_of.get(&initial_state) else {
        debug!("The initial state is bad; the supervisor is empty");
        return Automaton::empty();
    };

    let marked = survivors
        .iter()
        .filter(|state| composition.is_marked(root, VirtualState::new(**state)))
        .map(|state| index_of[state]);

    let mut result = Automaton::new(survivors.len(), initial_index, marked);
    result.insert_events(composition.events(root));
    for state in &survivors {
        for (next, event) in &kept[state] {
            // Transitions into removed states are dropped with them.
            if let Some(&to) = index_of.get(next) {
                result.add_transition(index_of[state], to, *event);
            }
        }
    }

    result
}
