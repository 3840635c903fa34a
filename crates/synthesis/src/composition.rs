#![forbid(unsafe_code)]

use std::collections::HashSet;

use log::trace;

use supc_automata::Automaton;
use supc_automata::Event;
use supc_automata::EventSet;
use supc_automata::InverseTransitions;
use supc_automata::StateIndex;
use supc_utilities::TypedIndex;

/// A unique type for the nodes of a composition tree.
pub struct NodeTag;

/// A unique type for virtual product states.
pub struct VirtualTag;

/// The index of a node in a [`Composition`] arena.
pub type NodeId = TypedIndex<usize, NodeTag>;

/// A state of a virtual synchronous product. At every product node the state
/// is encoded in mixed radix as `q_right * left_states + q_left`; 64 bits
/// wide so that products of large operands cannot overflow before
/// materialisation validates the compact state count.
pub type VirtualState = TypedIndex<u64, VirtualTag>;

/// A node of the composition tree: either a concrete operand or the virtual
/// product of two child nodes.
enum Node<'a, const W: usize> {
    System {
        automaton: &'a Automaton<W>,

        /// Lazily allocated transposed adjacency for inverse queries.
        inverse: Option<InverseTransitions<W>>,
    },
    Product(Product<W>),
}

/// The fields of a product node, all derived once at construction.
struct Product<const W: usize> {
    left: NodeId,
    right: NodeId,

    /// The state count of the left operand, the radix of the state encoding.
    left_states: u64,
    num_of_states: u64,
    initial_state: VirtualState,

    events: EventSet<W>,
    only_left: EventSet<W>,
    only_right: EventSet<W>,
}

/// A lazy synchronous product of automata.
///
/// # Details
///
/// The product is a tree: leaves borrow concrete automata and inner nodes
/// describe the product of their two children. Every query is answered on the
/// fly by recursing through the tree, so the product state space is never
/// materialised. Operands synchronise on shared events and move independently
/// on events private to one side.
///
/// All nodes live in one arena and are addressed by [`NodeId`]; the borrowed
/// operands must outlive the composition.
pub struct Composition<'a, const W: usize> {
    nodes: Vec<Node<'a, W>>,
    root: NodeId,
}

impl<'a, const W: usize> Composition<'a, W> {
    /// Composes the given automata into a balanced product tree, pairing left
    /// to right on every level; an odd trailing operand is carried up
    /// unchanged. The input order is preserved in the state encoding.
    pub fn new(systems: &[&'a Automaton<W>]) -> Self {
        assert!(!systems.is_empty(), "A composition needs at least one operand");

        let mut nodes = Vec::new();
        let level = Self::push_leaves(&mut nodes, systems);
        let root = Self::fold_level(&mut nodes, level);

        Self { nodes, root }
    }

    /// Composes exactly two operands.
    pub fn pair(left: &'a Automaton<W>, right: &'a Automaton<W>) -> Self {
        Self::new(&[left, right])
    }

    /// Composes the plant vector and the specification vector independently
    /// and roots the tree at the product of the two subtree roots. Returns
    /// the composition together with the plant subtree root.
    pub fn plant_spec(plants: &[&'a Automaton<W>], specs: &[&'a Automaton<W>]) -> (Self, NodeId) {
        assert!(
            !plants.is_empty() && !specs.is_empty(),
            "Synthesis needs at least one plant and one specification"
        );

        let mut nodes = Vec::new();
        let plant_level = Self::push_leaves(&mut nodes, plants);
        let plant_root = Self::fold_level(&mut nodes, plant_level);
        let spec_level = Self::push_leaves(&mut nodes, specs);
        let spec_root = Self::fold_level(&mut nodes, spec_level);
        let root = Self::push_product(&mut nodes, plant_root, spec_root);

        (Self { nodes, root }, plant_root)
    }

    fn push_leaves(nodes: &mut Vec<Node<'a, W>>, systems: &[&'a Automaton<W>]) -> Vec<NodeId> {
        systems
            .iter()
            .map(|&automaton| {
                nodes.push(Node::System {
                    automaton,
                    inverse: None,
                });
                NodeId::new(nodes.len() - 1)
            })
            .collect()
    }

    fn fold_level(nodes: &mut Vec<Node<'a, W>>, mut level: Vec<NodeId>) -> NodeId {
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));

            let mut operands = level.chunks_exact(2);
            for pair in operands.by_ref() {
                next.push(Self::push_product(nodes, pair[0], pair[1]));
            }
            next.extend_from_slice(operands.remainder());

            level = next;
        }

        level[0]
    }

    fn push_product(nodes: &mut Vec<Node<'a, W>>, left: NodeId, right: NodeId) -> NodeId {
        let (left_states, left_initial, left_events) = Self::summary(nodes, left);
        let (right_states, right_initial, right_events) = Self::summary(nodes, right);

        let shared = left_events & right_events;
        nodes.push(Node::Product(Product {
            left,
            right,
            left_states,
            num_of_states: left_states
                .checked_mul(right_states)
                .expect("The product state space exceeds 64 bits"),
            initial_state: VirtualState::new(right_initial * left_states + left_initial),
            events: left_events | right_events,
            only_left: left_events ^ shared,
            only_right: right_events ^ shared,
        }));

        NodeId::new(nodes.len() - 1)
    }

    fn summary(nodes: &[Node<'a, W>], node: NodeId) -> (u64, u64, EventSet<W>) {
        match &nodes[node.value()] {
            Node::System { automaton, .. } => (
                automaton.num_of_states() as u64,
                automaton.initial_state().value() as u64,
                automaton.events(),
            ),
            Node::Product(product) => (product.num_of_states, product.initial_state.value(), product.events),
        }
    }

    /// The root node of the tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of (virtual) states of the given node.
    pub fn num_of_states(&self, node: NodeId) -> u64 {
        let (states, _, _) = Self::summary(&self.nodes, node);
        states
    }

    /// Returns the initial state of the given node.
    pub fn initial_state(&self, node: NodeId) -> VirtualState {
        let (_, initial, _) = Self::summary(&self.nodes, node);
        VirtualState::new(initial)
    }

    /// Returns the event alphabet of the given node.
    pub fn events(&self, node: NodeId) -> EventSet<W> {
        let (_, _, events) = Self::summary(&self.nodes, node);
        events
    }

    /// Returns the set of events enabled in the given state: events enabled
    /// in both components plus events private to one side that this side
    /// enables.
    pub fn state_events(&self, node: NodeId, state: VirtualState) -> EventSet<W> {
        self.state_events_impl(node, state.value())
    }

    fn state_events_impl(&self, node: NodeId, state: u64) -> EventSet<W> {
        match &self.nodes[node.value()] {
            Node::System { automaton, .. } => automaton.state_events(leaf_state(automaton, state)),
            Node::Product(product) => {
                let (left_state, right_state) = product.decode(state);
                let left = self.state_events_impl(product.left, left_state);
                let right = self.state_events_impl(product.right, right_state);
                (left & right) | (left & product.only_left) | (right & product.only_right)
            }
        }
    }

    /// Returns the set of events on transitions into the given state.
    pub fn inv_state_events(&self, node: NodeId, state: VirtualState) -> EventSet<W> {
        self.inv_state_events_impl(node, state.value())
    }

    fn inv_state_events_impl(&self, node: NodeId, state: u64) -> EventSet<W> {
        match &self.nodes[node.value()] {
            Node::System { automaton, .. } => automaton.inv_state_events(leaf_state(automaton, state)),
            Node::Product(product) => {
                let (left_state, right_state) = product.decode(state);
                let left = self.inv_state_events_impl(product.left, left_state);
                let right = self.inv_state_events_impl(product.right, right_state);
                (left & right) | (left & product.only_left) | (right & product.only_right)
            }
        }
    }

    /// Returns true iff `event` is enabled in `state`.
    pub fn contains_transition(&self, node: NodeId, state: VirtualState, event: Event) -> bool {
        self.contains_transition_impl(node, state.value(), event)
    }

    fn contains_transition_impl(&self, node: NodeId, state: u64, event: Event) -> bool {
        match &self.nodes[node.value()] {
            Node::System { automaton, .. } => automaton.contains_transition(leaf_state(automaton, state), event),
            Node::Product(product) => {
                if !product.events.contains(event) {
                    return false;
                }

                let (left_state, right_state) = product.decode(state);
                let in_left = self.contains_transition_impl(product.left, left_state, event);
                let in_right = self.contains_transition_impl(product.right, right_state, event);

                (in_left && in_right)
                    || (in_left && product.only_left.contains(event))
                    || (in_right && product.only_right.contains(event))
            }
        }
    }

    /// Returns the successor of `state` under `event`, or `None` when the
    /// event is not enabled.
    pub fn transition(&self, node: NodeId, state: VirtualState, event: Event) -> Option<VirtualState> {
        self.transition_impl(node, state.value(), event).map(VirtualState::new)
    }

    fn transition_impl(&self, node: NodeId, state: u64, event: Event) -> Option<u64> {
        match &self.nodes[node.value()] {
            Node::System { automaton, .. } => automaton
                .transition(leaf_state(automaton, state), event)
                .map(|to| to.value() as u64),
            Node::Product(product) => {
                if !product.events.contains(event) {
                    return None;
                }

                let (left_state, right_state) = product.decode(state);
                let in_left = self.contains_transition_impl(product.left, left_state, event);
                let in_right = self.contains_transition_impl(product.right, right_state, event);

                if in_left && in_right {
                    // A shared event moves both components.
                    let next_left = self.transition_impl(product.left, left_state, event)?;
                    let next_right = self.transition_impl(product.right, right_state, event)?;
                    Some(product.encode(next_left, next_right))
                } else if in_left && product.only_left.contains(event) {
                    let next_left = self.transition_impl(product.left, left_state, event)?;
                    Some(product.encode(next_left, right_state))
                } else if in_right && product.only_right.contains(event) {
                    let next_right = self.transition_impl(product.right, right_state, event)?;
                    Some(product.encode(left_state, next_right))
                } else {
                    None
                }
            }
        }
    }

    /// Returns true iff some transition labelled `event` enters `state`.
    pub fn contains_inv_transition(&self, node: NodeId, state: VirtualState, event: Event) -> bool {
        self.contains_inv_transition_impl(node, state.value(), event)
    }

    fn contains_inv_transition_impl(&self, node: NodeId, state: u64, event: Event) -> bool {
        match &self.nodes[node.value()] {
            Node::System { automaton, .. } => automaton.contains_inv_transition(leaf_state(automaton, state), event),
            Node::Product(product) => {
                if !product.events.contains(event) {
                    return false;
                }

                let (left_state, right_state) = product.decode(state);
                let in_left = self.contains_inv_transition_impl(product.left, left_state, event);
                let in_right = self.contains_inv_transition_impl(product.right, right_state, event);

                (in_left && in_right)
                    || (in_left && product.only_left.contains(event))
                    || (in_right && product.only_right.contains(event))
            }
        }
    }

    /// Returns all predecessors of `state` under `event`. On a shared event
    /// the predecessors are the Cartesian product of the component
    /// predecessors. Requires [`Composition::allocate_inverse_transitions`].
    pub fn inv_transitions(&self, node: NodeId, state: VirtualState, event: Event) -> Vec<VirtualState> {
        self.inv_transitions_impl(node, state.value(), event)
            .into_iter()
            .map(VirtualState::new)
            .collect()
    }

    fn inv_transitions_impl(&self, node: NodeId, state: u64, event: Event) -> Vec<u64> {
        match &self.nodes[node.value()] {
            Node::System { automaton, inverse } => inverse
                .as_ref()
                .expect("Inverse transitions must be allocated before inverse queries")
                .predecessors(leaf_state(automaton, state), event)
                .map(|from| from.value() as u64)
                .collect(),
            Node::Product(product) => {
                if !product.events.contains(event) {
                    return Vec::new();
                }

                let (left_state, right_state) = product.decode(state);
                let in_left = self.contains_inv_transition_impl(product.left, left_state, event);
                let in_right = self.contains_inv_transition_impl(product.right, right_state, event);

                if in_left && in_right {
                    let left_predecessors = self.inv_transitions_impl(product.left, left_state, event);
                    let right_predecessors = self.inv_transitions_impl(product.right, right_state, event);

                    let mut result = Vec::with_capacity(left_predecessors.len() * right_predecessors.len());
                    for right_predecessor in &right_predecessors {
                        for left_predecessor in &left_predecessors {
                            result.push(product.encode(*left_predecessor, *right_predecessor));
                        }
                    }
                    result
                } else if in_left && product.only_left.contains(event) {
                    self.inv_transitions_impl(product.left, left_state, event)
                        .into_iter()
                        .map(|predecessor| product.encode(predecessor, right_state))
                        .collect()
                } else if in_right && product.only_right.contains(event) {
                    self.inv_transitions_impl(product.right, right_state, event)
                        .into_iter()
                        .map(|predecessor| product.encode(left_state, predecessor))
                        .collect()
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Returns true iff every component of the given state is marked.
    pub fn is_marked(&self, node: NodeId, state: VirtualState) -> bool {
        self.is_marked_impl(node, state.value())
    }

    fn is_marked_impl(&self, node: NodeId, state: u64) -> bool {
        match &self.nodes[node.value()] {
            Node::System { automaton, .. } => automaton.is_marked(leaf_state(automaton, state)),
            Node::Product(product) => {
                let (left_state, right_state) = product.decode(state);
                self.is_marked_impl(product.left, left_state) && self.is_marked_impl(product.right, right_state)
            }
        }
    }

    /// Builds the transposed adjacency of every concrete operand, enabling
    /// [`Composition::inv_transitions`]. Paired with
    /// [`Composition::clear_inverse_transitions`].
    pub fn allocate_inverse_transitions(&mut self) {
        for node in &mut self.nodes {
            if let Node::System { automaton, inverse } = node {
                *inverse = Some(InverseTransitions::new(automaton));
            }
        }
    }

    /// Releases the inverse transition storage of every concrete operand.
    pub fn clear_inverse_transitions(&mut self) {
        for node in &mut self.nodes {
            if let Node::System { inverse, .. } = node {
                *inverse = None;
            }
        }
    }

    /// Enumerates the virtual states of the given node that are reachable
    /// from its initial state, in depth-first discovery order.
    pub fn reachable_states(&self, node: NodeId) -> Vec<VirtualState> {
        let initial_state = self.initial_state(node);
        let mut discovered = HashSet::from([initial_state.value()]);
        let mut stack = vec![initial_state];
        let mut result = Vec::new();

        while let Some(state) = stack.pop() {
            trace!("Visiting virtual state {state}");
            result.push(state);

            for event in self.state_events(node, state).iter() {
                let next = self
                    .transition(node, state, event)
                    .expect("An enabled event has a successor");
                if discovered.insert(next.value()) {
                    stack.push(next);
                }
            }
        }

        result
    }
}

impl<const W: usize> Product<W> {
    fn decode(&self, state: u64) -> (u64, u64) {
        (state % self.left_states, state / self.left_states)
    }

    fn encode(&self, left_state: u64, right_state: u64) -> u64 {
        right_state * self.left_states + left_state
    }
}

/// Converts a virtual state addressing a concrete operand back to a state
/// index of that operand.
fn leaf_state<const W: usize>(automaton: &Automaton<W>, state: u64) -> StateIndex {
    debug_assert!(
        state < automaton.num_of_states() as u64,
        "State {state} out of bounds {}",
        automaton.num_of_states()
    );
    StateIndex::new(state as usize)
}

/// Computes the full synchronous product of two automata.
///
/// Every state of the product is materialised, including the unreachable
/// ones, so the state encoding of the result coincides with the virtual state
/// encoding of [`Composition::pair`]; the result is not trimmed. Marked
/// states are the pairs of marked component states.
pub fn synchronize<const W: usize>(left: &Automaton<W>, right: &Automaton<W>) -> Automaton<W> {
    let composition = Composition::pair(left, right);
    let root = composition.root();

    let num_of_states = usize::try_from(composition.num_of_states(root))
        .expect("The product state space exceeds the platform word size");
    if num_of_states == 0 {
        return Automaton::empty();
    }

    let initial_state = StateIndex::new(composition.initial_state(root).value() as usize);
    let marked = (0..num_of_states)
        .filter(|state| composition.is_marked(root, VirtualState::new(*state as u64)))
        .map(StateIndex::new);

    let mut result = Automaton::new(num_of_states, initial_state, marked);
    result.insert_events(composition.events(root));
    for state in 0..num_of_states {
        let virtual_state = VirtualState::new(state as u64);
        for event in composition.state_events(root, virtual_state).iter() {
            let next = composition
                .transition(root, virtual_state, event)
                .expect("An enabled event has a successor");
            result.add_transition(StateIndex::new(state), StateIndex::new(next.value() as usize), event);
        }
    }

    result
}
