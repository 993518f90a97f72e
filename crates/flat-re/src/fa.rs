use std::collections::{BTreeSet, VecDeque};

use bit_set::BitSet;
use bitflags::bitflags;
use flat_util::{make_type_idx, EPSILON};
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

use crate::FaError;

/// Transition label; `None` is an epsilon move.
pub type Label = Option<String>;

// states live in an arena and are addressed by index, never removed in place
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FANode {
    pub(crate) transitions: Vec<(Label, StateId)>,
}

make_type_idx!(StateId, FANode);

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct FaProperties: u8 {
        const DETERMINISTIC = 1;
        const COMPLETE = 1 << 1;
        const HAS_EPSILON = 1 << 2;
        const EMPTY_LANGUAGE = 1 << 3;
    }
}

/// A finite automaton. NFAs and DFAs share this representation; a DFA is
/// simply an automaton for which [`Automaton::is_deterministic`] holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Automaton {
    pub(crate) nodes: Vec<FANode>,
    pub(crate) alphabet: BTreeSet<String>,
    pub(crate) initial_state: StateId,
    pub(crate) accept_states: BTreeSet<StateId>,
}

impl Default for Automaton {
    fn default() -> Automaton {
        Automaton::new()
    }
}

impl Automaton {
    /// An automaton with a single, non-accepting initial state.
    pub fn new() -> Automaton {
        let mut fa = Automaton::empty(BTreeSet::new());
        fa.initial_state = fa.add_state();
        fa
    }

    pub fn with_alphabet<I, S>(symbols: I) -> Automaton
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fa = Automaton::new();
        fa.alphabet = symbols.into_iter().map(Into::into).collect();
        fa
    }

    // no states at all; the caller must add one and point initial_state at it
    pub(crate) fn empty(alphabet: BTreeSet<String>) -> Automaton {
        Automaton {
            nodes: Vec::new(),
            alphabet,
            initial_state: StateId(0),
            accept_states: BTreeSet::new(),
        }
    }

    pub fn add_state(&mut self) -> StateId {
        StateId::from_push(&mut self.nodes, FANode::default())
    }

    pub fn add_symbol(&mut self, symbol: impl Into<String>) -> Result<(), FaError> {
        let symbol = symbol.into();
        if symbol == EPSILON {
            return Err(FaError::MalformedInput(
                "epsilon cannot be part of the alphabet".to_string(),
            ));
        }
        self.alphabet.insert(symbol);
        Ok(())
    }

    pub fn add_transition(
        &mut self,
        from: StateId,
        label: Option<&str>,
        to: StateId,
    ) -> Result<(), FaError> {
        self.check_state(from)?;
        self.check_state(to)?;
        if let Some(symbol) = label {
            if !self.alphabet.contains(symbol) {
                return Err(FaError::MalformedInput(format!(
                    "transition {} -{}-> {} uses a symbol outside the alphabet",
                    from, symbol, to
                )));
            }
        }
        self.push_transition(from, label.map(str::to_string), to);
        Ok(())
    }

    // unchecked; duplicate edges are collapsed
    pub(crate) fn push_transition(&mut self, from: StateId, label: Label, to: StateId) {
        let edge = (label, to);
        let transitions = &mut self.nodes[from].transitions;
        if !transitions.contains(&edge) {
            transitions.push(edge);
        }
    }

    pub fn set_initial(&mut self, state: StateId) -> Result<(), FaError> {
        self.check_state(state)?;
        self.initial_state = state;
        Ok(())
    }

    pub fn set_final(&mut self, state: StateId, accepting: bool) -> Result<(), FaError> {
        self.check_state(state)?;
        if accepting {
            self.accept_states.insert(state);
        } else {
            self.accept_states.remove(&state);
        }
        Ok(())
    }

    fn check_state(&self, state: StateId) -> Result<(), FaError> {
        if state.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(FaError::MalformedInput(format!("undeclared state {}", state)))
        }
    }

    pub fn num_states(&self) -> usize {
        self.nodes.len()
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> {
        (0..self.nodes.len()).map(StateId::from_index)
    }

    pub fn initial_state(&self) -> StateId {
        self.initial_state
    }

    pub fn final_states(&self) -> &BTreeSet<StateId> {
        &self.accept_states
    }

    pub fn is_final(&self, state: StateId) -> bool {
        self.accept_states.contains(&state)
    }

    pub fn alphabet(&self) -> &BTreeSet<String> {
        &self.alphabet
    }

    pub fn transitions(&self, state: StateId) -> &[(Label, StateId)] {
        &self.nodes[state].transitions
    }

    pub fn num_transitions(&self) -> usize {
        self.nodes.iter().map(|node| node.transitions.len()).sum()
    }

    /// First destination of `state` on `symbol`; the only one for a DFA.
    pub fn successor(&self, state: StateId, symbol: &str) -> Option<StateId> {
        self.nodes[state]
            .transitions
            .iter()
            .find(|(label, _)| label.as_deref() == Some(symbol))
            .map(|(_, next)| *next)
    }

    /// Checks the structural invariants: every referenced state exists,
    /// labels come from the alphabet and epsilon is not an alphabet symbol.
    pub fn validate(&self) -> Result<(), FaError> {
        if self.nodes.is_empty() {
            return Err(FaError::MalformedInput("automaton has no states".to_string()));
        }
        self.check_state(self.initial_state)?;
        for state in &self.accept_states {
            self.check_state(*state)?;
        }
        if self.alphabet.contains(EPSILON) {
            return Err(FaError::MalformedInput(
                "epsilon cannot be part of the alphabet".to_string(),
            ));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            for (label, next) in &node.transitions {
                self.check_state(*next)?;
                if let Some(symbol) = label {
                    if !self.alphabet.contains(symbol) {
                        return Err(FaError::MalformedInput(format!(
                            "transition from q{} uses '{}' which is not in the alphabet",
                            i, symbol
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    // basic BFS to compute epsilon closure
    pub(crate) fn close_over_epsilon(&self, set: &mut BitSet) {
        let mut queue: VecDeque<usize> = set.iter().collect();

        while let Some(i) = queue.pop_front() {
            for (label, next) in &self.nodes[i].transitions {
                if label.is_none() && set.insert(next.index()) {
                    queue.push_back(next.index());
                }
            }
        }
    }

    pub(crate) fn delta(&self, set: &BitSet, symbol: &str) -> BitSet {
        let mut result = BitSet::with_capacity(self.nodes.len());

        for i in set.iter() {
            for (label, next) in &self.nodes[i].transitions {
                if label.as_deref() == Some(symbol) {
                    result.insert(next.index());
                }
            }
        }

        result
    }

    /// Epsilon closure of a set of states, sorted by identifier.
    pub fn epsilon_closure(&self, states: &[StateId]) -> Vec<StateId> {
        let mut set = BitSet::with_capacity(self.nodes.len());
        for state in states {
            set.insert(state.index());
        }
        self.close_over_epsilon(&mut set);
        set.iter().map(StateId::from_index).collect()
    }

    /// States reachable from the initial state, in breadth-first order.
    pub fn reachable_states(&self) -> Vec<StateId> {
        let mut visited = BitSet::with_capacity(self.nodes.len());
        let mut order = Vec::new();
        let mut queue = VecDeque::from([self.initial_state]);
        visited.insert(self.initial_state.index());

        while let Some(state) = queue.pop_front() {
            order.push(state);
            for (_, next) in &self.nodes[state].transitions {
                if visited.insert(next.index()) {
                    queue.push_back(*next);
                }
            }
        }

        order
    }

    pub fn is_deterministic(&self) -> bool {
        self.nodes.iter().all(|node| {
            let mut seen: BTreeSet<&str> = BTreeSet::new();
            node.transitions.iter().all(|(label, _)| match label {
                Some(symbol) => seen.insert(symbol.as_str()),
                None => false,
            })
        })
    }

    pub fn is_complete(&self) -> bool {
        self.is_deterministic()
            && self
                .nodes
                .iter()
                .all(|node| node.transitions.len() == self.alphabet.len())
    }

    pub fn properties(&self) -> FaProperties {
        let mut properties = FaProperties::empty();
        if self.is_deterministic() {
            properties |= FaProperties::DETERMINISTIC;
        }
        if self.is_complete() {
            properties |= FaProperties::COMPLETE;
        }
        if self
            .nodes
            .iter()
            .any(|node| node.transitions.iter().any(|(label, _)| label.is_none()))
        {
            properties |= FaProperties::HAS_EPSILON;
        }
        if !self.reachable_states().iter().any(|s| self.is_final(*s)) {
            properties |= FaProperties::EMPTY_LANGUAGE;
        }
        properties
    }

    /// Each `char` of `input` is read as one terminal.
    pub fn accepts(&self, input: &str) -> bool {
        let symbols: Vec<String> = input.chars().map(String::from).collect();
        self.accepts_symbols(&symbols)
    }

    /// Structurally invalid automata (see [`Automaton::validate`]) accept
    /// nothing.
    pub fn accepts_symbols<S: AsRef<str>>(&self, input: &[S]) -> bool {
        if self.validate().is_err() {
            return false;
        }
        if input.iter().any(|symbol| !self.alphabet.contains(symbol.as_ref())) {
            return false;
        }

        if self.is_deterministic() {
            let mut state = self.initial_state;
            for symbol in input {
                match self.successor(state, symbol.as_ref()) {
                    Some(next) => state = next,
                    None => return false,
                }
            }
            return self.is_final(state);
        }

        // on-the-fly subset simulation, agrees with the determinized automaton
        let mut current = BitSet::with_capacity(self.nodes.len());
        current.insert(self.initial_state.index());
        self.close_over_epsilon(&mut current);
        for symbol in input {
            current = self.delta(&current, symbol.as_ref());
            self.close_over_epsilon(&mut current);
            if current.is_empty() {
                return false;
            }
        }

        current.iter().any(|i| self.is_final(StateId::from_index(i)))
    }

    /// Adds a non-accepting dead state receiving every missing transition.
    /// Returns the automaton unchanged if nothing is missing.
    pub fn completed(mut self) -> Automaton {
        let symbols: Vec<String> = self.alphabet.iter().cloned().collect();
        let missing = |node: &FANode, symbol: &String| {
            !node
                .transitions
                .iter()
                .any(|(label, _)| label.as_ref() == Some(symbol))
        };

        let needs_dead = self
            .nodes
            .iter()
            .any(|node| symbols.iter().any(|symbol| missing(node, symbol)));
        if !needs_dead {
            return self;
        }

        let dead = self.add_state();
        for i in 0..self.nodes.len() {
            for symbol in &symbols {
                if missing(&self.nodes[i], symbol) {
                    self.nodes[i].transitions.push((Some(symbol.clone()), dead));
                }
            }
        }
        self
    }

    /// Complement with respect to the automaton's own alphabet.
    pub fn complement(self) -> Result<Automaton, FaError> {
        self.validate()?;
        if !self.is_deterministic() {
            return Err(FaError::NotDeterministic);
        }

        let mut fa = self.completed();
        fa.accept_states = fa.states().filter(|s| !fa.is_final(*s)).collect();
        Ok(fa)
    }

    /// Adds symbols to the alphabet without adding transitions for them.
    pub fn extend_alphabet<I, S>(mut self, symbols: I) -> Result<Automaton, FaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for symbol in symbols {
            self.add_symbol(symbol)?;
        }
        Ok(self)
    }

    /// Drops states unreachable from the initial state, keeping the relative
    /// order of the survivors.
    pub fn remove_unreachable(self) -> Automaton {
        let mut reachable = self.reachable_states();
        reachable.sort();
        if reachable.len() == self.nodes.len() {
            return self;
        }

        let mut renamed: Vec<Option<StateId>> = vec![None; self.nodes.len()];
        for (new, old) in reachable.iter().enumerate() {
            renamed[old.index()] = Some(StateId::from_index(new));
        }

        let mut fa = Automaton::empty(self.alphabet.clone());
        for old in &reachable {
            let transitions = self.nodes[*old]
                .transitions
                .iter()
                .filter_map(|(label, next)| renamed[next.index()].map(|n| (label.clone(), n)))
                .collect();
            fa.nodes.push(FANode { transitions });
        }
        fa.initial_state = renamed[self.initial_state.index()].unwrap_or(StateId(0));
        fa.accept_states = self
            .accept_states
            .iter()
            .filter_map(|s| renamed[s.index()])
            .collect();

        log::trace!(
            "removed {} unreachable states",
            self.nodes.len() - fa.nodes.len()
        );
        fa
    }

    /// Graph view for renderers; node indices coincide with state indices.
    pub fn to_graph(&self) -> DiGraph<StateId, String> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.num_transitions());
        let indices: Vec<_> = self.states().map(|s| graph.add_node(s)).collect();

        for (i, node) in self.nodes.iter().enumerate() {
            for (label, next) in &node.transitions {
                let weight = label.clone().unwrap_or_else(|| EPSILON.to_string());
                graph.add_edge(indices[i], indices[next.index()], weight);
            }
        }

        graph
    }
}
