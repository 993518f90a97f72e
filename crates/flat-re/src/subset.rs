use std::collections::{HashMap, VecDeque};

use bit_set::BitSet;

use crate::fa::{Automaton, StateId};
use crate::FaError;

/// Whether subset construction keeps the empty subset as an explicit dead
/// state (`Complete`) or leaves the missing transitions undefined (`Partial`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Totality {
    #[default]
    Partial,
    Complete,
}

// subsets are keyed by their sorted member list so identical subsets always
// land on the same DFA state regardless of how they were reached
fn canonical(set: &BitSet) -> Vec<usize> {
    set.iter().collect()
}

/// Creates a DFA from an NFA using subset construction.
///
/// DFA states are numbered in discovery order of a FIFO worklist that visits
/// alphabet symbols in sorted order, so `q0` is always the closure of the NFA
/// initial state and repeated runs give identical automata.
pub fn determinize(nfa: Automaton, totality: Totality) -> Result<Automaton, FaError> {
    nfa.validate()?;

    let accepting: BitSet = nfa.accept_states.iter().map(|s| s.index()).collect();
    let symbols: Vec<String> = nfa.alphabet.iter().cloned().collect();

    let mut initial_configuration = BitSet::with_capacity(nfa.num_states());
    initial_configuration.insert(nfa.initial_state.index());
    nfa.close_over_epsilon(&mut initial_configuration);

    let mut dfa = Automaton::empty(nfa.alphabet.clone());
    dfa.initial_state = dfa.add_state();
    if !initial_configuration.is_disjoint(&accepting) {
        dfa.accept_states.insert(dfa.initial_state);
    }

    // configuration -> id
    let mut subsets: HashMap<Vec<usize>, StateId> = HashMap::new();
    subsets.insert(canonical(&initial_configuration), dfa.initial_state);

    let mut work_queue: VecDeque<(BitSet, StateId)> = VecDeque::new();
    work_queue.push_back((initial_configuration, dfa.initial_state));

    while let Some((q, from)) = work_queue.pop_front() {
        for symbol in &symbols {
            let mut t = nfa.delta(&q, symbol);
            if t.is_empty() && totality == Totality::Partial {
                continue;
            }
            nfa.close_over_epsilon(&mut t);

            let key = canonical(&t);
            let to = match subsets.get(&key) {
                Some(id) => *id,
                None => {
                    let id = dfa.add_state();
                    if !t.is_disjoint(&accepting) {
                        dfa.accept_states.insert(id);
                    }
                    log::trace!("subset {:?} becomes {}", key, id);
                    subsets.insert(key, id);
                    work_queue.push_back((t, id));
                    id
                }
            };

            dfa.push_transition(from, Some(symbol.clone()), to);
        }
    }

    log::debug!(
        "subset construction: {} nfa states -> {} dfa states",
        nfa.num_states(),
        dfa.num_states()
    );

    Ok(dfa)
}
