use std::collections::{HashMap, VecDeque};

use crate::fa::{Automaton, FANode, StateId};
use crate::FaError;

/// Minimizes a DFA by partition refinement.
///
/// The input is trimmed of unreachable states and completed with a dead
/// state if needed. The result is numbered canonically: states are assigned
/// identifiers in the breadth-first order in which they are first reached
/// from the initial state, following alphabet symbols in sorted order, and
/// each state's transitions are stored in sorted symbol order. Minimizing two
/// DFAs over the same alphabet that accept the same language therefore yields
/// `==` automata.
pub fn minimize(dfa: Automaton) -> Result<Automaton, FaError> {
    dfa.validate()?;
    if !dfa.is_deterministic() {
        return Err(FaError::NotDeterministic);
    }

    let dfa = dfa.remove_unreachable().completed();
    let symbols: Vec<String> = dfa.alphabet.iter().cloned().collect();
    let n = dfa.num_states();

    // successor table, one row per state, one column per symbol
    let table = dfa
        .states()
        .map(|state| {
            symbols
                .iter()
                .map(|symbol| {
                    dfa.successor(state, symbol).map(StateId::index).ok_or_else(|| {
                        FaError::MalformedInput(format!("{} has no move on '{}'", state, symbol))
                    })
                })
                .collect::<Result<Vec<usize>, FaError>>()
        })
        .collect::<Result<Vec<Vec<usize>>, FaError>>()?;

    let (partition, blocks) = refine(&dfa, &table);
    log::debug!("minimization: {} states -> {} blocks", n, blocks);

    Ok(rebuild(&dfa, &symbols, &table, &partition, blocks))
}

// Moore refinement: a state's signature is its block plus the blocks of its
// successors. Refinement only ever splits, so an unchanged block count is the
// fixpoint.
fn refine(dfa: &Automaton, table: &[Vec<usize>]) -> (Vec<usize>, usize) {
    let n = table.len();
    let mut partition: Vec<usize> = Vec::with_capacity(n);
    let mut initial_blocks: HashMap<bool, usize> = HashMap::new();
    for state in dfa.states() {
        let next = initial_blocks.len();
        partition.push(*initial_blocks.entry(dfa.is_final(state)).or_insert(next));
    }
    let mut count = initial_blocks.len();

    let mut rounds = 0;
    loop {
        rounds += 1;
        let mut signatures: HashMap<(usize, Vec<usize>), usize> = HashMap::new();
        let mut next_partition: Vec<usize> = Vec::with_capacity(n);

        for (state, row) in table.iter().enumerate() {
            let signature = (
                partition[state],
                row.iter().map(|next| partition[*next]).collect::<Vec<_>>(),
            );
            let fresh = signatures.len();
            next_partition.push(*signatures.entry(signature).or_insert(fresh));
        }

        partition = next_partition;
        if signatures.len() == count {
            break;
        }
        count = signatures.len();
    }

    log::trace!("partition refinement converged after {} rounds", rounds);
    (partition, count)
}

fn rebuild(
    dfa: &Automaton,
    symbols: &[String],
    table: &[Vec<usize>],
    partition: &[usize],
    blocks: usize,
) -> Automaton {
    // any member represents its block; members agree on everything that matters
    let mut representative: Vec<Option<usize>> = vec![None; blocks];
    for (state, block) in partition.iter().enumerate() {
        representative[*block].get_or_insert(state);
    }

    let mut renumbered: Vec<Option<StateId>> = vec![None; blocks];
    let mut order: Vec<usize> = Vec::with_capacity(blocks);
    let mut queue: VecDeque<usize> = VecDeque::new();

    let initial_block = partition[dfa.initial_state.index()];
    renumbered[initial_block] = Some(StateId::from_index(0));
    order.push(initial_block);
    queue.push_back(initial_block);

    while let Some(block) = queue.pop_front() {
        let Some(rep) = representative[block] else {
            continue;
        };
        for next in &table[rep] {
            let target = partition[*next];
            if renumbered[target].is_none() {
                renumbered[target] = Some(StateId::from_index(order.len()));
                order.push(target);
                queue.push_back(target);
            }
        }
    }

    let mut minimal = Automaton::empty(dfa.alphabet.clone());
    for block in &order {
        let Some(rep) = representative[*block] else {
            continue;
        };
        let transitions = symbols
            .iter()
            .zip(&table[rep])
            .filter_map(|(symbol, next)| {
                renumbered[partition[*next]].map(|to| (Some(symbol.clone()), to))
            })
            .collect();
        let id = StateId::from_push(&mut minimal.nodes, FANode { transitions });
        if dfa.is_final(StateId::from_index(rep)) {
            minimal.accept_states.insert(id);
        }
    }
    minimal.initial_state = StateId::from_index(0);

    minimal
}
