use std::collections::BTreeMap;

use crate::fa::Automaton;
use crate::regex::Regex;
use crate::FaError;

// parallel edges are merged into a union
fn add_edge(edges: &mut BTreeMap<(usize, usize), Regex>, from: usize, to: usize, re: Regex) {
    let merged = match edges.remove(&(from, to)) {
        Some(existing) => Regex::union(existing, re),
        None => re,
    };
    edges.insert((from, to), merged);
}

/// Converts an automaton to an equivalent regular expression by state
/// elimination.
///
/// A fresh source (with an epsilon edge to the initial state) and a fresh
/// sink (with epsilon edges from every final state) are added, then the
/// original states are eliminated in increasing identifier order.
pub fn to_regex(fa: Automaton) -> Result<Regex, FaError> {
    fa.validate()?;
    let fa = fa.remove_unreachable();

    let n = fa.num_states();
    let source = n;
    let sink = n + 1;

    let mut edges: BTreeMap<(usize, usize), Regex> = BTreeMap::new();

    add_edge(&mut edges, source, fa.initial_state().index(), Regex::EmptyString);
    for state in fa.states() {
        if fa.is_final(state) {
            add_edge(&mut edges, state.index(), sink, Regex::EmptyString);
        }
        for (label, next) in fa.transitions(state) {
            let re = match label {
                Some(symbol) => Regex::literal(symbol.clone()),
                None => Regex::EmptyString,
            };
            add_edge(&mut edges, state.index(), next.index(), re);
        }
    }

    for k in 0..n {
        let self_loop = edges.remove(&(k, k)).map(Regex::star).unwrap_or(Regex::EmptyString);
        let incoming: Vec<(usize, Regex)> = edges
            .iter()
            .filter(|((_, to), _)| *to == k)
            .map(|((from, _), re)| (*from, re.clone()))
            .collect();
        let outgoing: Vec<(usize, Regex)> = edges
            .iter()
            .filter(|((from, _), _)| *from == k)
            .map(|((_, to), re)| (*to, re.clone()))
            .collect();
        edges.retain(|(from, to), _| *from != k && *to != k);

        for (from, into_k) in &incoming {
            for (to, out_of_k) in &outgoing {
                let path = Regex::concat(
                    Regex::concat(into_k.clone(), self_loop.clone()),
                    out_of_k.clone(),
                );
                add_edge(&mut edges, *from, *to, path);
            }
        }
        log::trace!("eliminated q{}, {} edges remain", k, edges.len());
    }

    Ok(edges.remove(&(source, sink)).unwrap_or(Regex::Empty))
}
