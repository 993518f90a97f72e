use std::collections::HashMap;

use flat_re::{Automaton, StateId};
use flat_util::Symbol;

use crate::grammar::{Grammar, GrammarType, Production};
use crate::{Error, GrammarError};

/// Builds an NFA for a right-linear (type 3) grammar.
///
/// Every nonterminal becomes a state, the start being the initial one, and a
/// single extra final state ends the words: `A -> a B` is an edge `A -a-> B`,
/// `A -> a` an edge into the final state, and `A -> ε` makes `A` accepting.
pub fn regular_grammar_to_nfa(grammar: &Grammar) -> Result<Automaton, Error> {
    grammar.validate()?;
    let kind = grammar.classify();
    if kind != GrammarType::Regular {
        return Err(GrammarError::Unconvertible(format!(
            "only right-linear grammars have an NFA, found {}",
            kind
        ))
        .into());
    }

    let mut nfa = Automaton::with_alphabet(grammar.terminals().iter().cloned());
    let mut states: HashMap<&str, StateId> = HashMap::new();
    states.insert(grammar.start(), nfa.initial_state());
    for nt in grammar.nonterminals() {
        if nt != grammar.start() {
            states.insert(nt, nfa.add_state());
        }
    }
    let accept = nfa.add_state();
    nfa.set_final(accept, true)?;

    let state = |nt: &str| {
        states
            .get(nt)
            .copied()
            .ok_or_else(|| GrammarError::MalformedInput(format!("undeclared nonterminal {}", nt)))
    };
    for production in grammar.productions() {
        let from = state(production.lhs())?;
        match production {
            Production::Empty(_) => nfa.set_final(from, true)?,
            Production::Nonempty(_, rhs) => match rhs.as_slice() {
                [Symbol::Terminal(a)] => nfa.add_transition(from, Some(a.as_str()), accept)?,
                [Symbol::Terminal(a), Symbol::Nonterminal(b)] => {
                    nfa.add_transition(from, Some(a.as_str()), state(b.as_str())?)?
                }
                _ => {
                    return Err(GrammarError::Unconvertible(format!(
                        "'{}' is not right-linear",
                        production
                    ))
                    .into())
                }
            },
        }
    }

    log::debug!(
        "regular_grammar_to_nfa: {} states, {} transitions",
        nfa.num_states(),
        nfa.num_transitions()
    );
    Ok(nfa)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_linear_grammar() {
        let g = Grammar::from_rules(
            "S",
            &[
                ("S", &["a", "S"]),
                ("S", &["b", "A"]),
                ("A", &["a", "A"]),
                ("A", &["b"]),
                ("A", &["ε"]),
            ],
        )
        .unwrap();

        let nfa = regular_grammar_to_nfa(&g).unwrap();
        assert_eq!(nfa.num_states(), 3);
        for word in ["b", "ab", "abb", "aabaa", "bab"] {
            assert!(nfa.accepts(word), "{} should be accepted", word);
        }
        for word in ["", "a", "bbb", "abbb"] {
            assert!(!nfa.accepts(word), "{} should be rejected", word);
        }
    }

    #[test]
    fn context_free_grammar_is_rejected() {
        let g = Grammar::from_rules("S", &[("S", &["a", "S", "b"]), ("S", &["ε"])]).unwrap();
        assert!(matches!(
            regular_grammar_to_nfa(&g),
            Err(Error::Grammar(GrammarError::Unconvertible(_)))
        ));
    }
}
