use std::collections::{BTreeMap, HashMap};

use flat_util::Symbol;

use super::simplify::simplify;
use super::{Grammar, Production};
use crate::GrammarError;

/// Whether every production is `A -> B C`, `A -> a`, or `S -> ε` with the
/// start `S` occurring on no right-hand side.
pub fn is_cnf(grammar: &Grammar) -> bool {
    grammar.productions.iter().all(|p| match p.rhs() {
        [] => grammar.epsilon_rule_allowed(p),
        [Symbol::Terminal(_)] => true,
        [Symbol::Nonterminal(_), Symbol::Nonterminal(_)] => true,
        _ => false,
    })
}

/// Converts a grammar to Chomsky Normal Form.
///
/// START adds a fresh start `S0 -> S`, the grammar is simplified, BIN splits
/// right-hand sides longer than two into chains of fresh `A_1, A_2, ...`
/// nonterminals and TERM replaces terminals in binary right-hand sides by a
/// shared `T_a -> a`.
pub fn to_cnf(grammar: Grammar) -> Result<Grammar, GrammarError> {
    grammar.validate()?;
    let mut names = grammar.name_supply();

    // START
    let mut grammar = grammar;
    let start = names.fresh("S0");
    grammar.nonterminals.insert(0, start.clone());
    grammar.productions.insert(
        0,
        Production::Nonempty(start.clone(), vec![Symbol::Nonterminal(grammar.start.clone())]),
    );
    grammar.start = start;

    let grammar = simplify(grammar)?;
    let Grammar {
        mut nonterminals,
        terminals,
        start,
        productions: simplified,
    } = grammar;

    // BIN
    let mut tails: HashMap<String, usize> = HashMap::new();
    let mut productions: Vec<Production> = Vec::with_capacity(simplified.len());
    for production in simplified {
        let (lhs, rhs) = match production {
            Production::Nonempty(lhs, rhs) if rhs.len() > 2 => (lhs, rhs),
            other => {
                productions.push(other);
                continue;
            }
        };

        let mut current = lhs.clone();
        let last = rhs.len() - 2;
        for symbol in &rhs[..last] {
            let counter = tails.entry(lhs.clone()).or_insert(0);
            *counter += 1;
            let tail = names.fresh(&format!("{}_{}", lhs, counter));
            nonterminals.push(tail.clone());

            productions.push(Production::Nonempty(
                current,
                vec![symbol.clone(), Symbol::Nonterminal(tail.clone())],
            ));
            current = tail;
        }
        productions.push(Production::Nonempty(current, rhs[last..].to_vec()));
    }

    // TERM
    let mut wrappers: BTreeMap<String, String> = BTreeMap::new();
    let mut wrapper_productions: Vec<Production> = Vec::new();
    for production in &mut productions {
        let Production::Nonempty(_, rhs) = production else {
            continue;
        };
        if rhs.len() != 2 {
            continue;
        }

        for symbol in rhs.iter_mut() {
            let Symbol::Terminal(t) = symbol else {
                continue;
            };
            let wrapper = match wrappers.get(t) {
                Some(wrapper) => wrapper.clone(),
                None => {
                    let wrapper = names.fresh(&format!("T_{}", t));
                    nonterminals.push(wrapper.clone());
                    wrapper_productions.push(Production::Nonempty(
                        wrapper.clone(),
                        vec![Symbol::Terminal(t.clone())],
                    ));
                    wrappers.insert(t.clone(), wrapper.clone());
                    wrapper
                }
            };
            *symbol = Symbol::Nonterminal(wrapper);
        }
    }
    productions.extend(wrapper_productions);

    log::debug!(
        "to_cnf: {} nonterminals, {} productions",
        nonterminals.len(),
        productions.len()
    );
    Ok(Grammar {
        nonterminals,
        terminals,
        start,
        productions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rules(g: &Grammar) -> Vec<String> {
        g.productions().iter().map(Production::to_string).collect()
    }

    #[test]
    fn long_rules_and_mixed_terminals() {
        init_logging();
        let g = Grammar::from_rules("S", &[("S", &["a", "S", "b", "S"]), ("S", &["c"])]).unwrap();

        let cnf = to_cnf(g).unwrap();
        println!("{}", cnf);
        assert!(is_cnf(&cnf));
        assert_eq!(cnf.start(), "S0");
        assert_eq!(
            rules(&cnf),
            [
                "S0 -> T_a S0_1",
                "S0_1 -> S S0_2",
                "S0_2 -> T_b S",
                "S0 -> c",
                "S -> T_a S_1",
                "S_1 -> S S_2",
                "S_2 -> T_b S",
                "S -> c",
                "T_a -> a",
                "T_b -> b",
            ]
        );
    }

    #[test]
    fn nullable_start_keeps_epsilon() {
        let g = Grammar::from_rules("S", &[("S", &["a", "S", "b"]), ("S", &["ε"])]).unwrap();

        let cnf = to_cnf(g).unwrap();
        assert!(is_cnf(&cnf));
        assert!(cnf
            .productions_of(cnf.start())
            .any(|p| *p == Production::Empty("S0".to_string())));
        assert!(cnf
            .productions()
            .iter()
            .all(|p| !p.is_empty() || p.lhs() == "S0"));
    }

    #[test]
    fn fresh_names_avoid_existing_symbols() {
        let g = Grammar::from_rules(
            "S0",
            &[("S0", &["a", "T_a"]), ("T_a", &["b"])],
        )
        .unwrap();

        let cnf = to_cnf(g).unwrap();
        assert!(is_cnf(&cnf));
        assert_eq!(cnf.start(), "S0'");
        assert!(cnf.nonterminals().iter().any(|nt| nt == "T_a'"));
    }

    #[test]
    fn shape_check() {
        let g = Grammar::from_rules("S", &[("S", &["A", "B"]), ("A", &["a"]), ("B", &["b"])]).unwrap();
        assert!(is_cnf(&g));

        let g = Grammar::from_rules("S", &[("S", &["a", "B"]), ("B", &["b"])]).unwrap();
        assert!(!is_cnf(&g));

        // the start may only vanish if nothing refers to it
        let g = Grammar::from_rules("S", &[("S", &["S", "S"]), ("S", &["a"]), ("S", &[])]).unwrap();
        assert!(!is_cnf(&g));

        let g = Grammar::from_rules("S", &[("S", &["A"]), ("A", &["a"])]).unwrap();
        assert!(!is_cnf(&g));
    }
}
