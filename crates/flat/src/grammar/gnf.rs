use std::collections::HashMap;

use flat_util::Symbol;

use super::cnf::{is_cnf, to_cnf};
use super::simplify::remove_unreachable;
use super::{Grammar, Production};
use crate::GrammarError;

/// Whether every production is `A -> a B1 ... Bk` (k >= 0), or `S -> ε` with
/// the start `S` occurring on no right-hand side.
pub fn is_gnf(grammar: &Grammar) -> bool {
    grammar
        .productions
        .iter()
        .all(|p| is_gnf_production(grammar, p))
}

fn is_gnf_production(grammar: &Grammar, production: &Production) -> bool {
    match production.rhs() {
        [] => grammar.epsilon_rule_allowed(production),
        [Symbol::Terminal(_), rest @ ..] => rest.iter().all(Symbol::is_nonterminal),
        _ => false,
    }
}

// binary/terminal shape with epsilon rules allowed anywhere
fn is_cnf_shaped(grammar: &Grammar) -> bool {
    grammar.productions.iter().all(|p| {
        matches!(
            p.rhs(),
            [] | [Symbol::Terminal(_)] | [Symbol::Nonterminal(_), Symbol::Nonterminal(_)]
        )
    })
}

fn push_unique(rules: &mut Vec<Vec<Symbol>>, rhs: Vec<Symbol>) {
    if !rules.contains(&rhs) {
        rules.push(rhs);
    }
}

// working copy of the grammar: right-hand sides per nonterminal, addressed
// by position in A1..An followed by the primed nonterminals
struct Work {
    order: Vec<String>,
    position: HashMap<String, usize>,
    rules: Vec<Vec<Vec<Symbol>>>,
}

impl Work {
    fn leading(&self, rhs: &[Symbol]) -> Option<usize> {
        match rhs.first() {
            Some(Symbol::Nonterminal(nt)) => self.position.get(nt).copied(),
            _ => None,
        }
    }

    // expands leading nonterminals accepted by `expand` in the rules of `i`
    // until none is left
    fn substitute(&mut self, i: usize, expand: impl Fn(usize) -> bool) {
        loop {
            let mut changed = false;
            let mut next: Vec<Vec<Symbol>> = Vec::new();
            for rhs in &self.rules[i] {
                match self.leading(rhs) {
                    Some(j) if j != i && expand(j) => {
                        for prefix in &self.rules[j] {
                            let mut expanded = prefix.clone();
                            expanded.extend_from_slice(&rhs[1..]);
                            push_unique(&mut next, expanded);
                        }
                        changed = true;
                    }
                    _ => push_unique(&mut next, rhs.clone()),
                }
            }
            self.rules[i] = next;

            if !changed {
                break;
            }
        }
    }

    // Ai -> Ai α | β  becomes  Ai -> β | β Ai',  Ai' -> α | α Ai'
    fn remove_left_recursion(&mut self, i: usize, prime: impl FnOnce(&str) -> String) {
        let (recursive, others): (Vec<Vec<Symbol>>, Vec<Vec<Symbol>>) = self.rules[i]
            .iter()
            .cloned()
            .partition(|rhs| self.leading(rhs) == Some(i));
        if recursive.is_empty() {
            return;
        }

        let name = prime(&self.order[i]);
        let tail = Symbol::Nonterminal(name.clone());
        log::trace!("left recursion on {}, adding {}", self.order[i], name);

        let mut rules = Vec::new();
        for beta in others {
            let mut extended = beta.clone();
            extended.push(tail.clone());
            push_unique(&mut rules, beta);
            push_unique(&mut rules, extended);
        }
        let mut tail_rules = Vec::new();
        for rhs in recursive {
            let alpha = rhs[1..].to_vec();
            if alpha.is_empty() {
                continue;
            }
            let mut extended = alpha.clone();
            extended.push(tail.clone());
            push_unique(&mut tail_rules, alpha);
            push_unique(&mut tail_rules, extended);
        }

        self.rules[i] = rules;
        self.position.insert(name.clone(), self.order.len());
        self.order.push(name);
        self.rules.push(tail_rules);
    }
}

/// Converts a grammar to Greibach Normal Form.
///
/// Input in CNF is used as is; input that is not even CNF-shaped is
/// converted to CNF first. Nonterminals are ordered start first, then in
/// declaration order, and the usual substitution and left recursion removal
/// is applied. The start keeps its `S -> ε` rule, if any.
///
/// A binary/terminal-shaped grammar in which a non-start nonterminal (or a
/// referenced start) derives ε directly is rejected as `Unconvertible`.
pub fn to_gnf(grammar: Grammar) -> Result<Grammar, GrammarError> {
    grammar.validate()?;

    let grammar = if is_cnf(&grammar) {
        grammar
    } else if is_cnf_shaped(&grammar) {
        let offender = grammar
            .productions
            .iter()
            .find(|p| p.is_empty() && !grammar.epsilon_rule_allowed(p))
            .map(|p| p.lhs().to_string())
            .unwrap_or_default();
        return Err(GrammarError::Unconvertible(format!(
            "{} derives ε but is not an unreferenced start symbol",
            offender
        )));
    } else {
        to_cnf(grammar)?
    };
    let mut names = grammar.name_supply();

    let mut order: Vec<String> = vec![grammar.start.clone()];
    order.extend(
        grammar
            .nonterminals
            .iter()
            .filter(|nt| **nt != grammar.start)
            .cloned(),
    );
    let n = order.len();
    let position: HashMap<String, usize> = order
        .iter()
        .enumerate()
        .map(|(i, nt)| (nt.clone(), i))
        .collect();

    let mut start_epsilon = false;
    let mut rules: Vec<Vec<Vec<Symbol>>> = vec![Vec::new(); n];
    for production in &grammar.productions {
        match production {
            Production::Empty(_) => start_epsilon = true,
            Production::Nonempty(lhs, rhs) => {
                if let Some(i) = position.get(lhs) {
                    push_unique(&mut rules[*i], rhs.clone());
                }
            }
        }
    }
    let mut work = Work {
        order,
        position,
        rules,
    };

    // after this every Ai rule starts with a terminal or some Aj, j > i
    for i in 0..n {
        work.substitute(i, |j| j < i);
        work.remove_left_recursion(i, |name| names.fresh(name));
    }
    // An is terminal-leading already; work downwards
    for i in (0..n.saturating_sub(1)).rev() {
        work.substitute(i, |j| j > i && j < n);
    }
    // primes may lead with earlier primes, never with later ones
    for i in n..work.order.len() {
        work.substitute(i, |j| j < i);
    }

    let mut productions = Vec::new();
    if start_epsilon {
        productions.push(Production::Empty(grammar.start.clone()));
    }
    for (nt, rules) in work.order.iter().zip(&work.rules) {
        for rhs in rules {
            productions.push(Production::Nonempty(nt.clone(), rhs.clone()));
        }
    }

    let result = remove_unreachable(Grammar {
        nonterminals: work.order,
        terminals: grammar.terminals.clone(),
        start: grammar.start.clone(),
        productions,
    })?;
    if let Some(p) = result.productions.iter().find(|p| !is_gnf_production(&result, p)) {
        return Err(GrammarError::Unconvertible(format!(
            "'{}' cannot be brought into Greibach form",
            p
        )));
    }

    log::debug!(
        "to_gnf: {} nonterminals, {} productions",
        result.nonterminals.len(),
        result.productions.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn assert_same_language(g: &Grammar, h: &Grammar, k: usize) {
        assert_eq!(
            g.bounded_language(k),
            h.bounded_language(k),
            "languages differ up to length {}:\n{}\n{}",
            k,
            g,
            h
        );
    }

    #[test]
    fn balanced() {
        init_logging();
        let g = Grammar::from_rules("S", &[("S", &["a", "S", "b"]), ("S", &["a", "b"])]).unwrap();

        let gnf = to_gnf(g.clone()).unwrap();
        println!("{}", gnf);
        assert!(is_gnf(&gnf));
        assert_same_language(&g, &gnf, 8);
    }

    #[test]
    fn left_recursive_expressions() {
        init_logging();
        let g = Grammar::from_rules(
            "E",
            &[
                ("E", &["E", "+", "T"]),
                ("E", &["T"]),
                ("T", &["T", "*", "F"]),
                ("T", &["F"]),
                ("F", &["(", "E", ")"]),
                ("F", &["x"]),
            ],
        )
        .unwrap();

        let gnf = to_gnf(g.clone()).unwrap();
        println!("{}", gnf);
        assert!(is_gnf(&gnf));
        assert_same_language(&g, &gnf, 5);
    }

    #[test]
    fn cnf_input_with_left_recursion() {
        // already in CNF, so the conversion works on it directly
        let g = Grammar::from_rules(
            "S",
            &[("S", &["S", "A"]), ("S", &["a"]), ("A", &["b"])],
        )
        .unwrap();
        assert!(is_cnf(&g));

        let gnf = to_gnf(g.clone()).unwrap();
        assert!(is_gnf(&gnf));
        assert_eq!(gnf.start(), "S");
        assert!(gnf.nonterminals().iter().any(|nt| nt == "S'"));
        assert_same_language(&g, &gnf, 6);
    }

    #[test]
    fn start_epsilon_is_kept() {
        let g = Grammar::from_rules("S", &[("S", &["a", "S", "b"]), ("S", &["ε"])]).unwrap();

        let gnf = to_gnf(g.clone()).unwrap();
        assert!(is_gnf(&gnf));
        assert!(gnf
            .productions_of(gnf.start())
            .any(|p| p.is_empty()));
        assert_same_language(&g, &gnf, 8);
    }

    #[test]
    fn empty_language() {
        let g = Grammar::from_rules("S", &[("S", &["a", "S"])]).unwrap();
        let gnf = to_gnf(g).unwrap();
        assert!(gnf.productions().is_empty());
        assert!(is_gnf(&gnf));
    }

    #[test]
    fn epsilon_below_the_start_is_unconvertible() {
        let g = Grammar::from_rules(
            "S",
            &[
                ("S", &["A", "B"]),
                ("A", &["a"]),
                ("A", &["ε"]),
                ("B", &["b"]),
            ],
        )
        .unwrap();

        assert!(matches!(to_gnf(g), Err(GrammarError::Unconvertible(msg)) if msg.starts_with("A ")));
    }

    #[test]
    fn shape_check() {
        let g = Grammar::from_rules("S", &[("S", &["a", "S", "B"]), ("S", &["b"]), ("B", &["b"])])
            .unwrap();
        assert!(is_gnf(&g));

        let g = Grammar::from_rules("S", &[("S", &["a", "b"])]).unwrap();
        assert!(!is_gnf(&g));

        let g = Grammar::from_rules("S", &[("S", &["S", "a"]), ("S", &["a"])]).unwrap();
        assert!(!is_gnf(&g));
    }
}
