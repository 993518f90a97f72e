use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::iter;

use bit_set::BitSet;
use flat_util::Symbol;

use super::{Grammar, Production};
use crate::GrammarError;

/// Drops nonterminals that cannot be reached from the start, together with
/// their productions and any terminal no longer used.
pub fn remove_unreachable(grammar: Grammar) -> Result<Grammar, GrammarError> {
    grammar.validate()?;

    let reachable = {
        let index = grammar.nonterminal_index();
        let by_lhs = grammar.production_index();
        let start = index[grammar.start.as_str()];

        let mut reachable = BitSet::with_capacity(grammar.nonterminals.len());
        let mut queue = VecDeque::from([start]);
        reachable.insert(start);

        while let Some(nt) = queue.pop_front() {
            for p in &by_lhs[nt] {
                for symbol in grammar.productions[*p].rhs() {
                    if let Symbol::Nonterminal(name) = symbol {
                        let next = index[name.as_str()];
                        if reachable.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
            }
        }
        reachable
    };

    let mut result = grammar.restrict(&reachable);
    result.terminals = result
        .productions
        .iter()
        .flat_map(|p| p.rhs())
        .filter_map(|s| match s {
            Symbol::Terminal(t) => Some(t.clone()),
            _ => None,
        })
        .collect();

    log::debug!(
        "remove_unreachable: {} -> {} nonterminals",
        grammar.nonterminals.len(),
        result.nonterminals.len()
    );
    Ok(result)
}

/// Drops nonterminals that derive no terminal string, and every production
/// that mentions one. If the start itself is non-generating the language is
/// empty and the result is the start symbol with no productions.
pub fn remove_non_generating(grammar: Grammar) -> Result<Grammar, GrammarError> {
    grammar.validate()?;

    let generating = {
        let index = grammar.nonterminal_index();
        let mut generating = BitSet::with_capacity(grammar.nonterminals.len());
        loop {
            let mut changed = false;
            for production in &grammar.productions {
                let lhs = index[production.lhs()];
                if generating.contains(lhs) {
                    continue;
                }

                let all_generating = production.rhs().iter().all(|s| match s {
                    Symbol::Terminal(_) | Symbol::Epsilon => true,
                    Symbol::Nonterminal(nt) => generating.contains(index[nt.as_str()]),
                });
                if all_generating {
                    changed |= generating.insert(lhs);
                }
            }

            if !changed {
                break;
            }
        }
        generating
    };

    let start = grammar.nonterminal_index()[grammar.start.as_str()];
    if !generating.contains(start) {
        log::debug!("remove_non_generating: start symbol {} is non-generating", grammar.start);
        return Ok(Grammar {
            nonterminals: vec![grammar.start.clone()],
            terminals: grammar.terminals,
            start: grammar.start,
            productions: Vec::new(),
        });
    }

    let result = grammar.restrict(&generating);
    log::debug!(
        "remove_non_generating: {} -> {} nonterminals",
        grammar.nonterminals.len(),
        result.nonterminals.len()
    );
    Ok(result)
}

fn nullable_nonterminals(grammar: &Grammar) -> BitSet {
    let index = grammar.nonterminal_index();
    let mut nullables = BitSet::with_capacity(grammar.nonterminals.len());
    loop {
        let mut changed = false;
        for production in &grammar.productions {
            let all_nullable = production.rhs().iter().all(|s| match s {
                Symbol::Terminal(_) => false,
                Symbol::Nonterminal(nt) => nullables.contains(index[nt.as_str()]),
                Symbol::Epsilon => true,
            });

            if all_nullable {
                changed |= nullables.insert(index[production.lhs()]);
            }
        }

        if !changed {
            break;
        }
    }

    nullables
}

/// Removes epsilon productions.
///
/// Every production is replaced by all variants obtained by deleting some of
/// its nullable occurrences (never all of its symbols). If the start is
/// nullable it keeps a single `S -> ε`; when the start also occurs on a
/// right-hand side a fresh start `S' -> S | ε` is introduced first.
/// Nonterminals that only ever derived the empty string disappear.
pub fn eliminate_epsilon(grammar: Grammar) -> Result<Grammar, GrammarError> {
    grammar.validate()?;
    let mut grammar = grammar;

    let start_nullable = {
        let index = grammar.nonterminal_index();
        nullable_nonterminals(&grammar).contains(index[grammar.start.as_str()])
    };
    if start_nullable && grammar.start_on_rhs() {
        let fresh = grammar.name_supply().fresh(&grammar.start);
        log::trace!("start {} is nullable and referenced, adding {}", grammar.start, fresh);
        grammar.nonterminals.insert(0, fresh.clone());
        grammar.productions.insert(
            0,
            Production::Nonempty(fresh.clone(), vec![Symbol::Nonterminal(grammar.start.clone())]),
        );
        grammar.start = fresh;
    }

    let nullable = nullable_nonterminals(&grammar);
    let index = grammar.nonterminal_index();
    let is_nullable =
        |s: &Symbol| matches!(s, Symbol::Nonterminal(nt) if nullable.contains(index[nt.as_str()]));

    let mut seen: HashSet<Production> = HashSet::new();
    let mut productions: Vec<Production> = Vec::new();
    for production in &grammar.productions {
        let Production::Nonempty(lhs, rhs) = production else {
            continue;
        };

        // the first variant keeps every symbol
        let mut variants: Vec<Vec<Symbol>> = vec![Vec::new()];
        for symbol in rhs {
            if is_nullable(symbol) {
                let mut dropped = variants.clone();
                for variant in &mut variants {
                    variant.push(symbol.clone());
                }
                variants.append(&mut dropped);
            } else {
                for variant in &mut variants {
                    variant.push(symbol.clone());
                }
            }
        }

        for variant in variants {
            if variant.is_empty() {
                continue;
            }
            let production = Production::Nonempty(lhs.clone(), variant);
            if seen.insert(production.clone()) {
                productions.push(production);
            }
        }
    }
    if nullable.contains(index[grammar.start.as_str()]) {
        productions.push(Production::Empty(grammar.start.clone()));
    }

    // nullable nonterminals left without productions derived only ε; the
    // variants that skip them are already present
    let mut vanished: HashSet<String> = HashSet::new();
    loop {
        let newly_vanished: Vec<String> = {
            let has_rules: HashSet<&str> = productions.iter().map(Production::lhs).collect();
            grammar
                .nonterminals
                .iter()
                .filter(|nt| {
                    **nt != grammar.start
                        && !vanished.contains(*nt)
                        && !has_rules.contains(nt.as_str())
                        && nullable.contains(index[nt.as_str()])
                })
                .cloned()
                .collect()
        };
        if newly_vanished.is_empty() {
            break;
        }

        vanished.extend(newly_vanished);
        productions.retain(|p| {
            !p.rhs()
                .iter()
                .any(|s| matches!(s, Symbol::Nonterminal(nt) if vanished.contains(nt)))
        });
    }

    let nonterminals: Vec<String> = grammar
        .nonterminals
        .iter()
        .filter(|nt| !vanished.contains(*nt))
        .cloned()
        .collect();

    log::debug!(
        "eliminate_epsilon: {} nullable, {} -> {} productions",
        nullable.len(),
        grammar.productions.len(),
        productions.len()
    );
    Ok(Grammar {
        nonterminals,
        terminals: grammar.terminals.clone(),
        start: grammar.start.clone(),
        productions,
    })
}

/// Removes unit productions `A -> B`. Each nonterminal receives the non-unit
/// productions of everything in its unit closure, itself first.
pub fn eliminate_unit(grammar: Grammar) -> Result<Grammar, GrammarError> {
    grammar.validate()?;

    let index = grammar.nonterminal_index();
    let by_lhs = grammar.production_index();
    let n = grammar.nonterminals.len();

    let mut seen: HashSet<Production> = HashSet::new();
    let mut productions: Vec<Production> = Vec::new();
    for a in 0..n {
        let mut closure = vec![a];
        let mut in_closure = BitSet::with_capacity(n);
        in_closure.insert(a);

        let mut next = 0;
        while next < closure.len() {
            let b = closure[next];
            next += 1;
            for p in &by_lhs[b] {
                if let [Symbol::Nonterminal(c)] = grammar.productions[*p].rhs() {
                    let c = index[c.as_str()];
                    if in_closure.insert(c) {
                        closure.push(c);
                    }
                }
            }
        }
        log::trace!("unit closure of {}: {:?}", grammar.nonterminals[a], closure);

        for b in &closure {
            for p in &by_lhs[*b] {
                let production = &grammar.productions[*p];
                if production.is_unit() {
                    continue;
                }
                let production =
                    Production::from_rhs(grammar.nonterminals[a].clone(), production.rhs().to_vec());
                if seen.insert(production.clone()) {
                    productions.push(production);
                }
            }
        }
    }

    log::debug!(
        "eliminate_unit: {} -> {} productions",
        grammar.productions.len(),
        productions.len()
    );
    Ok(Grammar {
        nonterminals: grammar.nonterminals.clone(),
        terminals: grammar.terminals.clone(),
        start: grammar.start.clone(),
        productions,
    })
}

/// Merges nonterminals with identical sets of right-hand sides into one
/// representative, the start if it is among them and otherwise the first
/// declared. Repeated until no two nonterminals agree, since a merge can make
/// further right-hand sides coincide. Not part of [`simplify`].
pub fn merge_equivalent_nonterminals(grammar: Grammar) -> Result<Grammar, GrammarError> {
    grammar.validate()?;

    let mut grammar = grammar;
    loop {
        let mut rename: HashMap<String, String> = HashMap::new();
        {
            let index = grammar.nonterminal_index();
            let by_lhs = grammar.production_index();
            let start = index[grammar.start.as_str()];
            let order =
                iter::once(start).chain((0..grammar.nonterminals.len()).filter(|i| *i != start));

            let mut representative: HashMap<BTreeSet<Vec<Symbol>>, usize> = HashMap::new();
            for i in order {
                let alternatives: BTreeSet<Vec<Symbol>> = by_lhs[i]
                    .iter()
                    .map(|p| grammar.productions[*p].rhs().to_vec())
                    .collect();
                match representative.get(&alternatives) {
                    Some(r) => {
                        rename.insert(
                            grammar.nonterminals[i].clone(),
                            grammar.nonterminals[*r].clone(),
                        );
                    }
                    None => {
                        representative.insert(alternatives, i);
                    }
                }
            }
        }
        if rename.is_empty() {
            break;
        }
        log::trace!("merging {:?}", rename);

        let renamed = |symbol: &Symbol| match symbol {
            Symbol::Nonterminal(nt) => match rename.get(nt) {
                Some(target) => Symbol::Nonterminal(target.clone()),
                None => symbol.clone(),
            },
            other => other.clone(),
        };
        let mut seen: HashSet<Production> = HashSet::new();
        let productions: Vec<Production> = grammar
            .productions
            .iter()
            .filter(|p| !rename.contains_key(p.lhs()))
            .map(|p| Production::from_rhs(p.lhs(), p.rhs().iter().map(&renamed).collect()))
            .filter(|p| seen.insert(p.clone()))
            .collect();
        let nonterminals: Vec<String> = grammar
            .nonterminals
            .iter()
            .filter(|nt| !rename.contains_key(*nt))
            .cloned()
            .collect();

        log::debug!(
            "merge_equivalent_nonterminals: {} -> {} nonterminals",
            grammar.nonterminals.len(),
            nonterminals.len()
        );
        grammar = Grammar {
            nonterminals,
            terminals: grammar.terminals,
            start: grammar.start,
            productions,
        };
    }

    Ok(grammar)
}

/// Unreachable, non-generating, epsilon and unit elimination, followed by a
/// final reachability pass.
pub fn simplify(grammar: Grammar) -> Result<Grammar, GrammarError> {
    let grammar = remove_unreachable(grammar)?;
    let grammar = remove_non_generating(grammar)?;
    let grammar = eliminate_epsilon(grammar)?;
    let grammar = eliminate_unit(grammar)?;
    remove_unreachable(grammar)
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
    fn unreachable_symbols() {
        init_logging();
        let g = Grammar::from_rules(
            "S",
            &[
                ("S", &["a", "A"]),
                ("A", &["b"]),
                ("B", &["c", "B"]),
                ("B", &["d"]),
            ],
        )
        .unwrap();

        let g = remove_unreachable(g).unwrap();
        assert_eq!(g.nonterminals(), ["S", "A"]);
        assert_eq!(g.terminals().iter().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(rules(&g), ["S -> a A", "A -> b"]);
    }

    #[test]
    fn non_generating_symbols() {
        let g = Grammar::from_rules(
            "S",
            &[
                ("S", &["a", "S"]),
                ("S", &["A"]),
                ("S", &["b"]),
                ("A", &["A", "c"]),
            ],
        )
        .unwrap();

        let g = remove_non_generating(g).unwrap();
        assert_eq!(g.nonterminals(), ["S"]);
        assert_eq!(rules(&g), ["S -> a S", "S -> b"]);
    }

    #[test]
    fn non_generating_start_gives_empty_language() {
        let g = Grammar::from_rules("S", &[("S", &["a", "S"])]).unwrap();
        let g = remove_non_generating(g).unwrap();
        assert_eq!(g.nonterminals(), ["S"]);
        assert!(g.productions().is_empty());

        let g = simplify(Grammar::from_rules("S", &[("S", &["a", "S"])]).unwrap()).unwrap();
        assert!(g.productions().is_empty());
        assert!(g.terminals().is_empty());
    }

    #[test]
    fn epsilon_productions() {
        init_logging();
        let g = Grammar::from_rules(
            "S",
            &[
                ("S", &["A", "B"]),
                ("A", &["a", "A"]),
                ("A", &["ε"]),
                ("B", &["b"]),
            ],
        )
        .unwrap();

        let g = eliminate_epsilon(g).unwrap();
        assert_eq!(
            rules(&g),
            ["S -> A B", "S -> B", "A -> a A", "A -> a", "B -> b"]
        );
        assert!(!g.has_epsilon_productions());
    }

    #[test]
    fn nullable_start_on_rhs_gets_fresh_start() {
        let g = Grammar::from_rules("S", &[("S", &["a", "S", "b"]), ("S", &["ε"])]).unwrap();

        let g = eliminate_epsilon(g).unwrap();
        assert_eq!(g.start(), "S'");
        assert_eq!(g.nonterminals(), ["S'", "S"]);
        assert_eq!(rules(&g), ["S' -> S", "S -> a S b", "S -> a b", "S' -> ε"]);
        assert!(!g.start_on_rhs());
    }

    #[test]
    fn nullable_start_off_rhs_keeps_epsilon() {
        let g = Grammar::from_rules("S", &[("S", &["A"]), ("A", &["a"]), ("A", &["ε"])]).unwrap();

        let g = eliminate_epsilon(g).unwrap();
        assert_eq!(g.start(), "S");
        assert_eq!(rules(&g), ["S -> A", "A -> a", "S -> ε"]);
    }

    #[test]
    fn epsilon_only_nonterminals_vanish() {
        let g = Grammar::from_rules(
            "S",
            &[("S", &["a", "A"]), ("A", &["ε"]), ("A", &["B", "B"]), ("B", &["ε"])],
        )
        .unwrap();

        let g = eliminate_epsilon(g).unwrap();
        assert_eq!(g.nonterminals(), ["S"]);
        assert_eq!(rules(&g), ["S -> a"]);
    }

    #[test]
    fn unit_productions() {
        let g = Grammar::from_rules(
            "S",
            &[
                ("S", &["A"]),
                ("S", &["a"]),
                ("A", &["B"]),
                ("A", &["b"]),
                ("B", &["c"]),
                ("B", &["A"]),
            ],
        )
        .unwrap();

        let g = eliminate_unit(g).unwrap();
        assert_eq!(
            rules(&g),
            ["S -> a", "S -> b", "S -> c", "A -> b", "A -> c", "B -> c", "B -> b"]
        );
        assert!(!g.has_unit_productions());
    }

    #[test]
    fn simplify_pipeline() {
        init_logging();
        let g = Grammar::from_rules(
            "S",
            &[
                ("S", &["A", "B"]),
                ("S", &["a"]),
                ("A", &["b"]),
                ("B", &["b", "B"]),
                ("C", &["c"]),
            ],
        )
        .unwrap();

        let g = simplify(g).unwrap();
        assert_eq!(g.nonterminals(), ["S"]);
        assert_eq!(g.terminals().iter().collect::<Vec<_>>(), ["a"]);
        assert_eq!(rules(&g), ["S -> a"]);
    }

    #[test]
    fn identical_nonterminals_are_merged() {
        init_logging();
        let g = Grammar::from_rules(
            "S",
            &[
                ("S", &["a", "A"]),
                ("S", &["a", "B"]),
                ("A", &["b", "C"]),
                ("B", &["b", "D"]),
                ("C", &["c"]),
                ("D", &["c"]),
            ],
        )
        .unwrap();

        // D folds into C, which makes A and B coincide
        let merged = merge_equivalent_nonterminals(g.clone()).unwrap();
        assert_eq!(merged.nonterminals(), ["S", "A", "C"]);
        assert_eq!(rules(&merged), ["S -> a A", "A -> b C", "C -> c"]);
        assert_eq!(g.bounded_language(4), merged.bounded_language(4));
    }

    #[test]
    fn merging_keeps_the_start() {
        let g = Grammar::new(
            ["X", "S", "Y"],
            ["a", "b"],
            "S",
            vec![
                Production::Nonempty("X".to_string(), vec![Symbol::terminal("a")]),
                Production::Nonempty("X".to_string(), vec![Symbol::terminal("b")]),
                Production::Nonempty("S".to_string(), vec![Symbol::terminal("b")]),
                Production::Nonempty("S".to_string(), vec![Symbol::terminal("a")]),
                Production::Nonempty(
                    "Y".to_string(),
                    vec![Symbol::nonterminal("X"), Symbol::nonterminal("S")],
                ),
            ],
        )
        .unwrap();

        let merged = merge_equivalent_nonterminals(g.clone()).unwrap();
        assert_eq!(merged.start(), "S");
        assert_eq!(merged.nonterminals(), ["S", "Y"]);
        assert_eq!(rules(&merged), ["S -> b", "S -> a", "Y -> S S"]);
        assert_eq!(g.bounded_language(3), merged.bounded_language(3));

        // nothing to merge
        let g = Grammar::from_rules("S", &[("S", &["a", "S"]), ("S", &["b"])]).unwrap();
        assert_eq!(merge_equivalent_nonterminals(g.clone()).unwrap(), g);
    }

    #[test]
    fn simplify_is_idempotent() {
        let grammars = [
            Grammar::from_rules(
                "S",
                &[
                    ("S", &["a", "S", "b"]),
                    ("S", &["A"]),
                    ("S", &[]),
                    ("A", &["c", "A"]),
                    ("A", &["B"]),
                    ("B", &["d"]),
                    ("D", &["S"]),
                ],
            )
            .unwrap(),
            Grammar::from_rules(
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
            .unwrap(),
        ];

        for g in grammars {
            let once = simplify(g).unwrap();
            let twice = simplify(once.clone()).unwrap();
            assert_eq!(once.nonterminals(), twice.nonterminals());
            assert_eq!(once.terminals(), twice.terminals());
            assert!(!once.has_unit_productions());
            assert!(once
                .productions()
                .iter()
                .all(|p| !p.is_empty() || p.lhs() == once.start()));
        }
    }
}
