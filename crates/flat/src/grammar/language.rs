use std::collections::BTreeSet;

use flat_util::Symbol;

use super::Grammar;

type Word = Vec<String>;

impl Grammar {
    /// All terminal words of length at most `k` derivable from the start.
    ///
    /// Computed as a least fixpoint over per-nonterminal word sets, each
    /// truncated to length `k`. Exponential in `k`; meant for small bounds.
    pub fn bounded_language(&self, k: usize) -> BTreeSet<Word> {
        let index = self.nonterminal_index();
        let mut words: Vec<BTreeSet<Word>> = vec![BTreeSet::new(); self.nonterminals.len()];

        let mut rounds = 0;
        loop {
            let mut changed = false;
            for production in &self.productions {
                let Some(&lhs) = index.get(production.lhs()) else {
                    continue;
                };

                // all ways to derive the right-hand side, left to right
                let mut partial: BTreeSet<Word> = BTreeSet::from([Vec::new()]);
                for symbol in production.rhs() {
                    let mut next = BTreeSet::new();
                    match symbol {
                        Symbol::Terminal(t) => {
                            for prefix in &partial {
                                if prefix.len() < k {
                                    let mut word = prefix.clone();
                                    word.push(t.clone());
                                    next.insert(word);
                                }
                            }
                        }
                        Symbol::Nonterminal(nt) => {
                            let Some(&j) = index.get(nt.as_str()) else {
                                partial.clear();
                                break;
                            };
                            for prefix in &partial {
                                for suffix in &words[j] {
                                    if prefix.len() + suffix.len() <= k {
                                        let mut word = prefix.clone();
                                        word.extend(suffix.iter().cloned());
                                        next.insert(word);
                                    }
                                }
                            }
                        }
                        Symbol::Epsilon => next = partial.clone(),
                    }
                    partial = next;
                    if partial.is_empty() {
                        break;
                    }
                }

                for word in partial {
                    changed |= words[lhs].insert(word);
                }
            }

            rounds += 1;
            if !changed {
                break;
            }
        }
        log::trace!("bounded_language({}): fixpoint after {} rounds", k, rounds);

        index
            .get(self.start.as_str())
            .map(|start| std::mem::take(&mut words[*start]))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> BTreeSet<Word> {
        list.iter()
            .map(|w| w.chars().map(String::from).collect())
            .collect()
    }

    #[test]
    fn balanced_words() {
        let g = Grammar::from_rules("S", &[("S", &["a", "S", "b"]), ("S", &["ε"])]).unwrap();
        assert_eq!(g.bounded_language(0), words(&[""]));
        assert_eq!(g.bounded_language(5), words(&["", "ab", "aabb"]));
    }

    #[test]
    fn mutually_recursive_nonterminals() {
        let g = Grammar::from_rules(
            "S",
            &[
                ("S", &["a", "A"]),
                ("S", &["b"]),
                ("A", &["b", "S"]),
            ],
        )
        .unwrap();
        assert_eq!(g.bounded_language(5), words(&["b", "abb", "ababb"]));
    }

    #[test]
    fn empty_language() {
        let g = Grammar::from_rules("S", &[("S", &["a", "S"])]).unwrap();
        assert!(g.bounded_language(6).is_empty());
    }
}
