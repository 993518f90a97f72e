use std::borrow::Cow;

use bit_set::BitSet;
use flat_util::Symbol;

use super::cnf::{is_cnf, to_cnf};
use super::{Grammar, Production};
use crate::GrammarError;

impl Grammar {
    /// CYK membership test for a word given as a sequence of terminal names.
    ///
    /// Grammars that are not in CNF are converted first. The empty word is
    /// generated exactly when the start has an `S -> ε` rule after conversion,
    /// and any symbol that is not a terminal of the grammar rejects the word.
    pub fn generates<S: AsRef<str>>(&self, word: &[S]) -> Result<bool, GrammarError> {
        let cnf = if is_cnf(self) {
            self.validate()?;
            Cow::Borrowed(self)
        } else {
            Cow::Owned(to_cnf(self.clone())?)
        };
        Ok(cyk(&cnf, word))
    }

    /// Like [`Grammar::generates`], with one terminal per character.
    pub fn generates_str(&self, word: &str) -> Result<bool, GrammarError> {
        let word: Vec<String> = word.chars().map(String::from).collect();
        self.generates(&word)
    }
}

fn cyk<S: AsRef<str>>(grammar: &Grammar, word: &[S]) -> bool {
    if word.is_empty() {
        return grammar
            .productions_of(&grammar.start)
            .any(Production::is_empty);
    }
    if word.iter().any(|t| !grammar.terminals.contains(t.as_ref())) {
        return false;
    }

    let index = grammar.nonterminal_index();
    let mut terminal_rules: Vec<(usize, &str)> = Vec::new();
    let mut binary_rules: Vec<(usize, usize, usize)> = Vec::new();
    for production in &grammar.productions {
        let Some(&lhs) = index.get(production.lhs()) else {
            continue;
        };
        match production.rhs() {
            [Symbol::Terminal(t)] => terminal_rules.push((lhs, t.as_str())),
            [Symbol::Nonterminal(b), Symbol::Nonterminal(c)] => {
                if let (Some(&b), Some(&c)) = (index.get(b.as_str()), index.get(c.as_str())) {
                    binary_rules.push((lhs, b, c));
                }
            }
            _ => {}
        }
    }

    // table[len - 1][i]: nonterminals deriving word[i..i + len]
    let n = word.len();
    let mut table: Vec<Vec<BitSet>> = vec![vec![BitSet::new(); n]; n];
    for (i, t) in word.iter().enumerate() {
        for (lhs, terminal) in &terminal_rules {
            if *terminal == t.as_ref() {
                table[0][i].insert(*lhs);
            }
        }
    }
    for len in 2..=n {
        for i in 0..=n - len {
            let mut cell = BitSet::new();
            for split in 1..len {
                let left = &table[split - 1][i];
                let right = &table[len - split - 1][i + split];
                for (lhs, b, c) in &binary_rules {
                    if left.contains(*b) && right.contains(*c) {
                        cell.insert(*lhs);
                    }
                }
            }
            table[len - 1][i] = cell;
        }
    }
    log::trace!("cyk: {} cells filled for a word of length {}", n * (n + 1) / 2, n);

    index
        .get(grammar.start.as_str())
        .is_some_and(|start| table[n - 1][0].contains(*start))
}
