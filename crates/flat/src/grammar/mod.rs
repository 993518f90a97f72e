use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use bit_set::BitSet;
use flat_util::{NameSupply, Symbol, EPSILON};
use serde::{Deserialize, Serialize};

use crate::GrammarError;

mod classify;
mod cnf;
mod cyk;
mod gnf;
mod language;
mod simplify;

pub use classify::{classify, GrammarType, Rule};
pub use cnf::{is_cnf, to_cnf};
pub use gnf::{is_gnf, to_gnf};
pub use simplify::{
    eliminate_epsilon, eliminate_unit, merge_equivalent_nonterminals, remove_non_generating,
    remove_unreachable, simplify,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Production {
    Empty(String),
    Nonempty(String, Vec<Symbol>),
}

impl Production {
    // an empty right-hand side, or a lone ε, is the epsilon production
    pub(crate) fn from_rhs(lhs: impl Into<String>, rhs: Vec<Symbol>) -> Production {
        match rhs.as_slice() {
            [] | [Symbol::Epsilon] => Production::Empty(lhs.into()),
            _ => Production::Nonempty(lhs.into(), rhs),
        }
    }

    /// Rewrites `A -> ε` given as a one-symbol right-hand side into
    /// [`Production::Empty`]; other productions are returned unchanged.
    pub fn normalized(self) -> Production {
        match self {
            Production::Nonempty(lhs, rhs) if matches!(rhs.as_slice(), [Symbol::Epsilon]) => {
                Production::Empty(lhs)
            }
            other => other,
        }
    }

    pub fn lhs(&self) -> &str {
        match self {
            Production::Empty(lhs) | Production::Nonempty(lhs, _) => lhs,
        }
    }

    /// Right-hand side; empty for an epsilon production.
    pub fn rhs(&self) -> &[Symbol] {
        match self {
            Production::Empty(_) => &[],
            Production::Nonempty(_, rhs) => rhs,
        }
    }

    pub fn len(&self) -> usize {
        self.rhs().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Production::Empty(_))
    }

    /// `A -> B` with `B` a single nonterminal.
    pub fn is_unit(&self) -> bool {
        matches!(self.rhs(), [Symbol::Nonterminal(_)])
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.lhs())?;
        match self {
            Production::Empty(_) => write!(f, " {}", EPSILON),
            Production::Nonempty(_, rhs) => {
                for symbol in rhs {
                    write!(f, " {}", symbol)?;
                }
                Ok(())
            }
        }
    }
}

/// A context-free grammar.
///
/// Nonterminals keep their declaration order and productions keep their
/// insertion order, so every transformation is deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    pub(crate) nonterminals: Vec<String>,
    pub(crate) terminals: BTreeSet<String>,
    pub(crate) start: String,
    pub(crate) productions: Vec<Production>,
}

impl Grammar {
    pub fn new<N, T>(
        nonterminals: N,
        terminals: T,
        start: impl Into<String>,
        productions: Vec<Production>,
    ) -> Result<Grammar, GrammarError>
    where
        N: IntoIterator,
        N::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let grammar = Grammar {
            nonterminals: nonterminals.into_iter().map(Into::into).collect(),
            terminals: terminals.into_iter().map(Into::into).collect(),
            start: start.into(),
            productions: productions.into_iter().map(Production::normalized).collect(),
        };
        grammar.validate()?;
        Ok(grammar)
    }

    /// Builds a grammar from `(lhs, rhs)` pairs.
    ///
    /// Every name used as a left-hand side is a nonterminal (declared in order
    /// of first appearance, the start first), `ε` or an empty slice is the
    /// epsilon right-hand side, and every other name is a terminal.
    pub fn from_rules(start: &str, rules: &[(&str, &[&str])]) -> Result<Grammar, GrammarError> {
        let mut nonterminals: Vec<String> = vec![start.to_string()];
        for (lhs, _) in rules {
            if !nonterminals.iter().any(|nt| nt == lhs) {
                nonterminals.push(lhs.to_string());
            }
        }

        let mut terminals = BTreeSet::new();
        let mut productions = Vec::with_capacity(rules.len());
        for (lhs, rhs) in rules {
            if rhs.is_empty() || *rhs == [EPSILON] {
                productions.push(Production::Empty(lhs.to_string()));
                continue;
            }

            let mut symbols = Vec::with_capacity(rhs.len());
            for name in rhs.iter() {
                if *name == EPSILON {
                    return Err(GrammarError::MalformedInput(format!(
                        "{} appears inside the right-hand side of {}",
                        EPSILON, lhs
                    )));
                }
                if nonterminals.iter().any(|nt| nt == name) {
                    symbols.push(Symbol::nonterminal(*name));
                } else {
                    terminals.insert(name.to_string());
                    symbols.push(Symbol::terminal(*name));
                }
            }
            productions.push(Production::Nonempty(lhs.to_string(), symbols));
        }

        Grammar::new(nonterminals, terminals, start, productions)
    }

    /// Checks that every symbol is declared with the right kind and that
    /// terminals and nonterminals are disjoint. Epsilon is only accepted as
    /// [`Production::Empty`]; [`Grammar::new`] rewrites a lone `ε` into it.
    pub fn validate(&self) -> Result<(), GrammarError> {
        let mut declared: HashSet<&str> = HashSet::new();
        for nt in &self.nonterminals {
            if nt == EPSILON || !declared.insert(nt) {
                return Err(GrammarError::MalformedInput(format!(
                    "nonterminal '{}' is reserved or declared twice",
                    nt
                )));
            }
        }
        if !declared.contains(self.start.as_str()) {
            return Err(GrammarError::MalformedInput(format!(
                "start symbol '{}' is not a declared nonterminal",
                self.start
            )));
        }
        for t in &self.terminals {
            if t == EPSILON || declared.contains(t.as_str()) {
                return Err(GrammarError::MalformedInput(format!(
                    "'{}' cannot be a terminal",
                    t
                )));
            }
        }

        for production in &self.productions {
            if !declared.contains(production.lhs()) {
                return Err(GrammarError::MalformedInput(format!(
                    "undeclared nonterminal '{}' on the left of '{}'",
                    production.lhs(),
                    production
                )));
            }
            if let Production::Nonempty(_, rhs) = production {
                if rhs.is_empty() {
                    return Err(GrammarError::MalformedInput(format!(
                        "{} has an empty right-hand side, use Production::Empty",
                        production.lhs()
                    )));
                }
            }
            for symbol in production.rhs() {
                let ok = match symbol {
                    Symbol::Terminal(t) => self.terminals.contains(t),
                    Symbol::Nonterminal(nt) => declared.contains(nt.as_str()),
                    Symbol::Epsilon => false,
                };
                if !ok {
                    return Err(GrammarError::MalformedInput(format!(
                        "'{}' in '{}' is not declared",
                        symbol, production
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn nonterminals(&self) -> &[String] {
        &self.nonterminals
    }

    pub fn terminals(&self) -> &BTreeSet<String> {
        &self.terminals
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn productions_of<'a>(&'a self, nt: &'a str) -> impl Iterator<Item = &'a Production> {
        self.productions.iter().filter(move |p| p.lhs() == nt)
    }

    pub fn has_epsilon_productions(&self) -> bool {
        self.productions.iter().any(Production::is_empty)
    }

    pub fn has_unit_productions(&self) -> bool {
        self.productions.iter().any(Production::is_unit)
    }

    pub fn classify(&self) -> GrammarType {
        let rules: Vec<Rule> = self.productions.iter().map(Rule::from).collect();
        classify(&rules, &self.start)
    }

    // nonterminal name -> position in declaration order
    pub(crate) fn nonterminal_index(&self) -> HashMap<&str, usize> {
        self.nonterminals
            .iter()
            .enumerate()
            .map(|(i, nt)| (nt.as_str(), i))
            .collect()
    }

    // production indices grouped by left-hand side
    pub(crate) fn production_index(&self) -> Vec<Vec<usize>> {
        let index = self.nonterminal_index();
        let mut map: Vec<Vec<usize>> = vec![Vec::new(); self.nonterminals.len()];
        for (i, production) in self.productions.iter().enumerate() {
            if let Some(nt) = index.get(production.lhs()) {
                map[*nt].push(i);
            }
        }
        map
    }

    // keeps the nonterminals in `keep` and the productions mentioning only those
    pub(crate) fn restrict(&self, keep: &BitSet) -> Grammar {
        let index = self.nonterminal_index();
        let kept = |nt: &str| index.get(nt).is_some_and(|i| keep.contains(*i));

        let productions = self
            .productions
            .iter()
            .filter(|p| {
                kept(p.lhs())
                    && p.rhs().iter().all(|s| match s {
                        Symbol::Nonterminal(nt) => kept(nt.as_str()),
                        _ => true,
                    })
            })
            .cloned()
            .collect();
        let nonterminals = self
            .nonterminals
            .iter()
            .enumerate()
            .filter(|(i, _)| keep.contains(*i))
            .map(|(_, nt)| nt.clone())
            .collect();

        Grammar {
            nonterminals,
            terminals: self.terminals.clone(),
            start: self.start.clone(),
            productions,
        }
    }

    pub(crate) fn name_supply(&self) -> NameSupply {
        NameSupply::new(self.nonterminals.iter().chain(self.terminals.iter()).cloned())
    }

    pub(crate) fn start_on_rhs(&self) -> bool {
        self.productions.iter().any(|p| {
            p.rhs()
                .iter()
                .any(|s| matches!(s, Symbol::Nonterminal(nt) if *nt == self.start))
        })
    }

    // only the start may derive epsilon directly, and only if it is never
    // referenced; shared by the CNF and GNF shape checks
    pub(crate) fn epsilon_rule_allowed(&self, production: &Production) -> bool {
        production.lhs() == self.start && !self.start_on_rhs()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for nt in &self.nonterminals {
            let alternatives: Vec<String> = self
                .productions_of(nt)
                .map(|p| match p {
                    Production::Empty(_) => EPSILON.to_string(),
                    Production::Nonempty(_, rhs) => rhs
                        .iter()
                        .map(Symbol::to_string)
                        .collect::<Vec<_>>()
                        .join(" "),
                })
                .collect();
            if !alternatives.is_empty() {
                writeln!(f, "{} -> {}", nt, alternatives.join(" | "))?;
            }
        }
        Ok(())
    }
}
