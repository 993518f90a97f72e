use std::fmt;

use flat_util::Symbol;
use serde::{Deserialize, Serialize};

use super::Production;

/// A rewriting rule `lhs -> rhs` over arbitrary symbol strings. Epsilon
/// symbols contribute nothing to either side's length.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub lhs: Vec<Symbol>,
    pub rhs: Vec<Symbol>,
}

impl Rule {
    pub fn new(lhs: Vec<Symbol>, rhs: Vec<Symbol>) -> Rule {
        Rule { lhs, rhs }
    }

    fn body(&self) -> Vec<&Symbol> {
        self.rhs.iter().filter(|s| !s.is_epsilon()).collect()
    }

    fn head(&self) -> Vec<&Symbol> {
        self.lhs.iter().filter(|s| !s.is_epsilon()).collect()
    }

    fn single_nonterminal_head(&self) -> Option<&str> {
        let mut head = self.lhs.iter().filter(|s| !s.is_epsilon());
        match (head.next(), head.next()) {
            (Some(Symbol::Nonterminal(nt)), None) => Some(nt.as_str()),
            _ => None,
        }
    }
}

impl From<&Production> for Rule {
    fn from(production: &Production) -> Rule {
        Rule {
            lhs: vec![Symbol::nonterminal(production.lhs())],
            rhs: production.rhs().to_vec(),
        }
    }
}

/// Position in the Chomsky hierarchy; ordered from least to most restricted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrammarType {
    Unrestricted = 0,
    ContextSensitive = 1,
    ContextFree = 2,
    Regular = 3,
}

impl GrammarType {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for GrammarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GrammarType::Unrestricted => "unrestricted",
            GrammarType::ContextSensitive => "context-sensitive",
            GrammarType::ContextFree => "context-free",
            GrammarType::Regular => "regular",
        };
        write!(f, "type {} ({})", self.level(), name)
    }
}

// A -> aB | a | ε
fn is_right_linear(rule: &Rule) -> bool {
    rule.single_nonterminal_head().is_some()
        && matches!(
            rule.body().as_slice(),
            [] | [Symbol::Terminal(_)] | [Symbol::Terminal(_), Symbol::Nonterminal(_)]
        )
}

fn is_non_contracting(rules: &[Rule], start: &str) -> bool {
    let start_referenced = rules.iter().any(|rule| {
        rule.rhs
            .iter()
            .any(|s| matches!(s, Symbol::Nonterminal(nt) if nt == start))
    });

    rules.iter().all(|rule| {
        let body = rule.body().len();
        if body == 0 {
            return rule.single_nonterminal_head() == Some(start) && !start_referenced;
        }
        body >= rule.head().len()
    })
}

/// Classifies a rule set by the most restrictive grammar type all of its
/// rules satisfy.
pub fn classify(rules: &[Rule], start: &str) -> GrammarType {
    if rules.iter().all(is_right_linear) {
        GrammarType::Regular
    } else if rules.iter().all(|rule| rule.single_nonterminal_head().is_some()) {
        GrammarType::ContextFree
    } else if is_non_contracting(rules, start) {
        GrammarType::ContextSensitive
    } else {
        GrammarType::Unrestricted
    }
}
