use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EPSILON;

/// A grammar or automaton symbol.
///
/// Ordering is by variant first (terminals, then nonterminals, then epsilon)
/// and by name second, so sorting a set of symbols is always deterministic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
    Epsilon,
}

impl Symbol {
    pub fn terminal(name: impl Into<String>) -> Symbol {
        Symbol::Terminal(name.into())
    }

    pub fn nonterminal(name: impl Into<String>) -> Symbol {
        Symbol::Nonterminal(name.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Symbol::Nonterminal(_))
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    /// Name of the symbol; epsilon is spelled `ε`.
    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::Nonterminal(name) => name,
            Symbol::Epsilon => EPSILON,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
