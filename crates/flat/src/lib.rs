mod equivalence;
mod error;
pub mod grammar;
mod regular;

pub use equivalence::equivalent;
pub use error::{Error, GrammarError};
pub use grammar::{
    classify, eliminate_epsilon, eliminate_unit, is_cnf, is_gnf, merge_equivalent_nonterminals,
    remove_non_generating, remove_unreachable, simplify, to_cnf, to_gnf, Grammar, GrammarType,
    Production, Rule,
};
pub use regular::regular_grammar_to_nfa;

pub use flat_re::{
    compile, determinize, minimize, nfa_from_re, to_regex, Automaton, FaError, FaProperties,
    Regex, RegexError, RegexErrorKind, StateId, Totality,
};
pub use flat_util::{NameSupply, Symbol, EPSILON};
