use flat_re::{FaError, RegexError};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("malformed grammar: {0}")]
    MalformedInput(String),
    #[error("grammar cannot be converted: {0}")]
    Unconvertible(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Automaton(#[from] FaError),
    #[error(transparent)]
    Regex(#[from] RegexError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}
