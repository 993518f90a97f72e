use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FaError {
    #[error("malformed automaton: {0}")]
    MalformedInput(String),
    #[error("operation requires a deterministic automaton")]
    NotDeterministic,
}
