mod eliminate;
mod error;
mod fa;
mod minimize;
mod regex;
mod subset;
mod thompson;


pub use eliminate::to_regex;
pub use error::FaError;
pub use fa::{Automaton, FaProperties, Label, StateId};
pub use minimize::minimize;
pub use regex::{Regex, RegexError, RegexErrorKind};
pub use subset::{determinize, Totality};
pub use thompson::{compile, nfa_from_re};
