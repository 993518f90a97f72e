use crate::fa::{Automaton, StateId};
use crate::regex::{Regex, RegexError};

// re + automaton under construction -> (start, accept) of the fragment
// every fragment has exactly one start and one accept state, and nothing
// outside the fragment points into it except through those two ports
fn recursive_helper(re: &Regex, nfa: &mut Automaton) -> (StateId, StateId) {
    match re {
        Regex::Empty => {
            let end = nfa.add_state();
            let start = nfa.add_state();
            (start, end)
        }
        Regex::EmptyString => {
            let end = nfa.add_state();
            let start = nfa.add_state();
            nfa.push_transition(start, None, end);
            (start, end)
        }
        Regex::Literal(symbol) => {
            let end = nfa.add_state();
            let start = nfa.add_state();
            nfa.push_transition(start, Some(symbol.clone()), end);
            (start, end)
        }
        Regex::Concat(left, right) => {
            let (left_start, left_end) = recursive_helper(left, nfa);
            let (right_start, right_end) = recursive_helper(right, nfa);
            nfa.push_transition(left_end, None, right_start);
            (left_start, right_end)
        }
        Regex::Union(left, right) => {
            let end = nfa.add_state();
            let (left_start, left_end) = recursive_helper(left, nfa);
            let (right_start, right_end) = recursive_helper(right, nfa);
            nfa.push_transition(left_end, None, end);
            nfa.push_transition(right_end, None, end);

            let start = nfa.add_state();
            nfa.push_transition(start, None, left_start);
            nfa.push_transition(start, None, right_start);
            (start, end)
        }
        Regex::Star(inner) | Regex::Plus(inner) | Regex::Optional(inner) => {
            let (inner_start, inner_end) = recursive_helper(inner, nfa);
            let end = nfa.add_state();
            let start = nfa.add_state();
            nfa.push_transition(start, None, inner_start);
            nfa.push_transition(inner_end, None, end);

            // loop back for * and +, bypass for * and ?
            if matches!(re, Regex::Star(_) | Regex::Plus(_)) {
                nfa.push_transition(inner_end, None, inner_start);
            }
            if matches!(re, Regex::Star(_) | Regex::Optional(_)) {
                nfa.push_transition(start, None, end);
            }
            (start, end)
        }
        Regex::Group(inner) => recursive_helper(inner, nfa),
    }
}

/// Creates an NFA from a regex using Thompson's construction. The result has
/// a single accept state and O(|re|) states and transitions.
pub fn nfa_from_re(re: &Regex) -> Automaton {
    let mut nfa = Automaton::empty(re.alphabet());
    let (start, end) = recursive_helper(re, &mut nfa);
    nfa.initial_state = start;
    nfa.accept_states.insert(end);

    log::debug!(
        "thompson construction: {} states, {} transitions",
        nfa.num_states(),
        nfa.num_transitions()
    );
    nfa
}

/// Parses `pattern` and compiles it to an NFA.
pub fn compile(pattern: &str) -> Result<Automaton, RegexError> {
    let re = Regex::from_str(pattern)?;
    Ok(nfa_from_re(&re))
}
