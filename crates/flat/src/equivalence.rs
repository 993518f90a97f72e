use flat_re::{determinize, minimize, Automaton, Totality};

use crate::Error;

fn canonical(fa: Automaton, alphabet: &[String]) -> Result<Automaton, Error> {
    let fa = fa.extend_alphabet(alphabet.iter().cloned())?;
    let dfa = if fa.is_deterministic() {
        fa
    } else {
        determinize(fa, Totality::Partial)?
    };
    Ok(minimize(dfa)?)
}

/// Whether two automata accept the same language.
///
/// Both are taken to the union of their alphabets, determinized if needed
/// and minimized; canonical minimal DFAs are equal exactly when their
/// languages are.
pub fn equivalent(a: Automaton, b: Automaton) -> Result<bool, Error> {
    a.validate()?;
    b.validate()?;

    let alphabet: Vec<String> = a.alphabet().union(b.alphabet()).cloned().collect();
    let a = canonical(a, &alphabet)?;
    let b = canonical(b, &alphabet)?;
    log::debug!(
        "equivalent: minimal DFAs with {} and {} states",
        a.num_states(),
        b.num_states()
    );
    Ok(a == b)
}
