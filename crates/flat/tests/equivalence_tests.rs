use flat::{
    compile, determinize, equivalent, minimize, regular_grammar_to_nfa, to_regex, Automaton,
    Error, FaError, Grammar, Totality,
};
use petgraph::dot::{Config, Dot};

fn compile_regex(re_str: &str, quiet: bool) -> Automaton {
    let nfa = compile(re_str).expect("failed to parse regex");
    if !quiet {
        println!("nfa = {:?}", nfa);
    }

    let dfa = determinize(nfa, Totality::Partial).expect("determinization failed");
    if !quiet {
        println!("dfa = {:?}", dfa);
    }

    let dfa = minimize(dfa).expect("minimization failed");
    if !quiet {
        println!("minimized = {:?}", dfa);
    }

    dfa
}

#[test]
fn regular_grammar_matches_regex() {
    let g = Grammar::from_rules(
        "S",
        &[
            ("S", &["a", "S"]),
            ("S", &["b", "A"]),
            ("A", &["a", "A"]),
            ("A", &["b"]),
        ],
    )
    .unwrap();

    let nfa = regular_grammar_to_nfa(&g).unwrap();
    println!("{:?}", Dot::with_config(&nfa.to_graph(), &[Config::EdgeNoLabel]));

    assert!(equivalent(nfa.clone(), compile("a*ba*b").unwrap()).unwrap());
    assert!(!equivalent(nfa, compile("a*ba*").unwrap()).unwrap());
}

#[test]
fn round_trip_through_regex() {
    for re_str in ["a(b|c)*", "(ab|ba)*", "a*b*|c", "(a|b)*abb"] {
        let dfa = compile_regex(re_str, true);
        let re = to_regex(dfa.clone()).expect("state elimination failed");
        println!("{} -> {}", re_str, re);

        let again = compile_regex(&re.to_string(), true);
        assert!(
            equivalent(dfa, again).unwrap(),
            "{} and {} differ",
            re_str,
            re
        );
    }
}

#[test]
fn complement_is_disjoint() {
    let dfa = compile_regex("a(b|c)*", false);
    let complement = dfa.clone().complement().unwrap();

    for word in ["", "a", "ab", "abcbc", "b", "ba", "acca"] {
        assert_ne!(dfa.accepts(word), complement.accepts(word), "{}", word);
    }
    assert!(!equivalent(dfa.clone(), complement.clone()).unwrap());
    assert!(equivalent(dfa, complement.complement().unwrap()).unwrap());
}

#[test]
fn malformed_automaton_is_reported() {
    let mut fa = Automaton::with_alphabet(["a"]);
    let q1 = fa.add_state();
    fa.add_transition(fa.initial_state(), Some("a"), q1).unwrap();
    assert!(matches!(
        fa.add_transition(q1, Some("b"), q1),
        Err(FaError::MalformedInput(_))
    ));

    let grammar = Grammar::from_rules("S", &[("S", &["a", "S", "b"])]).unwrap();
    assert!(matches!(
        regular_grammar_to_nfa(&grammar),
        Err(Error::Grammar(_))
    ));
}
